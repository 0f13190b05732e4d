//! Multi-horizon composite growth factor.

use fundpanel_math::zscore;
use fundpanel_primitives::{GrowthEstimate, WidePanel};
use fundpanel_traits::GrowthEstimator;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{GrowthError, GrowthScoreRow, GrowthScoreTable, StableGrowthEstimator};

/// Treatment of `Degenerate` estimates when z-scoring a horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegeneratePolicy {
    /// Rank with the lowest numeric z-score of the horizon.
    #[default]
    Floor,
    /// Treat as missing.
    Exclude,
}

/// Configuration for the composite growth builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositeGrowthConfig {
    /// Lookback horizons in years.
    pub horizons: Vec<u32>,
    /// Valid per-horizon z-scores an entity needs to be retained.
    pub min_valid_scores: usize,
    /// Treatment of degenerate estimates.
    pub degenerate_policy: DegeneratePolicy,
}

impl Default for CompositeGrowthConfig {
    fn default() -> Self {
        Self {
            horizons: vec![3, 4, 5],
            min_valid_scores: 2,
            degenerate_policy: DegeneratePolicy::Floor,
        }
    }
}

impl CompositeGrowthConfig {
    /// Check horizons and retention threshold.
    ///
    /// # Errors
    /// Returns `GrowthError::InvalidConfig` for empty, zero or repeated
    /// horizons, or a threshold outside `1..=horizons.len()`.
    pub fn validate(&self) -> Result<(), GrowthError> {
        if self.horizons.is_empty() {
            return Err(GrowthError::InvalidConfig("horizons must not be empty".into()));
        }
        if self.horizons.contains(&0) {
            return Err(GrowthError::InvalidConfig("horizons must be positive".into()));
        }
        let mut sorted = self.horizons.clone();
        sorted.sort_unstable();
        sorted.dedup();
        if sorted.len() != self.horizons.len() {
            return Err(GrowthError::InvalidConfig("horizons must be distinct".into()));
        }
        if self.min_valid_scores == 0 || self.min_valid_scores > self.horizons.len() {
            return Err(GrowthError::InvalidConfig(format!(
                "min_valid_scores must be in 1..={}, got {}",
                self.horizons.len(),
                self.min_valid_scores
            )));
        }
        Ok(())
    }
}

/// Builds a composite growth score from per-horizon growth estimates.
#[derive(Debug, Clone)]
pub struct CompositeGrowthBuilder<E = StableGrowthEstimator> {
    estimator: E,
    config: CompositeGrowthConfig,
}

impl CompositeGrowthBuilder<StableGrowthEstimator> {
    /// Create a builder with the default estimator and configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(StableGrowthEstimator::new(), CompositeGrowthConfig::default())
    }
}

impl Default for CompositeGrowthBuilder<StableGrowthEstimator> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: GrowthEstimator> CompositeGrowthBuilder<E> {
    /// Create a builder from an estimator and configuration.
    #[must_use]
    pub const fn with_config(estimator: E, config: CompositeGrowthConfig) -> Self {
        Self { estimator, config }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &CompositeGrowthConfig {
        &self.config
    }

    /// Returns the per-entity estimator.
    #[must_use]
    pub const fn estimator(&self) -> &E {
        &self.estimator
    }

    /// Score every entity of `panel`.
    ///
    /// Column names of the rendered table start with `prefix`.
    ///
    /// # Errors
    /// Returns `GrowthError::InvalidConfig` if the configuration is invalid.
    pub fn build(&self, panel: &WidePanel, prefix: &str) -> Result<GrowthScoreTable, GrowthError> {
        self.config.validate()?;
        let horizons = &self.config.horizons;
        let n = panel.n_entities();

        let estimates: Vec<Vec<GrowthEstimate>> = (0..n)
            .map(|i| horizons.iter().map(|&y| self.estimator.estimate(panel.row(i), y)).collect())
            .collect();

        let mut zscores: Vec<Vec<Option<f64>>> = vec![Vec::with_capacity(horizons.len()); n];
        for (k, years) in horizons.iter().enumerate() {
            let column: Vec<GrowthEstimate> = estimates.iter().map(|row| row[k]).collect();
            let scored = self.horizon_zscores(&column);
            debug!(
                prefix,
                years,
                values = column.iter().filter(|e| e.is_value()).count(),
                degenerate = column.iter().filter(|e| e.is_degenerate()).count(),
                scored = scored.iter().flatten().count(),
                "scored horizon"
            );
            for (row, z) in zscores.iter_mut().zip(scored) {
                row.push(z);
            }
        }

        let mut rows: Vec<GrowthScoreRow> = panel
            .entities()
            .iter()
            .zip(estimates)
            .zip(zscores)
            .filter(|(_, z)| z.iter().flatten().count() >= self.config.min_valid_scores)
            .map(|((entity, estimates), z)| {
                let zscores: Vec<f64> = z.into_iter().map(|v| v.unwrap_or(0.0)).collect();
                let mean = zscores.iter().sum::<f64>() / zscores.len() as f64;
                GrowthScoreRow { entity: entity.clone(), estimates, zscores, composite: mean }
            })
            .collect();

        let dropped = n - rows.len();
        if dropped > 0 {
            debug!(prefix, dropped, "dropped entities with too few valid horizon scores");
        }

        let means = Array1::from_iter(rows.iter().map(|row| row.composite));
        let standardized = zscore(&means);
        if !rows.is_empty() && standardized.iter().all(|z| z.is_nan()) {
            warn!(prefix, retained = rows.len(), "no composite dispersion, scores are 0");
        }
        for (row, z) in rows.iter_mut().zip(standardized) {
            row.composite = if z.is_finite() { z } else { 0.0 };
        }

        rows.sort_by(|a, b| b.composite.total_cmp(&a.composite));
        info!(prefix, entities = n, retained = rows.len(), "built composite growth scores");

        Ok(GrowthScoreTable::new(prefix.to_string(), horizons.clone(), rows))
    }

    /// Cross-sectional z-scores of one horizon's estimates.
    fn horizon_zscores(&self, estimates: &[GrowthEstimate]) -> Vec<Option<f64>> {
        let values = Array1::from_iter(estimates.iter().map(|e| e.value().unwrap_or(f64::NAN)));
        let z: Vec<Option<f64>> =
            zscore(&values).iter().map(|&v| v.is_finite().then_some(v)).collect();
        let floor = z.iter().flatten().copied().reduce(f64::min);

        estimates
            .iter()
            .zip(z)
            .map(|(e, z)| match (e, self.config.degenerate_policy) {
                (GrowthEstimate::Degenerate, DegeneratePolicy::Floor) => floor,
                _ => z,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use fundpanel_math::finite_moments;
    use fundpanel_primitives::Period;
    use ndarray::{Array2, s};

    use super::*;

    fn quarters(n: usize) -> Vec<Period> {
        let mut out = Vec::with_capacity(n);
        let mut year = 2015;
        for q in 0..n {
            let (month, day) = [(3, 31), (6, 30), (9, 30), (12, 31)][q % 4];
            out.push(Period::from_ymd_opt(year, month, day).unwrap());
            if q % 4 == 3 {
                year += 1;
            }
        }
        out
    }

    /// Geometric quarterly series growing at `annual` per year.
    fn compounding(start: f64, annual: f64, n: usize) -> Vec<f64> {
        (0..n).map(|q| start * (1.0 + annual).powf(q as f64 / 4.0)).collect()
    }

    fn panel(rows: Vec<(&str, Vec<f64>)>) -> WidePanel {
        let n = rows[0].1.len();
        let entities = rows.iter().map(|(e, _)| (*e).into()).collect();
        let values = rows.into_iter().map(|(_, v)| v).collect();
        WidePanel::from_rows(entities, quarters(n), values).unwrap()
    }

    #[test]
    fn config_defaults() {
        let config = CompositeGrowthConfig::default();
        assert_eq!(config.horizons, vec![3, 4, 5]);
        assert_eq!(config.min_valid_scores, 2);
        assert_eq!(config.degenerate_policy, DegeneratePolicy::Floor);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_rejects_bad_horizons() {
        for horizons in [vec![], vec![0, 3], vec![3, 3]] {
            let config = CompositeGrowthConfig { horizons, ..Default::default() };
            assert!(config.validate().is_err());
        }
        let config = CompositeGrowthConfig { min_valid_scores: 4, ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn faster_growth_ranks_higher() {
        let p = panel(vec![
            ("SLOW", compounding(100.0, 0.02, 28)),
            ("FAST", compounding(100.0, 0.20, 28)),
            ("MID", compounding(100.0, 0.08, 28)),
        ]);

        let table = CompositeGrowthBuilder::new().build(&p, "fcfe").unwrap();

        let order: Vec<&str> = table.rows().iter().map(|r| r.entity.as_str()).collect();
        assert_eq!(order, vec!["FAST", "MID", "SLOW"]);
        // The span ends at the base window's last quarter, two after its
        // centre, so a smooth trend reads slightly above its true rate.
        let fast = table.get("FAST").unwrap().estimates[0].value().unwrap();
        assert!(fast > 0.20 && fast < 0.24, "{fast}");
    }

    #[test]
    fn composite_is_standardized() {
        let p = panel(vec![
            ("A", compounding(10.0, 0.01, 28)),
            ("B", compounding(10.0, 0.05, 28)),
            ("C", compounding(10.0, 0.12, 28)),
            ("D", compounding(10.0, 0.30, 28)),
        ]);

        let table = CompositeGrowthBuilder::new().build(&p, "roe").unwrap();
        let scores = Array1::from_iter(table.rows().iter().map(|r| r.composite));
        let (mean, std) = finite_moments(&scores).unwrap();
        assert_relative_eq!(mean, 0.0, epsilon = 1e-12);
        assert_relative_eq!(std, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn entities_without_enough_horizons_are_dropped() {
        // 14 valid quarters reach the 3-year base window only.
        let mut short = compounding(100.0, 0.5, 28);
        short[..14].fill(f64::NAN);
        let p = panel(vec![
            ("A", compounding(100.0, 0.05, 28)),
            ("B", compounding(100.0, 0.10, 28)),
            ("SHORT", short),
        ]);

        let table = CompositeGrowthBuilder::new().build(&p, "fcfe").unwrap();
        assert_eq!(table.len(), 2);
        assert!(table.get("SHORT").is_none());
    }

    #[test]
    fn missing_horizon_filled_with_zero() {
        let mut short = compounding(100.0, 0.5, 28);
        short[..10].fill(f64::NAN);
        let p = panel(vec![
            ("A", compounding(100.0, 0.05, 28)),
            ("B", compounding(100.0, 0.10, 28)),
            ("C", short),
        ]);

        let table = CompositeGrowthBuilder::new().build(&p, "fcfe").unwrap();
        let c = table.get("C").unwrap();
        assert!(c.estimates[2].is_undefined());
        assert_eq!(c.zscores[2], 0.0);
        assert!(c.zscores[0] > 0.0 && c.zscores[1] > 0.0);
    }

    #[test]
    fn degenerate_floor_and_exclude() {
        let mut negative = compounding(100.0, 0.1, 28);
        negative[..18].fill(-50.0);
        let p = panel(vec![
            ("A", compounding(100.0, 0.02, 28)),
            ("B", compounding(100.0, 0.10, 28)),
            ("C", compounding(100.0, 0.15, 28)),
            ("NEG", negative),
        ]);

        let floor = CompositeGrowthBuilder::new().build(&p, "fcfe").unwrap();
        let neg = floor.get("NEG").unwrap();
        assert!(neg.estimates.iter().all(GrowthEstimate::is_degenerate));
        let lowest_numeric = floor.get("A").unwrap().zscores[0];
        assert_relative_eq!(neg.zscores[0], lowest_numeric);
        // Ties with the slowest grower and sorts after it.
        assert_eq!(floor.rows().last().map(|r| r.entity.as_str()), Some("NEG"));

        let config = CompositeGrowthConfig {
            degenerate_policy: DegeneratePolicy::Exclude,
            ..Default::default()
        };
        let exclude = CompositeGrowthBuilder::with_config(StableGrowthEstimator::new(), config)
            .build(&p, "fcfe")
            .unwrap();
        assert!(exclude.get("NEG").is_none());
        assert_eq!(exclude.len(), 3);
    }

    #[test]
    fn lone_survivor_scores_zero() {
        let mut only_3yr = compounding(100.0, 0.1, 28);
        only_3yr[..14].fill(f64::NAN);
        let mut only_4yr = compounding(100.0, 0.1, 28);
        only_4yr[9..25].fill(f64::NAN);
        let p = panel(vec![
            ("A", compounding(100.0, 0.05, 28)),
            ("B", only_3yr),
            ("C", only_4yr),
        ]);
        let config = CompositeGrowthConfig { horizons: vec![3, 4], ..Default::default() };

        let table = CompositeGrowthBuilder::with_config(StableGrowthEstimator::new(), config)
            .build(&p, "fcfe")
            .unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].entity.as_str(), "A");
        assert_eq!(table.rows()[0].composite, 0.0);
    }

    #[test]
    fn no_cross_section_no_scores() {
        let p = panel(vec![("A", compounding(100.0, 0.1, 28))]);
        let table = CompositeGrowthBuilder::new().build(&p, "fcfe").unwrap();
        assert!(table.is_empty());

        let p = panel(vec![
            ("A", compounding(100.0, 0.1, 28)),
            ("B", compounding(100.0, 0.1, 28)),
        ]);
        let table = CompositeGrowthBuilder::new().build(&p, "fcfe").unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn ties_keep_panel_order() {
        let mut values = Array2::from_elem((3, 28), 0.0);
        let slow = compounding(100.0, 0.02, 28);
        let fast = compounding(100.0, 0.2, 28);
        for (i, series) in [&fast, &slow, &fast].into_iter().enumerate() {
            values.slice_mut(s![i, ..]).assign(&Array1::from_vec(series.clone()));
        }
        let p = WidePanel::new(vec!["X".into(), "Y".into(), "Z".into()], quarters(28), values)
            .unwrap();

        let table = CompositeGrowthBuilder::new().build(&p, "fcfe").unwrap();
        let order: Vec<&str> = table.rows().iter().map(|r| r.entity.as_str()).collect();
        assert_eq!(order, vec!["X", "Z", "Y"]);
    }

    #[test]
    fn build_is_deterministic() {
        let p = panel(vec![
            ("A", compounding(100.0, 0.03, 28)),
            ("B", compounding(100.0, 0.09, 28)),
            ("C", compounding(100.0, 0.04, 28)),
        ]);
        let builder = CompositeGrowthBuilder::new();
        assert_eq!(builder.build(&p, "x").unwrap(), builder.build(&p, "x").unwrap());
    }
}
