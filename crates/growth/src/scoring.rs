//! Dimension scores and a ranked final score over standardized factors.

use std::collections::BTreeSet;

use fundpanel_math::grouped_zscore;
use ndarray::Array1;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::GrowthError;

/// Smallest group that is standardized on its own.
pub const MIN_GROUP_SIZE: usize = 5;

/// A named set of factor columns averaged into one score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimension {
    /// Dimension name; the score column is `{name}_score`.
    pub name: String,
    /// Factor columns of the dimension.
    pub factors: Vec<String>,
    /// Observed factors an entity needs for a dimension score.
    pub min_factors: usize,
}

impl Dimension {
    /// Create a dimension.
    #[must_use]
    pub fn new(name: impl Into<String>, factors: &[&str], min_factors: usize) -> Self {
        Self {
            name: name.into(),
            factors: factors.iter().map(|f| (*f).to_string()).collect(),
            min_factors,
        }
    }

    /// Name of the score column.
    #[must_use]
    pub fn score_column(&self) -> String {
        format!("{}_score", self.name)
    }
}

/// Configuration for [`DimensionScorer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DimensionScoreConfig {
    /// Entity identifier column.
    pub entity_col: String,
    /// Column assigning entities to peer groups. `None` scores one group.
    pub group_col: Option<String>,
    /// Dimensions, in output order.
    pub dimensions: Vec<Dimension>,
    /// Missing dimension scores an entity may have and still get a final
    /// score.
    pub max_missing_dimensions: usize,
    /// Smallest group that is standardized.
    pub min_group_size: usize,
}

impl Default for DimensionScoreConfig {
    fn default() -> Self {
        Self {
            entity_col: "entity".to_string(),
            group_col: None,
            dimensions: vec![
                Dimension::new(
                    "profitability",
                    &[
                        "roe",
                        "roa",
                        "gross_margin",
                        "fcf_to_assets",
                        "gross_profit_to_assets",
                        "cash_flow_quality",
                    ],
                    4,
                ),
                Dimension::new(
                    "growth",
                    &[
                        "roe_growth",
                        "roa_growth",
                        "gross_margin_growth",
                        "fcf_to_assets_growth",
                        "gross_profit_to_assets_growth",
                    ],
                    3,
                ),
                Dimension::new(
                    "safety",
                    &["low_beta", "low_idiosyncratic_risk", "low_leverage", "altman_z"],
                    3,
                ),
            ],
            max_missing_dimensions: 1,
            min_group_size: MIN_GROUP_SIZE,
        }
    }
}

impl DimensionScoreConfig {
    /// Check dimensions and thresholds.
    ///
    /// # Errors
    /// Returns `GrowthError::InvalidConfig` for no dimensions, an empty or
    /// repeated dimension, a factor minimum outside `1..=factors.len()`, a
    /// missing-dimension allowance that leaves nothing to average, or a
    /// group size below two.
    pub fn validate(&self) -> Result<(), GrowthError> {
        if self.dimensions.is_empty() {
            return Err(GrowthError::InvalidConfig("dimensions must not be empty".into()));
        }
        let mut names = BTreeSet::new();
        for dim in &self.dimensions {
            if dim.name.is_empty() || !names.insert(dim.name.as_str()) {
                return Err(GrowthError::InvalidConfig(format!(
                    "dimension names must be non-empty and distinct, got {:?}",
                    dim.name
                )));
            }
            if dim.min_factors == 0 || dim.min_factors > dim.factors.len() {
                return Err(GrowthError::InvalidConfig(format!(
                    "{}: min_factors must be in 1..={}, got {}",
                    dim.name,
                    dim.factors.len(),
                    dim.min_factors
                )));
            }
        }
        if self.max_missing_dimensions >= self.dimensions.len() {
            return Err(GrowthError::InvalidConfig(format!(
                "max_missing_dimensions must be below {}, got {}",
                self.dimensions.len(),
                self.max_missing_dimensions
            )));
        }
        if self.min_group_size < 2 {
            return Err(GrowthError::InvalidConfig("min_group_size must be at least 2".into()));
        }
        Ok(())
    }
}

/// Scores entities on several factor dimensions and ranks them.
///
/// Each factor is z-scored within its peer group. A dimension score is the
/// mean of the observed standardized factors, given at least `min_factors`
/// of them. Dimension scores are z-scored again per group, averaged into a
/// final score for entities missing at most `max_missing_dimensions`, and
/// the final score is z-scored once more. Ranks are ordinal within a group,
/// highest score first, ties in input order.
///
/// Groups smaller than `min_group_size`, or without dispersion, keep
/// unstandardized values at each step. Entities without a group get no
/// scores.
#[derive(Debug, Clone, Default)]
pub struct DimensionScorer {
    config: DimensionScoreConfig,
}

impl DimensionScorer {
    /// Create a scorer with the default dimensions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scorer with a custom configuration.
    #[must_use]
    pub const fn with_config(config: DimensionScoreConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &DimensionScoreConfig {
        &self.config
    }

    /// Score every row of `frame`.
    ///
    /// The result keeps the input row order and has the entity column, the
    /// group column if configured, one `{name}_score` column per dimension,
    /// `final_score` and `final_rank`. Factor columns absent from `frame`
    /// count as missing for every entity.
    ///
    /// # Errors
    /// Returns `GrowthError::InvalidConfig` for an invalid configuration and
    /// a polars error if the entity or group column is missing or a factor
    /// column cannot be read as numbers.
    pub fn score(&self, frame: &DataFrame) -> Result<DataFrame, GrowthError> {
        self.config.validate()?;
        let n = frame.height();

        let entities = frame.column(&self.config.entity_col)?.cast(&DataType::String)?;
        let group_column = match &self.config.group_col {
            Some(name) => Some(frame.column(name)?.cast(&DataType::String)?),
            None => None,
        };
        let groups: Vec<Option<&str>> = match &group_column {
            Some(column) => column.str()?.into_iter().collect(),
            None => vec![Some(""); n],
        };
        let ungrouped = groups.iter().filter(|g| g.is_none()).count();
        if ungrouped > 0 {
            warn!(ungrouped, "rows without a group are not scored");
        }

        let mut dimension_scores = Vec::with_capacity(self.config.dimensions.len());
        for dim in &self.config.dimensions {
            let raw = self.dimension_score(frame, dim, &groups)?;
            let scored = grouped_zscore(&raw, &groups, self.config.min_group_size)?;
            debug!(
                dimension = dim.name.as_str(),
                scored = scored.iter().filter(|v| v.is_finite()).count(),
                "scored dimension"
            );
            dimension_scores.push(scored);
        }

        let total = dimension_scores.len();
        let combined: Array1<f64> = (0..n)
            .map(|i| {
                let observed: Vec<f64> = dimension_scores
                    .iter()
                    .map(|scores| scores[i])
                    .filter(|v| v.is_finite())
                    .collect();
                // validate() keeps the allowance below `total`, so `observed` is non-empty
                if total - observed.len() > self.config.max_missing_dimensions {
                    f64::NAN
                } else {
                    observed.iter().sum::<f64>() / observed.len() as f64
                }
            })
            .collect();
        let final_scores = grouped_zscore(&combined, &groups, self.config.min_group_size)?;
        let ranks = ordinal_ranks(&final_scores, &groups);

        info!(
            entities = n,
            dimensions = total,
            ranked = ranks.iter().flatten().count(),
            "dimension scores computed"
        );

        let mut columns = Vec::with_capacity(total + 4);
        columns.push(entities);
        if let Some(column) = group_column {
            columns.push(column);
        }
        for (dim, scores) in self.config.dimensions.iter().zip(&dimension_scores) {
            columns.push(Column::new(dim.score_column().into(), finite_or_null(scores)));
        }
        columns.push(Column::new("final_score".into(), finite_or_null(&final_scores)));
        columns.push(Column::new("final_rank".into(), ranks));

        Ok(DataFrame::new(columns)?)
    }

    /// Mean of the group-standardized factors of `dim` per row.
    fn dimension_score(
        &self,
        frame: &DataFrame,
        dim: &Dimension,
        groups: &[Option<&str>],
    ) -> Result<Array1<f64>, GrowthError> {
        let n = frame.height();
        let mut sums = Array1::<f64>::zeros(n);
        let mut counts = vec![0_usize; n];

        for factor in &dim.factors {
            let Ok(column) = frame.column(factor) else {
                warn!(dimension = dim.name.as_str(), factor = factor.as_str(), "factor missing");
                continue;
            };
            let values: Array1<f64> = column
                .cast(&DataType::Float64)?
                .f64()?
                .into_iter()
                .zip(groups)
                .map(|(v, g)| match (v, g) {
                    (Some(v), Some(_)) => v,
                    _ => f64::NAN,
                })
                .collect();
            let standardized = grouped_zscore(&values, groups, self.config.min_group_size)?;
            for (i, v) in standardized.iter().enumerate() {
                if v.is_finite() {
                    sums[i] += v;
                    counts[i] += 1;
                }
            }
        }

        Ok(sums
            .iter()
            .zip(&counts)
            .map(|(&sum, &count)| {
                if count >= dim.min_factors { sum / count as f64 } else { f64::NAN }
            })
            .collect())
    }
}

/// Ordinal rank per group, highest score first, ties in input order.
fn ordinal_ranks(scores: &Array1<f64>, groups: &[Option<&str>]) -> Vec<Option<u32>> {
    let mut order: Vec<usize> =
        (0..scores.len()).filter(|&i| scores[i].is_finite() && groups[i].is_some()).collect();
    order.sort_by(|&a, &b| groups[a].cmp(&groups[b]).then(scores[b].total_cmp(&scores[a])));

    let mut ranks = vec![None; scores.len()];
    let mut previous: Option<Option<&str>> = None;
    let mut rank = 0_u32;
    for i in order {
        if previous != Some(groups[i]) {
            previous = Some(groups[i]);
            rank = 0;
        }
        rank += 1;
        ranks[i] = Some(rank);
    }
    ranks
}

fn finite_or_null(values: &Array1<f64>) -> Vec<Option<f64>> {
    values.iter().map(|&v| v.is_finite().then_some(v)).collect()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rstest::rstest;

    use super::*;

    fn two_factor_config(group_col: Option<&str>) -> DimensionScoreConfig {
        DimensionScoreConfig {
            entity_col: "code".to_string(),
            group_col: group_col.map(str::to_string),
            dimensions: vec![
                Dimension::new("quality", &["roe", "roa"], 1),
                Dimension::new("growth", &["fcfe_growth"], 1),
            ],
            max_missing_dimensions: 1,
            min_group_size: MIN_GROUP_SIZE,
        }
    }

    fn column_f64(frame: &DataFrame, name: &str) -> Vec<Option<f64>> {
        frame.column(name).unwrap().f64().unwrap().into_iter().collect()
    }

    fn column_rank(frame: &DataFrame) -> Vec<Option<u32>> {
        frame.column("final_rank").unwrap().u32().unwrap().into_iter().collect()
    }

    #[test]
    fn ranks_follow_final_score() {
        let frame = df! {
            "code" => ["A", "B", "C", "D", "E"],
            "roe" => [1.0, 2.0, 3.0, 4.0, 5.0],
            "roa" => [1.0, 2.0, 3.0, 4.0, 5.0],
            "fcfe_growth" => [5.0, 4.0, 3.0, 2.0, 1.0],
        }
        .unwrap();
        let config = DimensionScoreConfig {
            dimensions: vec![Dimension::new("quality", &["roe", "roa"], 2)],
            max_missing_dimensions: 0,
            ..two_factor_config(None)
        };

        let scores = DimensionScorer::with_config(config).score(&frame).unwrap();
        assert_eq!(column_rank(&scores), vec![Some(5), Some(4), Some(3), Some(2), Some(1)]);

        let final_scores: Vec<f64> =
            column_f64(&scores, "final_score").into_iter().flatten().collect();
        assert_eq!(final_scores.len(), 5);
        let mean = final_scores.iter().sum::<f64>() / 5.0;
        assert_relative_eq!(mean, 0.0, epsilon = 1e-12);
        // sample std of -2..=2 is sqrt(2.5)
        assert_relative_eq!(final_scores[4], 2.0 / 2.5_f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn offsetting_dimensions_tie_in_input_order() {
        let frame = df! {
            "code" => ["A", "B", "C", "D", "E"],
            "roe" => [1.0, 2.0, 3.0, 4.0, 5.0],
            "roa" => [1.0, 2.0, 3.0, 4.0, 5.0],
            "fcfe_growth" => [5.0, 4.0, 3.0, 2.0, 1.0],
        }
        .unwrap();

        let scores = DimensionScorer::with_config(two_factor_config(None)).score(&frame).unwrap();
        // every composite is zero: no dispersion, raw values kept, input order wins
        assert_eq!(column_rank(&scores), vec![Some(1), Some(2), Some(3), Some(4), Some(5)]);
        for v in column_f64(&scores, "final_score").into_iter().flatten() {
            assert_relative_eq!(v, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn groups_rank_separately() {
        let frame = df! {
            "code" => ["L1", "S1", "L2", "S2", "L3", "S3", "L4", "S4", "L5", "S5"],
            "size" => ["large", "small", "large", "small", "large",
                       "small", "large", "small", "large", "small"],
            "roe" => [1.0, 100.0, 2.0, 200.0, 3.0, 300.0, 4.0, 400.0, 5.0, 500.0],
            "roa" => [1.0, 100.0, 2.0, 200.0, 3.0, 300.0, 4.0, 400.0, 5.0, 500.0],
        }
        .unwrap();
        let config = DimensionScoreConfig {
            dimensions: vec![Dimension::new("quality", &["roe", "roa"], 2)],
            max_missing_dimensions: 0,
            ..two_factor_config(Some("size"))
        };

        let scores = DimensionScorer::with_config(config).score(&frame).unwrap();
        assert!(scores.column("size").is_ok());
        let ranks = column_rank(&scores);
        assert_eq!(ranks[8], Some(1));
        assert_eq!(ranks[9], Some(1));
        assert_eq!(ranks[0], Some(5));
        assert_eq!(ranks[1], Some(5));

        let finals = column_f64(&scores, "final_score");
        assert_relative_eq!(finals[8].unwrap(), finals[9].unwrap(), epsilon = 1e-12);
    }

    #[test]
    fn too_few_factors_leave_dimension_missing() {
        let frame = df! {
            "code" => ["A", "B", "C", "D", "E", "F"],
            "roe" => [Some(1.0), Some(2.0), Some(3.0), Some(4.0), Some(5.0), None],
            "roa" => [2.0, 1.0, 4.0, 3.0, 6.0, 5.0],
            "fcfe_growth" => [Some(1.0), Some(2.0), Some(3.0), Some(4.0), Some(5.0), None],
        }
        .unwrap();
        let mut config = two_factor_config(None);
        config.dimensions[0].min_factors = 2;

        let scores = DimensionScorer::with_config(config).score(&frame).unwrap();
        let quality = column_f64(&scores, "quality_score");
        assert!(quality[5].is_none());
        assert!(quality[..5].iter().all(Option::is_some));
        // F misses both dimensions, one more than allowed
        assert!(column_f64(&scores, "final_score")[5].is_none());
        assert_eq!(column_rank(&scores)[5], None);
    }

    #[test]
    fn missing_dimension_within_allowance_still_scores() {
        let frame = df! {
            "code" => ["A", "B", "C", "D", "E", "F"],
            "roe" => [1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            "roa" => [1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            "fcfe_growth" => [Some(1.0), Some(2.0), Some(3.0), Some(4.0), Some(5.0), None],
        }
        .unwrap();

        let scores = DimensionScorer::with_config(two_factor_config(None)).score(&frame).unwrap();
        assert!(column_f64(&scores, "growth_score")[5].is_none());
        assert!(column_f64(&scores, "final_score")[5].is_some());
        assert!(column_rank(&scores).iter().all(Option::is_some));
    }

    #[test]
    fn small_groups_keep_raw_scores() {
        let frame = df! {
            "code" => ["A", "B", "C"],
            "roe" => [1.0, 3.0, 2.0],
            "roa" => [1.0, 3.0, 2.0],
        }
        .unwrap();
        let config = DimensionScoreConfig {
            dimensions: vec![Dimension::new("quality", &["roe", "roa"], 1)],
            max_missing_dimensions: 0,
            ..two_factor_config(None)
        };

        let scores = DimensionScorer::with_config(config).score(&frame).unwrap();
        assert_eq!(column_f64(&scores, "final_score"), vec![Some(1.0), Some(3.0), Some(2.0)]);
        assert_eq!(column_rank(&scores), vec![Some(3), Some(1), Some(2)]);
    }

    #[test]
    fn rows_without_group_are_not_scored() {
        let frame = df! {
            "code" => ["A", "B", "C", "D", "E", "F"],
            "size" => [Some("large"), Some("large"), Some("large"), Some("large"),
                       Some("large"), None],
            "roe" => [1.0, 2.0, 3.0, 4.0, 5.0, 9.0],
        }
        .unwrap();
        let config = DimensionScoreConfig {
            dimensions: vec![Dimension::new("quality", &["roe"], 1)],
            max_missing_dimensions: 0,
            ..two_factor_config(Some("size"))
        };

        let scores = DimensionScorer::with_config(config).score(&frame).unwrap();
        assert!(column_f64(&scores, "final_score")[5].is_none());
        assert_eq!(column_rank(&scores)[4], Some(1));
    }

    #[test]
    fn missing_factor_column_counts_as_missing() {
        let frame = df! {
            "code" => ["A", "B"],
            "roe" => [1.0, 2.0],
        }
        .unwrap();
        let config = DimensionScoreConfig {
            dimensions: vec![Dimension::new("quality", &["roe", "roa"], 2)],
            max_missing_dimensions: 0,
            ..two_factor_config(None)
        };

        let scores = DimensionScorer::with_config(config).score(&frame).unwrap();
        assert_eq!(column_f64(&scores, "final_score"), vec![None, None]);
    }

    #[test]
    fn default_config_is_valid() {
        let config = DimensionScoreConfig::default();
        config.validate().unwrap();
        assert_eq!(config.dimensions.len(), 3);
        assert_eq!(config.min_group_size, MIN_GROUP_SIZE);
    }

    #[rstest]
    #[case::no_dimensions(DimensionScoreConfig { dimensions: vec![], ..Default::default() })]
    #[case::zero_min_factors(DimensionScoreConfig {
        dimensions: vec![Dimension::new("q", &["roe"], 0)],
        max_missing_dimensions: 0,
        ..Default::default()
    })]
    #[case::min_factors_above_count(DimensionScoreConfig {
        dimensions: vec![Dimension::new("q", &["roe"], 2)],
        max_missing_dimensions: 0,
        ..Default::default()
    })]
    #[case::repeated_dimension(DimensionScoreConfig {
        dimensions: vec![Dimension::new("q", &["roe"], 1), Dimension::new("q", &["roa"], 1)],
        ..Default::default()
    })]
    #[case::nothing_left_to_average(DimensionScoreConfig {
        max_missing_dimensions: 3,
        ..Default::default()
    })]
    #[case::tiny_groups(DimensionScoreConfig { min_group_size: 1, ..Default::default() })]
    fn invalid_configs_are_rejected(#[case] config: DimensionScoreConfig) {
        assert!(matches!(config.validate(), Err(GrowthError::InvalidConfig(_))));
        let frame = df! { "entity" => ["A"] }.unwrap();
        assert!(DimensionScorer::with_config(config).score(&frame).is_err());
    }

    #[test]
    fn missing_entity_column_is_an_error() {
        let frame = df! { "ticker" => ["A"], "roe" => [1.0] }.unwrap();
        let config = DimensionScoreConfig {
            dimensions: vec![Dimension::new("quality", &["roe"], 1)],
            max_missing_dimensions: 0,
            ..two_factor_config(None)
        };
        assert!(matches!(
            DimensionScorer::with_config(config).score(&frame),
            Err(GrowthError::Polars(_))
        ));
    }
}
