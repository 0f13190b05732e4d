//! Example: Composite Growth Scores
//!
//! This example simulates seven years of quarterly free cash flow for a small
//! universe and ranks it by multi-year growth:
//! - `StableGrowthEstimator`: Window-averaged CAGR per entity and horizon
//! - `CompositeGrowthBuilder`: Per-horizon z-scores blended into one score
//!
//! One entity turns loss-making and one has too little history, showing how
//! degenerate and undefined estimates are handled.

use chrono::NaiveDate;
use fundpanel::{
    growth::{CompositeGrowthBuilder, StableGrowthEstimator},
    primitives::{EntityId, WidePanel},
    traits::GrowthEstimator,
};
use ndarray::Array2;
use rand_distr::{Distribution, Normal};

const QUARTERS: usize = 28;

fn main() -> anyhow::Result<()> {
    println!("=== Composite Growth Scores ===\n");

    let periods: Vec<NaiveDate> = (0..QUARTERS as i32)
        .filter_map(|q| {
            let (month, day) = [(3, 31), (6, 30), (9, 30), (12, 31)][(q % 4) as usize];
            NaiveDate::from_ymd_opt(2017 + q / 4, month, day)
        })
        .collect();

    let universe = [
        ("STEADY", 0.06),
        ("GROWER", 0.18),
        ("ROCKET", 0.40),
        ("SHRINKER", -0.08),
        ("LOSSES", 0.0),
        ("NEWLIST", 0.25),
    ];

    let mut rng = rand::thread_rng();
    let noise = Normal::new(0.0, 0.03)?;
    let mut values = Array2::from_elem((universe.len(), QUARTERS), f64::NAN);
    for (i, (name, rate)) in universe.iter().enumerate() {
        for q in 0..QUARTERS {
            let level = 100.0 * (1.0_f64 + rate).powf(q as f64 / 4.0);
            values[[i, q]] = match *name {
                "LOSSES" if q >= QUARTERS - 12 => -20.0,
                "NEWLIST" if q < QUARTERS - 8 => f64::NAN,
                _ => level * (1.0 + noise.sample(&mut rng)),
            };
        }
    }

    let entities = universe.iter().map(|(name, _)| EntityId::from(*name)).collect();
    let panel = WidePanel::new(entities, periods, values)?;

    let estimator = StableGrowthEstimator::new();
    println!("Per-horizon estimates ({}):", estimator.name());
    for (i, entity) in panel.entities().iter().enumerate() {
        let cells: Vec<String> = [3, 4, 5]
            .iter()
            .map(|&y| {
                let estimate = estimator.estimate(panel.row(i), y);
                match estimate.value() {
                    Some(v) => format!("{:>8.2}%", v * 100.0),
                    None => format!("{:>9}", estimate.status()),
                }
            })
            .collect();
        println!("  {:<10} {}", entity.as_str(), cells.join(" "));
    }

    let table = CompositeGrowthBuilder::new().build(&panel, "fcf")?;
    println!("\nRanking ({} of {} retained):", table.len(), panel.n_entities());
    for (rank, row) in table.rows().iter().enumerate() {
        println!("  {:>2}. {:<10} {:>7.3}", rank + 1, row.entity.as_str(), row.composite);
    }

    let frame = table.to_frame()?;
    println!("\nScore table columns: {:?}", frame.get_column_names_str());
    Ok(())
}
