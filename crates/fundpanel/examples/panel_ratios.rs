//! Example: Long Tables to Winsorized Ratio Panels
//!
//! This example builds two long fundamentals tables, pivots each into a wide
//! entity x period panel and derives a winsorized free-cash-flow-to-assets
//! ratio:
//! - `records_to_frame` / `pivot_field`: Long to wide reshaping
//! - `panel_ratio`: Cell-wise division with undefined cells left missing
//! - `Winsorizer`: Per-period quantile clipping

use chrono::NaiveDate;
use fundpanel::{
    math::{Winsorizer, panel_ratio},
    primitives::FundamentalRecord,
    utils::{LongLayout, pivot_field, records_to_frame},
};
use rand::Rng;

const ENTITIES: &[&str] =
    &["000001.SZ", "000002.SZ", "000333.SZ", "600000.SH", "600036.SH", "600519.SH"];

fn main() -> anyhow::Result<()> {
    println!("=== Ratio Panels from Long Tables ===\n");

    let mut rng = rand::thread_rng();
    let quarters: Vec<NaiveDate> = [(3, 31), (6, 30), (9, 30), (12, 31)]
        .iter()
        .filter_map(|&(m, d)| NaiveDate::from_ymd_opt(2023, m, d))
        .collect();

    let mut records = Vec::new();
    for entity in ENTITIES {
        let assets: f64 = rng.gen_range(1_000.0..50_000.0);
        for &quarter in &quarters {
            // an occasional missing filing
            let fcf = (rng.r#gen::<f64>() > 0.1).then(|| assets * rng.gen_range(-0.05..0.15));
            records.push(FundamentalRecord::new(*entity, quarter, "fcf", fcf));
            records.push(FundamentalRecord::new(*entity, quarter, "total_assets", Some(assets)));
        }
    }
    // one shell company with zero assets
    records.push(FundamentalRecord::new("900001.SH", quarters[3], "fcf", Some(12.0)));
    records.push(FundamentalRecord::new("900001.SH", quarters[3], "total_assets", Some(0.0)));

    let layout = LongLayout::records();
    let frame = records_to_frame(&records, &layout)?;
    println!("Long table: {} rows", frame.height());

    let fcf = pivot_field(&frame, &layout, "fcf")?;
    let assets = pivot_field(&frame, &layout, "total_assets")?;
    println!(
        "Panels: {} entities x {} periods ({} valid fcf cells)\n",
        fcf.n_entities(),
        fcf.n_periods(),
        fcf.count_valid()
    );

    let raw = panel_ratio(&fcf, &assets)?;
    let clipped = Winsorizer::new(0.05, 0.95)?.apply_panel(&raw)?;

    println!("{:<12} {:>10} {:>10}", "entity", "raw", "winsorized");
    let last = raw.n_periods() - 1;
    for (i, entity) in raw.entities().iter().enumerate() {
        println!(
            "{:<12} {:>10.4} {:>10.4}",
            entity.as_str(),
            raw.values()[[i, last]],
            clipped.values()[[i, last]]
        );
    }

    println!("\nZero-asset and missing cells stay NaN; they never become zero.");
    Ok(())
}
