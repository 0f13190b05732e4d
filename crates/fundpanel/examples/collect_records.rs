//! Example: Paced Record Collection
//!
//! This example wires an in-memory source to a CSV sink through the
//! `Collector`, then replays the written file with `CsvRecordSource`:
//! - Fixed delay between source calls
//! - Records buffered and written in batches
//! - Unknown entities logged and skipped

use chrono::NaiveDate;
use fundpanel::{
    pipeline::{Collector, CollectorConfig, CsvRecordSink, CsvRecordSource},
    primitives::{EntityId, FundamentalRecord},
    traits::FundamentalsSource,
};

fn main() -> anyhow::Result<()> {
    println!("=== Paced Record Collection ===\n");

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("records.csv");

    let mut rows = Vec::new();
    for entity in ["000001.SZ", "000002.SZ", "600519.SH"] {
        for year in 2019..=2023 {
            let period =
                NaiveDate::from_ymd_opt(year, 12, 31).ok_or_else(|| anyhow::anyhow!("bad date"))?;
            let value = f64::from(year - 2018) * 10.0;
            rows.push(FundamentalRecord::new(entity, period, "fcfe", Some(value)));
            rows.push(FundamentalRecord::new(entity, period, "q_roe", None));
        }
    }
    let source = CsvRecordSource::from_records("memory", rows);

    let mut entities = source.entities();
    entities.push(EntityId::from("999999.SH"));

    let config = CollectorConfig { request_delay_ms: 50, batch_size: 8 };
    let sink = CsvRecordSink::create(&path)?;
    let summary = Collector::new(source, sink, config).run(&entities)?;

    println!(
        "Fetched:  {} entities ({} failed)",
        summary.entities_fetched, summary.entities_failed
    );
    println!("Written:  {} rows in {} batches", summary.rows_written, summary.batches_written);

    let mut replay = CsvRecordSource::open(&path)?;
    let first = replay.fetch(&EntityId::from("600519.SH"))?;
    println!("\nReplayed {} rows for 600519.SH:", first.len());
    for record in first.iter().take(4) {
        println!("  {} {:<6} {:?}", record.period, record.field, record.value);
    }
    Ok(())
}
