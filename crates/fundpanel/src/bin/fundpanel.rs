//! Fundamentals panel CLI tool.
//!
//! Reshapes long fundamentals tables into wide panels, derives winsorized
//! ratios, scores multi-year growth, ranks entities on factor dimensions and
//! runs configured batch pipelines.
//!
//! Usage: `cargo run --features cli --bin fundpanel -- <COMMAND>`
//! Example: `cargo run --features cli --bin fundpanel -- growth data/fcfe.csv --prefix fcfe`

use std::{
    fs::OpenOptions,
    path::{Path, PathBuf},
    process::ExitCode,
    sync::Mutex,
};

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand, ValueEnum};
use fundpanel::{
    growth::{
        CompositeGrowthBuilder, CompositeGrowthConfig, DegeneratePolicy, DimensionScoreConfig,
        DimensionScorer, StableGrowthConfig, StableGrowthEstimator,
    },
    math::{WinsorAxis, Winsorizer, panel_ratio, winsorize_frame},
    pipeline::{CsvRecordSink, CsvRecordSource, Pipeline, PipelineConfig, run_config_file},
    primitives::EntityId,
    traits::GrowthEstimator,
    utils::{
        LongLayout, inspection_frame, pivot_field, pivot_wide, read_frame_csv, read_long_csv,
        read_panel_csv, write_frame_csv, write_panel_csv,
    },
};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber, fmt::writer::MakeWriterExt};

#[derive(Parser)]
#[command(name = "fundpanel")]
#[command(about = "Fundamentals panels, ratios and composite growth scores", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Also append log lines to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pivot a long table into a wide entity x period panel
    Pivot {
        /// Long CSV file
        input: PathBuf,

        /// Value column, or field name with --tidy
        #[arg(long)]
        value: String,

        /// Input is a tidy (entity, period, field, value) table
        #[arg(long)]
        tidy: bool,

        #[command(flatten)]
        layout: LayoutArgs,

        /// Output panel CSV
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Divide two panels cell by cell and winsorize the result
    Ratio {
        /// Numerator panel CSV
        numerator: PathBuf,

        /// Denominator panel CSV
        denominator: PathBuf,

        /// Output panel CSV
        #[arg(short, long)]
        output: PathBuf,

        /// Write the raw ratio without winsorizing
        #[arg(long)]
        no_winsorize: bool,

        #[command(flatten)]
        winsor: WinsorArgs,
    },

    /// Clip a panel (or any table) to quantile bounds
    Winsorize {
        /// Input CSV
        input: PathBuf,

        /// Output CSV
        #[arg(short, long)]
        output: PathBuf,

        /// Treat the input as a generic table and clip each numeric column
        #[arg(long)]
        table: bool,

        #[command(flatten)]
        winsor: WinsorArgs,
    },

    /// Score multi-year growth of a panel
    Growth {
        /// Panel CSV
        input: PathBuf,

        /// Factor prefix for output columns
        #[arg(long)]
        prefix: String,

        /// Horizons in years
        #[arg(long, value_delimiter = ',', default_value = "3,4,5")]
        years: Vec<u32>,

        /// Minimum valid horizon scores to keep an entity
        #[arg(long, default_value = "2")]
        min_valid: usize,

        /// Treat degenerate estimates as missing instead of ranking them last
        #[arg(long)]
        exclude_degenerate: bool,

        /// Reporting periods per year
        #[arg(long, default_value = "4")]
        periods_per_year: usize,

        /// Output score table CSV (defaults to <prefix>_growth_scores.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Entities to print
        #[arg(long, default_value = "10")]
        top: usize,
    },

    /// Rank entities on dimension scores built from factor columns
    Score {
        /// Factor table CSV, one row per entity
        input: PathBuf,

        /// Dimension configuration (JSON); defaults to the built-in dimensions
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Entity column, overriding the configuration
        #[arg(long)]
        entity_col: Option<String>,

        /// Peer group column, overriding the configuration
        #[arg(long)]
        group_col: Option<String>,

        /// Output CSV
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Run every job of a JSON pipeline configuration
    Run {
        /// Pipeline configuration file
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Replay a record file through the paced, batched collector
    Collect {
        /// Record CSV (entity,period,field,value)
        source: PathBuf,

        /// Record CSV receiving the batches
        #[arg(short, long)]
        output: PathBuf,

        /// Entities to collect (defaults to every entity in the source)
        #[arg(long, value_delimiter = ',')]
        entities: Vec<String>,

        /// Pipeline configuration supplying collector defaults
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Pause between source calls in milliseconds [default: 200]
        #[arg(long)]
        delay_ms: Option<u64>,

        /// Records per written batch [default: 1000]
        #[arg(long)]
        batch_size: Option<usize>,

        /// Append to the output instead of truncating it
        #[arg(long)]
        append: bool,
    },

    /// Extract a sorted, numeric subset of a long table for spot checks
    Inspect {
        /// Long CSV file
        input: PathBuf,

        /// Fields to keep
        #[arg(long, value_delimiter = ',', required = true)]
        fields: Vec<String>,

        #[command(flatten)]
        layout: LayoutArgs,

        /// Output CSV
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Args)]
struct LayoutArgs {
    /// Entity column of the long table
    #[arg(long, default_value = "ts_code")]
    entity_col: String,

    /// Period column of the long table
    #[arg(long, default_value = "end_date")]
    period_col: String,
}

impl LayoutArgs {
    fn layout(&self) -> LongLayout {
        LongLayout {
            entity_col: self.entity_col.clone(),
            period_col: self.period_col.clone(),
            ..LongLayout::default()
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum AxisArg {
    /// Per period column
    Columns,
    /// Per entity row
    Rows,
}

#[derive(Args)]
struct WinsorArgs {
    /// Lower quantile
    #[arg(long, default_value = "0.01")]
    lower: f64,

    /// Upper quantile
    #[arg(long, default_value = "0.99")]
    upper: f64,

    /// Clip axis
    #[arg(long, value_enum, default_value = "columns")]
    axis: AxisArg,
}

impl WinsorArgs {
    fn winsorizer(&self) -> Result<Winsorizer> {
        let axis = match self.axis {
            AxisArg::Columns => WinsorAxis::Columns,
            AxisArg::Rows => WinsorAxis::Rows,
        };
        Ok(Winsorizer::with_axis(self.lower, self.upper, axis)?)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose, cli.log_file.as_deref()) {
        eprintln!("Error: {e:#}");
        return ExitCode::FAILURE;
    }

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8, log_file: Option<&Path>) -> Result<()> {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = FmtSubscriber::builder().with_env_filter(filter).with_target(false);

    let installed = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(std::io::stderr.and(Mutex::new(file))).try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };
    installed.map_err(|e| anyhow!("installing log subscriber: {e}"))
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Pivot { input, value, tidy, layout, output } => {
            let frame = read_long_csv(&input)?;
            let layout = layout.layout();
            let panel = if tidy {
                pivot_field(&frame, &layout, &value)?
            } else {
                pivot_wide(&frame, &layout, &value)?
            };
            write_panel_csv(&panel, &output)?;
            info!(
                entities = panel.n_entities(),
                periods = panel.n_periods(),
                output = %output.display(),
                "panel written"
            );
        }
        Commands::Ratio { numerator, denominator, output, no_winsorize, winsor } => {
            let num = read_panel_csv(&numerator)?;
            let den = read_panel_csv(&denominator)?;
            let ratio = panel_ratio(&num, &den)?;
            let ratio =
                if no_winsorize { ratio } else { winsor.winsorizer()?.apply_panel(&ratio)? };
            write_panel_csv(&ratio, &output)?;
            info!(valid = ratio.count_valid(), output = %output.display(), "ratio written");
        }
        Commands::Winsorize { input, output, table, winsor } => {
            let winsorizer = winsor.winsorizer()?;
            if table {
                let frame = read_frame_csv(&input)?;
                let clipped = winsorize_frame(&frame, winsorizer.lower(), winsorizer.upper())?;
                write_frame_csv(&clipped, &output)?;
            } else {
                let panel = read_panel_csv(&input)?;
                write_panel_csv(&winsorizer.apply_panel(&panel)?, &output)?;
            }
            info!(output = %output.display(), "winsorized");
        }
        Commands::Growth {
            input,
            prefix,
            years,
            min_valid,
            exclude_degenerate,
            periods_per_year,
            output,
            top,
        } => {
            let panel = read_panel_csv(&input)?;
            let stable =
                StableGrowthConfig { periods_per_year, ..StableGrowthConfig::default() };
            stable.validate()?;
            let policy = if exclude_degenerate {
                DegeneratePolicy::Exclude
            } else {
                DegeneratePolicy::Floor
            };
            let composite = CompositeGrowthConfig {
                horizons: years,
                min_valid_scores: min_valid,
                degenerate_policy: policy,
            };
            let estimator = StableGrowthEstimator::with_config(stable);
            let table = CompositeGrowthBuilder::with_config(estimator, composite)
                .build(&panel, &prefix)?;

            let output =
                output.unwrap_or_else(|| PathBuf::from(format!("{prefix}_growth_scores.csv")));
            write_frame_csv(&table.to_frame()?, &output)?;
            info!(retained = table.len(), output = %output.display(), "growth scores written");

            println!("{:<16} {:>10}", "entity", table.composite_column());
            for row in table.rows().iter().take(top) {
                println!("{:<16} {:>10.4}", row.entity.as_str(), row.composite);
            }
        }
        Commands::Score { input, config, entity_col, group_col, output } => {
            let mut config: DimensionScoreConfig = match config {
                Some(path) => {
                    let json = std::fs::read_to_string(&path)
                        .with_context(|| format!("reading {}", path.display()))?;
                    serde_json::from_str(&json)
                        .with_context(|| format!("parsing {}", path.display()))?
                }
                None => DimensionScoreConfig::default(),
            };
            if let Some(entity_col) = entity_col {
                config.entity_col = entity_col;
            }
            if group_col.is_some() {
                config.group_col = group_col;
            }

            let frame = read_frame_csv(&input)?;
            let scores = DimensionScorer::with_config(config).score(&frame)?;
            write_frame_csv(&scores, &output)?;
            info!(rows = scores.height(), output = %output.display(), "dimension scores written");
        }
        Commands::Run { config } => {
            let summary = run_config_file(&config)
                .with_context(|| format!("pipeline {} failed", config.display()))?;
            for path in summary.panels.iter().chain(&summary.score_tables) {
                println!("{}", path.display());
            }
        }
        Commands::Collect { source, output, entities, config, delay_ms, batch_size, append } => {
            let mut config = match config {
                Some(path) => PipelineConfig::from_json_file(&path)
                    .with_context(|| format!("loading {}", path.display()))?,
                None => PipelineConfig::default(),
            };
            if let Some(delay_ms) = delay_ms {
                config.collector.request_delay_ms = delay_ms;
            }
            if let Some(batch_size) = batch_size {
                config.collector.batch_size = batch_size;
            }
            let pipeline = Pipeline::new(config)?;

            let source = CsvRecordSource::open(&source)?;
            let entities: Vec<EntityId> = if entities.is_empty() {
                source.entities()
            } else {
                entities.into_iter().map(EntityId::new).collect()
            };
            let sink = if append {
                CsvRecordSink::append(&output)
            } else {
                CsvRecordSink::create(&output)?
            };
            let summary = pipeline.collect(source, sink, &entities)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Inspect { input, fields, layout, output } => {
            let frame = read_long_csv(&input)?;
            let fields: Vec<&str> = fields.iter().map(String::as_str).collect();
            let extract = inspection_frame(&frame, &layout.layout(), &fields)?;
            write_frame_csv(&extract, &output)?;
            info!(rows = extract.height(), output = %output.display(), "extract written");
        }
    }
    Ok(())
}
