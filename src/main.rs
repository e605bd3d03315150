use anyhow::{Context, Result};
use bugchart::config::{AggregateFn, ChartConfig, ChartVariant, MetricKind, SortDirection, SortTarget};
use bugchart::loader::{load_dataset, FileSource};
use bugchart::{render_chart, ChartOptions, OutputFormat};
use clap::{Args, Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "bugchart")]
#[command(about = "Aggregate defect-tracking records into chart specifications", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a chart from a data file
    Chart(ChartArgs),
    /// List the fields of a data file
    Fields {
        /// JSON data file with `metadata` and `data` blocks
        #[arg(long, value_name = "FILE")]
        data: PathBuf,
    },
}

#[derive(Args, Debug)]
struct ChartArgs {
    /// JSON data file with `metadata` and `data` blocks
    #[arg(long, value_name = "FILE")]
    data: PathBuf,

    /// JSON chart configuration; flags below override its values
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[arg(long, value_enum)]
    variant: Option<ChartVariant>,

    /// Field bucketed onto the category axis
    #[arg(long = "x", value_name = "FIELD")]
    x_field: Option<String>,

    /// Field splitting each category into series
    #[arg(long = "group", value_name = "FIELD")]
    group_field: Option<String>,

    #[arg(long, value_enum)]
    metric: Option<MetricKind>,

    /// Numeric field aggregated by a value metric
    #[arg(long = "value", value_name = "FIELD")]
    value_field: Option<String>,

    #[arg(long = "agg", value_enum)]
    aggregate: Option<AggregateFn>,

    #[arg(long, value_enum)]
    sort_by: Option<SortTarget>,

    #[arg(long = "order", value_enum)]
    sort_order: Option<SortDirection>,

    #[arg(long, value_enum)]
    group_order: Option<SortDirection>,

    #[arg(long, value_enum, default_value = "json")]
    format: OutputFormat,

    #[arg(long, default_value_t = 800)]
    width: u32,

    #[arg(long, default_value_t = 600)]
    height: u32,

    /// Write to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

impl ChartArgs {
    fn chart_config(&self) -> Result<ChartConfig> {
        let mut config = match &self.config {
            Some(path) => ChartConfig::from_json_file(path)?,
            None => ChartConfig::default(),
        };

        if let Some(v) = self.variant { config.variant = v; }
        if let Some(x) = &self.x_field { config.x_field = x.clone(); }
        if let Some(g) = &self.group_field { config.group_field = Some(g.clone()); }
        if let Some(m) = self.metric { config.metric = m; }
        if let Some(v) = &self.value_field {
            config.value_field = Some(v.clone());
            // Naming a value field implies a value metric unless told otherwise
            if self.metric.is_none() { config.metric = MetricKind::Value; }
        }
        if let Some(a) = self.aggregate { config.aggregate = a; }
        if let Some(s) = self.sort_by { config.sort_by = s; }
        if let Some(o) = self.sort_order { config.sort_order = o; }
        if let Some(o) = self.group_order { config.group_order = o; }

        Ok(config)
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Chart(args) => run_chart(args),
        Command::Fields { data } => run_fields(data),
    }
}

fn run_chart(args: ChartArgs) -> Result<()> {
    let dataset = load_dataset(&FileSource::new(&args.data))
        .with_context(|| format!("Failed to load {}", args.data.display()))?;

    let mut config = args.chart_config()?;
    config.fit_to_fields(&dataset.fields);
    config.validate(&dataset.fields).context("Invalid chart configuration")?;

    let options = ChartOptions {
        width: args.width,
        height: args.height,
        format: args.format,
    };
    let bytes = render_chart(&dataset, &config, &options).context("Failed to render chart")?;

    match &args.output {
        Some(path) => std::fs::write(path, &bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => write_stdout(&bytes)?,
    }
    Ok(())
}

fn run_fields(data: PathBuf) -> Result<()> {
    let dataset = load_dataset(&FileSource::new(&data))
        .with_context(|| format!("Failed to load {}", data.display()))?;

    let mut text = String::new();
    for field in &dataset.fields {
        text.push_str(field);
        text.push('\n');
    }
    text.push_str(&format!("{} records\n", dataset.len()));
    write_stdout(text.as_bytes())
}

fn write_stdout(bytes: &[u8]) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle.write_all(bytes).context("Failed to write to stdout")?;
    handle.flush().context("Failed to flush stdout")?;
    Ok(())
}
