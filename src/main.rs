use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use surveyplot::graph::render_chart;
use surveyplot::logging::{init_logging, LogConfig, LogFormat};
use surveyplot::{ChartView, OutputFormat, RenderOptions, Selectors, Session, SurveySchema};

#[derive(Parser, Debug)]
#[command(name = "surveyplot")]
#[command(about = "Explore survey CSV exports with automatically chosen charts", long_about = None)]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, global = true)]
    log_format: LogFormat,

    /// Survey schema JSON file (defaults to the built-in power bank survey)
    #[arg(long, global = true)]
    schema: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the columns available for analysis
    Columns {
        /// CSV file, or '-' for stdin
        csv: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Chart the distribution of one column
    Univariate {
        csv: PathBuf,
        /// Column name or index from `columns`
        column: String,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Chart the relationship between two columns
    Multivariate {
        csv: PathBuf,
        first: String,
        second: String,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Print the active schema as JSON
    Schema,
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Print the chart spec as JSON instead of rendering it
    #[arg(long)]
    json: bool,

    /// Write the image here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(long, value_parser = parse_format, default_value = "png")]
    format: OutputFormat,

    #[arg(long, default_value_t = 800)]
    width: u32,

    #[arg(long, default_value_t = 600)]
    height: u32,
}

fn parse_format(value: &str) -> Result<OutputFormat, String> {
    match value.to_ascii_lowercase().as_str() {
        "png" => Ok(OutputFormat::Png),
        "svg" => Ok(OutputFormat::Svg),
        other => Err(format!("unsupported format '{other}' (expected png or svg)")),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = LogConfig::from_verbosity(cli.verbose, cli.quiet).with_format(cli.log_format);
    init_logging(&log_config).context("Failed to initialise logging")?;

    let schema = match &cli.schema {
        Some(path) => SurveySchema::from_path(path)
            .with_context(|| format!("Failed to load schema from {}", path.display()))?,
        None => SurveySchema::power_bank_survey(),
    };

    match cli.command {
        Command::Schema => {
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
        Command::Columns { csv, json } => {
            let session = load_session(schema, &csv)?;
            let selectors = session.selectors();
            if json {
                println!("{}", serde_json::to_string_pretty(&selectors)?);
            } else {
                print_columns(&session, &selectors);
            }
        }
        Command::Univariate { csv, column, output } => {
            let session = load_session(schema, &csv)?;
            let selectors = session.selectors();
            let column = resolve_column(&column, &selectors.univariate)?;
            let view = session.univariate(Some(&column));
            emit(&view, &output)?;
        }
        Command::Multivariate {
            csv,
            first,
            second,
            output,
        } => {
            let session = load_session(schema, &csv)?;
            let selectors = session.selectors();
            let first = resolve_column(&first, &selectors.multivariate)?;
            let second = resolve_column(&second, &selectors.multivariate)?;
            let view = session.multivariate(Some(&first), Some(&second));
            emit(&view, &output)?;
        }
    }

    Ok(())
}

fn load_session(schema: SurveySchema, csv: &Path) -> Result<Session> {
    let (filename, bytes) = if csv == Path::new("-") {
        let mut bytes = Vec::new();
        io::stdin()
            .read_to_end(&mut bytes)
            .context("Failed to read CSV from stdin")?;
        ("stdin.csv".to_string(), bytes)
    } else {
        let bytes = fs::read(csv).with_context(|| format!("Failed to read {}", csv.display()))?;
        let filename = csv
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        (filename, bytes)
    };

    let mut session = Session::new(schema);
    let status = session.upload(&filename, &bytes);
    if session.dataset().is_none() {
        bail!("{}", status.message);
    }
    eprintln!("{}", status.message);
    Ok(session)
}

/// A number picks from the listed columns, anything else is taken as a name.
fn resolve_column(arg: &str, choices: &[String]) -> Result<String> {
    match arg.parse::<usize>() {
        Ok(idx) if !choices.iter().any(|c| c == arg) => choices
            .get(idx)
            .cloned()
            .with_context(|| format!("Column index {idx} out of range (0..{})", choices.len())),
        _ => Ok(arg.to_string()),
    }
}

fn print_columns(session: &Session, selectors: &Selectors) {
    eprintln!("{}", selectors.message);
    let kind_of = |name: &str| {
        session
            .dataset()
            .and_then(|d| d.column(name))
            .map(|c| surveyplot::classify(session.schema(), c).to_string())
            .unwrap_or_default()
    };

    println!("Univariate:");
    for (idx, name) in selectors.univariate.iter().enumerate() {
        println!("  {idx:>2}  {:<13} {name}", kind_of(name));
    }
    println!("Multivariate:");
    for (idx, name) in selectors.multivariate.iter().enumerate() {
        println!("  {idx:>2}  {:<13} {name}", kind_of(name));
    }
    if let Some(default) = &selectors.default_univariate {
        println!("Default variable: {default}");
    }
    if let (Some(first), Some(second)) = (&selectors.default_first, &selectors.default_second) {
        println!("Default pair: {first} / {second}");
    }
}

fn emit(view: &ChartView, output: &OutputArgs) -> Result<()> {
    tracing::info!(
        kind = view.chart.geometry.kind_name(),
        severity = ?view.severity,
        "chart ready"
    );
    if !view.message.is_empty() {
        eprintln!("{}", view.message);
    }

    let bytes = if output.json {
        let mut json = serde_json::to_vec_pretty(view)?;
        json.push(b'\n');
        json
    } else {
        let options = RenderOptions {
            width: output.width,
            height: output.height,
            format: output.format,
        };
        render_chart(&view.chart, &options).context("Failed to render chart")?
    };

    match &output.output {
        Some(path) => {
            fs::write(path, &bytes).with_context(|| format!("Failed to write {}", path.display()))?
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(&bytes)
                .context("Failed to write chart to stdout")?;
            handle.flush().context("Failed to flush stdout")?;
        }
    }

    Ok(())
}
