// Command-line front end over the filesystem-backed service.
//
// Each subcommand maps to one view: upload stores an export and logs it,
// the rest re-read the stored export and print a table or JSON.
use clap::{Parser, Subcommand};
use ram_cost_report::config::Config;
use ram_cost_report::output;
use ram_cost_report::reports::SeriesMode;
use ram_cost_report::Result;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "ram-cost-report", version, about = "RAM-hour cost reports from cloud-billing CSV exports")]
struct Cli {
    #[command(flatten)]
    config: Config,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Store a billing export and record it in the upload log
    Upload {
        file: PathBuf,
        /// Account the export belongs to
        #[arg(long)]
        account: Option<String>,
        /// Key to store the export under (defaults to the file name)
        #[arg(long)]
        name: Option<String>,
    },
    /// List uploaded exports, newest first
    List,
    /// Yearly RAM cost by deployment and provider
    Dashboard {
        key: String,
        /// Collapse deployments into the top five plus "Others"
        #[arg(long)]
        top: bool,
    },
    /// Deployments available for a report
    Select { key: String },
    /// Itemized RAM cost report for one deployment
    Report {
        key: String,
        column: String,
        deployment: String,
    },
    /// Write every normalized row to a CSV file
    Export { key: String, out: PathBuf },
}

fn init_logging(quiet: bool) {
    // --quiet overrides RUST_LOG.
    let filter = if quiet {
        tracing_subscriber::EnvFilter::new("warn")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("ram_cost_report=info"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let service = cli.config.open()?;
    match cli.command {
        Command::Upload {
            file,
            account,
            name,
        } => {
            let bytes = std::fs::read(&file)?;
            let key = match name {
                Some(n) => n,
                None => file
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            };
            let entry = service.upload(&key, &bytes, account.as_deref())?;
            if cli.json {
                output::print_json(&entry)?;
            } else {
                println!("{}", output::render_uploads(std::slice::from_ref(&entry)));
            }
        }
        Command::List => {
            let entries = service.list_uploads();
            if cli.json {
                output::print_json(&entries)?;
            } else {
                println!("{}", output::render_uploads(&entries));
            }
        }
        Command::Dashboard { key, top } => {
            let mode = if top {
                SeriesMode::TopWithOthers
            } else {
                SeriesMode::All
            };
            let dashboard = service.dashboard(&key, mode)?;
            if cli.json {
                output::print_json(&dashboard)?;
            } else {
                println!("{}", output::render_dashboard(&dashboard));
            }
        }
        Command::Select { key } => {
            let selection = service.select_deployment(&key)?;
            if cli.json {
                output::print_json(&selection)?;
            } else {
                println!("{}", output::render_selection(&selection));
            }
        }
        Command::Report {
            key,
            column,
            deployment,
        } => {
            let report = service.report(&key, &column, &deployment)?;
            if cli.json {
                output::print_json(&report)?;
            } else {
                println!("{}", output::render_report(&report));
            }
        }
        Command::Export { key, out } => {
            let listing = service.listing(&key)?;
            output::write_csv(&out, &listing)?;
            info!(rows = listing.len(), out = %out.display(), "exported listing");
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.quiet);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
