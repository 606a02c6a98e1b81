//! escriba - incident report drafting CLI.
//!
//! Rewrites informal drafts into formal report text and manages saved
//! reports.

use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use chrono::Local;
use clap::{Args as ClapArgs, CommandFactory, FromArgMatches, Parser, Subcommand};
use tracing::{info, warn};

use escriba::config::{Config, Secrets};
use escriba::{
    BopmReport, Details, EscribaBuilder, JsonFileStore, MemoryReportStore, ReportFilter,
    ReportStore, Rewriter, StoredReport,
};

/// Escriba CLI
#[derive(Parser)]
#[command(name = "escriba")]
#[command(version = escriba::PKG_VERSION)]
#[command(about = "Formal incident-report drafting")]
struct Args {
    /// Path to configuration file.
    #[arg(short, long, env = "ESCRIBA_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rewrite a draft into formal report text
    Rewrite {
        /// Incident nature (e.g. "Furto")
        #[arg(short, long)]
        nature: String,
        /// Draft narrative (or omit to read from stdin)
        draft: Option<String>,
        /// Skip the result cache
        #[arg(long)]
        no_cache: bool,
    },

    /// Validate, rewrite and save a report
    Save(SaveArgs),

    /// Show a saved report
    Show {
        /// Report number
        number: String,
    },

    /// List the most recently saved reports
    List {
        /// Maximum number of reports
        #[arg(short, long, default_value_t = 50)]
        limit: usize,
    },

    /// Search saved reports (case-insensitive substring match)
    Search {
        #[arg(long)]
        number: Option<String>,
        #[arg(long)]
        offender: Option<String>,
        #[arg(long)]
        nature: Option<String>,
        #[arg(long)]
        driver: Option<String>,
        /// Maximum number of reports
        #[arg(short, long, default_value_t = 50)]
        limit: usize,
    },

    /// Delete a saved report
    Delete {
        /// Report number
        number: String,
    },

    /// Send a test request to the first candidate model
    Check,

    /// List models offered by the provider
    Models,
}

#[derive(ClapArgs)]
struct SaveArgs {
    #[arg(long)]
    number: String,
    #[arg(long)]
    offender: String,
    #[arg(long)]
    nature: String,
    #[arg(long)]
    driver: String,
    #[arg(long)]
    commander: String,
    #[arg(long, default_value = "")]
    aux1: String,
    #[arg(long, default_value = "")]
    aux2: String,
    #[arg(long, default_value = "")]
    material: String,
    #[arg(long, default_value = "")]
    procedures: String,
    #[arg(long, default_value = "")]
    signature: String,
    /// Draft narrative (or omit to read from stdin)
    draft: Option<String>,
}

impl SaveArgs {
    fn into_report(self, draft: String) -> BopmReport {
        BopmReport::new(self.number)
            .offender(self.offender)
            .nature(self.nature)
            .team(self.driver, self.commander)
            .auxiliaries(self.aux1, self.aux2)
            .details(Details {
                material: self.material,
                procedures: self.procedures,
                signature: self.signature,
            })
            .draft(draft)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialise tracing (default: info; override with RUST_LOG).
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let matches = Args::command()
        .long_version(escriba::version_string())
        .get_matches();
    let args = Args::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    let config = Config::load(args.config.as_deref())?;
    let secrets = Secrets::load()?;
    info!(version = escriba::version_string(), "escriba starting");

    match args.command {
        Command::Rewrite {
            nature,
            draft,
            no_cache,
        } => {
            let draft = resolve_text(draft, "rewrite")?;
            let rewriter = build_rewriter(&config, &secrets)?;
            let text = rewriter.rewrite_with(&draft, &nature, !no_cache).await;
            println!("{text}");
        }

        Command::Save(save) => {
            let draft = resolve_text(save.draft.clone(), "save")?;
            let report = save.into_report(draft);

            let clean = escriba::report::sanitize_report(&report);
            config.validation.validate(&clean)?;

            let rewriter = build_rewriter(&config, &secrets)?;
            let rewrite = rewriter
                .rewrite_detailed(&clean.draft, &clean.nature, true)
                .await;
            if !rewrite.is_generated() {
                warn!(origin = ?rewrite.origin, "saving report with fallback text");
            }

            let now = Local::now().naive_local();
            let document = escriba::render_document(&clean, &rewrite.text, now);
            let store = open_store(&config).await?;
            let outcome = store.save(&clean, &document).await?;
            println!("{}: {outcome:?}", clean.number);
            println!();
            println!("{document}");
        }

        Command::Show { number } => {
            let store = open_store(&config).await?;
            match store.find_by_number(&number).await? {
                Some(report) => print_report(&report),
                None => return Err(format!("report {number} not found").into()),
            }
        }

        Command::List { limit } => {
            let store = open_store(&config).await?;
            let reports = store.list_recent(limit).await?;
            if reports.is_empty() {
                println!("no reports saved");
            }
            print_summaries(&reports);
        }

        Command::Search {
            number,
            offender,
            nature,
            driver,
            limit,
        } => {
            let filter = ReportFilter {
                number,
                offender,
                nature,
                driver,
            };
            let store = open_store(&config).await?;
            let reports = store.search(&filter, limit).await?;
            if reports.is_empty() {
                println!("no matching reports");
            }
            print_summaries(&reports);
        }

        Command::Delete { number } => {
            let store = open_store(&config).await?;
            if store.delete(&number).await? {
                println!("deleted {number}");
            } else {
                return Err(format!("report {number} not found").into());
            }
        }

        Command::Check => {
            let rewriter = build_rewriter(&config, &secrets)?;
            if let Err(e) = rewriter.check_connection().await {
                if let Some(wait) = e.retry_after() {
                    eprintln!("rate limited; retry in {}s", wait.as_secs());
                }
                return Err(e.into());
            }
            println!("ok ({})", rewriter.candidates().first());
        }

        Command::Models => {
            let rewriter = build_rewriter(&config, &secrets)?;
            let models = rewriter.list_models().await?;
            if models.is_empty() {
                println!("no models available");
            }
            for model in models.iter().filter(|m| m.supports_generate) {
                match &model.display_name {
                    Some(name) => println!("{} ({name})", model.id),
                    None => println!("{}", model.id),
                }
            }
        }
    }

    Ok(())
}

fn build_rewriter(config: &Config, secrets: &Secrets) -> escriba::Result<Rewriter> {
    EscribaBuilder::from_config(config, secrets).build()
}

/// Open the configured store, or an in-memory one when no path is set.
async fn open_store(config: &Config) -> escriba::Result<Box<dyn ReportStore>> {
    let rules = config.validation.clone();
    match config.store.resolved_path() {
        Some(path) => Ok(Box::new(JsonFileStore::open(path, rules).await?)),
        None => {
            warn!("no store path configured; reports are not persisted");
            Ok(Box::new(MemoryReportStore::new(rules)))
        }
    }
}

/// Resolve text input from an optional CLI argument and/or stdin.
///
/// - arg only → arg
/// - stdin only → stdin
/// - both → `"{arg}\n\n{stdin}"`
/// - neither → error
fn resolve_text(arg: Option<String>, command: &str) -> Result<String, Box<dyn std::error::Error>> {
    let stdin_is_pipe = !io::stdin().is_terminal();
    let stdin_text = if stdin_is_pipe {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        let trimmed = buf.trim().to_string();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    } else {
        None
    };

    match (arg, stdin_text) {
        (Some(a), Some(s)) => Ok(format!("{a}\n\n{s}")),
        (Some(a), None) => Ok(a),
        (None, Some(s)) => Ok(s),
        (None, None) => {
            Err(format!("{command}: no draft provided (pass text as argument or via stdin)").into())
        }
    }
}

fn print_summaries(reports: &[StoredReport]) {
    for stored in reports {
        println!(
            "{}\t{}\t{}",
            stored.report.number, stored.report.nature, stored.report.offender
        );
    }
}

fn print_report(stored: &StoredReport) {
    let r = &stored.report;
    println!("number:     {}", r.number);
    println!("nature:     {}", r.nature);
    println!("offender:   {}", r.offender);
    println!("driver:     {}", r.team.driver);
    println!("commander:  {}", r.team.commander);
    for (label, value) in [
        ("aux1", &r.team.aux1),
        ("aux2", &r.team.aux2),
        ("material", &r.details.material),
        ("procedures", &r.details.procedures),
        ("signature", &r.details.signature),
    ] {
        if !value.is_empty() {
            println!("{:<11} {value}", format!("{label}:"));
        }
    }
    println!("revision:   {}", stored.revision);
    println!();
    println!("{}", stored.final_text);
}
