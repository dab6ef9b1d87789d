//! Command-line front end for the report store.
//!
//! # Responsibility
//! - Map subcommands onto store operations and assist workflows.
//! - Surface persistence and generation failures as readable messages.

use clap::{Parser, Subcommand};
use log::info;
use reportdesk_core::{
    core_version, init_logging, logging_status, AssistService, OpenAiTextGenerator, Report,
    ReportDeskConfig, ReportPatch, ReportStore, SharedReportStore, SqliteSnapshotRepository,
};
use std::process::ExitCode;
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "reportdesk", version, about = "Edit and track reports from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List reports in display order.
    List {
        /// Only show reports whose title contains this text.
        #[arg(long)]
        search: Option<String>,
    },
    /// Show one report with its activity history.
    Show { id: Uuid },
    /// Create a report.
    Create {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        content: String,
    },
    /// Change the title and/or content of a report.
    Update {
        id: Uuid,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
    },
    /// Delete a report.
    Delete { id: Uuid },
    /// Move the report at position FROM to position TO (zero-based).
    Move { from: usize, to: usize },
    /// Set the name recorded in activity history.
    User { name: String },
    /// Replace a report's content with a generated draft based on its title.
    Draft { id: Uuid },
    /// Replace a report's content with a generated summary of itself.
    Summarize { id: Uuid },
    /// Print storage and logging status.
    Status,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), String> {
    let config = ReportDeskConfig::from_env().map_err(|err| err.to_string())?;
    std::fs::create_dir_all(&config.data_dir).map_err(|err| {
        format!(
            "failed to create data directory `{}`: {err}",
            config.data_dir.display()
        )
    })?;

    let log_dir = std::path::absolute(config.log_dir()).map_err(|err| err.to_string())?;
    if let Err(err) = init_logging(&config.log_level, &log_dir) {
        eprintln!("warning: logging disabled: {err}");
    }

    let repo = SqliteSnapshotRepository::open(config.db_path(), config.storage_name.as_str())
        .map_err(|err| err.to_string())?;
    let mut store = ReportStore::open(repo);
    if let Some(err) = store.load_warning() {
        eprintln!("warning: {err}; starting with an empty collection");
    }
    if let Some(user) = config.user.as_deref() {
        if store.current_user() != user {
            store.set_current_user(user);
        }
    }
    let store = SharedReportStore::new(store);
    info!("event=cli_start module=cli status=ok");

    let result = execute(cli.command, &store, &config).await;
    if let Some(warning) = store.write(|store| store.take_persistence_warning()) {
        eprintln!("warning: {warning}");
    }
    result
}

async fn execute(
    command: Command,
    store: &SharedReportStore,
    config: &ReportDeskConfig,
) -> Result<(), String> {
    match command {
        Command::List { search } => {
            store.read(|store| {
                let reports = match search.as_deref() {
                    Some(term) => store.search_by_title(term),
                    None => store.list().iter().collect(),
                };
                if reports.is_empty() {
                    println!("No reports found.");
                }
                for (position, report) in reports.into_iter().enumerate() {
                    println!(
                        "{position:>3}  {}  {}  (updated {})",
                        report.id,
                        display_title(report),
                        report.updated_at
                    );
                }
            });
            Ok(())
        }
        Command::Show { id } => store.read(|store| -> Result<(), String> {
            let report = store.get(id).ok_or_else(|| format!("report not found: {id}"))?;
            print_report(report);
            Ok(())
        }),
        Command::Create { title, content } => {
            let id = store.write(|store| store.create(title, content));
            println!("{id}");
            Ok(())
        }
        Command::Update { id, title, content } => {
            let patch = ReportPatch { title, content };
            store
                .write(|store| store.update(id, patch))
                .map_err(|err| err.to_string())?;
            println!("updated {id}");
            Ok(())
        }
        Command::Delete { id } => {
            if store.write(|store| store.delete(id)) {
                println!("deleted {id}");
            } else {
                println!("nothing to delete for {id}");
            }
            Ok(())
        }
        Command::Move { from, to } => store.write(|store| -> Result<(), String> {
            let len = store.len();
            if from >= len || to >= len {
                return Err(format!(
                    "positions must be below {len}; got from={from} to={to}"
                ));
            }
            store.reorder(from, to);
            println!("moved {from} -> {to}");
            Ok(())
        }),
        Command::User { name } => {
            let current = store.write(|store| {
                store.set_current_user(&name);
                store.current_user().to_string()
            });
            println!("current user: {current}");
            Ok(())
        }
        Command::Draft { id } => {
            let service = assist_service(config)?;
            let report = service
                .generate_draft(store, id)
                .await
                .map_err(|err| err.user_message().to_string())?;
            print_report(&report);
            Ok(())
        }
        Command::Summarize { id } => {
            let service = assist_service(config)?;
            let report = service
                .summarize(store, id)
                .await
                .map_err(|err| err.user_message().to_string())?;
            print_report(&report);
            Ok(())
        }
        Command::Status => {
            store.read(|store| {
                println!("core version: {}", core_version());
                println!("database: {}", config.db_path().display());
                println!("storage name: {}", config.storage_name);
                println!("reports: {}", store.len());
                println!("revision: {}", store.revision());
                println!("current user: {}", store.current_user());
            });
            match logging_status() {
                Some((level, dir)) => println!("logging: {level} -> {}", dir.display()),
                None => println!("logging: off"),
            }
            Ok(())
        }
    }
}

fn assist_service(config: &ReportDeskConfig) -> Result<AssistService<OpenAiTextGenerator>, String> {
    let generator = OpenAiTextGenerator::new(&config.generation).map_err(|err| err.to_string())?;
    Ok(AssistService::new(generator))
}

fn display_title(report: &Report) -> &str {
    if report.title.trim().is_empty() {
        "(untitled)"
    } else {
        report.title.as_str()
    }
}

fn print_report(report: &Report) {
    println!("id:      {}", report.id);
    println!("title:   {}", display_title(report));
    println!("created: {}", report.created_at);
    println!("updated: {}", report.updated_at);
    println!();
    println!("{}", report.content);
    println!();
    println!("activity:");
    for entry in &report.activity_history {
        println!("  {}  {} by {}", entry.timestamp, entry.kind, entry.user);
    }
}
