use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use sitelog::config::AppConfig;
use sitelog::diagnostics::DebugExport;
use sitelog::services::ArchiveService;
use sitelog::AppContext;

#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    #[clap(short, long, global = true)]
    log_level: Option<String>,
    /// Configuration file
    #[clap(short, long, global = true, default_value = "sitelog.toml")]
    config: PathBuf,
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the local store and run migrations
    Init,
    /// Project listing and selection
    Projects {
        #[clap(subcommand)]
        command: ProjectCommands,
    },
    /// Inspect and submit the report for a date
    Report {
        #[clap(subcommand)]
        command: ReportCommands,
    },
    /// Archived (submitted) reports
    Archives {
        #[clap(subcommand)]
        command: ArchiveCommands,
    },
    /// Local drafts
    Drafts {
        #[clap(subcommand)]
        command: DraftCommands,
    },
}

#[derive(Subcommand)]
enum ProjectCommands {
    /// List projects with their contractors
    List,
    /// Point the device at a project
    Use { project_id: String },
}

#[derive(Subcommand)]
enum ReportCommands {
    /// Print the assembled report for the active project
    Show {
        #[clap(short, long)]
        date: String,
        /// Emit the full aggregate as JSON
        #[clap(long)]
        json: bool,
    },
    /// Run the field-mismatch detector
    Diagnose {
        #[clap(short, long)]
        date: String,
    },
    /// Write a debug export document
    ExportDebug {
        #[clap(short, long)]
        date: String,
        #[clap(long, default_value = "json")]
        format: String,
        #[clap(short, long)]
        output: Option<PathBuf>,
    },
    /// Archive the report and clear its temporary data
    Submit {
        #[clap(short, long)]
        date: String,
    },
}

#[derive(Subcommand)]
enum ArchiveCommands {
    List {
        #[clap(short, long, default_value = "20")]
        limit: u64,
    },
    Delete { archive_id: String },
}

#[derive(Subcommand)]
enum DraftCommands {
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(&cli.log_level);

    let config = AppConfig::load(Some(&cli.config))?;
    let app = AppContext::connect(config).await?;

    match cli.command {
        Commands::Init => {
            // connect() already migrated; this just confirms the path
            info!("store initialised at {}", app.config().database_path);
        }
        Commands::Projects { command } => match command {
            ProjectCommands::List => {
                let state = app.local_state();
                let user_id = state.user_id().await;
                let active = state.active_project_id().await;
                for project in app.projects().load_projects(user_id.as_deref()).await {
                    let marker = if Some(&project.id) == active.as_ref() { "*" } else { " " };
                    println!(
                        "{} {}  {}  ({} contractors, {})",
                        marker,
                        project.id,
                        project.project_name,
                        project.contractors.len(),
                        project.status
                    );
                }
            }
            ProjectCommands::Use { project_id } => {
                app.projects()
                    .load_project(&project_id)
                    .await
                    .ok_or_else(|| anyhow!("Project {project_id} not found"))?;
                app.local_state().set_active_project_id(&project_id).await?;
                println!("Active project set to {project_id}");
            }
        },
        Commands::Report { command } => match command {
            ReportCommands::Show { date, json } => {
                let session = load_session(&app, &date).await?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&session.report)?);
                } else {
                    print_summary(&session);
                }
            }
            ReportCommands::Diagnose { date } => {
                let session = load_session(&app, &date).await?;
                let issues =
                    sitelog::diagnostics::detect(&session.report, session.contractors());
                if issues.is_empty() {
                    println!("No issues detected");
                } else {
                    for issue in issues {
                        println!("[{}] {}: {}", issue.kind.as_str(), issue.field, issue.message);
                    }
                }
            }
            ReportCommands::ExportDebug { date, format, output } => {
                let session = load_session(&app, &date).await?;
                let project_name = session
                    .project
                    .as_ref()
                    .map(|p| p.project_name.clone())
                    .unwrap_or_default();
                let export =
                    DebugExport::new(&session.report, session.contractors(), &project_name);
                let (content, extension) = match format.as_str() {
                    "md" | "markdown" => (export.to_markdown(), "md"),
                    _ => (serde_json::to_string_pretty(&export.to_json())?, "json"),
                };
                let path = output.unwrap_or_else(|| {
                    PathBuf::from(format!("sitelog-debug-{date}.{extension}"))
                });
                std::fs::write(&path, content)?;
                println!("Debug export written to {}", path.display());
            }
            ReportCommands::Submit { date } => {
                let session = load_session(&app, &date).await?;
                let project = session
                    .project
                    .clone()
                    .ok_or_else(|| anyhow!("No active project"))?;
                let snapshot = ArchiveService::build_snapshot(
                    &session.report,
                    &project,
                    session.report_id.as_deref(),
                );
                let state = app.local_state();
                let user_id = state.user_id().await.unwrap_or_default();
                let archive_id = app.archives().submit(snapshot, &user_id).await?;
                println!("Report archived as {archive_id}");
            }
        },
        Commands::Archives { command } => match command {
            ArchiveCommands::List { limit } => {
                for entry in app.archives().list(limit).await {
                    println!(
                        "{}  {}  {}  submitted {}",
                        entry.id, entry.report_date, entry.project_name, entry.submitted_at
                    );
                }
            }
            ArchiveCommands::Delete { archive_id } => {
                app.archives().delete(&archive_id).await?;
                println!("Archive {archive_id} deleted");
            }
        },
        Commands::Drafts { command } => match command {
            DraftCommands::List => {
                for draft in app.drafts().list_all().await {
                    println!("{}  updated {}", draft.key(), draft.updated_at);
                }
            }
        },
    }

    Ok(())
}

async fn load_session(app: &AppContext, date: &str) -> Result<sitelog::session::ReportSession> {
    let state = app.local_state();
    let project = app.projects().load_active(&state).await;
    if project.is_none() {
        return Err(anyhow!("No active project; run `sitelog projects use <id>` first"));
    }
    Ok(app.reports().load_session(project, date, None).await)
}

fn print_summary(session: &sitelog::session::ReportSession) {
    let report = &session.report;
    println!("Report {}", report.overview.date);
    println!("  project:   {}", report.overview.project_name);
    println!("  status:    {}", report.meta.status.as_str());
    println!("  inspector: {}", report.overview.completed_by);
    println!(
        "  weather:   {} / high {} low {}",
        report.overview.weather.general_condition,
        report.overview.weather.high_temp,
        report.overview.weather.low_temp
    );
    for contractor in session.contractors() {
        let activity =
            sitelog::resolve::contractor_activity(report, session.contractors(), &contractor.id);
        match activity {
            Some(a) if !a.no_work => println!("  {}: {}", contractor.name, a.narrative),
            Some(_) => println!("  {}: no work performed", contractor.name),
            None => println!("  {}: (no entry)", contractor.name),
        }
    }
    println!("  photos:    {}", report.photos.len());
    println!("  edits:     {}", report.user_edits.len());
}

fn setup_logging(log_level: &Option<String>) {
    let log_level = match log_level
        .as_ref()
        .unwrap_or(&"info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(format!("sqlx=warn,{}", log_level)))
        .without_time()
        .init();
}
