mod commands;
mod telemetry;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use robbin_common::drill::PlaybackSpeed;
use robbin_common::feed::RelativeWindow;
use robbin_common::incidents::StatusFilter;
use robbin_common::settings::{Environment, RetentionPeriod};
use robbin_common::severity::SeverityFilter;
use robbin_common::{ApiClient, DashboardConfig, IncidentApi, DEFAULT_API_BASE_URL};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "robbin")]
#[command(version = "0.1.0")]
#[command(about = "Robbin incident dashboard in the terminal", long_about = None)]
struct Cli {
    /// Base URL of the incident API
    #[arg(
        long,
        env = "ROBBIN_API_BASE_URL",
        default_value = DEFAULT_API_BASE_URL,
        global = true
    )]
    api_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the live event feed
    Feed {
        /// Relative window: 15m, 1h, 6h, 24h or all (default: 1h)
        #[arg(long, default_value_t = RelativeWindow::OneHour)]
        range: RelativeWindow,

        /// Custom range start, local time (YYYY-MM-DDTHH:MM[:SS])
        #[arg(long)]
        from: Option<String>,

        /// Custom range end, local time; defaults to now
        #[arg(long)]
        to: Option<String>,

        /// Severity filter: all, error, warning or info
        #[arg(long, default_value_t = SeverityFilter::All)]
        severity: SeverityFilter,

        /// Environment filter ("all" for every environment)
        #[arg(long, default_value = "all")]
        environment: String,

        /// Show one event in full (stack trace and metadata) instead of the table
        #[arg(long, conflicts_with = "watch")]
        event: Option<String>,

        /// Keep polling and accept commands on stdin
        #[arg(long)]
        watch: bool,
    },

    /// Create an incident from event ids
    GenerateIncident {
        /// Event IDs to group
        #[arg(required = true)]
        event_ids: Vec<String>,
    },

    /// Browse incidents
    Incidents {
        #[command(subcommand)]
        command: IncidentsCommand,
    },

    /// Browse and generate postmortems
    Postmortems {
        #[command(subcommand)]
        command: PostmortemsCommand,
    },

    /// Replay the latest incident as a drill
    Drill {
        /// Playback speed: 0.5, 1, 2 or 4
        #[arg(long, default_value_t = PlaybackSpeed::Normal)]
        speed: PlaybackSpeed,
    },

    /// Set up a project and print the SDK snippet
    Setup {
        /// Project name
        #[arg(long, default_value = "my-project")]
        name: String,

        /// Target environment: production, staging or development
        #[arg(long, default_value_t = Environment::Production)]
        environment: Environment,

        /// Event retention in days: 7, 30, 90 or 365
        #[arg(long, default_value = "30")]
        retention: RetentionPeriod,
    },
}

#[derive(Subcommand)]
enum IncidentsCommand {
    /// List incidents, newest first
    List {
        /// Status filter: all, open or resolved
        #[arg(long, default_value_t = StatusFilter::All)]
        status: StatusFilter,

        /// Keep polling and highlight new incidents
        #[arg(long)]
        watch: bool,
    },

    /// Show one incident and its events
    Show {
        /// Incident ID
        incident_id: String,
    },
}

#[derive(Subcommand)]
enum PostmortemsCommand {
    /// List postmortems
    List,

    /// Show one postmortem
    Show {
        /// Postmortem ID
        postmortem_id: String,

        /// Print the markdown document instead of the summary view
        #[arg(long)]
        markdown: bool,

        /// Write the markdown document to a file or directory
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Generate a postmortem for an incident
    Generate {
        /// Incident ID
        incident_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let provider = telemetry::init_telemetry()?;

    let result = run(cli).await;

    if let Some(provider) = provider {
        if let Err(e) = provider.shutdown() {
            eprintln!("Failed to shut down tracer provider: {e}");
        }
    }

    result
}

async fn run(cli: Cli) -> Result<()> {
    let config = DashboardConfig::from_env().with_api_base_url(cli.api_url);
    config.validate()?;

    let api: Arc<dyn IncidentApi> =
        Arc::new(ApiClient::from_config(&config).context("Failed to create API client")?);

    // Execute command
    match cli.command {
        Commands::Feed {
            range,
            from,
            to,
            severity,
            environment,
            event,
            watch,
        } => {
            let args = commands::feed::FeedArgs {
                range,
                from,
                to,
                severity,
                environment,
                event,
                watch,
            };
            commands::feed::execute(api, &config, args).await?;
        }
        Commands::GenerateIncident { event_ids } => {
            commands::generate::execute(api.as_ref(), event_ids).await?;
        }
        Commands::Incidents { command } => match command {
            IncidentsCommand::List { status, watch } => {
                commands::incidents::list(api, &config, status, watch).await?;
            }
            IncidentsCommand::Show { incident_id } => {
                commands::incidents::show(api.as_ref(), &config, &incident_id).await?;
            }
        },
        Commands::Postmortems { command } => match command {
            PostmortemsCommand::List => {
                commands::postmortems::list(api.as_ref()).await?;
            }
            PostmortemsCommand::Show {
                postmortem_id,
                markdown,
                export,
            } => {
                commands::postmortems::show(api.as_ref(), &postmortem_id, markdown, export)
                    .await?;
            }
            PostmortemsCommand::Generate { incident_id } => {
                commands::postmortems::generate(api.as_ref(), &incident_id).await?;
            }
        },
        Commands::Drill { speed } => {
            commands::drill::execute(api.as_ref(), &config, speed).await?;
        }
        Commands::Setup {
            name,
            environment,
            retention,
        } => {
            commands::setup::execute(&name, environment, retention);
        }
    }

    Ok(())
}
