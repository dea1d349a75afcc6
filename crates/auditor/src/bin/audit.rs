use std::process::ExitCode;

use auditor::{AuditError, Report, commands};
use clap::{Parser, Subcommand};
use storage::{
    Database,
    config::{Settings, TieBreakPolicy},
    services::consistency::DEFAULT_RACE_WINDOW_SECS,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "tkd-audit")]
#[command(about = "Consistency checks for taekwondo rankings and points", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    /// Tie status stored for organizer-resolved ties: clear or mark_resolved
    #[arg(long, env = "TIE_BREAK_POLICY", default_value = "clear")]
    tie_break_policy: String,

    #[arg(long, env = "STORE_TIMEOUT_MS", default_value_t = 5_000)]
    store_timeout_ms: u64,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Events sharing a tournament and event type
    DuplicateEvents {
        #[arg(long)]
        tournament: Option<Uuid>,

        /// Creation spread, in seconds, under which duplicates count as a race
        #[arg(long, default_value_t = DEFAULT_RACE_WINDOW_SECS)]
        window_secs: i64,
    },
    /// Competitors with more than one score row in an event
    DuplicateScores {
        #[arg(long)]
        event: Option<Uuid>,
    },
    /// Stored ranks of an event against a fresh computation
    VerifyRanks {
        #[arg(long)]
        event: Uuid,
    },
    /// Recompute and rewrite the ranks of an event
    Recompute {
        #[arg(long)]
        event: Uuid,
    },
    /// Print rank changes of an event as they happen
    Watch {
        #[arg(long)]
        event: Uuid,

        /// Stop after this many changes
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("tkd_audit={},auditor={},storage={}", log_level, log_level, log_level)
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut settings = Settings::default();
    settings.store_timeout_ms = cli.store_timeout_ms;
    settings.persister.tie_break_policy = cli
        .tie_break_policy
        .parse::<TieBreakPolicy>()
        .map_err(AuditError::ConfigError)?;

    tracing::info!("Connecting to database...");
    let db = Database::new(&cli.database_url, settings).await?;

    let report = match cli.command {
        Commands::DuplicateEvents {
            tournament,
            window_secs,
        } => commands::duplicate_events(&db, tournament, window_secs).await?,
        Commands::DuplicateScores { event } => commands::duplicate_scores(&db, event).await?,
        Commands::VerifyRanks { event } => commands::verify_ranks(&db, event).await?,
        Commands::Recompute { event } => commands::recompute(&db, event).await?,
        Commands::Watch { event, limit } => {
            handle_watch(&db, event, limit).await?;
            return Ok(ExitCode::SUCCESS);
        }
    };

    Ok(finish(&report)?)
}

async fn handle_watch(
    db: &Database,
    event_id: Uuid,
    limit: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let print = |change: &storage::services::consistency::RankChange| -> auditor::Result<()> {
        println!("{}", serde_json::to_string(change)?);
        Ok(())
    };

    tokio::select! {
        seen = commands::watch(db, event_id, limit, print) => {
            let seen = seen?;
            tracing::info!(changes = seen, "Watch finished");
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted");
        }
    }
    Ok(())
}

fn finish(report: &Report) -> auditor::Result<ExitCode> {
    println!("{}", report.render()?);

    if report.is_clean() {
        tracing::info!("✓ {}: no problems found", report.command);
        Ok(ExitCode::SUCCESS)
    } else {
        tracing::warn!("{}: {} problem(s) found", report.command, report.problems);
        Ok(ExitCode::FAILURE)
    }
}
