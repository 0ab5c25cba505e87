//! wp-migrate CLI - resumable WordPress content migration.

mod prompt;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::fmt::format::FmtSpan;
use wp_migrate::{
    Config, CursorSpec, MigrateError, MigrationResult, Orchestrator, RunOptions,
};

use crate::prompt::TerminalGate;

#[derive(Parser)]
#[command(name = "wp-migrate")]
#[command(about = "Resumable WordPress content migration")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Migrate users, then posts
    Run {
        /// Create the target tables first (resume flags are ignored)
        #[arg(long)]
        make: bool,

        /// Ask before migrating short posts
        #[arg(long)]
        ask: bool,

        /// First user id to migrate
        #[arg(long, default_value_t = 1)]
        users_from: i64,

        /// Continue after the last migrated user
        #[arg(long)]
        users_from_end: bool,

        /// First post id to migrate
        #[arg(long, default_value_t = 1)]
        posts_from: i64,

        /// Continue after the last migrated post
        #[arg(long)]
        posts_from_end: bool,
    },

    /// Test database connections
    HealthCheck,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), MigrateError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format)
        .map_err(|e| MigrateError::Config(e.to_string()))?;

    let config = Config::load(&cli.config)?;
    info!("Loaded configuration from {:?}", cli.config);

    match cli.command {
        Commands::Run {
            make,
            ask,
            users_from,
            users_from_end,
            posts_from,
            posts_from_end,
        } => {
            let options = RunOptions {
                create_schema: make,
                ask,
                users: CursorSpec {
                    from: users_from,
                    from_end: users_from_end,
                },
                posts: CursorSpec {
                    from: posts_from,
                    from_end: posts_from_end,
                },
            };
            info!(
                "Run options: make={}, ask={}, users from {} (from end: {}), posts from {} (from end: {})",
                make, ask, users_from, users_from_end, posts_from, posts_from_end
            );

            let orchestrator = Orchestrator::new(config).await?;
            let result = orchestrator.run(options, Arc::new(TerminalGate)).await?;

            if cli.output_json {
                println!("{}", result.to_json()?);
            } else {
                print_summary(&result);
            }
        }

        Commands::HealthCheck => {
            let orchestrator = Orchestrator::new(config).await?;
            let result = orchestrator.health_check().await?;
            orchestrator.close().await;

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("Health Check Results:");
                println!(
                    "  Legacy (WordPress): {} ({}ms)",
                    if result.legacy_connected { "OK" } else { "FAILED" },
                    result.legacy_latency_ms
                );
                if let Some(ref err) = result.legacy_error {
                    println!("    Error: {}", err);
                }
                println!(
                    "  Target: {} ({}ms)",
                    if result.target_connected { "OK" } else { "FAILED" },
                    result.target_latency_ms
                );
                if let Some(ref err) = result.target_error {
                    println!("    Error: {}", err);
                }
                println!(
                    "\n  Overall: {}",
                    if result.healthy { "HEALTHY" } else { "UNHEALTHY" }
                );
            }

            if !result.healthy {
                return Err(MigrateError::pool(
                    "Health check failed",
                    "testing legacy and target connections",
                ));
            }
        }
    }

    Ok(())
}

fn print_summary(result: &MigrationResult) {
    let users = &result.users;
    let posts = &result.posts;

    println!("\nMigration completed!");
    println!("  Run ID: {}", result.run_id);
    println!("  Duration: {:.2}s", result.duration_seconds);
    println!(
        "  Users (from {}): {} inserted, {} missing",
        result.users_start, users.inserted, users.missing
    );
    println!(
        "  Posts (from {}): {} inserted, {} revisions, {} images",
        result.posts_start, posts.inserted, posts.revisions_applied, posts.images_applied
    );
    println!(
        "  Skipped: {} ineligible, {} declined, {} missing",
        posts.ineligible, posts.declined, posts.missing
    );
    if posts.revisions_orphaned + posts.images_orphaned > 0 {
        println!(
            "  Orphaned: {} revisions, {} attachments",
            posts.revisions_orphaned, posts.images_orphaned
        );
    }
    println!(
        "  Tags: {} created, {} links, {} already linked",
        posts.tags_created, posts.links_created, posts.links_existing
    );
}

fn setup_logging(verbosity: &str, format: &str) -> Result<(), String> {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr)
        .with_target(false);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    Ok(())
}
