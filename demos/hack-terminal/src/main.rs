//! TIMEHACK terminal clock
//!
//! Renders the synchronized clock, countdown and announcements in the
//! terminal until Ctrl-C.

mod ui;

use std::path::PathBuf;

use clap::Parser;

use timehack_core::HackConfig;
use timehack_runtime::{init_tracing, HackRuntime, LogFormat};

use ui::TerminalUi;

#[derive(Parser)]
#[command(name = "hack-terminal")]
#[command(author, version, about = "Synchronized countdown clock", long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// IANA display zone, overrides the config file
    #[arg(short, long)]
    zone: Option<String>,

    /// Never contact an authority; run on the host clock
    #[arg(long)]
    offline: bool,

    /// Log format on stderr (pretty or json)
    #[arg(long, default_value = "pretty")]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.log_format, "warn,timehack=info")?;

    let mut config = match &cli.config {
        Some(path) => HackConfig::load(path)?,
        None => HackConfig::default(),
    };
    if let Some(zone) = cli.zone {
        config.display_zone = Some(zone);
    }
    if cli.offline {
        config.endpoints.clear();
    }

    let runtime = HackRuntime::from_config(config)?;
    let mut terminal = TerminalUi::enter()?;

    let stats = runtime
        .run(
            |frame| terminal.render(frame),
            async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::warn!(error = %e, "ctrl-c handler unavailable");
                    std::future::pending::<()>().await;
                }
            },
        )
        .await;

    terminal.leave()?;
    println!(
        "{} frames, {} cue changes, {} flashes",
        stats.frames, stats.stage_changes, stats.flashes
    );
    Ok(())
}
