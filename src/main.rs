use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use wake_relay::voice::AudioSegment;
use wake_relay::{Config, Daemon, daemon};

/// Grace period for a background fallback actuation before the CLI exits
const FALLBACK_GRACE: Duration = Duration::from_secs(3);

/// Wake Relay - voice-activated lighting relay
#[derive(Parser)]
#[command(name = "wake-relay", version, about)]
struct Cli {
    /// Port to listen on (overrides the config file)
    #[arg(long, env = "WAKE_RELAY_PORT")]
    port: Option<u16>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run one WAV file through trigger detection (needs only `OPENAI_API_KEY`)
    TestTrigger {
        /// Path to a WAV file
        path: PathBuf,
    },
    /// Resolve a color description to chromaticity (needs only `OPENAI_API_KEY`)
    TestColor {
        /// Color description (e.g., "bluish green")
        description: String,
    },
    /// Switch the lights in a zone
    TestLight {
        /// Zone name (e.g., "bedroom", "living room")
        target: String,
        /// Desired state
        #[arg(value_enum)]
        state: PowerState,
    },
    /// Print the config file path
    ConfigPath,
}

#[derive(Clone, Copy, ValueEnum)]
enum PowerState {
    On,
    Off,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,wake_relay=info",
        1 => "info,wake_relay=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if let Some(Command::ConfigPath) = cli.command {
        match wake_relay::config::file::config_file_path() {
            Some(path) => println!("{}", path.display()),
            None => anyhow::bail!("could not determine config directory"),
        }
        return Ok(());
    }

    // Only serving and test-light talk to the bridge
    let needs_bridge = matches!(cli.command, None | Some(Command::TestLight { .. }));
    let mut config = if needs_bridge {
        Config::load()?
    } else {
        Config::load_without_bridge()?
    };
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    // Handle subcommands
    if let Some(cmd) = cli.command {
        return match cmd {
            Command::TestTrigger { path } => test_trigger(&config, path).await,
            Command::TestColor { description } => test_color(&config, &description).await,
            Command::TestLight { target, state } => test_light(&config, &target, state).await,
            Command::ConfigPath => Ok(()),
        };
    }

    tracing::info!(port = config.server.port, "starting wake relay");

    let daemon = Daemon::new(config)?;
    tracing::info!("wake relay ready");

    // Run until interrupted
    daemon.run().await?;

    Ok(())
}

/// Run a WAV file through the trigger detector
async fn test_trigger(config: &Config, path: PathBuf) -> anyhow::Result<()> {
    let audio = tokio::fs::read(&path).await?;
    println!("Evaluating {} ({} bytes)...", path.display(), audio.len());

    let detector = daemon::build_detector(config)?;
    let result = detector.evaluate(&AudioSegment::new(audio)).await;

    println!("Transcript: {:?}", result.transcript);
    println!("Triggered:  {}", result.triggered);
    Ok(())
}

/// Resolve a color description
async fn test_color(config: &Config, description: &str) -> anyhow::Result<()> {
    let resolver = daemon::build_color_resolver(config)?;
    let xy = resolver.resolve(description).await;

    println!("{description}: x = {:.4}, y = {:.4}", xy.x, xy.y);
    if xy == wake_relay::DEFAULT_CHROMATICITY {
        println!("(default warm white)");
    }
    Ok(())
}

/// Switch a zone through the same router the live session uses
async fn test_light(config: &Config, target: &str, state: PowerState) -> anyhow::Result<()> {
    let device_ids = config.zones.resolve(target);
    if device_ids.is_empty() {
        println!("\"{target}\" matches no configured devices");
        return Ok(());
    }
    println!("Switching {} device(s): {}", device_ids.len(), device_ids.join(", "));

    let action = match state {
        PowerState::On => "turn_on",
        PowerState::Off => "turn_off",
    };
    let router = daemon::build_router(config)?;
    let args = serde_json::json!({ "action": action, "type": target });
    router.dispatch("change_lights", &args).await;

    // A failed primary request hands off to the fallback in the background
    tokio::time::sleep(FALLBACK_GRACE).await;
    println!("Done. Run with -v to see which transport delivered the request.");
    Ok(())
}
