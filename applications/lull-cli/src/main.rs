/// Lull - ambient sound mix player
use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use lull_core::clamp_volume;
use lull_cli::{transport, AppConfig, DemoBackend, SimulatedEngine};
use lull_playback::{
    ChannelTransport, LocalBackend, MixHandle, MixService, PlayerFactory, PlayerManager, RemoteAction,
    RemoteBackend, RemoteMessage,
};
use std::{path::PathBuf, sync::Arc, time::Duration};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "lull")]
#[command(about = "Ambient sound mix player", long_about = None)]
struct Cli {
    /// Configuration file path (defaults to ./lull.toml when present)
    #[arg(short, long, global = true, env = "LULL_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play the configured preset
    Play {
        /// Backend to start on
        #[arg(short, long, value_enum)]
        backend: Option<DemoBackend>,
        /// Seconds to play before stopping
        #[arg(short, long)]
        duration: Option<u64>,
        /// Switch to the other backend halfway through
        #[arg(long)]
        handoff: bool,
    },
    /// Print the control message for a channel
    Encode {
        /// Sound id
        sound: String,
        /// Receiver should loop the clip
        #[arg(long)]
        looping: bool,
        /// Volume in [0, 1]
        #[arg(long, default_value_t = lull_core::DEFAULT_VOLUME)]
        volume: f32,
        /// Transport action; omitted for a volume update
        #[arg(long, value_enum)]
        action: Option<ActionArg>,
    },
    /// Parse a control message
    Decode {
        /// JSON payload
        payload: String,
    },
    /// Print the effective configuration
    Config,
}

#[derive(Clone, Copy, ValueEnum)]
enum ActionArg {
    Play,
    Pause,
    Stop,
}

impl From<ActionArg> for RemoteAction {
    fn from(action: ActionArg) -> Self {
        match action {
            ActionArg::Play => RemoteAction::Play,
            ActionArg::Pause => RemoteAction::Pause,
            ActionArg::Stop => RemoteAction::Stop,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lull=info,lull_playback=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play {
            backend,
            duration,
            handoff,
        } => {
            let mut config = load_config(cli.config.as_deref())?;
            if let Some(backend) = backend {
                config.demo.backend = backend;
            }
            if let Some(duration) = duration {
                config.demo.duration_secs = duration;
            }
            play(config, handoff).await?;
        }
        Commands::Encode {
            sound,
            looping,
            volume,
            action,
        } => {
            let message = RemoteMessage {
                sound_key: sound,
                is_looping: looping,
                volume: clamp_volume(volume),
                action: action.map(Into::into),
            };
            println!("{}", message.encode()?);
        }
        Commands::Decode { payload } => {
            let message = RemoteMessage::decode(&payload).context("Invalid control message")?;
            println!("{message:#?}");
        }
        Commands::Config => {
            let config = load_config(cli.config.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> anyhow::Result<AppConfig> {
    let config = AppConfig::load(path).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

async fn play(config: AppConfig, handoff: bool) -> anyhow::Result<()> {
    let preset = config.preset();
    tracing::info!("Starting Lull");
    tracing::info!("Preset: {} ({} channels)", preset.name, preset.player_states.len());
    tracing::info!("Backend: {:?}", config.demo.backend);

    let engine = Arc::new(SimulatedEngine::new(config.clip_length()));
    let manager = PlayerManager::new(
        Arc::new(config.catalog()),
        Arc::new(LocalBackend::new(engine)),
        &config.playback,
    );
    let (handle, service) = MixService::spawn(manager, config.playback.command_buffer);

    let (cast, outbound) = ChannelTransport::new(config.playback.command_buffer);
    let writer = transport::spawn_writer(outbound, std::io::stdout());
    let remote: Arc<dyn PlayerFactory> = Arc::new(RemoteBackend::new(
        Arc::new(cast),
        config.playback.cast_namespace.clone(),
    ));

    let mut updates = handle.subscribe().await?;
    let observer = tokio::spawn(async move {
        while let Some(update) = updates.recv().await {
            tracing::info!(state = ?update.state, channels = update.channels.len(), "Mix update");
        }
    });

    let on_cast = config.demo.backend == DemoBackend::Cast;
    if on_cast {
        handle
            .attach_remote(Arc::clone(&remote))
            .await
            .context("Failed to attach cast backend")?;
    }
    handle
        .apply_preset(preset)
        .await
        .context("Failed to start preset")?;

    let timeline = run_timeline(&handle, &remote, config.duration(), handoff, on_cast);
    tokio::select! {
        result = timeline => result?,
        _ = tokio::signal::ctrl_c() => tracing::info!("Interrupted"),
    }

    handle.shutdown().await?;
    service.await.context("Mix service panicked")?;
    observer.await.context("Observer panicked")?;

    drop(remote);
    writer.await.context("Cast writer panicked")?;
    tracing::info!("Lull stopped");
    Ok(())
}

async fn run_timeline(
    handle: &MixHandle,
    remote: &Arc<dyn PlayerFactory>,
    duration: Duration,
    handoff: bool,
    on_cast: bool,
) -> anyhow::Result<()> {
    if !handoff {
        tokio::time::sleep(duration).await;
        return Ok(());
    }

    let half = duration / 2;
    tokio::time::sleep(half).await;

    if on_cast {
        tracing::info!("Handing off to local playback");
        handle.detach_remote().await?;
    } else {
        tracing::info!("Handing off to cast receiver");
        handle.attach_remote(Arc::clone(remote)).await?;
    }

    tokio::time::sleep(duration - half).await;
    Ok(())
}
