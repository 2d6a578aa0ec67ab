//! rfbridge command line tool.
//!
//! Loads a device record from JSON, attaches an RF bridge remote to an
//! in-process hub and registry, and prints what the remote would send or
//! fire. Useful for checking learned button names against real device dumps.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rfbridge_core::config::RemoteConfig;
use rfbridge_core::{EventBus, Hub, RemoteEntity};
use rfbridge_devices::{
    DeviceRecord, DiscoveryInfo, MemoryRegistry, RemoteAdapter, StateMap, setup_platform,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "rfbridge", version, about = "RF bridge remote tool")]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the learned buttons of a device
    Buttons {
        /// Device record JSON file
        #[arg(long)]
        device: PathBuf,
    },
    /// Transmit one or more buttons, by name or channel number
    Send {
        #[arg(long)]
        device: PathBuf,
        /// Seconds between commands
        #[arg(long)]
        delay: Option<f64>,
        #[arg(required = true)]
        tokens: Vec<String>,
    },
    /// Put the bridge into learning mode on a channel
    Learn {
        #[arg(long)]
        device: PathBuf,
        channel: String,
    },
    /// Feed a pushed device state through the remote and print hub events
    Replay {
        #[arg(long)]
        device: PathBuf,
        /// State JSON file, e.g. {"cmd": "trigger", "rfTrig0": "..."}
        state: PathBuf,
    },
}

/// Hub, registry and attached remote for one device record.
struct Session {
    hub: Arc<Hub>,
    registry: Arc<MemoryRegistry>,
    remote: Arc<RemoteAdapter>,
}

impl Session {
    async fn open(path: &Path) -> Result<Self> {
        let record = load_record(path)?;
        let device_id = record.deviceid.clone();

        let registry = Arc::new(MemoryRegistry::new());
        registry.register_device(record);
        let hub = Arc::new(Hub::with_config(EventBus::new(), RemoteConfig::from_env()));

        let discovery = Some(DiscoveryInfo::new(device_id));
        let remote = setup_platform(hub.clone(), registry.clone(), discovery)
            .await?
            .pop()
            .context("platform set up no remote")?;

        Ok(Self {
            hub,
            registry,
            remote,
        })
    }

    fn print_sent(&self) {
        for sent in self.registry.take_sent() {
            println!("{}", sent.payload);
        }
    }
}

fn load_record(path: &Path) -> Result<DeviceRecord> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading device record {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing device record {}", path.display()))
}

fn load_state(path: &Path) -> Result<StateMap> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading state {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing state {}", path.display()))
}

async fn run(command: Command) -> Result<()> {
    match command {
        Command::Buttons { device } => {
            let record = load_record(&device)?;
            let buttons = record.button_map();
            if buttons.is_empty() {
                println!("no learned buttons");
            }
            for (channel, name) in buttons.iter() {
                println!("{}\t{}", channel, name);
            }
        }
        Command::Send {
            device,
            delay,
            tokens,
        } => {
            let delay = delay
                .map(|secs| RemoteConfig::with_delay_secs(secs).map(|c| c.delay()))
                .transpose()?;
            let session = Session::open(&device).await?;
            let result = session.remote.send_command(&tokens, delay).await;
            session.print_sent();
            result?;
        }
        Command::Learn { device, channel } => {
            let session = Session::open(&device).await?;
            session.remote.learn_command(&[channel]).await?;
            session.print_sent();
        }
        Command::Replay { device, state } => {
            let state = load_state(&state)?;
            let session = Session::open(&device).await?;
            let mut rx = session.hub.event_bus().subscribe();

            session.remote.on_state_update(&state, &StateMap::new());

            for event in rx.drain() {
                println!("{}", serde_json::to_string(&event)?);
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    rfbridge_core::logging::init_tracing(args.verbose);

    if let Err(e) = run(args.command).await {
        tracing::error!("{:#}", e);
        return Err(e);
    }
    Ok(())
}
