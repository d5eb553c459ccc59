//! AV-Bridge headless smoke harness.
//!
//! Mounts a [`BridgeCoordinator`] over the loopback native session, drives it
//! through a scripted call sequence using the JSON script-call surface, logs
//! every event the managed layer would have received, and unmounts.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load_config()              -- --config, AVBRIDGE_CONFIG, or platform dir
//!  └─ save_config_to()           -- only with --write-config, then exit
//!  └─ BridgeCoordinator::mount() -- over LoopbackSession
//!  └─ for each scripted call
//!       ├─ script_bridge::invoke_json()
//!       └─ pump loopback notifications → handle_notification() → script events
//!  └─ BridgeCoordinator::unmount()
//! ```

use std::path::PathBuf;
use std::sync::mpsc::Receiver;

use anyhow::Context;
use clap::Parser;
use serde_json::{json, Value};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use avbridge_core::{EventName, NativeNotification};
use avbridge_host::application::coordinate_lifecycle::BridgeCoordinator;
use avbridge_host::application::dispatch_command::NativeSession;
use avbridge_host::infrastructure::native_session::LoopbackSession;
use avbridge_host::infrastructure::script_bridge::{forward_to_script, invoke_json};
use avbridge_host::infrastructure::storage::config::{
    config_file_path, load_config, load_config_from, save_config_to,
};

/// Command-line arguments for the smoke harness.
#[derive(Debug, Parser)]
#[command(
    name = "avbridge-host",
    about = "Drives an AV-Bridge coordinator through a scripted session \
             against a loopback native layer",
    version
)]
struct Cli {
    /// Config file to load instead of `AVBRIDGE_CONFIG` or the platform default.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Room to join.
    #[arg(long, default_value = "smoke-room", env = "AVBRIDGE_ROOM")]
    room: String,

    /// Access token passed through to the native session.
    #[arg(long, default_value = "smoke-token", env = "AVBRIDGE_TOKEN")]
    token: String,

    /// Write the effective config (defaults filled in) to the config path and exit.
    #[arg(long)]
    write_config: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config_from(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => load_config().context("loading config")?,
    };

    // `RUST_LOG` wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.bridge.log_level)),
        )
        .init();

    if cli.write_config {
        let path = match cli.config {
            Some(path) => path,
            None => config_file_path().context("resolving config path")?,
        };
        save_config_to(&path, &config)
            .with_context(|| format!("writing config to {}", path.display()))?;
        info!(path = %path.display(), "config written");
        return Ok(());
    }

    info!(version = %config.bridge.version, room = %cli.room, "AV-Bridge smoke harness starting");

    let (native, notifications) = LoopbackSession::new();
    let (script_tx, script_events) = std::sync::mpsc::channel();

    let mut bridge = BridgeCoordinator::with_defaults(native, config.connect_defaults.clone());
    bridge.set_callbacks(forward_to_script(&EventName::ALL, script_tx));
    let handle = bridge.mount();
    info!(
        bridge = %bridge.bridge_id(),
        %handle,
        subscribed = bridge.registered_events().len(),
        "bridge mounted"
    );

    let calls = [
        json!({ "method": "connect", "roomName": cli.room, "accessToken": cli.token }),
        json!({ "method": "flipCamera" }),
        json!({ "method": "sendString", "message": "hello from avbridge-host" }),
        json!({ "method": "getStats" }),
        json!({ "method": "disconnect" }),
    ];

    for call in &calls {
        let result = invoke_json(&mut bridge, &call.to_string());
        if result.success {
            info!(call = %call["method"], data = ?result.data, "call completed");
        } else {
            warn!(call = %call["method"], error = ?result.error, "call rejected");
        }
        pump(&mut bridge, &notifications, &script_events);
    }

    // The optimistic toggle resolves immediately with the requested value.
    let echoed = bridge.set_local_video_enabled(false).await;
    info!(echoed, "local video toggled");
    pump(&mut bridge, &notifications, &script_events);

    info!(state = ?bridge.state(), "unmounting");
    bridge.unmount();
    info!("AV-Bridge smoke harness finished");
    Ok(())
}

/// Feeds queued loopback notifications through the coordinator and logs the
/// script events they produced.
fn pump<S: NativeSession>(
    bridge: &mut BridgeCoordinator<S>,
    notifications: &Receiver<NativeNotification>,
    script_events: &Receiver<Value>,
) {
    for notification in notifications.try_iter() {
        bridge.handle_notification(notification);
    }
    for event in script_events.try_iter() {
        info!(event = %event["type"], payload = %event["nativeEvent"], "script event");
    }
}
