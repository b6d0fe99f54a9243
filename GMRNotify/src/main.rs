mod bridge;
mod logs;

use gmrconfig::get_config;
use gmrdbus::{RendererEvents, start_monitor, start_mpris};
use tokio::{io::BufReader, signal};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = get_config();
    let logs = logs::init_logging(&config);

    info!("🔔 Starting GMRNotify (config: {})", config.config_file());

    let uuid = config.get_device_udn("mediarenderer", "gmediarender")?;
    let bus = config.get_dbus_bus()?;
    info!("📡 Renderer {} on the {} bus", uuid, bus);

    let events = RendererEvents::new();

    if config.get_monitor_enabled()? {
        start_monitor(&events, bus, &uuid).await;
    } else {
        info!("Monitor signals disabled");
    }

    if config.get_mpris_enabled()? {
        let identity = config.get_mpris_identity()?;
        start_mpris(&events, bus, &uuid, &identity).await;
    } else {
        info!("MPRIS objects disabled");
    }

    if events.subscriber_count() == 0 {
        warn!("⚠️ No D-Bus notifier running, renderer changes will only be logged");
    }

    info!("✅ GMRNotify is ready, reading renderer changes from stdin");
    info!("Press Ctrl+C to stop...");

    let stdin = BufReader::new(tokio::io::stdin());
    tokio::select! {
        result = bridge::run(stdin, &events, &logs) => match result {
            Ok(handled) => info!("Renderer input closed after {} changes", handled),
            Err(e) => error!("Failed to read renderer input: {}", e),
        },
        _ = signal::ctrl_c() => info!("🛑 Ctrl+C received, stopping"),
    }

    Ok(())
}
