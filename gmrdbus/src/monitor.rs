//! Custom `com.hzeller.gmedia_resurrect.v1.Monitor` signals.
//!
//! Every playback state or volume change is broadcast as a signal carrying
//! a single string, from an object path unique to the renderer instance.

use async_trait::async_trait;
use gmrconfig::BusKind;
use tracing::{error, info};
use zbus::{Connection, zvariant::OwnedObjectPath};

use crate::{
    errors::{NotifyError, Result},
    events::RendererEvents,
    model::{PlaybackStatus, RendererVariable},
    notifier::{RendererNotifier, bus_builder, bus_safe_uuid, spawn_notifier},
};

pub const MONITOR_INTERFACE: &str = "com.hzeller.gmedia_resurrect.v1.Monitor";
pub const MONITOR_BASE_PATH: &str = "/com/hzeller/gmedia_resurrect";

/// Object path the signals of renderer `uuid` are emitted from.
pub fn monitor_object_path(uuid: &str) -> Result<OwnedObjectPath> {
    let path = format!("{}/{}", MONITOR_BASE_PATH, bus_safe_uuid(uuid));
    OwnedObjectPath::try_from(path.as_str()).map_err(|e| NotifyError::invalid_name(&path, e))
}

/// A signal of the Monitor interface.
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorSignal {
    PlaybackState(PlaybackStatus),
    /// Volume as published by the rendering control, not normalized.
    Volume(String),
}

impl MonitorSignal {
    /// The signal a renderer change translates to.
    ///
    /// Transport states outside the MPRIS tri-state are an error, metadata
    /// changes have no signal.
    pub fn for_variable(variable: &RendererVariable) -> Result<Option<Self>> {
        match variable {
            RendererVariable::TransportState(state) => state
                .playback_status()
                .map(|status| Some(MonitorSignal::PlaybackState(status)))
                .ok_or_else(|| NotifyError::UnknownTransportState(state.to_string())),
            RendererVariable::Volume(volume) => {
                Ok(Some(MonitorSignal::Volume(volume.raw().to_string())))
            }
            RendererVariable::TrackMetadata(_) => Ok(None),
        }
    }

    pub fn member(&self) -> &'static str {
        match self {
            MonitorSignal::PlaybackState(_) => "PlaybackState",
            MonitorSignal::Volume(_) => "Volume",
        }
    }

    pub fn argument(&self) -> &str {
        match self {
            MonitorSignal::PlaybackState(status) => status.as_str(),
            MonitorSignal::Volume(raw) => raw,
        }
    }
}

pub struct MonitorNotifier {
    connection: Connection,
    path: OwnedObjectPath,
}

impl MonitorNotifier {
    pub async fn connect(bus: BusKind, uuid: &str) -> Result<Self> {
        let path = monitor_object_path(uuid)?;
        let connection = bus_builder(bus)?.build().await?;

        info!("Notifying {} D-Bus at {}", bus, path.as_str());
        Ok(Self { connection, path })
    }

    pub fn object_path(&self) -> &OwnedObjectPath {
        &self.path
    }

    async fn emit(&self, signal: &MonitorSignal) -> Result<()> {
        self.connection
            .emit_signal(
                None::<&str>,
                self.path.as_str(),
                MONITOR_INTERFACE,
                signal.member(),
                &(signal.argument(),),
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl RendererNotifier for MonitorNotifier {
    fn name(&self) -> &'static str {
        "monitor"
    }

    async fn notify(&self, variable: &RendererVariable) -> Result<()> {
        match MonitorSignal::for_variable(variable)? {
            Some(signal) => self.emit(&signal).await,
            None => Ok(()),
        }
    }
}

/// Connects the Monitor notifier and attaches it to `events`.
///
/// A connection failure is logged and leaves the feature off for the
/// session.
pub async fn start_monitor(events: &RendererEvents, bus: BusKind, uuid: &str) -> bool {
    match MonitorNotifier::connect(bus, uuid).await {
        Ok(notifier) => {
            spawn_notifier(events, notifier);
            true
        }
        Err(e) => {
            error!("Failed to connect to {} D-Bus: {}", bus, e);
            false
        }
    }
}
