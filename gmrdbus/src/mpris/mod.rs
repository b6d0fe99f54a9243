//! MPRIS presentation of the renderer.
//!
//! The renderer is exported as a read-only media player: desktop widgets
//! see its status, volume and track but cannot control it.

mod media_player;
mod metadata;
mod player;

pub use media_player::MediaPlayer;
pub use metadata::{NO_TRACK, mpris_metadata, track_id};
pub use player::{Player, PlayerProperty};

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use futures::StreamExt;
use gmrconfig::BusKind;
use tracing::{error, info, warn};
use zbus::{
    Connection,
    fdo::{DBusProxy, RequestNameFlags, RequestNameReply},
    names::{OwnedWellKnownName, WellKnownName},
};

use crate::{
    errors::{NotifyError, Result},
    events::RendererEvents,
    model::RendererVariable,
    notifier::{RendererNotifier, bus_builder, bus_safe_uuid, spawn_notifier},
};

pub const MPRIS_BASE_NAME: &str = "org.mpris.MediaPlayer2.GMediaRender.instance";
pub const MPRIS_PATH: &str = "/org/mpris/MediaPlayer2";

/// Well-known bus name of renderer `uuid`.
pub fn mpris_bus_name(uuid: &str) -> Result<OwnedWellKnownName> {
    let name = format!("{}{}", MPRIS_BASE_NAME, bus_safe_uuid(uuid));
    WellKnownName::try_from(name.clone())
        .map(OwnedWellKnownName::from)
        .map_err(|e| NotifyError::invalid_name(&name, e))
}

/// Whether this instance currently owns its MPRIS name.
#[derive(Debug, Clone)]
pub struct NameOwnership {
    name: OwnedWellKnownName,
    owned: Arc<AtomicBool>,
}

impl NameOwnership {
    pub fn new(name: OwnedWellKnownName, owned: bool) -> Self {
        Self {
            name,
            owned: Arc::new(AtomicBool::new(owned)),
        }
    }

    pub fn is_owned(&self) -> bool {
        self.owned.load(Ordering::Relaxed)
    }

    /// Handles a `NameAcquired` signal, which may be about another name of
    /// the same connection.
    pub fn name_acquired(&self, name: &str) {
        if name == self.name.as_str() && !self.owned.swap(true, Ordering::Relaxed) {
            info!("Acquired '{}' on D-Bus.", name);
        }
    }

    /// Handles a `NameLost` signal.
    pub fn name_lost(&self, name: &str) {
        if name == self.name.as_str() && self.owned.swap(false, Ordering::Relaxed) {
            error!("Lost '{}' on D-Bus.", name);
        }
    }
}

pub struct MprisNotifier {
    connection: Connection,
    ownership: NameOwnership,
}

impl MprisNotifier {
    /// Exports the MPRIS objects and requests the instance name, replacing
    /// any previous owner.
    pub async fn connect(bus: BusKind, uuid: &str, identity: &str) -> Result<Self> {
        let name = mpris_bus_name(uuid)?;

        let connection = bus_builder(bus)?
            .serve_at(MPRIS_PATH, MediaPlayer::new(identity))?
            .serve_at(MPRIS_PATH, Player::default())?
            .build()
            .await?;
        info!("Acquired {} bus. Exporting MPRIS objects.", bus);

        let reply = connection
            .request_name_with_flags(name.as_str(), RequestNameFlags::ReplaceExisting.into())
            .await?;
        let owned = match reply {
            RequestNameReply::PrimaryOwner | RequestNameReply::AlreadyOwner => {
                info!("Acquired '{}' on D-Bus.", name.as_str());
                true
            }
            RequestNameReply::InQueue | RequestNameReply::Exists => {
                error!("Lost '{}' on D-Bus.", name.as_str());
                false
            }
        };

        let ownership = NameOwnership::new(name, owned);
        watch_name_ownership(connection.clone(), ownership.clone());

        Ok(Self {
            connection,
            ownership,
        })
    }

    pub fn bus_name(&self) -> &OwnedWellKnownName {
        &self.ownership.name
    }

    pub fn owns_name(&self) -> bool {
        self.ownership.is_owned()
    }
}

/// Keeps `ownership` in line with the bus, which may hand the name to
/// another instance or give it back later.
fn watch_name_ownership(connection: Connection, ownership: NameOwnership) {
    tokio::spawn(async move {
        if let Err(e) = follow_name_ownership(&connection, &ownership).await {
            warn!(
                "Stopped following ownership of '{}': {}",
                ownership.name.as_str(),
                e
            );
        }
    });
}

async fn follow_name_ownership(
    connection: &Connection,
    ownership: &NameOwnership,
) -> zbus::Result<()> {
    let proxy = DBusProxy::new(connection).await?;
    let mut acquired = proxy.receive_name_acquired().await?;
    let mut lost = proxy.receive_name_lost().await?;

    loop {
        tokio::select! {
            Some(signal) = acquired.next() => ownership.name_acquired(signal.args()?.name().as_str()),
            Some(signal) = lost.next() => ownership.name_lost(signal.args()?.name().as_str()),
            else => break,
        }
    }
    Ok(())
}

#[async_trait]
impl RendererNotifier for MprisNotifier {
    fn name(&self) -> &'static str {
        "mpris"
    }

    async fn notify(&self, variable: &RendererVariable) -> Result<()> {
        let player_ref = self
            .connection
            .object_server()
            .interface::<_, Player>(MPRIS_PATH)
            .await?;
        let mut player = player_ref.get_mut().await;

        if let Some(property) = player.apply(variable)? {
            player
                .property_changed(property, player_ref.signal_emitter())
                .await?;
        }
        Ok(())
    }
}

/// Exports the MPRIS objects and attaches them to `events`.
///
/// A connection failure is logged and leaves the feature off for the
/// session.
pub async fn start_mpris(
    events: &RendererEvents,
    bus: BusKind,
    uuid: &str,
    identity: &str,
) -> bool {
    match MprisNotifier::connect(bus, uuid, identity).await {
        Ok(notifier) => {
            spawn_notifier(events, notifier);
            true
        }
        Err(e) => {
            error!("Failed to export MPRIS objects on {} D-Bus: {}", bus, e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bus_name() {
        let name = mpris_bus_name("4a3f0c2e-1b2d-4c5e-8f90-123456789abc").unwrap();
        assert_eq!(
            name.as_str(),
            "org.mpris.MediaPlayer2.GMediaRender.instance4a3f0c2e_1b2d_4c5e_8f90_123456789abc"
        );
    }

    #[test]
    fn test_name_ownership_follows_own_name_only() {
        let name = mpris_bus_name("0000-1111").unwrap();
        let ownership = NameOwnership::new(name, true);

        ownership.name_lost("org.mpris.MediaPlayer2.Other");
        assert!(ownership.is_owned());

        ownership.name_lost("org.mpris.MediaPlayer2.GMediaRender.instance0000_1111");
        assert!(!ownership.is_owned());

        let shared = ownership.clone();
        shared.name_acquired("org.mpris.MediaPlayer2.GMediaRender.instance0000_1111");
        assert!(ownership.is_owned());
    }

    #[test]
    fn test_invalid_bus_name() {
        assert!(matches!(
            mpris_bus_name("uuid:1234"),
            Err(NotifyError::InvalidName(_, _))
        ));
    }
}
