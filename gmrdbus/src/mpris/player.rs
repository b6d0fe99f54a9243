use std::collections::HashMap;

use gmrdidl::TrackMetadata;
use tracing::debug;
use zbus::{
    interface,
    object_server::SignalEmitter,
    zvariant::{ObjectPath, OwnedValue},
};

use crate::{
    errors::{NotifyError, Result},
    model::{PlaybackStatus, RendererVariable},
    mpris::metadata::mpris_metadata,
};

/// Player property touched by a renderer change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerProperty {
    PlaybackStatus,
    Volume,
    Metadata,
}

/// `org.mpris.MediaPlayer2.Player` object.
///
/// Mirrors the renderer state; every control method is accepted and
/// ignored.
pub struct Player {
    status: PlaybackStatus,
    volume: f64,
    metadata: TrackMetadata,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            status: PlaybackStatus::Stopped,
            volume: 1.0,
            metadata: TrackMetadata::with_id(0),
        }
    }
}

impl Player {
    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn volume_level(&self) -> f64 {
        self.volume
    }

    pub fn track(&self) -> &TrackMetadata {
        &self.metadata
    }

    /// Updates the state from a renderer change and reports which property
    /// changed, if any.
    pub fn apply(&mut self, variable: &RendererVariable) -> Result<Option<PlayerProperty>> {
        match variable {
            RendererVariable::TransportState(state) => {
                let status = state
                    .playback_status()
                    .ok_or_else(|| NotifyError::UnknownTransportState(state.to_string()))?;
                if status == self.status {
                    return Ok(None);
                }
                self.status = status;
                Ok(Some(PlayerProperty::PlaybackStatus))
            }
            RendererVariable::Volume(volume) => {
                let level = volume.level();
                if level == self.volume {
                    return Ok(None);
                }
                self.volume = level;
                Ok(Some(PlayerProperty::Volume))
            }
            RendererVariable::TrackMetadata(xml) => {
                let mut metadata = TrackMetadata::new();
                if !xml.is_empty() && !metadata.parse_xml(xml) {
                    debug!("Track metadata is not DIDL-Lite, clearing MPRIS metadata");
                }
                if metadata.tags().eq(self.metadata.tags()) {
                    return Ok(None);
                }
                self.metadata = metadata;
                Ok(Some(PlayerProperty::Metadata))
            }
        }
    }

    /// Emits `PropertiesChanged` for `property`.
    pub async fn property_changed(
        &self,
        property: PlayerProperty,
        emitter: &SignalEmitter<'_>,
    ) -> zbus::Result<()> {
        match property {
            PlayerProperty::PlaybackStatus => self.playback_status_changed(emitter).await,
            PlayerProperty::Volume => self.volume_changed(emitter).await,
            PlayerProperty::Metadata => self.metadata_changed(emitter).await,
        }
    }
}

#[interface(name = "org.mpris.MediaPlayer2.Player")]
impl Player {
    fn next(&self) {}

    fn previous(&self) {}

    fn pause(&self) {}

    fn play_pause(&self) {}

    fn stop(&self) {}

    fn play(&self) {}

    fn seek(&self, _offset: i64) {}

    fn set_position(&self, _track_id: ObjectPath<'_>, _position: i64) {}

    fn open_uri(&self, _uri: &str) {}

    #[zbus(signal)]
    async fn seeked(emitter: &SignalEmitter<'_>, position: i64) -> zbus::Result<()>;

    #[zbus(property)]
    fn playback_status(&self) -> String {
        self.status.as_str().to_string()
    }

    #[zbus(property)]
    fn rate(&self) -> f64 {
        1.0
    }

    #[zbus(property)]
    fn minimum_rate(&self) -> f64 {
        1.0
    }

    #[zbus(property)]
    fn maximum_rate(&self) -> f64 {
        1.0
    }

    #[zbus(property)]
    fn metadata(&self) -> HashMap<String, OwnedValue> {
        mpris_metadata(&self.metadata)
    }

    #[zbus(property)]
    fn volume(&self) -> f64 {
        self.volume
    }

    #[zbus(property(emits_changed_signal = "false"))]
    fn position(&self) -> i64 {
        0
    }

    #[zbus(property)]
    fn can_go_next(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn can_go_previous(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn can_play(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn can_pause(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn can_seek(&self) -> bool {
        false
    }

    #[zbus(property(emits_changed_signal = "const"))]
    fn can_control(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TransportState, Volume};
    use gmrdidl::TagKey;

    #[test]
    fn test_initial_state() {
        let player = Player::default();
        assert_eq!(player.playback_status(), "Stopped");
        assert_eq!(player.volume(), 1.0);
        assert_eq!(player.position(), 0);
        assert_eq!(player.rate(), 1.0);
        assert_eq!(player.minimum_rate(), 1.0);
        assert_eq!(player.maximum_rate(), 1.0);
        assert!(!player.can_control());
        assert!(!player.can_play());
        assert!(!player.can_pause());
        assert!(!player.can_seek());
        assert!(!player.can_go_next());
        assert!(!player.can_go_previous());
        assert_eq!(player.metadata().len(), 1);
    }

    #[test]
    fn test_transport_state_changes() {
        let mut player = Player::default();

        let playing = RendererVariable::TransportState(TransportState::Playing);
        assert_eq!(
            player.apply(&playing).unwrap(),
            Some(PlayerProperty::PlaybackStatus)
        );
        assert_eq!(player.playback_status(), "Playing");
        assert_eq!(player.apply(&playing).unwrap(), None);

        let paused = RendererVariable::TransportState(TransportState::PausedPlayback);
        player.apply(&paused).unwrap();
        assert_eq!(player.status(), PlaybackStatus::Paused);
    }

    #[test]
    fn test_unmapped_transport_state_keeps_status() {
        let mut player = Player::default();
        player
            .apply(&RendererVariable::TransportState(TransportState::Playing))
            .unwrap();

        let result = player.apply(&RendererVariable::TransportState(
            TransportState::NoMediaPresent,
        ));
        assert!(matches!(result, Err(NotifyError::UnknownTransportState(s)) if s == "NO_MEDIA_PRESENT"));
        assert_eq!(player.status(), PlaybackStatus::Playing);
    }

    #[test]
    fn test_volume_is_normalized() {
        let mut player = Player::default();
        let half = RendererVariable::Volume(Volume::new("50"));
        assert_eq!(player.apply(&half).unwrap(), Some(PlayerProperty::Volume));
        assert_eq!(player.volume(), 0.5);
        assert_eq!(player.apply(&half).unwrap(), None);

        let full = RendererVariable::Volume(Volume::new("100"));
        assert_eq!(player.apply(&full).unwrap(), Some(PlayerProperty::Volume));
        assert_eq!(player.volume_level(), 1.0);

        let unreadable = RendererVariable::Volume(Volume::new("n/a"));
        assert_eq!(player.apply(&unreadable).unwrap(), Some(PlayerProperty::Volume));
        assert_eq!(player.volume(), 0.0);
    }

    #[test]
    fn test_track_metadata() {
        let mut player = Player::default();
        let xml = r#"<DIDL-Lite><item id="1"><dc:title>Song</dc:title></item></DIDL-Lite>"#;
        let change = RendererVariable::TrackMetadata(xml.to_string());

        assert_eq!(player.apply(&change).unwrap(), Some(PlayerProperty::Metadata));
        assert_eq!(player.track().get(TagKey::Title), Some("Song"));
        assert_eq!(player.metadata().len(), 2);
        assert_eq!(player.apply(&change).unwrap(), None);

        let cleared = RendererVariable::TrackMetadata(String::new());
        assert_eq!(player.apply(&cleared).unwrap(), Some(PlayerProperty::Metadata));
        assert!(player.track().is_empty());
    }
}
