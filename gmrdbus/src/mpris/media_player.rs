use zbus::interface;

/// `org.mpris.MediaPlayer2` root object. The renderer cannot be raised,
/// quit or switched to fullscreen from the bus.
pub struct MediaPlayer {
    identity: String,
}

impl MediaPlayer {
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
        }
    }
}

#[interface(name = "org.mpris.MediaPlayer2")]
impl MediaPlayer {
    fn raise(&self) {}

    fn quit(&self) {}

    #[zbus(property)]
    fn can_quit(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn can_raise(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn can_set_fullscreen(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn fullscreen(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn has_track_list(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn identity(&self) -> String {
        self.identity.clone()
    }

    #[zbus(property)]
    fn supported_uri_schemes(&self) -> Vec<String> {
        Vec::new()
    }

    #[zbus(property)]
    fn supported_mime_types(&self) -> Vec<String> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_player_refuses_control() {
        let player = MediaPlayer::new("Living Room");
        assert_eq!(player.identity(), "Living Room");
        assert!(!player.can_quit());
        assert!(!player.can_raise());
        assert!(!player.can_set_fullscreen());
        assert!(!player.fullscreen());
        assert!(!player.has_track_list());
        assert!(player.supported_uri_schemes().is_empty());
        assert!(player.supported_mime_types().is_empty());
    }
}
