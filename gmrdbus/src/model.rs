//! Typed view of the UPnP renderer state variables the notifiers react to.

use std::{fmt, str::FromStr};

use crate::errors::{NotifyError, Result};

/// AVTransport state variable carrying the transport state.
pub const TRANSPORT_STATE: &str = "TransportState";
/// AVTransport state variable carrying the DIDL-Lite of the current URI.
pub const AV_TRANSPORT_URI_METADATA: &str = "AVTransportURIMetaData";
/// AVTransport state variable carrying the DIDL-Lite of the current track.
pub const CURRENT_TRACK_METADATA: &str = "CurrentTrackMetaData";
/// RenderingControl state variable carrying the master volume.
pub const VOLUME: &str = "Volume";

/// UPnP AVTransport `TransportState` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportState {
    Stopped,
    Playing,
    Transitioning,
    PausedPlayback,
    PausedRecording,
    Recording,
    NoMediaPresent,
}

impl TransportState {
    pub fn as_upnp_str(&self) -> &'static str {
        match self {
            TransportState::Stopped => "STOPPED",
            TransportState::Playing => "PLAYING",
            TransportState::Transitioning => "TRANSITIONING",
            TransportState::PausedPlayback => "PAUSED_PLAYBACK",
            TransportState::PausedRecording => "PAUSED_RECORDING",
            TransportState::Recording => "RECORDING",
            TransportState::NoMediaPresent => "NO_MEDIA_PRESENT",
        }
    }

    /// MPRIS status for this transport state, if it has one.
    ///
    /// Only `PLAYING`, `PAUSED_PLAYBACK` and `STOPPED` map onto the MPRIS
    /// tri-state.
    pub fn playback_status(&self) -> Option<PlaybackStatus> {
        match self {
            TransportState::Playing => Some(PlaybackStatus::Playing),
            TransportState::PausedPlayback => Some(PlaybackStatus::Paused),
            TransportState::Stopped => Some(PlaybackStatus::Stopped),
            _ => None,
        }
    }
}

impl FromStr for TransportState {
    type Err = NotifyError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "STOPPED" => Ok(TransportState::Stopped),
            "PLAYING" => Ok(TransportState::Playing),
            "TRANSITIONING" => Ok(TransportState::Transitioning),
            "PAUSED_PLAYBACK" => Ok(TransportState::PausedPlayback),
            "PAUSED_RECORDING" => Ok(TransportState::PausedRecording),
            "RECORDING" => Ok(TransportState::Recording),
            "NO_MEDIA_PRESENT" => Ok(TransportState::NoMediaPresent),
            other => Err(NotifyError::UnknownTransportState(other.to_string())),
        }
    }
}

impl fmt::Display for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_upnp_str())
    }
}

/// MPRIS `PlaybackStatus` property values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PlaybackStatus {
    Playing,
    Paused,
    #[default]
    Stopped,
}

impl PlaybackStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackStatus::Playing => "Playing",
            PlaybackStatus::Paused => "Paused",
            PlaybackStatus::Stopped => "Stopped",
        }
    }
}

impl fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// RenderingControl volume, kept exactly as published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Volume {
    raw: String,
}

impl Volume {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    /// The value exactly as the rendering control published it.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Leading number of the raw value, `0.0` when there is none.
    pub fn percent(&self) -> f64 {
        leading_number(&self.raw)
    }

    /// MPRIS volume level, `1.0` being 100%.
    pub fn level(&self) -> f64 {
        self.percent() / 100.0
    }
}

/// Parses the longest numeric prefix of `s`, after leading whitespace.
fn leading_number(s: &str) -> f64 {
    let s = s.trim_start();
    let candidate_len = s
        .find(|c: char| !(c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E')))
        .unwrap_or(s.len());

    (1..=candidate_len)
        .rev()
        .find_map(|len| s[..len].parse::<f64>().ok())
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}

/// A renderer state change the notifiers care about.
#[derive(Debug, Clone, PartialEq)]
pub enum RendererVariable {
    TransportState(TransportState),
    Volume(Volume),
    /// Raw DIDL-Lite describing the current track.
    TrackMetadata(String),
}

impl RendererVariable {
    /// Decodes an AVTransport variable change.
    ///
    /// Variables nobody reacts to yield `Ok(None)`.
    pub fn from_transport(name: &str, value: &str) -> Result<Option<Self>> {
        match name {
            TRANSPORT_STATE => Ok(Some(RendererVariable::TransportState(value.parse()?))),
            AV_TRANSPORT_URI_METADATA | CURRENT_TRACK_METADATA => {
                Ok(Some(RendererVariable::TrackMetadata(value.to_string())))
            }
            _ => Ok(None),
        }
    }

    /// Decodes a RenderingControl variable change.
    pub fn from_control(name: &str, value: &str) -> Result<Option<Self>> {
        match name {
            VOLUME => Ok(Some(RendererVariable::Volume(Volume::new(value)))),
            _ => Ok(None),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RendererVariable::TransportState(_) => TRANSPORT_STATE,
            RendererVariable::Volume(_) => VOLUME,
            RendererVariable::TrackMetadata(_) => AV_TRANSPORT_URI_METADATA,
        }
    }
}
