//! # gmrdbus - renderer state on D-Bus
//!
//! Mirrors the playback state, volume and track of a UPnP media renderer
//! onto D-Bus, through two notifiers fed by a [`RendererEvents`] hub:
//!
//! - [`monitor`]: `com.hzeller.gmedia_resurrect.v1.Monitor` signals,
//! - [`mpris`]: the standard MPRIS media player objects.
//!
//! The UPnP stack reports variable changes with
//! [`RendererEvents::transport_variable_changed`] and
//! [`RendererEvents::control_variable_changed`].

pub mod errors;
pub mod events;
pub mod model;
pub mod monitor;
pub mod mpris;
pub mod notifier;

pub use errors::NotifyError;
pub use events::RendererEvents;
pub use model::{PlaybackStatus, RendererVariable, TransportState, Volume};
pub use monitor::{MonitorNotifier, MonitorSignal, start_monitor};
pub use mpris::{MprisNotifier, start_mpris};
pub use notifier::{RendererNotifier, spawn_notifier};
