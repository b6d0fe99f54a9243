use tokio::sync::broadcast;
use tracing::{debug, error, trace};

use crate::model::RendererVariable;

const CHANNEL_CAPACITY: usize = 64;

/// Fan-out point between the UPnP stack and the bus notifiers.
///
/// The variable-change callbacks are synchronous and may be called from any
/// thread. Each subscriber gets every decoded change.
#[derive(Clone)]
pub struct RendererEvents {
    sender: broadcast::Sender<RendererVariable>,
}

impl Default for RendererEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl RendererEvents {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RendererVariable> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    pub fn publish(&self, variable: RendererVariable) {
        // No receiver is not an error: the notifiers may all be disabled.
        if self.sender.send(variable).is_err() {
            trace!("Renderer variable dropped, no subscriber");
        }
    }

    /// AVTransport variable listener.
    pub fn transport_variable_changed(&self, name: &str, value: &str) {
        match RendererVariable::from_transport(name, value) {
            Ok(Some(variable)) => self.publish(variable),
            Ok(None) => debug!(variable = name, "Ignoring AVTransport variable"),
            Err(e) => error!("{}", e),
        }
    }

    /// RenderingControl variable listener.
    pub fn control_variable_changed(&self, name: &str, value: &str) {
        match RendererVariable::from_control(name, value) {
            Ok(Some(variable)) => self.publish(variable),
            Ok(None) => debug!(variable = name, "Ignoring RenderingControl variable"),
            Err(e) => error!("{}", e),
        }
    }
}
