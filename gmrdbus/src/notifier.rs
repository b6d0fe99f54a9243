use async_trait::async_trait;
use gmrconfig::BusKind;
use tokio::{sync::broadcast::error::RecvError, task::JoinHandle};
use tracing::{debug, error, warn};
use zbus::connection;

use crate::{errors::Result, events::RendererEvents, model::RendererVariable};

/// Something that mirrors renderer variable changes somewhere else.
#[async_trait]
pub trait RendererNotifier: Send + Sync {
    /// Short name used in log events.
    fn name(&self) -> &'static str;

    async fn notify(&self, variable: &RendererVariable) -> Result<()>;
}

/// Feeds every change published on `events` to `notifier` until the hub is
/// dropped. Notification failures are logged and never stop the loop.
pub fn spawn_notifier<N>(events: &RendererEvents, notifier: N) -> JoinHandle<()>
where
    N: RendererNotifier + 'static,
{
    let mut receiver = events.subscribe();

    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(variable) => {
                    if let Err(e) = notifier.notify(&variable).await {
                        error!(notifier = notifier.name(), "{}", e);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(
                        notifier = notifier.name(),
                        skipped, "Notifier lagging behind, changes skipped"
                    );
                }
                Err(RecvError::Closed) => break,
            }
        }
        debug!(notifier = notifier.name(), "Renderer events closed, notifier stopped");
    })
}

pub(crate) fn bus_builder(bus: BusKind) -> zbus::Result<connection::Builder<'static>> {
    match bus {
        BusKind::System => connection::Builder::system(),
        BusKind::Session => connection::Builder::session(),
    }
}

/// Replaces the characters of a UDN that D-Bus names and paths reject.
pub(crate) fn bus_safe_uuid(uuid: &str) -> String {
    uuid.replace('-', "_")
}
