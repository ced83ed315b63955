// ── Observer contract ──
//
// Observers declare the attrs they care about up front; the coordinator
// gates notification on overlap with the changed-attr set and always
// hands over the full flat mapping, never a diff.

use std::collections::BTreeSet;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::convert::FlatValues;

/// An observer of decoded station state.
///
/// `on_update` runs inside the poll pipeline; implementations must not
/// block and must not call back into the coordinator.
pub trait StateSubscriber: Send + Sync {
    /// The attrs whose change should wake this observer.
    fn subscribed_attrs(&self) -> &BTreeSet<String>;

    /// Receive the full decoded mapping after a cycle in which at least
    /// one subscribed attr changed.
    fn on_update(&self, values: &Arc<FlatValues>);

    /// Whether the observer has gone away and can be pruned.
    fn is_closed(&self) -> bool {
        false
    }
}

/// Channel-backed subscription handle returned by
/// [`StationCoordinator::subscribe`](crate::StationCoordinator::subscribe).
///
/// The subscription set is computed from the registry snapshot at
/// creation time; converters registered later are not picked up unless a
/// new subscription is taken.
pub struct Subscription {
    attrs: BTreeSet<String>,
    rx: mpsc::UnboundedReceiver<Arc<FlatValues>>,
}

impl Subscription {
    pub(crate) fn new(
        attrs: BTreeSet<String>,
    ) -> (Self, Arc<ChannelSubscriber>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let subscriber = Arc::new(ChannelSubscriber {
            attrs: attrs.clone(),
            tx,
        });
        (Self { attrs, rx }, subscriber)
    }

    /// The subscription set this handle was created with.
    pub fn attrs(&self) -> &BTreeSet<String> {
        &self.attrs
    }

    /// Wait for the next update. Returns `None` once the coordinator has
    /// been dropped.
    pub async fn next(&mut self) -> Option<Arc<FlatValues>> {
        self.rx.recv().await
    }

    /// Non-blocking poll for a pending update.
    pub fn try_next(&mut self) -> Option<Arc<FlatValues>> {
        self.rx.try_recv().ok()
    }
}

/// Internal adapter bridging the channel handle onto the subscriber trait.
pub(crate) struct ChannelSubscriber {
    attrs: BTreeSet<String>,
    tx: mpsc::UnboundedSender<Arc<FlatValues>>,
}

impl StateSubscriber for ChannelSubscriber {
    fn subscribed_attrs(&self) -> &BTreeSet<String> {
        &self.attrs
    }

    fn on_update(&self, values: &Arc<FlatValues>) {
        let _ = self.tx.send(Arc::clone(values));
    }

    fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
