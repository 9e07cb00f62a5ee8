use tokio::sync::watch;

use crate::models::MovieId;

/// Owner of a picker's selection
///
/// Called synchronously from `select` and `remove` with the full new id list. The consumer
/// is responsible for persisting or forwarding it.
pub trait SelectionConsumer: Send + Sync {
    fn on_selection_change(&self, ids: &[MovieId]);
}

impl<F> SelectionConsumer for F
where
    F: Fn(&[MovieId]) + Send + Sync,
{
    fn on_selection_change(&self, ids: &[MovieId]) {
        self(ids)
    }
}

/// Publishes every change to a watch channel, so an async task can persist the latest list
impl SelectionConsumer for watch::Sender<Vec<MovieId>> {
    fn on_selection_change(&self, ids: &[MovieId]) {
        self.send_replace(ids.to_vec());
    }
}
