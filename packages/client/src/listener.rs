//! Channel-based subscriber registry.

use tokio::sync::mpsc;

/// Fan-out of events to channel subscribers.
///
/// Each subscriber receives every event once, in emission order. Dropping the
/// receiver unsubscribes; [`Listeners::clear`] closes every subscription.
#[derive(Debug)]
pub struct Listeners<T> {
    senders: Vec<mpsc::UnboundedSender<T>>,
}

impl<T> Default for Listeners<T> {
    fn default() -> Self {
        Self {
            senders: Vec::new(),
        }
    }
}

impl<T: Clone> Listeners<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders.push(tx);
        rx
    }

    /// Register an externally created sender
    pub fn attach(&mut self, sender: mpsc::UnboundedSender<T>) {
        self.senders.push(sender);
    }

    /// Deliver to every live subscriber, pruning the ones that went away
    pub fn emit(&mut self, event: &T) {
        self.senders.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Deliver to the most recently attached subscriber only
    pub fn emit_latest(&mut self, event: T) {
        if let Some(tx) = self.senders.last()
            && tx.send(event).is_err()
        {
            self.senders.pop();
        }
    }

    pub fn clear(&mut self) {
        self.senders.clear();
    }

    pub fn len(&self) -> usize {
        self.senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }
}
