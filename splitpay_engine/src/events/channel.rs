//! Simple stateless pub-sub event handler
//!
//! Components of the split payment engine publish events (a contributor paid, an order was confirmed, a co-payment
//! needs attention) and hooks react to them. Handlers never see the engine's internal state, only the event itself.
//! Handlers can be async. Each event is handled on its own task.
use std::{future::Future, pin::Pin, sync::Arc};

use log::*;
use tokio::{sync::mpsc, task::JoinSet};

pub type Handler<E> = Arc<dyn Fn(E) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

pub struct EventHandler<E: Send + Sync + 'static> {
    listener: mpsc::Receiver<E>,
    sender: mpsc::Sender<E>,
    handler: Handler<E>,
}

impl<E: Send + Sync + 'static> EventHandler<E> {
    pub fn new(buffer_size: usize, handler: Handler<E>) -> Self {
        let (sender, listener) = mpsc::channel(buffer_size);
        Self { listener, sender, handler }
    }

    pub fn subscribe(&self) -> EventProducer<E> {
        EventProducer::new(self.sender.clone())
    }

    /// Runs until every producer has been dropped, and then waits for in-flight handlers to finish.
    pub async fn start_handler(mut self) {
        debug!("📬️ Starting event handler");
        // Without this, the channel would never close, since we hold a sender ourselves
        drop(self.sender);
        let mut jobs = JoinSet::new();
        while let Some(ev) = self.listener.recv().await {
            trace!("📬️ Handling event");
            let handler = Arc::clone(&self.handler);
            jobs.spawn(async move { (handler)(ev).await });
            // Reap whatever has finished so the set does not grow without bound
            while let Some(done) = jobs.try_join_next() {
                if let Err(e) = done {
                    warn!("📬️ An event handler task failed: {e}");
                }
            }
        }
        debug!("📬️ All producers have gone away. Waiting for {} in-flight handlers", jobs.len());
        while let Some(done) = jobs.join_next().await {
            if let Err(e) = done {
                warn!("📬️ An event handler task failed: {e}");
            }
        }
        debug!("📬️ Event handler has shut down");
    }
}

#[derive(Clone)]
pub struct EventProducer<E: Send + Sync> {
    sender: mpsc::Sender<E>,
}

impl<E: Send + Sync> EventProducer<E> {
    pub fn new(sender: mpsc::Sender<E>) -> Self {
        Self { sender }
    }

    pub async fn publish_event(&self, event: E) {
        if let Err(e) = self.sender.send(event).await {
            error!("📬️ Failed to send event: {e}");
        }
    }
}
