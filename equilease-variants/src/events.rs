use tokio::sync::broadcast;
use equilease_shared::models::events::GenerationEvent;

/// Fan-out of generation progress to whoever is listening (SSE clients).
/// Publishing never blocks and never fails the run.
#[derive(Clone, Default)]
pub struct ProgressPublisher {
    sender: Option<broadcast::Sender<GenerationEvent>>,
}

impl ProgressPublisher {
    pub fn new(sender: broadcast::Sender<GenerationEvent>) -> Self {
        Self { sender: Some(sender) }
    }

    /// Publisher that drops every event
    pub fn disabled() -> Self {
        Self { sender: None }
    }

    pub fn subscribe(&self) -> Option<broadcast::Receiver<GenerationEvent>> {
        self.sender.as_ref().map(|tx| tx.subscribe())
    }

    pub fn publish(&self, event: GenerationEvent) {
        let Some(tx) = &self.sender else {
            return;
        };
        if tx.send(event).is_err() {
            // no subscribers
            tracing::trace!("Dropped generation event, nobody listening");
        }
    }
}
