use tokio::sync::mpsc;

use crate::service::pipeline::{PipelineEngine, PipelineEvent};

/// Drains the bus one event at a time; suspension happens only inside the
/// engine's collaborator calls.
pub async fn run_event_worker(mut rx: mpsc::Receiver<PipelineEvent>, engine: PipelineEngine) {
    while let Some(event) = rx.recv().await {
        engine.handle_event(event).await;
    }
}
