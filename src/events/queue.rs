use tokio::sync::mpsc;

use crate::service::pipeline::PipelineEvent;

#[derive(Clone)]
pub struct EventBus {
    tx: mpsc::Sender<PipelineEvent>,
}

impl EventBus {
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<PipelineEvent>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self { tx }, rx)
    }

    pub async fn emit(&self, event: PipelineEvent) {
        let _ = self.tx.send(event).await;
    }
}
