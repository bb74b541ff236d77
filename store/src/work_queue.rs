use flume::{Receiver, Sender};
use model::query::QueryId;

/// FIFO queue of query ids awaiting execution. Submission enqueues, workers
/// dequeue; cloning shares the same underlying channel so queue depth is
/// observable from either side.
#[derive(Clone)]
pub struct WorkQueue {
    tx: Sender<QueryId>,
    rx: Receiver<QueryId>,
}

impl WorkQueue {
    pub fn new() -> Self {
        let (tx, rx) = flume::unbounded();
        Self { tx, rx }
    }

    pub fn enqueue(&self, id: QueryId) {
        self.tx
            .send(id)
            .expect("Queue receiver is owned and should therefore be alive");
    }

    /// Wait for the next id. Returns `None` once every sender is gone.
    pub async fn recv(&self) -> Option<QueryId> {
        self.rx.recv_async().await.ok()
    }

    /// Take the next id without waiting, if one is queued.
    pub fn try_dequeue(&self) -> Option<QueryId> {
        self.rx.try_recv().ok()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

impl Default for WorkQueue {
    fn default() -> Self {
        Self::new()
    }
}
