/*
[INPUT]:  Closures posted from background tasks and producer threads
[OUTPUT]: Ordered execution of those closures on the single UI thread
[POS]:    Dispatch seam between worker threads and the UI event loop
[UPDATE]: When changing how the host drains UI work
*/

use tokio::sync::mpsc;

pub type UiTask = Box<dyn FnOnce() + Send + 'static>;

/// Posts work to the UI thread. Cheap to clone; safe from any thread.
#[derive(Clone)]
pub struct UiHandle {
    tx: mpsc::UnboundedSender<UiTask>,
}

impl std::fmt::Debug for UiHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiHandle")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

impl UiHandle {
    /// Queues `task` behind everything already posted.
    /// Returns `false` once the UI loop has gone away.
    pub fn invoke_later(&self, task: impl FnOnce() + Send + 'static) -> bool {
        self.tx.send(Box::new(task)).is_ok()
    }
}

/// Receiving end owned by the UI loop.
pub struct UiQueue {
    rx: mpsc::UnboundedReceiver<UiTask>,
}

impl UiQueue {
    pub fn new() -> (UiHandle, UiQueue) {
        let (tx, rx) = mpsc::unbounded_channel();
        (UiHandle { tx }, UiQueue { rx })
    }

    /// Runs every task queued right now without waiting.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.rx.try_recv() {
            task();
            ran += 1;
        }
        ran
    }

    /// Waits for the next task; `None` when every handle is dropped.
    pub async fn recv(&mut self) -> Option<UiTask> {
        self.rx.recv().await
    }
}
