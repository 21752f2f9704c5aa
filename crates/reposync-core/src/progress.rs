//! Channel plumbing between the template job worker and the controller.
//!
//! The worker pushes into a bounded queue and blocks once it is full; the
//! controller pulls one message per await. Conflict decisions travel back on
//! a separate unbounded channel.

use crate::template_job::{FileConflictAction, JobMessage};
use std::sync::mpsc::{self, Receiver, Sender, SyncSender};
use std::sync::{Arc, Mutex};

pub const PROGRESS_QUEUE_CAPACITY: usize = 100;

/// Shareable handle to the receiving end of the progress queue.
#[derive(Clone, Debug)]
pub struct ProgressReceiver {
    inner: Arc<Mutex<Receiver<JobMessage>>>,
}

impl ProgressReceiver {
    /// Blocks until the next message. `None` once the worker has hung up
    /// and the queue is drained.
    pub fn wait_next(&self) -> Option<JobMessage> {
        let rx = self.inner.lock().ok()?;
        rx.recv().ok()
    }
}

/// Ends kept by the controller.
#[derive(Debug)]
pub struct ControllerEnds {
    pub inbox: ProgressReceiver,
    pub decisions: Sender<FileConflictAction>,
}

/// Ends moved into the worker.
#[derive(Debug)]
pub struct WorkerEnds {
    pub outbox: SyncSender<JobMessage>,
    pub decisions: Receiver<FileConflictAction>,
}

pub fn open_bridge() -> (ControllerEnds, WorkerEnds) {
    let (outbox, inbox) = mpsc::sync_channel(PROGRESS_QUEUE_CAPACITY);
    let (decision_tx, decision_rx) = mpsc::channel();
    (
        ControllerEnds {
            inbox: ProgressReceiver {
                inner: Arc::new(Mutex::new(inbox)),
            },
            decisions: decision_tx,
        },
        WorkerEnds {
            outbox,
            decisions: decision_rx,
        },
    )
}
