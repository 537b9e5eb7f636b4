//! Countdown tasks.

use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// A scheduled timeout tied to one awaiting-response episode.
#[derive(Debug)]
pub(crate) struct Countdown {
    pub(crate) generation: u64,
    task: Option<JoinHandle<()>>,
}

impl Countdown {
    /// Spawn `on_expiry` after `secs` on the current tokio runtime. Outside a
    /// runtime nothing is spawned and expiry is detected lazily.
    pub(crate) fn arm<F>(generation: u64, secs: u64, on_expiry: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let task = Handle::try_current().ok().map(|handle| {
            handle.spawn(async move {
                tokio::time::sleep(Duration::from_secs(secs)).await;
                on_expiry();
            })
        });
        Self { generation, task }
    }

    pub(crate) fn is_scheduled(&self) -> bool {
        self.task.is_some()
    }

    /// Forget the task without aborting it. Used by the task itself on expiry.
    pub(crate) fn detach(mut self) {
        self.task = None;
    }

    pub(crate) fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.cancel();
    }
}
