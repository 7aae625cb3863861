use tokio::task::JoinHandle;

/// Owner of a recurring background task (quiz countdown, leaderboard polling).
///
/// Stopping or dropping the handle aborts the task, so a torn-down view is never
/// updated afterwards.
#[derive(Debug)]
pub struct TaskHandle {
    name: &'static str,
    handle: Option<JoinHandle<()>>,
}

impl TaskHandle {
    #[must_use]
    pub fn new(name: &'static str, handle: JoinHandle<()>) -> Self {
        Self {
            name,
            handle: Some(handle),
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// True once the task ended on its own or was stopped.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            tracing::info!(task = self.name, "stopped background task");
        }
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
