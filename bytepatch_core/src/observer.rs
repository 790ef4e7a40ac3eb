use serde::Serialize;

/// Emitted once after a find-and-replace has been committed to a resource.
///
/// Views holding a cached rendering of the resource should rebuild it from the
/// new contents when they receive this.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ResourceChanged {
    pub resource_id: String,
    pub occurrences: usize,
    pub old_len: usize,
    pub new_len: usize,
    pub old_md5: String,
    pub new_md5: String,
}

/// Receives [`ResourceChanged`] notifications.
///
/// A failing observer is logged by the engine; the committed change stays in place.
pub trait ChangeObserver {
    /// Identifies the observer in log output.
    fn name(&self) -> &'static str;

    /// Called by the engine after a request has been committed to a resource.
    ///
    /// This is the place to drop or rebuild any cached view of the resource. It is
    /// never called for rejected requests, failed commits, or requests that matched nothing.
    ///
    /// # Arguments
    /// * `event`: What changed: the resource id, how many occurrences were replaced,
    ///   and the lengths and MD5 digests before and after.
    ///
    /// # Returns
    /// `Ok(())` on success, or an `anyhow::Error` if the observer could not handle the
    /// change. The error is logged; the committed contents are not rolled back.
    fn on_resource_changed(&mut self, event: &ResourceChanged) -> Result<(), anyhow::Error>;
}

/// Ignores every notification.
#[derive(Default, Debug, Clone, Copy)]
pub struct NoOpObserver;

impl ChangeObserver for NoOpObserver {
    fn name(&self) -> &'static str {
        "NoOpObserver"
    }

    fn on_resource_changed(&mut self, _event: &ResourceChanged) -> Result<(), anyhow::Error> {
        Ok(())
    }
}

/// Keeps every notification it receives, in order.
#[derive(Default, Debug, Clone)]
pub struct RecordingObserver {
    pub events: Vec<ResourceChanged>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }
}

impl ChangeObserver for RecordingObserver {
    fn name(&self) -> &'static str {
        "RecordingObserver"
    }

    fn on_resource_changed(&mut self, event: &ResourceChanged) -> Result<(), anyhow::Error> {
        self.events.push(event.clone());
        Ok(())
    }
}
