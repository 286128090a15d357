/// Document-level pointer and key listeners owned by the host.
///
/// The engine attaches once when a press arms a drag and detaches exactly
/// once when that gesture ends, whichever way it ends.
pub trait DocumentListeners: Send {
    fn attach(&mut self);
    fn detach(&mut self);
}

/// Listeners for hosts that route events to the engine themselves.
#[derive(Debug, Default)]
pub struct NoopListeners;

impl DocumentListeners for NoopListeners {
    fn attach(&mut self) {}
    fn detach(&mut self) {}
}
