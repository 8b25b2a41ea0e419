//! Push notifications
//!
//! Every completed push fires a [`PushEvent`] to the ring's observers,
//! synchronously and in subscription order, before `push` returns. Observers
//! see the fully updated ring state.
//!
//! Derived rings are not wired through observers; [`crate::StreamHistory`]
//! calls them directly so the dependency chain stays explicit and acyclic.

/// Event emitted after a push completes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PushEvent<T> {
    /// Exact newest readout of the ring that fired (raw value for a value
    /// ring, running total for an accumulator ring).
    pub latest: T,
    /// Filled positions after the push, capped at max size.
    pub count: usize,
    /// Total pushes since construction.
    pub pushes: u64,
}

/// Observer that receives push events
pub trait PushObserver<T>: Send + Sync {
    /// Called once per push
    fn on_push(&self, event: &PushEvent<T>);
}

/// Function-based observer for simple cases
pub struct FnObserver<F>(pub F);

impl<T, F: Fn(&PushEvent<T>) + Send + Sync> PushObserver<T> for FnObserver<F> {
    fn on_push(&self, event: &PushEvent<T>) {
        (self.0)(event);
    }
}

/// Channel-based observer - sends events to a channel
pub struct ChannelObserver<T> {
    sender: std::sync::mpsc::Sender<PushEvent<T>>,
}

impl<T> ChannelObserver<T> {
    pub fn new(sender: std::sync::mpsc::Sender<PushEvent<T>>) -> Self {
        Self { sender }
    }
}

impl<T: Copy + Send> PushObserver<T> for ChannelObserver<T> {
    fn on_push(&self, event: &PushEvent<T>) {
        // a dropped receiver just stops listening
        let _ = self.sender.send(*event);
    }
}
