/// Per-form request state
///
/// Each form owns a [`RequestTracker`]. Submitting takes an [`Attempt`],
/// which is refused while another attempt of the same form is in flight, and
/// the attempt records how the request ended. An attempt dropped before it
/// finished (a cancelled handler) puts the form back to `Idle`.

use serde::Serialize;
use tokio::sync::watch;

/// Lifecycle of one form's request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum RequestState<T> {
    Idle,
    InFlight,
    Succeeded(T),
    Failed(String),
}

impl<T> RequestState<T> {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, RequestState::InFlight)
    }
}

/// Request state of one form
pub struct RequestTracker<T> {
    state: watch::Sender<RequestState<T>>,
}

impl<T: Clone> RequestTracker<T> {
    pub fn new() -> Self {
        let (state, _) = watch::channel(RequestState::Idle);
        Self { state }
    }

    pub fn state(&self) -> RequestState<T> {
        self.state.borrow().clone()
    }

    /// Watches state changes, e.g. to disable a submit button
    pub fn subscribe(&self) -> watch::Receiver<RequestState<T>> {
        self.state.subscribe()
    }

    /// Starts an attempt, or returns `None` if one is already in flight
    pub fn begin(&self) -> Option<Attempt<'_, T>> {
        let started = self.state.send_if_modified(|state| {
            if state.is_in_flight() {
                return false;
            }
            *state = RequestState::InFlight;
            true
        });

        started.then_some(Attempt {
            tracker: self,
            finished: false,
        })
    }
}

impl<T: Clone> Default for RequestTracker<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// An in-flight request of a form
pub struct Attempt<'a, T> {
    tracker: &'a RequestTracker<T>,
    finished: bool,
}

impl<T> Attempt<'_, T> {
    pub fn succeed(mut self, value: T) {
        self.finished = true;
        self.tracker.state.send_replace(RequestState::Succeeded(value));
    }

    pub fn fail(mut self, message: impl Into<String>) {
        self.finished = true;
        self.tracker.state.send_replace(RequestState::Failed(message.into()));
    }
}

impl<T> Drop for Attempt<'_, T> {
    fn drop(&mut self) {
        if !self.finished {
            self.tracker.state.send_replace(RequestState::Idle);
        }
    }
}
