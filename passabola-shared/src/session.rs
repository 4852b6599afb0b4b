/// Shared session context
///
/// One [`SessionContext`] per client reconciles two sources of truth about
/// the signed-in user: a snapshot fetched once from the identity service, and
/// the service's change feed. Views observe the result through a
/// [`SessionSubscription`], which is released when dropped.
///
/// # Convergence
///
/// The feed is subscribed before the snapshot is requested, so no change can
/// fall between the two. Every applied change bumps a generation counter; a
/// snapshot that resolves after a change was applied is discarded, because
/// the change is newer. A snapshot that fails resolves to `SignedOut`.
///
/// # Example
///
/// ```no_run
/// use passabola_shared::backend::memory::MemoryBackend;
/// use passabola_shared::session::SessionContext;
/// use std::sync::Arc;
///
/// # async fn example() {
/// let backend = MemoryBackend::new("dev-secret-key-at-least-32-bytes-long");
/// let context = SessionContext::start(Arc::new(backend.identity()));
///
/// let mut subscription = context.subscribe();
/// let state = subscription.settled().await;
/// println!("signed in: {}", state.session().is_some());
/// # }
/// ```

use crate::backend::{BackendResult, IdentityService, Session, SessionChange};
use std::sync::{
    atomic::{AtomicU64, AtomicUsize, Ordering},
    Arc, OnceLock, Weak,
};
use tokio::{
    sync::{broadcast, watch},
    task::JoinHandle,
};
use tracing::{debug, warn};

/// What the site currently knows about the session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// Neither the snapshot nor a change has arrived yet
    Loading,
    SignedOut,
    SignedIn(Session),
}

impl SessionState {
    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::SignedIn(session) => Some(session),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Loading)
    }
}

impl From<Option<Session>> for SessionState {
    fn from(session: Option<Session>) -> Self {
        match session {
            Some(session) => SessionState::SignedIn(session),
            None => SessionState::SignedOut,
        }
    }
}

struct Shared {
    state: watch::Sender<SessionState>,
    generation: AtomicU64,
    subscriptions: AtomicUsize,
    forwarder: OnceLock<JoinHandle<()>>,
}

impl Shared {
    fn apply_change(&self, change: SessionChange) {
        debug!(event = ?change.event, "Session change");

        self.state.send_modify(|state| {
            self.generation.fetch_add(1, Ordering::SeqCst);
            *state = SessionState::from(change.session);
        });
    }

    /// Applies a snapshot unless a change arrived after `generation` was read
    fn apply_snapshot(&self, generation: u64, snapshot: BackendResult<Option<Session>>) {
        let next = match snapshot {
            Ok(session) => SessionState::from(session),
            Err(e) => {
                warn!(error = %e, "Could not fetch session snapshot");
                SessionState::SignedOut
            }
        };

        let applied = self.state.send_if_modified(|state| {
            if self.generation.load(Ordering::SeqCst) != generation || *state == next {
                return false;
            }
            *state = next;
            true
        });

        if !applied {
            debug!(generation, "Session snapshot superseded or unchanged");
        }
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        if let Some(handle) = self.forwarder.get() {
            handle.abort();
        }
    }
}

/// Session context of one client
///
/// Cheap to clone. The forwarding task stops when the last context handle
/// and the last subscription are gone.
#[derive(Clone)]
pub struct SessionContext {
    shared: Arc<Shared>,
    identity: Arc<dyn IdentityService>,
}

impl SessionContext {
    /// Subscribes to the identity service and requests the snapshot
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(identity: Arc<dyn IdentityService>) -> Self {
        let feed = identity.session_changes();
        let (state, _) = watch::channel(SessionState::Loading);

        let shared = Arc::new(Shared {
            state,
            generation: AtomicU64::new(0),
            subscriptions: AtomicUsize::new(0),
            forwarder: OnceLock::new(),
        });

        let handle = tokio::spawn(forward(
            feed,
            Arc::downgrade(&shared),
            Arc::clone(&identity),
        ));
        let _ = shared.forwarder.set(handle);

        let generation = shared.generation.load(Ordering::SeqCst);
        let weak = Arc::downgrade(&shared);
        let snapshot_identity = Arc::clone(&identity);
        tokio::spawn(async move {
            let snapshot = snapshot_identity.current_session().await;
            if let Some(shared) = weak.upgrade() {
                shared.apply_snapshot(generation, snapshot);
            }
        });

        Self { shared, identity }
    }

    /// Identity service this context observes
    pub fn identity(&self) -> &Arc<dyn IdentityService> {
        &self.identity
    }

    /// Current state, which may still be `Loading`
    pub fn current(&self) -> SessionState {
        self.shared.state.borrow().clone()
    }

    /// Waits until the state is no longer `Loading`
    pub async fn settled(&self) -> SessionState {
        let mut receiver = self.shared.state.subscribe();
        let settled = receiver
            .wait_for(|s| !s.is_loading())
            .await
            .map(|s| s.clone());
        settled.unwrap_or_else(|_| receiver.borrow().clone())
    }

    /// Fetches a fresh snapshot
    pub async fn refresh(&self) {
        let generation = self.shared.generation.load(Ordering::SeqCst);
        let snapshot = self.identity.current_session().await;
        self.shared.apply_snapshot(generation, snapshot);
    }

    /// Subscribes a view to state changes for as long as the guard lives
    pub fn subscribe(&self) -> SessionSubscription {
        self.shared.subscriptions.fetch_add(1, Ordering::SeqCst);

        SessionSubscription {
            receiver: self.shared.state.subscribe(),
            shared: Arc::clone(&self.shared),
        }
    }

    /// Number of live subscriptions
    pub fn active_subscriptions(&self) -> usize {
        self.shared.subscriptions.load(Ordering::SeqCst)
    }
}

async fn forward(
    mut feed: broadcast::Receiver<SessionChange>,
    shared: Weak<Shared>,
    identity: Arc<dyn IdentityService>,
) {
    loop {
        match feed.recv().await {
            Ok(change) => match shared.upgrade() {
                Some(shared) => shared.apply_change(change),
                None => break,
            },
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "Session feed lagged, refetching snapshot");

                let Some(generation) = shared
                    .upgrade()
                    .map(|s| s.generation.load(Ordering::SeqCst))
                else {
                    break;
                };
                let snapshot = identity.current_session().await;
                match shared.upgrade() {
                    Some(shared) => shared.apply_snapshot(generation, snapshot),
                    None => break,
                }
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }

    debug!("Session feed closed");
}

/// A view's subscription to the session state
///
/// Dropping the guard releases the subscription.
pub struct SessionSubscription {
    receiver: watch::Receiver<SessionState>,
    shared: Arc<Shared>,
}

impl SessionSubscription {
    pub fn current(&self) -> SessionState {
        self.receiver.borrow().clone()
    }

    /// Waits for the next state change and returns the new state
    pub async fn changed(&mut self) -> SessionState {
        // The sender lives in `shared`, which this guard keeps alive
        let _ = self.receiver.changed().await;
        self.receiver.borrow_and_update().clone()
    }

    /// Waits until the state is no longer `Loading`
    pub async fn settled(&mut self) -> SessionState {
        let settled = self
            .receiver
            .wait_for(|s| !s.is_loading())
            .await
            .map(|s| s.clone());
        settled.unwrap_or_else(|_| self.receiver.borrow().clone())
    }
}

impl Drop for SessionSubscription {
    fn drop(&mut self) {
        self.shared.subscriptions.fetch_sub(1, Ordering::SeqCst);
    }
}
