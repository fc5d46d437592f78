//! Single-flight network initialization
//!
//! One `InitCoordinator` exists per network and is shared by every registry
//! that needs the SDK. The first `ensure_initialized` issues the SDK init
//! call; everybody else subscribes and hears the outcome exactly once.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::coordination::consent::{ConsentDisposition, ConsentFlag, PendingConsentFlags};
use crate::domain::{Credentials, InitOutcome, InitState};
use crate::error::Result;
use crate::network::NetworkSdk;

/// A party waiting for the init outcome
pub trait InitWaiter: Send + Sync {
    fn on_init_outcome(&self, outcome: &InitOutcome);
}

struct CoordinatorState {
    init: InitState,
    waiters: Vec<Arc<dyn InitWaiter>>,
    consent: PendingConsentFlags,
}

/// Owns the init state machine, the waiter set and staged consent
pub struct InitCoordinator {
    sdk: Arc<dyn NetworkSdk>,
    state: Mutex<CoordinatorState>,
    state_tx: watch::Sender<InitState>,
    init_calls: AtomicU64,
    weak_self: Weak<InitCoordinator>,
}

impl InitCoordinator {
    pub fn new(sdk: Arc<dyn NetworkSdk>) -> Arc<Self> {
        let (state_tx, _) = watch::channel(InitState::NotStarted);

        Arc::new_cyclic(|weak_self| Self {
            sdk,
            state: Mutex::new(CoordinatorState {
                init: InitState::NotStarted,
                waiters: Vec::new(),
                consent: PendingConsentFlags::new(),
            }),
            state_tx,
            init_calls: AtomicU64::new(0),
            weak_self: weak_self.clone(),
        })
    }

    pub fn network(&self) -> &'static str {
        self.sdk.name()
    }

    pub fn state(&self) -> InitState {
        self.lock_state().init.clone()
    }

    pub fn is_initialized(&self) -> bool {
        self.lock_state().init.is_success()
    }

    /// Number of SDK init calls issued (never more than one)
    pub fn init_call_count(&self) -> u64 {
        self.init_calls.load(Ordering::SeqCst)
    }

    /// Number of waiters still queued for the outcome
    pub fn pending_waiters(&self) -> usize {
        self.lock_state().waiters.len()
    }

    /// Consent still waiting to reach the SDK
    pub fn pending_consent(&self) -> PendingConsentFlags {
        self.lock_state().consent
    }

    /// Start SDK initialization unless somebody already did.
    ///
    /// Staged consent is pushed to the SDK right before the init call.
    pub fn ensure_initialized(&self, credentials: &Credentials) -> Result<()> {
        credentials.validate()?;

        let staged = {
            let mut state = self.lock_state();
            if state.init != InitState::NotStarted {
                debug!(
                    "{}: init already {}, not calling SDK again",
                    self.network(),
                    state.init
                );
                return Ok(());
            }
            state.init = InitState::InProgress;
            self.state_tx.send_replace(InitState::InProgress);
            state.consent.take()
        };

        for (flag, value) in staged {
            self.push_consent(flag, value);
        }

        self.init_calls.fetch_add(1, Ordering::SeqCst);
        info!(
            "{}: initializing SDK {} for app {}",
            self.network(),
            self.sdk.sdk_version(),
            credentials.app_id
        );
        self.sdk.initialize(credentials, InitCompletion::new(self.weak_self.clone()));

        Ok(())
    }

    /// Queue a waiter, or answer it right away when init already resolved
    pub fn subscribe(&self, waiter: Arc<dyn InitWaiter>) {
        let outcome = {
            let mut state = self.lock_state();
            match state.init.outcome() {
                Some(outcome) => outcome,
                None => {
                    state.waiters.push(waiter);
                    return;
                }
            }
        };

        waiter.on_init_outcome(&outcome);
    }

    /// Set a privacy flag, staging it until init succeeds
    pub fn set_consent(&self, flag: ConsentFlag, value: bool) -> ConsentDisposition {
        let mut state = self.lock_state();

        // Applied under the lock so a later value can't overtake a staged one
        if state.init.is_success() {
            self.push_consent(flag, value);
            return ConsentDisposition::Applied;
        }

        state.consent.stage(flag, value);
        match &state.init {
            InitState::Failed(reason) => warn!(
                "{}: init failed ({}), {}={} stays staged",
                self.network(),
                reason,
                flag,
                value
            ),
            _ => debug!("{}: staged {}={}", self.network(), flag, value),
        }
        ConsentDisposition::Staged
    }

    /// Watch init state changes
    pub fn state_receiver(&self) -> watch::Receiver<InitState> {
        self.state_tx.subscribe()
    }

    /// Resolve once init succeeds or fails
    pub async fn wait_for_outcome(&self) -> InitOutcome {
        let mut rx = self.state_tx.subscribe();
        loop {
            let current = rx.borrow_and_update().outcome();
            if let Some(outcome) = current {
                return outcome;
            }
            if rx.changed().await.is_err() {
                return InitOutcome::Failed("coordinator dropped".to_string());
            }
        }
    }

    fn complete(&self, outcome: InitOutcome) {
        let waiters = {
            let mut state = self.lock_state();
            let next = InitState::from(outcome.clone());
            if !state.init.can_transition_to(&next) {
                warn!(
                    "{}: ignoring init callback {} while {}",
                    self.network(),
                    next,
                    state.init
                );
                return;
            }

            state.init = next;
            self.state_tx.send_replace(state.init.clone());

            // Values staged while init was in flight
            if outcome.is_success() {
                for (flag, value) in state.consent.take() {
                    self.push_consent(flag, value);
                }
            }

            std::mem::take(&mut state.waiters)
        };

        match &outcome {
            InitOutcome::Success => info!(
                "{}: SDK initialized, notifying {} waiters",
                self.network(),
                waiters.len()
            ),
            InitOutcome::Failed(reason) => warn!(
                "{}: SDK init failed: {}, notifying {} waiters",
                self.network(),
                reason,
                waiters.len()
            ),
        }

        for waiter in waiters {
            waiter.on_init_outcome(&outcome);
        }
    }

    fn push_consent(&self, flag: ConsentFlag, value: bool) {
        match self.sdk.apply_consent(flag, value) {
            Ok(()) => debug!("{}: applied {}={}", self.network(), flag, value),
            Err(e) => warn!(
                "{}: SDK rejected {}={}: {}",
                self.network(),
                flag,
                value,
                e
            ),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, CoordinatorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for InitCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitCoordinator")
            .field("network", &self.network())
            .field("state", &self.state())
            .field("init_calls", &self.init_call_count())
            .finish()
    }
}

/// One-shot handle the SDK uses to report the init outcome.
///
/// Dropping it without reporting counts as a failure so waiters never hang.
#[derive(Debug)]
pub struct InitCompletion {
    coordinator: Weak<InitCoordinator>,
    resolved: bool,
}

impl InitCompletion {
    fn new(coordinator: Weak<InitCoordinator>) -> Self {
        Self {
            coordinator,
            resolved: false,
        }
    }

    pub fn succeed(mut self) {
        self.resolve(InitOutcome::Success);
    }

    pub fn fail(mut self, reason: impl Into<String>) {
        self.resolve(InitOutcome::Failed(reason.into()));
    }

    pub fn finish(mut self, result: std::result::Result<(), String>) {
        let outcome = match result {
            Ok(()) => InitOutcome::Success,
            Err(reason) => InitOutcome::Failed(reason),
        };
        self.resolve(outcome);
    }

    fn resolve(&mut self, outcome: InitOutcome) {
        self.resolved = true;
        if let Some(coordinator) = self.coordinator.upgrade() {
            coordinator.complete(outcome);
        }
    }
}

impl Drop for InitCompletion {
    fn drop(&mut self) {
        if !self.resolved {
            self.resolve(InitOutcome::Failed(
                "initialization callback dropped".to_string(),
            ));
        }
    }
}
