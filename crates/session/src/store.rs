use std::sync::Mutex;

use core_types::{BacktestConfig, BacktestResults, BatchRun, ConfigPatch};
use tokio::sync::broadcast;

use crate::persistence::FileStore;

/// Fixed key the durable session record is stored under.
pub const SESSION_KEY: &str = "session";

/// Lifecycle stage of the single backtest session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    Success,
    Failure,
}

/// The session aggregate. Owned exclusively by [`SessionStore`]; everything
/// else sees snapshots.
///
/// Invariants: `Running` implies `results == None`; `Success` implies
/// `results != None`.
#[derive(Debug, Clone)]
pub struct Session {
    pub config: BacktestConfig,
    pub phase: Phase,
    pub results: Option<BacktestResults>,
    pub batch: Option<BatchRun>,
}

/// One atomic state transition. Exactly one is applied per
/// [`SessionStore::dispatch`] call.
#[derive(Debug, Clone)]
pub enum Transition {
    /// Patch the user-editable config. Only legal outside `Running`; an
    /// invalid patch is rejected silently with the state unchanged.
    SetConfig(ConfigPatch),
    /// Move into `Running` and clear any previous results. Rejected while
    /// a run is already in flight.
    Start,
    /// Terminal transition for the in-flight run: `Some` lands in
    /// `Success`, `None` in `Failure`. Rejected outside `Running`, which is
    /// what discards a stale response arriving after the session moved on.
    Finish(Option<BacktestResults>),
    /// Drop the completed results and return to `Idle`.
    ClearResults,
    /// Replace the batch record wholesale. Legal in any phase.
    SetBatch(BatchRun),
}

/// Single source of truth for the backtest session.
///
/// Transitions are serialized in call order under an internal lock; each
/// applied transition is broadcast to subscribers as a complete snapshot,
/// so no subscriber ever observes a partial update. The store is an
/// explicit instance handed to its collaborators, never a global.
pub struct SessionStore {
    state: Mutex<Session>,
    notifier: broadcast::Sender<Session>,
    persistence: Option<FileStore>,
}

impl SessionStore {
    /// An in-memory store with no durability, starting from `config`.
    pub fn new(config: BacktestConfig) -> Self {
        Self::build(config, None)
    }

    /// A store mirrored to `files`. The previous result set is loaded once,
    /// here; a missing or corrupt record is identical to no prior session.
    /// Recovered results restore the `Success` phase so the UI can show
    /// them straight away.
    pub fn with_persistence(config: BacktestConfig, files: FileStore) -> Self {
        Self::build(config, Some(files))
    }

    fn build(config: BacktestConfig, persistence: Option<FileStore>) -> Self {
        let results: Option<BacktestResults> = persistence
            .as_ref()
            .and_then(|files| files.load(SESSION_KEY));
        let phase = if results.is_some() {
            tracing::info!("recovered persisted backtest results");
            Phase::Success
        } else {
            Phase::Idle
        };

        let (notifier, _) = broadcast::channel(64);
        Self {
            state: Mutex::new(Session {
                config,
                phase,
                results,
                batch: None,
            }),
            notifier,
            persistence,
        }
    }

    /// Returns the current immutable snapshot.
    pub fn state(&self) -> Session {
        self.lock().clone()
    }

    /// Registers a listener. Every applied transition delivers the new
    /// snapshot; dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<Session> {
        self.notifier.subscribe()
    }

    /// Applies one transition atomically and notifies subscribers.
    ///
    /// Returns `false` when the transition is rejected; a rejected
    /// transition leaves the state untouched and notifies nobody.
    pub fn dispatch(&self, transition: Transition) -> bool {
        let mut state = self.lock();
        let touches_results = matches!(
            transition,
            Transition::Start | Transition::Finish(_) | Transition::ClearResults
        );

        let applied = match transition {
            Transition::SetConfig(patch) => {
                if state.phase == Phase::Running {
                    false
                } else {
                    match state.config.patched(&patch) {
                        Ok(next) => {
                            state.config = next;
                            true
                        }
                        Err(e) => {
                            tracing::debug!(error = %e, "config patch rejected");
                            false
                        }
                    }
                }
            }
            Transition::Start => {
                if state.phase == Phase::Running {
                    tracing::warn!("a backtest is already running; start rejected");
                    false
                } else {
                    state.phase = Phase::Running;
                    state.results = None;
                    true
                }
            }
            Transition::Finish(outcome) => {
                if state.phase != Phase::Running {
                    tracing::warn!("finish received outside a running session; discarded");
                    false
                } else {
                    match outcome {
                        Some(results) => {
                            state.phase = Phase::Success;
                            state.results = Some(results);
                        }
                        None => {
                            state.phase = Phase::Failure;
                            state.results = None;
                        }
                    }
                    true
                }
            }
            Transition::ClearResults => {
                if matches!(state.phase, Phase::Success | Phase::Failure) {
                    state.phase = Phase::Idle;
                    state.results = None;
                    true
                } else {
                    false
                }
            }
            Transition::SetBatch(batch) => {
                state.batch = Some(batch);
                true
            }
        };

        if applied {
            self.mirror(&state, touches_results);
            // Nobody listening is fine; the snapshot is simply dropped.
            let _ = self.notifier.send(state.clone());
        }
        applied
    }

    /// Write-through policy: any state carrying results is mirrored to
    /// storage, and a transition that emptied the results removes the
    /// record. The transient `Running` phase therefore never persists, so
    /// a crash mid-run recovers as "no results".
    fn mirror(&self, state: &Session, results_changed: bool) {
        let Some(files) = &self.persistence else {
            return;
        };
        match &state.results {
            Some(results) => files.save(SESSION_KEY, results),
            None if results_changed => files.remove(SESSION_KEY),
            None => {}
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Session> {
        self.state.lock().expect("session store lock poisoned")
    }
}
