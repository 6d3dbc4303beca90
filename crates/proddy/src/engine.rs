//! Focus-session state machine
//!
//! Each user moves between `Idle`, `Working` and `OnBreak`:
//! - start_work: any state -> Working (a running work session is interrupted)
//! - start_break: any state -> OnBreak (a running work session is interrupted)
//! - stop: any state -> Idle
//! - work timer fires: Working -> Idle, session completed, stats folded
//! - break timer fires: OnBreak -> Idle
//!
//! Every transition for one user runs under that user's slot lock, timer
//! firings included, so a stop and an expiry can never interleave. Users
//! never share a lock.

use chrono::Utc;
use proddy_core::Config;
use std::collections::HashMap;
use std::sync::{Arc, Mutex as SyncMutex, PoisonError};
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::error::{Result, StoreError};
use crate::session::FocusSession;
use crate::stats::FocusStats;
use crate::store::Store;
use crate::timer::{TimerRegistry, TimerToken};

/// Where a user is in the focus cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FocusState {
    #[default]
    Idle,
    Working {
        session_id: String,
    },
    OnBreak,
}

impl FocusState {
    pub fn as_str(&self) -> &'static str {
        match self {
            FocusState::Idle => "idle",
            FocusState::Working { .. } => "working",
            FocusState::OnBreak => "on_break",
        }
    }
}

/// Sent when a timer runs out, so the user can be told
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    WorkCompleted {
        user_id: String,
        session: FocusSession,
        stats: FocusStats,
    },
    BreakCompleted {
        user_id: String,
    },
}

impl Notification {
    pub fn user_id(&self) -> &str {
        match self {
            Notification::WorkCompleted { user_id, .. } => user_id,
            Notification::BreakCompleted { user_id } => user_id,
        }
    }
}

/// Result of `start_work`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkStarted {
    pub session: FocusSession,
    /// Work session that was still running and got interrupted
    pub superseded: Option<FocusSession>,
}

/// Result of `start_break`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakStarted {
    pub minutes: u32,
    pub superseded: Option<FocusSession>,
}

/// Result of `stop`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    Interrupted(FocusSession),
    BreakEnded,
    NothingActive,
}

/// Snapshot for status replies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusStatus {
    pub state: FocusState,
    pub remaining: Option<Duration>,
    pub stats: FocusStats,
}

#[derive(Debug, Clone)]
enum TimerEvent {
    WorkExpired { session_id: String },
    BreakExpired,
}

#[derive(Default)]
struct Slot {
    state: FocusState,
    due: Option<Instant>,
}

/// A work session before and after it was interrupted
struct Superseded {
    before: FocusSession,
    after: FocusSession,
}

struct Inner {
    store: Arc<dyn Store>,
    timers: TimerRegistry,
    slots: SyncMutex<HashMap<String, Arc<Mutex<Slot>>>>,
    config: Config,
    work_duration: Duration,
    break_duration: Duration,
    notifier: mpsc::UnboundedSender<Notification>,
}

/// Drives focus sessions for every user
#[derive(Clone)]
pub struct SessionEngine {
    inner: Arc<Inner>,
}

impl SessionEngine {
    /// Create an engine and the receiving end of its notifications
    pub fn new(store: Arc<dyn Store>, config: Config) -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (work, brk) = (config.work_duration(), config.break_duration());
        Self::with_durations(store, config, work, brk)
    }

    /// Timers run for the given durations instead of the configured minutes
    fn with_durations(
        store: Arc<dyn Store>,
        config: Config,
        work_duration: Duration,
        break_duration: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (notifier, notifications) = mpsc::unbounded_channel();
        let engine = Self {
            inner: Arc::new(Inner {
                store,
                timers: TimerRegistry::new(),
                slots: SyncMutex::new(HashMap::new()),
                config,
                work_duration,
                break_duration,
                notifier,
            }),
        };
        (engine, notifications)
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Begin a work period, replacing whatever the user was doing
    pub async fn start_work(&self, user_id: &str) -> Result<WorkStarted> {
        let slot = self.inner.slot(user_id);
        let mut slot = slot.lock().await;

        let session = FocusSession::work(user_id, self.inner.config.work_minutes);
        let superseded = self.inner.interrupt_running(user_id, &slot.state)?;
        if let Err(err) = self.inner.store.save_session(session.clone()) {
            if let Some(superseded) = &superseded {
                self.inner.restore_session(&superseded.before);
            }
            return Err(err.into());
        }

        let delay = self.inner.work_duration;
        self.arm(
            user_id,
            delay,
            TimerEvent::WorkExpired {
                session_id: session.id.clone(),
            },
        );
        slot.state = FocusState::Working {
            session_id: session.id.clone(),
        };
        slot.due = Some(Instant::now() + delay);
        info!(user_id, session_id = %session.id, minutes = session.duration_minutes, "work session started");

        Ok(WorkStarted {
            session,
            superseded: superseded.map(|s| s.after),
        })
    }

    /// Begin a break, replacing whatever the user was doing
    pub async fn start_break(&self, user_id: &str) -> Result<BreakStarted> {
        let slot = self.inner.slot(user_id);
        let mut slot = slot.lock().await;

        let superseded = self.inner.interrupt_running(user_id, &slot.state)?;

        let delay = self.inner.break_duration;
        self.arm(user_id, delay, TimerEvent::BreakExpired);
        slot.state = FocusState::OnBreak;
        slot.due = Some(Instant::now() + delay);
        info!(user_id, minutes = self.inner.config.break_minutes, "break started");

        Ok(BreakStarted {
            minutes: self.inner.config.break_minutes,
            superseded: superseded.map(|s| s.after),
        })
    }

    /// Stop the current work session or break.
    ///
    /// The timer is cancelled before this returns; no completion can be
    /// recorded for the stopped session afterwards.
    pub async fn stop(&self, user_id: &str) -> Result<StopOutcome> {
        let slot = self.inner.slot(user_id);
        let mut slot = slot.lock().await;

        let outcome = match &slot.state {
            FocusState::Idle => StopOutcome::NothingActive,
            FocusState::OnBreak => StopOutcome::BreakEnded,
            FocusState::Working { .. } => match self.inner.interrupt_running(user_id, &slot.state)? {
                Some(superseded) => StopOutcome::Interrupted(superseded.after),
                None => StopOutcome::NothingActive,
            },
        };

        self.inner.timers.cancel(user_id);
        slot.state = FocusState::Idle;
        slot.due = None;
        info!(user_id, outcome = outcome_name(&outcome), "focus stopped");

        Ok(outcome)
    }

    /// Current state, time left on the running timer and stats
    pub async fn status(&self, user_id: &str) -> FocusStatus {
        let slot = self.inner.slot(user_id);
        let slot = slot.lock().await;

        FocusStatus {
            state: slot.state.clone(),
            remaining: slot
                .due
                .map(|due| due.saturating_duration_since(Instant::now())),
            stats: self.stats(user_id),
        }
    }

    /// Stats as of today
    pub fn stats(&self, user_id: &str) -> FocusStats {
        self.inner
            .store
            .get_stats(user_id)
            .as_of(Utc::now().date_naive())
    }

    pub fn has_pending_timer(&self, user_id: &str) -> bool {
        self.inner.timers.is_pending(user_id)
    }

    /// Number of users with a pending timer
    pub fn pending_timers(&self) -> usize {
        self.inner.timers.pending_count()
    }

    /// Cancel every pending timer
    pub fn shutdown(&self) {
        info!(pending = self.pending_timers(), "cancelling pending focus timers");
        self.inner.timers.cancel_all();
    }

    fn arm(&self, user_id: &str, delay: Duration, event: TimerEvent) {
        let engine = Arc::downgrade(&self.inner);
        let owner = user_id.to_string();
        self.inner.timers.schedule(user_id, delay, move |token| async move {
            if let Some(inner) = engine.upgrade() {
                inner.fire(&owner, token, event).await;
            }
        });
    }
}

fn outcome_name(outcome: &StopOutcome) -> &'static str {
    match outcome {
        StopOutcome::Interrupted(_) => "interrupted",
        StopOutcome::BreakEnded => "break_ended",
        StopOutcome::NothingActive => "nothing_active",
    }
}

impl Inner {
    fn slot(&self, user_id: &str) -> Arc<Mutex<Slot>> {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(user_id.to_string())
            .or_default()
            .clone()
    }

    /// Mark the running work session (if any) interrupted
    fn interrupt_running(&self, user_id: &str, state: &FocusState) -> Result<Option<Superseded>, StoreError> {
        let FocusState::Working { session_id } = state else {
            return Ok(None);
        };
        let Some(before) = self.store.get_session(user_id, session_id) else {
            warn!(user_id, session_id = %session_id, "running session missing from store");
            return Ok(None);
        };
        let Some(after) = before.interrupted_at(Utc::now()) else {
            return Ok(None);
        };

        self.store.update_session(&after)?;
        Ok(Some(Superseded { before, after }))
    }

    fn restore_session(&self, session: &FocusSession) {
        if let Err(err) = self.store.update_session(session) {
            error!(session_id = %session.id, error = %err, "failed to roll back focus session");
        }
    }

    /// Record a finished work session and fold it into the stats
    fn complete_work(&self, user_id: &str, session_id: &str) -> Result<Option<(FocusSession, FocusStats)>, StoreError> {
        let Some(before) = self.store.get_session(user_id, session_id) else {
            return Ok(None);
        };
        let now = Utc::now();
        let Some(after) = before.completed_at(now) else {
            return Ok(None);
        };

        let mut stats = self.store.get_stats(user_id);
        stats.record_completion(after.duration_minutes, now.date_naive());

        self.store.update_session(&after)?;
        if let Err(err) = self.store.update_stats(user_id, stats.clone()) {
            self.restore_session(&before);
            return Err(err);
        }
        Ok(Some((after, stats)))
    }

    async fn fire(&self, user_id: &str, token: TimerToken, event: TimerEvent) {
        let slot = self.slot(user_id);
        let mut slot = slot.lock().await;

        // Cancelled or replaced while waiting for the slot
        if !self.timers.release(user_id, token) {
            debug!(user_id, "ignoring superseded timer");
            return;
        }
        slot.due = None;

        let expected = match (&event, &slot.state) {
            (TimerEvent::WorkExpired { session_id }, FocusState::Working { session_id: current }) => {
                session_id == current
            }
            (TimerEvent::BreakExpired, FocusState::OnBreak) => true,
            _ => false,
        };
        if !expected {
            warn!(user_id, state = slot.state.as_str(), ?event, "timer does not match focus state");
            return;
        }

        match event {
            TimerEvent::WorkExpired { session_id } => match self.complete_work(user_id, &session_id) {
                Ok(Some((session, stats))) => {
                    slot.state = FocusState::Idle;
                    info!(user_id, session_id = %session_id, total_sessions = stats.total_sessions, "work session completed");
                    self.notify(Notification::WorkCompleted {
                        user_id: user_id.to_string(),
                        session,
                        stats,
                    });
                }
                Ok(None) => {
                    slot.state = FocusState::Idle;
                    warn!(user_id, session_id = %session_id, "expired session was already finished");
                }
                Err(err) => {
                    error!(user_id, session_id = %session_id, error = %err, "failed to record completed session");
                }
            },
            TimerEvent::BreakExpired => {
                slot.state = FocusState::Idle;
                info!(user_id, "break finished");
                self.notify(Notification::BreakCompleted {
                    user_id: user_id.to_string(),
                });
            }
        }
    }

    fn notify(&self, notification: Notification) {
        if !self.config.notifications_enabled {
            return;
        }
        if self.notifier.send(notification).is_err() {
            debug!("notification receiver dropped");
        }
    }
}
