//! Focus session records
//!
//! A session is created when a work period starts and receives exactly one
//! terminal mutation: completed (timer ran out) or interrupted (stopped or
//! superseded). After that it never changes.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::new_id;

/// Kind of focus session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    Work,
    ShortBreak,
}

impl SessionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKind::Work => "work",
            SessionKind::ShortBreak => "short_break",
        }
    }
}

/// One timed focus interval
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusSession {
    pub id: String,
    pub user_id: String,
    pub start_time: DateTime<Utc>,
    /// Unset until the session is completed or interrupted
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    pub duration_minutes: u32,
    pub kind: SessionKind,
    pub completed: bool,
    pub interrupted: bool,
}

impl FocusSession {
    /// Start a new work session now
    pub fn work(user_id: &str, duration_minutes: u32) -> Self {
        Self {
            id: new_id(),
            user_id: user_id.to_string(),
            start_time: Utc::now(),
            end_time: None,
            duration_minutes,
            kind: SessionKind::Work,
            completed: false,
            interrupted: false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.completed || self.interrupted
    }

    /// When the timer for this session is due
    pub fn planned_end(&self) -> DateTime<Utc> {
        self.start_time + Duration::minutes(i64::from(self.duration_minutes))
    }

    /// Copy of this session marked completed at `at`, or None if already terminal
    pub fn completed_at(&self, at: DateTime<Utc>) -> Option<Self> {
        if self.is_terminal() {
            return None;
        }
        Some(Self {
            end_time: Some(at),
            completed: true,
            ..self.clone()
        })
    }

    /// Copy of this session marked interrupted at `at`, or None if already terminal
    pub fn interrupted_at(&self, at: DateTime<Utc>) -> Option<Self> {
        if self.is_terminal() {
            return None;
        }
        Some(Self {
            end_time: Some(at),
            interrupted: true,
            ..self.clone()
        })
    }

    /// Whole minutes actually spent, capped at the planned duration
    pub fn elapsed_minutes(&self) -> u32 {
        let end = self.end_time.unwrap_or_else(Utc::now);
        let minutes = (end - self.start_time).num_minutes().max(0) as u32;
        minutes.min(self.duration_minutes)
    }
}
