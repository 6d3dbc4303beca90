//! Focus statistics
//!
//! Stats are a running fold over completions, updated once per finished work
//! session. They are never rebuilt from the session log, so anything that
//! rewrites session history has to fix the stats too.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Aggregated focus statistics for one user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusStats {
    /// Completed work sessions, all time
    pub total_sessions: u32,
    /// Completed work sessions on `last_completed_on`
    pub completed_today: u32,
    /// Total focus time in minutes
    pub total_focus_minutes: u32,
    /// Consecutive days with at least one completion, ending at `last_completed_on`
    pub current_streak_days: u32,
    /// Day of the most recent completion
    #[serde(default)]
    pub last_completed_on: Option<NaiveDate>,
}

impl FocusStats {
    /// Fold one completed work session of `minutes` finished on `day`
    pub fn record_completion(&mut self, minutes: u32, day: NaiveDate) {
        self.total_sessions += 1;
        self.total_focus_minutes += minutes;

        match self.last_completed_on {
            Some(last) if last == day => {
                self.completed_today += 1;
            }
            Some(last) if last.succ_opt() == Some(day) => {
                self.completed_today = 1;
                self.current_streak_days += 1;
            }
            _ => {
                self.completed_today = 1;
                self.current_streak_days = 1;
            }
        }
        self.last_completed_on = Some(day);
    }

    /// Stats as they read on `today`: the daily counter and streak lapse
    /// when no session was completed recently enough
    pub fn as_of(&self, today: NaiveDate) -> Self {
        let mut view = self.clone();
        match self.last_completed_on {
            Some(last) if last == today => {}
            Some(last) if last.succ_opt() == Some(today) => {
                view.completed_today = 0;
            }
            _ => {
                view.completed_today = 0;
                view.current_streak_days = 0;
            }
        }
        view
    }

    /// Get total hours and minutes as a tuple
    pub fn total_time(&self) -> (u32, u32) {
        (self.total_focus_minutes / 60, self.total_focus_minutes % 60)
    }
}
