//! Per-user record storage
//!
//! `Store` is the seam every component goes through to reach users, tasks,
//! goals, focus sessions and stats. `MemoryStore` keeps everything for the
//! lifetime of the process:
//! - Each entity kind sits behind its own `RwLock`
//! - Lists are kept per user in insertion order
//! - Reads never fail; a poisoned lock is still read through
//! - Writes report a poisoned lock as `StoreError::Poisoned`

use chrono::Utc;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

use crate::error::StoreError;
use crate::models::{Goal, Task, User};
use crate::session::FocusSession;
use crate::stats::FocusStats;

/// Storage operations, keyed by user id and secondary ids
pub trait Store: Send + Sync {
    /// Insert or replace a user. Keeps the original registration date of an
    /// existing record and always refreshes last activity.
    fn save_user(&self, user: User) -> Result<User, StoreError>;
    fn get_user(&self, user_id: &str) -> Option<User>;
    /// Bump last activity; unknown users are ignored
    fn update_activity(&self, user_id: &str) -> Result<(), StoreError>;

    fn save_task(&self, task: Task) -> Result<(), StoreError>;
    fn get_tasks(&self, user_id: &str) -> Vec<Task>;
    /// Replace a task in place; false if it no longer exists
    fn update_task(&self, task: &Task) -> Result<bool, StoreError>;
    /// Remove a task; false if it was already gone
    fn delete_task(&self, user_id: &str, task_id: &str) -> Result<bool, StoreError>;

    fn save_goal(&self, goal: Goal) -> Result<(), StoreError>;
    fn get_goals(&self, user_id: &str) -> Vec<Goal>;
    fn update_goal(&self, goal: &Goal) -> Result<bool, StoreError>;
    /// Apply `change` to a goal under the store's write lock. The change
    /// is committed only if it returns true. Returns the goal as stored
    /// afterwards, or None if it no longer exists.
    fn modify_goal(
        &self,
        user_id: &str,
        goal_id: &str,
        change: &mut dyn FnMut(&mut Goal) -> bool,
    ) -> Result<Option<Goal>, StoreError>;
    fn delete_goal(&self, user_id: &str, goal_id: &str) -> Result<bool, StoreError>;

    fn save_session(&self, session: FocusSession) -> Result<(), StoreError>;
    fn get_sessions(&self, user_id: &str) -> Vec<FocusSession>;
    fn get_session(&self, user_id: &str, session_id: &str) -> Option<FocusSession>;
    fn update_session(&self, session: &FocusSession) -> Result<bool, StoreError>;

    /// Stats for a user, zeroed if none were recorded yet
    fn get_stats(&self, user_id: &str) -> FocusStats;
    fn update_stats(&self, user_id: &str, stats: FocusStats) -> Result<(), StoreError>;
}

type PerUser<T> = RwLock<HashMap<String, Vec<T>>>;

/// In-memory store
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<String, User>>,
    tasks: PerUser<Task>,
    goals: PerUser<Goal>,
    sessions: PerUser<FocusSession>,
    stats: RwLock<HashMap<String, FocusStats>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered users
    pub fn user_count(&self) -> usize {
        read(&self.users).len()
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<'a, T>(lock: &'a RwLock<T>, what: &'static str) -> Result<RwLockWriteGuard<'a, T>, StoreError> {
    lock.write().map_err(|_| StoreError::Poisoned(what))
}

fn list<T: Clone>(lock: &PerUser<T>, user_id: &str) -> Vec<T> {
    read(lock).get(user_id).cloned().unwrap_or_default()
}

fn append<T>(lock: &PerUser<T>, what: &'static str, user_id: &str, item: T) -> Result<(), StoreError> {
    write(lock, what)?
        .entry(user_id.to_string())
        .or_default()
        .push(item);
    Ok(())
}

fn replace<T: Clone>(
    lock: &PerUser<T>,
    what: &'static str,
    user_id: &str,
    item: &T,
    same: impl Fn(&T) -> bool,
) -> Result<bool, StoreError> {
    let mut map = write(lock, what)?;
    let slot = map
        .get_mut(user_id)
        .and_then(|items| items.iter_mut().find(|existing| same(existing)));
    match slot {
        Some(existing) => {
            *existing = item.clone();
            Ok(true)
        }
        None => Ok(false),
    }
}

fn remove<T>(
    lock: &PerUser<T>,
    what: &'static str,
    user_id: &str,
    matches: impl Fn(&T) -> bool,
) -> Result<bool, StoreError> {
    let mut map = write(lock, what)?;
    let Some(items) = map.get_mut(user_id) else {
        return Ok(false);
    };
    match items.iter().position(matches) {
        Some(index) => {
            items.remove(index);
            Ok(true)
        }
        None => Ok(false),
    }
}

impl Store for MemoryStore {
    fn save_user(&self, mut user: User) -> Result<User, StoreError> {
        let mut users = write(&self.users, "users")?;
        if let Some(existing) = users.get(&user.user_id) {
            user.registered_at = existing.registered_at;
        }
        user.last_activity = Utc::now();
        debug!(user_id = %user.user_id, "saved user");
        users.insert(user.user_id.clone(), user.clone());
        Ok(user)
    }

    fn get_user(&self, user_id: &str) -> Option<User> {
        read(&self.users).get(user_id).cloned()
    }

    fn update_activity(&self, user_id: &str) -> Result<(), StoreError> {
        if let Some(user) = write(&self.users, "users")?.get_mut(user_id) {
            user.last_activity = Utc::now();
        }
        Ok(())
    }

    fn save_task(&self, task: Task) -> Result<(), StoreError> {
        debug!(user_id = %task.user_id, task_id = %task.id, "saved task");
        let user_id = task.user_id.clone();
        append(&self.tasks, "tasks", &user_id, task)
    }

    fn get_tasks(&self, user_id: &str) -> Vec<Task> {
        list(&self.tasks, user_id)
    }

    fn update_task(&self, task: &Task) -> Result<bool, StoreError> {
        replace(&self.tasks, "tasks", &task.user_id, task, |t| t.id == task.id)
    }

    fn delete_task(&self, user_id: &str, task_id: &str) -> Result<bool, StoreError> {
        remove(&self.tasks, "tasks", user_id, |t| t.id == task_id)
    }

    fn save_goal(&self, goal: Goal) -> Result<(), StoreError> {
        debug!(user_id = %goal.user_id, goal_id = %goal.id, "saved goal");
        let user_id = goal.user_id.clone();
        append(&self.goals, "goals", &user_id, goal)
    }

    fn get_goals(&self, user_id: &str) -> Vec<Goal> {
        list(&self.goals, user_id)
    }

    fn update_goal(&self, goal: &Goal) -> Result<bool, StoreError> {
        replace(&self.goals, "goals", &goal.user_id, goal, |g| g.id == goal.id)
    }

    fn modify_goal(
        &self,
        user_id: &str,
        goal_id: &str,
        change: &mut dyn FnMut(&mut Goal) -> bool,
    ) -> Result<Option<Goal>, StoreError> {
        let mut map = write(&self.goals, "goals")?;
        let Some(goal) = map
            .get_mut(user_id)
            .and_then(|goals| goals.iter_mut().find(|g| g.id == goal_id))
        else {
            return Ok(None);
        };

        let mut draft = goal.clone();
        if change(&mut draft) {
            *goal = draft;
            debug!(user_id, goal_id, "modified goal");
        }
        Ok(Some(goal.clone()))
    }

    fn delete_goal(&self, user_id: &str, goal_id: &str) -> Result<bool, StoreError> {
        remove(&self.goals, "goals", user_id, |g| g.id == goal_id)
    }

    fn save_session(&self, session: FocusSession) -> Result<(), StoreError> {
        debug!(user_id = %session.user_id, session_id = %session.id, "saved focus session");
        let user_id = session.user_id.clone();
        append(&self.sessions, "sessions", &user_id, session)
    }

    fn get_sessions(&self, user_id: &str) -> Vec<FocusSession> {
        list(&self.sessions, user_id)
    }

    fn get_session(&self, user_id: &str, session_id: &str) -> Option<FocusSession> {
        read(&self.sessions)
            .get(user_id)
            .and_then(|sessions| sessions.iter().find(|s| s.id == session_id))
            .cloned()
    }

    fn update_session(&self, session: &FocusSession) -> Result<bool, StoreError> {
        replace(&self.sessions, "sessions", &session.user_id, session, |s| s.id == session.id)
    }

    fn get_stats(&self, user_id: &str) -> FocusStats {
        read(&self.stats).get(user_id).cloned().unwrap_or_default()
    }

    fn update_stats(&self, user_id: &str, stats: FocusStats) -> Result<(), StoreError> {
        write(&self.stats, "stats")?.insert(user_id.to_string(), stats);
        Ok(())
    }
}
