//! Task and goal lists
//!
//! Users address items by their 1-based position in the list they last
//! saw. Positions are resolved to stable ids against a fresh read at the
//! moment of the command, never against an earlier listing.

use std::sync::Arc;
use tracing::info;

use crate::error::{ProddyError, Result};
use crate::models::{Goal, GoalStep, NewTask, Task};
use crate::store::Store;

/// Task counts for overview replies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskSummary {
    pub total: usize,
    pub completed: usize,
    pub remaining: usize,
}

/// Goal counts for overview replies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GoalSummary {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub fresh: usize,
}

fn resolve<T: Clone>(items: &[T], position: usize, list: &'static str) -> Result<T> {
    position
        .checked_sub(1)
        .and_then(|index| items.get(index))
        .cloned()
        .ok_or(ProddyError::PositionOutOfRange {
            list,
            position,
            len: items.len(),
        })
}

fn required(text: &str, field: &'static str) -> Result<String> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ProddyError::EmptyText { field });
    }
    Ok(text.to_string())
}

/// CRUD over each user's tasks and goals
#[derive(Clone)]
pub struct Planner {
    store: Arc<dyn Store>,
}

impl Planner {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub fn add_task(&self, user_id: &str, text: &str) -> Result<Task> {
        self.add_task_with(user_id, NewTask::new(text))
    }

    pub fn add_task_with(&self, user_id: &str, mut new: NewTask) -> Result<Task> {
        new.text = required(&new.text, "Task description")?;
        let task = Task::new(user_id, new);
        self.store.save_task(task.clone())?;
        info!(user_id, task_id = %task.id, "task added");
        Ok(task)
    }

    pub fn list_tasks(&self, user_id: &str) -> Vec<Task> {
        self.store.get_tasks(user_id)
    }

    pub fn task_summary(&self, user_id: &str) -> TaskSummary {
        let tasks = self.store.get_tasks(user_id);
        let completed = tasks.iter().filter(|t| t.completed).count();
        TaskSummary {
            total: tasks.len(),
            completed,
            remaining: tasks.len() - completed,
        }
    }

    /// Mark the task at `position` done. Order is untouched.
    pub fn complete_task(&self, user_id: &str, position: usize) -> Result<Task> {
        let mut task = resolve(&self.store.get_tasks(user_id), position, "task")?;
        task.completed = true;
        if !self.store.update_task(&task)? {
            return Err(self.task_gone(user_id, position));
        }
        info!(user_id, task_id = %task.id, "task completed");
        Ok(task)
    }

    pub fn delete_task(&self, user_id: &str, position: usize) -> Result<Task> {
        let task = resolve(&self.store.get_tasks(user_id), position, "task")?;
        if !self.store.delete_task(user_id, &task.id)? {
            return Err(self.task_gone(user_id, position));
        }
        info!(user_id, task_id = %task.id, "task deleted");
        Ok(task)
    }

    /// Complete by stable id; None if the task no longer exists
    pub fn complete_task_by_id(&self, user_id: &str, task_id: &str) -> Result<Option<Task>> {
        let Some(mut task) = self.store.get_tasks(user_id).into_iter().find(|t| t.id == task_id) else {
            return Ok(None);
        };
        task.completed = true;
        Ok(self.store.update_task(&task)?.then_some(task))
    }

    /// Delete by stable id; None if the task no longer exists
    pub fn delete_task_by_id(&self, user_id: &str, task_id: &str) -> Result<Option<Task>> {
        let Some(task) = self.store.get_tasks(user_id).into_iter().find(|t| t.id == task_id) else {
            return Ok(None);
        };
        Ok(self.store.delete_task(user_id, task_id)?.then_some(task))
    }

    // Someone else removed the item between our read and our write
    fn task_gone(&self, user_id: &str, position: usize) -> ProddyError {
        ProddyError::PositionOutOfRange {
            list: "task",
            position,
            len: self.store.get_tasks(user_id).len(),
        }
    }

    fn goal_gone(&self, user_id: &str, position: usize) -> ProddyError {
        ProddyError::PositionOutOfRange {
            list: "goal",
            position,
            len: self.store.get_goals(user_id).len(),
        }
    }

    pub fn add_goal(&self, user_id: &str, title: &str) -> Result<Goal> {
        let goal = Goal::new(user_id, required(title, "Goal title")?);
        self.store.save_goal(goal.clone())?;
        info!(user_id, goal_id = %goal.id, "goal added");
        Ok(goal)
    }

    pub fn list_goals(&self, user_id: &str) -> Vec<Goal> {
        self.store.get_goals(user_id)
    }

    pub fn goal_summary(&self, user_id: &str) -> GoalSummary {
        let goals = self.store.get_goals(user_id);
        let completed = goals.iter().filter(|g| g.completed).count();
        let in_progress = goals.iter().filter(|g| g.is_in_progress()).count();
        GoalSummary {
            total: goals.len(),
            completed,
            in_progress,
            fresh: goals.len() - completed - in_progress,
        }
    }

    pub fn delete_goal(&self, user_id: &str, position: usize) -> Result<Goal> {
        let goal = resolve(&self.store.get_goals(user_id), position, "goal")?;
        if !self.store.delete_goal(user_id, &goal.id)? {
            return Err(self.goal_gone(user_id, position));
        }
        info!(user_id, goal_id = %goal.id, "goal deleted");
        Ok(goal)
    }

    /// Set progress, clamped into 0..=100. Reaching 100 does not complete the goal.
    pub fn set_goal_progress(&self, user_id: &str, position: usize, progress: i64) -> Result<Goal> {
        self.modify_goal(user_id, position, |goal| {
            goal.set_progress(progress);
            Ok(())
        })
    }

    pub fn complete_goal(&self, user_id: &str, position: usize) -> Result<Goal> {
        self.modify_goal(user_id, position, |goal| {
            goal.progress = 100;
            goal.completed = true;
            Ok(())
        })
    }

    pub fn add_goal_step(&self, user_id: &str, position: usize, text: &str) -> Result<Goal> {
        let step = GoalStep::new(required(text, "Step description")?);
        self.modify_goal(user_id, position, move |goal| {
            goal.steps.push(step);
            goal.recompute_progress();
            Ok(())
        })
    }

    /// The step position is resolved against the goal as stored at the
    /// moment of the write
    pub fn complete_goal_step(&self, user_id: &str, goal_position: usize, step_position: usize) -> Result<Goal> {
        self.modify_goal(user_id, goal_position, |goal| {
            let len = goal.steps.len();
            let step = step_position
                .checked_sub(1)
                .and_then(|index| goal.steps.get_mut(index))
                .ok_or(ProddyError::PositionOutOfRange {
                    list: "step",
                    position: step_position,
                    len,
                })?;
            step.completed = true;
            goal.recompute_progress();
            Ok(())
        })
    }

    /// Resolve `position` to a goal id, then apply `change` to that goal
    /// atomically in the store. Nothing is written if `change` fails.
    fn modify_goal(
        &self,
        user_id: &str,
        position: usize,
        change: impl FnOnce(&mut Goal) -> Result<()>,
    ) -> Result<Goal> {
        let target = resolve(&self.store.get_goals(user_id), position, "goal")?;

        let mut change = Some(change);
        let mut rejected = None;
        let stored = self.store.modify_goal(user_id, &target.id, &mut |goal: &mut Goal| {
            match change.take().map_or(Ok(()), |change| change(goal)) {
                Ok(()) => true,
                Err(e) => {
                    rejected = Some(e);
                    false
                }
            }
        })?;

        if let Some(e) = rejected {
            return Err(e);
        }
        stored.ok_or_else(|| self.goal_gone(user_id, position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::models::User;
    use crate::session::FocusSession;
    use crate::stats::FocusStats;
    use crate::store::MemoryStore;
    use std::sync::Mutex;

    type Hook = Box<dyn FnOnce(&Planner) + Send>;

    /// Runs `hook` against the shared records right after the next goal
    /// read, as if another request landed between that read and the write
    #[derive(Default)]
    struct RacingStore {
        inner: Arc<MemoryStore>,
        hook: Mutex<Option<Hook>>,
    }

    impl RacingStore {
        fn race(&self, hook: impl FnOnce(&Planner) + Send + 'static) {
            *self.hook.lock().unwrap() = Some(Box::new(hook));
        }
    }

    impl Store for RacingStore {
        fn save_user(&self, user: User) -> Result<User, StoreError> {
            self.inner.save_user(user)
        }
        fn get_user(&self, user_id: &str) -> Option<User> {
            self.inner.get_user(user_id)
        }
        fn update_activity(&self, user_id: &str) -> Result<(), StoreError> {
            self.inner.update_activity(user_id)
        }
        fn save_task(&self, task: Task) -> Result<(), StoreError> {
            self.inner.save_task(task)
        }
        fn get_tasks(&self, user_id: &str) -> Vec<Task> {
            self.inner.get_tasks(user_id)
        }
        fn update_task(&self, task: &Task) -> Result<bool, StoreError> {
            self.inner.update_task(task)
        }
        fn delete_task(&self, user_id: &str, task_id: &str) -> Result<bool, StoreError> {
            self.inner.delete_task(user_id, task_id)
        }
        fn save_goal(&self, goal: Goal) -> Result<(), StoreError> {
            self.inner.save_goal(goal)
        }
        fn get_goals(&self, user_id: &str) -> Vec<Goal> {
            let goals = self.inner.get_goals(user_id);
            let hook = self.hook.lock().unwrap().take();
            if let Some(hook) = hook {
                hook(&Planner::new(self.inner.clone()));
            }
            goals
        }
        fn update_goal(&self, goal: &Goal) -> Result<bool, StoreError> {
            self.inner.update_goal(goal)
        }
        fn modify_goal(
            &self,
            user_id: &str,
            goal_id: &str,
            change: &mut dyn FnMut(&mut Goal) -> bool,
        ) -> Result<Option<Goal>, StoreError> {
            self.inner.modify_goal(user_id, goal_id, change)
        }
        fn delete_goal(&self, user_id: &str, goal_id: &str) -> Result<bool, StoreError> {
            self.inner.delete_goal(user_id, goal_id)
        }
        fn save_session(&self, session: FocusSession) -> Result<(), StoreError> {
            self.inner.save_session(session)
        }
        fn get_sessions(&self, user_id: &str) -> Vec<FocusSession> {
            self.inner.get_sessions(user_id)
        }
        fn get_session(&self, user_id: &str, session_id: &str) -> Option<FocusSession> {
            self.inner.get_session(user_id, session_id)
        }
        fn update_session(&self, session: &FocusSession) -> Result<bool, StoreError> {
            self.inner.update_session(session)
        }
        fn get_stats(&self, user_id: &str) -> FocusStats {
            self.inner.get_stats(user_id)
        }
        fn update_stats(&self, user_id: &str, stats: FocusStats) -> Result<(), StoreError> {
            self.inner.update_stats(user_id, stats)
        }
    }

    fn racing_planner() -> (Planner, Arc<RacingStore>) {
        let store = Arc::new(RacingStore::default());
        (Planner::new(store.clone()), store)
    }

    fn planner() -> Planner {
        Planner::new(Arc::new(MemoryStore::new()))
    }

    fn texts(planner: &Planner, user_id: &str) -> Vec<String> {
        planner.list_tasks(user_id).into_iter().map(|t| t.text).collect()
    }

    #[test]
    fn test_add_task_trims_and_rejects_empty() {
        let planner = planner();
        let task = planner.add_task("U1", "  read a book ").unwrap();
        assert_eq!(task.text, "read a book");

        let err = planner.add_task("U1", "   ").unwrap_err();
        assert_eq!(err, ProddyError::EmptyText { field: "Task description" });
        assert_eq!(planner.list_tasks("U1").len(), 1);
    }

    #[test]
    fn test_positions_follow_current_list() {
        let planner = planner();
        for text in ["A", "B", "C"] {
            planner.add_task("U2", text).unwrap();
        }

        let deleted = planner.delete_task("U2", 2).unwrap();
        assert_eq!(deleted.text, "B");
        assert_eq!(texts(&planner, "U2"), vec!["A", "C"]);

        let completed = planner.complete_task("U2", 2).unwrap();
        assert_eq!(completed.text, "C");

        let first = planner.complete_task("U2", 1).unwrap();
        assert_eq!(first.text, "A");
    }

    #[test]
    fn test_completion_keeps_order_and_persists() {
        let planner = planner();
        for text in ["A", "B", "C"] {
            planner.add_task("U1", text).unwrap();
        }

        planner.complete_task("U1", 2).unwrap();

        let tasks = planner.list_tasks("U1");
        assert_eq!(texts(&planner, "U1"), vec!["A", "B", "C"]);
        assert!(!tasks[0].completed);
        assert!(tasks[1].completed);
        assert_eq!(
            planner.task_summary("U1"),
            TaskSummary {
                total: 3,
                completed: 1,
                remaining: 2
            }
        );
    }

    #[test]
    fn test_out_of_range_positions() {
        let planner = planner();
        assert_eq!(
            planner.complete_task("U1", 1).unwrap_err(),
            ProddyError::PositionOutOfRange {
                list: "task",
                position: 1,
                len: 0
            }
        );

        planner.add_task("U1", "A").unwrap();
        assert!(planner.delete_task("U1", 0).is_err());
        assert!(planner.delete_task("U1", 2).is_err());
        assert_eq!(planner.list_tasks("U1").len(), 1);
    }

    #[test]
    fn test_by_id_operations() {
        let planner = planner();
        let a = planner.add_task("U1", "A").unwrap();
        let b = planner.add_task("U1", "B").unwrap();

        assert!(planner.complete_task_by_id("U1", &a.id).unwrap().unwrap().completed);
        assert!(planner.list_tasks("U1")[0].completed);

        assert_eq!(planner.delete_task_by_id("U1", &b.id).unwrap().map(|t| t.text), Some("B".to_string()));
        assert!(planner.delete_task_by_id("U1", &b.id).unwrap().is_none());
        assert!(planner.complete_task_by_id("U1", "missing").unwrap().is_none());
    }

    #[test]
    fn test_users_have_separate_lists() {
        let planner = planner();
        planner.add_task("U1", "mine").unwrap();
        assert!(planner.list_tasks("U2").is_empty());
        assert!(planner.delete_task("U2", 1).is_err());
    }

    #[test]
    fn test_goal_lifecycle() {
        let planner = planner();
        planner.add_goal("U1", "learn english").unwrap();
        planner.add_goal("U1", "run a marathon").unwrap();
        assert!(planner.add_goal("U1", " ").is_err());

        let goal = planner.set_goal_progress("U1", 1, 250).unwrap();
        assert_eq!(goal.progress, 100);
        assert!(!goal.completed);

        let goal = planner.set_goal_progress("U1", 1, -10).unwrap();
        assert_eq!(goal.progress, 0);
        assert_eq!(planner.list_goals("U1")[0].progress, 0);

        planner.set_goal_progress("U1", 2, 40).unwrap();
        assert_eq!(
            planner.goal_summary("U1"),
            GoalSummary {
                total: 2,
                completed: 0,
                in_progress: 1,
                fresh: 1
            }
        );

        let done = planner.complete_goal("U1", 1).unwrap();
        assert!(done.completed);
        assert_eq!(done.progress, 100);

        let removed = planner.delete_goal("U1", 1).unwrap();
        assert_eq!(removed.title, "learn english");
        assert_eq!(planner.list_goals("U1")[0].title, "run a marathon");
    }

    #[test]
    fn test_goal_steps_drive_progress() {
        let planner = planner();
        planner.add_goal("U1", "ship v1").unwrap();
        planner.add_goal_step("U1", 1, "design").unwrap();
        planner.add_goal_step("U1", 1, "build").unwrap();
        planner.add_goal_step("U1", 1, "release").unwrap();
        planner.add_goal_step("U1", 1, "celebrate").unwrap();

        let goal = planner.complete_goal_step("U1", 1, 2).unwrap();
        assert_eq!(goal.progress, 25);
        assert!(goal.steps[1].completed);

        assert_eq!(
            planner.complete_goal_step("U1", 1, 9).unwrap_err(),
            ProddyError::PositionOutOfRange {
                list: "step",
                position: 9,
                len: 4
            }
        );
        assert!(planner.add_goal_step("U1", 1, "").is_err());
        assert_eq!(planner.list_goals("U1")[0].steps.len(), 4);
    }

    #[test]
    fn test_step_added_to_completed_goal_keeps_progress() {
        let planner = planner();
        planner.add_goal("U1", "ship v1").unwrap();
        planner.complete_goal("U1", 1).unwrap();

        let goal = planner.add_goal_step("U1", 1, "write changelog").unwrap();
        assert!(goal.completed);
        assert_eq!(goal.progress, 100);
        assert_eq!(planner.goal_summary("U1").completed, 1);
    }

    #[test]
    fn test_concurrent_step_additions_are_both_kept() {
        let (planner, store) = racing_planner();
        planner.add_goal("U1", "ship v1").unwrap();

        store.race(|other| {
            other.add_goal_step("U1", 1, "build").unwrap();
        });
        let goal = planner.add_goal_step("U1", 1, "design").unwrap();

        let steps: Vec<_> = goal.steps.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(steps, vec!["build", "design"]);
        assert_eq!(planner.list_goals("U1")[0].steps.len(), 2);
    }

    #[test]
    fn test_step_completion_on_deleted_goal_fails() {
        let (planner, store) = racing_planner();
        planner.add_goal("U1", "A").unwrap();
        planner.add_goal("U1", "B").unwrap();
        planner.add_goal_step("U1", 1, "a1").unwrap();
        planner.add_goal_step("U1", 2, "b1").unwrap();

        store.race(|other| {
            other.delete_goal("U1", 1).unwrap();
        });
        let err = planner.complete_goal_step("U1", 1, 1).unwrap_err();
        assert_eq!(
            err,
            ProddyError::PositionOutOfRange {
                list: "goal",
                position: 1,
                len: 1
            }
        );

        let goals = planner.list_goals("U1");
        assert_eq!(goals.len(), 1);
        assert_eq!(goals[0].title, "B");
        assert!(!goals[0].steps[0].completed);
        assert_eq!(goals[0].progress, 0);
    }
}
