//! Users, tasks and goals
//!
//! Plain records owned by the store. Positions shown to the user are never
//! stored here; they are derived from list order at render time.

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// A person talking to the assistant, keyed by the platform's user id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    pub display_name: String,
    #[serde(default)]
    pub username: Option<String>,
    pub registered_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl User {
    pub fn new(user_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            user_id: user_id.into(),
            display_name: display_name.into(),
            username: None,
            registered_at: now,
            last_activity: now,
        }
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            _ => None,
        }
    }
}

/// Task category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Study,
    Work,
    #[default]
    Personal,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Study => "study",
            Category::Work => "work",
            Category::Personal => "personal",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "study" => Some(Category::Study),
            "work" => Some(Category::Work),
            "personal" => Some(Category::Personal),
            _ => None,
        }
    }
}

/// Input for creating a task
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub text: String,
    pub priority: Priority,
    pub category: Category,
    pub deadline: Option<DateTime<Utc>>,
}

impl NewTask {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// An entry in a user's task list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub user_id: String,
    pub text: String,
    pub created: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
    pub completed: bool,
    pub priority: Priority,
    pub category: Category,
}

impl Task {
    pub fn new(user_id: &str, new: NewTask) -> Self {
        Self {
            id: new_id(),
            user_id: user_id.to_string(),
            text: new.text,
            created: Utc::now(),
            deadline: new.deadline,
            completed: false,
            priority: new.priority,
            category: new.category,
        }
    }
}

/// One step towards a goal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalStep {
    pub id: String,
    pub text: String,
    pub completed: bool,
}

impl GoalStep {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            text: text.into(),
            completed: false,
        }
    }
}

/// A longer-running objective with a progress percentage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    pub id: String,
    pub user_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub created: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
    /// 0-100
    pub progress: u8,
    pub completed: bool,
    #[serde(default)]
    pub steps: Vec<GoalStep>,
}

impl Goal {
    /// Create a goal due one calendar month from now
    pub fn new(user_id: &str, title: impl Into<String>) -> Self {
        let created = Utc::now();
        let deadline = created
            .checked_add_months(Months::new(1))
            .unwrap_or_else(|| created + Duration::days(30));

        Self {
            id: new_id(),
            user_id: user_id.to_string(),
            title: title.into(),
            description: String::new(),
            created,
            deadline,
            progress: 0,
            completed: false,
            steps: Vec::new(),
        }
    }

    /// Set progress, clamping into 0..=100
    pub fn set_progress(&mut self, progress: i64) {
        self.progress = progress.clamp(0, 100) as u8;
    }

    /// Derive progress from the share of completed steps. Once a goal has
    /// steps this replaces any progress set by hand. Completed goals and
    /// goals without steps are left alone.
    pub fn recompute_progress(&mut self) {
        if self.completed || self.steps.is_empty() {
            return;
        }
        let done = self.steps.iter().filter(|s| s.completed).count();
        self.progress = ((done * 100) / self.steps.len()) as u8;
    }

    /// Started but not finished
    pub fn is_in_progress(&self) -> bool {
        !self.completed && self.progress > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_roundtrip() {
        for p in [Priority::Low, Priority::Medium, Priority::High] {
            assert_eq!(Priority::from_str(p.as_str()), Some(p));
        }
        assert_eq!(Priority::from_str("urgent"), None);
        assert_eq!(Priority::default(), Priority::Medium);
    }

    #[test]
    fn test_category_defaults_to_personal() {
        assert_eq!(Category::default(), Category::Personal);
        assert_eq!(Category::from_str("STUDY"), Some(Category::Study));
    }

    #[test]
    fn test_new_task_defaults() {
        let task = Task::new("u1", NewTask::new("read a book"));
        assert_eq!(task.user_id, "u1");
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.category, Category::Personal);
        assert!(!task.completed);
        assert!(task.deadline.is_none());
    }

    #[test]
    fn test_task_ids_are_unique() {
        let a = Task::new("u1", NewTask::new("a"));
        let b = Task::new("u1", NewTask::new("b"));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_goal_deadline_one_month_out() {
        let goal = Goal::new("u1", "learn english");
        assert!(goal.deadline > goal.created + Duration::days(27));
        assert!(goal.deadline <= goal.created + Duration::days(31));
    }

    #[test]
    fn test_goal_progress_clamped() {
        let mut goal = Goal::new("u1", "run");
        goal.set_progress(150);
        assert_eq!(goal.progress, 100);
        goal.set_progress(-5);
        assert_eq!(goal.progress, 0);
        goal.set_progress(42);
        assert_eq!(goal.progress, 42);
        assert!(goal.is_in_progress());
    }

    #[test]
    fn test_goal_progress_from_steps() {
        let mut goal = Goal::new("u1", "ship");
        goal.steps = vec![GoalStep::new("a"), GoalStep::new("b"), GoalStep::new("c")];
        goal.steps[0].completed = true;
        goal.recompute_progress();
        assert_eq!(goal.progress, 33);
    }

    #[test]
    fn test_completed_goal_keeps_full_progress() {
        let mut goal = Goal::new("u1", "ship");
        goal.progress = 100;
        goal.completed = true;
        goal.steps.push(GoalStep::new("late step"));
        goal.recompute_progress();
        assert_eq!(goal.progress, 100);

        let mut open = Goal::new("u1", "read");
        open.set_progress(60);
        open.steps.push(GoalStep::new("chapter 1"));
        open.recompute_progress();
        assert_eq!(open.progress, 0);
    }
}
