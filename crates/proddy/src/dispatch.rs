//! Routes inbound chat updates to the engine and the planner
//!
//! The dispatcher never formats text. It returns a [`Reply`] describing
//! what happened and leaves wording to [`crate::render`].

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::engine::{BreakStarted, FocusStatus, SessionEngine, StopOutcome, WorkStarted};
use crate::error::{ProddyError, StoreError};
use crate::intent::{Command, IntentParser, Usage};
use crate::models::{Goal, Task, User};
use crate::planner::{GoalSummary, Planner, TaskSummary};
use crate::stats::FocusStats;
use crate::store::Store;

/// Who sent an update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub user_id: String,
    pub display_name: String,
    pub username: Option<String>,
}

impl Sender {
    pub fn new(user_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: display_name.into(),
            username: None,
        }
    }
}

/// An update from the chat transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Text(String),
    Callback(String),
}

/// Everything shown by the stats reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsReport {
    pub focus: FocusStats,
    pub tasks: TaskSummary,
    pub goals: GoalSummary,
}

/// Outcome of one inbound update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Welcome { name: String },
    Menu,
    Help { work_minutes: u32, break_minutes: u32 },
    Focus { status: FocusStatus, work_minutes: u32, break_minutes: u32 },
    WorkStarted(WorkStarted),
    Stopped(StopOutcome),
    BreakStarted(BreakStarted),
    TaskOverview(TaskSummary),
    Tasks(Vec<Task>),
    TaskAdded(Task),
    TaskCompleted(Task),
    TaskDeleted(Task),
    /// A button referred to a task that no longer exists
    TaskMissing,
    GoalOverview(GoalSummary),
    Goals(Vec<Goal>),
    GoalAdded(Goal),
    GoalDeleted(Goal),
    GoalProgress(Goal),
    GoalCompleted(Goal),
    StepAdded(Goal),
    StepCompleted(Goal),
    Stats(StatsReport),
    Usage(Usage),
    Rejected(ProddyError),
    Unknown,
}

/// Turns inbound updates into replies
#[derive(Clone)]
pub struct Dispatcher {
    store: Arc<dyn Store>,
    engine: SessionEngine,
    planner: Planner,
    parser: IntentParser,
}

impl Dispatcher {
    pub fn new(store: Arc<dyn Store>, engine: SessionEngine) -> Result<Self, regex::Error> {
        Ok(Self {
            planner: Planner::new(store.clone()),
            parser: IntentParser::new()?,
            store,
            engine,
        })
    }

    /// Register the sender, then act on the update
    pub async fn handle(&self, sender: &Sender, inbound: Inbound) -> Reply {
        if let Err(e) = self.register(sender) {
            warn!(user_id = %sender.user_id, error = %e, "could not register user");
            return Reply::Rejected(e.into());
        }

        let command = match &inbound {
            Inbound::Text(text) => self.parser.parse(text),
            Inbound::Callback(payload) => self.parser.parse_callback(payload),
        };
        debug!(user_id = %sender.user_id, ?command, "dispatching");

        self.execute(sender, command).await
    }

    fn register(&self, sender: &Sender) -> Result<(), StoreError> {
        if self.store.get_user(&sender.user_id).is_some() {
            return self.store.update_activity(&sender.user_id);
        }

        let mut user = User::new(&sender.user_id, &sender.display_name);
        user.username = sender.username.clone();
        self.store.save_user(user)?;
        info!(user_id = %sender.user_id, name = %sender.display_name, "registered user");
        Ok(())
    }

    async fn execute(&self, sender: &Sender, command: Command) -> Reply {
        let user_id = sender.user_id.as_str();
        let planner = &self.planner;
        let config = self.engine.config();

        let outcome = match command {
            Command::Welcome => Ok(Reply::Welcome {
                name: sender.display_name.clone(),
            }),
            Command::Menu => Ok(Reply::Menu),
            Command::Help => Ok(Reply::Help {
                work_minutes: config.work_minutes,
                break_minutes: config.break_minutes,
            }),
            Command::FocusStatus => Ok(Reply::Focus {
                status: self.engine.status(user_id).await,
                work_minutes: config.work_minutes,
                break_minutes: config.break_minutes,
            }),
            Command::StartWork => self.engine.start_work(user_id).await.map(Reply::WorkStarted),
            Command::Stop => self.engine.stop(user_id).await.map(Reply::Stopped),
            Command::StartBreak => self.engine.start_break(user_id).await.map(Reply::BreakStarted),

            Command::TaskOverview => Ok(Reply::TaskOverview(planner.task_summary(user_id))),
            Command::ListTasks => Ok(Reply::Tasks(planner.list_tasks(user_id))),
            Command::AddTask(text) => planner.add_task(user_id, &text).map(Reply::TaskAdded),
            Command::CompleteTask(position) => planner.complete_task(user_id, position).map(Reply::TaskCompleted),
            Command::DeleteTask(position) => planner.delete_task(user_id, position).map(Reply::TaskDeleted),
            Command::CompleteTaskId(id) => planner
                .complete_task_by_id(user_id, &id)
                .map(|task| task.map_or(Reply::TaskMissing, Reply::TaskCompleted)),
            Command::DeleteTaskId(id) => planner
                .delete_task_by_id(user_id, &id)
                .map(|task| task.map_or(Reply::TaskMissing, Reply::TaskDeleted)),

            Command::GoalOverview => Ok(Reply::GoalOverview(planner.goal_summary(user_id))),
            Command::ListGoals => Ok(Reply::Goals(planner.list_goals(user_id))),
            Command::AddGoal(title) => planner.add_goal(user_id, &title).map(Reply::GoalAdded),
            Command::DeleteGoal(position) => planner.delete_goal(user_id, position).map(Reply::GoalDeleted),
            Command::CompleteGoal(position) => planner.complete_goal(user_id, position).map(Reply::GoalCompleted),
            Command::GoalProgress { position, progress } => planner
                .set_goal_progress(user_id, position, progress)
                .map(Reply::GoalProgress),
            Command::AddGoalStep { goal, text } => planner.add_goal_step(user_id, goal, &text).map(Reply::StepAdded),
            Command::CompleteGoalStep { goal, step } => planner
                .complete_goal_step(user_id, goal, step)
                .map(Reply::StepCompleted),

            Command::Stats => Ok(Reply::Stats(StatsReport {
                focus: self.engine.stats(user_id),
                tasks: planner.task_summary(user_id),
                goals: planner.goal_summary(user_id),
            })),
            Command::Usage(usage) => Ok(Reply::Usage(usage)),
            Command::Unknown => Ok(Reply::Unknown),
        };

        outcome.unwrap_or_else(|e| {
            debug!(user_id, error = %e, "command rejected");
            Reply::Rejected(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::FocusState;
    use crate::store::MemoryStore;
    use proddy_core::Config;
    use std::time::Duration;

    fn dispatcher() -> (Dispatcher, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let (engine, _notifications) = SessionEngine::new(store.clone(), Config::default());
        (Dispatcher::new(store.clone(), engine).unwrap(), store)
    }

    fn alice() -> Sender {
        Sender::new("U1", "Alice")
    }

    async fn say(dispatcher: &Dispatcher, text: &str) -> Reply {
        dispatcher.handle(&alice(), Inbound::Text(text.to_string())).await
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_message_registers_user_once() {
        let (dispatcher, store) = dispatcher();
        let mut sender = alice();
        sender.username = Some("alice".to_string());

        let reply = dispatcher.handle(&sender, Inbound::Text("/start".to_string())).await;
        assert_eq!(reply, Reply::Welcome { name: "Alice".to_string() });
        let first = store.get_user("U1").unwrap();
        assert_eq!(first.username.as_deref(), Some("alice"));

        tokio::time::sleep(Duration::from_secs(5)).await;
        dispatcher.handle(&sender, Inbound::Text("menu".to_string())).await;

        let again = store.get_user("U1").unwrap();
        assert_eq!(store.user_count(), 1);
        assert_eq!(again.registered_at, first.registered_at);
        assert!(again.last_activity >= first.last_activity);
    }

    #[tokio::test(start_paused = true)]
    async fn test_task_flow_by_position() {
        let (dispatcher, _) = dispatcher();
        for text in ["add task A", "add task B", "add task C"] {
            assert!(matches!(say(&dispatcher, text).await, Reply::TaskAdded(_)));
        }

        let Reply::TaskDeleted(deleted) = say(&dispatcher, "delete task 2").await else {
            panic!("expected a deletion");
        };
        assert_eq!(deleted.text, "B");

        let Reply::Tasks(tasks) = say(&dispatcher, "list tasks").await else {
            panic!("expected a listing");
        };
        let texts: Vec<_> = tasks.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["A", "C"]);

        let Reply::TaskCompleted(done) = say(&dispatcher, "complete task 2").await else {
            panic!("expected a completion");
        };
        assert_eq!(done.text, "C");
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejections_are_explicit() {
        let (dispatcher, _) = dispatcher();

        assert_eq!(
            say(&dispatcher, "add task   ").await,
            Reply::Rejected(ProddyError::EmptyText {
                field: "Task description"
            })
        );
        assert_eq!(
            say(&dispatcher, "complete task 4").await,
            Reply::Rejected(ProddyError::PositionOutOfRange {
                list: "task",
                position: 4,
                len: 0
            })
        );
        assert_eq!(say(&dispatcher, "delete task").await, Reply::Usage(Usage::DeleteTask));
        assert_eq!(say(&dispatcher, "sing me a song").await, Reply::Unknown);
    }

    #[tokio::test(start_paused = true)]
    async fn test_callbacks_address_tasks_by_id() {
        let (dispatcher, _) = dispatcher();
        let Reply::TaskAdded(task) = say(&dispatcher, "add task write report").await else {
            panic!("expected a task");
        };

        let payload = format!("task_complete_{}", task.id);
        let reply = dispatcher.handle(&alice(), Inbound::Callback(payload)).await;
        assert!(matches!(reply, Reply::TaskCompleted(t) if t.completed));

        let payload = format!("task_delete_{}", task.id);
        assert!(matches!(
            dispatcher.handle(&alice(), Inbound::Callback(payload.clone())).await,
            Reply::TaskDeleted(_)
        ));
        assert_eq!(dispatcher.handle(&alice(), Inbound::Callback(payload)).await, Reply::TaskMissing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_focus_through_messages() {
        let (dispatcher, _) = dispatcher();

        let Reply::WorkStarted(started) = say(&dispatcher, "start focus").await else {
            panic!("expected work to start");
        };
        assert_eq!(started.session.duration_minutes, 25);

        let Reply::Focus { status, .. } = say(&dispatcher, "focus").await else {
            panic!("expected a status");
        };
        assert!(matches!(status.state, FocusState::Working { .. }));

        let reply = dispatcher.handle(&alice(), Inbound::Callback("pomodoro_stop".to_string())).await;
        assert!(matches!(reply, Reply::Stopped(StopOutcome::Interrupted(s)) if s.interrupted));

        assert_eq!(say(&dispatcher, "stop").await, Reply::Stopped(StopOutcome::NothingActive));
    }

    #[tokio::test(start_paused = true)]
    async fn test_completed_session_shows_in_stats() {
        let (dispatcher, _) = dispatcher();
        say(&dispatcher, "start pomodoro").await;
        say(&dispatcher, "add task A").await;
        say(&dispatcher, "add goal learn Rust").await;

        tokio::time::sleep(Duration::from_secs(25 * 60 + 1)).await;

        let Reply::Stats(report) = dispatcher.handle(&alice(), Inbound::Callback("stats".to_string())).await else {
            panic!("expected stats");
        };
        assert_eq!(report.focus.total_sessions, 1);
        assert_eq!(report.focus.total_focus_minutes, 25);
        assert_eq!(report.tasks.total, 1);
        assert_eq!(report.goals.total, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_goal_commands() {
        let (dispatcher, _) = dispatcher();
        say(&dispatcher, "add goal learn Rust").await;

        let Reply::GoalProgress(goal) = say(&dispatcher, "goal progress 1 140").await else {
            panic!("expected progress");
        };
        assert_eq!(goal.progress, 100);
        assert!(!goal.completed);

        assert!(matches!(say(&dispatcher, "add step 1 read the book").await, Reply::StepAdded(_)));
        let Reply::StepCompleted(goal) = say(&dispatcher, "complete step 1 1").await else {
            panic!("expected step completion");
        };
        assert_eq!(goal.progress, 100);

        assert!(matches!(say(&dispatcher, "complete goal 1").await, Reply::GoalCompleted(g) if g.completed));
        assert!(matches!(say(&dispatcher, "delete goal 1").await, Reply::GoalDeleted(_)));
        assert_eq!(
            say(&dispatcher, "delete goal 1").await,
            Reply::Rejected(ProddyError::PositionOutOfRange {
                list: "goal",
                position: 1,
                len: 0
            })
        );
    }
}
