//! proddy - A conversational productivity assistant
//!
//! "One thing at a time, and that one thing done well."
//!
//! Proddy keeps per-user productivity state behind a chat interface:
//! - Pomodoro focus sessions with timed work periods and breaks
//! - Running statistics: sessions, focus time, daily count, streak
//! - A task list addressed by position ("complete task 2")
//! - Goals with progress tracking and optional steps
//!
//! Layers, bottom up:
//! - store: in-memory entity storage behind the [`Store`] trait
//! - timer: at most one pending delayed action per user
//! - engine: the Idle / Working / OnBreak state machine
//! - planner: task and goal CRUD
//! - intent, dispatch, render: text in, structured reply, text out

pub mod dispatch;
pub mod engine;
pub mod error;
pub mod intent;
pub mod models;
pub mod planner;
pub mod render;
pub mod session;
pub mod stats;
pub mod store;
pub mod timer;

pub use dispatch::{Dispatcher, Inbound, Reply, Sender};
pub use engine::{FocusState, Notification, SessionEngine};
pub use error::{ProddyError, StoreError};
pub use models::{Goal, GoalStep, NewTask, Task, User};
pub use planner::Planner;
pub use session::{FocusSession, SessionKind};
pub use stats::FocusStats;
pub use store::{MemoryStore, Store};
