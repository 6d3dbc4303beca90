//! Intent parsing for chat messages
//!
//! Free text is matched on keywords, case-insensitively:
//! - "start focus" / "stop" / "break" drive the focus timer
//! - "add task ...", "list tasks", "complete task 2", "delete task 2"
//! - "add goal ...", "list goals", "goal progress 1 40", "complete goal 1"
//! - "add step 1 ...", "complete step 1 2" for goal steps
//! - "stats", "menu", "help"
//!
//! Button presses arrive as callback payloads and go through
//! [`IntentParser::parse_callback`].

use regex::Regex;

/// Which numbered command was sent without its number(s)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Usage {
    CompleteTask,
    DeleteTask,
    DeleteGoal,
    CompleteGoal,
    GoalProgress,
    AddGoalStep,
    CompleteGoalStep,
}

impl Usage {
    /// Example invocation shown back to the user
    pub fn example(&self) -> &'static str {
        match self {
            Usage::CompleteTask => "complete task 1",
            Usage::DeleteTask => "delete task 1",
            Usage::DeleteGoal => "delete goal 1",
            Usage::CompleteGoal => "complete goal 1",
            Usage::GoalProgress => "goal progress 1 50",
            Usage::AddGoalStep => "add step 1 write the outline",
            Usage::CompleteGoalStep => "complete step 1 2",
        }
    }
}

/// What the user asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Welcome,
    Menu,
    Help,
    FocusStatus,
    StartWork,
    Stop,
    StartBreak,
    TaskOverview,
    ListTasks,
    AddTask(String),
    CompleteTask(usize),
    DeleteTask(usize),
    CompleteTaskId(String),
    DeleteTaskId(String),
    GoalOverview,
    ListGoals,
    AddGoal(String),
    DeleteGoal(usize),
    CompleteGoal(usize),
    GoalProgress { position: usize, progress: i64 },
    AddGoalStep { goal: usize, text: String },
    CompleteGoalStep { goal: usize, step: usize },
    Stats,
    /// A recognised command missing its numbers
    Usage(Usage),
    Unknown,
}

const DONE_WORDS: &[&str] = &["complete", "done", "finish", "check"];
const DELETE_WORDS: &[&str] = &["delete", "remove", "drop"];
const STOP_WORDS: &[&str] = &["stop", "cancel", "end"];
const LIST_WORDS: &[&str] = &["list", "show"];

fn mentions(words: &[&str], stem: &str) -> bool {
    words.iter().any(|w| w.starts_with(stem))
}

fn mentions_any(words: &[&str], stems: &[&str]) -> bool {
    stems.iter().any(|stem| mentions(words, stem))
}

/// Compiled patterns for [`Command`] recognition
#[derive(Debug, Clone)]
pub struct IntentParser {
    greeting: Regex,
    add_task: Regex,
    add_goal: Regex,
    add_step: Regex,
    number: Regex,
}

impl IntentParser {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            greeting: Regex::new(r"(?i)^(/start|start|hi|hello)$")?,
            add_task: Regex::new(r"(?i)\b(?:add|new)\s+task\b:?\s*(?P<text>.*)$")?,
            add_goal: Regex::new(r"(?i)\b(?:add|new)\s+goal\b:?\s*(?P<text>.*)$")?,
            add_step: Regex::new(r"(?i)\badd\s+step\s+(?:to\s+goal\s+)?(?P<goal>\d+)\b:?\s*(?P<text>.*)$")?,
            number: Regex::new(r"-?\d+")?,
        })
    }

    /// Map free text to a command
    pub fn parse(&self, text: &str) -> Command {
        let text = text.trim();
        if self.greeting.is_match(text) {
            return Command::Welcome;
        }

        let lower = text.to_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric() && c != '/')
            .filter(|w| !w.is_empty())
            .collect();
        let has = |stem: &str| mentions(&words, stem);

        if has("menu") {
            Command::Menu
        } else if has("help") {
            Command::Help
        } else if has("task") {
            self.parse_task(text, &words)
        } else if has("step") {
            self.parse_step(text, mentions_any(&words, DONE_WORDS))
        } else if has("goal") {
            self.parse_goal(text, &words)
        } else if has("break") {
            Command::StartBreak
        } else if has("focus") || has("pomodoro") {
            if mentions_any(&words, STOP_WORDS) {
                Command::Stop
            } else if has("start") || has("begin") {
                Command::StartWork
            } else {
                Command::FocusStatus
            }
        } else if has("stop") {
            Command::Stop
        } else if has("stat") {
            Command::Stats
        } else {
            Command::Unknown
        }
    }

    fn parse_task(&self, text: &str, words: &[&str]) -> Command {
        if let Some(caps) = self.add_task.captures(text) {
            return Command::AddTask(caps["text"].trim().to_string());
        }
        if mentions_any(words, DELETE_WORDS) {
            return self.position(text).map_or(Command::Usage(Usage::DeleteTask), Command::DeleteTask);
        }
        if mentions_any(words, DONE_WORDS) {
            return self.position(text).map_or(Command::Usage(Usage::CompleteTask), Command::CompleteTask);
        }
        if mentions_any(words, LIST_WORDS) {
            return Command::ListTasks;
        }
        Command::TaskOverview
    }

    fn parse_goal(&self, text: &str, words: &[&str]) -> Command {
        if let Some(caps) = self.add_goal.captures(text) {
            return Command::AddGoal(caps["text"].trim().to_string());
        }
        if mentions_any(words, DELETE_WORDS) {
            return self.position(text).map_or(Command::Usage(Usage::DeleteGoal), Command::DeleteGoal);
        }
        if mentions(words, "progress") {
            return match self.numbers(text).as_slice() {
                [position, progress, ..] if *position > 0 => Command::GoalProgress {
                    position: *position as usize,
                    progress: *progress,
                },
                _ => Command::Usage(Usage::GoalProgress),
            };
        }
        if mentions_any(words, DONE_WORDS) {
            return self.position(text).map_or(Command::Usage(Usage::CompleteGoal), Command::CompleteGoal);
        }
        if mentions_any(words, LIST_WORDS) {
            return Command::ListGoals;
        }
        Command::GoalOverview
    }

    fn parse_step(&self, text: &str, done: bool) -> Command {
        if let Some(caps) = self.add_step.captures(text) {
            return match caps["goal"].parse() {
                Ok(goal) if goal > 0 => Command::AddGoalStep {
                    goal,
                    text: caps["text"].trim().to_string(),
                },
                _ => Command::Usage(Usage::AddGoalStep),
            };
        }
        if done {
            return match self.numbers(text).as_slice() {
                [goal, step, ..] if *goal > 0 && *step > 0 => Command::CompleteGoalStep {
                    goal: *goal as usize,
                    step: *step as usize,
                },
                _ => Command::Usage(Usage::CompleteGoalStep),
            };
        }
        Command::Usage(Usage::AddGoalStep)
    }

    fn numbers(&self, text: &str) -> Vec<i64> {
        self.number
            .find_iter(text)
            .filter_map(|m| m.as_str().parse().ok())
            .collect()
    }

    /// First positive number in the text
    fn position(&self, text: &str) -> Option<usize> {
        self.numbers(text)
            .into_iter()
            .find(|n| *n > 0)
            .map(|n| n as usize)
    }

    /// Map a button payload to a command
    pub fn parse_callback(&self, payload: &str) -> Command {
        match payload {
            "pomodoro_start" => Command::StartWork,
            "pomodoro_stop" => Command::Stop,
            "pomodoro_break" => Command::StartBreak,
            "tasks_list" => Command::ListTasks,
            "goals_list" => Command::ListGoals,
            "stats" => Command::Stats,
            _ => {
                if let Some(id) = payload.strip_prefix("task_complete_").filter(|id| !id.is_empty()) {
                    Command::CompleteTaskId(id.to_string())
                } else if let Some(id) = payload.strip_prefix("task_delete_").filter(|id| !id.is_empty()) {
                    Command::DeleteTaskId(id.to_string())
                } else {
                    Command::Unknown
                }
            }
        }
    }
}
