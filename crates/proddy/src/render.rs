//! User-facing text for replies and notifications

use proddy_core::format;
use std::fmt::Write;

use crate::dispatch::{Reply, StatsReport};
use crate::engine::{FocusState, FocusStatus, Notification, StopOutcome};
use crate::error::ProddyError;
use crate::models::{Goal, Priority, Task};
use crate::planner::{GoalSummary, TaskSummary};

const BAR_WIDTH: usize = 10;
const TEXT_WIDTH: usize = 60;

/// Render a reply as chat text
pub fn reply_text(reply: &Reply) -> String {
    match reply {
        Reply::Welcome { name } => format!(
            "Welcome to Proddy, {}!\n\n\
             I can help you with:\n\
             - Focus mode: a Pomodoro timer\n\
             - Tasks: keep a running to-do list\n\
             - Goals: set goals and track progress\n\
             - Stats: see how productive you have been\n\n\
             Type 'menu' to get started.",
            name
        ),
        Reply::Menu => "Proddy menu\n\n\
             - Focus mode: type 'focus'\n\
             - Tasks: type 'tasks'\n\
             - Goals: type 'goals'\n\
             - Statistics: type 'stats'\n\n\
             Or just tell me what you need."
            .to_string(),
        Reply::Help {
            work_minutes,
            break_minutes,
        } => help(*work_minutes, *break_minutes),
        Reply::Focus {
            status,
            work_minutes,
            break_minutes,
        } => focus_status(status, *work_minutes, *break_minutes),
        Reply::WorkStarted(started) => {
            let mut out = String::new();
            if started.superseded.is_some() {
                out.push_str("[info] Previous session interrupted\n");
            }
            let _ = write!(
                out,
                "[ok] Focus session started\n{} of focus, ends at {}.\n\nStay on it!",
                format::minutes(started.session.duration_minutes),
                started.session.planned_end().format("%H:%M UTC")
            );
            out
        }
        Reply::Stopped(StopOutcome::Interrupted(session)) => format!(
            "[ok] Focus session stopped after {} of {}.\n\nStart again whenever you are ready.",
            format::minutes(session.elapsed_minutes()),
            format::minutes(session.duration_minutes)
        ),
        Reply::Stopped(StopOutcome::BreakEnded) => "[ok] Break ended early.".to_string(),
        Reply::Stopped(StopOutcome::NothingActive) => {
            "[info] Nothing to stop. Start a session with 'start focus'.".to_string()
        }
        Reply::BreakStarted(started) => {
            let mut out = String::new();
            if started.superseded.is_some() {
                out.push_str("[info] Focus session interrupted\n");
            }
            let _ = write!(
                out,
                "[ok] Break time: {}.\n\nStretch, get some water, look away from the screen.",
                format::minutes(started.minutes)
            );
            out
        }

        Reply::TaskOverview(summary) => task_overview(summary),
        Reply::Tasks(tasks) => task_list(tasks),
        Reply::TaskAdded(task) => format!(
            "[ok] Task added: \"{}\"\n\nType 'list tasks' to see them all.",
            format::truncate(&task.text, TEXT_WIDTH)
        ),
        Reply::TaskCompleted(task) => format!("[ok] Task done: \"{}\"\n\nNice work!", task.text),
        Reply::TaskDeleted(task) => format!("[ok] Task deleted: \"{}\"", task.text),
        Reply::TaskMissing => "[info] That task no longer exists.".to_string(),

        Reply::GoalOverview(summary) => goal_overview(summary),
        Reply::Goals(goals) => goal_list(goals),
        Reply::GoalAdded(goal) => format!(
            "[ok] Goal added: \"{}\" (due {})\n\nType 'list goals' to see them all.",
            goal.title,
            format::date(goal.deadline)
        ),
        Reply::GoalDeleted(goal) => format!("[ok] Goal deleted: \"{}\"", goal.title),
        Reply::GoalProgress(goal) => format!(
            "[ok] {}\n{} {}%",
            goal.title,
            format::progress_bar(goal.progress, BAR_WIDTH),
            goal.progress
        ),
        Reply::GoalCompleted(goal) => format!("[ok] Goal achieved: \"{}\"\n\nWell done!", goal.title),
        Reply::StepAdded(goal) => format!(
            "[ok] Step added to \"{}\" ({} steps)",
            goal.title,
            goal.steps.len()
        ),
        Reply::StepCompleted(goal) => format!(
            "[ok] Step done. \"{}\" is at {}%",
            goal.title, goal.progress
        ),

        Reply::Stats(report) => stats(report),
        Reply::Usage(usage) => format!("[error] Which one? For example: '{}'", usage.example()),
        Reply::Rejected(error) => rejection(error),
        Reply::Unknown => {
            "Not sure what you mean. Type 'menu' to see what I can do, or 'help' for commands.".to_string()
        }
    }
}

/// Render an engine notification as chat text
pub fn notification_text(notification: &Notification) -> String {
    match notification {
        Notification::WorkCompleted { session, stats, .. } => format!(
            "[ok] Focus session complete: {}\n\
             Sessions today: {}\n\n\
             Great work! Want to take a break? Type 'break'.",
            format::minutes(session.duration_minutes),
            stats.completed_today
        ),
        Notification::BreakCompleted { .. } => {
            "[ok] Break is over.\n\nReady for another focus session? Type 'start focus'.".to_string()
        }
    }
}

fn rejection(error: &ProddyError) -> String {
    match error {
        ProddyError::Storage(_) => format!("[error] Something went wrong on my side: {}. Please try again.", error),
        _ => format!("[error] {}", error),
    }
}

fn help(work_minutes: u32, break_minutes: u32) -> String {
    format!(
        "Commands\n\n\
         Focus timer:\n\
         - 'start focus': begin a session ({})\n\
         - 'stop': end the current session or break\n\
         - 'break': start a break ({})\n\n\
         Tasks:\n\
         - 'add task <description>'\n\
         - 'list tasks'\n\
         - 'complete task 1'\n\
         - 'delete task 1'\n\n\
         Goals:\n\
         - 'add goal <title>'\n\
         - 'list goals'\n\
         - 'goal progress 1 50'\n\
         - 'complete goal 1', 'delete goal 1'\n\
         - 'add step 1 <description>', 'complete step 1 2'",
        format::minutes(work_minutes),
        format::minutes(break_minutes)
    )
}

fn focus_status(status: &FocusStatus, work_minutes: u32, break_minutes: u32) -> String {
    let state = match (&status.state, status.remaining) {
        (FocusState::Idle, _) => "idle".to_string(),
        (FocusState::Working { .. }, Some(left)) => format!("working, {} left", format::remaining(left)),
        (FocusState::OnBreak, Some(left)) => format!("on a break, {} left", format::remaining(left)),
        // The completion could not be recorded and no timer is left
        (FocusState::Working { .. }, None) => {
            "working, timer lost: type 'stop' or 'start focus' to restart".to_string()
        }
        (FocusState::OnBreak, None) => "on a break".to_string(),
    };
    let stats = &status.stats;

    format!(
        "Focus mode (Pomodoro)\n\n\
         - Status: {}\n\
         - Total sessions: {}\n\
         - Completed today: {}\n\
         - Total focus time: {}\n\n\
         Type 'start focus' ({}), 'stop', or 'break' ({}).",
        state,
        stats.total_sessions,
        stats.completed_today,
        format::minutes(stats.total_focus_minutes),
        format::minutes(work_minutes),
        format::minutes(break_minutes)
    )
}

fn task_overview(summary: &TaskSummary) -> String {
    format!(
        "Tasks\n\n\
         - Total: {}\n\
         - Done: {}\n\
         - Remaining: {}\n\n\
         Type 'add task <description>' or 'list tasks'.",
        summary.total, summary.completed, summary.remaining
    )
}

fn priority_mark(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "!!",
        Priority::Medium => "!",
        Priority::Low => "",
    }
}

fn task_list(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return "You have no tasks yet.\n\nAdd one with 'add task <description>'.".to_string();
    }

    let mut out = String::from("Your tasks:\n\n");
    for (i, task) in tasks.iter().enumerate() {
        let check = if task.completed { "[x]" } else { "[ ]" };
        let _ = write!(
            out,
            "{} {}. {}{}",
            check,
            i + 1,
            format::truncate(&task.text, TEXT_WIDTH),
            priority_mark(task.priority)
        );
        if let Some(deadline) = task.deadline {
            let _ = write!(out, " (due {})", format::date(deadline));
        }
        out.push('\n');
    }
    out.push_str("\nType 'complete task 1' or 'delete task 1'.");
    out
}

fn goal_overview(summary: &GoalSummary) -> String {
    format!(
        "Goals\n\n\
         - Total: {}\n\
         - Achieved: {}\n\
         - In progress: {}\n\
         - Not started: {}\n\n\
         Type 'add goal <title>', 'list goals' or 'goal progress 1 50'.",
        summary.total, summary.completed, summary.in_progress, summary.fresh
    )
}

fn goal_list(goals: &[Goal]) -> String {
    if goals.is_empty() {
        return "You have no goals yet.\n\nAdd one with 'add goal <title>'.".to_string();
    }

    let mut out = String::from("Your goals:\n\n");
    for (i, goal) in goals.iter().enumerate() {
        let mark = if goal.completed { "[x]" } else { "[ ]" };
        let _ = writeln!(out, "{} {}. {}", mark, i + 1, format::truncate(&goal.title, TEXT_WIDTH));
        let _ = writeln!(
            out,
            "    {} {}%  due {}",
            format::progress_bar(goal.progress, BAR_WIDTH),
            goal.progress,
            format::date(goal.deadline)
        );
        for (j, step) in goal.steps.iter().enumerate() {
            let check = if step.completed { "x" } else { " " };
            let _ = writeln!(out, "    [{}] {}.{} {}", check, i + 1, j + 1, step.text);
        }
    }
    out
}

fn stats(report: &StatsReport) -> String {
    let focus = &report.focus;
    let tasks = &report.tasks;
    let done_share = if tasks.total > 0 {
        tasks.completed * 100 / tasks.total
    } else {
        0
    };

    format!(
        "Productivity stats\n\n\
         Focus:\n\
         - Pomodoro sessions: {}\n\
         - Today: {}\n\
         - Focus time: {}\n\
         - Current streak: {} day(s)\n\n\
         Tasks:\n\
         - Total: {}\n\
         - Done: {} ({}%)\n\n\
         Goals:\n\
         - Active: {}\n\
         - Achieved: {}\n\n\
         Keep it up!",
        focus.total_sessions,
        focus.completed_today,
        format::minutes(focus.total_focus_minutes),
        focus.current_streak_days,
        tasks.total,
        tasks.completed,
        done_share,
        report.goals.total - report.goals.completed,
        report.goals.completed
    )
}
