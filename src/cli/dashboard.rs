use std::fmt::Write;

use chrono::Duration;

use crate::{
    tracker::{
        session::PauseOutcome,
        stats::DerivedStats,
        tasks::{TaskList, Todo},
    },
    utils::{percentage::Percentage, time::format_duration},
};

const PROGRESS_BAR_WIDTH: usize = 20;

fn progress_bar(progress: Percentage) -> String {
    let filled = *progress as usize * PROGRESS_BAR_WIDTH / 100;
    format!(
        "[{}{}]",
        "#".repeat(filled),
        "-".repeat(PROGRESS_BAR_WIDTH - filled)
    )
}

fn goal_line(name: &str, total: Duration, goal: Duration, progress: Percentage) -> String {
    format!(
        "{name:<8}{} {:>4}  {} / {}",
        progress_bar(progress),
        progress.to_string(),
        format_duration(total),
        format_duration(goal)
    )
}

pub fn render_status_line(stats: &DerivedStats) -> String {
    if stats.running {
        format!(
            "Studying for {} (today {})",
            format_duration(stats.session_elapsed),
            format_duration(stats.today_total)
        )
    } else {
        format!("Paused (today {})", format_duration(stats.today_total))
    }
}

pub fn render_pause_outcome(outcome: &PauseOutcome) -> String {
    match outcome {
        PauseOutcome::NotRunning => "Stopwatch is not running".to_string(),
        PauseOutcome::Recorded(segment) => {
            format!("Recorded {}", format_duration(segment.duration()))
        }
        PauseOutcome::Discarded => "Clock moved backwards, session discarded".to_string(),
    }
}

pub fn render_todo(todo: &Todo) -> String {
    format!(
        "{:>4} [{}] {}",
        todo.id,
        if todo.done { "x" } else { " " },
        todo.text
    )
}

pub fn render_todos(todos: &TaskList) -> String {
    if todos.is_empty() {
        return "No tasks".to_string();
    }
    todos.iter().map(render_todo).collect::<Vec<_>>().join("\n")
}

/// Full dashboard: status, goals, streak, recent days and the task list.
pub fn render_dashboard(stats: &DerivedStats, todos: &TaskList) -> String {
    let mut out = String::new();
    // Writing into a String can't fail.
    let _ = writeln!(out, "{}", render_status_line(stats));
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{}",
        goal_line("Daily", stats.today_total, stats.daily_goal, stats.daily_progress)
    );
    let _ = writeln!(
        out,
        "{}",
        goal_line(
            "Weekly",
            stats.weekly_total,
            stats.weekly_goal,
            stats.weekly_progress
        )
    );
    let _ = writeln!(
        out,
        "Streak  {} day{}",
        stats.streak_days,
        if stats.streak_days == 1 { "" } else { "s" }
    );

    let _ = writeln!(out);
    let _ = writeln!(out, "History");
    if stats.history.is_empty() {
        let _ = writeln!(out, "  nothing recorded yet");
    }
    for entry in &stats.history {
        let _ = writeln!(
            out,
            "  {:<12}{}",
            entry.label.to_string(),
            format_duration(entry.total)
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Tasks ({} open, {} done)",
        stats.open_tasks, stats.completed_tasks
    );
    let _ = writeln!(out, "{}", render_todos(todos));
    out
}
