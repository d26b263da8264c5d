pub mod dashboard;
pub mod watch;

use std::path::PathBuf;

use anyhow::Result;
use chrono::TimeZone;
use clap::{CommandFactory, Parser, Subcommand};
use dashboard::{render_dashboard, render_pause_outcome, render_status_line, render_todo, render_todos};
use tokio_util::sync::CancellationToken;
use tracing::level_filters::LevelFilter;
use watch::{detect_shutdown, watch, DEFAULT_REFRESH_INTERVAL};

use crate::{
    storage::{file_store::FileDocumentStore, DocumentStore},
    tracker::{settings::GoalKind, StudyTracker},
    utils::{
        clock::DefaultClock,
        dir::{create_application_default_path, ensure_dir},
        logging::enable_logging,
    },
};

#[derive(Parser, Debug)]
#[command(name = "Studytime", version, long_about = None)]
#[command(about = "Study stopwatch with daily and weekly goals", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, help = "Enable logging to the console")]
    log: bool,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Start the stopwatch")]
    Start,
    #[command(about = "Pause the stopwatch and record the elapsed time")]
    Pause,
    #[command(about = "Erase everything recorded today, including a running session")]
    ResetToday {
        #[arg(long, help = "Confirm erasing today's record")]
        yes: bool,
    },
    #[command(about = "Show the dashboard once")]
    Status,
    #[command(about = "Keep the dashboard open, refreshing every second")]
    Watch,
    #[command(about = "Manage the task list")]
    Todo {
        #[command(subcommand)]
        command: TodoCommand,
    },
    #[command(about = "Change study goals")]
    Goal {
        #[command(subcommand)]
        command: GoalCommand,
    },
}

#[derive(Subcommand, Debug)]
enum TodoCommand {
    #[command(about = "Add a task")]
    Add {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    #[command(about = "Mark a task as done, or as open again")]
    Toggle { id: u64 },
    #[command(about = "Remove a task")]
    Delete { id: u64 },
    #[command(about = "Remove all finished tasks")]
    ClearCompleted,
    #[command(about = "Show all tasks")]
    List,
}

#[derive(Subcommand, Debug)]
enum GoalCommand {
    #[command(about = "Daily goal in minutes, from 0 to 1440")]
    Daily {
        #[arg(allow_hyphen_values = true)]
        value: String,
    },
    #[command(about = "Weekly goal in hours, from 0 to 168")]
    Weekly {
        #[arg(allow_hyphen_values = true)]
        value: String,
    },
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let app_dir = args
        .dir
        .map_or_else(create_application_default_path, ensure_dir)?;

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(&app_dir, logging_level, args.log)?;

    let store = FileDocumentStore::new(app_dir)?;
    let mut tracker = StudyTracker::open(store, Box::new(DefaultClock));

    match args.commands {
        Commands::Watch => {
            let shutdown = CancellationToken::new();
            let mut stdout = std::io::stdout();
            let (_, result) = tokio::join!(
                detect_shutdown(shutdown.clone()),
                async {
                    let result = watch(
                        &mut tracker,
                        shutdown.clone(),
                        DEFAULT_REFRESH_INTERVAL,
                        &mut stdout,
                    )
                    .await;
                    shutdown.cancel();
                    result
                }
            );
            result
        }
        command => {
            println!("{}", process_command(&mut tracker, command)?);
            Ok(())
        }
    }
}

/// Runs a single non-interactive command and returns what should be shown to the user.
fn process_command<S: DocumentStore, Tz: TimeZone>(
    tracker: &mut StudyTracker<S, Tz>,
    command: Commands,
) -> Result<String> {
    let output = match command {
        Commands::Start => {
            let started = tracker.start();
            let status = render_status_line(&tracker.snapshot());
            if started {
                status
            } else {
                format!("Stopwatch is already running\n{status}")
            }
        }
        Commands::Pause => {
            let outcome = tracker.pause();
            format!(
                "{}\n{}",
                render_pause_outcome(&outcome),
                render_status_line(&tracker.snapshot())
            )
        }
        Commands::ResetToday { yes: false } => {
            return Err(Args::command()
                .error(
                    clap::error::ErrorKind::MissingRequiredArgument,
                    "Resetting erases today's study time. Pass --yes to confirm",
                )
                .into());
        }
        Commands::ResetToday { yes: true } => {
            tracker.reset_today();
            render_status_line(&tracker.snapshot())
        }
        Commands::Status | Commands::Watch => {
            render_dashboard(&tracker.snapshot(), &tracker.document().todos)
        }
        Commands::Todo { command } => process_todo_command(tracker, command)?,
        Commands::Goal { command } => {
            let (kind, value) = match command {
                GoalCommand::Daily { value } => (GoalKind::Daily, value),
                GoalCommand::Weekly { value } => (GoalKind::Weekly, value),
            };
            let value = tracker.set_goal(kind, &value).map_err(|e| {
                Args::command().error(clap::error::ErrorKind::ValueValidation, e.to_string())
            })?;
            format!("{kind} goal set to {value}")
        }
    };
    Ok(output)
}

fn process_todo_command<S: DocumentStore, Tz: TimeZone>(
    tracker: &mut StudyTracker<S, Tz>,
    command: TodoCommand,
) -> Result<String> {
    let output = match command {
        TodoCommand::Add { text } => match tracker.add_task(&text.join(" ")) {
            Some(todo) => render_todo(&todo),
            None => {
                return Err(Args::command()
                    .error(
                        clap::error::ErrorKind::ValueValidation,
                        "Task text can't be empty",
                    )
                    .into())
            }
        },
        TodoCommand::Toggle { id } => match tracker.toggle_task(id) {
            Some(true) => format!("Task {id} done"),
            Some(false) => format!("Task {id} reopened"),
            None => format!("No task with id {id}"),
        },
        TodoCommand::Delete { id } => {
            if tracker.delete_task(id) {
                format!("Deleted task {id}")
            } else {
                format!("No task with id {id}")
            }
        }
        TodoCommand::ClearCompleted => {
            format!("Removed {} finished tasks", tracker.clear_completed())
        }
        TodoCommand::List => render_todos(&tracker.document().todos),
    };
    Ok(output)
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::{Duration, TimeZone, Utc};
    use clap::Parser;
    use tempfile::tempdir;

    use crate::{
        storage::file_store::FileDocumentStore,
        tracker::StudyTracker,
        utils::clock::ManualClock,
    };

    use super::{process_command, Args};

    fn run(
        tracker: &mut StudyTracker<&FileDocumentStore, Utc>,
        line: &[&str],
    ) -> Result<String> {
        let args = Args::try_parse_from(std::iter::once("studytime").chain(line.iter().copied()))?;
        process_command(tracker, args.commands)
    }

    #[test]
    fn test_commands_flow() -> Result<()> {
        let dir = tempdir()?;
        let store = FileDocumentStore::new(dir.path().to_path_buf())?;
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 10, 9, 0, 0).unwrap());
        let mut tracker = StudyTracker::open_in(&store, Box::new(clock.clone()), Utc);

        run(&mut tracker, &["start"])?;
        clock.advance(Duration::minutes(25));
        assert_eq!(
            run(&mut tracker, &["pause"])?,
            "Recorded 25m00s\nPaused (today 25m00s)"
        );

        assert_eq!(
            run(&mut tracker, &["todo", "add", "read", "chapter", "4"])?,
            "   1 [ ] read chapter 4"
        );
        assert_eq!(run(&mut tracker, &["todo", "toggle", "1"])?, "Task 1 done");
        assert_eq!(
            run(&mut tracker, &["todo", "clear-completed"])?,
            "Removed 1 finished tasks"
        );
        assert_eq!(run(&mut tracker, &["todo", "list"])?, "No tasks");

        assert_eq!(run(&mut tracker, &["goal", "daily", "50"])?, "daily goal set to 50");
        assert!(run(&mut tracker, &["goal", "weekly", "many"]).is_err());
        assert_eq!(tracker.document().settings.weekly_goal_hours, 14);

        let status = run(&mut tracker, &["status"])?;
        assert!(status.contains("50%"));
        Ok(())
    }

    #[test]
    fn test_reset_today_requires_confirmation() -> Result<()> {
        let dir = tempdir()?;
        let store = FileDocumentStore::new(dir.path().to_path_buf())?;
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 10, 9, 0, 0).unwrap());
        let mut tracker = StudyTracker::open_in(&store, Box::new(clock.clone()), Utc);

        run(&mut tracker, &["start"])?;
        clock.advance(Duration::minutes(10));

        assert!(run(&mut tracker, &["reset-today"]).is_err());
        assert!(tracker.snapshot().running);

        assert_eq!(run(&mut tracker, &["reset-today", "--yes"])?, "Paused (today 0s)");
        Ok(())
    }
}
