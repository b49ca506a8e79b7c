//! Command-line front end for the planner store.
//!
//! # Responsibility
//! - Resolve configuration, open the store, and map one command onto one
//!   store operation or view query.
//! - Resolve delete confirmation up front (`--yes`); the store never prompts.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use planner_core::{
    classify_due_status, format_calendar_date, init_logging_from_config, open_store,
    parse_calendar_date, MutationOutcome, NewSubject, NewTask, PlannerConfig, PlannerStore,
    SqliteKvStore, Subject, SubjectColor, SubjectPatch, SystemClock, Task, TaskPatch,
    TaskPriority,
};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "planner", version, about = "Personal subject and task planner")]
struct Cli {
    /// Database file; overrides PLANNER_DB_PATH.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List subjects in name order.
    Subjects,
    /// List tasks, optionally filtered by due date or subject.
    Tasks(TaskFilter),
    /// List tasks due today.
    Today,
    /// Show the next incomplete task due today or later.
    Next,
    /// Show completion counts overall and per subject.
    Summary,
    AddSubject(AddSubjectArgs),
    UpdateSubject(UpdateSubjectArgs),
    DeleteSubject(DeleteArgs),
    AddTask(AddTaskArgs),
    UpdateTask(UpdateTaskArgs),
    DeleteTask(DeleteArgs),
    /// Flip the completed flag of one task.
    Toggle { id: i64 },
}

#[derive(Debug, Args)]
struct TaskFilter {
    /// Exact due date (YYYY-MM-DD).
    #[arg(long)]
    date: Option<String>,
    #[arg(long)]
    subject: Option<i64>,
}

#[derive(Debug, Args)]
struct AddSubjectArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    teacher: Option<String>,
    #[arg(long, default_value = "indigo", value_parser = parse_color)]
    color: SubjectColor,
}

#[derive(Debug, Args)]
struct UpdateSubjectArgs {
    id: i64,
    #[arg(long)]
    name: Option<String>,
    #[arg(long, conflicts_with = "clear_teacher")]
    teacher: Option<String>,
    #[arg(long)]
    clear_teacher: bool,
    #[arg(long, value_parser = parse_color)]
    color: Option<SubjectColor>,
}

#[derive(Debug, Args)]
struct AddTaskArgs {
    #[arg(long)]
    title: String,
    /// Due date (YYYY-MM-DD).
    #[arg(long)]
    due: String,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    subject: Option<i64>,
    #[arg(long, default_value = "medium", value_parser = parse_priority)]
    priority: TaskPriority,
}

#[derive(Debug, Args)]
struct UpdateTaskArgs {
    id: i64,
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    due: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long, conflicts_with = "unassign")]
    subject: Option<i64>,
    /// Remove the subject reference.
    #[arg(long)]
    unassign: bool,
    #[arg(long, value_parser = parse_priority)]
    priority: Option<TaskPriority>,
}

#[derive(Debug, Args)]
struct DeleteArgs {
    id: i64,
    /// Confirm the deletion; without it nothing is removed.
    #[arg(long)]
    yes: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match PlannerConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("planner: {err}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(db) = cli.db.clone() {
        config = config.with_db_path(db);
    }
    if let Err(err) = init_logging_from_config(&config) {
        eprintln!("planner: logging disabled: {err}");
    }

    let mut store = match open_store(&config, SystemClock) {
        Ok(store) => store,
        Err(err) => {
            eprintln!("planner: cannot open `{}`: {err}", config.db_path.display());
            return ExitCode::FAILURE;
        }
    };
    if let Some(err) = store.seed_write_error() {
        eprintln!("planner: sample data loaded but not saved: {err}");
    }

    match run(&mut store, cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("planner: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(store: &mut PlannerStore<SqliteKvStore>, command: Command) -> Result<(), String> {
    let today = store.today();
    match command {
        Command::Subjects => {
            for subject in store.subjects() {
                println!("{}", format_subject(subject));
            }
        }
        Command::Tasks(filter) => {
            let view = store.view();
            let tasks: Vec<&Task> = match (filter.date, filter.subject) {
                (Some(date), _) => {
                    let date = parse_calendar_date(&date).map_err(|err| err.to_string())?;
                    view.tasks_for_date(date)
                        .into_iter()
                        .filter(|t| filter.subject.map_or(true, |id| t.subject_id == Some(id)))
                        .collect()
                }
                (None, Some(subject_id)) => view.tasks_by_subject(subject_id),
                (None, None) => view.tasks().iter().collect(),
            };
            print_tasks(store, &tasks, today);
        }
        Command::Today => {
            let tasks = store.view().tasks_for_date(today);
            print_tasks(store, &tasks, today);
        }
        Command::Next => match store.view().next_upcoming_task(today) {
            Some(task) => println!("{}", format_task(store, task, today)),
            None => println!("No upcoming tasks."),
        },
        Command::Summary => {
            let view = store.view();
            let summary = view.completion_summary(today);
            println!(
                "total={} completed={} overdue={} due_today={} upcoming={}",
                summary.total, summary.completed, summary.overdue, summary.due_today, summary.upcoming
            );
            for (subject, progress) in view.progress_by_subject() {
                println!(
                    "{:<20} {}/{} ({}%) {}",
                    subject.name,
                    progress.completed,
                    progress.total,
                    progress.percent(),
                    subject.color.hex()
                );
            }
        }
        Command::AddSubject(args) => {
            let mut request = NewSubject::new(args.name, args.color);
            request.teacher = args.teacher;
            let subject = store.add_subject(request).map_err(|err| err.to_string())?;
            println!("Subject created: {}", format_subject(&subject));
        }
        Command::UpdateSubject(args) => {
            let patch = SubjectPatch {
                name: args.name,
                teacher: if args.clear_teacher {
                    Some(None)
                } else {
                    args.teacher.map(Some)
                },
                color: args.color,
            };
            let outcome = store
                .update_subject(args.id, &patch)
                .map_err(|err| err.to_string())?;
            report("Subject", args.id, outcome, "updated");
        }
        Command::DeleteSubject(args) => {
            let outcome = store
                .delete_subject(args.id, args.yes)
                .map_err(|err| err.to_string())?;
            report("Subject", args.id, outcome, "deleted");
        }
        Command::AddTask(args) => {
            let mut request = NewTask::new(args.title, args.due).with_priority(args.priority);
            request.description = args.description;
            request.subject_id = args.subject;
            let task = store.add_task(request).map_err(|err| err.to_string())?;
            println!("Task created: {}", format_task(store, &task, today));
        }
        Command::UpdateTask(args) => {
            let patch = TaskPatch {
                title: args.title,
                description: args.description.map(Some),
                subject_id: if args.unassign {
                    Some(None)
                } else {
                    args.subject.map(Some)
                },
                due_date: args.due,
                priority: args.priority,
                completed: None,
            };
            let outcome = store
                .update_task(args.id, &patch)
                .map_err(|err| err.to_string())?;
            report("Task", args.id, outcome, "updated");
        }
        Command::DeleteTask(args) => {
            let outcome = store
                .delete_task(args.id, args.yes)
                .map_err(|err| err.to_string())?;
            report("Task", args.id, outcome, "deleted");
        }
        Command::Toggle { id } => {
            let outcome = store
                .toggle_task_completion(id)
                .map_err(|err| err.to_string())?;
            report("Task", id, outcome, "toggled");
        }
    }
    Ok(())
}

fn report(kind: &str, id: i64, outcome: MutationOutcome, verb: &str) {
    match outcome {
        MutationOutcome::Applied => println!("{kind} {id} {verb}."),
        MutationOutcome::NotFound => println!("{kind} {id} not found; nothing changed."),
        MutationOutcome::Declined => println!("{kind} {id} kept; pass --yes to confirm."),
    }
}

fn print_tasks(store: &PlannerStore<SqliteKvStore>, tasks: &[&Task], today: NaiveDate) {
    if tasks.is_empty() {
        println!("No tasks.");
        return;
    }
    for task in tasks {
        println!("{}", format_task(store, task, today));
    }
}

fn format_subject(subject: &Subject) -> String {
    match subject.teacher.as_deref() {
        Some(teacher) => format!(
            "#{} {} ({}) [{}]",
            subject.id,
            subject.name,
            teacher,
            subject.color.as_str()
        ),
        None => format!("#{} {} [{}]", subject.id, subject.name, subject.color.as_str()),
    }
}

fn format_task(store: &PlannerStore<SqliteKvStore>, task: &Task, today: NaiveDate) -> String {
    let subject = store
        .view()
        .subject_by_id(task.subject_id)
        .map_or("-", |subject| subject.name.as_str());
    format!(
        "#{} {} due={} priority={} status={} subject={}",
        task.id,
        task.title,
        format_calendar_date(task.due_date),
        task.priority.as_str(),
        classify_due_status(task, today).as_str(),
        subject
    )
}

fn parse_color(value: &str) -> Result<SubjectColor, String> {
    SubjectColor::parse(value).ok_or_else(|| {
        let names = SubjectColor::ALL
            .iter()
            .map(|color| color.as_str())
            .collect::<Vec<_>>()
            .join("|");
        format!("unknown color `{value}`; expected {names}")
    })
}

fn parse_priority(value: &str) -> Result<TaskPriority, String> {
    TaskPriority::parse(value)
        .ok_or_else(|| format!("unknown priority `{value}`; expected low|medium|high"))
}
