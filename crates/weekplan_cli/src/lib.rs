//! Terminal front end for the weekly planner.
//!
//! # Responsibility
//! - Parse command-line arguments into one planner action.
//! - Drive a [`PlannerSession`] over the SQLite-backed store and print the
//!   outcome.
//!
//! # Invariants
//! - Every invocation opens the database, performs one action and exits.
//! - Deletion asks on the input stream unless `--yes` is given.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::str::FromStr;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{info, warn};
use serde::Serialize;
use uuid::Uuid;
use weekplan_core::db::{open_db, DbError};
use weekplan_core::{
    build_workbook, export_week_image, init_logging, render_text, ConfigError, DeleteDecision,
    DeleteOutcome, ExportError, Habit, ImageLayout, KeyValueStore, LoggingError, PlannerConfig,
    PlannerSession, PlannerStore, SessionError, Slot, SqliteKvStore, Task, TaskColor, TaskForm,
    TaskKey, TextGridOptions, WeekKey, XlsxWorkbookWriter, DAY_NAMES,
};

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug)]
pub enum CliError {
    Config(ConfigError),
    Logging(LoggingError),
    Db(DbError),
    Session(SessionError),
    Export(ExportError),
    Io(std::io::Error),
    Serialize(serde_json::Error),
    InvalidArgument(String),
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "config error: {err}"),
            Self::Logging(err) => write!(f, "logging error: {err}"),
            Self::Db(err) => write!(f, "database error: {err}"),
            Self::Session(err) => write!(f, "{err}"),
            Self::Export(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "io error: {err}"),
            Self::Serialize(err) => write!(f, "serialization error: {err}"),
            Self::InvalidArgument(message) => write!(f, "{message}"),
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Logging(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Session(err) => Some(err),
            Self::Export(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Serialize(err) => Some(err),
            Self::InvalidArgument(_) => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<LoggingError> for CliError {
    fn from(value: LoggingError) -> Self {
        Self::Logging(value)
    }
}

impl From<DbError> for CliError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<SessionError> for CliError {
    fn from(value: SessionError) -> Self {
        Self::Session(value)
    }
}

impl From<ExportError> for CliError {
    fn from(value: ExportError) -> Self {
        Self::Export(value)
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialize(value)
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Weekly planner in the terminal", long_about = None)]
pub struct Cli {
    /// Planner database (overrides WEEKPLAN_DB_PATH)
    #[arg(long)]
    pub db: Option<PathBuf>,
    /// Any date inside the week to work on; defaults to today
    #[arg(long)]
    pub date: Option<NaiveDate>,
    /// Weeks to move from `--date`, negative for the past
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    pub week: i64,
    /// Absolute log directory (overrides WEEKPLAN_LOG_DIR)
    #[arg(long)]
    pub log_dir: Option<PathBuf>,
    /// Log level (overrides WEEKPLAN_LOG_LEVEL)
    #[arg(long)]
    pub log_level: Option<String>,
    /// Output format of `show`
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the week grid, goal and habits
    Show(ShowArgs),
    /// Add a task at a day and time
    Add(AddArgs),
    /// Delete a task by id, by position, or by day/time/text
    Remove(RemoveArgs),
    /// Print the weekly goal, or replace it when TEXT is given
    Goal(GoalArgs),
    /// Edit one of the five habit rows
    Habits(HabitArgs),
    /// Write the week as an .xlsx workbook and/or a PNG image
    Export(ExportArgs),
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Keep empty rows in the grid
    #[arg(long)]
    pub full: bool,
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Day name (`mon`, `tuesday`) or index 0-6 starting on Sunday
    #[arg(long)]
    pub day: DayArg,
    /// Start time as HH:MM on a half hour
    #[arg(long)]
    pub at: ClockTime,
    /// Duration in hours, e.g. 1.5
    #[arg(long)]
    pub hours: String,
    #[arg(long)]
    pub text: String,
    /// Swatch name or #RRGGBB
    #[arg(long)]
    pub color: Option<String>,
}

#[derive(Args, Debug)]
pub struct RemoveArgs {
    #[arg(long, conflicts_with_all = ["day", "at", "text"])]
    pub id: Option<Uuid>,
    #[arg(long, requires = "at")]
    pub day: Option<DayArg>,
    #[arg(long, requires = "day")]
    pub at: Option<ClockTime>,
    /// Remove every task at day/time with exactly this text
    #[arg(long, requires = "day")]
    pub text: Option<String>,
    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(Args, Debug)]
pub struct GoalArgs {
    pub text: Option<String>,
}

#[derive(Args, Debug)]
pub struct HabitArgs {
    /// Row number 1-5
    pub row: usize,
    #[arg(long)]
    pub name: Option<String>,
    /// Days to mark done
    #[arg(long, value_delimiter = ',')]
    pub check: Vec<DayArg>,
    /// Days to clear
    #[arg(long, value_delimiter = ',')]
    pub uncheck: Vec<DayArg>,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Target directory
    #[arg(long)]
    pub out: PathBuf,
    /// Only the PNG image
    #[arg(long, conflicts_with = "sheets")]
    pub image: bool,
    /// Only the .xlsx workbook
    #[arg(long)]
    pub sheets: bool,
}

/// Day of week, 0 = Sunday.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayArg(pub u8);

impl FromStr for DayArg {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        let value = value.trim();
        if let Ok(index) = value.parse::<u8>() {
            return if usize::from(index) < DAY_NAMES.len() {
                Ok(Self(index))
            } else {
                Err(format!("day index must be 0-6, got {index}"))
            };
        }
        if value.len() >= 3 {
            let lower = value.to_ascii_lowercase();
            if let Some(index) = DAY_NAMES
                .iter()
                .position(|name| name.to_ascii_lowercase().starts_with(&lower))
            {
                return Ok(Self(index as u8));
            }
        }
        Err(format!("unknown day `{value}`"))
    }
}

/// `HH:MM` wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockTime {
    pub hour: u8,
    pub minute: u8,
}

impl FromStr for ClockTime {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        let (hour, minute) = value
            .trim()
            .split_once(':')
            .ok_or_else(|| format!("expected HH:MM, got `{value}`"))?;
        let hour = hour
            .parse::<u8>()
            .map_err(|_| format!("invalid hour in `{value}`"))?;
        let minute = minute
            .parse::<u8>()
            .map_err(|_| format!("invalid minute in `{value}`"))?;
        Ok(Self { hour, minute })
    }
}

fn slot_of(day: DayArg, at: ClockTime) -> Result<Slot> {
    Slot::new(day.0, at.hour, at.minute)
        .map_err(|err| CliError::InvalidArgument(err.to_string()))
}

/// Entry point used by `main`: resolves configuration from the environment
/// and talks to the terminal.
pub fn run(cli: Cli) -> Result<()> {
    let config = PlannerConfig::from_env()?;
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    execute(cli, config, &mut stdin.lock(), &mut stdout.lock())
}

/// Runs one command with explicit configuration and streams.
pub fn execute(
    cli: Cli,
    mut config: PlannerConfig,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<()> {
    if let Some(db) = cli.db.clone() {
        config.db_path = db;
    }
    if let Some(dir) = cli.log_dir.clone() {
        config.log_dir = Some(dir);
    }
    if let Some(level) = cli.log_level.clone() {
        config.log_level = level;
    }
    if let Some(dir) = &config.log_dir {
        init_logging(&config.log_level, &dir.to_string_lossy())?;
    }

    let today = cli
        .date
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let conn = open_db(&config.db_path)?;
    let store = PlannerStore::open(SqliteKvStore::new(&conn));
    let mut session = PlannerSession::new(store, today);
    if cli.week != 0 {
        session.change_week(cli.week);
    }

    match cli.command {
        Commands::Show(args) => show(&session, &args, cli.format, out),
        Commands::Add(args) => add(&mut session, args, out),
        Commands::Remove(args) => remove(&mut session, args, input, out),
        Commands::Goal(args) => goal(&mut session, args, out),
        Commands::Habits(args) => habit(&mut session, args, out),
        Commands::Export(args) => export(&session, &args, out),
    }
}

#[derive(Serialize)]
struct WeekView<'a> {
    week: WeekKey,
    label: String,
    goal: Option<&'a str>,
    tasks: &'a [Task],
    habits: Vec<Habit>,
}

fn show<S: KeyValueStore>(
    session: &PlannerSession<S>,
    args: &ShowArgs,
    format: OutputFormat,
    out: &mut impl Write,
) -> Result<()> {
    let week = session.week();
    if format == OutputFormat::Json {
        let view = WeekView {
            week,
            label: session.week_label(),
            goal: session.store().goal(week),
            tasks: session.store().tasks(week),
            habits: session.store().habits(week),
        };
        serde_json::to_writer_pretty(&mut *out, &view)?;
        writeln!(out)?;
        return Ok(());
    }

    let options = TextGridOptions {
        compact: !args.full,
    };
    write!(out, "{}", render_text(session.grid(), options))?;
    let skipped = session.grid().skipped();
    if skipped > 0 {
        writeln!(out, "({skipped} task(s) outside the grid not shown)")?;
    }
    writeln!(out)?;
    writeln!(out, "Goal: {}", session.goal_text())?;
    writeln!(out)?;
    write_habits(session.habit_form().rows(), out)?;
    Ok(())
}

fn write_habits(rows: &[Habit], out: &mut impl Write) -> Result<()> {
    let header: String = DAY_NAMES.iter().map(|name| &name[..2]).collect::<Vec<_>>().join(" ");
    writeln!(out, "Habits{:<17}{header}", "")?;
    for (index, habit) in rows.iter().enumerate() {
        let name = if habit.name.trim().is_empty() {
            "-"
        } else {
            habit.name.as_str()
        };
        let marks: Vec<&str> = habit
            .days
            .iter()
            .map(|done| if *done { "x " } else { ". " })
            .collect();
        writeln!(out, "  {}. {:<20}{}", index + 1, name, marks.join(" ").trim_end())?;
    }
    Ok(())
}

fn add<S: KeyValueStore>(
    session: &mut PlannerSession<S>,
    args: AddArgs,
    out: &mut impl Write,
) -> Result<()> {
    let color = match args.color.as_deref() {
        Some(raw) => TaskColor::parse(raw)
            .ok_or_else(|| CliError::InvalidArgument(format!("unknown color `{raw}`")))?,
        None => TaskColor::Default,
    };
    session.select_color(color);
    session.select_slot(slot_of(args.day, args.at)?);
    *session.task_form_mut() = TaskForm::new(args.hours, args.text);

    let id = session.submit_task()?;
    info!("event=cli_add module=cli status=ok week={} task_id={id}", session.week());
    writeln!(out, "added {id}")?;
    Ok(())
}

fn remove<S: KeyValueStore>(
    session: &mut PlannerSession<S>,
    args: RemoveArgs,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<()> {
    let assume_yes = args.yes;
    let mut confirm = |task: &Task| prompt_delete(task, assume_yes, input, out);

    if let Some(id) = args.id {
        let outcome = session.request_delete(id, &mut confirm)?;
        return report_outcome(&outcome, out);
    }

    let (Some(day), Some(at)) = (args.day, args.at) else {
        return Err(CliError::InvalidArgument(
            "pass --id, or --day with --at".to_string(),
        ));
    };
    let slot = slot_of(day, at)?;

    match args.text {
        Some(text) => {
            let key = TaskKey {
                slot,
                text: text.trim().to_string(),
            };
            let removed = session.request_delete_matching(&key, &mut confirm)?;
            if removed == 0 {
                writeln!(out, "kept")?;
            } else {
                writeln!(out, "removed {removed} task(s)")?;
            }
            Ok(())
        }
        None => {
            let outcome = session.request_delete_at(slot, &mut confirm)?;
            report_outcome(&outcome, out)
        }
    }
}

fn report_outcome(outcome: &DeleteOutcome, out: &mut impl Write) -> Result<()> {
    match outcome {
        DeleteOutcome::Deleted(task) => writeln!(out, "removed {}", task.id)?,
        DeleteOutcome::Kept => writeln!(out, "kept")?,
    }
    Ok(())
}

fn prompt_delete(
    task: &Task,
    assume_yes: bool,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> DeleteDecision {
    if assume_yes {
        return DeleteDecision::Confirmed;
    }

    let slot = task.slot();
    let day = DAY_NAMES.get(usize::from(slot.day)).copied().unwrap_or("?");
    let asked = write!(
        out,
        "Delete \"{}\" on {day} at {}? [y/N] ",
        task.text,
        slot.time_label()
    )
    .and_then(|_| out.flush());
    if let Err(err) = asked {
        warn!("event=delete_prompt module=cli status=error error={err}");
        return DeleteDecision::Cancelled;
    }

    let mut answer = String::new();
    match input.read_line(&mut answer) {
        Ok(_) if matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes") => {
            DeleteDecision::Confirmed
        }
        Ok(_) => DeleteDecision::Cancelled,
        Err(err) => {
            warn!("event=delete_prompt module=cli status=error error={err}");
            DeleteDecision::Cancelled
        }
    }
}

fn goal<S: KeyValueStore>(
    session: &mut PlannerSession<S>,
    args: GoalArgs,
    out: &mut impl Write,
) -> Result<()> {
    if let Some(text) = args.text {
        session.set_goal(text)?;
    }
    writeln!(out, "{}", session.goal_text())?;
    Ok(())
}

fn habit<S: KeyValueStore>(
    session: &mut PlannerSession<S>,
    args: HabitArgs,
    out: &mut impl Write,
) -> Result<()> {
    let row = args
        .row
        .checked_sub(1)
        .ok_or_else(|| CliError::InvalidArgument("habit rows are numbered from 1".to_string()))?;

    let form = session.habit_form_mut();
    if let Some(name) = args.name {
        form.set_name(row, name)?;
    }
    for day in args.check {
        form.set_day(row, usize::from(day.0), true)?;
    }
    for day in args.uncheck {
        form.set_day(row, usize::from(day.0), false)?;
    }
    session.save_habit_form()?;

    write_habits(session.habit_form().rows(), out)
}

fn export<S: KeyValueStore>(
    session: &PlannerSession<S>,
    args: &ExportArgs,
    out: &mut impl Write,
) -> Result<()> {
    let week = session.week();
    let both = !args.image && !args.sheets;
    let mut written = Vec::new();

    if args.sheets || both {
        let habits = session.store().habits(week);
        let workbook = build_workbook(week, session.store().tasks(week), &habits);
        written.push(XlsxWorkbookWriter::new(&args.out).write(&workbook)?);
    }
    if args.image || both {
        written.push(export_week_image(
            session.grid(),
            &args.out,
            ImageLayout::default(),
        )?);
    }

    for path in written {
        writeln!(out, "{}", path.display())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{execute, Cli, ClockTime, DayArg};
    use clap::Parser;
    use std::io::Cursor;
    use std::path::Path;
    use weekplan_core::PlannerConfig;

    fn run_in(db: &Path, args: &[&str], input: &str) -> String {
        let mut argv = vec![
            "weekplan".to_string(),
            "--db".to_string(),
            db.display().to_string(),
            "--date".to_string(),
            "2024-03-13".to_string(),
        ];
        argv.extend(args.iter().map(|arg| arg.to_string()));
        let cli = Cli::try_parse_from(argv).unwrap();

        let mut out = Vec::new();
        execute(
            cli,
            PlannerConfig::default(),
            &mut Cursor::new(input.as_bytes().to_vec()),
            &mut out,
        )
        .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn day_argument_accepts_names_and_indexes() {
        assert_eq!("tue".parse::<DayArg>().unwrap(), DayArg(2));
        assert_eq!("Saturday".parse::<DayArg>().unwrap(), DayArg(6));
        assert_eq!("0".parse::<DayArg>().unwrap(), DayArg(0));
        assert!("7".parse::<DayArg>().is_err());
        assert!("mo".parse::<DayArg>().is_err());
    }

    #[test]
    fn clock_time_requires_hours_and_minutes() {
        assert_eq!(
            "09:30".parse::<ClockTime>().unwrap(),
            ClockTime { hour: 9, minute: 30 }
        );
        assert!("930".parse::<ClockTime>().is_err());
    }

    #[test]
    fn added_task_shows_up_in_the_grid() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("plan.db");

        let added = run_in(
            &db,
            &["add", "--day", "mon", "--at", "09:00", "--hours", "1", "--text", "standup"],
            "",
        );
        assert!(added.starts_with("added "));

        let shown = run_in(&db, &["show"], "");
        assert!(shown.contains("Week of 2024-03-10 - 2024-03-16"));
        assert!(shown.contains("standup"));
        assert!(shown.contains("Goal: No goal set for this week."));
    }

    #[test]
    fn remove_waits_for_confirmation() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("plan.db");
        run_in(
            &db,
            &["add", "--day", "1", "--at", "10:00", "--hours", "2", "--text", "review"],
            "",
        );

        let kept = run_in(&db, &["remove", "--day", "1", "--at", "11:00"], "n\n");
        assert!(kept.ends_with("kept\n"));

        let removed = run_in(&db, &["remove", "--day", "1", "--at", "10:00"], "y\n");
        assert!(removed.contains("removed "));
        assert!(!run_in(&db, &["show"], "").contains("review"));
    }

    #[test]
    fn remove_by_text_ignores_surrounding_whitespace() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("plan.db");
        for _ in 0..2 {
            run_in(
                &db,
                &["add", "--day", "mon", "--at", "07:00", "--hours", "1", "--text", "gym"],
                "",
            );
        }

        let removed = run_in(
            &db,
            &["remove", "--day", "mon", "--at", "07:00", "--text", "  gym ", "--yes"],
            "",
        );
        assert!(removed.ends_with("removed 2 task(s)\n"), "{removed}");
        assert!(!run_in(&db, &["show"], "").contains("gym"));
    }

    #[test]
    fn goal_and_habits_persist_for_the_week_only() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("plan.db");

        assert_eq!(run_in(&db, &["goal", "finish draft"], ""), "finish draft\n");
        let habits = run_in(&db, &["habits", "2", "--name", "stretch", "--check", "sun,wed"], "");
        assert!(habits.contains("2. stretch"));

        let next_week = run_in(&db, &["--week", "1", "goal"], "");
        assert_eq!(next_week, "No goal set for this week.\n");
        let json = run_in(&db, &["--format", "json", "show"], "");
        assert!(json.contains("\"stretch\""));
        assert!(json.contains("\"2024-03-10\""));
    }

    #[test]
    fn export_writes_workbook_and_image() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("plan.db");
        let out_dir = dir.path().join("out");

        let listed = run_in(&db, &["export", "--out", out_dir.to_str().unwrap()], "");
        assert_eq!(listed.lines().count(), 2);
        assert!(out_dir.join("schedule_2024-03-10.png").exists());
        assert!(out_dir.join("schedule_2024-03-10.xlsx").exists());
    }
}
