//! FFI use-case API for the planner UI host.
//!
//! # Responsibility
//! - Expose planner use-cases to the UI through FRB sync calls.
//! - Translate core errors into response envelopes with readable messages.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Every call opens the configured database, applies one use-case and
//!   drops the connection; no state survives between calls.
//! - Deletion is executed only when the host reports a confirmed prompt.

use log::warn;
use std::path::PathBuf;
use std::sync::OnceLock;
use weekplan_core::db::open_db;
use weekplan_core::{
    build_workbook, core_version as core_version_inner, export_week_image,
    init_logging as init_logging_inner, render_week, week_key_for_date_str, Habit, ImageLayout,
    PlannerConfig, PlannerStore, Slot, SqliteKvStore, Task, TaskColor, TaskValidationError,
    WeekKey, XlsxWorkbookWriter,
};

static DB_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Expose core crate version through FFI.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes core logging once per process.
///
/// Returns an empty string on success and the error message otherwise.
/// Repeating the call with the same `level + log_dir` is a no-op.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// One visible task block of the week grid.
#[derive(Debug, Clone, PartialEq)]
pub struct GridBlockItem {
    pub task_id: String,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    /// Rows covered after clipping at 23:30.
    pub span: u32,
    pub height_px: u32,
    pub text: String,
    /// `#RRGGBB`.
    pub color: String,
}

/// One habit row; `days` is Sunday-first with seven entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HabitRowItem {
    pub name: String,
    pub days: Vec<bool>,
}

/// Everything the host needs to draw one week.
#[derive(Debug, Clone, PartialEq)]
pub struct WeekViewResponse {
    pub ok: bool,
    pub message: String,
    pub week_key: String,
    pub week_label: String,
    pub goal: String,
    pub blocks: Vec<GridBlockItem>,
    pub habits: Vec<HabitRowItem>,
}

impl WeekViewResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
            week_key: String::new(),
            week_label: String::new(),
            goal: String::new(),
            blocks: Vec::new(),
            habits: Vec::new(),
        }
    }
}

/// Generic mutation response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannerActionResponse {
    pub ok: bool,
    /// Set by task creation.
    pub task_id: Option<String>,
    pub message: String,
}

impl PlannerActionResponse {
    fn success(message: impl Into<String>, task_id: Option<String>) -> Self {
        Self {
            ok: true,
            task_id,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            task_id: None,
            message: message.into(),
        }
    }
}

/// Export response with the written file paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportResponse {
    pub ok: bool,
    pub paths: Vec<String>,
    pub message: String,
}

/// Returns the week key (`yyyy-mm-dd` Sunday) for any `yyyy-mm-dd` date,
/// or an empty string for unparseable input.
#[flutter_rust_bridge::frb(sync)]
pub fn week_key_for(date: String) -> String {
    week_key_for_date_str(&date)
        .map(|week| week.to_string())
        .unwrap_or_default()
}

/// Loads the week containing `date`: grid blocks, goal and habit rows.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn planner_week_view(date: String) -> WeekViewResponse {
    let week = match week_key_for_date_str(&date) {
        Ok(week) => week,
        Err(err) => return WeekViewResponse::failure(format!("planner_week_view failed: {err}")),
    };

    let result = with_store(|store| {
        let grid = render_week(week, store.tasks(week));
        let blocks = grid
            .visible_blocks()
            .filter_map(|block| {
                let slot = block.start_slot()?;
                Some(GridBlockItem {
                    task_id: block.task_id.to_string(),
                    day: slot.day,
                    hour: slot.hour,
                    minute: slot.minute,
                    span: block.span as u32,
                    height_px: block.height_px(),
                    text: block.text.clone(),
                    color: block.color.hex().to_string(),
                })
            })
            .collect();
        let habits = store
            .habits(week)
            .into_iter()
            .map(|habit| HabitRowItem {
                name: habit.name,
                days: habit.days.to_vec(),
            })
            .collect();

        Ok(WeekViewResponse {
            ok: true,
            message: String::new(),
            week_key: week.to_string(),
            week_label: week.range_label(),
            goal: store.goal_or_placeholder(week).to_string(),
            blocks,
            habits,
        })
    });

    result.unwrap_or_else(|err| WeekViewResponse::failure(format!("planner_week_view failed: {err}")))
}

/// Adds a task at (`day`, `hour`, `minute`) of the week containing `date`.
///
/// `duration` is the raw hours input; an empty duration or text yields the
/// single "Please fill in all fields." message. `color` accepts a palette hex
/// value or swatch name; blank selects the default color.
#[flutter_rust_bridge::frb(sync)]
pub fn planner_add_task(
    date: String,
    day: u8,
    hour: u8,
    minute: u8,
    duration: String,
    text: String,
    color: String,
) -> PlannerActionResponse {
    let prepared = week_key_for_date_str(&date)
        .map_err(|err| err.to_string())
        .and_then(|week| {
            let task = build_task(day, hour, minute, &duration, &text, &color)?;
            Ok((week, task))
        });
    let (week, task) = match prepared {
        Ok(prepared) => prepared,
        Err(message) => return PlannerActionResponse::failure(message),
    };

    match with_store(|store| store.add_task(week, task).map_err(|err| err.to_string())) {
        Ok(id) => PlannerActionResponse::success("Task added.", Some(id.to_string())),
        Err(message) => PlannerActionResponse::failure(message),
    }
}

/// Deletes one task by ID once the host's confirmation prompt was accepted.
///
/// `confirmed = false` leaves storage untouched and reports success.
#[flutter_rust_bridge::frb(sync)]
pub fn planner_delete_task(date: String, task_id: String, confirmed: bool) -> PlannerActionResponse {
    if !confirmed {
        return PlannerActionResponse::success("Delete cancelled.", None);
    }
    let week = match week_key_for_date_str(&date) {
        Ok(week) => week,
        Err(err) => return PlannerActionResponse::failure(err.to_string()),
    };
    let id = match uuid::Uuid::parse_str(task_id.trim()) {
        Ok(id) => id,
        Err(_) => return PlannerActionResponse::failure(format!("invalid task id `{task_id}`")),
    };

    match with_store(|store| store.remove_task(week, id).map_err(|err| err.to_string())) {
        Ok(_) => PlannerActionResponse::success("Task deleted.", None),
        Err(message) => PlannerActionResponse::failure(message),
    }
}

/// Stores the weekly goal of the week containing `date`.
#[flutter_rust_bridge::frb(sync)]
pub fn planner_set_goal(date: String, goal: String) -> PlannerActionResponse {
    let week = match week_key_for_date_str(&date) {
        Ok(week) => week,
        Err(err) => return PlannerActionResponse::failure(err.to_string()),
    };
    match with_store(|store| store.set_goal(week, goal).map_err(|err| err.to_string())) {
        Ok(()) => PlannerActionResponse::success("Goal saved.", None),
        Err(message) => PlannerActionResponse::failure(message),
    }
}

/// Saves the habit rows collected from the host form.
///
/// Rows beyond five are dropped, missing rows are blank.
#[flutter_rust_bridge::frb(sync)]
pub fn planner_save_habits(date: String, rows: Vec<HabitRowItem>) -> PlannerActionResponse {
    let week = match week_key_for_date_str(&date) {
        Ok(week) => week,
        Err(err) => return PlannerActionResponse::failure(err.to_string()),
    };
    let habits: Vec<Habit> = rows.into_iter().map(habit_from_row).collect();
    match with_store(|store| store.set_habits(week, habits).map_err(|err| err.to_string())) {
        Ok(()) => PlannerActionResponse::success("Habits saved.", None),
        Err(message) => PlannerActionResponse::failure(message),
    }
}

/// Writes the schedule/habits workbook of the week into `out_dir` as one `.xlsx` file.
#[flutter_rust_bridge::frb(sync)]
pub fn planner_export_spreadsheet(date: String, out_dir: String) -> ExportResponse {
    export_with(&date, |store, week| {
        let workbook = build_workbook(week, store.tasks(week), &store.habits(week));
        XlsxWorkbookWriter::new(&out_dir)
            .write(&workbook)
            .map(|path| vec![path])
            .map_err(|err| err.to_string())
    })
}

/// Writes the PNG raster of the week grid into `out_dir`.
#[flutter_rust_bridge::frb(sync)]
pub fn planner_export_image(date: String, out_dir: String) -> ExportResponse {
    export_with(&date, |store, week| {
        let grid = render_week(week, store.tasks(week));
        export_week_image(&grid, &out_dir, ImageLayout::default())
            .map(|path| vec![path])
            .map_err(|err| err.to_string())
    })
}

type Store<'conn> = PlannerStore<SqliteKvStore<'conn>>;

fn export_with(
    date: &str,
    f: impl FnOnce(&Store<'_>, WeekKey) -> Result<Vec<PathBuf>, String>,
) -> ExportResponse {
    let result = week_key_for_date_str(date)
        .map_err(|err| err.to_string())
        .and_then(|week| with_store(|store| f(&*store, week)));
    match result {
        Ok(paths) => ExportResponse {
            ok: true,
            message: format!("Exported {} file(s).", paths.len()),
            paths: paths
                .into_iter()
                .map(|path| path.display().to_string())
                .collect(),
        },
        Err(message) => {
            warn!("event=ffi_export module=ffi status=error");
            ExportResponse {
                ok: false,
                paths: Vec::new(),
                message: format!("export failed: {message}"),
            }
        }
    }
}

fn build_task(
    day: u8,
    hour: u8,
    minute: u8,
    duration: &str,
    text: &str,
    color: &str,
) -> Result<Task, String> {
    let duration = duration.trim();
    if duration.is_empty() || text.trim().is_empty() {
        return Err(TaskValidationError::MissingFields.to_string());
    }
    let hours = duration
        .parse::<f64>()
        .map_err(|_| TaskValidationError::MissingFields.to_string())?;
    let color = if color.trim().is_empty() {
        TaskColor::Default
    } else {
        TaskColor::parse(color).ok_or_else(|| format!("unknown color `{color}`"))?
    };
    let slot = Slot::new(day, hour, minute).map_err(|err| err.to_string())?;
    Task::new(slot, hours, text, color).map_err(|err| err.to_string())
}

fn habit_from_row(row: HabitRowItem) -> Habit {
    let mut days = [false; 7];
    for (slot, value) in days.iter_mut().zip(row.days) {
        *slot = value;
    }
    Habit::new(row.name, days)
}

fn resolve_db_path() -> PathBuf {
    DB_PATH
        .get_or_init(|| match PlannerConfig::from_env() {
            Ok(config) => config.db_path,
            Err(err) => {
                warn!("event=ffi_config module=ffi status=error error={err}");
                PlannerConfig::default().db_path
            }
        })
        .clone()
}

fn with_store<T>(f: impl FnOnce(&mut Store<'_>) -> Result<T, String>) -> Result<T, String> {
    let conn = open_db(resolve_db_path()).map_err(|err| format!("planner DB open failed: {err}"))?;
    let mut store = PlannerStore::open(SqliteKvStore::new(&conn));
    f(&mut store)
}

#[cfg(test)]
mod tests {
    use super::{
        core_version, init_logging, planner_add_task, planner_delete_task,
        planner_export_image, planner_export_spreadsheet, planner_save_habits, planner_set_goal,
        planner_week_view, week_key_for, HabitRowItem,
    };
    use std::time::{SystemTime, UNIX_EPOCH};

    // Each test writes into its own far-future week of the shared entry DB.
    fn unique_date() -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_nanos();
        let offset_days = (nanos % 3_000_000) as i64;
        let base = chrono::NaiveDate::from_ymd_opt(3000, 1, 1).expect("valid base date");
        (base + chrono::Duration::days(offset_days * 7))
            .format("%Y-%m-%d")
            .to_string()
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_bad_input() {
        assert!(!init_logging("info".to_string(), String::new()).is_empty());
        assert!(!init_logging("verbose".to_string(), "tmp/logs".to_string()).is_empty());
    }

    #[test]
    fn week_key_for_handles_valid_and_invalid_dates() {
        assert_eq!(week_key_for("2024-03-13".to_string()), "2024-03-10");
        assert_eq!(week_key_for("soon".to_string()), "");
    }

    #[test]
    fn added_task_shows_up_in_week_view_and_can_be_deleted() {
        let date = unique_date();
        let added = planner_add_task(
            date.clone(),
            1,
            9,
            0,
            "1".to_string(),
            "ffi standup".to_string(),
            "#BAE1FF".to_string(),
        );
        assert!(added.ok, "{}", added.message);
        let task_id = added.task_id.expect("task id");

        let view = planner_week_view(date.clone());
        assert!(view.ok, "{}", view.message);
        let block = view
            .blocks
            .iter()
            .find(|block| block.task_id == task_id)
            .expect("block for new task");
        assert_eq!((block.day, block.hour, block.minute), (1, 9, 0));
        assert_eq!(block.span, 2);
        assert_eq!(block.height_px, 28);
        assert_eq!(block.color, "#BAE1FF");

        let cancelled = planner_delete_task(date.clone(), task_id.clone(), false);
        assert!(cancelled.ok);
        assert!(planner_week_view(date.clone())
            .blocks
            .iter()
            .any(|block| block.task_id == task_id));

        let deleted = planner_delete_task(date.clone(), task_id.clone(), true);
        assert!(deleted.ok, "{}", deleted.message);
        assert!(planner_week_view(date)
            .blocks
            .iter()
            .all(|block| block.task_id != task_id));
    }

    #[test]
    fn add_task_requires_duration_and_text() {
        let response = planner_add_task(
            unique_date(),
            0,
            8,
            0,
            " ".to_string(),
            "no duration".to_string(),
            String::new(),
        );
        assert!(!response.ok);
        assert_eq!(response.message, "Please fill in all fields.");
    }

    #[test]
    fn goal_and_habits_round_trip() {
        let date = unique_date();
        assert!(planner_set_goal(date.clone(), "ffi goal".to_string()).ok);
        let saved = planner_save_habits(
            date.clone(),
            vec![HabitRowItem {
                name: "stretch".to_string(),
                days: vec![true, true],
            }],
        );
        assert!(saved.ok, "{}", saved.message);

        let view = planner_week_view(date);
        assert_eq!(view.goal, "ffi goal");
        assert_eq!(view.habits.len(), 5);
        assert_eq!(view.habits[0].name, "stretch");
        assert_eq!(view.habits[0].days, vec![true, true, false, false, false, false, false]);
    }

    #[test]
    fn exports_write_files() {
        let date = unique_date();
        let dir = tempfile::tempdir().expect("temp dir");
        let out_dir = dir.path().to_str().expect("utf-8 path").to_string();

        let sheets = planner_export_spreadsheet(date.clone(), out_dir.clone());
        assert!(sheets.ok, "{}", sheets.message);
        assert_eq!(sheets.paths.len(), 1);
        assert!(sheets.paths[0].ends_with(".xlsx"));

        let image = planner_export_image(date, out_dir);
        assert!(image.ok, "{}", image.message);
        assert!(image.paths[0].ends_with(".png"));
    }
}
