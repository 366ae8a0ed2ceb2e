//! Core domain logic for the weekly planner.
//! This crate is the single source of truth for planner invariants.

pub mod config;
pub mod db;
pub mod export;
pub mod grid;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, PlannerConfig};
pub use export::{
    build_workbook, export_week_image, ExportError, ImageLayout, Sheet, Workbook,
    XlsxWorkbookWriter,
};
pub use grid::text::{render_text, TextGridOptions};
pub use grid::{render_week, CellState, GridRenderer, TaskBlock, WeekGrid};
pub use logging::{default_log_level, init_logging, logging_status, LogSettings, LoggingError};
pub use model::habit::{normalize_habits, Habit, HABIT_ROWS};
pub use model::task::{Slot, Task, TaskColor, TaskId, TaskKey, TaskValidationError};
pub use model::week::{week_key_for_date_str, week_key_of, WeekKey, WeekKeyError, DAY_NAMES};
pub use repo::kv_repo::{KeyValueStore, MemoryKvStore, RepoError, RepoResult, SqliteKvStore};
pub use service::planner_session::{
    ConfirmDelete, DeleteDecision, DeleteOutcome, HabitForm, PlannerSession, SessionError,
    TaskForm,
};
pub use service::planner_store::{
    load_all, PlannerData, PlannerStore, StoreError, StoreResult, GOAL_PLACEHOLDER,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
