//! Planner domain model.
//!
//! # Responsibility
//! - Define the week key, task, palette and habit types shared by the store,
//!   renderer and exporters.
//!
//! # Invariants
//! - All weekly data is partitioned by [`week::WeekKey`].
//! - Tasks carry a stable [`task::TaskId`]; the legacy field tuple is kept
//!   only for compatibility deletion.

pub mod habit;
pub mod task;
pub mod week;
