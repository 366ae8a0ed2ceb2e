//! Interactive planner session.
//!
//! # Responsibility
//! - Own the application state a planner UI works on: active week, selected
//!   color and slot, task form and habit form.
//! - Route every mutation through [`PlannerStore`] and re-render afterwards.
//!
//! # Invariants
//! - A failed task submission leaves the form input untouched.
//! - Deletion happens only after the caller's [`ConfirmDelete`] answers
//!   [`DeleteDecision::Confirmed`].
//! - Habit form rows are a projection of stored habits; they reach the store
//!   only through [`PlannerSession::save_habit_form`].

use crate::grid::{GridRenderer, WeekGrid};
use crate::model::habit::{normalize_habits, Habit};
use crate::model::task::{Slot, Task, TaskColor, TaskId, TaskKey, TaskValidationError};
use crate::model::week::WeekKey;
use crate::repo::kv_repo::KeyValueStore;
use crate::service::planner_store::{PlannerStore, StoreError};
use chrono::{Duration, NaiveDate};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Raw add-task dialog input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskForm {
    /// Hours as typed, e.g. `1.5`.
    pub duration: String,
    pub text: String,
}

impl TaskForm {
    pub fn new(duration: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            duration: duration.into(),
            text: text.into(),
        }
    }

    pub fn clear(&mut self) {
        self.duration.clear();
        self.text.clear();
    }

    fn parse_duration(&self) -> Result<f64, TaskValidationError> {
        let raw = self.duration.trim();
        if raw.is_empty() || self.text.trim().is_empty() {
            return Err(TaskValidationError::MissingFields);
        }
        raw.parse::<f64>()
            .map_err(|_| TaskValidationError::MissingFields)
    }
}

/// Editable copy of a week's five habit rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HabitForm {
    rows: Vec<Habit>,
}

impl HabitForm {
    pub fn from_habits(habits: Vec<Habit>) -> Self {
        Self {
            rows: normalize_habits(habits),
        }
    }

    pub fn rows(&self) -> &[Habit] {
        &self.rows
    }

    pub fn set_name(&mut self, row: usize, name: impl Into<String>) -> Result<(), SessionError> {
        let habit = self
            .rows
            .get_mut(row)
            .ok_or(SessionError::InvalidHabitCell { row, day: None })?;
        habit.name = name.into();
        Ok(())
    }

    pub fn set_day(&mut self, row: usize, day: usize, checked: bool) -> Result<(), SessionError> {
        let cell = self
            .rows
            .get_mut(row)
            .and_then(|habit| habit.days.get_mut(day))
            .ok_or(SessionError::InvalidHabitCell {
                row,
                day: Some(day),
            })?;
        *cell = checked;
        Ok(())
    }
}

/// Answer of the delete confirmation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteDecision {
    Confirmed,
    Cancelled,
}

/// Synchronous confirmation capability supplied by the UI layer.
pub trait ConfirmDelete {
    fn confirm_delete(&mut self, task: &Task) -> DeleteDecision;
}

impl<F: FnMut(&Task) -> DeleteDecision> ConfirmDelete for F {
    fn confirm_delete(&mut self, task: &Task) -> DeleteDecision {
        self(task)
    }
}

/// Result of a delete request.
#[derive(Debug, Clone, PartialEq)]
pub enum DeleteOutcome {
    Deleted(Task),
    Kept,
}

/// Session-level error.
#[derive(Debug)]
pub enum SessionError {
    /// Task submitted without choosing a grid slot first.
    NoSlotSelected,
    /// No visible task block at the requested slot or id.
    TaskNotFound,
    InvalidHabitCell { row: usize, day: Option<usize> },
    Validation(TaskValidationError),
    Store(StoreError),
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoSlotSelected => write!(f, "select a time slot first"),
            Self::TaskNotFound => write!(f, "no task at the selected position"),
            Self::InvalidHabitCell { row, day: None } => write!(f, "habit row {row} does not exist"),
            Self::InvalidHabitCell {
                row,
                day: Some(day),
            } => write!(f, "habit cell ({row}, {day}) does not exist"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TaskValidationError> for SessionError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for SessionError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Validation(err) => Self::Validation(err),
            StoreError::TaskNotFound { .. } => Self::TaskNotFound,
            other => Self::Store(other),
        }
    }
}

/// Planner application state bound to one store.
pub struct PlannerSession<S: KeyValueStore> {
    store: PlannerStore<S>,
    current_date: NaiveDate,
    selected_color: TaskColor,
    selected_slot: Option<Slot>,
    task_form: TaskForm,
    habit_form: HabitForm,
    renderer: GridRenderer,
}

impl<S: KeyValueStore> PlannerSession<S> {
    /// Starts a session on the week containing `today`.
    pub fn new(store: PlannerStore<S>, today: NaiveDate) -> Self {
        let week = WeekKey::containing(today);
        let habit_form = HabitForm::from_habits(store.habits(week));
        let mut session = Self {
            store,
            current_date: today,
            selected_color: TaskColor::Default,
            selected_slot: None,
            task_form: TaskForm::default(),
            habit_form,
            renderer: GridRenderer::new(week),
        };
        session.render();
        session
    }

    pub fn week(&self) -> WeekKey {
        WeekKey::containing(self.current_date)
    }

    pub fn current_date(&self) -> NaiveDate {
        self.current_date
    }

    /// `yyyy-mm-dd - yyyy-mm-dd` label of the active week.
    pub fn week_label(&self) -> String {
        self.week().range_label()
    }

    /// Moves by `weeks` (7 days each) and reloads the week's projections.
    ///
    /// Unsaved habit form edits are discarded.
    pub fn change_week(&mut self, weeks: i64) {
        self.current_date += Duration::days(7 * weeks);
        self.selected_slot = None;
        self.habit_form = HabitForm::from_habits(self.store.habits(self.week()));
        self.render();
        info!(
            "event=week_change module=session status=ok week={}",
            self.week()
        );
    }

    pub fn select_color(&mut self, color: TaskColor) {
        self.selected_color = color;
    }

    pub fn selected_color(&self) -> TaskColor {
        self.selected_color
    }

    /// Picks the grid slot the next task is added to.
    pub fn select_slot(&mut self, slot: Slot) {
        self.selected_slot = Some(slot);
    }

    pub fn selected_slot(&self) -> Option<Slot> {
        self.selected_slot
    }

    /// Releases the selected slot without touching the form.
    pub fn cancel_selection(&mut self) {
        self.selected_slot = None;
    }

    pub fn task_form(&self) -> &TaskForm {
        &self.task_form
    }

    pub fn task_form_mut(&mut self) -> &mut TaskForm {
        &mut self.task_form
    }

    /// Adds a task from the form at the selected slot.
    ///
    /// On success the form is cleared and the slot released. On failure the
    /// form and selection are kept for correction.
    pub fn submit_task(&mut self) -> Result<TaskId, SessionError> {
        let slot = self.selected_slot.ok_or(SessionError::NoSlotSelected)?;
        let duration = self.task_form.parse_duration()?;
        let task = Task::new(slot, duration, self.task_form.text.clone(), self.selected_color)?;
        let id = self.store.add_task(self.week(), task)?;

        self.task_form.clear();
        self.selected_slot = None;
        self.render();
        Ok(id)
    }

    /// Asks `confirmer` and deletes the task with `id` on confirmation.
    pub fn request_delete(
        &mut self,
        id: TaskId,
        confirmer: &mut impl ConfirmDelete,
    ) -> Result<DeleteOutcome, SessionError> {
        let week = self.week();
        let task = self
            .store
            .tasks(week)
            .iter()
            .find(|task| task.id == id)
            .cloned()
            .ok_or(SessionError::TaskNotFound)?;

        match confirmer.confirm_delete(&task) {
            DeleteDecision::Cancelled => {
                info!("event=task_delete module=session status=cancelled week={week} task_id={id}");
                Ok(DeleteOutcome::Kept)
            }
            DeleteDecision::Confirmed => {
                let removed = self.store.remove_task(week, id)?;
                self.render();
                Ok(DeleteOutcome::Deleted(removed))
            }
        }
    }

    /// Deletes the visible task block covering `slot`, after confirmation.
    pub fn request_delete_at(
        &mut self,
        slot: Slot,
        confirmer: &mut impl ConfirmDelete,
    ) -> Result<DeleteOutcome, SessionError> {
        let id = self
            .grid()
            .block_at(slot)
            .map(|block| block.task_id)
            .ok_or(SessionError::TaskNotFound)?;
        self.request_delete(id, confirmer)
    }

    /// Compatibility delete by `(day, hour, minute, text)`: one prompt, then
    /// every matching task of the active week is removed.
    ///
    /// Returns the number of removed tasks; `0` when cancelled.
    pub fn request_delete_matching(
        &mut self,
        key: &TaskKey,
        confirmer: &mut impl ConfirmDelete,
    ) -> Result<usize, SessionError> {
        let week = self.week();
        let first = self
            .store
            .tasks(week)
            .iter()
            .find(|task| task.matches_key(key))
            .cloned()
            .ok_or(SessionError::TaskNotFound)?;

        if confirmer.confirm_delete(&first) == DeleteDecision::Cancelled {
            return Ok(0);
        }
        let removed = self.store.remove_tasks_matching(week, key)?;
        self.render();
        Ok(removed)
    }

    pub fn set_goal(&mut self, text: impl Into<String>) -> Result<(), SessionError> {
        let week = self.week();
        self.store.set_goal(week, text)?;
        Ok(())
    }

    /// Goal of the active week or the placeholder text.
    pub fn goal_text(&self) -> &str {
        self.store.goal_or_placeholder(self.week())
    }

    pub fn habit_form(&self) -> &HabitForm {
        &self.habit_form
    }

    pub fn habit_form_mut(&mut self) -> &mut HabitForm {
        &mut self.habit_form
    }

    /// Collects the habit form into state and persists it.
    pub fn save_habit_form(&mut self) -> Result<(), SessionError> {
        let week = self.week();
        self.store.set_habits(week, self.habit_form.rows.clone())?;
        self.habit_form = HabitForm::from_habits(self.store.habits(week));
        Ok(())
    }

    /// Rebuilds the grid of the active week.
    pub fn render(&mut self) -> &WeekGrid {
        let week = self.week();
        self.renderer.render(week, self.store.tasks(week))
    }

    /// Most recent render.
    pub fn grid(&self) -> &WeekGrid {
        self.renderer.current()
    }

    pub fn store(&self) -> &PlannerStore<S> {
        &self.store
    }
}
