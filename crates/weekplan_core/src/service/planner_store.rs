//! Week-partitioned planner state store.
//!
//! # Responsibility
//! - Load tasks, goals and habits from a key-value backend.
//! - Answer "what belongs to week W".
//! - Persist every mutation of a category immediately (write-through).
//!
//! # Invariants
//! - Loading never fails: missing or malformed categories load empty.
//! - Ids generated for legacy tasks are written back on open, so they stay
//!   valid across store instances.
//! - A true Sunday key wins over a UTC-shifted Saturday key of the same week.
//! - In-memory state changes only after the backend write succeeded.
//! - Categories are written independently; there is no cross-category
//!   transaction.
//! - Goal text and task text are never logged.

use crate::model::habit::{normalize_habits, Habit};
use crate::model::task::{Task, TaskId, TaskKey, TaskValidationError};
use crate::model::week::WeekKey;
use crate::repo::kv_repo::{KeyValueStore, RepoError};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage key for the task map.
pub const TASKS_KEY: &str = "scheduleTasks";
/// Storage key for the weekly goal map.
pub const GOALS_KEY: &str = "weeklyGoals";
/// Storage key for the weekly habit map.
pub const HABITS_KEY: &str = "weeklyHabits";
/// Shown when a week has no goal.
pub const GOAL_PLACEHOLDER: &str = "No goal set for this week.";

pub type TasksByWeek = BTreeMap<WeekKey, Vec<Task>>;
pub type GoalsByWeek = BTreeMap<WeekKey, String>;
pub type HabitsByWeek = BTreeMap<WeekKey, Vec<Habit>>;

pub type StoreResult<T> = Result<T, StoreError>;

/// Planner store error.
#[derive(Debug)]
pub enum StoreError {
    Validation(TaskValidationError),
    Repo(RepoError),
    Serialize(serde_json::Error),
    TaskNotFound { week: WeekKey, id: TaskId },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Serialize(err) => write!(f, "failed to serialize planner data: {err}"),
            Self::TaskNotFound { week, id } => write!(f, "task {id} not found in week {week}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Serialize(err) => Some(err),
            Self::TaskNotFound { .. } => None,
        }
    }
}

impl From<TaskValidationError> for StoreError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialize(value)
    }
}

/// Snapshot of all three planner categories.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlannerData {
    pub tasks_by_week: TasksByWeek,
    pub goals_by_week: GoalsByWeek,
    pub habits_by_week: HabitsByWeek,
}

/// Reads all three categories from `kv`.
///
/// A category that is missing, unreadable or malformed loads as an empty
/// map and is reported at `warn` level.
pub fn load_all<S: KeyValueStore>(kv: &S) -> PlannerData {
    load_with_report(kv).0
}

/// Task as read from storage, remembering whether the record had an id.
struct StoredTask {
    task: Task,
    had_id: bool,
}

impl<'de> Deserialize<'de> for StoredTask {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        let had_id = value.get("id").is_some();
        let task = Task::deserialize(value).map_err(serde::de::Error::custom)?;
        Ok(Self { task, had_id })
    }
}

/// Loads everything and counts the task ids that had to be generated.
fn load_with_report<S: KeyValueStore>(kv: &S) -> (PlannerData, usize) {
    let mut generated_ids = 0;
    let mut tasks_by_week = TasksByWeek::new();
    for (week, stored) in load_category::<_, Vec<StoredTask>>(kv, TASKS_KEY) {
        let tasks = tasks_by_week.entry(week).or_default();
        for StoredTask { task, had_id } in stored {
            if !had_id {
                generated_ids += 1;
            }
            tasks.push(task);
        }
    }

    let mut goals_by_week = GoalsByWeek::new();
    for (week, goal) in load_category::<_, String>(kv, GOALS_KEY) {
        goals_by_week.entry(week).or_insert(goal);
    }

    let mut habits_by_week = HabitsByWeek::new();
    for (week, habits) in load_category::<_, Vec<Habit>>(kv, HABITS_KEY) {
        habits_by_week.entry(week).or_insert(habits);
    }

    let data = PlannerData {
        tasks_by_week,
        goals_by_week,
        habits_by_week,
    };
    info!(
        "event=planner_load module=store status=ok task_weeks={} goal_weeks={} habit_weeks={} generated_ids={generated_ids}",
        data.tasks_by_week.len(),
        data.goals_by_week.len(),
        data.habits_by_week.len()
    );
    (data, generated_ids)
}

/// Entries of one category, Sunday keys first, then remapped Saturday keys.
fn load_category<S: KeyValueStore, V: DeserializeOwned>(
    kv: &S,
    key: &'static str,
) -> Vec<(WeekKey, V)> {
    let raw = match kv.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(err) => {
            warn!(
                "event=planner_load module=store status=error category={key} error_code=read_failed error={err}"
            );
            return Vec::new();
        }
    };

    let entries = match serde_json::from_str::<BTreeMap<String, V>>(&raw) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(
                "event=planner_load module=store status=error category={key} error_code=malformed_data error={err}"
            );
            return Vec::new();
        }
    };

    let (mut resolved, shifted): (Vec<_>, Vec<_>) = entries
        .into_iter()
        .filter_map(|(raw_key, value)| match stored_week_key(&raw_key) {
            Some((week, exact)) => Some((week, value, exact)),
            None => {
                warn!(
                    "event=planner_load module=store status=skip category={key} error_code=invalid_week_key"
                );
                None
            }
        })
        .partition(|(_, _, exact)| *exact);
    resolved.extend(shifted);
    resolved
        .into_iter()
        .map(|(week, value, _)| (week, value))
        .collect()
}

/// Resolves a persisted map key to its week.
///
/// Browser builds east of UTC wrote the Sunday key shifted back by one day,
/// so a Saturday key belongs to the week starting the following day. The
/// flag is `false` for such shifted keys.
fn stored_week_key(raw: &str) -> Option<(WeekKey, bool)> {
    let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()?;
    match date.weekday() {
        Weekday::Sun => Some((WeekKey::containing(date), true)),
        Weekday::Sat => Some((WeekKey::containing(date + Duration::days(1)), false)),
        _ => None,
    }
}

/// Write-through planner store over a key-value backend.
pub struct PlannerStore<S: KeyValueStore> {
    kv: S,
    data: PlannerData,
}

impl<S: KeyValueStore> PlannerStore<S> {
    /// Loads all categories from `kv`; never fails.
    ///
    /// Legacy tasks stored without an id get one here, and the task map is
    /// written back once so later opens see the same ids.
    pub fn open(kv: S) -> Self {
        let mut store = Self {
            kv,
            data: PlannerData::default(),
        };
        store.reload();
        store
    }

    /// Discards in-memory state and reads everything back from storage.
    pub fn reload(&mut self) {
        let (data, generated_ids) = load_with_report(&self.kv);
        self.data = data;
        if generated_ids == 0 {
            return;
        }
        match self.persist(TASKS_KEY, &self.data.tasks_by_week) {
            Ok(()) => info!(
                "event=task_id_backfill module=store status=ok generated_ids={generated_ids}"
            ),
            Err(err) => warn!(
                "event=task_id_backfill module=store status=error generated_ids={generated_ids} error={err}"
            ),
        }
    }

    /// Current in-memory snapshot.
    pub fn data(&self) -> &PlannerData {
        &self.data
    }

    /// Storage backend.
    pub fn backend(&self) -> &S {
        &self.kv
    }

    /// Tasks of `week` in insertion order.
    pub fn tasks(&self, week: WeekKey) -> &[Task] {
        self.data
            .tasks_by_week
            .get(&week)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Appends `task` to `week`. Overlapping tasks are allowed.
    pub fn add_task(&mut self, week: WeekKey, task: Task) -> StoreResult<TaskId> {
        task.validate()?;
        let id = task.id;
        let span = task.span();

        let mut next = self.data.tasks_by_week.clone();
        next.entry(week).or_default().push(task);
        self.persist(TASKS_KEY, &next)?;
        self.data.tasks_by_week = next;

        info!("event=task_add module=store status=ok week={week} task_id={id} span={span}");
        Ok(id)
    }

    /// Removes the task with stable `id` from `week`.
    pub fn remove_task(&mut self, week: WeekKey, id: TaskId) -> StoreResult<Task> {
        let mut next = self.data.tasks_by_week.clone();
        let tasks = next
            .get_mut(&week)
            .ok_or(StoreError::TaskNotFound { week, id })?;
        let index = tasks
            .iter()
            .position(|task| task.id == id)
            .ok_or(StoreError::TaskNotFound { week, id })?;
        let removed = tasks.remove(index);
        prune_empty_week(&mut next, week);

        self.persist(TASKS_KEY, &next)?;
        self.data.tasks_by_week = next;

        info!("event=task_remove module=store status=ok week={week} task_id={id}");
        Ok(removed)
    }

    /// Removes every task of `week` whose `(day, hour, minute, text)` equals
    /// `key` and returns how many were removed.
    ///
    /// Duplicates sharing the tuple are all removed together.
    pub fn remove_tasks_matching(&mut self, week: WeekKey, key: &TaskKey) -> StoreResult<usize> {
        let Some(current) = self.data.tasks_by_week.get(&week) else {
            return Ok(0);
        };
        let before = current.len();
        let kept: Vec<Task> = current
            .iter()
            .filter(|task| !task.matches_key(key))
            .cloned()
            .collect();
        let removed = before - kept.len();
        if removed == 0 {
            debug!("event=task_remove_matching module=store status=noop week={week}");
            return Ok(0);
        }

        let mut next = self.data.tasks_by_week.clone();
        next.insert(week, kept);
        prune_empty_week(&mut next, week);
        self.persist(TASKS_KEY, &next)?;
        self.data.tasks_by_week = next;

        info!("event=task_remove_matching module=store status=ok week={week} removed={removed}");
        Ok(removed)
    }

    /// Stores the goal text for `week`, replacing any previous goal.
    pub fn set_goal(&mut self, week: WeekKey, text: impl Into<String>) -> StoreResult<()> {
        let mut next = self.data.goals_by_week.clone();
        next.insert(week, text.into());
        self.persist(GOALS_KEY, &next)?;
        self.data.goals_by_week = next;

        info!("event=goal_set module=store status=ok week={week}");
        Ok(())
    }

    /// Goal text of `week`; `None` when unset or blank.
    pub fn goal(&self, week: WeekKey) -> Option<&str> {
        self.data
            .goals_by_week
            .get(&week)
            .map(String::as_str)
            .filter(|goal| !goal.trim().is_empty())
    }

    /// Goal text of `week`, or [`GOAL_PLACEHOLDER`].
    pub fn goal_or_placeholder(&self, week: WeekKey) -> &str {
        self.goal(week).unwrap_or(GOAL_PLACEHOLDER)
    }

    /// Stores habit rows for `week`, padded or truncated to five rows.
    pub fn set_habits(&mut self, week: WeekKey, habits: Vec<Habit>) -> StoreResult<()> {
        let mut next = self.data.habits_by_week.clone();
        next.insert(week, normalize_habits(habits));
        self.persist(HABITS_KEY, &next)?;
        self.data.habits_by_week = next;

        info!("event=habits_set module=store status=ok week={week}");
        Ok(())
    }

    /// Habit rows of `week`; always exactly five.
    pub fn habits(&self, week: WeekKey) -> Vec<Habit> {
        normalize_habits(
            self.data
                .habits_by_week
                .get(&week)
                .cloned()
                .unwrap_or_default(),
        )
    }

    fn persist<V: Serialize>(&self, key: &'static str, value: &V) -> StoreResult<()> {
        let encoded = serde_json::to_string(value)?;
        if let Err(err) = self.kv.set(key, &encoded) {
            warn!(
                "event=planner_persist module=store status=error category={key} error={err}"
            );
            return Err(err.into());
        }
        debug!(
            "event=planner_persist module=store status=ok category={key} bytes={}",
            encoded.len()
        );
        Ok(())
    }
}

fn prune_empty_week(tasks: &mut TasksByWeek, week: WeekKey) {
    if tasks.get(&week).is_some_and(Vec::is_empty) {
        tasks.remove(&week);
    }
}
