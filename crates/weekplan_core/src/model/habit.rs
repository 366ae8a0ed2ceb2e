//! Weekly habit tracker rows.
//!
//! # Invariants
//! - Every week exposes exactly [`HABIT_ROWS`] rows.
//! - `days` is Sunday-first and always holds seven entries.

use serde::{Deserialize, Serialize};

/// Fixed number of habit rows shown per week.
pub const HABIT_ROWS: usize = 5;

/// One habit row with a check mark per weekday.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Habit {
    pub name: String,
    #[serde(deserialize_with = "seven_days")]
    pub days: [bool; 7],
}

impl Habit {
    pub fn new(name: impl Into<String>, days: [bool; 7]) -> Self {
        Self {
            name: name.into(),
            days,
        }
    }

    /// Whether the row carries neither a name nor a check mark.
    pub fn is_blank(&self) -> bool {
        self.name.trim().is_empty() && !self.days.iter().any(|done| *done)
    }

    /// Number of checked days.
    pub fn completed_days(&self) -> usize {
        self.days.iter().filter(|done| **done).count()
    }
}

/// Pads with blank rows or truncates so exactly [`HABIT_ROWS`] remain.
pub fn normalize_habits(mut habits: Vec<Habit>) -> Vec<Habit> {
    habits.truncate(HABIT_ROWS);
    habits.resize_with(HABIT_ROWS, Habit::default);
    habits
}

// Browser data may hold shorter or longer check lists; missing days read as
// unchecked.
fn seven_days<'de, D>(deserializer: D) -> Result<[bool; 7], D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Vec::<bool>::deserialize(deserializer)?;
    let mut days = [false; 7];
    for (slot, value) in days.iter_mut().zip(raw) {
        *slot = value;
    }
    Ok(days)
}

#[cfg(test)]
mod tests {
    use super::{normalize_habits, Habit, HABIT_ROWS};

    #[test]
    fn normalize_pads_short_lists() {
        let rows = normalize_habits(vec![Habit::new("run", [true; 7])]);
        assert_eq!(rows.len(), HABIT_ROWS);
        assert_eq!(rows[0].name, "run");
        assert!(rows[1..].iter().all(Habit::is_blank));
    }

    #[test]
    fn normalize_truncates_long_lists() {
        let rows = normalize_habits((0..8).map(|i| Habit::new(format!("h{i}"), [false; 7])).collect());
        assert_eq!(rows.len(), HABIT_ROWS);
        assert_eq!(rows[4].name, "h4");
    }

    #[test]
    fn short_day_lists_deserialize_as_unchecked() {
        let habit: Habit = serde_json::from_str(r#"{"name":"read","days":[true,false,true]}"#).unwrap();
        assert_eq!(habit.days, [true, false, true, false, false, false, false]);
        assert_eq!(habit.completed_days(), 2);
    }
}
