//! Scheduled task model.
//!
//! # Responsibility
//! - Define the task record placed on the weekly grid.
//! - Validate slot coordinates, duration and text before persistence.
//! - Accept legacy persisted shapes (string-typed numbers, missing ids).
//!
//! # Invariants
//! - `id` is stable for the task lifetime and never reused.
//! - A validated task starts on an existing half-hour slot.
//! - Display span is `round(duration * 2)` half-hour units, never below 1.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable task identifier.
pub type TaskId = Uuid;

/// Number of day columns in the weekly grid.
pub const DAYS_PER_WEEK: u8 = 7;
/// Number of half-hour rows per day.
pub const SLOTS_PER_DAY: usize = 48;
/// Longest accepted task duration, in hours.
pub const MAX_DURATION_HOURS: f64 = 24.0;

/// One half-hour cell address on the weekly grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Slot {
    /// 0 = Sunday ... 6 = Saturday.
    pub day: u8,
    /// 0..=23.
    pub hour: u8,
    /// 0 or 30.
    pub minute: u8,
}

impl Slot {
    /// Builds a slot after checking every coordinate.
    pub fn new(day: u8, hour: u8, minute: u8) -> Result<Self, TaskValidationError> {
        let slot = Self { day, hour, minute };
        slot.validate()?;
        Ok(slot)
    }

    /// Slot at `row` (0 = 00:00, 47 = 23:30) of `day`.
    pub fn from_row(day: u8, row: usize) -> Option<Self> {
        if day >= DAYS_PER_WEEK || row >= SLOTS_PER_DAY {
            return None;
        }
        Some(Self {
            day,
            hour: (row / 2) as u8,
            minute: if row % 2 == 0 { 0 } else { 30 },
        })
    }

    /// Grid row of this slot, or `None` when the slot is outside the grid.
    pub fn row(self) -> Option<usize> {
        if self.validate().is_err() {
            return None;
        }
        Some(usize::from(self.hour) * 2 + usize::from(self.minute / 30))
    }

    /// `HH:MM` label.
    pub fn time_label(self) -> String {
        format!("{:02}:{:02}", self.hour, self.minute)
    }

    fn validate(self) -> Result<(), TaskValidationError> {
        if self.day >= DAYS_PER_WEEK {
            return Err(TaskValidationError::InvalidDay(self.day));
        }
        if self.hour > 23 {
            return Err(TaskValidationError::InvalidHour(self.hour));
        }
        if self.minute != 0 && self.minute != 30 {
            return Err(TaskValidationError::InvalidMinute(self.minute));
        }
        Ok(())
    }
}

/// Fixed task color palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TaskColor {
    /// Pre-selected color before the user picks a swatch.
    #[default]
    Default,
    Rose,
    Mint,
    Sky,
    Lemon,
    Apricot,
    Lavender,
}

impl TaskColor {
    /// Swatches offered by the color picker, in display order.
    pub const PALETTE: [TaskColor; 6] = [
        TaskColor::Rose,
        TaskColor::Mint,
        TaskColor::Sky,
        TaskColor::Lemon,
        TaskColor::Apricot,
        TaskColor::Lavender,
    ];

    /// Upper-case `#RRGGBB` value.
    pub fn hex(self) -> &'static str {
        match self {
            Self::Default => "#E6F3FF",
            Self::Rose => "#FFB3BA",
            Self::Mint => "#BAFFC9",
            Self::Sky => "#BAE1FF",
            Self::Lemon => "#FFFFBA",
            Self::Apricot => "#FFD29F",
            Self::Lavender => "#E0BBE4",
        }
    }

    /// Short name used by text front ends.
    pub fn name(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Rose => "rose",
            Self::Mint => "mint",
            Self::Sky => "sky",
            Self::Lemon => "lemon",
            Self::Apricot => "apricot",
            Self::Lavender => "lavender",
        }
    }

    /// RGB components of [`TaskColor::hex`].
    pub fn rgb(self) -> [u8; 3] {
        let hex = &self.hex()[1..];
        let channel = |start: usize| u8::from_str_radix(&hex[start..start + 2], 16).unwrap_or(0);
        [channel(0), channel(2), channel(4)]
    }

    /// Resolves a `#RRGGBB` value (case-insensitive) or a swatch name.
    pub fn parse(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        std::iter::once(Self::Default)
            .chain(Self::PALETTE)
            .find(|color| {
                color.hex().eq_ignore_ascii_case(trimmed) || color.name().eq_ignore_ascii_case(trimmed)
            })
    }
}

impl Serialize for TaskColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.hex())
    }
}

impl<'de> Deserialize<'de> for TaskColor {
    /// Unknown colors degrade to the default swatch instead of failing the
    /// whole task map.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw).unwrap_or_default())
    }
}

/// Legacy identity tuple used by compatibility deletion.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskKey {
    pub slot: Slot,
    pub text: String,
}

/// One scheduled block on the weekly grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default = "Uuid::new_v4")]
    pub id: TaskId,
    #[serde(deserialize_with = "lenient_u8")]
    pub day: u8,
    #[serde(deserialize_with = "lenient_u8")]
    pub hour: u8,
    #[serde(deserialize_with = "lenient_u8")]
    pub minute: u8,
    /// Hours; fractional values are quantized to half-hours on display.
    #[serde(rename = "duration", deserialize_with = "lenient_f64")]
    pub duration_hours: f64,
    pub text: String,
    #[serde(default)]
    pub color: TaskColor,
}

impl Task {
    /// Creates a validated task with a generated stable ID.
    ///
    /// `text` is trimmed before validation.
    pub fn new(
        slot: Slot,
        duration_hours: f64,
        text: impl Into<String>,
        color: TaskColor,
    ) -> Result<Self, TaskValidationError> {
        let task = Self {
            id: Uuid::new_v4(),
            day: slot.day,
            hour: slot.hour,
            minute: slot.minute,
            duration_hours,
            text: text.into().trim().to_string(),
            color,
        };
        task.validate()?;
        Ok(task)
    }

    /// Start slot; may lie outside the grid for stale persisted data.
    pub fn slot(&self) -> Slot {
        Slot {
            day: self.day,
            hour: self.hour,
            minute: self.minute,
        }
    }

    /// Legacy `(day, hour, minute, text)` identity.
    pub fn key(&self) -> TaskKey {
        TaskKey {
            slot: self.slot(),
            text: self.text.clone(),
        }
    }

    /// Whether this task carries the given legacy identity.
    pub fn matches_key(&self, key: &TaskKey) -> bool {
        self.slot() == key.slot && self.text == key.text
    }

    /// Number of half-hour slots the task occupies before clipping.
    pub fn span(&self) -> usize {
        let halves = (self.duration_hours * 2.0).round();
        if halves.is_finite() && halves >= 1.0 {
            halves as usize
        } else {
            1
        }
    }

    /// Validates write-path invariants.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        self.slot().validate()?;
        validate_duration(self.duration_hours)?;
        if self.text.trim().is_empty() {
            return Err(TaskValidationError::MissingFields);
        }
        Ok(())
    }
}

/// Validates a task duration in hours.
pub fn validate_duration(duration_hours: f64) -> Result<(), TaskValidationError> {
    if !duration_hours.is_finite() || duration_hours <= 0.0 {
        return Err(TaskValidationError::InvalidDuration(duration_hours));
    }
    if duration_hours > MAX_DURATION_HOURS {
        return Err(TaskValidationError::DurationTooLong(duration_hours));
    }
    Ok(())
}

/// Task write-path validation failures.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskValidationError {
    /// Duration or text was left empty.
    MissingFields,
    InvalidDay(u8),
    InvalidHour(u8),
    InvalidMinute(u8),
    InvalidDuration(f64),
    DurationTooLong(f64),
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingFields => write!(f, "Please fill in all fields."),
            Self::InvalidDay(day) => write!(f, "day must be 0..=6, got {day}"),
            Self::InvalidHour(hour) => write!(f, "hour must be 0..=23, got {hour}"),
            Self::InvalidMinute(minute) => write!(f, "minute must be 0 or 30, got {minute}"),
            Self::InvalidDuration(value) => {
                write!(f, "duration must be a positive number of hours, got {value}")
            }
            Self::DurationTooLong(value) => write!(
                f,
                "duration must not exceed {MAX_DURATION_HOURS} hours, got {value}"
            ),
        }
    }
}

impl Error for TaskValidationError {}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

impl NumberOrText {
    fn into_f64(self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(value),
            Self::Text(text) => text.trim().parse::<f64>().ok(),
        }
    }
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    NumberOrText::deserialize(deserializer)?
        .into_f64()
        .filter(|value| value.is_finite())
        .ok_or_else(|| de::Error::custom("expected a number or numeric string"))
}

fn lenient_u8<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let value = lenient_f64(deserializer)?;
    if value.fract() != 0.0 || !(0.0..=f64::from(u8::MAX)).contains(&value) {
        return Err(de::Error::custom(format!(
            "expected a small non-negative integer, got {value}"
        )));
    }
    Ok(value as u8)
}

#[cfg(test)]
mod tests {
    use super::{Slot, Task, TaskColor, TaskValidationError};

    #[test]
    fn slot_rows_cover_the_day() {
        assert_eq!(Slot::new(0, 0, 0).unwrap().row(), Some(0));
        assert_eq!(Slot::new(6, 23, 30).unwrap().row(), Some(47));
        assert_eq!(Slot::from_row(2, 19), Some(Slot::new(2, 9, 30).unwrap()));
        assert_eq!(Slot::from_row(7, 0), None);
    }

    #[test]
    fn slot_rejects_off_grid_coordinates() {
        assert_eq!(Slot::new(7, 0, 0), Err(TaskValidationError::InvalidDay(7)));
        assert_eq!(Slot::new(0, 24, 0), Err(TaskValidationError::InvalidHour(24)));
        assert_eq!(Slot::new(0, 9, 15), Err(TaskValidationError::InvalidMinute(15)));
    }

    #[test]
    fn span_rounds_and_never_drops_below_one() {
        let slot = Slot::new(1, 9, 0).unwrap();
        let span = |hours| Task::new(slot, hours, "x", TaskColor::Sky).unwrap().span();
        assert_eq!(span(1.0), 2);
        assert_eq!(span(0.3), 1);
        assert_eq!(span(0.2), 1);
        assert_eq!(span(1.3), 3);
    }

    #[test]
    fn new_task_trims_text_and_requires_it() {
        let slot = Slot::new(0, 8, 30).unwrap();
        let task = Task::new(slot, 1.0, "  read  ", TaskColor::Mint).unwrap();
        assert_eq!(task.text, "read");
        assert_eq!(
            Task::new(slot, 1.0, "   ", TaskColor::Mint).unwrap_err(),
            TaskValidationError::MissingFields
        );
        assert!(matches!(
            Task::new(slot, 0.0, "x", TaskColor::Mint),
            Err(TaskValidationError::InvalidDuration(_))
        ));
        assert!(matches!(
            Task::new(slot, 30.0, "x", TaskColor::Mint),
            Err(TaskValidationError::DurationTooLong(_))
        ));
    }

    #[test]
    fn color_parses_hex_and_names() {
        assert_eq!(TaskColor::parse("#ffb3ba"), Some(TaskColor::Rose));
        assert_eq!(TaskColor::parse("lavender"), Some(TaskColor::Lavender));
        assert_eq!(TaskColor::parse("#123456"), None);
        assert_eq!(TaskColor::Sky.rgb(), [0xBA, 0xE1, 0xFF]);
    }

    #[test]
    fn legacy_json_with_string_fields_loads() {
        let json = r##"{"day":"1","hour":"9","minute":"30","duration":"1.5","text":"gym","color":"#BAFFC9"}"##;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.slot(), Slot::new(1, 9, 30).unwrap());
        assert_eq!(task.duration_hours, 1.5);
        assert_eq!(task.color, TaskColor::Mint);
        assert_eq!(task.span(), 3);
    }

    #[test]
    fn unknown_color_falls_back_to_default() {
        let json = r##"{"day":0,"hour":0,"minute":0,"duration":1,"text":"a","color":"#000000"}"##;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.color, TaskColor::Default);
    }
}
