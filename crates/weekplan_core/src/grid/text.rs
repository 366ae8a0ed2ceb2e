//! Plain-text projection of a rendered week for terminal front ends.

use super::{CellState, WeekGrid};
use crate::model::task::{Slot, DAYS_PER_WEEK, SLOTS_PER_DAY};
use crate::model::week::DAY_NAMES;

const COLUMN_WIDTH: usize = 12;
const CONTINUATION: &str = "|";

/// Options for [`render_text`].
#[derive(Debug, Clone, Copy)]
pub struct TextGridOptions {
    /// Skip rows where every day is empty.
    pub compact: bool,
}

impl Default for TextGridOptions {
    fn default() -> Self {
        Self { compact: true }
    }
}

/// Renders `grid` as a fixed-width table, one line per half-hour row.
///
/// A block shows its text in the start cell and `|` in the cells it hides.
pub fn render_text(grid: &WeekGrid, options: TextGridOptions) -> String {
    let mut out = String::new();
    out.push_str(&format!("Week of {}\n", grid.week().range_label()));
    out.push_str(&format!("{:<6}", "Time"));
    for (day, name) in DAY_NAMES.iter().enumerate() {
        let header = format!("{} {}", &name[..3], grid.week().day(day as u8).format("%m-%d"));
        out.push_str(&format!("|{}", fit(&header)));
    }
    out.push('\n');

    for row in 0..SLOTS_PER_DAY {
        let cells: Vec<CellState> = (0..DAYS_PER_WEEK).map(|day| grid.cell_at(day, row)).collect();
        if options.compact && cells.iter().all(|cell| *cell == CellState::Empty) {
            continue;
        }

        let label = Slot::from_row(0, row)
            .map(|slot| slot.time_label())
            .unwrap_or_default();
        out.push_str(&format!("{label:<6}"));
        for cell in cells {
            let content = match cell {
                CellState::Empty => String::new(),
                CellState::Start(index) => grid
                    .blocks()
                    .get(index)
                    .map(|block| block.text.clone())
                    .unwrap_or_default(),
                CellState::Hidden(_) => CONTINUATION.to_string(),
            };
            out.push_str(&format!("|{}", fit(&content)));
        }
        out.push('\n');
    }
    out
}

fn fit(value: &str) -> String {
    let count = value.chars().count();
    if count <= COLUMN_WIDTH {
        return format!("{:<width$}", value, width = COLUMN_WIDTH);
    }
    let mut truncated: String = value.chars().take(COLUMN_WIDTH - 1).collect();
    truncated.push('~');
    truncated
}

#[cfg(test)]
mod tests {
    use super::{render_text, TextGridOptions};
    use crate::grid::render_week;
    use crate::model::task::{Slot, Task, TaskColor};
    use crate::model::week::WeekKey;
    use chrono::NaiveDate;

    #[test]
    fn compact_output_lists_only_occupied_rows() {
        let week = WeekKey::containing(NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
        let task = Task::new(Slot::new(1, 9, 0).unwrap(), 1.0, "standup notes", TaskColor::Mint)
            .unwrap();
        let text = render_text(&render_week(week, &[task]), TextGridOptions::default());

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("2024-03-10 - 2024-03-16"));
        assert!(lines[2].starts_with("09:00"));
        assert!(lines[2].contains("standup not~"));
        assert!(lines[3].starts_with("09:30"));
    }

    #[test]
    fn full_output_has_every_half_hour() {
        let week = WeekKey::containing(NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
        let text = render_text(&render_week(week, &[]), TextGridOptions { compact: false });
        assert_eq!(text.lines().count(), 2 + 48);
    }
}
