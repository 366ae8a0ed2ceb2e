//! Tabular week export.

use super::{export_file_stem, ExportError, ExportResult};
use crate::model::habit::Habit;
use crate::model::task::Task;
use crate::model::week::{WeekKey, DAY_NAMES};
use log::info;
use rust_xlsxwriter::{Format, Workbook as XlsxBook};
use std::path::{Path, PathBuf};

pub const SCHEDULE_SHEET: &str = "schedule";
pub const HABITS_SHEET: &str = "habits";

/// One named table: header row plus data rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sheet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Ordered set of sheets for one week.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workbook {
    pub week: WeekKey,
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|sheet| sheet.name == name)
    }
}

/// Builds the schedule and habits sheets of `week`.
///
/// Schedule rows follow task order; tasks with an off-grid day are left out.
pub fn build_workbook(week: WeekKey, tasks: &[Task], habits: &[Habit]) -> Workbook {
    let schedule_rows = tasks
        .iter()
        .filter_map(|task| {
            let day = DAY_NAMES.get(usize::from(task.day))?;
            Some(vec![
                (*day).to_string(),
                task.slot().time_label(),
                format_hours(task.duration_hours),
                task.text.clone(),
            ])
        })
        .collect();

    let habit_rows = habits
        .iter()
        .map(|habit| {
            std::iter::once(habit.name.clone())
                .chain(habit.days.iter().map(|done| yes_no(*done).to_string()))
                .collect()
        })
        .collect();

    Workbook {
        week,
        sheets: vec![
            Sheet {
                name: SCHEDULE_SHEET.to_string(),
                headers: ["Day", "Time", "Duration", "Task"].map(String::from).to_vec(),
                rows: schedule_rows,
            },
            Sheet {
                name: HABITS_SHEET.to_string(),
                headers: std::iter::once("Habit")
                    .chain(DAY_NAMES)
                    .map(String::from)
                    .collect(),
                rows: habit_rows,
            },
        ],
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "Yes"
    } else {
        "No"
    }
}

fn format_hours(hours: f64) -> String {
    format!("{hours} hours")
}

/// Writes a [`Workbook`] as `schedule_<week>.xlsx`, one worksheet per sheet.
#[derive(Debug, Clone)]
pub struct XlsxWorkbookWriter {
    out_dir: PathBuf,
}

impl XlsxWorkbookWriter {
    pub fn new(out_dir: impl AsRef<Path>) -> Self {
        Self {
            out_dir: out_dir.as_ref().to_path_buf(),
        }
    }

    /// Writes the workbook and returns the created file path.
    ///
    /// Worksheets keep sheet order; the header row is bold.
    pub fn write(&self, workbook: &Workbook) -> ExportResult<PathBuf> {
        std::fs::create_dir_all(&self.out_dir).map_err(|source| ExportError::Io {
            path: self.out_dir.clone(),
            source,
        })?;

        let path = self
            .out_dir
            .join(format!("{}.xlsx", export_file_stem(workbook.week)));
        let header = Format::new().set_bold();
        let mut book = XlsxBook::new();
        for sheet in &workbook.sheets {
            let worksheet = book.add_worksheet();
            worksheet.set_name(sheet.name.as_str())?;
            for (col, title) in sheet.headers.iter().enumerate() {
                worksheet.write_string_with_format(0, column(col), title.as_str(), &header)?;
            }
            for (row, values) in sheet.rows.iter().enumerate() {
                let row = u32::try_from(row + 1).unwrap_or(u32::MAX);
                for (col, value) in values.iter().enumerate() {
                    worksheet.write_string(row, column(col), value.as_str())?;
                }
            }
            worksheet.autofit();
        }
        book.save(&path)?;

        info!(
            "event=export_spreadsheet module=export status=ok week={} sheets={}",
            workbook.week,
            workbook.sheets.len()
        );
        Ok(path)
    }
}

fn column(index: usize) -> u16 {
    u16::try_from(index).unwrap_or(u16::MAX)
}
