//! Week exports.
//!
//! # Responsibility
//! - Build the two-sheet tabular document (schedule + habits) of a week.
//! - Write it as one `.xlsx` workbook and rasterize the rendered grid as PNG.
//!
//! # Invariants
//! - Exports only borrow planner state; a failed export changes nothing.
//! - Output file names are derived from the week key.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod image;
pub mod workbook;

pub use self::image::{export_week_image, ImageLayout};
pub use workbook::{build_workbook, XlsxWorkbookWriter, Sheet, Workbook};

pub type ExportResult<T> = Result<T, ExportError>;

/// Export failure.
#[derive(Debug)]
pub enum ExportError {
    Io { path: PathBuf, source: std::io::Error },
    Xlsx(rust_xlsxwriter::XlsxError),
    Image(::image::ImageError),
}

impl Display for ExportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "export io error at `{}`: {source}", path.display()),
            Self::Xlsx(err) => write!(f, "spreadsheet export failed: {err}"),
            Self::Image(err) => write!(f, "image export failed: {err}"),
        }
    }
}

impl Error for ExportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Xlsx(err) => Some(err),
            Self::Image(err) => Some(err),
        }
    }
}

impl From<rust_xlsxwriter::XlsxError> for ExportError {
    fn from(value: rust_xlsxwriter::XlsxError) -> Self {
        Self::Xlsx(value)
    }
}

impl From<::image::ImageError> for ExportError {
    fn from(value: ::image::ImageError) -> Self {
        Self::Image(value)
    }
}

/// File stem shared by every export of `week`: `schedule_<week>`.
pub fn export_file_stem(week: crate::model::week::WeekKey) -> String {
    format!("schedule_{week}")
}
