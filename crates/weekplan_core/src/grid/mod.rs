//! Weekly grid projection.
//!
//! # Responsibility
//! - Project one week's tasks onto the fixed 48 x 7 half-hour grid.
//! - Merge the slots of multi-slot tasks into one block.
//!
//! # Invariants
//! - Every render starts from an empty grid; nothing from a previous render
//!   survives.
//! - Blocks never extend past 23:30; longer tasks are clipped.
//! - Tasks whose start slot is outside the grid are skipped, not reported as
//!   errors.
//! - Overlaps resolve cell by cell in task order: the last task written to a
//!   cell owns it.

pub mod text;

use crate::model::task::{Slot, Task, TaskColor, TaskId, DAYS_PER_WEEK, SLOTS_PER_DAY};
use crate::model::week::WeekKey;
use log::debug;

/// Pixel height of one half-hour row.
pub const UNIT_HEIGHT_PX: u32 = 15;
/// Pixels subtracted from a block so stacked blocks stay apart.
pub const BLOCK_GAP_PX: u32 = 2;

const DAYS: usize = DAYS_PER_WEEK as usize;

/// Render state of one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellState {
    #[default]
    Empty,
    /// First slot of block `n` in [`WeekGrid::blocks`].
    Start(usize),
    /// Covered by block `n`; kept addressable but not displayed.
    Hidden(usize),
}

/// One task merged over consecutive slots of a day column.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskBlock {
    pub task_id: TaskId,
    pub day: u8,
    pub start_row: usize,
    /// Rows actually covered after clipping.
    pub span: usize,
    /// Rows the duration asked for.
    pub requested_span: usize,
    pub text: String,
    pub color: TaskColor,
}

impl TaskBlock {
    pub fn start_slot(&self) -> Option<Slot> {
        Slot::from_row(self.day, self.start_row)
    }

    pub fn is_clipped(&self) -> bool {
        self.span < self.requested_span
    }

    /// Display height in pixels: `span * unit - gap`.
    pub fn height_px(&self) -> u32 {
        (self.span as u32 * UNIT_HEIGHT_PX).saturating_sub(BLOCK_GAP_PX)
    }
}

/// Rendered grid of one week.
#[derive(Debug, Clone, PartialEq)]
pub struct WeekGrid {
    week: WeekKey,
    cells: [[CellState; DAYS]; SLOTS_PER_DAY],
    blocks: Vec<TaskBlock>,
    skipped: usize,
}

impl WeekGrid {
    /// Grid with every cell empty.
    pub fn empty(week: WeekKey) -> Self {
        Self {
            week,
            cells: [[CellState::Empty; DAYS]; SLOTS_PER_DAY],
            blocks: Vec::new(),
            skipped: 0,
        }
    }

    pub fn week(&self) -> WeekKey {
        self.week
    }

    /// State of the cell at `slot`; off-grid slots read as empty.
    pub fn cell(&self, slot: Slot) -> CellState {
        slot.row()
            .map(|row| self.cells[row][usize::from(slot.day)])
            .unwrap_or_default()
    }

    /// State of the cell at (`day`, `row`).
    pub fn cell_at(&self, day: u8, row: usize) -> CellState {
        Slot::from_row(day, row)
            .map(|slot| self.cell(slot))
            .unwrap_or_default()
    }

    /// Whether the slot is covered but not the start of a visible block.
    pub fn is_hidden(&self, slot: Slot) -> bool {
        matches!(self.cell(slot), CellState::Hidden(_))
    }

    /// Every block written during the render, including overwritten ones.
    pub fn blocks(&self) -> &[TaskBlock] {
        &self.blocks
    }

    /// Blocks whose start cell still belongs to them.
    pub fn visible_blocks(&self) -> impl Iterator<Item = &TaskBlock> + '_ {
        self.blocks
            .iter()
            .enumerate()
            .filter(|(index, block)| self.owns_start(*index, block))
            .map(|(_, block)| block)
    }

    /// Visible block covering `slot`.
    ///
    /// Leftover cells of a block whose start was overwritten resolve to
    /// `None`, since nothing is drawn for that block.
    pub fn block_at(&self, slot: Slot) -> Option<&TaskBlock> {
        let index = match self.cell(slot) {
            CellState::Start(index) | CellState::Hidden(index) => index,
            CellState::Empty => return None,
        };
        self.blocks
            .get(index)
            .filter(|block| self.owns_start(index, block))
    }

    fn owns_start(&self, index: usize, block: &TaskBlock) -> bool {
        self.cells[block.start_row][usize::from(block.day)] == CellState::Start(index)
    }

    /// Number of tasks skipped because their start slot was off the grid.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    fn place(&mut self, task: &Task) {
        let Some(start_row) = task.slot().row() else {
            self.skipped += 1;
            debug!(
                "event=grid_render module=grid status=skip task_id={} error_code=slot_not_found",
                task.id
            );
            return;
        };

        let day = usize::from(task.day);
        let requested_span = task.span();
        let span = requested_span.min(SLOTS_PER_DAY - start_row);
        let index = self.blocks.len();

        self.cells[start_row][day] = CellState::Start(index);
        for row in start_row + 1..start_row + span {
            self.cells[row][day] = CellState::Hidden(index);
        }

        self.blocks.push(TaskBlock {
            task_id: task.id,
            day: task.day,
            start_row,
            span,
            requested_span,
            text: task.text.clone(),
            color: task.color,
        });
    }
}

/// Builds the grid for `week` from `tasks`, in order.
pub fn render_week(week: WeekKey, tasks: &[Task]) -> WeekGrid {
    let mut grid = WeekGrid::empty(week);
    for task in tasks {
        grid.place(task);
    }
    debug!(
        "event=grid_render module=grid status=ok week={week} blocks={} skipped={}",
        grid.blocks.len(),
        grid.skipped
    );
    grid
}

/// Holds the most recent render; each call rebuilds from scratch.
#[derive(Debug, Clone)]
pub struct GridRenderer {
    current: WeekGrid,
}

impl GridRenderer {
    pub fn new(week: WeekKey) -> Self {
        Self {
            current: WeekGrid::empty(week),
        }
    }

    /// Replaces the current grid with a fresh render of `tasks`.
    pub fn render(&mut self, week: WeekKey, tasks: &[Task]) -> &WeekGrid {
        self.current = render_week(week, tasks);
        &self.current
    }

    pub fn current(&self) -> &WeekGrid {
        &self.current
    }
}
