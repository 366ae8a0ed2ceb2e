//! PNG raster of a rendered week grid.
//!
//! Labels use the 8x8 ASCII glyphs of `font8x8`; characters without a glyph
//! leave a blank cell. Text is cut to whole glyphs that fit its box.

use super::{export_file_stem, ExportError, ExportResult};
use crate::grid::{TaskBlock, WeekGrid, UNIT_HEIGHT_PX};
use crate::model::task::{DAYS_PER_WEEK, SLOTS_PER_DAY};
use crate::model::week::DAY_NAMES;
use ::image::{ImageBuffer, Rgb, RgbImage};
use font8x8::{UnicodeFonts, BASIC_FONTS};
use log::info;
use std::path::{Path, PathBuf};

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const GUTTER: Rgb<u8> = Rgb([242, 242, 242]);
const HALF_HOUR_LINE: Rgb<u8> = Rgb([230, 230, 230]);
const HOUR_LINE: Rgb<u8> = Rgb([200, 200, 200]);
const BORDER: Rgb<u8> = Rgb([0, 0, 0]);
const TEXT: Rgb<u8> = Rgb([0, 0, 0]);

const GLYPH_PX: u32 = 8;
/// Inset of block text from the block's outer edge.
const TEXT_PAD_X: u32 = 3;
const TEXT_PAD_Y: u32 = 4;

/// Pixel geometry of the exported image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageLayout {
    pub gutter_width: u32,
    pub header_height: u32,
    pub column_width: u32,
}

impl Default for ImageLayout {
    fn default() -> Self {
        Self {
            gutter_width: 40,
            header_height: 20,
            column_width: 100,
        }
    }
}

impl ImageLayout {
    pub fn width(&self) -> u32 {
        self.gutter_width + u32::from(DAYS_PER_WEEK) * self.column_width
    }

    pub fn height(&self) -> u32 {
        self.header_height + SLOTS_PER_DAY as u32 * UNIT_HEIGHT_PX
    }
}

/// Draws `grid` into an in-memory image.
pub fn rasterize(grid: &WeekGrid, layout: ImageLayout) -> RgbImage {
    let width = layout.width();
    let height = layout.height();
    let mut image = ImageBuffer::from_pixel(width, height, BACKGROUND);

    fill_rect(&mut image, 0, 0, layout.gutter_width, height, GUTTER);
    fill_rect(&mut image, 0, 0, width, layout.header_height, GUTTER);

    for row in 0..=SLOTS_PER_DAY as u32 {
        let y = layout.header_height + row * UNIT_HEIGHT_PX;
        let color = if row % 2 == 0 { HOUR_LINE } else { HALF_HOUR_LINE };
        fill_rect(&mut image, layout.gutter_width, y, width, 1, color);
    }
    for day in 0..=u32::from(DAYS_PER_WEEK) {
        let x = layout.gutter_width + day * layout.column_width;
        fill_rect(&mut image, x, 0, 1, height, HOUR_LINE);
    }

    draw_day_headers(&mut image, grid, layout);
    draw_time_labels(&mut image, layout);
    for block in grid.visible_blocks() {
        draw_block(&mut image, block, layout);
    }
    image
}

/// `Sun 03-10` centered vertically in the header of each column.
fn draw_day_headers(image: &mut RgbImage, grid: &WeekGrid, layout: ImageLayout) {
    let y = layout.header_height.saturating_sub(GLYPH_PX) / 2;
    for (day, name) in (0..DAYS_PER_WEEK).zip(DAY_NAMES) {
        let label = format!(
            "{} {}",
            &name[..3],
            grid.week().day(day).format("%m-%d")
        );
        let x = layout.gutter_width + u32::from(day) * layout.column_width + TEXT_PAD_X;
        let room = layout.column_width.saturating_sub(2 * TEXT_PAD_X);
        draw_text(image, x, y, &label, room);
    }
}

/// `HH:MM` in the gutter next to every hour line.
fn draw_time_labels(image: &mut RgbImage, layout: ImageLayout) {
    for hour in 0..(SLOTS_PER_DAY as u32 / 2) {
        let y = layout.header_height + hour * 2 * UNIT_HEIGHT_PX + TEXT_PAD_Y;
        draw_text(image, 0, y, &format!("{hour:02}:00"), layout.gutter_width);
    }
}

fn draw_block(image: &mut RgbImage, block: &TaskBlock, layout: ImageLayout) {
    let x = layout.gutter_width + u32::from(block.day) * layout.column_width + 1;
    let y = layout.header_height + block.start_row as u32 * UNIT_HEIGHT_PX + 1;
    let w = layout.column_width.saturating_sub(2);
    let h = block.height_px();
    if w == 0 || h == 0 {
        return;
    }

    fill_rect(image, x, y, w, h, Rgb(block.color.rgb()));
    fill_rect(image, x, y, w, 1, BORDER);
    fill_rect(image, x, y + h - 1, w, 1, BORDER);
    fill_rect(image, x, y, 1, h, BORDER);
    fill_rect(image, x + w - 1, y, 1, h, BORDER);

    if h >= TEXT_PAD_Y + GLYPH_PX + 1 {
        let room = w.saturating_sub(2 * TEXT_PAD_X);
        draw_text(image, x + TEXT_PAD_X, y + TEXT_PAD_Y, block.text.trim(), room);
    }
}

/// Draws as many whole glyphs of `text` as fit in `max_width` pixels.
fn draw_text(image: &mut RgbImage, x: u32, y: u32, text: &str, max_width: u32) {
    let fits = (max_width / GLYPH_PX) as usize;
    for (index, ch) in text.chars().take(fits).enumerate() {
        let Some(rows) = BASIC_FONTS.get(ch) else {
            continue;
        };
        let left = x + index as u32 * GLYPH_PX;
        for (dy, bits) in rows.into_iter().enumerate() {
            for dx in 0..GLYPH_PX {
                if (bits >> dx) & 1 == 0 {
                    continue;
                }
                let (px, py) = (left + dx, y + dy as u32);
                if px < image.width() && py < image.height() {
                    image.put_pixel(px, py, TEXT);
                }
            }
        }
    }
}

fn fill_rect(image: &mut RgbImage, x: u32, y: u32, w: u32, h: u32, color: Rgb<u8>) {
    let x_end = x.saturating_add(w).min(image.width());
    let y_end = y.saturating_add(h).min(image.height());
    for px in x..x_end {
        for py in y..y_end {
            image.put_pixel(px, py, color);
        }
    }
}

/// Writes `schedule_<week>.png` into `out_dir` and returns its path.
pub fn export_week_image(
    grid: &WeekGrid,
    out_dir: impl AsRef<Path>,
    layout: ImageLayout,
) -> ExportResult<PathBuf> {
    let out_dir = out_dir.as_ref();
    std::fs::create_dir_all(out_dir).map_err(|source| ExportError::Io {
        path: out_dir.to_path_buf(),
        source,
    })?;

    let path = out_dir.join(format!("{}.png", export_file_stem(grid.week())));
    rasterize(grid, layout).save(&path)?;

    info!(
        "event=export_image module=export status=ok week={} blocks={}",
        grid.week(),
        grid.visible_blocks().count()
    );
    Ok(path)
}
