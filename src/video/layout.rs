//! Tile geometry for the composite picture.

use crate::source::SourceId;

use super::frame::{FrameSize, Rect};

/// Smallest `r >= 1` with `n <= r * r`: the rows (and columns) of a square
/// grid that fits `n` tiles.
///
/// ```
/// use stream_mix::grid_rows;
///
/// assert_eq!(grid_rows(0), 1);
/// assert_eq!(grid_rows(4), 2);
/// assert_eq!(grid_rows(5), 3);
/// ```
pub fn grid_rows(n: usize) -> u32 {
    let mut rows: u32 = 1;
    while (rows as usize) * (rows as usize) < n {
        rows += 1;
    }
    rows
}

/// Destination of cell `index` (row-major) in a `rows x rows` grid.
pub(crate) fn grid_cell(picture: FrameSize, rows: u32, index: usize) -> Rect {
    let rows = rows.max(1);
    let col = index as u32 % rows;
    let row = index as u32 / rows;
    Rect::new(
        col * picture.width / rows,
        row * picture.height / rows,
        picture.width / rows,
        picture.height / rows,
    )
}

/// Destination of the focused tile.
///
/// Alone it fills the picture; otherwise it takes the left three quarters at
/// full height.
pub(crate) fn focus_main(picture: FrameSize, n: usize) -> Rect {
    if n <= 1 {
        return Rect::new(0, 0, picture.width, picture.height);
    }
    Rect::new(0, 0, picture.width * 3 / 4, picture.height)
}

/// Destination of the `slot`-th unfocused tile, stacked top to bottom in
/// the right quarter. `n` counts all tiles including the focused one.
pub(crate) fn focus_side(picture: FrameSize, n: usize, slot: usize) -> Rect {
    let others = (n.max(2) - 1) as u32;
    let x = picture.width * 3 / 4;
    let height = picture.height / others;
    Rect::new(x, slot as u32 * height, picture.width - x, height)
}

/// A snapshot of the video mixer's arrangement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// Rows (and columns) of the grid.
    pub rows: u32,
    /// Row-major grid cells and their occupants; `rows * rows` entries.
    pub cells: Vec<Option<SourceId>>,
    /// The focused source, if focus mode is active.
    pub focus: Option<SourceId>,
    /// Where each source is drawn, in registration order.
    pub tiles: Vec<(SourceId, Rect)>,
}

impl Layout {
    /// Number of occupied cells.
    pub fn occupied(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Destination rectangle of a source.
    pub fn tile_of(&self, id: SourceId) -> Option<Rect> {
        self.tiles.iter().find(|(i, _)| *i == id).map(|(_, r)| *r)
    }
}
