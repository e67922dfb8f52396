//! Host-owned color buffer filled from the grid.

use sandblaster_core::{Catalog, Color};

use crate::grid::Grid;

/// Row-major buffer of packed ARGB colors, one per grid cell.
///
/// Row 0 of the buffer is the topmost simulation row.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u16,
    height: u16,
    pixels: Vec<u32>,
}

impl PixelBuffer {
    /// Allocates a black buffer sized for a `width × height` grid.
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::BLACK.argb(); usize::from(width) * usize::from(height)],
        }
    }

    /// Number of pixels per row.
    #[must_use]
    pub const fn width(&self) -> u16 {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> u16 {
        self.height
    }

    /// Packed colors in row-major order.
    #[must_use]
    pub fn as_slice(&self) -> &[u32] {
        &self.pixels
    }

    /// Color of the pixel at image coordinates, where row 0 is the top.
    #[must_use]
    pub fn pixel(&self, column: u16, row: u16) -> Option<u32> {
        if column >= self.width || row >= self.height {
            return None;
        }
        self.pixels
            .get(usize::from(row) * usize::from(self.width) + usize::from(column))
            .copied()
    }

    /// Consumes the buffer, yielding its colors.
    #[must_use]
    pub fn into_vec(self) -> Vec<u32> {
        self.pixels
    }

    pub(crate) fn fill_from(&mut self, grid: &Grid, catalog: &Catalog) {
        if self.width != grid.width() || self.height != grid.height() {
            *self = Self::new(grid.width(), grid.height());
        }
        let width = usize::from(self.width);
        if width == 0 {
            return;
        }
        for (row, pixels) in self.pixels.chunks_mut(width).enumerate() {
            let y = i32::from(grid.height()) - 1 - row as i32;
            for (x, pixel) in pixels.iter_mut().enumerate() {
                *pixel = grid
                    .particle(x as i32, y)
                    .and_then(|ordinal| catalog.by_ordinal(ordinal))
                    .map_or(Color::BLACK, |particle| particle.color())
                    .argb();
            }
        }
    }
}
