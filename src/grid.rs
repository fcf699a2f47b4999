//! Occupancy map access.
//!
//! The map is a square RGBA image: a cell is solid iff its alpha channel is
//! exactly 255, and its RGB bytes are the wall's base color. The tracer only
//! ever borrows the buffer; ownership stays with whoever loaded the image.

use thiserror::Error;

use crate::color::Rgb;

/// Alpha value marking a solid cell. Anything below is empty, including
/// partially transparent pixels; there is no partial occupancy.
pub const SOLID_ALPHA: u8 = 255;

/// Read-only view over a square RGBA map buffer, row-major, origin top-left.
#[derive(Clone, Copy, Debug)]
pub struct OccupancyGrid<'a> {
    data: &'a [u8],
    size: i32,
}

impl<'a> OccupancyGrid<'a> {
    /// Wrap a flat RGBA buffer of a `size` x `size` map.
    ///
    /// # Panics
    ///
    /// Panics if the buffer length is not `4 * size * size`.
    pub fn new(data: &'a [u8], size: u32) -> Self {
        assert_eq!(
            data.len(),
            4 * size as usize * size as usize,
            "map buffer length does not match its size"
        );
        Self {
            data,
            size: size as i32,
        }
    }

    /// Map dimension in cells.
    pub fn size(&self) -> i32 {
        self.size
    }

    /// Whether `(x, y)` lies inside the map.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.size && y < self.size
    }

    /// Whether the cell at `(x, y)` is solid. The coordinates must be in
    /// bounds; check [`contains`](Self::contains) first.
    pub fn is_solid(&self, x: i32, y: i32) -> bool {
        self.data[self.offset(x, y) + 3] == SOLID_ALPHA
    }

    /// The cell's RGB sample. The coordinates must be in bounds.
    pub fn rgb(&self, x: i32, y: i32) -> Rgb {
        let o = self.offset(x, y);
        [self.data[o], self.data[o + 1], self.data[o + 2]]
    }

    fn offset(&self, x: i32, y: i32) -> usize {
        4 * (x + y * self.size) as usize
    }
}

/// Error loading a map image.
#[derive(Debug, Error)]
pub enum MapError {
    /// The occupancy grid only supports square maps.
    #[error("map image must be square, got {width}x{height}")]
    NotSquare {
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
    },
}

/// Owned RGBA map buffer, for loading images and rasterizing test scenes.
#[derive(Clone, Debug)]
pub struct MapBuffer {
    data: Vec<u8>,
    size: u32,
}

impl MapBuffer {
    /// Fully transparent (empty) map of `size` x `size` cells.
    pub fn new(size: u32) -> Self {
        Self {
            data: vec![0; 4 * size as usize * size as usize],
            size,
        }
    }

    /// Take a decoded RGBA image as the map, pixel for pixel.
    pub fn from_image(image: image::RgbaImage) -> Result<Self, MapError> {
        let (width, height) = image.dimensions();
        if width != height {
            return Err(MapError::NotSquare { width, height });
        }
        Ok(Self {
            data: image.into_raw(),
            size: width,
        })
    }

    /// Rasterize a solid axis-aligned rectangle of `color`, clipped to the map.
    pub fn fill_rect(&mut self, x: u32, y: u32, width: u32, height: u32, color: Rgb) {
        for cy in y..(y + height).min(self.size) {
            for cx in x..(x + width).min(self.size) {
                let o = 4 * (cx + cy * self.size) as usize;
                self.data[o] = color[0];
                self.data[o + 1] = color[1];
                self.data[o + 2] = color[2];
                self.data[o + 3] = SOLID_ALPHA;
            }
        }
    }

    /// Built-in 400x400 demo scene: two long pillars, three crossbars and a
    /// low wall, used when no map image is given.
    pub fn demo() -> Self {
        let mut map = Self::new(400);
        let pillar = [200, 200, 205];
        let bar = [214, 64, 64];
        let ledge = [72, 110, 214];

        map.fill_rect(150, 125, 10, 225, pillar);
        map.fill_rect(250, 125, 10, 225, pillar);
        map.fill_rect(200, 150, 10, 25, bar);
        map.fill_rect(200, 200, 10, 25, bar);
        map.fill_rect(200, 250, 10, 25, bar);
        map.fill_rect(150, 340, 100, 10, ledge);
        map
    }

    /// Map dimension in cells.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Borrow the buffer as an occupancy grid.
    pub fn grid(&self) -> OccupancyGrid<'_> {
        OccupancyGrid::new(&self.data, self.size)
    }
}
