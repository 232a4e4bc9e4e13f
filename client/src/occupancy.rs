use navview_shared::{MapGeometry, OccupancyGrid};

const OCCUPIED: u8 = 0;
const FREE: u8 = 255;
const UNKNOWN: u8 = 127;

/// A decoded map ready to be blitted: RGBA rows top-down.
#[derive(Debug, Clone, PartialEq)]
pub struct MapLayer {
    pub geometry: MapGeometry,
    pub columns: u32,
    pub rows: u32,
    pub rgba: Vec<u8>,
    /// Bumped on every new map so the canvas knows to rebuild its bitmap.
    pub generation: u64,
}

impl MapLayer {
    pub fn from_grid(grid: &OccupancyGrid, generation: u64) -> Self {
        Self {
            geometry: MapGeometry::from_grid(grid),
            columns: grid.info.width,
            rows: grid.info.height,
            rgba: grid_rgba(grid),
            generation,
        }
    }
}

fn cell_shade(value: i8) -> u8 {
    match value {
        100 => OCCUPIED,
        0 => FREE,
        _ => UNKNOWN,
    }
}

/// Grid row 0 is the bottom of the map, bitmap row 0 is the top.
pub fn grid_rgba(grid: &OccupancyGrid) -> Vec<u8> {
    let columns = grid.info.width as usize;
    let rows = grid.info.height as usize;
    let mut rgba = vec![0u8; columns * rows * 4];
    for row in 0..rows {
        let target_row = rows - row - 1;
        for col in 0..columns {
            let value = grid.data.get(row * columns + col).copied().unwrap_or(-1);
            let shade = cell_shade(value);
            let at = (target_row * columns + col) * 4;
            rgba[at..at + 4].copy_from_slice(&[shade, shade, shade, 255]);
        }
    }
    rgba
}
