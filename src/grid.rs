//! Grid model: a square matrix of cells whose states cycle modulo `base`.
//!
//! Clicking a cell bumps it and its four orthogonal neighbours. Neighbours that
//! fall off the board are clipped, never wrapped.

/// Neighbourhood touched by a click: the cell itself, then left, right, up, down.
pub const NEIGHBOURHOOD: [(i64, i64); 5] = [(0, 0), (-1, 0), (1, 0), (0, -1), (0, 1)];

/// Grid dimensions. Both values are validated at the parse boundary
/// (see [`crate::session::parse_setting`]); the grid only clamps the base.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridConfig {
    pub size: usize,
    pub base: u32,
}

impl GridConfig {
    pub fn new(size: usize, base: u32) -> Self {
        Self { size, base }
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            size: crate::DEFAULT_SIZE,
            base: crate::DEFAULT_BASE,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    x: usize,
    y: usize,
    pub state: u32,
}

impl Cell {
    pub fn x(&self) -> usize {
        self.x
    }
    pub fn y(&self) -> usize {
        self.y
    }
}

/// Runtime grid. Cells are stored row-major, `cells.len() == size * size`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    size: usize,
    base: u32,
    cells: Vec<Cell>,
}

impl Grid {
    /// Build a fresh all-zero grid. The base is clamped to `1..=MAX_BASE` so the
    /// modulus is never zero and every state fits one decimal digit; a zero size
    /// yields an empty grid.
    pub fn new(size: usize, base: u32) -> Self {
        let mut cells = Vec::with_capacity(size * size);
        for y in 0..size {
            for x in 0..size {
                cells.push(Cell { x, y, state: 0 });
            }
        }
        Self {
            size,
            base: base.clamp(1, crate::MAX_BASE),
            cells,
        }
    }

    pub fn from_config(config: GridConfig) -> Self {
        Self::new(config.size, config.base)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    pub fn config(&self) -> GridConfig {
        GridConfig::new(self.size, self.base)
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    fn index(&self, x: i64, y: i64) -> Option<usize> {
        let size = self.size as i64;
        if x >= 0 && x < size && y >= 0 && y < size {
            Some(y as usize * self.size + x as usize)
        } else {
            None
        }
    }

    /// Bounds-checked lookup; `None` for anything outside `[0,size)²`.
    pub fn get_cell(&self, x: i64, y: i64) -> Option<&Cell> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    pub fn get_cell_mut(&mut self, x: i64, y: i64) -> Option<&mut Cell> {
        self.index(x, y).map(move |i| &mut self.cells[i])
    }

    /// Apply one click at `(x, y)`. Returns how many cells changed, which is
    /// 0 for an off-grid click and at most 5.
    pub fn increment_around(&mut self, x: i64, y: i64) -> usize {
        let base = self.base;
        let mut touched = 0;
        for (dx, dy) in NEIGHBOURHOOD {
            if let Some(cell) = self.get_cell_mut(x + dx, y + dy) {
                cell.state = (cell.state % base + 1) % base;
                touched += 1;
            }
        }
        touched
    }

    /// Direct assignment used when restoring a saved state. The value is not
    /// checked against `base`; the codec validates digits before calling this.
    pub fn set_cell_state(&mut self, x: i64, y: i64, value: u32) {
        if let Some(cell) = self.get_cell_mut(x, y) {
            cell.state = value;
        }
    }

    /// Row-major digit string, one character per cell. A value stored through
    /// `set_cell_state` at or above `base` is written as its residue.
    pub fn serialize_state(&self) -> String {
        // base <= MAX_BASE = 10, so every residue is a single decimal digit.
        self.cells
            .iter()
            .map(|c| char::from(b'0' + (c.state % self.base) as u8))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_grid_is_all_zero() {
        let g = Grid::new(4, 3);
        assert_eq!(g.cells().len(), 16);
        assert!(g.cells().iter().all(|c| c.state == 0));
        assert_eq!(g.serialize_state(), "0000000000000000");
    }

    #[test]
    fn test_get_cell_bounds() {
        let g = Grid::new(3, 2);
        for y in 0..3 {
            for x in 0..3 {
                let c = g.get_cell(x, y).unwrap();
                assert_eq!((c.x() as i64, c.y() as i64), (x, y));
            }
        }
        assert!(g.get_cell(-1, 0).is_none());
        assert!(g.get_cell(0, -1).is_none());
        assert!(g.get_cell(3, 0).is_none());
        assert!(g.get_cell(0, 3).is_none());
    }

    #[test]
    fn test_center_click() {
        let mut g = Grid::new(3, 2);
        assert_eq!(g.increment_around(1, 1), 5);
        assert_eq!(g.serialize_state(), "010111010");
    }

    #[test]
    fn test_corner_click_is_clipped() {
        let mut g = Grid::new(2, 3);
        assert_eq!(g.increment_around(0, 0), 3);
        assert_eq!(g.serialize_state(), "1110");
    }

    #[test]
    fn test_edge_click_touches_four() {
        let mut g = Grid::new(3, 4);
        assert_eq!(g.increment_around(1, 0), 4);
        assert_eq!(g.serialize_state(), "111010000");
    }

    #[test]
    fn test_off_grid_click_is_noop() {
        let mut g = Grid::new(3, 2);
        assert_eq!(g.increment_around(5, 5), 0);
        assert_eq!(g, Grid::new(3, 2));
    }

    #[test]
    fn test_click_just_outside_reaches_border_cell() {
        // Center is off-grid but its right neighbour (0,0) is not.
        let mut g = Grid::new(2, 2);
        assert_eq!(g.increment_around(-1, 0), 1);
        assert_eq!(g.serialize_state(), "1000");
    }

    #[test]
    fn test_state_cycles_modulo_base() {
        let mut g = Grid::new(1, 5);
        g.set_cell_state(0, 0, 3);
        for _ in 0..5 {
            g.increment_around(0, 0);
        }
        assert_eq!(g.get_cell(0, 0).unwrap().state, 3);
    }

    #[test]
    fn test_base_one_is_degenerate() {
        let mut g = Grid::new(2, 1);
        g.increment_around(0, 0);
        assert_eq!(g.serialize_state(), "0000");
    }

    #[test]
    fn test_zero_base_and_size() {
        let mut g = Grid::new(2, 0);
        assert_eq!(g.base(), 1);
        g.increment_around(1, 1);
        let empty = Grid::new(0, 2);
        assert!(empty.cells().is_empty());
        assert_eq!(empty.serialize_state(), "");
    }

    #[test]
    fn test_base_is_clamped_to_one_digit() {
        let mut g = Grid::new(1, 12);
        assert_eq!(g.base(), crate::MAX_BASE);
        for _ in 0..9 {
            g.increment_around(0, 0);
        }
        assert_eq!(g.serialize_state(), "9");
        g.increment_around(0, 0);
        assert_eq!(g.get_cell(0, 0).unwrap().state, 0);
        assert_eq!(g.serialize_state(), "0");
    }

    #[test]
    fn test_oversized_stored_state_does_not_overflow() {
        let mut g = Grid::new(1, 3);
        g.set_cell_state(0, 0, u32::MAX);
        // u32::MAX % 3 == 0
        assert_eq!(g.serialize_state(), "0");
        g.increment_around(0, 0);
        assert_eq!(g.get_cell(0, 0).unwrap().state, 1);
    }

    #[test]
    fn test_set_cell_state_out_of_bounds_ignored() {
        let mut g = Grid::new(2, 3);
        g.set_cell_state(2, 0, 1);
        g.set_cell_state(1, 1, 2);
        assert_eq!(g.serialize_state(), "0002");
    }
}
