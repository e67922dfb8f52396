//! Dense cell storage with forgiving out-of-bounds semantics.

use sandblaster_core::Ordinal;
use serde::{Deserialize, Serialize};

/// Contents and step bookkeeping of a single grid position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    particle: Option<Ordinal>,
    age: u32,
    last_set: u64,
    last_changed: u64,
    last_floated: u64,
}

impl Cell {
    /// Empty cell with zeroed bookkeeping; also returned for reads outside
    /// the grid.
    pub const EMPTY: Self = Self {
        particle: None,
        age: 0,
        last_set: 0,
        last_changed: 0,
        last_floated: 0,
    };

    /// Particle type occupying the cell, if any.
    #[must_use]
    pub const fn particle(&self) -> Option<Ordinal> {
        self.particle
    }

    /// Reports whether the cell holds no particle.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.particle.is_none()
    }

    /// Number of decay rolls the current occupant has accumulated.
    #[must_use]
    pub const fn age(&self) -> u32 {
        self.age
    }

    /// Tick at which the cell was last assigned.
    #[must_use]
    pub const fn last_set(&self) -> u64 {
        self.last_set
    }

    /// Tick at which the occupant last changed identity.
    #[must_use]
    pub const fn last_changed(&self) -> u64 {
        self.last_changed
    }

    /// Tick at which a vertical swap last touched the cell.
    #[must_use]
    pub const fn last_floated(&self) -> u64 {
        self.last_floated
    }
}

/// Dense `width × height` array of cells addressed by signed coordinates.
///
/// `y = 0` is the bottom row. Reads outside the grid yield [`Cell::EMPTY`]
/// and writes outside the grid are discarded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

impl Grid {
    /// Creates an empty grid with the provided dimensions.
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::EMPTY; usize::from(width) * usize::from(height)],
        }
    }

    /// Number of columns.
    #[must_use]
    pub const fn width(&self) -> u16 {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> u16 {
        self.height
    }

    /// Reports whether the coordinate lies inside the grid.
    #[must_use]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.index(x, y).is_some()
    }

    /// Cell at the coordinate, or [`Cell::EMPTY`] outside the grid.
    #[must_use]
    pub fn get(&self, x: i32, y: i32) -> &Cell {
        self.index(x, y).map_or(&Cell::EMPTY, |index| &self.cells[index])
    }

    /// Particle at the coordinate, or `None` outside the grid.
    #[must_use]
    pub fn particle(&self, x: i32, y: i32) -> Option<Ordinal> {
        self.get(x, y).particle
    }

    /// Iterator over `(x, y, cell)` in row-major order starting at the
    /// bottom row.
    pub fn iter(&self) -> impl Iterator<Item = (i32, i32, &Cell)> {
        let width = usize::from(self.width).max(1);
        self.cells.iter().enumerate().map(move |(index, cell)| {
            ((index % width) as i32, (index / width) as i32, cell)
        })
    }

    /// Writes `particle` into the cell, stamping `last_set` and, when the
    /// occupant identity changes, `last_changed`. A changed identity also
    /// resets the age.
    pub(crate) fn assign(&mut self, x: i32, y: i32, particle: Option<Ordinal>, tick: u64) {
        let Some(cell) = self.get_mut(x, y) else {
            return;
        };
        if cell.particle != particle {
            cell.last_changed = tick;
            cell.age = 0;
        }
        cell.last_set = tick;
        cell.particle = particle;
    }

    /// Exchanges two occupants together with their ages.
    ///
    /// When exactly one endpoint lies outside the grid, the in-bounds
    /// endpoint is emptied instead.
    pub(crate) fn swap(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, tick: u64) {
        if !self.contains(x1, y1) {
            self.assign(x2, y2, None, tick);
            return;
        }
        if !self.contains(x2, y2) {
            self.assign(x1, y1, None, tick);
            return;
        }
        let first = *self.get(x1, y1);
        let second = *self.get(x2, y2);
        self.assign(x1, y1, second.particle, tick);
        self.assign(x2, y2, first.particle, tick);
        self.set_age(x1, y1, second.age);
        self.set_age(x2, y2, first.age);
    }

    pub(crate) fn set_age(&mut self, x: i32, y: i32, age: u32) {
        if let Some(cell) = self.get_mut(x, y) {
            cell.age = age;
        }
    }

    /// Increments the occupant's age and returns the new value.
    pub(crate) fn grow_older(&mut self, x: i32, y: i32) -> u32 {
        self.get_mut(x, y).map_or(0, |cell| {
            cell.age = cell.age.saturating_add(1);
            cell.age
        })
    }

    pub(crate) fn mark_floated(&mut self, x: i32, y: i32, tick: u64) {
        if let Some(cell) = self.get_mut(x, y) {
            cell.last_floated = tick;
        }
    }

    /// Empties every cell and forgets all bookkeeping.
    pub(crate) fn clear(&mut self) {
        self.cells.fill(Cell::EMPTY);
    }

    /// Rewrites every occupant through `remap`, keeping bookkeeping intact
    /// for survivors and emptying cells whose occupant maps to `None`.
    pub(crate) fn remap<F>(&mut self, mut remap: F) -> RemapOutcome
    where
        F: FnMut(Ordinal) -> Option<Ordinal>,
    {
        let mut outcome = RemapOutcome::default();
        for cell in &mut self.cells {
            let Some(particle) = cell.particle else {
                continue;
            };
            match remap(particle) {
                Some(next) => {
                    cell.particle = Some(next);
                    outcome.kept += 1;
                }
                None => {
                    *cell = Cell::EMPTY;
                    outcome.dropped += 1;
                }
            }
        }
        outcome
    }

    fn get_mut(&mut self, x: i32, y: i32) -> Option<&mut Cell> {
        let index = self.index(x, y)?;
        self.cells.get_mut(index)
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        let x = usize::try_from(x).ok()?;
        let y = usize::try_from(y).ok()?;
        let width = usize::from(self.width);
        (x < width && y < usize::from(self.height)).then_some(y * width + x)
    }
}

/// Number of occupied cells kept and dropped by a catalog remap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RemapOutcome {
    /// Cells whose occupant resolved in the new catalog.
    pub kept: usize,
    /// Cells emptied because their occupant did not resolve.
    pub dropped: usize,
}
