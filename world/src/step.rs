//! Single-step update of every occupied cell.

use sandblaster_core::{Catalog, ParticleType, RandomSource};

use crate::grid::Grid;

/// Compass offsets visited when an agent looks for transmutation targets.
const NEIGHBORS: [(i32, i32); 8] = [
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];

/// Mutable borrow of everything one step touches.
pub(crate) struct StepPass<'a, R: RandomSource + ?Sized> {
    pub(crate) grid: &'a mut Grid,
    pub(crate) catalog: &'a Catalog,
    pub(crate) rng: &'a mut R,
    pub(crate) tick: u64,
}

impl<'a, R: RandomSource + ?Sized> StepPass<'a, R> {
    /// Visits rows bottom to top, each in a direction chosen by one coin flip.
    pub(crate) fn run(mut self) {
        let width = i32::from(self.grid.width());
        for y in 0..i32::from(self.grid.height()) {
            if self.rng.next_bool() {
                for x in (0..width).rev() {
                    self.update_cell(x, y);
                }
            } else {
                for x in 0..width {
                    self.update_cell(x, y);
                }
            }
        }
    }

    fn update_cell(&mut self, x: i32, y: i32) {
        let catalog = self.catalog;
        let Some(particle) = self
            .grid
            .particle(x, y)
            .and_then(|ordinal| catalog.by_ordinal(ordinal))
        else {
            return;
        };

        let top = i32::from(self.grid.height()) - 1;
        if y == 0 && particle.density() > 0.0 {
            self.grid.assign(x, y, None, self.tick);
            return;
        }
        if y == top && particle.density() < 0.0 {
            self.grid.assign(x, y, None, self.tick);
        }

        let fresh = self.grid.get(x, y).last_set() == self.tick;

        if particle.transmutation_count() > 0 && !fresh {
            self.transmute_neighbors(particle, x, y);
        }

        if !fresh
            && particle.decay_probability() > 0.0
            && self.rng.next_f32() < particle.decay_probability()
        {
            let age = self.grid.grow_older(x, y);
            if particle.outlived(age) {
                let product = particle.decay_products().pick(&mut *self.rng);
                self.grid.assign(x, y, product, self.tick);
                return;
            }
        }

        if !particle.mobile() || fresh {
            return;
        }

        if self.rng.next_f32() < particle.viscosity() && self.slide(particle, x, y) {
            return;
        }

        self.settle(particle, x, y);
    }

    fn transmute_neighbors(&mut self, agent: &ParticleType, x: i32, y: i32) {
        for (dx, dy) in NEIGHBORS {
            let (nx, ny) = (x + dx, y + dy);
            if !self.grid.contains(nx, ny) {
                continue;
            }
            let neighbor = *self.grid.get(nx, ny);
            if neighbor.last_set() == self.tick || neighbor.is_empty() {
                continue;
            }
            let outcome =
                self.catalog
                    .maybe_transmute(Some(agent.ordinal()), neighbor.particle(), &mut *self.rng);
            if outcome != neighbor.particle() {
                self.grid.assign(nx, ny, outcome, self.tick);
            }
        }
    }

    /// Attempts a one-column sideways move and reports whether it happened.
    fn slide(&mut self, particle: &ParticleType, x: i32, y: i32) -> bool {
        let nx = if self.rng.next_bool() { x + 1 } else { x - 1 };
        let density = particle.density();

        if density > 0.0 {
            if y - 1 < 0 {
                return false;
            }
            let Some(below) = self.particle_at(x, y - 1) else {
                return false;
            };
            if below.mobile() && density > below.density() {
                return false;
            }
            if !self.displaces_sideways(nx, y, |other| {
                (density > other).then_some(density - other)
            }) {
                return false;
            }
            if self.grid.get(nx, y - 1).last_floated() == self.tick {
                return false;
            }
            self.grid.swap(x, y, nx, y, self.tick);
            self.grid.mark_floated(x, y, self.tick);
            true
        } else if density < 0.0 {
            if y + 1 >= i32::from(self.grid.height())
                || self.grid.get(x, y).last_floated() == self.tick
            {
                return false;
            }
            let Some(above) = self.particle_at(x, y + 1) else {
                return false;
            };
            if above.mobile() && density < above.density() {
                return false;
            }
            if !self.displaces_sideways(nx, y, |other| {
                (density < other).then_some(other - density)
            }) {
                return false;
            }
            self.grid.swap(x, y, nx, y, self.tick);
            self.grid.mark_floated(nx, y + 1, self.tick);
            true
        } else {
            false
        }
    }

    /// Decides whether the mover may enter `(nx, y)`. An empty destination
    /// always admits it; a mobile occupant is displaced with probability
    /// given by `margin` when it returns `Some`.
    fn displaces_sideways<F>(&mut self, nx: i32, y: i32, margin: F) -> bool
    where
        F: Fn(f32) -> Option<f32>,
    {
        let Some(occupant) = self.particle_at(nx, y) else {
            return true;
        };
        if !occupant.mobile() {
            return false;
        }
        match margin(occupant.density()) {
            Some(chance) => self.rng.next_f32() < chance,
            None => false,
        }
    }

    fn settle(&mut self, particle: &ParticleType, x: i32, y: i32) {
        let density = particle.density();

        let below = self.particle_at(x, y - 1);
        let sinks = match below {
            None => density > 0.0,
            Some(other) => other.mobile() && density > other.density(),
        };
        if sinks {
            let certain = below.map_or(true, |other| other.density() == 0.0);
            if certain || self.rng.next_f32() < density - below.map_or(0.0, ParticleType::density) {
                self.grid.swap(x, y, x, y - 1, self.tick);
                self.grid.mark_floated(x, y, self.tick);
            }
            return;
        }

        if self.grid.get(x, y).last_floated() == self.tick {
            return;
        }
        let above = self.particle_at(x, y + 1);
        let rises = match above {
            None => density < 0.0,
            Some(other) => other.mobile() && density < other.density(),
        };
        if rises {
            let certain = above.map_or(true, |other| other.density() == 0.0);
            if certain || self.rng.next_f32() < above.map_or(0.0, ParticleType::density) - density {
                self.grid.swap(x, y, x, y + 1, self.tick);
                self.grid.mark_floated(x, y + 1, self.tick);
            }
        }
    }

    fn particle_at(&self, x: i32, y: i32) -> Option<&'a ParticleType> {
        let catalog = self.catalog;
        self.grid
            .particle(x, y)
            .and_then(|ordinal| catalog.by_ordinal(ordinal))
    }
}
