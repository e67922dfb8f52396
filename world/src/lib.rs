#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative sandbox state for the Sandblaster engine.
//!
//! A [`Simulation`] owns one [`Grid`], a shared reference to the active
//! [`Catalog`], a tick counter and its own [`RandomSource`]. Hosts place
//! particles, advance the automaton with [`Simulation::iterate`] and read the
//! result back through [`Simulation::render_into`] or the [`query`] module.

mod config;
mod grid;
mod pixels;
mod resolve;
mod step;

use std::{collections::BTreeMap, sync::Arc};

use sandblaster_core::{Catalog, Ordinal, ParticleType, ProtocolError, RandomSource, SeededRandom};
use tracing::{debug, warn};

pub use config::{SimulationConfig, DEFAULT_HEIGHT, DEFAULT_WIDTH};
pub use grid::{Cell, Grid, RemapOutcome};
pub use pixels::PixelBuffer;
pub use resolve::ResolveParticle;

use step::StepPass;

/// Placement probability of each disc stamped along a [`Simulation::line`].
const LINE_PROBABILITY: f32 = 0.1;

/// Continuous emitter that rewrites its cell before every step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Source {
    x: i32,
    y: i32,
    particle: Ordinal,
}

impl Source {
    /// Column of the emitter.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Row of the emitter.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Particle type written by the emitter.
    #[must_use]
    pub const fn particle(&self) -> Ordinal {
        self.particle
    }
}

/// One host-visible sandbox.
#[derive(Debug)]
pub struct Simulation<R = SeededRandom> {
    catalog: Arc<Catalog>,
    grid: Grid,
    rng: R,
    tick: u64,
    sources: BTreeMap<(i32, i32), Ordinal>,
}

impl Simulation<SeededRandom> {
    /// Creates an empty sandbox using the configured dimensions and seed.
    #[must_use]
    pub fn new(catalog: Arc<Catalog>, config: SimulationConfig) -> Self {
        Self::with_random(
            catalog,
            config.width(),
            config.height(),
            SeededRandom::from_optional_seed(config.seed()),
        )
    }
}

impl<R: RandomSource> Simulation<R> {
    /// Creates an empty sandbox drawing every probability from `rng`.
    #[must_use]
    pub fn with_random(catalog: Arc<Catalog>, width: u16, height: u16, rng: R) -> Self {
        Self {
            catalog,
            grid: Grid::new(width, height),
            rng,
            tick: 0,
            sources: BTreeMap::new(),
        }
    }

    /// Catalog consulted by every step.
    #[must_use]
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Number of grid columns.
    #[must_use]
    pub fn width(&self) -> u16 {
        self.grid.width()
    }

    /// Number of grid rows.
    #[must_use]
    pub fn height(&self) -> u16 {
        self.grid.height()
    }

    /// Number of completed steps.
    #[must_use]
    pub const fn iteration(&self) -> u64 {
        self.tick
    }

    /// Writes a particle into one cell.
    ///
    /// References that do not resolve against the active catalog empty the
    /// cell. Coordinates outside the grid are ignored.
    pub fn set_particle<P: ResolveParticle>(&mut self, x: i32, y: i32, particle: P) {
        let particle = particle.resolve(&self.catalog);
        self.grid.assign(x, y, particle, self.tick);
    }

    /// Stamps a particle into every cell within `radius` of `(x, y)`.
    ///
    /// Mobile particles land in each cell with `probability`; immobile
    /// particles and erasures are always applied.
    pub fn stamp<P: ResolveParticle>(
        &mut self,
        x: i32,
        y: i32,
        particle: P,
        radius: i32,
        probability: f32,
    ) {
        let particle = particle.resolve(&self.catalog);
        self.stamp_resolved(x, y, particle, radius, probability);
    }

    /// Draws a line of discs from `(x2, y2)` to `(x1, y1)` inclusive.
    ///
    /// Each sampled point receives a disc of `radius` placed with a fixed
    /// low probability. Coincident endpoints stamp a single disc. Only the
    /// stretch of the line whose discs can reach the grid is walked.
    pub fn line<P: ResolveParticle>(
        &mut self,
        particle: P,
        radius: i32,
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
    ) {
        if radius < 0 {
            return;
        }
        let particle = particle.resolve(&self.catalog);
        let dx = i64::from(x1) - i64::from(x2);
        let dy = i64::from(y1) - i64::from(y2);
        let steps = dx.abs().max(dy.abs());
        if steps == 0 {
            self.stamp_resolved(x1, y1, particle, radius, LINE_PROBABILITY);
            return;
        }

        let margin = i64::from(radius);
        let columns = (-margin, i64::from(self.grid.width()) - 1 + margin);
        let rows = (-margin, i64::from(self.grid.height()) - 1 + margin);
        let Some((first, last)) = visible_steps(i64::from(x2), dx, steps, columns)
            .zip(visible_steps(i64::from(y2), dy, steps, rows))
            .map(|((a, b), (c, d))| (a.max(c), b.min(d)))
        else {
            return;
        };

        for step in first..=last {
            let x = line_point(x2, dx, step, steps);
            let y = line_point(y2, dy, step, steps);
            if let (Ok(x), Ok(y)) = (i32::try_from(x), i32::try_from(y)) {
                self.stamp_resolved(x, y, particle, radius, LINE_PROBABILITY);
            }
        }
    }

    /// Empties every cell and removes every source.
    pub fn clear(&mut self) {
        self.grid.clear();
        self.sources.clear();
    }

    /// Exchanges two occupants, ages included.
    ///
    /// When one endpoint lies outside the grid the other is emptied.
    pub fn swap(&mut self, x1: i32, y1: i32, x2: i32, y2: i32) {
        self.grid.swap(x1, y1, x2, y2, self.tick);
    }

    /// Applies every source, then advances the automaton by one tick.
    pub fn iterate(&mut self) {
        for (&(x, y), &particle) in &self.sources {
            self.grid.assign(x, y, Some(particle), self.tick);
        }

        self.tick = self.tick.saturating_add(1);
        StepPass {
            grid: &mut self.grid,
            catalog: &self.catalog,
            rng: &mut self.rng,
            tick: self.tick,
        }
        .run();
    }

    /// Renders the grid into a freshly allocated color vector.
    #[must_use]
    pub fn pixels(&self) -> Vec<u32> {
        let mut buffer = PixelBuffer::default();
        self.render_into(&mut buffer);
        buffer.into_vec()
    }

    /// Renders the grid into a host-owned buffer, reallocating it when the
    /// grid dimensions changed.
    pub fn render_into(&self, buffer: &mut PixelBuffer) {
        buffer.fill_from(&self.grid, &self.catalog);
    }

    /// Replaces the grid with an empty one of the requested size, keeping
    /// only the sources that still fit.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.grid = Grid::new(width, height);
        let grid = &self.grid;
        self.sources.retain(|&(x, y), _| grid.contains(x, y));
    }

    /// Registers a source emitting `particle` at `(x, y)`.
    ///
    /// A reference that does not resolve removes any source at that
    /// position; positions outside the grid are ignored.
    pub fn add_source<P: ResolveParticle>(&mut self, particle: P, x: i32, y: i32) {
        let Some(particle) = particle.resolve(&self.catalog) else {
            self.remove_source(x, y);
            return;
        };
        if self.grid.contains(x, y) {
            let _ = self.sources.insert((x, y), particle);
        }
    }

    /// Removes the source at `(x, y)`, if any.
    pub fn remove_source(&mut self, x: i32, y: i32) {
        let _ = self.sources.remove(&(x, y));
    }

    /// Registered sources ordered by column, then row.
    pub fn sources(&self) -> impl Iterator<Item = Source> + '_ {
        self.sources
            .iter()
            .map(|(&(x, y), &particle)| Source { x, y, particle })
    }

    /// Decodes `bytes` and installs the result as the active catalog.
    ///
    /// A rejected stream leaves the simulation untouched.
    pub fn load_catalog(&mut self, bytes: &[u8]) -> Result<RemapOutcome, ProtocolError> {
        match Catalog::decode(bytes) {
            Ok(catalog) => Ok(self.replace_catalog(Arc::new(catalog))),
            Err(error) => {
                warn!(%error, "rejected particle catalog");
                Err(error)
            }
        }
    }

    /// Installs `catalog`, translating every occupied cell and source by
    /// external identifier. Occupants without a counterpart are removed.
    pub fn replace_catalog(&mut self, catalog: Arc<Catalog>) -> RemapOutcome {
        let translation: Vec<Option<Ordinal>> = self
            .catalog
            .iter()
            .map(|particle| {
                catalog
                    .by_external_id(particle.id())
                    .map(ParticleType::ordinal)
            })
            .collect();
        let translate = |ordinal: Ordinal| translation.get(ordinal.index()).copied().flatten();

        let outcome = self.grid.remap(translate);
        self.sources.retain(|_, particle| match translate(*particle) {
            Some(next) => {
                *particle = next;
                true
            }
            None => false,
        });
        self.catalog = catalog;

        debug!(
            particle_types = self.catalog.len(),
            kept = outcome.kept,
            dropped = outcome.dropped,
            sources = self.sources.len(),
            "installed particle catalog"
        );
        outcome
    }

    fn stamp_resolved(
        &mut self,
        x: i32,
        y: i32,
        particle: Option<Ordinal>,
        radius: i32,
        probability: f32,
    ) {
        if radius < 0 {
            return;
        }
        let spray = particle
            .and_then(|ordinal| self.catalog.by_ordinal(ordinal))
            .is_some_and(ParticleType::mobile);
        let (x, y, radius) = (i64::from(x), i64::from(y), i64::from(radius));
        let reach = radius * radius;
        let right = (x + radius).min(i64::from(self.grid.width()) - 1);
        let top = (y + radius).min(i64::from(self.grid.height()) - 1);
        for column in (x - radius).max(0)..=right {
            for row in (y - radius).max(0)..=top {
                let (i, j) = (column - x, row - y);
                if i * i + j * j > reach {
                    continue;
                }
                if spray && self.rng.next_f32() >= probability {
                    continue;
                }
                if let (Ok(column), Ok(row)) = (i32::try_from(column), i32::try_from(row)) {
                    self.grid.assign(column, row, particle, self.tick);
                }
            }
        }
    }
}

/// Point `step` of `steps` along an axis starting at `start` and spanning
/// `delta`, rounded half up.
fn line_point(start: i32, delta: i64, step: i64, steps: i64) -> i64 {
    let scaled = 2 * i128::from(step) * i128::from(delta) + i128::from(steps);
    let offset = scaled.div_euclid(2 * i128::from(steps));
    // |offset| <= |delta|, which fits in i64.
    i64::from(start) + i64::try_from(offset).unwrap_or(delta)
}

/// Range of steps whose point on one axis may land within `[low, high]`,
/// widened by one cell to absorb rounding.
fn visible_steps(
    start: i64,
    delta: i64,
    steps: i64,
    (low, high): (i64, i64),
) -> Option<(i64, i64)> {
    if delta == 0 {
        return (low..=high).contains(&start).then_some((0, steps));
    }
    let (near, far) = if delta > 0 {
        (low - start - 1, high - start + 1)
    } else {
        (start - high - 1, start - low + 1)
    };
    let span = i128::from(delta.abs());
    let steps = i128::from(steps);
    let first = -((-i128::from(near) * steps).div_euclid(span));
    let last = (i128::from(far) * steps).div_euclid(span);
    if first > last || last < 0 || first > steps {
        return None;
    }
    let narrow = |value: i128| i64::try_from(value.clamp(0, steps)).ok();
    narrow(first).zip(narrow(last))
}

/// Query functions that provide read-only access to a simulation.
pub mod query {
    use std::collections::BTreeMap;

    use sandblaster_core::{Catalog, Ordinal, ParticleType};

    use super::{Cell, Grid, Simulation};

    /// Provides read-only access to the simulation's grid.
    #[must_use]
    pub fn grid<R>(simulation: &Simulation<R>) -> &Grid {
        &simulation.grid
    }

    /// Provides read-only access to the active catalog.
    #[must_use]
    pub fn catalog<R>(simulation: &Simulation<R>) -> &Catalog {
        &simulation.catalog
    }

    /// Cell at the coordinate, or the empty sentinel outside the grid.
    #[must_use]
    pub fn cell<R>(simulation: &Simulation<R>, x: i32, y: i32) -> &Cell {
        simulation.grid.get(x, y)
    }

    /// Particle type occupying the coordinate.
    #[must_use]
    pub fn particle_at<R>(simulation: &Simulation<R>, x: i32, y: i32) -> Option<&ParticleType> {
        simulation
            .grid
            .particle(x, y)
            .and_then(|ordinal| simulation.catalog.by_ordinal(ordinal))
    }

    /// Number of completed steps.
    #[must_use]
    pub fn iteration<R>(simulation: &Simulation<R>) -> u64 {
        simulation.tick
    }

    /// Number of occupied cells.
    #[must_use]
    pub fn occupied_cells<R>(simulation: &Simulation<R>) -> usize {
        simulation
            .grid
            .iter()
            .filter(|(_, _, cell)| !cell.is_empty())
            .count()
    }

    /// Number of cells held by each particle type present on the grid.
    #[must_use]
    pub fn population<R>(simulation: &Simulation<R>) -> BTreeMap<Ordinal, usize> {
        let mut counts = BTreeMap::new();
        for (_, _, cell) in simulation.grid.iter() {
            if let Some(ordinal) = cell.particle() {
                *counts.entry(ordinal).or_insert(0) += 1;
            }
        }
        counts
    }
}
