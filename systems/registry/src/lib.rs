#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Registry mapping host session identities to live simulations.

use std::{collections::HashMap, fmt::Debug, hash::Hash, sync::Arc};

use sandblaster_core::Catalog;
use sandblaster_world::{RemapOutcome, Simulation, SimulationConfig};
use tracing::debug;

/// Owns one simulation per host session, creating them on first reference.
///
/// New simulations share the registry's catalog and use its configuration.
/// When the configuration carries a seed, the n-th simulation created is
/// seeded with `seed + n` so sessions never replay each other's stream.
#[derive(Debug)]
pub struct SimulationRegistry<K> {
    catalog: Arc<Catalog>,
    config: SimulationConfig,
    simulations: HashMap<K, Simulation>,
    created: u64,
}

impl<K: Eq + Hash + Debug> SimulationRegistry<K> {
    /// Creates an empty registry handing out simulations built from
    /// `catalog` and `config`.
    #[must_use]
    pub fn new(catalog: Arc<Catalog>, config: SimulationConfig) -> Self {
        Self {
            catalog,
            config,
            simulations: HashMap::new(),
            created: 0,
        }
    }

    /// Returns the simulation for `session`, creating it if this is the
    /// first reference.
    pub fn resolve(&mut self, session: K) -> &mut Simulation {
        let catalog = &self.catalog;
        let config = self.config;
        let created = &mut self.created;
        self.simulations.entry(session).or_insert_with_key(|session| {
            let config = match config.seed() {
                Some(seed) => config.with_seed(seed.wrapping_add(*created)),
                None => config,
            };
            *created += 1;
            debug!(
                ?session,
                width = config.width(),
                height = config.height(),
                "created simulation"
            );
            Simulation::new(Arc::clone(catalog), config)
        })
    }

    /// Returns the simulation for `session` without creating one.
    #[must_use]
    pub fn get(&self, session: &K) -> Option<&Simulation> {
        self.simulations.get(session)
    }

    /// Returns the simulation for `session` mutably without creating one.
    pub fn get_mut(&mut self, session: &K) -> Option<&mut Simulation> {
        self.simulations.get_mut(session)
    }

    /// Removes and returns the simulation for `session`.
    pub fn dispose(&mut self, session: &K) -> Option<Simulation> {
        let removed = self.simulations.remove(session);
        if removed.is_some() {
            debug!(?session, "disposed simulation");
        }
        removed
    }

    /// Installs `catalog` for future simulations and remaps every live one.
    pub fn install_catalog(&mut self, catalog: Arc<Catalog>) -> RemapOutcome {
        let mut total = RemapOutcome::default();
        for simulation in self.simulations.values_mut() {
            let outcome = simulation.replace_catalog(Arc::clone(&catalog));
            total.kept += outcome.kept;
            total.dropped += outcome.dropped;
        }
        self.catalog = catalog;
        total
    }

    /// Number of live simulations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.simulations.len()
    }

    /// Reports whether no simulation is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.simulations.is_empty()
    }

    /// Iterator over the sessions that currently own a simulation.
    pub fn sessions(&self) -> impl Iterator<Item = &K> {
        self.simulations.keys()
    }
}
