use std::sync::Arc;

use sandblaster_core::{Catalog, CatalogBuilder, Color, ExternalId, ParticleTypeSpec};
use sandblaster_system_registry::SimulationRegistry;
use sandblaster_world::{query, RemapOutcome, SimulationConfig};

fn catalog(name: &str, id: char) -> Arc<Catalog> {
    let mut builder = CatalogBuilder::new();
    let _ = builder.add_type(ParticleTypeSpec::new(
        name,
        ExternalId::from_char(id),
        Color::from_argb(0xffcc_cccc),
    ));
    Arc::new(builder.build().expect("catalog builds"))
}

fn registry() -> SimulationRegistry<&'static str> {
    SimulationRegistry::new(catalog("Wall", 'W'), SimulationConfig::new(8, 6).with_seed(3))
}

#[test]
fn resolve_creates_once_per_session() {
    let mut registry = registry();
    registry.resolve("left").set_particle(1, 1, 'W');
    assert_eq!(registry.len(), 1);

    let left = registry.resolve("left");
    assert_eq!(query::occupied_cells(&*left), 1, "second resolve reuses the simulation");
    assert_eq!((left.width(), left.height()), (8, 6));

    let _ = registry.resolve("right");
    assert_eq!(registry.len(), 2);
    assert_eq!(
        registry.get(&"right").map(query::occupied_cells),
        Some(0),
        "sessions do not share grids"
    );
}

#[test]
fn dispose_removes_session() {
    let mut registry = registry();
    let _ = registry.resolve("session");
    assert!(registry.dispose(&"session").is_some());
    assert!(registry.dispose(&"session").is_none());
    assert!(registry.is_empty());
    assert!(registry.get(&"session").is_none());
    assert!(registry.get_mut(&"session").is_none());
}

#[test]
fn disposed_session_starts_fresh() {
    let mut registry = registry();
    registry.resolve("session").set_particle(0, 0, 'W');
    let _ = registry.dispose(&"session");
    assert_eq!(query::occupied_cells(&*registry.resolve("session")), 0);
}

#[test]
fn install_catalog_remaps_live_simulations() {
    let mut registry = registry();
    registry.resolve("a").set_particle(0, 0, 'W');
    registry.resolve("b").set_particle(0, 0, 'W');
    registry.resolve("b").set_particle(1, 0, 'W');

    let outcome = registry.install_catalog(catalog("Stone", 'S'));

    assert_eq!(outcome, RemapOutcome { kept: 0, dropped: 3 });
    let fresh = registry.resolve("c");
    assert_eq!(
        query::catalog(&*fresh).by_ordinal(sandblaster_core::Ordinal::new(0)).map(|p| p.name()),
        Some("Stone")
    );
}

#[test]
fn sessions_lists_live_keys() {
    let mut registry = registry();
    let _ = registry.resolve("one");
    let _ = registry.resolve("two");
    let mut sessions: Vec<_> = registry.sessions().copied().collect();
    sessions.sort_unstable();
    assert_eq!(sessions, vec!["one", "two"]);
}
