use sandblaster_core::{Catalog, Ordinal};
use sandblaster_world::{query, Simulation};

const EMPTY_GLYPH: char = '.';
const FALLBACK_GLYPH: char = '#';

/// Renders the grid as text, one line per row, top row first.
///
/// Each particle is drawn with its external id when that id is a printable
/// ASCII character.
pub(crate) fn render(simulation: &Simulation) -> String {
    let catalog = query::catalog(simulation);
    let grid = query::grid(simulation);
    let width = usize::from(grid.width());
    let mut frame = String::with_capacity((width + 1) * usize::from(grid.height()));
    for y in (0..i32::from(grid.height())).rev() {
        for x in 0..i32::from(grid.width()) {
            frame.push(grid.particle(x, y).map_or(EMPTY_GLYPH, |ordinal| glyph(catalog, ordinal)));
        }
        frame.push('\n');
    }
    frame
}

/// Lists each particle type present on the grid with its cell count.
pub(crate) fn census(simulation: &Simulation) -> Vec<(String, usize)> {
    let catalog = query::catalog(simulation);
    query::population(simulation)
        .into_iter()
        .filter_map(|(ordinal, count)| {
            catalog
                .by_ordinal(ordinal)
                .map(|particle| (particle.name().to_owned(), count))
        })
        .collect()
}

fn glyph(catalog: &Catalog, ordinal: Ordinal) -> char {
    catalog
        .by_ordinal(ordinal)
        .and_then(|particle| char::from_u32(u32::from(particle.id().get())))
        .filter(|glyph| glyph.is_ascii_graphic())
        .unwrap_or(FALLBACK_GLYPH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use sandblaster_core::{CatalogBuilder, Color, ExternalId, ParticleTypeSpec};
    use sandblaster_world::SimulationConfig;

    fn simulation() -> Simulation {
        let mut builder = CatalogBuilder::new();
        let _ = builder.add_type(ParticleTypeSpec::new(
            "Wall",
            ExternalId::from_char('W'),
            Color::from_argb(0xffcc_cccc),
        ));
        let _ = builder.add_type(ParticleTypeSpec::new(
            "Glass",
            ExternalId::new(0x2502),
            Color::from_argb(0xffaa_ffff),
        ));
        let catalog = Arc::new(builder.build().expect("catalog builds"));
        Simulation::new(catalog, SimulationConfig::new(3, 2).with_seed(1))
    }

    #[test]
    fn frame_starts_with_top_row() {
        let mut simulation = simulation();
        simulation.set_particle(0, 1, 'W');
        simulation.set_particle(2, 0, "Glass");
        assert_eq!(render(&simulation), "W..\n..#\n");
    }

    #[test]
    fn census_names_present_types() {
        let mut simulation = simulation();
        simulation.set_particle(0, 0, 'W');
        simulation.set_particle(1, 0, 'W');
        assert_eq!(census(&simulation), vec![("Wall".to_owned(), 2)]);
    }
}
