use std::{collections::HashMap, fs, path::Path};

use anyhow::{bail, Context, Result};
use sandblaster_core::{
    Catalog, CatalogBuilder, Color, ExternalId, Ordinal, ParticleTypeSpec, Product, ProductSet,
};
use sandblaster_world::{Simulation, SimulationConfig};
use serde::Deserialize;

const SUPPORTED_MANIFEST_VERSION: u32 = 1;

/// Scene description read from a TOML manifest.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Manifest {
    version: u32,
    #[serde(default)]
    simulation: SimulationConfig,
    #[serde(default, rename = "particle")]
    particles: Vec<ParticleEntry>,
    #[serde(default, rename = "transmutation")]
    transmutations: Vec<TransmutationEntry>,
    #[serde(default, rename = "line")]
    lines: Vec<LineEntry>,
    #[serde(default, rename = "source")]
    sources: Vec<SourceEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ParticleEntry {
    name: String,
    id: char,
    color: u32,
    #[serde(default = "default_drawable")]
    drawable: bool,
    #[serde(default)]
    mobile: bool,
    #[serde(default)]
    density: f32,
    #[serde(default)]
    viscosity: f32,
    #[serde(default)]
    decay_probability: f32,
    #[serde(default)]
    lifetime: i32,
    #[serde(default)]
    decay: Vec<ProductEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProductEntry {
    particle: Option<String>,
    weight: f32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TransmutationEntry {
    agent: String,
    target: String,
    probability: f32,
    #[serde(default)]
    products: Vec<ProductEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LineEntry {
    particle: String,
    from: [i32; 2],
    to: [i32; 2],
    #[serde(default)]
    radius: i32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SourceEntry {
    particle: String,
    x: i32,
    y: i32,
}

const fn default_drawable() -> bool {
    true
}

impl Manifest {
    /// Reads and validates the manifest stored at `path`.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read scene manifest at {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("invalid scene manifest at {}", path.display()))
    }

    pub(crate) fn parse(contents: &str) -> Result<Self> {
        let manifest: Self =
            toml::from_str(contents).context("failed to parse scene manifest toml contents")?;
        if manifest.version != SUPPORTED_MANIFEST_VERSION {
            bail!(
                "unsupported scene manifest version {}; expected {}",
                manifest.version,
                SUPPORTED_MANIFEST_VERSION
            );
        }
        Ok(manifest)
    }

    pub(crate) fn simulation(&self) -> SimulationConfig {
        self.simulation
    }

    /// Builds the particle catalog declared by the manifest.
    pub(crate) fn catalog(&self) -> Result<Catalog> {
        let mut builder = CatalogBuilder::new();
        let mut ordinals: HashMap<&str, Ordinal> = HashMap::new();
        let mut ids: HashMap<ExternalId, &str> = HashMap::new();

        for entry in &self.particles {
            let id = ExternalId::from_char(entry.id);
            if let Some(previous) = ids.insert(id, entry.name.as_str()) {
                bail!(
                    "particles `{previous}` and `{}` share the id {:#06x}",
                    entry.name,
                    id.get()
                );
            }
            let ordinal = builder.add_type(ParticleTypeSpec {
                name: entry.name.clone(),
                id,
                color: Color::from_argb(entry.color),
                drawable: entry.drawable,
                mobile: entry.mobile,
                density: entry.density,
                viscosity: entry.viscosity,
                decay_probability: entry.decay_probability,
                lifetime: entry.lifetime,
            });
            if ordinals.insert(entry.name.as_str(), ordinal).is_some() {
                bail!("scene manifest declares particle `{}` twice", entry.name);
            }
        }

        for entry in &self.particles {
            let products = product_set(&entry.decay, &ordinals)
                .with_context(|| format!("invalid decay products for `{}`", entry.name))?;
            let _ = builder.set_decay_products(lookup(&ordinals, &entry.name)?, products);
        }

        for entry in &self.transmutations {
            let agent = lookup(&ordinals, &entry.agent)?;
            let target = lookup(&ordinals, &entry.target)?;
            let products = product_set(&entry.products, &ordinals).with_context(|| {
                format!(
                    "invalid products for transmutation `{}` -> `{}`",
                    entry.agent, entry.target
                )
            })?;
            let _ = builder.add_transmutation(agent, target, entry.probability, products);
        }

        builder
            .build()
            .context("scene manifest does not describe a valid catalog")
    }

    /// Draws the manifest's lines and registers its sources.
    pub(crate) fn populate(&self, simulation: &mut Simulation) -> Result<()> {
        for line in &self.lines {
            ensure_known(simulation, &line.particle)?;
            let [x1, y1] = line.to;
            let [x2, y2] = line.from;
            simulation.line(line.particle.as_str(), line.radius, x1, y1, x2, y2);
        }
        for source in &self.sources {
            ensure_known(simulation, &source.particle)?;
            simulation.add_source(source.particle.as_str(), source.x, source.y);
        }
        Ok(())
    }
}

fn lookup(ordinals: &HashMap<&str, Ordinal>, name: &str) -> Result<Ordinal> {
    ordinals
        .get(name)
        .copied()
        .with_context(|| format!("unknown particle `{name}` in scene manifest"))
}

fn product_set(entries: &[ProductEntry], ordinals: &HashMap<&str, Ordinal>) -> Result<ProductSet> {
    let mut products = Vec::with_capacity(entries.len());
    for entry in entries {
        if entry.weight < 0.0 {
            bail!("product weight {} is negative", entry.weight);
        }
        let particle = match &entry.particle {
            Some(name) => Some(lookup(ordinals, name)?),
            None => None,
        };
        products.push(Product {
            particle,
            weight: entry.weight,
        });
    }
    Ok(ProductSet::new(products))
}

fn ensure_known(simulation: &Simulation, name: &str) -> Result<()> {
    if simulation.catalog().by_name(name).is_none() {
        bail!("scene references unknown particle `{name}`");
    }
    Ok(())
}
