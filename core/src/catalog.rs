//! Immutable catalog of particle types, decay products and transmutations.
//!
//! A catalog is decoded once from the wire format (or assembled with a
//! [`CatalogBuilder`]) and never mutated afterwards. Reloading means
//! building a fresh catalog and swapping it in wholesale.

use thiserror::Error;

use crate::codec::{ByteReader, ByteWriter};
use crate::random::RandomSource;
use crate::{Color, ExternalId, Ordinal, ProtocolError, CURRENT_VERSION, NO_ORDINAL};

/// Largest number of particle types a catalog can hold.
///
/// Ordinal `0xff` is reserved as the "no particle" marker.
pub const MAX_TYPES: usize = 255;

/// Single weighted candidate of a [`ProductSet`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Product {
    /// Particle type produced, or `None` for "no particle".
    pub particle: Option<Ordinal>,
    /// Relative weight of the candidate.
    pub weight: f32,
}

/// Weighted list of replacement particles used for decay and transmutation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProductSet {
    products: Vec<Product>,
    total_weight: f32,
}

impl ProductSet {
    /// Creates a product set that always yields "no particle".
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a product set from weighted candidates, summing their weights.
    #[must_use]
    pub fn new(products: Vec<Product>) -> Self {
        let total_weight = products.iter().map(|product| product.weight).sum();
        Self {
            products,
            total_weight,
        }
    }

    /// Creates a product set with a single candidate of weight one.
    #[must_use]
    pub fn single(particle: Option<Ordinal>) -> Self {
        Self::new(vec![Product {
            particle,
            weight: 1.0,
        }])
    }

    /// Candidates in insertion order.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Sum of every candidate's weight.
    #[must_use]
    pub fn total_weight(&self) -> f32 {
        self.total_weight
    }

    /// Number of candidates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Reports whether the set has no candidates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Draws one candidate proportionally to its weight.
    ///
    /// A draw equal to a candidate's remaining threshold selects that
    /// candidate rather than the next one. When rounding leaves the draw
    /// above every threshold the first candidate is returned.
    pub fn pick<R: RandomSource + ?Sized>(&self, rng: &mut R) -> Option<Ordinal> {
        let first = self.products.first()?;
        let mut remaining = rng.next_f32() * self.total_weight;
        for product in &self.products {
            if remaining <= product.weight {
                return product.particle;
            }
            remaining -= product.weight;
        }
        first.particle
    }

    fn read(reader: &mut ByteReader<'_>, type_count: usize) -> Result<Self, ProtocolError> {
        let count = usize::from(reader.read_u8()?);
        let mut particles = Vec::with_capacity(count);
        for _ in 0..count {
            let ordinal = reader.read_u8()?;
            particles.push((usize::from(ordinal) < type_count).then_some(Ordinal::new(ordinal)));
        }
        let mut products = Vec::with_capacity(count);
        for particle in particles {
            let weight = reader.read_f32()?;
            products.push(Product { particle, weight });
        }
        Ok(Self::new(products))
    }

    fn write(&self, writer: &mut ByteWriter) {
        writer.write_u8(self.products.len().min(usize::from(u8::MAX)) as u8);
        let products = self.products.iter().take(usize::from(u8::MAX));
        for product in products.clone() {
            writer.write_u8(product.particle.map_or(NO_ORDINAL, |ordinal| ordinal.get()));
        }
        for product in products {
            writer.write_f32(product.weight);
        }
    }

    fn validate(&self, type_count: usize) -> Result<(), CatalogBuildError> {
        for product in &self.products {
            if let Some(ordinal) = product.particle {
                if ordinal.index() >= type_count {
                    return Err(CatalogBuildError::UnknownOrdinal(ordinal.get()));
                }
            }
        }
        Ok(())
    }
}

/// Immutable physical description of one kind of particle.
#[derive(Clone, Debug, PartialEq)]
pub struct ParticleType {
    ordinal: Ordinal,
    id: ExternalId,
    name: String,
    color: Color,
    drawable: bool,
    mobile: bool,
    density: f32,
    viscosity: f32,
    decay_probability: f32,
    lifetime: i32,
    transmutation_count: u32,
    decay_products: ProductSet,
}

impl ParticleType {
    /// Position of the type within its catalog.
    #[must_use]
    pub const fn ordinal(&self) -> Ordinal {
        self.ordinal
    }

    /// Identifier hosts use to refer to the type across reloads.
    #[must_use]
    pub const fn id(&self) -> ExternalId {
        self.id
    }

    /// Display name carried by the catalog.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Color used when rendering cells holding this type.
    #[must_use]
    pub const fn color(&self) -> Color {
        self.color
    }

    /// Legacy palette flag; the engine never consults it.
    #[must_use]
    pub const fn drawable(&self) -> bool {
        self.drawable
    }

    /// Whether particles of this type may move at all.
    #[must_use]
    pub const fn mobile(&self) -> bool {
        self.mobile
    }

    /// Signed density; positive sinks, negative floats.
    #[must_use]
    pub const fn density(&self) -> f32 {
        self.density
    }

    /// Per-step probability of attempting a sideways move.
    #[must_use]
    pub const fn viscosity(&self) -> f32 {
        self.viscosity
    }

    /// Per-step probability that the particle ages.
    #[must_use]
    pub const fn decay_probability(&self) -> f32 {
        self.decay_probability
    }

    /// Largest age a particle survives before decaying.
    #[must_use]
    pub const fn lifetime(&self) -> i32 {
        self.lifetime
    }

    /// Number of transmutation rules in which this type is the agent.
    #[must_use]
    pub const fn transmutation_count(&self) -> u32 {
        self.transmutation_count
    }

    /// Particles this type decays into.
    #[must_use]
    pub const fn decay_products(&self) -> &ProductSet {
        &self.decay_products
    }

    /// Reports whether a particle of the given age has exceeded its lifetime.
    #[must_use]
    pub fn outlived(&self, age: u32) -> bool {
        i64::from(age) > i64::from(self.lifetime)
    }

    fn from_spec(ordinal: Ordinal, spec: ParticleTypeSpec) -> Self {
        Self {
            ordinal,
            id: spec.id,
            name: spec.name,
            color: spec.color,
            drawable: spec.drawable,
            mobile: spec.mobile,
            density: spec.density,
            viscosity: spec.viscosity,
            decay_probability: spec.decay_probability,
            lifetime: spec.lifetime,
            transmutation_count: 0,
            decay_products: ProductSet::empty(),
        }
    }

    fn read(reader: &mut ByteReader<'_>, ordinal: Ordinal) -> Result<Self, ProtocolError> {
        let name = reader.read_string()?;
        let id = ExternalId::new(reader.read_u16()?);
        let color = Color::from_argb(reader.read_u32()?);
        let drawable = reader.read_bool()?;
        let mobile = reader.read_bool()?;
        let density = reader.read_f32()?;
        let viscosity = reader.read_f32()?;
        let decay_probability = reader.read_f32()?;
        let lifetime = reader.read_i32()?;
        Ok(Self::from_spec(
            ordinal,
            ParticleTypeSpec {
                name,
                id,
                color,
                drawable,
                mobile,
                density,
                viscosity,
                decay_probability,
                lifetime,
            },
        ))
    }

    fn write(&self, writer: &mut ByteWriter) {
        writer.write_string(&self.name);
        writer.write_u16(self.id.get());
        writer.write_u32(self.color.argb());
        writer.write_bool(self.drawable);
        writer.write_bool(self.mobile);
        writer.write_f32(self.density);
        writer.write_f32(self.viscosity);
        writer.write_f32(self.decay_probability);
        writer.write_i32(self.lifetime);
    }
}

/// Attributes used to declare a particle type through a [`CatalogBuilder`].
///
/// Defaults describe a drawable, immobile, weightless particle that never
/// decays.
#[derive(Clone, Debug, PartialEq)]
pub struct ParticleTypeSpec {
    /// Display name.
    pub name: String,
    /// External identifier.
    pub id: ExternalId,
    /// Packed render color.
    pub color: Color,
    /// Legacy palette flag.
    pub drawable: bool,
    /// Whether the particle may move.
    pub mobile: bool,
    /// Signed density.
    pub density: f32,
    /// Sideways move probability.
    pub viscosity: f32,
    /// Per-step aging probability.
    pub decay_probability: f32,
    /// Largest surviving age.
    pub lifetime: i32,
}

impl ParticleTypeSpec {
    /// Declares an immobile particle type with the provided identity.
    #[must_use]
    pub fn new(name: impl Into<String>, id: ExternalId, color: Color) -> Self {
        Self {
            name: name.into(),
            id,
            color,
            drawable: true,
            mobile: false,
            density: 0.0,
            viscosity: 0.0,
            decay_probability: 0.0,
            lifetime: 0,
        }
    }

    /// Makes the particle mobile with the given density and viscosity.
    #[must_use]
    pub fn with_motion(mut self, density: f32, viscosity: f32) -> Self {
        self.mobile = true;
        self.density = density;
        self.viscosity = viscosity;
        self
    }

    /// Overrides the density without changing mobility.
    #[must_use]
    pub fn with_density(mut self, density: f32) -> Self {
        self.density = density;
        self
    }

    /// Makes the particle age with `probability` per step and decay once its
    /// age exceeds `lifetime`.
    #[must_use]
    pub fn with_decay(mut self, probability: f32, lifetime: i32) -> Self {
        self.decay_probability = probability;
        self.lifetime = lifetime;
        self
    }

    /// Overrides the legacy palette flag.
    #[must_use]
    pub fn with_drawable(mut self, drawable: bool) -> Self {
        self.drawable = drawable;
        self
    }
}

/// Probabilistic conversion applied by an agent to an adjacent target.
#[derive(Clone, Debug, PartialEq)]
pub struct TransmutationRule {
    agent: Ordinal,
    target: Ordinal,
    probability: f32,
    products: ProductSet,
}

impl TransmutationRule {
    /// Particle type that applies the rule.
    #[must_use]
    pub const fn agent(&self) -> Ordinal {
        self.agent
    }

    /// Particle type the rule converts.
    #[must_use]
    pub const fn target(&self) -> Ordinal {
        self.target
    }

    /// Per-step probability of the conversion.
    #[must_use]
    pub const fn probability(&self) -> f32 {
        self.probability
    }

    /// Particles the target may become.
    #[must_use]
    pub const fn products(&self) -> &ProductSet {
        &self.products
    }
}

/// Reasons a [`CatalogBuilder`] may refuse to produce a catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum CatalogBuildError {
    /// More than [`MAX_TYPES`] particle types were declared.
    #[error("a catalog holds at most {MAX_TYPES} particle types")]
    TooManyTypes,
    /// A rule or product referenced an ordinal with no particle type.
    #[error("ordinal {0} does not name a declared particle type")]
    UnknownOrdinal(u8),
}

/// Immutable table of particle types and their pairwise transmutations.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Catalog {
    types: Vec<ParticleType>,
    rules: Vec<Option<TransmutationRule>>,
}

impl Catalog {
    /// Decodes a catalog, including its version envelope, from `bytes`.
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        Self::read(&mut ByteReader::new(bytes))
    }

    /// Decodes a catalog, including its version envelope, at the reader's
    /// cursor.
    pub fn read(reader: &mut ByteReader<'_>) -> Result<Self, ProtocolError> {
        let version = reader.read_f32()?;
        if version != CURRENT_VERSION {
            return Err(ProtocolError::VersionMismatch {
                found: version,
                expected: CURRENT_VERSION,
            });
        }

        let count = usize::from(reader.read_u8()?);
        let mut types = Vec::with_capacity(count);
        for index in 0..count {
            types.push(ParticleType::read(reader, Ordinal::new(index as u8))?);
        }
        for particle in &mut types {
            particle.decay_products = ProductSet::read(reader, count)?;
        }

        let mut rules = vec![None; count * count];
        loop {
            let agent = reader.read_u8()?;
            if usize::from(agent) >= count {
                break;
            }
            let target = reader.read_u8()?;
            if usize::from(target) >= count {
                return Err(ProtocolError::UnknownTransmutationTarget { agent, target });
            }
            let probability = reader.read_f32()?;
            let products = ProductSet::read(reader, count)?;
            types[usize::from(agent)].transmutation_count += 1;
            rules[usize::from(agent) * count + usize::from(target)] = Some(TransmutationRule {
                agent: Ordinal::new(agent),
                target: Ordinal::new(target),
                probability,
                products,
            });
        }

        Ok(Self { types, rules })
    }

    /// Encodes the catalog, including its version envelope.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut writer = ByteWriter::new();
        self.write(&mut writer);
        writer.into_bytes()
    }

    /// Appends the catalog, including its version envelope, to `writer`.
    pub fn write(&self, writer: &mut ByteWriter) {
        writer.write_f32(CURRENT_VERSION);
        writer.write_u8(self.types.len() as u8);
        for particle in &self.types {
            particle.write(writer);
        }
        for particle in &self.types {
            particle.decay_products.write(writer);
        }
        for rule in self.rules.iter().flatten() {
            writer.write_u8(rule.agent.get());
            writer.write_u8(rule.target.get());
            writer.write_f32(rule.probability);
            rule.products.write(writer);
        }
        writer.write_u8(NO_ORDINAL);
    }

    /// Number of particle types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Reports whether the catalog declares no particle types.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Iterator over the particle types in ordinal order.
    pub fn iter(&self) -> impl Iterator<Item = &ParticleType> {
        self.types.iter()
    }

    /// Looks up a particle type by ordinal.
    #[must_use]
    pub fn by_ordinal(&self, ordinal: Ordinal) -> Option<&ParticleType> {
        self.types.get(ordinal.index())
    }

    /// Looks up a particle type by external identifier.
    #[must_use]
    pub fn by_external_id(&self, id: ExternalId) -> Option<&ParticleType> {
        self.types.iter().find(|particle| particle.id == id)
    }

    /// Looks up a particle type by name, ignoring ASCII case.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&ParticleType> {
        self.types
            .iter()
            .find(|particle| particle.name.eq_ignore_ascii_case(name))
    }

    /// Rule applied by `agent` to `target`, if one exists.
    #[must_use]
    pub fn rule(&self, agent: Ordinal, target: Ordinal) -> Option<&TransmutationRule> {
        let count = self.types.len();
        if agent.index() >= count || target.index() >= count {
            return None;
        }
        self.rules[agent.index() * count + target.index()].as_ref()
    }

    /// Rules in which `agent` is the agent, ordered by target ordinal.
    pub fn rules_for(&self, agent: Ordinal) -> impl Iterator<Item = &TransmutationRule> {
        let count = self.types.len();
        let row = if agent.index() < count {
            &self.rules[agent.index() * count..(agent.index() + 1) * count]
        } else {
            &[]
        };
        row.iter().flatten()
    }

    /// Resolves what `target` becomes next to `agent` this step.
    ///
    /// Returns `target` unchanged when either side is empty, when no rule
    /// exists for the pair, or when the rule's probability is not positive.
    /// Otherwise one float is drawn and, if it falls below the rule's
    /// probability, the rule's products are sampled.
    pub fn maybe_transmute<R: RandomSource + ?Sized>(
        &self,
        agent: Option<Ordinal>,
        target: Option<Ordinal>,
        rng: &mut R,
    ) -> Option<Ordinal> {
        let (Some(agent), Some(target_ordinal)) = (agent, target) else {
            return target;
        };
        let Some(rule) = self.rule(agent, target_ordinal) else {
            return target;
        };
        if rule.probability <= 0.0 {
            return target;
        }
        if rng.next_f32() < rule.probability {
            rule.products.pick(rng)
        } else {
            target
        }
    }
}

/// Programmatic constructor for catalogs.
#[derive(Clone, Debug, Default)]
pub struct CatalogBuilder {
    types: Vec<ParticleType>,
    rules: Vec<TransmutationRule>,
}

impl CatalogBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a particle type and returns the ordinal it will occupy.
    pub fn add_type(&mut self, spec: ParticleTypeSpec) -> Ordinal {
        let ordinal = Ordinal::new(u8::try_from(self.types.len()).unwrap_or(u8::MAX));
        self.types.push(ParticleType::from_spec(ordinal, spec));
        ordinal
    }

    /// Sets the products a declared type decays into.
    ///
    /// Unknown ordinals are ignored here and reported by [`Self::build`]
    /// only when they appear inside the product set.
    pub fn set_decay_products(&mut self, ordinal: Ordinal, products: ProductSet) -> &mut Self {
        if let Some(particle) = self.types.get_mut(ordinal.index()) {
            particle.decay_products = products;
        }
        self
    }

    /// Declares that `agent` converts adjacent `target` particles with the
    /// given probability. A later rule for the same pair replaces an earlier
    /// one in the table but both count towards the agent's rule count.
    pub fn add_transmutation(
        &mut self,
        agent: Ordinal,
        target: Ordinal,
        probability: f32,
        products: ProductSet,
    ) -> &mut Self {
        self.rules.push(TransmutationRule {
            agent,
            target,
            probability,
            products,
        });
        self
    }

    /// Validates every reference and produces the immutable catalog.
    pub fn build(self) -> Result<Catalog, CatalogBuildError> {
        let count = self.types.len();
        if count > MAX_TYPES {
            return Err(CatalogBuildError::TooManyTypes);
        }

        let mut types = self.types;
        for particle in &types {
            particle.decay_products.validate(count)?;
        }

        let mut rules = vec![None; count * count];
        for rule in self.rules {
            for ordinal in [rule.agent, rule.target] {
                if ordinal.index() >= count {
                    return Err(CatalogBuildError::UnknownOrdinal(ordinal.get()));
                }
            }
            rule.products.validate(count)?;
            types[rule.agent.index()].transmutation_count += 1;
            let slot = rule.agent.index() * count + rule.target.index();
            rules[slot] = Some(rule);
        }

        Ok(Catalog { types, rules })
    }
}
