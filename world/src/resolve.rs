//! Mapping from host-side particle references to catalog ordinals.

use sandblaster_core::{Catalog, ExternalId, Ordinal, ParticleType};

/// Host-side handle that can be resolved against the active catalog.
///
/// A reference that does not resolve yields `None`, which placement treats
/// as "no particle".
pub trait ResolveParticle {
    /// Resolves the reference to an ordinal of `catalog`.
    fn resolve(&self, catalog: &Catalog) -> Option<Ordinal>;
}

impl ResolveParticle for Ordinal {
    fn resolve(&self, catalog: &Catalog) -> Option<Ordinal> {
        catalog.by_ordinal(*self).map(ParticleType::ordinal)
    }
}

impl ResolveParticle for ExternalId {
    fn resolve(&self, catalog: &Catalog) -> Option<Ordinal> {
        catalog.by_external_id(*self).map(ParticleType::ordinal)
    }
}

impl ResolveParticle for char {
    fn resolve(&self, catalog: &Catalog) -> Option<Ordinal> {
        ExternalId::from_char(*self).resolve(catalog)
    }
}

impl ResolveParticle for str {
    fn resolve(&self, catalog: &Catalog) -> Option<Ordinal> {
        catalog.by_name(self).map(ParticleType::ordinal)
    }
}

impl ResolveParticle for String {
    fn resolve(&self, catalog: &Catalog) -> Option<Ordinal> {
        self.as_str().resolve(catalog)
    }
}

/// Particle types from another catalog resolve through their external id.
impl ResolveParticle for ParticleType {
    fn resolve(&self, catalog: &Catalog) -> Option<Ordinal> {
        self.id().resolve(catalog)
    }
}

impl<T: ResolveParticle> ResolveParticle for Option<T> {
    fn resolve(&self, catalog: &Catalog) -> Option<Ordinal> {
        self.as_ref().and_then(|particle| particle.resolve(catalog))
    }
}

impl<T: ResolveParticle + ?Sized> ResolveParticle for &T {
    fn resolve(&self, catalog: &Catalog) -> Option<Ordinal> {
        (**self).resolve(catalog)
    }
}
