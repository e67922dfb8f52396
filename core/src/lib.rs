#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Sandblaster engine.
//!
//! This crate owns everything that is independent of a live grid: the
//! identifiers that name particle types, the seedable [`RandomSource`] the
//! engine draws every probability from, the big-endian [`codec`] used by the
//! catalog wire format, and the immutable [`Catalog`] of particle types,
//! decay products and transmutation rules. The world crate holds a shared
//! reference to a catalog and consults it on every simulation step.

pub mod catalog;
pub mod codec;
pub mod random;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use catalog::{
    Catalog, CatalogBuildError, CatalogBuilder, ParticleType, ParticleTypeSpec, Product,
    ProductSet, TransmutationRule, MAX_TYPES,
};
pub use random::{RandomSource, ScriptedRandom, SeededRandom};

/// Catalog format version accepted by [`Catalog::decode`].
pub const CURRENT_VERSION: f32 = 1.6;

/// Ordinal byte written in place of a missing product and used to terminate
/// the transmutation stream.
pub const NO_ORDINAL: u8 = 0xff;

/// Catalog-local position of a particle type.
///
/// Ordinals are only meaningful within the catalog that assigned them; a
/// reloaded catalog may place the same particle at a different ordinal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Ordinal(u8);

impl Ordinal {
    /// Creates a new ordinal with the provided numeric value.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the ordinal.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }

    /// Position of the ordinal in catalog-indexed tables.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Host-facing identifier of a particle type, stable across catalog reloads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExternalId(u16);

impl ExternalId {
    /// Creates a new external identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Creates an external identifier from a single character code, the way
    /// hosts usually label their particle types (`'W'` for wall and so on).
    ///
    /// Characters outside the basic multilingual plane are truncated to their
    /// low 16 bits.
    #[must_use]
    pub const fn from_char(code: char) -> Self {
        Self(code as u32 as u16)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u16 {
        self.0
    }
}

/// Packed 32-bit ARGB color used for rendering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color(u32);

impl Color {
    /// Opaque black, rendered for empty cells.
    pub const BLACK: Self = Self(0xff00_0000);

    /// Wraps a packed ARGB value.
    #[must_use]
    pub const fn from_argb(value: u32) -> Self {
        Self(value)
    }

    /// Packed ARGB value of the color.
    #[must_use]
    pub const fn argb(&self) -> u32 {
        self.0
    }

    /// Red component of the color.
    #[must_use]
    pub const fn red(&self) -> u8 {
        (self.0 >> 16) as u8
    }

    /// Green component of the color.
    #[must_use]
    pub const fn green(&self) -> u8 {
        (self.0 >> 8) as u8
    }

    /// Blue component of the color.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.0 as u8
    }
}

/// Reasons a catalog byte stream may be rejected.
///
/// Every variant is fatal to the load operation; callers keep whichever
/// catalog they had before attempting the load.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ProtocolError {
    /// The envelope carried a format version other than [`CURRENT_VERSION`].
    #[error("unsupported catalog version {found} (expected {expected})")]
    VersionMismatch {
        /// Version found at the start of the stream.
        found: f32,
        /// Version this build understands.
        expected: f32,
    },
    /// The stream ended before a complete value could be read.
    #[error("unexpected end of catalog data at offset {offset}: needed {needed} bytes, {remaining} left")]
    UnexpectedEof {
        /// Offset of the read that failed.
        offset: usize,
        /// Number of bytes the read required.
        needed: usize,
        /// Number of bytes left in the buffer.
        remaining: usize,
    },
    /// A transmutation rule named a target ordinal with no particle type.
    #[error("transmutation rule for agent {agent} names unknown target ordinal {target}")]
    UnknownTransmutationTarget {
        /// Ordinal of the agent particle type.
        agent: u8,
        /// Unresolvable target ordinal.
        target: u8,
    },
}
