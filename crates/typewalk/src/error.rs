// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types for handler construction and traversal.
//!
//! Build-time failures ([`BuildError`]) surface before any value is touched.
//! Traversal failures ([`InspectError`]) either come from the engine's own
//! shape checks or are raised by the [`Inspector`](crate::Inspector) and
//! propagated unchanged.

use std::fmt;

/// Errors raised while compiling a handler for a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// Arrays must have at least one dimension.
    UnsupportedRank { type_name: &'static str, rank: usize },
    /// Non-indexable collections can only be described with mutation rights.
    ReadOnlyCollection { type_name: &'static str },
    /// Record layout is malformed (duplicate field name, ...).
    InvalidRecord {
        type_name: &'static str,
        reason: String,
    },
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedRank { type_name, rank } => {
                write!(f, "Unsupported array rank {} for {}", rank, type_name)
            }
            Self::ReadOnlyCollection { type_name } => {
                write!(f, "Cannot describe read-only collection {}", type_name)
            }
            Self::InvalidRecord { type_name, reason } => {
                write!(f, "Invalid record layout for {}: {}", type_name, reason)
            }
        }
    }
}

impl std::error::Error for BuildError {}

/// Errors raised by the in-memory tape inspectors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TapeError {
    /// Replay ran past the last recorded entry.
    Exhausted { position: usize },
    /// Replay expected one entry kind and found another.
    UnexpectedEntry {
        position: usize,
        expected: &'static str,
        found: &'static str,
    },
    /// Recorded byte payload does not match the negotiated buffer length.
    ByteLength { expected: usize, found: usize },
    /// Traversal finished with entries left on the tape.
    Trailing { remaining: usize },
}

impl fmt::Display for TapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exhausted { position } => write!(f, "Tape exhausted at entry {}", position),
            Self::UnexpectedEntry {
                position,
                expected,
                found,
            } => write!(
                f,
                "Unexpected tape entry at {}: expected {}, found {}",
                position, expected, found
            ),
            Self::ByteLength { expected, found } => write!(
                f,
                "Byte payload length mismatch: buffer {} bytes, tape {} bytes",
                expected, found
            ),
            Self::Trailing { remaining } => {
                write!(f, "Traversal ended with {} tape entries left", remaining)
            }
        }
    }
}

impl std::error::Error for TapeError {}

/// Errors raised during a `create` or `describe` traversal.
#[derive(Debug)]
pub enum InspectError {
    /// Lazy handler build failed (recursive types resolve handlers on first use).
    Build(BuildError),
    /// Inspector left a dimension length unknown after negotiation.
    UnresolvedLength { dim: usize },
    /// Inspector returned a shape with the wrong number of dimensions.
    RankMismatch { expected: usize, found: usize },
    /// Authoritative shape exceeds the configured element budget.
    LengthLimit { requested: usize, limit: usize },
    /// Value kind differs from what the source provided.
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    /// Boxed value whose concrete type has no published handler.
    UnregisteredType { type_id: std::any::TypeId },
    /// Source named a boxed content type with no published handler.
    UnknownTypeTag { tag: String },
    /// Handler cache was dropped while a deferred handler was still reachable.
    CacheReleased,
    /// Tape replay failure.
    Tape(TapeError),
    /// Failure raised by the inspector implementation itself.
    Source(Box<dyn std::error::Error + Send + Sync>),
}

impl InspectError {
    /// Wrap an inspector-specific error.
    pub fn from_source<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Source(Box::new(err))
    }
}

impl fmt::Display for InspectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Build(e) => write!(f, "Handler build failed: {}", e),
            Self::UnresolvedLength { dim } => {
                write!(f, "Length of dimension {} left unresolved by inspector", dim)
            }
            Self::RankMismatch { expected, found } => {
                write!(f, "Rank mismatch: expected {}, found {}", expected, found)
            }
            Self::LengthLimit { requested, limit } => write!(
                f,
                "Requested {} elements exceeds limit of {}",
                requested, limit
            ),
            Self::TypeMismatch { expected, found } => {
                write!(f, "Type mismatch: expected {}, found {}", expected, found)
            }
            Self::UnregisteredType { type_id } => {
                write!(f, "No handler published for boxed type {:?}", type_id)
            }
            Self::UnknownTypeTag { tag } => {
                write!(f, "No handler published for type tag {:?}", tag)
            }
            Self::CacheReleased => write!(f, "Handler cache released during traversal"),
            Self::Tape(e) => write!(f, "Tape error: {}", e),
            Self::Source(e) => write!(f, "Inspector error: {}", e),
        }
    }
}

impl std::error::Error for InspectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Build(e) => Some(e),
            Self::Tape(e) => Some(e),
            Self::Source(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<BuildError> for InspectError {
    fn from(e: BuildError) -> Self {
        Self::Build(e)
    }
}

impl From<TapeError> for InspectError {
    fn from(e: TapeError) -> Self {
        Self::Tape(e)
    }
}
