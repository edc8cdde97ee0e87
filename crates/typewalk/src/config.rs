// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Traversal configuration.
//!
//! # Architecture
//!
//! - **Static**: defaults below, overridable through environment variables.
//! - **Dynamic**: [`WalkConfig`] lives behind an `ArcSwap` shared by the
//!   handler cache and every handler it compiled, so a swap is visible to the
//!   next traversal without rebuilding anything.
//!
//! # Environment
//!
//! | Variable | Effect |
//! |----------|--------|
//! | `TYPEWALK_MAX_ELEMENTS` | element budget per container |
//! | `TYPEWALK_TRACE_REALLOC` | log every reallocation at `trace` level |

use arc_swap::ArcSwap;
use std::sync::Arc;

use crate::error::InspectError;

/// Default element budget for a single array, list or collection.
///
/// Authoritative lengths come from the inspector, which may be fed by
/// untrusted data; the budget caps allocation before it happens.
pub const DEFAULT_MAX_ELEMENTS: usize = 1 << 26;

/// Environment variable overriding [`WalkConfig::max_elements`].
pub const ENV_MAX_ELEMENTS: &str = "TYPEWALK_MAX_ELEMENTS";

/// Environment variable enabling [`WalkConfig::trace_reallocations`].
pub const ENV_TRACE_REALLOC: &str = "TYPEWALK_TRACE_REALLOC";

/// Runtime knobs consulted during traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkConfig {
    /// Maximum number of elements a single container may be negotiated to.
    pub max_elements: usize,
    /// Emit a `trace` record for every container (re)allocation.
    pub trace_reallocations: bool,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            max_elements: DEFAULT_MAX_ELEMENTS,
            trace_reallocations: false,
        }
    }
}

impl WalkConfig {
    /// Defaults overridden by `TYPEWALK_*` environment variables.
    ///
    /// Unparseable values are ignored with a warning.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var(ENV_MAX_ELEMENTS) {
            match raw.trim().parse::<usize>() {
                Ok(max) if max > 0 => config.max_elements = max,
                _ => log::warn!(
                    "[WalkConfig] ignoring {}={:?} (expected positive integer)",
                    ENV_MAX_ELEMENTS,
                    raw
                ),
            }
        }

        if let Ok(raw) = std::env::var(ENV_TRACE_REALLOC) {
            config.trace_reallocations = matches!(
                raw.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }

        config
    }

    /// Builder-style override of the element budget.
    #[must_use]
    pub fn with_max_elements(mut self, max_elements: usize) -> Self {
        self.max_elements = max_elements;
        self
    }
}

/// Shared, atomically swappable handle on the active [`WalkConfig`].
///
/// Cloned into every compiled handler; reads are a single atomic load.
#[derive(Debug, Clone)]
pub struct Limits {
    config: Arc<ArcSwap<WalkConfig>>,
}

impl Limits {
    pub(crate) fn new(config: WalkConfig) -> Self {
        Self {
            config: Arc::new(ArcSwap::from_pointee(config)),
        }
    }

    /// Current configuration snapshot.
    #[must_use]
    pub fn load(&self) -> Arc<WalkConfig> {
        self.config.load_full()
    }

    /// Replace the configuration for subsequent traversals.
    pub fn store(&self, config: WalkConfig) {
        self.config.store(Arc::new(config));
    }

    /// Total element count of `dims`, checked against the budget.
    pub fn check_shape(&self, dims: &[usize]) -> Result<usize, InspectError> {
        let limit = self.config.load().max_elements;
        let mut total: usize = 1;
        for &len in dims {
            // Outer loops still run when an inner dimension is zero.
            if len > limit {
                return Err(InspectError::LengthLimit {
                    requested: len,
                    limit,
                });
            }
            total = total
                .checked_mul(len)
                .ok_or(InspectError::LengthLimit {
                    requested: usize::MAX,
                    limit,
                })?;
        }
        if total > limit {
            return Err(InspectError::LengthLimit {
                requested: total,
                limit,
            });
        }
        Ok(total)
    }

    /// Single-dimension variant of [`Limits::check_shape`].
    pub fn check_count(&self, count: usize) -> Result<usize, InspectError> {
        self.check_shape(std::slice::from_ref(&count))
    }

    pub(crate) fn trace_reallocations(&self) -> bool {
        self.config.load().trace_reallocations
    }
}
