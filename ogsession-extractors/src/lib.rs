// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

//! # ogsession Extractors
//!
//! Version-specific page reading for OGame universes.
//!
//! Server pages changed shape many times between 7.0.0 and 12.x. Instead of
//! one extractor type per version inheriting from the previous one, each
//! version family contributes a small [`ExtractorLayer`] and a [`Strategy`]
//! stacks layers newest first:
//!
//! ```text
//! 12.x  : v12 -> v11 -> v9 -> base
//! 11.x  : v11 -> v9 -> base
//! 9-10.x: v9 -> base
//! 7-8.x : base
//! ```
//!
//! [`StrategyRegistry::resolve`] picks the strategy for a version string.

pub mod layer;
pub mod registry;
pub mod strategy;
pub mod versions;

pub use layer::ExtractorLayer;
pub use registry::StrategyRegistry;
pub use strategy::Strategy;
