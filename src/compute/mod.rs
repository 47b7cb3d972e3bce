//! Compute layer: the stages of the siting pipeline.
//!
//! Each module implements one stage and can be used on its own:
//! - `features`: per-segment demand metrics
//! - `grid`: uniform tessellation of the demand extent
//! - `aggregate`: spatial join of segments onto cells
//! - `scoring`: min-max normalisation and weighted scores
//! - `proximity`: nearest-facility index and hard exclusion
//! - `selection`: greedy diversified top-N selection
//!
//! [`crate::pipeline`] chains them in order.

pub mod aggregate;
pub mod features;
pub mod grid;
pub mod proximity;
pub mod scoring;
pub mod selection;
pub mod validation;
