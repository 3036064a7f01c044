//! Core data structures of a combinatorial map.
//!
//! - [`dart`]: dart handles and the per-dart record
//! - [`mark`]: the pool of boolean marks
//! - [`attribute`]: cell attributes and their per-dimension arenas
//! - [`orbit`]: orbit and cell descriptions
//! - [`map`]: the [`CombinatorialMap`] owning all of the above
//!
//! Validation, repair and summary counts live in [`validation`] and
//! [`characteristics`].

pub mod attribute;
pub mod characteristics;
pub mod dart;
pub mod map;
pub mod mark;
pub mod orbit;
pub mod validation;

pub use attribute::{AttributeConfig, AttributeHandle, CellAttribute, CellInfo};
pub use characteristics::Characteristics;
pub use dart::DartHandle;
pub use map::{CombinatorialMap, MapConfig};
pub use mark::{Mark, NB_MARKS, ScopedMark};
pub use orbit::OrbitSpec;
pub use validation::{MapValidationOptions, RepairReport};
