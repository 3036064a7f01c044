//! Traversals and topological edit operations on a [`CombinatorialMap`](crate::topology::CombinatorialMap).

pub mod attribute_update;
pub mod construct;
pub mod insert;
pub mod remove;
pub mod sew;
pub mod traversal;

pub use attribute_update::UpdateStats;
pub use traversal::{DartsOfOrbit, OneDartPerCell};
