#![cfg_attr(docsrs, feature(doc_cfg))]
//! # cmap
//!
//! cmap is a Rust library for combinatorial maps: a topological data
//! structure describing subdivided manifolds (meshes, cell complexes) of any
//! dimension chosen at run time, with the edit operations that keep it valid.
//!
//! ## Features
//! - Darts and β links held in generation-checked arenas
//! - Per-dimension cell attributes with reference counting and split/merge hooks
//! - Lazy orbit, cell and one-dart-per-cell traversals backed by a pool of boolean marks
//! - Sew/unsew, cell insertion and removal, canonical primitives
//! - A validator and an attribute repair pass for maps edited with
//!   automatic attribute management turned off
//!
//! ## Usage
//!
//! ```
//! use cmap::prelude::*;
//!
//! let mut map = CombinatorialMap::new(3);
//! map.make_combinatorial_hexahedron()?;
//! let mut summary = String::new();
//! map.display_characteristics(&mut summary)?;
//! assert_eq!(
//!     summary,
//!     "#Darts=24, #0-cells=8, #1-cells=12, #2-cells=6, #3-cells=1, #ccs=1"
//! );
//! # Ok::<(), cmap::map_error::MapError>(())
//! ```
//!
//! ## Invariant checking
//! Build with the `check-invariants` feature to validate the whole map after
//! every edit operation run under automatic attribute management;
//! `strict-invariants` implies it.

pub mod algs;
pub mod debug_invariants;
pub mod map_error;
pub mod topology;

pub use debug_invariants::DebugInvariants;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::attribute_update::UpdateStats;
    pub use crate::algs::traversal::{DartsOfOrbit, OneDartPerCell};
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::map_error::MapError;
    pub use crate::topology::attribute::{
        AttributeArena, AttributeConfig, AttributeHandle, CellAttribute, CellInfo,
    };
    pub use crate::topology::characteristics::Characteristics;
    pub use crate::topology::dart::DartHandle;
    pub use crate::topology::map::{CombinatorialMap, MapConfig};
    pub use crate::topology::mark::{Mark, NB_MARKS, ScopedMark};
    pub use crate::topology::orbit::OrbitSpec;
    pub use crate::topology::validation::{MapValidationOptions, RepairReport};
}
