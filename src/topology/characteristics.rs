//! Summary counts of a map.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::map_error::MapError;
use crate::topology::map::CombinatorialMap;

/// Number of darts, of `i`-cells for `0 <= i <= dimension`, and of connected components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Characteristics {
    pub darts: usize,
    pub cells: Vec<usize>,
    pub components: usize,
}

impl fmt::Display for Characteristics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#Darts={}", self.darts)?;
        for (i, n) in self.cells.iter().enumerate() {
            write!(f, ", #{i}-cells={n}")?;
        }
        write!(f, ", #ccs={}", self.components)
    }
}

impl CombinatorialMap {
    pub fn characteristics(&self) -> Result<Characteristics, MapError> {
        let mut cells = self.count_all_cells()?;
        let components = cells.pop().unwrap_or(0);
        Ok(Characteristics {
            darts: self.number_of_darts(),
            cells,
            components,
        })
    }

    /// Writes `#Darts=…, #0-cells=…, …, #ccs=…` into `sink`.
    pub fn display_characteristics<W: fmt::Write>(&self, sink: &mut W) -> Result<(), MapError> {
        let summary = self.characteristics()?;
        write!(sink, "{summary}")?;
        Ok(())
    }
}
