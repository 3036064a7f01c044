//! Orbit and cell descriptions.
//!
//! An orbit is described by an ordered set of link levels; a cell by its
//! dimension `i` and the ambient dimension `dim` it is considered in. Both are
//! lowered to a list of [`Step`]s which the traversal engine applies to every
//! reached dart.

use itertools::Itertools;

use crate::map_error::MapError;

/// One way to move from a dart to a neighbour.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Step {
    /// Follow β1 forward and β0 backward.
    Permutation,
    /// Follow the involution βi (i >= 2).
    Involution(usize),
    /// Apply β`first`, then β`second`.
    Compose(usize, usize),
}

/// Validated set of levels `i1 < i2 < … < ik`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrbitSpec {
    levels: Vec<usize>,
}

impl OrbitSpec {
    /// Check the ordering constraint once: strictly increasing, each level at
    /// most `dimension`, and not starting with the pair `0, 1`.
    pub fn new(levels: &[usize], dimension: usize) -> Result<Self, MapError> {
        let invalid = |reason| MapError::InvalidOrbit {
            levels: levels.to_vec(),
            reason,
        };
        if levels.iter().any(|&l| l > dimension) {
            return Err(invalid("level above the map dimension"));
        }
        if !levels.iter().tuple_windows().all(|(a, b)| a < b) {
            return Err(invalid("levels must be strictly increasing"));
        }
        if levels.starts_with(&[0, 1]) {
            return Err(invalid("levels 0 and 1 denote the same permutation"));
        }
        Ok(Self {
            levels: levels.to_vec(),
        })
    }

    pub fn levels(&self) -> &[usize] {
        &self.levels
    }

    pub(crate) fn steps(&self) -> Vec<Step> {
        let mut steps = Vec::with_capacity(self.levels.len());
        for &level in &self.levels {
            let step = if level <= 1 {
                Step::Permutation
            } else {
                Step::Involution(level)
            };
            if !steps.contains(&step) {
                steps.push(step);
            }
        }
        steps
    }
}

/// Validate an `i`-cell in dimension `dim` for a map of dimension `dimension`.
pub(crate) fn check_cell(i: usize, dim: usize, dimension: usize) -> Result<(), MapError> {
    if dim > dimension || i > dim + 1 {
        return Err(MapError::InvalidCellDimension {
            cell: i,
            dim,
            dimension,
        });
    }
    Ok(())
}

/// Steps generating the `i`-cell in dimension `dim` of a combinatorial map.
pub(crate) fn cell_steps(i: usize, dim: usize) -> Vec<Step> {
    if i == dim + 1 {
        let mut steps = Vec::new();
        if dim >= 1 {
            steps.push(Step::Permutation);
        }
        steps.extend((2..=dim).map(Step::Involution));
        return steps;
    }
    match i {
        0 => {
            let mut steps = Vec::new();
            for j in 2..=dim {
                steps.push(Step::Compose(0, j));
                steps.push(Step::Compose(j, 1));
            }
            for (j, k) in (2..=dim).tuple_combinations() {
                steps.push(Step::Compose(j, k));
                steps.push(Step::Compose(k, j));
            }
            steps
        }
        1 => (2..=dim).map(Step::Involution).collect(),
        _ => std::iter::once(Step::Permutation)
            .chain((2..=dim).filter(|&j| j != i).map(Step::Involution))
            .collect(),
    }
}
