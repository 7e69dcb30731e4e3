//! Configuration dimensions and their cartesian product.
//!
//! A product page is exercised as shape × size × finishing × quantity (× …);
//! the matrix iterates every tuple in declaration order, last dimension
//! fastest, mirroring the nested loops of a hand-written ordering script.

use serde::{Deserialize, Serialize};

use crate::locator::Selector;
use crate::recorder::Combination;

/// One selectable UI choice within a dimension
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigOption {
    /// Human label, also the recorded value (e.g. `32x32mm`)
    pub label: String,
    /// Locator of the tile/tier to click
    pub selector: Selector,
}

impl ConfigOption {
    /// Create an option
    #[must_use]
    pub fn new(label: impl Into<String>, selector: Selector) -> Self {
        Self {
            label: label.into(),
            selector,
        }
    }
}

/// A named dimension with its options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimension {
    /// Dimension name (column header in the export)
    pub name: String,
    /// Options in click order
    pub options: Vec<ConfigOption>,
}

impl Dimension {
    /// Create a dimension
    #[must_use]
    pub fn new(name: impl Into<String>, options: Vec<ConfigOption>) -> Self {
        Self {
            name: name.into(),
            options,
        }
    }

    /// Number of options
    #[must_use]
    pub fn len(&self) -> usize {
        self.options.len()
    }

    /// Whether the dimension has no options
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

/// The full configuration matrix for one product (or one shape's subtree)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigMatrix {
    dimensions: Vec<Dimension>,
}

impl ConfigMatrix {
    /// Create a matrix over the given dimensions
    #[must_use]
    pub fn new(dimensions: Vec<Dimension>) -> Self {
        Self { dimensions }
    }

    /// The dimensions in iteration order
    #[must_use]
    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    /// Total number of combinations (product of dimension sizes)
    #[must_use]
    pub fn combination_count(&self) -> usize {
        if self.dimensions.is_empty() {
            return 0;
        }
        self.dimensions.iter().map(Dimension::len).product()
    }

    /// Iterate every combination, last dimension fastest
    #[must_use]
    pub fn combinations(&self) -> Combinations<'_> {
        Combinations {
            matrix: self,
            indices: vec![0; self.dimensions.len()],
            done: self.combination_count() == 0,
        }
    }
}

/// One tuple drawn from the matrix
#[derive(Debug, Clone)]
pub struct Selection<'a> {
    pairs: Vec<(&'a str, &'a ConfigOption)>,
}

impl<'a> Selection<'a> {
    /// Dimension-name / option pairs in dimension order
    #[must_use]
    pub fn pairs(&self) -> &[(&'a str, &'a ConfigOption)] {
        &self.pairs
    }

    /// The chosen option for a dimension
    #[must_use]
    pub fn option(&self, dimension: &str) -> Option<&'a ConfigOption> {
        self.pairs
            .iter()
            .find(|(name, _)| *name == dimension)
            .map(|(_, option)| *option)
    }

    /// Materialise into a recordable combination
    #[must_use]
    pub fn to_combination(&self) -> Combination {
        let mut combination = Combination::new();
        for (name, option) in &self.pairs {
            combination.push(*name, option.label.clone());
        }
        combination
    }
}

/// Odometer iterator over a matrix
#[derive(Debug)]
pub struct Combinations<'a> {
    matrix: &'a ConfigMatrix,
    indices: Vec<usize>,
    done: bool,
}

impl<'a> Iterator for Combinations<'a> {
    type Item = Selection<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let pairs = self
            .matrix
            .dimensions
            .iter()
            .zip(&self.indices)
            .map(|(dim, &i)| (dim.name.as_str(), &dim.options[i]))
            .collect();

        // advance the odometer, last dimension fastest
        let mut pos = self.indices.len();
        loop {
            if pos == 0 {
                self.done = true;
                break;
            }
            pos -= 1;
            self.indices[pos] += 1;
            if self.indices[pos] < self.matrix.dimensions[pos].len() {
                break;
            }
            self.indices[pos] = 0;
        }

        Some(Selection { pairs })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::recorder::{DIM_QUANTITY, DIM_SHAPE, DIM_SIZE};

    fn option(label: &str) -> ConfigOption {
        ConfigOption::new(label, Selector::xpath(format!("//li[.='{label}']")))
    }

    fn matrix() -> ConfigMatrix {
        ConfigMatrix::new(vec![
            Dimension::new(DIM_SHAPE, vec![option("Circle"), option("Square")]),
            Dimension::new(DIM_SIZE, vec![option("32x32mm")]),
            Dimension::new(DIM_QUANTITY, vec![option("5"), option("10"), option("20")]),
        ])
    }

    #[test]
    fn test_combination_count_is_product() {
        assert_eq!(matrix().combination_count(), 6);
        assert_eq!(ConfigMatrix::default().combination_count(), 0);
    }

    #[test]
    fn test_iteration_order_last_dimension_fastest() {
        let m = matrix();
        let combos: Vec<String> = m.combinations().map(|s| s.to_combination().to_string()).collect();
        assert_eq!(combos.len(), 6);
        assert_eq!(combos[0], "Circle / 32x32mm / 5");
        assert_eq!(combos[1], "Circle / 32x32mm / 10");
        assert_eq!(combos[2], "Circle / 32x32mm / 20");
        assert_eq!(combos[3], "Square / 32x32mm / 5");
        assert_eq!(combos[5], "Square / 32x32mm / 20");
    }

    #[test]
    fn test_empty_dimension_yields_nothing() {
        let m = ConfigMatrix::new(vec![
            Dimension::new(DIM_SHAPE, vec![option("Circle")]),
            Dimension::new(DIM_SIZE, vec![]),
        ]);
        assert_eq!(m.combination_count(), 0);
        assert_eq!(m.combinations().count(), 0);
    }

    #[test]
    fn test_selection_lookup() {
        let m = matrix();
        let first = m.combinations().next().unwrap();
        assert_eq!(first.option(DIM_SHAPE).unwrap().label, "Circle");
        assert!(first.option("Finish").is_none());
    }
}
