//! Measured samples: locations and dense feature tables.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::errors::ViewError;

/// A measured location: stable string id plus planar coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    pub x: f64,
    pub y: f64,
}

impl Location {
    pub fn new(id: impl Into<String>, x: f64, y: f64) -> Self {
        Self { id: id.into(), x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// A dense, row-major feature table aligned to an ordered set of locations.
///
/// Row `i` holds the measurements of `locations[i]`; column `j` holds the
/// feature named `features[j]`. Construction validates geometry and values,
/// so a `FeatureTable` instance is always well formed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureTable {
    locations: Vec<Location>,
    features: Vec<String>,
    values: Vec<f64>,
}

impl FeatureTable {
    /// Build a table, validating geometry, feature names, and value shape.
    pub fn new(
        locations: Vec<Location>,
        features: Vec<String>,
        values: Vec<f64>,
    ) -> Result<Self, ViewError> {
        if locations.is_empty() {
            return Err(ViewError::InvalidGeometry {
                reason: "no locations".into(),
            });
        }
        let mut seen = FxHashSet::default();
        for loc in &locations {
            if !loc.is_finite() {
                return Err(ViewError::InvalidGeometry {
                    reason: format!("non-finite coordinates for location '{}'", loc.id),
                });
            }
            if !seen.insert(loc.id.as_str()) {
                return Err(ViewError::InvalidGeometry {
                    reason: format!("duplicate location id '{}'", loc.id),
                });
            }
        }

        if features.is_empty() {
            return Err(ViewError::EmptyView {
                view: "sample".into(),
                reason: "no features".into(),
            });
        }
        let mut names = FxHashSet::default();
        for name in &features {
            if name.is_empty() {
                return Err(ViewError::InvalidGeometry {
                    reason: "empty feature name".into(),
                });
            }
            if !names.insert(name.as_str()) {
                return Err(ViewError::InvalidGeometry {
                    reason: format!("duplicate feature name '{name}'"),
                });
            }
        }

        let expected = locations.len() * features.len();
        if values.len() != expected {
            return Err(ViewError::ShapeMismatch {
                view: "sample".into(),
                expected,
                actual: values.len(),
            });
        }
        for (i, v) in values.iter().enumerate() {
            if !v.is_finite() {
                return Err(ViewError::NonFiniteValue {
                    feature: features[i % features.len()].clone(),
                    location: i / features.len(),
                });
            }
        }

        Ok(Self {
            locations,
            features,
            values,
        })
    }

    pub fn n_locations(&self) -> usize {
        self.locations.len()
    }

    pub fn n_features(&self) -> usize {
        self.features.len()
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn features(&self) -> &[String] {
        &self.features
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Row-major measurement row for location `i`.
    pub fn row(&self, i: usize) -> &[f64] {
        let p = self.features.len();
        &self.values[i * p..(i + 1) * p]
    }

    /// Copy of column `j` in location order.
    pub fn column(&self, j: usize) -> Vec<f64> {
        let p = self.features.len();
        self.values.iter().skip(j).step_by(p).copied().collect()
    }

    pub fn feature_index(&self, name: &str) -> Option<usize> {
        self.features.iter().position(|f| f == name)
    }
}
