//! Views and view collections.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::errors::ViewError;
use crate::types::table::{FeatureTable, Location};

/// How a view is constructed from the measured sample.
///
/// Closed set: every consumer dispatches with an exhaustive `match`, so a
/// new view kind is a compile-time change, not a stringly-typed one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViewKind {
    /// The measured feature table itself.
    Intrinsic,
    /// Gaussian-kernel weighted sums over surrounding locations.
    DistanceWeighted { radius: f64 },
    /// Feature means over direct neighbors in a planar neighbor graph.
    NeighborGraph { threshold: f64 },
}

impl ViewKind {
    /// Canonical view name with the construction parameter embedded, so two
    /// context views of the same kind never collide.
    pub fn name(&self) -> String {
        match self {
            Self::Intrinsic => "intrinsic".to_string(),
            Self::DistanceWeighted { radius } => format!("distance_{radius}"),
            Self::NeighborGraph { threshold } => format!("neighbor_{threshold}"),
        }
    }

    pub fn is_intrinsic(&self) -> bool {
        matches!(self, Self::Intrinsic)
    }
}

/// A named feature table aligned to the sample's location order.
///
/// Views do not own locations; the enclosing [`ViewCollection`] holds the
/// single location order every view is aligned to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct View {
    name: String,
    kind: ViewKind,
    features: Vec<String>,
    values: Vec<f64>,
    n_locations: usize,
}

impl View {
    pub fn new(
        kind: ViewKind,
        features: Vec<String>,
        values: Vec<f64>,
        n_locations: usize,
    ) -> Result<Self, ViewError> {
        let name = kind.name();
        if n_locations == 0 || features.is_empty() {
            return Err(ViewError::EmptyView {
                view: name,
                reason: "zero locations or zero features".into(),
            });
        }
        let expected = n_locations * features.len();
        if values.len() != expected {
            return Err(ViewError::ShapeMismatch {
                view: name,
                expected,
                actual: values.len(),
            });
        }
        Ok(Self {
            name,
            kind,
            features,
            values,
            n_locations,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ViewKind {
        self.kind
    }

    pub fn features(&self) -> &[String] {
        &self.features
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn n_locations(&self) -> usize {
        self.n_locations
    }

    pub fn n_features(&self) -> usize {
        self.features.len()
    }

    pub fn row(&self, i: usize) -> &[f64] {
        let p = self.features.len();
        &self.values[i * p..(i + 1) * p]
    }

    pub fn column(&self, j: usize) -> Vec<f64> {
        let p = self.features.len();
        self.values.iter().skip(j).step_by(p).copied().collect()
    }

    pub fn feature_index(&self, name: &str) -> Option<usize> {
        self.features.iter().position(|f| f == name)
    }
}

/// The intrinsic view plus zero or more context views, all sharing one
/// location order. Insertion order is canonical: meta-model design matrices
/// and reported contributions follow it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewCollection {
    locations: Vec<Location>,
    views: Vec<View>,
    #[serde(skip)]
    by_name: FxHashMap<String, usize>,
}

impl ViewCollection {
    pub fn new(locations: Vec<Location>) -> Self {
        Self {
            locations,
            views: Vec::new(),
            by_name: FxHashMap::default(),
        }
    }

    /// Append a view, enforcing location alignment and name uniqueness.
    pub fn push(&mut self, view: View) -> Result<(), ViewError> {
        if view.n_locations() != self.locations.len() {
            return Err(ViewError::ShapeMismatch {
                view: view.name().to_string(),
                expected: self.locations.len() * view.n_features(),
                actual: view.values().len(),
            });
        }
        if self.by_name.contains_key(view.name()) {
            return Err(ViewError::DuplicateView {
                view: view.name().to_string(),
            });
        }
        self.by_name.insert(view.name().to_string(), self.views.len());
        self.views.push(view);
        Ok(())
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn n_locations(&self) -> usize {
        self.locations.len()
    }

    /// Views in canonical (insertion) order.
    pub fn views(&self) -> &[View] {
        &self.views
    }

    pub fn get(&self, name: &str) -> Option<&View> {
        self.by_name.get(name).map(|&i| &self.views[i])
    }

    /// The intrinsic view. Collections built by the view builder always
    /// contain exactly one.
    pub fn intrinsic(&self) -> Option<&View> {
        self.views.iter().find(|v| v.kind().is_intrinsic())
    }

    pub fn view_names(&self) -> Vec<String> {
        self.views.iter().map(|v| v.name().to_string()).collect()
    }

    /// Rebuild the name index after deserialization.
    pub fn reindex(&mut self) {
        self.by_name = self
            .views
            .iter()
            .enumerate()
            .map(|(i, v)| (v.name().to_string(), i))
            .collect();
    }
}

/// Convenience: wrap a measured sample as the intrinsic view of a fresh
/// collection.
impl From<FeatureTable> for ViewCollection {
    fn from(sample: FeatureTable) -> Self {
        let n = sample.n_locations();
        let mut collection = ViewCollection::new(sample.locations().to_vec());
        let view = View::new(
            ViewKind::Intrinsic,
            sample.features().to_vec(),
            sample.values().to_vec(),
            n,
        )
        .expect("validated sample is a valid view");
        collection.push(view).expect("first view cannot collide");
        collection
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_names_embed_parameters() {
        assert_eq!(ViewKind::Intrinsic.name(), "intrinsic");
        assert_eq!(
            ViewKind::DistanceWeighted { radius: 10.0 }.name(),
            "distance_10"
        );
        assert_eq!(
            ViewKind::NeighborGraph { threshold: 1.5 }.name(),
            "neighbor_1.5"
        );
    }

    #[test]
    fn collection_preserves_insertion_order() {
        let mut c = ViewCollection::new(vec![
            Location::new("a", 0.0, 0.0),
            Location::new("b", 1.0, 0.0),
        ]);
        c.push(View::new(ViewKind::Intrinsic, vec!["f".into()], vec![1.0, 2.0], 2).unwrap())
            .unwrap();
        c.push(
            View::new(
                ViewKind::DistanceWeighted { radius: 2.0 },
                vec!["f".into()],
                vec![0.5, 0.5],
                2,
            )
            .unwrap(),
        )
        .unwrap();

        assert_eq!(c.view_names(), vec!["intrinsic", "distance_2"]);
        assert_eq!(c.intrinsic().unwrap().name(), "intrinsic");
        assert!(c.get("distance_2").is_some());
    }

    #[test]
    fn misaligned_view_is_rejected() {
        let mut c = ViewCollection::new(vec![Location::new("a", 0.0, 0.0)]);
        let v = View::new(ViewKind::Intrinsic, vec!["f".into()], vec![1.0, 2.0], 2).unwrap();
        assert!(matches!(c.push(v), Err(ViewError::ShapeMismatch { .. })));
    }

    #[test]
    fn duplicate_view_names_are_rejected() {
        let mut c = ViewCollection::new(vec![Location::new("a", 0.0, 0.0)]);
        c.push(View::new(ViewKind::Intrinsic, vec!["f".into()], vec![1.0], 1).unwrap())
            .unwrap();
        let dup = View::new(ViewKind::Intrinsic, vec!["g".into()], vec![2.0], 1).unwrap();
        assert!(matches!(c.push(dup), Err(ViewError::DuplicateView { .. })));
    }

    #[test]
    fn empty_views_are_rejected() {
        let err = View::new(ViewKind::Intrinsic, vec![], vec![], 3).unwrap_err();
        assert!(matches!(err, ViewError::EmptyView { .. }));
    }

    #[test]
    fn view_kind_round_trips_through_serde() {
        let kind = ViewKind::DistanceWeighted { radius: 2.5 };
        let json = serde_json::to_string(&kind).unwrap();
        let back: ViewKind = serde_json::from_str(&json).unwrap();
        assert_eq!(kind, back);
    }
}
