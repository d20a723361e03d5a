//! Content fingerprints for cache keys.
//!
//! Pure functions of their inputs: a fingerprint covers the exact bytes of
//! the view data, the target, the fold assignment, the hyperparameters, and
//! the seed, so identical requests map to identical keys in every process
//! and any change to an input changes the key.

use std::fmt;

use xxhash_rust::xxh3::Xxh3;

use crate::config::LearnerParams;
use crate::types::{FoldAssignment, Location, View, ViewCollection};

/// A 64-bit content fingerprint, rendered as 16 hex digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(u64);

impl Fingerprint {
    pub fn from_u64(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }

    pub fn to_hex(self) -> String {
        format!("{:016x}", self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Incremental fingerprint builder over typed fields.
///
/// Strings and slices are length-prefixed so adjacent fields cannot alias
/// ("ab" + "c" never hashes like "a" + "bc").
pub struct FingerprintBuilder {
    hasher: Xxh3,
}

impl FingerprintBuilder {
    /// `domain` separates key spaces (view-model keys can never collide
    /// with target keys built from the same data).
    pub fn new(domain: &str) -> Self {
        let mut builder = Self {
            hasher: Xxh3::new(),
        };
        builder.push_str(domain);
        builder
    }

    pub fn push_str(&mut self, s: &str) -> &mut Self {
        self.push_u64(s.len() as u64);
        self.hasher.update(s.as_bytes());
        self
    }

    pub fn push_u64(&mut self, v: u64) -> &mut Self {
        self.hasher.update(&v.to_le_bytes());
        self
    }

    pub fn push_usize(&mut self, v: usize) -> &mut Self {
        self.push_u64(v as u64)
    }

    pub fn push_f64(&mut self, v: f64) -> &mut Self {
        self.push_u64(v.to_bits())
    }

    pub fn push_f64_slice(&mut self, values: &[f64]) -> &mut Self {
        self.push_usize(values.len());
        for v in values {
            self.push_f64(*v);
        }
        self
    }

    pub fn finish(&self) -> Fingerprint {
        Fingerprint(self.hasher.digest())
    }
}

fn push_locations(builder: &mut FingerprintBuilder, locations: &[Location]) {
    builder.push_usize(locations.len());
    for loc in locations {
        builder.push_str(&loc.id);
        builder.push_f64(loc.x);
        builder.push_f64(loc.y);
    }
}

fn push_view(builder: &mut FingerprintBuilder, view: &View) {
    builder.push_str(view.name());
    builder.push_usize(view.n_features());
    for feature in view.features() {
        builder.push_str(feature);
    }
    builder.push_f64_slice(view.values());
}

fn push_folds(builder: &mut FingerprintBuilder, folds: &FoldAssignment) {
    builder.push_usize(folds.k());
    builder.push_usize(folds.n());
    for &fold in folds.membership() {
        builder.push_usize(fold);
    }
}

fn push_learner_params(builder: &mut FingerprintBuilder, params: &LearnerParams) {
    builder.push_usize(params.trees);
    match params.mtry {
        Some(m) => builder.push_u64(1).push_usize(m),
        None => builder.push_u64(0),
    };
    builder.push_usize(params.min_leaf);
    match params.max_depth {
        Some(d) => builder.push_u64(1).push_usize(d),
        None => builder.push_u64(0),
    };
}

/// Fingerprint of the ordered location ids and coordinates.
pub fn fingerprint_locations(locations: &[Location]) -> Fingerprint {
    let mut builder = FingerprintBuilder::new("mosaic/locations/v1");
    push_locations(&mut builder, locations);
    builder.finish()
}

/// Cache key for one per-view model fit.
pub fn fingerprint_view_model(
    view: &View,
    locations: &[Location],
    target: &str,
    folds: &FoldAssignment,
    params: &LearnerParams,
    seed: u64,
) -> Fingerprint {
    let mut builder = FingerprintBuilder::new("mosaic/view-model/v1");
    push_locations(&mut builder, locations);
    push_view(&mut builder, view);
    builder.push_str(target);
    push_folds(&mut builder, folds);
    push_learner_params(&mut builder, params);
    builder.push_u64(seed);
    builder.finish()
}

/// Cache key for one fused target result.
pub fn fingerprint_target(
    collection: &ViewCollection,
    target: &str,
    folds: &FoldAssignment,
    params: &LearnerParams,
    ridge_lambda: f64,
    seed: u64,
) -> Fingerprint {
    let mut builder = FingerprintBuilder::new("mosaic/target/v1");
    push_locations(&mut builder, collection.locations());
    builder.push_usize(collection.views().len());
    for view in collection.views() {
        push_view(&mut builder, view);
    }
    builder.push_str(target);
    push_folds(&mut builder, folds);
    push_learner_params(&mut builder, params);
    builder.push_f64(ridge_lambda);
    builder.push_u64(seed);
    builder.finish()
}

/// Key identifying a whole run (its data, targets, and parameters).
pub fn fingerprint_run(
    collection: &ViewCollection,
    targets: &[String],
    folds: &FoldAssignment,
    params: &LearnerParams,
    ridge_lambda: f64,
    seed: u64,
) -> Fingerprint {
    let mut builder = FingerprintBuilder::new("mosaic/run/v1");
    push_locations(&mut builder, collection.locations());
    builder.push_usize(collection.views().len());
    for view in collection.views() {
        push_view(&mut builder, view);
    }
    builder.push_usize(targets.len());
    for target in targets {
        builder.push_str(target);
    }
    push_folds(&mut builder, folds);
    push_learner_params(&mut builder, params);
    builder.push_f64(ridge_lambda);
    builder.push_u64(seed);
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LearnerConfig;
    use crate::types::ViewKind;

    fn locations() -> Vec<Location> {
        (0..6)
            .map(|i| Location::new(format!("L{i}"), i as f64, 0.0))
            .collect()
    }

    fn view(values: Vec<f64>) -> View {
        View::new(ViewKind::Intrinsic, vec!["f0".into()], values, 6).unwrap()
    }

    fn params() -> LearnerParams {
        LearnerConfig::default().resolve()
    }

    #[test]
    fn identical_inputs_identical_keys() {
        let locs = locations();
        let v = view(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let folds = FoldAssignment::new(6, 3, 42).unwrap();
        let a = fingerprint_view_model(&v, &locs, "f0", &folds, &params(), 42);
        let b = fingerprint_view_model(&v, &locs, "f0", &folds, &params(), 42);
        assert_eq!(a, b);
    }

    #[test]
    fn any_input_change_changes_the_key() {
        let locs = locations();
        let folds = FoldAssignment::new(6, 3, 42).unwrap();
        let base = fingerprint_view_model(
            &view(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]),
            &locs,
            "f0",
            &folds,
            &params(),
            42,
        );

        let changed_value = fingerprint_view_model(
            &view(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.5]),
            &locs,
            "f0",
            &folds,
            &params(),
            42,
        );
        assert_ne!(base, changed_value);

        let changed_target = fingerprint_view_model(
            &view(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]),
            &locs,
            "f1",
            &folds,
            &params(),
            42,
        );
        assert_ne!(base, changed_target);

        let changed_seed = fingerprint_view_model(
            &view(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]),
            &locs,
            "f0",
            &folds,
            &params(),
            43,
        );
        assert_ne!(base, changed_seed);

        let other_folds = FoldAssignment::new(6, 3, 7).unwrap();
        let changed_folds = fingerprint_view_model(
            &view(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]),
            &locs,
            "f0",
            &other_folds,
            &params(),
            42,
        );
        assert_ne!(base, changed_folds);
    }

    #[test]
    fn domains_separate_key_spaces() {
        let a = FingerprintBuilder::new("mosaic/view-model/v1").finish();
        let b = FingerprintBuilder::new("mosaic/target/v1").finish();
        assert_ne!(a, b);
    }

    #[test]
    fn hex_rendering_is_sixteen_digits() {
        let fp = Fingerprint::from_u64(0xff);
        assert_eq!(fp.to_hex(), "00000000000000ff");
        assert_eq!(format!("{fp}"), "00000000000000ff");
    }

    #[test]
    fn length_prefix_prevents_field_aliasing() {
        let mut a = FingerprintBuilder::new("t");
        a.push_str("ab").push_str("c");
        let mut b = FingerprintBuilder::new("t");
        b.push_str("a").push_str("bc");
        assert_ne!(a.finish(), b.finish());
    }
}
