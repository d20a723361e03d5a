//! Run configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::learner_config::LearnerConfig;
use crate::constants::{DEFAULT_FOLDS, DEFAULT_RIDGE_LAMBDA, DEFAULT_SEED, DEFAULT_WORKERS};
use crate::errors::ConfigError;
use crate::types::ViewKind;
use rustc_hash::FxHashSet;

/// Configuration for one modeling run.
///
/// Loadable from TOML; every field has a default. `validate` runs before any
/// modeling work and turns bad values into fatal [`ConfigError`]s.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Views to build. Must contain exactly one intrinsic view.
    pub views: Vec<ViewKind>,
    /// Cross-validation folds. Default: 10.
    pub folds: Option<usize>,
    /// Run seed driving every pseudo-random choice. Default: 42.
    pub seed: Option<u64>,
    /// Worker threads (0 = all cores). Default: 0.
    pub workers: Option<usize>,
    /// Per-view ensemble hyperparameters.
    pub learner: LearnerConfig,
    /// Ridge penalty for the meta-model. Default: 1.0.
    pub ridge_lambda: Option<f64>,
    /// SQLite result store path. None = the caller supplies a cache.
    pub store_path: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            views: vec![ViewKind::Intrinsic],
            folds: None,
            seed: None,
            workers: None,
            learner: LearnerConfig::default(),
            ridge_lambda: None,
            store_path: None,
        }
    }
}

impl RunConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|e| ConfigError::ParseError {
            path: "<inline>".into(),
            message: e.to_string(),
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;
        toml::from_str(&raw).map_err(|e| ConfigError::ParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    pub fn effective_folds(&self) -> usize {
        self.folds.unwrap_or(DEFAULT_FOLDS)
    }

    pub fn effective_seed(&self) -> u64 {
        self.seed.unwrap_or(DEFAULT_SEED)
    }

    pub fn effective_workers(&self) -> usize {
        self.workers.unwrap_or(DEFAULT_WORKERS)
    }

    pub fn effective_ridge_lambda(&self) -> f64 {
        self.ridge_lambda.unwrap_or(DEFAULT_RIDGE_LAMBDA)
    }

    /// Validate the whole surface. Called by the pipeline before any work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let intrinsic = self.views.iter().filter(|v| v.is_intrinsic()).count();
        if intrinsic != 1 {
            return Err(ConfigError::ValidationFailed {
                field: "views".into(),
                message: format!("expected exactly one intrinsic view, found {intrinsic}"),
            });
        }

        let mut names = FxHashSet::default();
        for kind in &self.views {
            let name = kind.name();
            if !names.insert(name.clone()) {
                return Err(ConfigError::ValidationFailed {
                    field: "views".into(),
                    message: format!("duplicate view '{name}'"),
                });
            }
            match *kind {
                ViewKind::Intrinsic => {}
                ViewKind::DistanceWeighted { radius } => {
                    if !radius.is_finite() || radius <= 0.0 {
                        return Err(ConfigError::ValidationFailed {
                            field: "views".into(),
                            message: format!("radius must be finite and positive, got {radius}"),
                        });
                    }
                }
                ViewKind::NeighborGraph { threshold } => {
                    if !threshold.is_finite() || threshold <= 0.0 {
                        return Err(ConfigError::ValidationFailed {
                            field: "views".into(),
                            message: format!(
                                "threshold must be finite and positive, got {threshold}"
                            ),
                        });
                    }
                }
            }
        }

        if self.effective_folds() < 2 {
            return Err(ConfigError::ValidationFailed {
                field: "folds".into(),
                message: format!("need at least 2 folds, got {}", self.effective_folds()),
            });
        }

        if self.learner.effective_trees() == 0 {
            return Err(ConfigError::ValidationFailed {
                field: "learner.trees".into(),
                message: "need at least one tree".into(),
            });
        }
        if self.learner.effective_min_leaf() == 0 {
            return Err(ConfigError::ValidationFailed {
                field: "learner.min_leaf".into(),
                message: "minimum leaf size must be at least 1".into(),
            });
        }
        if self.learner.mtry == Some(0) {
            return Err(ConfigError::ValidationFailed {
                field: "learner.mtry".into(),
                message: "mtry must be at least 1".into(),
            });
        }

        let lambda = self.effective_ridge_lambda();
        if !lambda.is_finite() || lambda <= 0.0 {
            return Err(ConfigError::ValidationFailed {
                field: "ridge_lambda".into(),
                message: format!("ridge penalty must be finite and positive, got {lambda}"),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let config = RunConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.effective_folds(), 10);
        assert_eq!(config.effective_seed(), 42);
        assert_eq!(config.effective_ridge_lambda(), 1.0);
    }

    #[test]
    fn parses_full_toml_surface() {
        let raw = r#"
            folds = 5
            seed = 7
            workers = 2
            ridge_lambda = 0.5

            [learner]
            trees = 50
            min_leaf = 3

            [[views]]
            kind = "intrinsic"

            [[views]]
            kind = "distance_weighted"
            radius = 10.0

            [[views]]
            kind = "neighbor_graph"
            threshold = 1.5
        "#;
        let config = RunConfig::from_toml_str(raw).unwrap();
        config.validate().unwrap();
        assert_eq!(config.effective_folds(), 5);
        assert_eq!(config.views.len(), 3);
        assert_eq!(config.learner.effective_trees(), 50);
        assert!(matches!(
            config.views[1],
            ViewKind::DistanceWeighted { radius } if radius == 10.0
        ));
    }

    #[test]
    fn missing_intrinsic_view_fails_validation() {
        let config = RunConfig {
            views: vec![ViewKind::DistanceWeighted { radius: 1.0 }],
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationFailed { field, .. }) if field == "views"
        ));
    }

    #[test]
    fn two_intrinsic_views_fail_validation() {
        let config = RunConfig {
            views: vec![ViewKind::Intrinsic, ViewKind::Intrinsic],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn bad_radius_fails_validation() {
        let config = RunConfig {
            views: vec![ViewKind::Intrinsic, ViewKind::DistanceWeighted { radius: -1.0 }],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn single_fold_fails_validation() {
        let config = RunConfig {
            folds: Some(1),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn non_positive_lambda_fails_validation() {
        let config = RunConfig {
            ridge_lambda: Some(0.0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn bad_toml_is_a_parse_error() {
        let err = RunConfig::from_toml_str("folds = \"ten\"").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }
}
