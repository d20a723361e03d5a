//! Single regression trees over flat row-major predictor data.

use crate::rng::LcgRng;

/// Hyperparameters a single tree needs, resolved against the actual
/// predictor count.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TreeParams {
    pub mtry: usize,
    pub min_leaf: usize,
    pub max_depth: Option<usize>,
}

/// Arena node. Children are indices into the owning tree's node vector.
#[derive(Debug, Clone)]
pub(crate) enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
        /// Per-sample MSE decrease achieved by this split.
        decrease: f64,
        n_samples: usize,
    },
    Leaf {
        value: f64,
        n_samples: usize,
    },
}

/// A CART-style regression tree grown on a bootstrap sample.
///
/// `rows` may contain duplicates; every computation treats it as a multiset.
/// The split search draws a fresh random feature subset of size `mtry` at
/// every node.
#[derive(Debug, Clone)]
pub(crate) struct RegressionTree {
    nodes: Vec<TreeNode>,
}

impl RegressionTree {
    pub fn fit(
        data: &[f64],
        n_features: usize,
        targets: &[f64],
        rows: &[usize],
        params: &TreeParams,
        rng: &mut LcgRng,
    ) -> Self {
        let mut nodes = Vec::new();
        build_node(data, n_features, targets, rows, params, 0, &mut nodes, rng);
        Self { nodes }
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf { value, .. } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    idx = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    /// Add this tree's weighted impurity decrease per feature into `into`.
    pub fn add_importance(&self, into: &mut [f64]) {
        for node in &self.nodes {
            if let TreeNode::Split {
                feature,
                decrease,
                n_samples,
                ..
            } = node
            {
                into[*feature] += decrease * *n_samples as f64;
            }
        }
    }

    #[cfg(test)]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }
}

fn mean_of(targets: &[f64], rows: &[usize]) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }
    rows.iter().map(|&i| targets[i]).sum::<f64>() / rows.len() as f64
}

#[allow(clippy::too_many_arguments)]
fn build_node(
    data: &[f64],
    n_features: usize,
    targets: &[f64],
    rows: &[usize],
    params: &TreeParams,
    depth: usize,
    nodes: &mut Vec<TreeNode>,
    rng: &mut LcgRng,
) -> usize {
    let leaf_value = mean_of(targets, rows);
    let depth_reached = params.max_depth.is_some_and(|d| depth >= d);

    if depth_reached || rows.len() < 2 * params.min_leaf || targets_constant(targets, rows) {
        let idx = nodes.len();
        nodes.push(TreeNode::Leaf {
            value: leaf_value,
            n_samples: rows.len(),
        });
        return idx;
    }

    let candidates = rng.feature_subset(n_features, params.mtry);
    let Some((feature, threshold, decrease)) =
        best_split(data, n_features, targets, rows, &candidates, params.min_leaf)
    else {
        let idx = nodes.len();
        nodes.push(TreeNode::Leaf {
            value: leaf_value,
            n_samples: rows.len(),
        });
        return idx;
    };

    let (left_rows, right_rows) = split_rows(data, n_features, rows, feature, threshold);

    // Children are built after the parent, so reserve the slot now and
    // replace the placeholder once both subtrees exist.
    let node_idx = nodes.len();
    nodes.push(TreeNode::Leaf {
        value: 0.0,
        n_samples: 0,
    });

    let left = build_node(
        data,
        n_features,
        targets,
        &left_rows,
        params,
        depth + 1,
        nodes,
        rng,
    );
    let right = build_node(
        data,
        n_features,
        targets,
        &right_rows,
        params,
        depth + 1,
        nodes,
        rng,
    );

    nodes[node_idx] = TreeNode::Split {
        feature,
        threshold,
        left,
        right,
        decrease,
        n_samples: rows.len(),
    };
    node_idx
}

fn targets_constant(targets: &[f64], rows: &[usize]) -> bool {
    let first = targets[rows[0]];
    rows.iter().all(|&i| (targets[i] - first).abs() < 1e-12)
}

/// Best `(feature, threshold, per_sample_decrease)` over the candidate
/// features, or `None` when no split strictly reduces the SSE.
fn best_split(
    data: &[f64],
    n_features: usize,
    targets: &[f64],
    rows: &[usize],
    candidates: &[usize],
    min_leaf: usize,
) -> Option<(usize, f64, f64)> {
    let n = rows.len();
    let total_sum: f64 = rows.iter().map(|&i| targets[i]).sum();
    let total_sq: f64 = rows.iter().map(|&i| targets[i] * targets[i]).sum();
    let parent_sse = total_sq - total_sum * total_sum / n as f64;

    let mut best: Option<(usize, f64, f64)> = None;
    let mut best_decrease = 0.0;

    for &feat in candidates {
        let mut pairs: Vec<(f64, f64)> = rows
            .iter()
            .map(|&i| (data[i * n_features + feat], targets[i]))
            .collect();
        pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        let mut left_sum = 0.0;
        let mut left_sq = 0.0;
        let mut left_count = 0usize;

        for i in 0..n - 1 {
            left_sum += pairs[i].1;
            left_sq += pairs[i].1 * pairs[i].1;
            left_count += 1;

            // No threshold fits between equal feature values.
            if (pairs[i].0 - pairs[i + 1].0).abs() < 1e-15 {
                continue;
            }
            let right_count = n - left_count;
            if left_count < min_leaf || right_count < min_leaf {
                continue;
            }

            let left_sse = left_sq - left_sum * left_sum / left_count as f64;
            let right_sum = total_sum - left_sum;
            let right_sq = total_sq - left_sq;
            let right_sse = right_sq - right_sum * right_sum / right_count as f64;

            let sse_decrease = parent_sse - left_sse - right_sse;
            if sse_decrease > best_decrease {
                best_decrease = sse_decrease;
                let threshold = (pairs[i].0 + pairs[i + 1].0) / 2.0;
                best = Some((feat, threshold, sse_decrease / n as f64));
            }
        }
    }

    best
}

fn split_rows(
    data: &[f64],
    n_features: usize,
    rows: &[usize],
    feature: usize,
    threshold: f64,
) -> (Vec<usize>, Vec<usize>) {
    let mut left = Vec::new();
    let mut right = Vec::new();
    for &i in rows {
        if data[i * n_features + feature] <= threshold {
            left.push(i);
        } else {
            right.push(i);
        }
    }
    (left, right)
}
