//! Gradient-boosted regression trees with logistic loss.
//!
//! A small, deterministic binary classifier for the learned reranker:
//!
//! 1. The base margin is the weighted log-odds of the positive rate
//! 2. Each round computes per-sample gradients `w·(p - y)` and hessians
//!    `w·p·(1 - p)` from the current margins
//! 3. A depth-limited tree is grown greedily; a split is kept only when its
//!    gain is positive and both children carry at least `min_child_weight`
//!    hessian
//! 4. Leaf values are `-G / (H + λ)` scaled by the learning rate
//!
//! Trees are stored as flat node arenas so a fitted model serializes
//! directly to JSON.

use serde::{Deserialize, Serialize};

use assessa_core::{Error, LearnedRerankConfig, Result};

const MIN_GAIN: f64 = 1e-9;
const MIN_HESSIAN: f64 = 1e-16;
const PROB_CLAMP: f64 = 1e-6;

/// Boosting hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GbdtParams {
    /// Boosting rounds.
    pub rounds: usize,
    /// Maximum tree depth (a depth of 0 grows single-leaf trees).
    pub max_depth: usize,
    /// Shrinkage applied to leaf values.
    pub learning_rate: f32,
    /// L2 regularisation on leaf values.
    pub lambda: f32,
    /// Minimum hessian sum in each child of a split.
    pub min_child_weight: f32,
}

impl Default for GbdtParams {
    fn default() -> Self {
        Self::from(&LearnedRerankConfig::default())
    }
}

impl From<&LearnedRerankConfig> for GbdtParams {
    fn from(config: &LearnedRerankConfig) -> Self {
        Self {
            rounds: config.rounds,
            max_depth: config.max_depth,
            learning_rate: config.learning_rate,
            lambda: config.lambda,
            min_child_weight: config.min_child_weight,
        }
    }
}

/// A tree node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    /// Internal node: samples with `x[feature] < threshold` go left.
    Split {
        /// Feature index.
        feature: usize,
        /// Split threshold.
        threshold: f32,
        /// Arena index of the left child.
        left: usize,
        /// Arena index of the right child.
        right: usize,
    },
    /// Terminal node.
    Leaf {
        /// Margin contribution.
        value: f32,
    },
}

/// A regression tree; the root is node 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    /// Nodes in arena order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Margin contribution for `x`. Missing features read as 0.
    pub fn predict(&self, x: &[f32]) -> f32 {
        let mut id = 0;
        // Children always have larger indices than their parent, so this
        // walk visits at most `nodes.len()` nodes.
        for _ in 0..self.nodes.len() {
            match self.nodes.get(id) {
                Some(Node::Leaf { value }) => return *value,
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let v = x.get(*feature).copied().unwrap_or(0.0);
                    id = if v < *threshold { *left } else { *right };
                }
                None => return 0.0,
            }
        }
        0.0
    }

    fn validate(&self, feature_count: usize) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(Error::integrity("tree has no nodes"));
        }
        for (id, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Leaf { value } if !value.is_finite() => {
                    return Err(Error::integrity(format!("leaf {id} is not finite")));
                }
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= feature_count {
                        return Err(Error::integrity(format!(
                            "node {id} splits on feature {feature} of {feature_count}"
                        )));
                    }
                    if !threshold.is_finite() {
                        return Err(Error::integrity(format!("node {id} threshold is not finite")));
                    }
                    for child in [*left, *right] {
                        if child <= id || child >= self.nodes.len() {
                            return Err(Error::integrity(format!(
                                "node {id} has invalid child {child}"
                            )));
                        }
                    }
                }
                Node::Leaf { .. } => {}
            }
        }
        Ok(())
    }
}

/// A fitted boosted-tree classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostedTrees {
    base_score: f32,
    feature_count: usize,
    trees: Vec<Tree>,
}

impl GradientBoostedTrees {
    /// Fit a classifier.
    ///
    /// `rows`, `labels` and `weights` must have equal, non-zero length and
    /// every row must have the same width.
    pub fn fit<R: AsRef<[f32]>>(
        rows: &[R],
        labels: &[bool],
        weights: &[f32],
        params: &GbdtParams,
    ) -> Result<Self> {
        let n = rows.len();
        if n == 0 {
            return Err(Error::invalid_data("cannot fit on an empty training set"));
        }
        if labels.len() != n || weights.len() != n {
            return Err(Error::invalid_data(format!(
                "{n} rows but {} labels and {} weights",
                labels.len(),
                weights.len()
            )));
        }
        let feature_count = rows[0].as_ref().len();
        if let Some(bad) = rows.iter().position(|r| r.as_ref().len() != feature_count) {
            return Err(Error::invalid_data(format!(
                "row {bad} has {} features, expected {feature_count}",
                rows[bad].as_ref().len()
            )));
        }

        let rows: Vec<&[f32]> = rows.iter().map(AsRef::as_ref).collect();
        let y: Vec<f64> = labels.iter().map(|&l| if l { 1.0 } else { 0.0 }).collect();
        let w: Vec<f64> = weights.iter().map(|&w| f64::from(w.max(0.0))).collect();

        let total_weight: f64 = w.iter().sum();
        let positive_weight: f64 = w.iter().zip(&y).map(|(w, y)| w * y).sum();
        let rate = if total_weight > 0.0 {
            (positive_weight / total_weight).clamp(PROB_CLAMP, 1.0 - PROB_CLAMP)
        } else {
            0.5
        };
        let base_score = (rate / (1.0 - rate)).ln();

        let mut margins = vec![base_score; n];
        let mut trees = Vec::with_capacity(params.rounds);
        let grower = TreeGrower {
            rows: &rows,
            feature_count,
            params,
        };

        for round in 0..params.rounds {
            let mut grad = Vec::with_capacity(n);
            let mut hess = Vec::with_capacity(n);
            for i in 0..n {
                let p = sigmoid(margins[i]);
                grad.push(w[i] * (p - y[i]));
                hess.push((w[i] * p * (1.0 - p)).max(MIN_HESSIAN));
            }

            let tree = grower.grow(&grad, &hess);
            for (margin, row) in margins.iter_mut().zip(&rows) {
                *margin += f64::from(tree.predict(row));
            }
            log::trace!("Boosting round {round}: {} nodes", tree.nodes.len());
            trees.push(tree);
        }

        Ok(Self {
            base_score: base_score as f32,
            feature_count,
            trees,
        })
    }

    /// Expected feature vector width.
    pub fn feature_count(&self) -> usize {
        self.feature_count
    }

    /// Number of fitted trees.
    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    /// Raw log-odds margin.
    pub fn predict_margin(&self, x: &[f32]) -> f32 {
        self.base_score + self.trees.iter().map(|t| t.predict(x)).sum::<f32>()
    }

    /// Positive-class probability in `[0, 1]`.
    pub fn predict_probability(&self, x: &[f32]) -> f32 {
        sigmoid(f64::from(self.predict_margin(x))) as f32
    }

    /// Check structural soundness of a deserialized model.
    pub fn validate(&self) -> Result<()> {
        if !self.base_score.is_finite() {
            return Err(Error::integrity("base score is not finite"));
        }
        for tree in &self.trees {
            tree.validate(self.feature_count)?;
        }
        Ok(())
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

struct SplitChoice {
    feature: usize,
    threshold: f32,
    gain: f64,
}

struct TreeGrower<'a> {
    rows: &'a [&'a [f32]],
    feature_count: usize,
    params: &'a GbdtParams,
}

impl TreeGrower<'_> {
    fn grow(&self, grad: &[f64], hess: &[f64]) -> Tree {
        let mut nodes = Vec::new();
        let indices: Vec<usize> = (0..self.rows.len()).collect();
        self.build(&indices, 0, grad, hess, &mut nodes);
        Tree { nodes }
    }

    fn leaf_value(&self, g: f64, h: f64) -> f32 {
        let lambda = f64::from(self.params.lambda);
        (-g / (h + lambda) * f64::from(self.params.learning_rate)) as f32
    }

    fn score(&self, g: f64, h: f64) -> f64 {
        g * g / (h + f64::from(self.params.lambda))
    }

    fn build(
        &self,
        indices: &[usize],
        depth: usize,
        grad: &[f64],
        hess: &[f64],
        nodes: &mut Vec<Node>,
    ) -> usize {
        let g: f64 = indices.iter().map(|&i| grad[i]).sum();
        let h: f64 = indices.iter().map(|&i| hess[i]).sum();

        let id = nodes.len();
        nodes.push(Node::Leaf {
            value: self.leaf_value(g, h),
        });

        if depth >= self.params.max_depth || indices.len() < 2 {
            return id;
        }
        let Some(split) = self.best_split(indices, g, h, grad, hess) else {
            return id;
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .copied()
            .partition(|&i| self.rows[i][split.feature] < split.threshold);

        let left = self.build(&left_idx, depth + 1, grad, hess, nodes);
        let right = self.build(&right_idx, depth + 1, grad, hess, nodes);
        nodes[id] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        id
    }

    fn best_split(
        &self,
        indices: &[usize],
        g: f64,
        h: f64,
        grad: &[f64],
        hess: &[f64],
    ) -> Option<SplitChoice> {
        let parent = self.score(g, h);
        let min_child = f64::from(self.params.min_child_weight);
        let mut best: Option<SplitChoice> = None;
        let mut sorted = indices.to_vec();

        for feature in 0..self.feature_count {
            sorted.sort_by(|&a, &b| self.rows[a][feature].total_cmp(&self.rows[b][feature]));

            let (mut gl, mut hl) = (0.0, 0.0);
            for pair in sorted.windows(2) {
                let (i, next) = (pair[0], pair[1]);
                gl += grad[i];
                hl += hess[i];

                let (v, v_next) = (self.rows[i][feature], self.rows[next][feature]);
                if v == v_next || !v.is_finite() || !v_next.is_finite() {
                    continue;
                }
                let (gr, hr) = (g - gl, h - hl);
                if hl < min_child || hr < min_child {
                    continue;
                }

                let gain = self.score(gl, hl) + self.score(gr, hr) - parent;
                if gain > MIN_GAIN && best.as_ref().is_none_or(|b| gain > b.gain) {
                    best = Some(SplitChoice {
                        feature,
                        threshold: v + (v_next - v) / 2.0,
                        gain,
                    });
                }
            }
        }
        best
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Feature 0 decides the label; feature 1 is noise.
    fn separable() -> (Vec<[f32; 2]>, Vec<bool>, Vec<f32>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..40 {
            let x = i as f32 / 40.0;
            rows.push([x, ((i * 7) % 11) as f32]);
            labels.push(x >= 0.5);
        }
        let weights = vec![1.0; rows.len()];
        (rows, labels, weights)
    }

    fn small_params() -> GbdtParams {
        GbdtParams {
            rounds: 30,
            max_depth: 3,
            ..GbdtParams::default()
        }
    }

    #[test]
    fn test_defaults_follow_config() {
        let params = GbdtParams::default();
        assert_eq!(params.rounds, 200);
        assert_eq!(params.max_depth, 6);
        assert_eq!(params.learning_rate, 0.1);
    }

    #[test]
    fn test_learns_separable_data() {
        let (rows, labels, weights) = separable();
        let model = GradientBoostedTrees::fit(&rows, &labels, &weights, &small_params()).unwrap();

        assert_eq!(model.tree_count(), 30);
        assert_eq!(model.feature_count(), 2);
        assert!(model.predict_probability(&[0.9, 3.0]) > 0.8);
        assert!(model.predict_probability(&[0.1, 3.0]) < 0.2);
    }

    #[test]
    fn test_probability_in_unit_interval() {
        let (rows, labels, weights) = separable();
        let model = GradientBoostedTrees::fit(&rows, &labels, &weights, &small_params()).unwrap();
        for x in [-100.0, 0.0, 0.49, 0.51, 1.0, 100.0, f32::NAN] {
            let p = model.predict_probability(&[x, 0.0]);
            assert!((0.0..=1.0).contains(&p), "{p} for {x}");
        }
    }

    #[test]
    fn test_fit_is_deterministic() {
        let (rows, labels, weights) = separable();
        let a = GradientBoostedTrees::fit(&rows, &labels, &weights, &small_params()).unwrap();
        let b = GradientBoostedTrees::fit(&rows, &labels, &weights, &small_params()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_base_score_is_weighted_log_odds() {
        let rows = vec![[0.0f32]; 4];
        let labels = vec![true, false, false, false];
        let weights = vec![3.0, 1.0, 1.0, 1.0];
        let params = GbdtParams {
            rounds: 0,
            ..GbdtParams::default()
        };
        let model = GradientBoostedTrees::fit(&rows, &labels, &weights, &params).unwrap();
        // Weighted positive rate is 0.5.
        assert!(model.predict_margin(&[0.0]).abs() < 1e-6);
    }

    #[test]
    fn test_min_child_weight_blocks_splits() {
        let (rows, labels, weights) = separable();
        let params = GbdtParams {
            rounds: 1,
            min_child_weight: 1_000.0,
            ..GbdtParams::default()
        };
        let model = GradientBoostedTrees::fit(&rows, &labels, &weights, &params).unwrap();
        assert_eq!(model.trees[0].nodes().len(), 1);
    }

    #[test]
    fn test_fit_rejects_bad_input() {
        let params = GbdtParams::default();
        let empty: Vec<[f32; 1]> = Vec::new();
        assert!(GradientBoostedTrees::fit(&empty, &[], &[], &params).is_err());
        assert!(GradientBoostedTrees::fit(&[[1.0f32]], &[true, false], &[1.0], &params).is_err());
        let ragged: Vec<Vec<f32>> = vec![vec![1.0, 2.0], vec![1.0]];
        assert!(GradientBoostedTrees::fit(&ragged, &[true, false], &[1.0, 1.0], &params).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_child() {
        let model = GradientBoostedTrees {
            base_score: 0.0,
            feature_count: 1,
            trees: vec![Tree {
                nodes: vec![Node::Split {
                    feature: 0,
                    threshold: 0.5,
                    left: 0,
                    right: 7,
                }],
            }],
        };
        assert!(model.validate().unwrap_err().is_integrity());
    }

    #[test]
    fn test_validate_rejects_unknown_feature() {
        let model = GradientBoostedTrees {
            base_score: 0.0,
            feature_count: 1,
            trees: vec![Tree {
                nodes: vec![
                    Node::Split {
                        feature: 3,
                        threshold: 0.5,
                        left: 1,
                        right: 2,
                    },
                    Node::Leaf { value: 0.1 },
                    Node::Leaf { value: -0.1 },
                ],
            }],
        };
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_serde_preserves_predictions() {
        let (rows, labels, weights) = separable();
        let model = GradientBoostedTrees::fit(&rows, &labels, &weights, &small_params()).unwrap();
        let json = serde_json::to_string(&model).unwrap();
        let back: GradientBoostedTrees = serde_json::from_str(&json).unwrap();
        back.validate().unwrap();
        let (a, b) = (back.predict_margin(&[0.7, 1.0]), model.predict_margin(&[0.7, 1.0]));
        assert!((a - b).abs() < 1e-4);
    }
}
