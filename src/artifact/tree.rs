//! Regression tree ensembles.
//!
//! Covers both bagged forests (outputs averaged over trees) and gradient
//! boosted trees (outputs summed over trees on top of a base score). Each tree
//! is a flat node array in pre-order, so children always sit after their
//! parent.

use crate::artifact::{ArtifactError, Model, ShapeMismatch, check_feature_count};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        values: Vec<f64>,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// Random forest.
    #[default]
    Mean,
    /// Gradient boosting.
    Sum,
}

/// Comparison that sends a sample to the left child.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitRule {
    /// `x <= threshold`
    #[default]
    LessEqual,
    /// `x < threshold`
    Less,
}

impl SplitRule {
    fn goes_left(self, value: f64, threshold: f64) -> bool {
        match self {
            SplitRule::LessEqual => value <= threshold,
            SplitRule::Less => value < threshold,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TreeEnsembleParams {
    pub n_features: usize,
    pub n_outputs: usize,
    #[serde(default)]
    pub aggregation: Aggregation,
    #[serde(default)]
    pub split_rule: SplitRule,
    /// Added to the aggregated outputs. Defaults to zeros.
    #[serde(default)]
    pub base_score: Option<Vec<f64>>,
    pub trees: Vec<Vec<TreeNode>>,
}

#[derive(Debug, Clone)]
pub struct TreeEnsemble {
    n_features: usize,
    n_outputs: usize,
    aggregation: Aggregation,
    split_rule: SplitRule,
    base_score: Vec<f64>,
    trees: Vec<Vec<TreeNode>>,
}

fn validate_tree(
    index: usize,
    nodes: &[TreeNode],
    n_features: usize,
    n_outputs: usize,
) -> Result<(), ArtifactError> {
    if nodes.is_empty() {
        return Err(ArtifactError::Invalid(format!("tree {index} has no nodes")));
    }
    for (position, node) in nodes.iter().enumerate() {
        match node {
            TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if *feature >= n_features {
                    return Err(ArtifactError::Invalid(format!(
                        "tree {index} node {position} splits on feature {feature} of {n_features}"
                    )));
                }
                if threshold.is_nan() {
                    return Err(ArtifactError::Invalid(format!(
                        "tree {index} node {position} has a NaN threshold"
                    )));
                }
                for child in [*left, *right] {
                    if child <= position || child >= nodes.len() {
                        return Err(ArtifactError::Invalid(format!(
                            "tree {index} node {position} has invalid child {child}"
                        )));
                    }
                }
            }
            TreeNode::Leaf { values } => {
                if values.len() != n_outputs {
                    return Err(ArtifactError::Invalid(format!(
                        "tree {index} node {position} has {} values, expected {n_outputs}",
                        values.len()
                    )));
                }
                if values.iter().any(|v| !v.is_finite()) {
                    return Err(ArtifactError::Invalid(format!(
                        "tree {index} node {position} has a non-finite leaf value"
                    )));
                }
            }
        }
    }
    Ok(())
}

impl TreeEnsemble {
    pub fn new(params: TreeEnsembleParams) -> Result<Self, ArtifactError> {
        if params.n_features == 0 || params.n_outputs == 0 {
            return Err(ArtifactError::Invalid(
                "tree ensemble needs at least one feature and one output".to_string(),
            ));
        }
        if params.trees.is_empty() {
            return Err(ArtifactError::Invalid("tree ensemble has no trees".to_string()));
        }
        for (index, nodes) in params.trees.iter().enumerate() {
            validate_tree(index, nodes, params.n_features, params.n_outputs)?;
        }
        let base_score = params
            .base_score
            .unwrap_or_else(|| vec![0.0; params.n_outputs]);
        if base_score.len() != params.n_outputs {
            return Err(ArtifactError::Invalid(format!(
                "base score has {} values, expected {}",
                base_score.len(),
                params.n_outputs
            )));
        }
        if base_score.iter().any(|v| !v.is_finite()) {
            return Err(ArtifactError::Invalid("base score must be finite".to_string()));
        }
        Ok(Self {
            n_features: params.n_features,
            n_outputs: params.n_outputs,
            aggregation: params.aggregation,
            split_rule: params.split_rule,
            base_score,
            trees: params.trees,
        })
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    fn leaf<'a>(&self, nodes: &'a [TreeNode], features: &[f64]) -> &'a [f64] {
        // Children always follow their parent, so the walk terminates.
        let mut position = 0;
        loop {
            match &nodes[position] {
                TreeNode::Leaf { values } => return values,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    position = if self.split_rule.goes_left(features[*feature], *threshold) {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }
}

impl Model for TreeEnsemble {
    fn predict(&self, features: &[f64]) -> Result<Vec<f64>, ShapeMismatch> {
        check_feature_count(features, self.n_features)?;
        let mut totals = vec![0.0; self.n_outputs];
        for nodes in &self.trees {
            for (total, value) in totals.iter_mut().zip(self.leaf(nodes, features)) {
                *total += value;
            }
        }
        if self.aggregation == Aggregation::Mean {
            let count = self.trees.len() as f64;
            totals.iter_mut().for_each(|total| *total /= count);
        }
        Ok(totals
            .into_iter()
            .zip(&self.base_score)
            .map(|(total, base)| total + base)
            .collect())
    }

    fn n_features_in(&self) -> usize {
        self.n_features
    }

    fn n_outputs(&self) -> usize {
        self.n_outputs
    }

    fn kind(&self) -> &'static str {
        "tree_ensemble"
    }
}
