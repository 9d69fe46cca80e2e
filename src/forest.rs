//! Random-forest pipeline stored as JSON.
//!
//! The artifact bundles the categorical encoding step with the fitted trees,
//! so a [`FeatureFrame`] goes in and class labels come out:
//!
//! 1. Columns are expanded in order. Numeric columns take one slot; each
//!    categorical column takes one slot per known category (one-hot). Unseen
//!    tokens encode as all zeros.
//! 2. Every tree routes the encoded row from node 0, going left when
//!    `x[feature] <= threshold`, until it reaches a leaf.
//! 3. Leaf class counts are normalised, averaged across trees, and the class
//!    with the highest mean proportion wins (ties go to the earlier class).

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::artifact::{Classifier, Label};
use crate::errors::{LoadError, PredictionError};
use crate::frame::{Cell, FeatureFrame};
use crate::models::{field_kind, FieldKind, FEATURE_NAMES, FEATURE_SCHEMA};

/// Format tag every artifact must carry.
pub const FORMAT: &str = "rfc-pipeline/v1";

/// Child index marking a leaf node.
const LEAF: i64 = -1;

// ============ Serialized Layout ============

/// On-disk representation of the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSpec {
    pub format: String,
    pub columns: Vec<String>,
    /// Known categories per categorical column, in one-hot slot order.
    #[serde(default)]
    pub categories: BTreeMap<String, Vec<String>>,
    pub classes: Vec<Label>,
    pub trees: Vec<TreeSpec>,
}

/// One fitted tree in parallel-array form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeSpec {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    /// Per-node class counts (or weights), one entry per class.
    pub value: Vec<Vec<f64>>,
}

// ============ Validated Model ============

#[derive(Debug, Clone)]
enum ColumnEncoder {
    Numeric {
        offset: usize,
    },
    OneHot {
        offset: usize,
        slots: HashMap<String, usize>,
    },
}

#[derive(Debug, Clone)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        proportions: Vec<f64>,
    },
}

#[derive(Debug, Clone)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn from_spec(
        tree: usize,
        spec: TreeSpec,
        width: usize,
        n_classes: usize,
    ) -> Result<Self, LoadError> {
        let n = spec.children_left.len();
        if n == 0 {
            return Err(invalid(format!("tree {} has no nodes", tree)));
        }
        let lengths = [
            spec.children_right.len(),
            spec.feature.len(),
            spec.threshold.len(),
            spec.value.len(),
        ];
        if lengths.iter().any(|&len| len != n) {
            return Err(invalid(format!("tree {}: node arrays differ in length", tree)));
        }

        let mut nodes = Vec::with_capacity(n);
        for node in 0..n {
            let (left, right) = (spec.children_left[node], spec.children_right[node]);

            if left == LEAF && right == LEAF {
                let counts = &spec.value[node];
                if counts.len() != n_classes {
                    return Err(invalid(format!(
                        "tree {} node {}: {} class values for {} classes",
                        tree,
                        node,
                        counts.len(),
                        n_classes
                    )));
                }
                if counts.iter().any(|v| !v.is_finite() || *v < 0.0) {
                    return Err(invalid(format!(
                        "tree {} node {}: class values must be finite and non-negative",
                        tree, node
                    )));
                }
                let total: f64 = counts.iter().sum();
                if total <= 0.0 {
                    return Err(invalid(format!("tree {} node {}: empty leaf", tree, node)));
                }
                nodes.push(Node::Leaf {
                    proportions: counts.iter().map(|v| v / total).collect(),
                });
                continue;
            }

            let (Some(left), Some(right)) = (child(left, node, n), child(right, node, n)) else {
                return Err(invalid(format!(
                    "tree {} node {}: invalid children ({}, {})",
                    tree, node, left, right
                )));
            };
            let feature = usize::try_from(spec.feature[node])
                .ok()
                .filter(|f| *f < width)
                .ok_or_else(|| {
                    invalid(format!(
                        "tree {} node {}: feature {} outside encoded width {}",
                        tree, node, spec.feature[node], width
                    ))
                })?;
            let threshold = spec.threshold[node];
            if !threshold.is_finite() {
                return Err(invalid(format!(
                    "tree {} node {}: non-finite threshold",
                    tree, node
                )));
            }

            nodes.push(Node::Split {
                feature,
                threshold,
                left,
                right,
            });
        }

        Ok(Self { nodes })
    }

    /// Class proportions at the leaf reached by `x`.
    ///
    /// Terminates because every child index is greater than its parent's.
    fn leaf(&self, x: &[f64]) -> &[f64] {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { proportions } => return proportions,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if x[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }
}

/// Child must come after its parent and inside the tree.
fn child(index: i64, parent: usize, n: usize) -> Option<usize> {
    let index = usize::try_from(index).ok()?;
    (index > parent && index < n).then_some(index)
}

fn invalid(msg: String) -> LoadError {
    LoadError::Invalid(msg)
}

/// A loaded, validated random-forest pipeline.
#[derive(Debug, Clone)]
pub struct ForestPipeline {
    columns: Vec<String>,
    encoders: Vec<ColumnEncoder>,
    width: usize,
    classes: Vec<Label>,
    trees: Vec<Tree>,
}

impl ForestPipeline {
    /// Parses and validates a JSON artifact.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, LoadError> {
        let spec: PipelineSpec = serde_json::from_slice(bytes)?;
        Self::from_spec(spec)
    }

    /// Validates a parsed artifact.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Invalid`] when the format tag, column list,
    /// categories, classes or any tree fails a structural check.
    pub fn from_spec(spec: PipelineSpec) -> Result<Self, LoadError> {
        if spec.format != FORMAT {
            return Err(invalid(format!(
                "unsupported format '{}', expected '{}'",
                spec.format, FORMAT
            )));
        }
        if spec
            .columns
            .iter()
            .map(String::as_str)
            .ne(FEATURE_NAMES.iter().copied())
        {
            return Err(invalid(format!(
                "columns {:?} do not match the loan application fields {:?}",
                spec.columns, FEATURE_NAMES
            )));
        }
        if let Some(unknown) = spec.categories.keys().find(|k| field_kind(k).is_none()) {
            return Err(invalid(format!(
                "categories given for unknown column '{}'",
                unknown
            )));
        }

        let mut encoders = Vec::with_capacity(FEATURE_SCHEMA.len());
        let mut width = 0;
        for (name, kind) in FEATURE_SCHEMA {
            match kind {
                FieldKind::Decimal => {
                    if spec.categories.contains_key(name) {
                        return Err(invalid(format!(
                            "numeric column '{}' must not have categories",
                            name
                        )));
                    }
                    encoders.push(ColumnEncoder::Numeric { offset: width });
                    width += 1;
                }
                FieldKind::Categorical => {
                    let categories = spec.categories.get(name).ok_or_else(|| {
                        invalid(format!("categorical column '{}' has no categories", name))
                    })?;
                    let mut slots = HashMap::with_capacity(categories.len());
                    for (slot, category) in categories.iter().enumerate() {
                        if slots.insert(category.clone(), slot).is_some() {
                            return Err(invalid(format!(
                                "column '{}' lists category '{}' twice",
                                name, category
                            )));
                        }
                    }
                    encoders.push(ColumnEncoder::OneHot {
                        offset: width,
                        slots,
                    });
                    width += categories.len();
                }
            }
        }

        if spec.classes.is_empty() {
            return Err(invalid("no classes".to_string()));
        }
        for (i, class) in spec.classes.iter().enumerate() {
            if spec.classes[..i].contains(class) {
                return Err(invalid(format!("class {} listed twice", class)));
            }
        }
        if spec.trees.is_empty() {
            return Err(invalid("no trees".to_string()));
        }

        let n_classes = spec.classes.len();
        let trees = spec
            .trees
            .into_iter()
            .enumerate()
            .map(|(i, tree)| Tree::from_spec(i, tree, width, n_classes))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            columns: spec.columns,
            encoders,
            width,
            classes: spec.classes,
            trees,
        })
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_nodes(&self) -> usize {
        self.trees.iter().map(|t| t.nodes.len()).sum()
    }

    pub fn classes(&self) -> &[Label] {
        &self.classes
    }

    /// Number of slots after one-hot expansion.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Encodes one frame row into the numeric vector the trees split on.
    pub fn encode(&self, row: &[Cell]) -> Result<Vec<f64>, PredictionError> {
        if row.len() != self.encoders.len() {
            return Err(PredictionError(format!(
                "row has {} cells, expected {}",
                row.len(),
                self.encoders.len()
            )));
        }

        let mut x = vec![0.0; self.width];
        for ((encoder, cell), name) in self.encoders.iter().zip(row).zip(&self.columns) {
            match (encoder, cell) {
                (ColumnEncoder::Numeric { offset }, Cell::Number(value)) => {
                    if !value.is_finite() {
                        return Err(PredictionError(format!(
                            "column '{}' holds a non-finite number",
                            name
                        )));
                    }
                    x[*offset] = *value;
                }
                (ColumnEncoder::OneHot { offset, slots }, Cell::Token(token)) => {
                    if let Some(slot) = slots.get(token) {
                        x[offset + slot] = 1.0;
                    }
                }
                (ColumnEncoder::Numeric { .. }, Cell::Token(_)) => {
                    return Err(PredictionError(format!(
                        "column '{}' expects a number",
                        name
                    )));
                }
                (ColumnEncoder::OneHot { .. }, Cell::Number(_)) => {
                    return Err(PredictionError(format!(
                        "column '{}' expects a categorical token",
                        name
                    )));
                }
            }
        }
        Ok(x)
    }

    /// Mean class proportions over all trees for one row.
    pub fn predict_proba(&self, row: &[Cell]) -> Result<Vec<f64>, PredictionError> {
        let x = self.encode(row)?;
        let mut votes = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            for (vote, p) in votes.iter_mut().zip(tree.leaf(&x)) {
                *vote += p;
            }
        }
        let n = self.trees.len() as f64;
        votes.iter_mut().for_each(|v| *v /= n);
        Ok(votes)
    }

    fn predict_row(&self, row: &[Cell]) -> Result<Label, PredictionError> {
        let proba = self.predict_proba(row)?;
        let mut best = 0;
        for (i, p) in proba.iter().enumerate().skip(1) {
            if *p > proba[best] {
                best = i;
            }
        }
        Ok(self.classes[best])
    }
}

impl Classifier for ForestPipeline {
    fn predict(&self, frame: &FeatureFrame) -> Result<Vec<Label>, PredictionError> {
        if frame
            .columns()
            .iter()
            .copied()
            .ne(self.columns.iter().map(String::as_str))
        {
            return Err(PredictionError(format!(
                "frame columns {:?} do not match model columns",
                frame.columns()
            )));
        }

        frame
            .rows()
            .iter()
            .map(|row| self.predict_row(row))
            .collect()
    }
}
