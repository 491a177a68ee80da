use std::fmt::Debug;
use std::marker::PhantomData;
use crate::errors::ModelError;
use crate::estimator::{check_prediction_input, check_training_input, Estimator};

/// Cost below which a node is considered pure
const PURE_COST: f64 = 1e-12;

/// A node in a fitted tree, either a split on one feature or a leaf holding the prediction
#[derive(Clone, Debug)]
pub enum TreeNode<T> {
    Leaf(T),
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode<T>>,
        right: Box<TreeNode<T>>,
    },
}

impl<T: Copy> TreeNode<T> {
    /// Walks the tree for the given row, samples with feature <= threshold go left
    ///
    /// # Arguments
    ///
    /// * 'row' - feature row
    pub fn predict(&self, row: &[f64]) -> T {
        let mut node = self;
        loop {
            match node {
                TreeNode::Leaf(value) => return *value,
                TreeNode::Split { feature, threshold, left, right } => {
                    node = if row[*feature] <= *threshold { left } else { right };
                }
            }
        }
    }

    /// Leaves have depth 0
    #[cfg(test)]
    pub fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf(_) => 0,
            TreeNode::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }
}

/// Running statistics of the targets reaching a node
pub trait NodeStats: Clone + Debug {
    type Target: Copy + Debug + PartialEq;

    /// Empty statistics suitable for the given target set
    fn empty(y: &[Self::Target]) -> Self;
    fn add(&mut self, target: Self::Target);
    fn remove(&mut self, target: Self::Target);
    fn count(&self) -> usize;
    /// Node cost, additive over children so a split is scored as left + right
    fn cost(&self) -> f64;
    /// Prediction of a leaf holding these statistics
    fn leaf(&self) -> Self::Target;
}

/// Sum and sum of squares, cost is the summed squared error around the mean
#[derive(Clone, Debug, Default)]
pub struct VarianceStats {
    n: usize,
    sum: f64,
    sum_sq: f64,
}

impl NodeStats for VarianceStats {
    type Target = f64;

    fn empty(_y: &[f64]) -> Self {
        VarianceStats::default()
    }

    fn add(&mut self, target: f64) {
        self.n += 1;
        self.sum += target;
        self.sum_sq += target * target;
    }

    fn remove(&mut self, target: f64) {
        self.n -= 1;
        self.sum -= target;
        self.sum_sq -= target * target;
    }

    fn count(&self) -> usize {
        self.n
    }

    fn cost(&self) -> f64 {
        if self.n == 0 {
            0.0
        } else {
            (self.sum_sq - self.sum * self.sum / self.n as f64).max(0.0)
        }
    }

    fn leaf(&self) -> f64 {
        if self.n == 0 { 0.0 } else { self.sum / self.n as f64 }
    }
}

/// Class counts, cost is n * gini impurity
#[derive(Clone, Debug)]
pub struct GiniStats {
    counts: Vec<usize>,
    n: usize,
}

impl NodeStats for GiniStats {
    type Target = usize;

    fn empty(y: &[usize]) -> Self {
        let n_classes = y.iter().max().map_or(0, |m| m + 1);
        GiniStats { counts: vec![0; n_classes], n: 0 }
    }

    fn add(&mut self, target: usize) {
        self.counts[target] += 1;
        self.n += 1;
    }

    fn remove(&mut self, target: usize) {
        self.counts[target] -= 1;
        self.n -= 1;
    }

    fn count(&self) -> usize {
        self.n
    }

    fn cost(&self) -> f64 {
        if self.n == 0 {
            return 0.0;
        }
        let n = self.n as f64;
        let sum_sq = self.counts.iter().map(|&c| (c * c) as f64).sum::<f64>();

        n - sum_sq / n
    }

    /// Majority class, ties go to the smallest class
    fn leaf(&self) -> usize {
        let mut best = 0;
        for (class, &count) in self.counts.iter().enumerate() {
            if count > self.counts[best] {
                best = class;
            }
        }
        best
    }
}

/// Growth limits for a single tree
#[derive(Clone, Copy, Debug)]
pub struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        TreeParams { max_depth: None, min_samples_split: 2, min_samples_leaf: 1 }
    }
}

struct Split {
    feature: usize,
    threshold: f64,
    cost: f64,
}

/// CART decision tree over a given node statistic.
///
/// The tree is grown greedily by picking, at every node, the feature and
/// threshold that reduce the node cost the most. The cost is the summed squared
/// error for regression and the sample weighted Gini impurity for
/// classification, both expressed through [`NodeStats`] so a single grower
/// serves both.
#[derive(Clone, Debug)]
pub struct DecisionTree<S: NodeStats> {
    root: Option<TreeNode<S::Target>>,
    n_features: usize,
    params: TreeParams,
    _stats: PhantomData<S>,
}

#[cfg(test)]
pub type RegressionTree = DecisionTree<VarianceStats>;
#[cfg(test)]
pub type ClassificationTree = DecisionTree<GiniStats>;

impl<S: NodeStats> DecisionTree<S> {
    pub fn new(params: TreeParams) -> Self {
        Self { root: None, n_features: 0, params, _stats: PhantomData }
    }

    /// Fits the tree on a sample of the training rows. The sample may hold
    /// repeated indices, which is how bootstrap samples are passed in.
    ///
    /// # Arguments
    ///
    /// * 'x' - all training rows
    /// * 'y' - all training targets
    /// * 'sample' - indices of the rows to grow the tree from
    pub fn fit_sample(&mut self, x: &[Vec<f64>], y: &[S::Target], sample: &[usize]) -> Result<(), ModelError> {
        self.n_features = check_training_input(x, y.len())?;
        if sample.is_empty() {
            return Err(ModelError::Input("empty training sample".to_string()));
        }
        if sample.iter().any(|&i| i >= x.len()) {
            return Err(ModelError::Input("sample index out of range".to_string()));
        }

        let empty = S::empty(y);
        self.root = Some(grow(x, y, sample, &empty, 0, &self.params));

        Ok(())
    }

    /// Predicts a single row
    ///
    /// # Arguments
    ///
    /// * 'row' - feature row
    pub fn predict_row(&self, row: &[f64]) -> Result<S::Target, ModelError> {
        let root = self.root.as_ref().ok_or(ModelError::NotFitted)?;
        if row.len() != self.n_features {
            return Err(ModelError::Input(format!("expected {} features, got {}", self.n_features, row.len())));
        }
        Ok(root.predict(row))
    }

    #[cfg(test)]
    pub fn depth(&self) -> Option<usize> {
        self.root.as_ref().map(|r| r.depth())
    }

    pub(crate) fn n_features(&self) -> usize {
        self.n_features
    }
}

impl<S: NodeStats> Estimator<S::Target> for DecisionTree<S> {
    fn fit(&mut self, x: &[Vec<f64>], y: &[S::Target]) -> Result<(), ModelError> {
        let sample = (0..x.len()).collect::<Vec<usize>>();
        self.fit_sample(x, y, &sample)
    }

    fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<S::Target>, ModelError> {
        if self.root.is_none() {
            return Err(ModelError::NotFitted);
        }
        check_prediction_input(x, self.n_features)?;
        x.iter().map(|row| self.predict_row(row)).collect()
    }
}

/// Grows a (sub)tree from the rows in 'idx'
///
/// # Arguments
///
/// * 'x' - all training rows
/// * 'y' - all training targets
/// * 'idx' - rows reaching this node
/// * 'empty' - empty statistics to start accumulating from
/// * 'depth' - depth of this node
/// * 'params' - growth limits
fn grow<S: NodeStats>(x: &[Vec<f64>], y: &[S::Target], idx: &[usize], empty: &S, depth: usize, params: &TreeParams) -> TreeNode<S::Target> {
    let mut stats = empty.clone();
    idx.iter().for_each(|&i| stats.add(y[i]));

    if stats.count() < params.min_samples_split
        || stats.count() < 2 * params.min_samples_leaf
        || params.max_depth.is_some_and(|d| depth >= d)
        || stats.cost() <= PURE_COST {
        return TreeNode::Leaf(stats.leaf());
    }

    let Some(split) = best_split(x, y, idx, empty, &stats, params.min_samples_leaf) else {
        return TreeNode::Leaf(stats.leaf());
    };

    let (left, right): (Vec<usize>, Vec<usize>) = idx.iter()
        .copied()
        .partition(|&i| x[i][split.feature] <= split.threshold);
    if left.is_empty() || right.is_empty() {
        return TreeNode::Leaf(stats.leaf());
    }

    TreeNode::Split {
        feature: split.feature,
        threshold: split.threshold,
        left: Box::new(grow(x, y, &left, empty, depth + 1, params)),
        right: Box::new(grow(x, y, &right, empty, depth + 1, params)),
    }
}

/// Finds the split with the lowest summed child cost, if any split lowers the parent cost.
/// Candidate thresholds are midpoints between consecutive distinct feature values.
///
/// # Arguments
///
/// * 'x' - all training rows
/// * 'y' - all training targets
/// * 'idx' - rows reaching the node
/// * 'empty' - empty statistics
/// * 'parent' - statistics of all rows in 'idx'
/// * 'min_samples_leaf' - minimum rows on each side of a split
fn best_split<S: NodeStats>(x: &[Vec<f64>], y: &[S::Target], idx: &[usize], empty: &S, parent: &S, min_samples_leaf: usize) -> Option<Split> {
    let n_features = x[idx[0]].len();
    let parent_cost = parent.cost();
    let mut sorted = idx.to_vec();
    let mut best: Option<Split> = None;

    for feature in 0..n_features {
        sorted.sort_by(|&a, &b| x[a][feature].total_cmp(&x[b][feature]));

        let mut left = empty.clone();
        let mut right = parent.clone();
        for k in 0..sorted.len() - 1 {
            let i = sorted[k];
            left.add(y[i]);
            right.remove(y[i]);

            let here = x[i][feature];
            let next = x[sorted[k + 1]][feature];
            if here == next || left.count() < min_samples_leaf || right.count() < min_samples_leaf {
                continue;
            }

            let cost = left.cost() + right.cost();
            if cost < parent_cost - PURE_COST && best.as_ref().is_none_or(|b| cost < b.cost) {
                let mid = here + (next - here) / 2.0;
                let threshold = if mid < next { mid } else { here };
                best = Some(Split { feature, threshold, cost });
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rows(values: &[f64]) -> Vec<Vec<f64>> {
        values.iter().map(|v| vec![*v]).collect()
    }

    #[test]
    fn regression_tree_learns_a_step() {
        let x = rows(&[1.0, 2.0, 3.0, 10.0, 11.0, 12.0]);
        let y = vec![5.0, 5.0, 5.0, 20.0, 20.0, 20.0];
        let mut tree = RegressionTree::new(TreeParams::default());
        tree.fit(&x, &y).unwrap();

        assert_eq!(tree.depth(), Some(1));
        assert_relative_eq!(tree.predict_row(&[0.0]).unwrap(), 5.0);
        assert_relative_eq!(tree.predict_row(&[6.6]).unwrap(), 20.0);
    }

    #[test]
    fn max_depth_zero_is_the_mean() {
        let x = rows(&[1.0, 2.0, 3.0, 4.0]);
        let y = vec![1.0, 2.0, 3.0, 6.0];
        let params = TreeParams { max_depth: Some(0), ..TreeParams::default() };
        let mut tree = RegressionTree::new(params);
        tree.fit(&x, &y).unwrap();

        assert_relative_eq!(tree.predict_row(&[100.0]).unwrap(), 3.0);
    }

    #[test]
    fn classification_tree_picks_the_informative_feature() {
        let x = vec![
            vec![0.0, 7.0], vec![1.0, 3.0], vec![2.0, 9.0],
            vec![10.0, 4.0], vec![11.0, 8.0], vec![12.0, 2.0],
        ];
        let y = vec![0, 0, 0, 2, 2, 2];
        let mut tree = ClassificationTree::new(TreeParams::default());
        tree.fit(&x, &y).unwrap();

        assert_eq!(tree.predict(&[vec![1.5, 100.0], vec![11.5, -100.0]]).unwrap(), vec![0, 2]);
    }

    #[test]
    fn gini_leaf_breaks_ties_to_smallest_class() {
        let mut stats = GiniStats::empty(&[0, 1, 2]);
        stats.add(2);
        stats.add(1);

        assert_eq!(stats.leaf(), 1);
        assert_relative_eq!(stats.cost(), 1.0);
    }

    #[test]
    fn repeated_sample_indices_are_weights() {
        let x = rows(&[0.0, 1.0]);
        let y = vec![0.0, 10.0];
        let params = TreeParams { max_depth: Some(0), ..TreeParams::default() };
        let mut tree = RegressionTree::new(params);
        tree.fit_sample(&x, &y, &[0, 0, 0, 1]).unwrap();

        assert_relative_eq!(tree.predict_row(&[0.5]).unwrap(), 2.5);
    }

    #[test]
    fn constant_feature_gives_a_leaf() {
        let x = rows(&[1.0, 1.0, 1.0]);
        let y = vec![1.0, 2.0, 3.0];
        let mut tree = RegressionTree::new(TreeParams::default());
        tree.fit(&x, &y).unwrap();

        assert_eq!(tree.depth(), Some(0));
    }

    #[test]
    fn unfitted_and_bad_input_are_errors() {
        let tree = RegressionTree::new(TreeParams::default());
        assert_eq!(tree.predict(&rows(&[1.0])), Err(ModelError::NotFitted));

        let mut tree = RegressionTree::new(TreeParams::default());
        assert!(tree.fit(&[], &[]).is_err());
        assert!(tree.fit(&rows(&[1.0, 2.0]), &[1.0]).is_err());
        assert!(tree.fit(&[vec![1.0], vec![1.0, 2.0]], &[1.0, 2.0]).is_err());

        tree.fit(&rows(&[1.0, 2.0]), &[1.0, 2.0]).unwrap();
        assert!(tree.predict(&[vec![1.0, 2.0]]).is_err());
    }
}
