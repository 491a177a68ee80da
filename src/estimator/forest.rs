use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;
use crate::errors::ModelError;
use crate::estimator::{check_prediction_input, check_training_input, Estimator};
use crate::estimator::tree::{DecisionTree, GiniStats, NodeStats, TreeParams, VarianceStats};

/// Bootstrap aggregated decision trees.
///
/// Tree i is grown from a bootstrap sample drawn with seed 'seed + i', so a
/// forest fitted twice on the same data predicts bit-identical values.
#[derive(Clone, Debug)]
pub struct Forest<S: NodeStats> {
    trees: Vec<DecisionTree<S>>,
    n_trees: usize,
    seed: u64,
    params: TreeParams,
}

/// Averages the trees' predictions
pub type ForestRegressor = Forest<VarianceStats>;

/// Majority vote over the trees' predictions
pub type ForestClassifier = Forest<GiniStats>;

impl<S: NodeStats> Forest<S> {
    /// Creates an unfitted forest
    ///
    /// # Arguments
    ///
    /// * 'n_trees' - number of trees in the forest
    /// * 'seed' - base seed for the bootstrap samples
    pub fn new(n_trees: usize, seed: u64) -> Self {
        Self {
            trees: Vec::new(),
            n_trees,
            seed,
            params: TreeParams::default(),
        }
    }

    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.params.max_depth = max_depth;
        self
    }

    pub fn with_min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.params.min_samples_leaf = min_samples_leaf.max(1);
        self
    }

    /// Grows all trees, each from its own bootstrap sample
    ///
    /// # Arguments
    ///
    /// * 'x' - training rows
    /// * 'y' - training targets
    fn fit_trees(&mut self, x: &[Vec<f64>], y: &[S::Target]) -> Result<(), ModelError> {
        check_training_input(x, y.len())?;
        if self.n_trees == 0 {
            return Err(ModelError::Input("a forest needs at least one tree".to_string()));
        }

        let mut trees = Vec::with_capacity(self.n_trees);
        for i in 0..self.n_trees {
            let sample = bootstrap_sample(x.len(), self.seed.wrapping_add(i as u64));
            let mut tree = DecisionTree::<S>::new(self.params);
            tree.fit_sample(x, y, &sample)?;
            trees.push(tree);
        }
        self.trees = trees;

        Ok(())
    }

    /// Collects every tree's prediction for one row
    ///
    /// # Arguments
    ///
    /// * 'row' - feature row
    fn tree_predictions(&self, row: &[f64]) -> Result<Vec<S::Target>, ModelError> {
        self.trees.iter().map(|t| t.predict_row(row)).collect()
    }

    fn check_fitted(&self, x: &[Vec<f64>]) -> Result<(), ModelError> {
        let first = self.trees.first().ok_or(ModelError::NotFitted)?;
        check_prediction_input(x, first.n_features())
    }
}

impl Estimator<f64> for ForestRegressor {
    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<(), ModelError> {
        self.fit_trees(x, y)
    }

    fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
        self.check_fitted(x)?;
        x.iter()
            .map(|row| {
                let values = self.tree_predictions(row)?;
                Ok(values.iter().sum::<f64>() / values.len() as f64)
            })
            .collect()
    }
}

impl Estimator<usize> for ForestClassifier {
    fn fit(&mut self, x: &[Vec<f64>], y: &[usize]) -> Result<(), ModelError> {
        self.fit_trees(x, y)
    }

    fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<usize>, ModelError> {
        self.check_fitted(x)?;
        x.iter()
            .map(|row| Ok(majority_vote(&self.tree_predictions(row)?)))
            .collect()
    }
}

/// Returns the most voted class, ties go to the smallest class
///
/// # Arguments
///
/// * 'votes' - one class per tree
fn majority_vote(votes: &[usize]) -> usize {
    let n_classes = votes.iter().max().map_or(0, |m| m + 1);
    let mut counts = vec![0usize; n_classes];
    votes.iter().for_each(|&v| counts[v] += 1);

    let mut best = 0;
    for (class, &count) in counts.iter().enumerate() {
        if count > counts[best] {
            best = class;
        }
    }
    best
}

/// Draws 'n_samples' row indices uniformly with replacement
///
/// # Arguments
///
/// * 'n_samples' - number of rows to sample from (and the sample size)
/// * 'seed' - seed for the random generator
fn bootstrap_sample(n_samples: usize, seed: u64) -> Vec<usize> {
    let dist = Uniform::from(0..n_samples);
    let mut rng = StdRng::seed_from_u64(seed);

    (0..n_samples).map(|_| dist.sample(&mut rng)).collect()
}
