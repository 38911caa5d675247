//! Seeded train/holdout splitting

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;

/// Row indices of a train/holdout split, each sorted ascending
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub holdout: Vec<usize>,
}

/// Stratified shuffle split.
///
/// Each class is shuffled with a generator seeded from `seed` and contributes
/// `round(len * test_size)` rows to the holdout, at least one when
/// `test_size > 0`, but never its last row: every class keeps a training
/// example. The holdout may be empty.
pub fn stratified_split(labels: &[usize], test_size: f64, seed: u64) -> Split {
    let mut by_class: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (i, &label) in labels.iter().enumerate() {
        by_class.entry(label).or_default().push(i);
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(labels.len());
    let mut holdout = Vec::new();

    for (_class, mut indices) in by_class {
        indices.shuffle(&mut rng);
        let mut n_holdout = (indices.len() as f64 * test_size).round() as usize;
        if test_size > 0.0 {
            n_holdout = n_holdout.max(1);
        }
        n_holdout = n_holdout.min(indices.len().saturating_sub(1));

        let split_point = indices.len() - n_holdout;
        train.extend_from_slice(&indices[..split_point]);
        holdout.extend_from_slice(&indices[split_point..]);
    }

    train.sort_unstable();
    holdout.sort_unstable();
    Split { train, holdout }
}
