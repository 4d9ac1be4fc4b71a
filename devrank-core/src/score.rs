// Overall commit scores: DevRank scaled by how valuable the commit's kind of
// work is.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::AnalyzeError;
use crate::types::CommitId;

/// Weight of each label category, in classifier output order.
///
/// Passed explicitly wherever scores are computed; there is no global table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelWeights(Vec<f64>);

impl LabelWeights {
    pub fn new(weights: Vec<f64>) -> Self {
        Self(weights)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

/// Scale scores so they sum to 1. An all-zero input stays all zero.
pub fn normalize<K: Ord + Clone>(scores: &BTreeMap<K, f64>) -> BTreeMap<K, f64> {
    let total: f64 = scores.values().sum();
    scores
        .iter()
        .map(|(k, v)| {
            let share = if total == 0.0 { 0.0 } else { v / total };
            (k.clone(), share)
        })
        .collect()
}

/// `normalize(dot(category, weights) · dr)` for every commit in `devranks`.
///
/// `category` is the commit's label probabilities, or their one-hot argmax
/// when `top_one` is set (first maximum wins ties).
pub fn commit_overall_scores(
    devranks: &BTreeMap<CommitId, f64>,
    label_probabilities: &BTreeMap<CommitId, Vec<f64>>,
    weights: &LabelWeights,
    top_one: bool,
) -> Result<BTreeMap<CommitId, f64>, AnalyzeError> {
    let mut overall = BTreeMap::new();
    for (commit, dr) in devranks {
        let probabilities = label_probabilities
            .get(commit)
            .ok_or_else(|| AnalyzeError::MissingLabels(commit.clone()))?;
        if probabilities.len() != weights.len() {
            return Err(AnalyzeError::LabelArity {
                commit: commit.clone(),
                expected: weights.len(),
                found: probabilities.len(),
            });
        }

        let value = if top_one {
            argmax(probabilities).map_or(0.0, |i| weights.as_slice()[i])
        } else {
            probabilities
                .iter()
                .zip(weights.as_slice())
                .map(|(p, w)| p * w)
                .sum()
        };
        overall.insert(commit.clone(), value * dr);
    }
    Ok(normalize(&overall))
}

fn argmax(values: &[f64]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, &v)| match best {
            Some((_, b)) if b >= v => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}
