use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Indices that were deliberately made anomalous at generation time
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroundTruth {
    indices: BTreeSet<usize>,
}

impl GroundTruth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.indices.contains(&index)
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Ascending order
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.indices.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<usize> {
        self.iter().collect()
    }
}

impl FromIterator<usize> for GroundTruth {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self {
            indices: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordered_and_deduplicated() {
        let truth: GroundTruth = [40, 7, 40, 12].into_iter().collect();
        assert_eq!(truth.len(), 3);
        assert_eq!(truth.to_vec(), vec![7, 12, 40]);
        assert!(truth.contains(12));
        assert!(!truth.contains(13));
    }

    #[test]
    fn test_serializes_as_plain_list() {
        let truth: GroundTruth = [3, 1].into_iter().collect();
        assert_eq!(serde_json::to_string(&truth).unwrap(), "[1,3]");
        assert!(GroundTruth::new().is_empty());
    }
}
