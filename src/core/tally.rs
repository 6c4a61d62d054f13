use crate::shared::constants::{CLASS_LABELS, LABEL_UNDETECTED, POSTURE_LABELS};

/// Maps a model class index to its report label. Unknown and missing indices
/// both land in `undetected`.
pub fn label_for(class_index: Option<usize>) -> &'static str {
    class_index
        .and_then(|idx| CLASS_LABELS.iter().find(|(i, _)| *i == idx))
        .map(|(_, label)| *label)
        .unwrap_or(LABEL_UNDETECTED)
}

/// Per-label count of classified frames, kept in report order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameTally {
    counts: Vec<u64>,
}

impl Default for FrameTally {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameTally {
    pub fn new() -> Self {
        Self {
            counts: vec![0; POSTURE_LABELS.len()],
        }
    }

    /// Counts one classified frame and returns the label it went to.
    pub fn record(&mut self, class_index: Option<usize>) -> &'static str {
        let label = label_for(class_index);
        if let Some(slot) = POSTURE_LABELS.iter().position(|l| *l == label) {
            self.counts[slot] += 1;
        }
        label
    }

    pub fn get(&self, label: &str) -> u64 {
        POSTURE_LABELS
            .iter()
            .position(|l| *l == label)
            .map_or(0, |slot| self.counts[slot])
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, u64)> + '_ {
        POSTURE_LABELS.iter().copied().zip(self.counts.iter().copied())
    }
}
