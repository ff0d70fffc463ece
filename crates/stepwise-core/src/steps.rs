//! Step index: which parts become final at each step

use std::collections::BTreeMap;

use crate::catalog::Part;

#[derive(Debug, Clone, Default)]
pub struct StepIndex {
    buckets: BTreeMap<u32, Vec<usize>>,
    last_step: u32,
}

impl StepIndex {
    /// Bucket catalog indices by step; `last_step` is 0 when there are no parts
    pub fn build(parts: &[Part]) -> Self {
        let mut buckets: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
        let mut last_step = 0;

        for (index, part) in parts.iter().enumerate() {
            buckets.entry(part.step).or_default().push(index);
            last_step = last_step.max(part.step);
        }

        Self { buckets, last_step }
    }

    pub fn last_step(&self) -> u32 {
        self.last_step
    }

    /// Parts finalized at `step`, in discovery order
    pub fn parts_at(&self, step: u32) -> Option<&[usize]> {
        self.buckets.get(&step).map(Vec::as_slice)
    }

    pub fn contains(&self, step: u32) -> bool {
        self.buckets.contains_key(&step)
    }

    /// Steps that have at least one part, ascending
    pub fn steps(&self) -> impl Iterator<Item = u32> + '_ {
        self.buckets.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::NodeId;
    use crate::pose::Pose;

    #[test]
    fn test_build_step_index() {
        let parts = vec![
            Part::new("Step2_Top", NodeId(0), 2, "Top", Pose::IDENTITY),
            Part::new("Step5_Door", NodeId(1), 5, "Door", Pose::IDENTITY),
            Part::new("Step2_Leg", NodeId(2), 2, "Leg", Pose::IDENTITY),
        ];
        let index = StepIndex::build(&parts);

        assert_eq!(index.last_step(), 5);
        assert_eq!(index.parts_at(2), Some(&[0, 2][..]));
        assert!(index.parts_at(3).is_none());
        assert!(!index.contains(1));
        assert_eq!(index.steps().collect::<Vec<_>>(), vec![2, 5]);
    }

    #[test]
    fn test_empty_index() {
        let index = StepIndex::build(&[]);
        assert_eq!(index.last_step(), 0);
        assert_eq!(index.steps().count(), 0);
    }
}
