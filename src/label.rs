use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Label(String);

impl Label {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hands out control-flow labels for one compilation run. Shared by every
/// unit in the run so that no two labels collide; never rewinds.
#[derive(Debug)]
pub struct LabelAllocator {
    counter: usize,
}

impl LabelAllocator {
    pub fn new() -> Self {
        Self { counter: 1 }
    }

    pub fn next_label(&mut self) -> Label {
        let label = Label(format!("L{}", self.counter));
        self.counter += 1;
        label
    }
}

impl Default for LabelAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fnv::FnvHashSet;

    #[test]
    fn starts_at_one_and_counts_up() {
        let mut labels = LabelAllocator::new();
        assert_eq!(labels.next_label().as_str(), "L1");
        assert_eq!(labels.next_label().as_str(), "L2");
        assert_eq!(labels.next_label().to_string(), "L3");
    }

    #[test]
    fn never_repeats() {
        let mut labels = LabelAllocator::new();
        let mut seen = FnvHashSet::default();
        for _ in 0..1000 {
            assert!(seen.insert(labels.next_label()));
        }
    }

    #[test]
    fn fresh_allocators_agree() {
        let mut a = LabelAllocator::new();
        let mut b = LabelAllocator::default();
        a.next_label();
        b.next_label();
        assert_eq!(a.next_label(), b.next_label());
    }
}
