use std::collections::HashMap;

/// Label -> count for one processing run, keyed in order of first appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelDistribution {
    entries: Vec<(String, usize)>,
    index: HashMap<String, usize>,
}

impl LabelDistribution {
    pub fn count<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut distribution = Self::default();
        for label in labels {
            distribution.add(label.as_ref());
        }
        distribution
    }

    fn add(&mut self, label: &str) {
        match self.index.get(label) {
            Some(&slot) => self.entries[slot].1 += 1,
            None => {
                self.index.insert(label.to_string(), self.entries.len());
                self.entries.push((label.to_string(), 1));
            }
        }
    }

    pub fn get(&self, label: &str) -> usize {
        self.index
            .get(label)
            .map(|&slot| self.entries[slot].1)
            .unwrap_or(0)
    }

    pub fn labels(&self) -> Vec<String> {
        self.entries.iter().map(|(label, _)| label.clone()).collect()
    }

    pub fn counts(&self) -> Vec<usize> {
        self.entries.iter().map(|(_, count)| *count).collect()
    }

    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, count)| count).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries
            .iter()
            .map(|(label, count)| (label.as_str(), *count))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
