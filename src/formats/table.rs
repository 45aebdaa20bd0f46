//! The shape-locked string table shared by every container layout.

use crate::{Error, Result};

/// Decoded strings of one container, in file order.
///
/// A table is either *flat* (one string per text-file line) or
/// *sectioned* (groups of strings, exported with a separator line before
/// each group). Its shape is fixed when it is loaded: strings can be
/// rewritten but never added, removed or moved between sections.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StringTable {
    sections: Vec<Vec<String>>,
    sectioned: bool,
}

impl StringTable {
    /// A table with one string per line.
    pub fn flat(strings: Vec<String>) -> Self {
        Self {
            sections: vec![strings],
            sectioned: false,
        }
    }

    /// A table of separately exported sections.
    pub fn sectioned(sections: Vec<Vec<String>>) -> Self {
        Self {
            sections,
            sectioned: true,
        }
    }

    pub fn is_sectioned(&self) -> bool {
        self.sectioned
    }

    /// The sections of this table. A flat table has exactly one.
    pub fn sections(&self) -> &[Vec<String>] {
        &self.sections
    }

    /// Every string, section by section.
    pub fn strings(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().flatten().map(String::as_str)
    }

    /// Total number of strings.
    pub fn len(&self) -> usize {
        self.sections.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of strings in each section.
    pub fn shape(&self) -> Vec<usize> {
        self.sections.iter().map(Vec::len).collect()
    }

    pub fn get(&self, section: usize, index: usize) -> Option<&str> {
        self.sections.get(section)?.get(index).map(String::as_str)
    }

    pub fn get_mut(&mut self, section: usize, index: usize) -> Option<&mut String> {
        self.sections.get_mut(section)?.get_mut(index)
    }

    /// Overwrite one string. Returns `false` if the position does not exist.
    pub fn set(&mut self, section: usize, index: usize, value: impl Into<String>) -> bool {
        match self.get_mut(section, index) {
            Some(slot) => {
                *slot = value.into();
                true
            }
            None => false,
        }
    }

    /// Replace every string with the one at the same position in `other`.
    ///
    /// Fails with [`Error::ShapeMismatch`] unless both tables have the same
    /// kind, section count and section lengths.
    pub fn replace_with(&mut self, other: StringTable) -> Result<()> {
        other.check_shape(self.sectioned, &self.shape())?;
        self.sections = other.sections;
        Ok(())
    }

    /// Fails with [`Error::ShapeMismatch`] unless this table has the given
    /// kind and section lengths.
    pub(crate) fn check_shape(&self, sectioned: bool, expected: &[usize]) -> Result<()> {
        let found = self.shape();
        if self.sectioned != sectioned || found != expected {
            return Err(Error::ShapeMismatch {
                expected: expected.to_vec(),
                found,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn flat_table_has_one_section() {
        let t = StringTable::flat(strings(&["a", "b"]));
        assert_eq!(t.shape(), vec![2]);
        assert_eq!(t.get(0, 1), Some("b"));
        assert!(!t.is_sectioned());
    }

    #[test]
    fn replacement_must_keep_the_shape() {
        let mut t = StringTable::sectioned(vec![strings(&["a"]), strings(&["b", "c"])]);
        let bad = StringTable::sectioned(vec![strings(&["a", "b"]), strings(&["c"])]);
        assert!(matches!(
            t.replace_with(bad),
            Err(Error::ShapeMismatch { .. })
        ));
        let flat = StringTable::flat(strings(&["x", "y", "z"]));
        assert!(t.replace_with(flat).is_err());

        let good = StringTable::sectioned(vec![strings(&["A"]), strings(&["B", "C"])]);
        t.replace_with(good).unwrap();
        assert_eq!(t.strings().collect::<Vec<_>>(), ["A", "B", "C"]);
    }

    #[test]
    fn get_mut_edits_in_place() {
        let mut t = StringTable::flat(strings(&["old"]));
        t.get_mut(0, 0).unwrap().replace_range(.., "new");
        assert_eq!(t.get(0, 0), Some("new"));
        assert!(t.get_mut(1, 0).is_none());
    }
}
