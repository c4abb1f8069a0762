use std::collections::HashMap;

/// Column name to position mapping taken from the header record.
///
/// Built once and never mutated. When a name repeats, the last position
/// wins. [`width`](Self::width) is the header record's field count, which
/// is what data records are checked against; [`len`](Self::len) counts
/// distinct names and is smaller when names repeat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderIndex {
    positions: HashMap<String, usize>,
    names: Vec<String>,
}

impl HeaderIndex {
    pub fn from_record(record: &[String]) -> Self {
        let mut positions = HashMap::with_capacity(record.len());
        for (index, name) in record.iter().enumerate() {
            positions.insert(name.clone(), index);
        }
        Self {
            positions,
            names: record.to_vec(),
        }
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    /// Number of fields in the header record.
    pub fn width(&self) -> usize {
        self.names.len()
    }

    /// Number of distinct header names.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Header names in record order, duplicates included.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// `(name, position)` pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.positions.iter().map(|(name, &pos)| (name.as_str(), pos))
    }
}
