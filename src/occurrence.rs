//! Interface types for the external occurrence mapper and the corpus.

use std::collections::BTreeMap;

/// `(sequence_id, position)`, ordered lexicographically.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Location {
    /// Sequence identifier as reported by the mapper (may be sparse).
    pub seq_id: u32,
    /// Zero-based base offset.
    pub pos: u32,
}

impl Location {
    #[inline]
    pub fn new(seq_id: u32, pos: u32) -> Self {
        Location { seq_id, pos }
    }
}

/// Mapper key: the k-mer of length `len` starting at `(seq_id, pos)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KmerKey {
    pub seq_id: u32,
    pub pos: u32,
    pub len: u16,
}

impl KmerKey {
    #[inline]
    pub fn new(seq_id: u32, pos: u32, len: u16) -> Self {
        KmerKey { seq_id, pos, len }
    }

    #[inline]
    pub fn location(&self) -> Location {
        Location::new(self.seq_id, self.pos)
    }
}

/// Mapper output: for every key, everywhere in the corpus the same k-mer occurs.
///
/// Lists are expected sorted and symmetric (Y in list(X) ⇔ X in list(Y)).
#[derive(Clone, Debug, Default)]
pub struct OccurrenceTable {
    map: BTreeMap<KmerKey, Vec<Location>>,
}

impl OccurrenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: KmerKey, occurrences: Vec<Location>) {
        self.map.insert(key, occurrences);
    }

    pub fn get(&self, key: &KmerKey) -> Option<&[Location]> {
        self.map.get(key).map(|v| v.as_slice())
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Keys in `(seq_id, pos, len)` order.
    pub fn iter(&self) -> impl Iterator<Item = (&KmerKey, &[Location])> {
        self.map.iter().map(|(k, v)| (k, v.as_slice()))
    }
}

impl FromIterator<(KmerKey, Vec<Location>)> for OccurrenceTable {
    fn from_iter<I: IntoIterator<Item = (KmerKey, Vec<Location>)>>(iter: I) -> Self {
        OccurrenceTable {
            map: iter.into_iter().collect(),
        }
    }
}

/// Raw corpus sequences, addressed by the mapper's sequence identifiers.
pub trait Corpus: Sync {
    /// Number of reference sequences (drives percentage cutoffs).
    fn num_sequences(&self) -> usize;

    /// Full sequence for `seq_id`.
    fn sequence(&self, seq_id: u32) -> Option<&[u8]>;

    /// `len` bases starting at `pos`, if the sequence is long enough.
    fn slice(&self, seq_id: u32, pos: u32, len: usize) -> Option<&[u8]> {
        let s = self.sequence(seq_id)?;
        let start = pos as usize;
        s.get(start..start.checked_add(len)?)
    }
}

/// Dense corpus: sequence `i` has identifier `i`.
impl Corpus for [Vec<u8>] {
    fn num_sequences(&self) -> usize {
        self.len()
    }

    fn sequence(&self, seq_id: u32) -> Option<&[u8]> {
        self.get(seq_id as usize).map(|s| s.as_slice())
    }
}

impl Corpus for Vec<Vec<u8>> {
    fn num_sequences(&self) -> usize {
        self.len()
    }

    fn sequence(&self, seq_id: u32) -> Option<&[u8]> {
        self.get(seq_id as usize).map(|s| s.as_slice())
    }
}

/// Corpus with arbitrary (sparse) identifiers and optional names.
#[derive(Clone, Debug, Default)]
pub struct SequenceSet {
    ids: BTreeMap<u32, usize>,
    names: Vec<String>,
    seqs: Vec<Vec<u8>>,
}

impl SequenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a sequence under `seq_id`.
    pub fn push(&mut self, seq_id: u32, name: impl Into<String>, seq: Vec<u8>) {
        if let Some(&slot) = self.ids.get(&seq_id) {
            self.names[slot] = name.into();
            self.seqs[slot] = seq;
            return;
        }
        self.ids.insert(seq_id, self.seqs.len());
        self.names.push(name.into());
        self.seqs.push(seq);
    }

    pub fn name(&self, seq_id: u32) -> Option<&str> {
        self.ids.get(&seq_id).map(|&i| self.names[i].as_str())
    }

    /// `(seq_id, sequence)` in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &[u8])> {
        self.ids.iter().map(|(&id, &i)| (id, self.seqs[i].as_slice()))
    }
}

impl Corpus for SequenceSet {
    fn num_sequences(&self) -> usize {
        self.seqs.len()
    }

    fn sequence(&self, seq_id: u32) -> Option<&[u8]> {
        self.ids.get(&seq_id).map(|&i| self.seqs[i].as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_respects_bounds() {
        let corpus: Vec<Vec<u8>> = vec![b"ACGTACGT".to_vec()];
        assert_eq!(corpus.slice(0, 2, 4), Some(&b"GTAC"[..]));
        assert_eq!(corpus.slice(0, 6, 4), None);
        assert_eq!(corpus.slice(1, 0, 1), None);
    }

    #[test]
    fn sparse_ids() {
        let mut set = SequenceSet::new();
        set.push(40, "b", b"TTTT".to_vec());
        set.push(7, "a", b"ACGT".to_vec());
        assert_eq!(set.num_sequences(), 2);
        assert_eq!(set.sequence(40), Some(&b"TTTT"[..]));
        assert_eq!(set.name(7), Some("a"));
        assert_eq!(set.iter().map(|(id, _)| id).collect::<Vec<_>>(), vec![7, 40]);
    }
}
