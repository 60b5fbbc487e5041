//! Newest-first log of published revisions.

use crate::snapshot::Revision;
use crate::types::RevisionNumber;

/// Known revisions ordered by descending number, unique by number.
#[derive(Debug, Default)]
pub struct RevisionLog {
    entries: Vec<Revision>,
}

impl RevisionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[Revision] {
        &self.entries
    }

    pub fn latest(&self) -> Option<&Revision> {
        self.entries.first()
    }

    pub fn contains(&self, number: RevisionNumber) -> bool {
        self.position(number).is_ok()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert `revision` at its ordered position.
    ///
    /// Returns the index it landed at, or `None` if a revision with the
    /// same number is already known (the known entry is kept as is).
    pub fn insert(&mut self, revision: Revision) -> Option<usize> {
        match self.position(revision.number) {
            Ok(_) => None,
            Err(at) => {
                self.entries.insert(at, revision);
                Some(at)
            }
        }
    }

    /// Merge a batch fetched from the remote store.
    ///
    /// Returns the `(index, revision)` pairs that were newly inserted, in
    /// insertion order. Each index is relative to the log as it stood
    /// after the preceding inserts, so replaying them in order on a
    /// mirror reproduces the log.
    pub fn merge(
        &mut self,
        revisions: impl IntoIterator<Item = Revision>,
    ) -> Vec<(usize, Revision)> {
        let mut batch: Vec<Revision> = revisions.into_iter().collect();
        batch.sort_by_key(|r| r.number);

        let mut added = Vec::new();
        for revision in batch {
            if let Some(at) = self.insert(revision.clone()) {
                added.push((at, revision));
            }
        }
        added
    }

    fn position(&self, number: RevisionNumber) -> Result<usize, usize> {
        self.entries
            .binary_search_by(|probe| number.cmp(&probe.number))
    }
}
