use std::sync::Arc;
use std::time::Duration;

use crate::foundation::core::Fps;
use crate::foundation::error::{StillsError, StillsResult};
use crate::sequence::entry::{EntryId, ImageEntry, IncomingFile};
use crate::sequence::handles::HandleRegistry;
use crate::sequence::order::{SortOrder, sort_entries};

/// Outcome of [`Sequence::ingest`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Ids of the admitted entries, in input order.
    pub added: Vec<EntryId>,
    /// Names of the files that were excluded because they are not images.
    pub skipped: Vec<String>,
}

/// Ordered list of image entries plus the active ordering mode.
///
/// Manual order is whatever the list currently holds; it changes only through
/// [`Sequence::move_entry`] or by selecting a derived [`SortOrder`].
#[derive(Debug)]
pub struct Sequence {
    entries: Vec<Arc<ImageEntry>>,
    order: SortOrder,
    next_id: u64,
    handles: HandleRegistry,
}

impl Sequence {
    /// Create an empty sequence whose display handles come from `handles`.
    pub fn new(handles: HandleRegistry) -> Self {
        Self {
            entries: Vec::new(),
            order: SortOrder::Manual,
            next_id: 0,
            handles,
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return `true` when there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in sequence order.
    pub fn entries(&self) -> &[Arc<ImageEntry>] {
        &self.entries
    }

    /// Shared copy of the current order, e.g. for an export that outlives a borrow.
    pub fn snapshot(&self) -> Vec<Arc<ImageEntry>> {
        self.entries.clone()
    }

    /// Active ordering mode.
    pub fn sort_order(&self) -> SortOrder {
        self.order
    }

    /// Registry that owns the entries' display handles.
    pub fn handles(&self) -> &HandleRegistry {
        &self.handles
    }

    /// Look up an entry by id.
    pub fn get(&self, id: EntryId) -> Option<&Arc<ImageEntry>> {
        self.entries.iter().find(|e| e.id() == id)
    }

    /// Current position of `id`.
    pub fn position(&self, id: EntryId) -> Option<usize> {
        self.entries.iter().position(|e| e.id() == id)
    }

    /// Admit every image file of `files`; other files are skipped.
    ///
    /// When a derived sort order is active it is re-applied to include the new entries.
    pub fn ingest(&mut self, files: impl IntoIterator<Item = IncomingFile>) -> IngestReport {
        let mut report = IngestReport::default();
        for file in files {
            if !file.is_image() {
                tracing::debug!(
                    name = %file.name,
                    content_type = ?file.content_type,
                    "skipping non-image file"
                );
                report.skipped.push(file.name);
                continue;
            }

            let id = EntryId(self.next_id);
            self.next_id += 1;
            let display = self.handles.create(&file.name);
            self.entries
                .push(Arc::new(ImageEntry::from_incoming(id, file, display)));
            report.added.push(id);
        }

        sort_entries(&mut self.entries, self.order);
        tracing::info!(
            added = report.added.len(),
            skipped = report.skipped.len(),
            total = self.entries.len(),
            "ingested images"
        );
        report
    }

    /// Remove an entry. Its display handle is revoked once no export holds it any more.
    pub fn remove(&mut self, id: EntryId) -> StillsResult<()> {
        let pos = self
            .position(id)
            .ok_or_else(|| StillsError::validation(format!("no entry with id {id}")))?;
        self.entries.remove(pos);
        Ok(())
    }

    /// Move the entry at `from` to index `to`, shifting the entries in between.
    ///
    /// Only allowed in [`SortOrder::Manual`].
    pub fn move_entry(&mut self, from: usize, to: usize) -> StillsResult<()> {
        if self.order != SortOrder::Manual {
            return Err(StillsError::validation(format!(
                "entries can only be moved in manual order (current: {})",
                self.order
            )));
        }
        let len = self.entries.len();
        if from >= len || to >= len {
            return Err(StillsError::validation(format!(
                "move {from} -> {to} is out of bounds for {len} entries"
            )));
        }
        if from != to {
            let entry = self.entries.remove(from);
            self.entries.insert(to, entry);
        }
        Ok(())
    }

    /// Select an ordering mode.
    ///
    /// Derived modes re-sort immediately; switching to [`SortOrder::Manual`] keeps the current
    /// order as the manual one.
    pub fn set_sort_order(&mut self, order: SortOrder) {
        self.order = order;
        sort_entries(&mut self.entries, order);
    }

    /// Remove every entry (session reset).
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Nominal video length for this sequence at `fps`.
    pub fn nominal_duration(&self, fps: Fps) -> Duration {
        fps.frames_to_duration(self.entries.len())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/sequence/list.rs"]
mod tests;
