//! In-memory gist cache: the single owner of gist records and their
//! canonical list order. Mutations are synchronous and atomic; the index is
//! updated inside each mutation before any observer hears about it.

use std::collections::HashMap;
use std::sync::mpsc::{Receiver, Sender, channel};

use crate::index::LangTagIndex;
use crate::model::{GistId, GistRecord};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChangeEvent {
    Upserted(GistId),
    Removed(GistId),
    /// Identity swap in one observable instant (create confirmation).
    Replaced { old: GistId, new: GistId },
}

/// Handle for one observer; drop it to unsubscribe.
pub struct Subscription {
    rx: Receiver<ChangeEvent>,
}

impl Subscription {
    /// Drain everything delivered since the last call.
    pub fn drain(&self) -> Vec<ChangeEvent> {
        self.rx.try_iter().collect()
    }
}

#[derive(Default)]
pub struct GistCache {
    records: HashMap<GistId, GistRecord>,
    /// Canonical list order; most-recently-updated-first for new records.
    order: Vec<GistId>,
    index: LangTagIndex,
    observers: Vec<Sender<ChangeEvent>>,
}

impl GistCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace by identity. Existing records keep their position;
    /// new records enter at the head.
    pub fn upsert(&mut self, record: GistRecord) {
        let id = record.id.clone();
        let old = self.records.get(&id);
        self.index.apply_upsert(old, &record);
        if self.records.insert(id.clone(), record).is_none() {
            self.order.insert(0, id.clone());
        }
        self.notify(ChangeEvent::Upserted(id));
    }

    pub fn remove(&mut self, id: &GistId) -> Option<GistRecord> {
        let record = self.records.remove(id)?;
        self.order.retain(|o| o != id);
        self.index.apply_remove(&record);
        self.notify(ChangeEvent::Removed(id.clone()));
        Some(record)
    }

    /// Re-insert a record at a prior position (delete rollback). The
    /// position is clamped to the current length.
    pub fn restore_at(&mut self, position: usize, record: GistRecord) {
        let id = record.id.clone();
        if self.records.contains_key(&id) {
            // Already present again (e.g. a sync raced the rollback); treat
            // as a plain upsert so the order invariant holds.
            self.upsert(record);
            return;
        }
        self.index.apply_upsert(None, &record);
        self.records.insert(id.clone(), record);
        let at = position.min(self.order.len());
        self.order.insert(at, id.clone());
        self.notify(ChangeEvent::Upserted(id));
    }

    /// Replace `old`'s identity with `record` in one mutation: same order
    /// position, one notification, readers never see both or neither.
    pub fn replace_id(&mut self, old: &GistId, record: GistRecord) {
        let new_id = record.id.clone();
        let Some(prev) = self.records.remove(old) else {
            self.upsert(record);
            return;
        };
        if let Some(slot) = self.order.iter_mut().find(|o| *o == old) {
            *slot = new_id.clone();
        }
        self.index.apply_replace_id(old, &new_id);
        self.index.apply_upsert(Some(&prev), &record);
        self.records.insert(new_id.clone(), record);
        self.notify(ChangeEvent::Replaced {
            old: old.clone(),
            new: new_id,
        });
    }

    pub fn get(&self, id: &GistId) -> Option<&GistRecord> {
        self.records.get(id)
    }

    pub fn contains(&self, id: &GistId) -> bool {
        self.records.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Ordered view of the current records. Built fresh per call; never a
    /// handle that aliases future mutations.
    pub fn list(&self) -> Vec<&GistRecord> {
        self.order
            .iter()
            .filter_map(|id| self.records.get(id))
            .collect()
    }

    /// Owned snapshot of the order sequence.
    pub fn ids(&self) -> Vec<GistId> {
        self.order.clone()
    }

    pub fn position(&self, id: &GistId) -> Option<usize> {
        self.order.iter().position(|o| o == id)
    }

    pub fn index(&self) -> &LangTagIndex {
        &self.index
    }

    pub fn clear(&mut self) {
        let ids: Vec<GistId> = self.order.clone();
        for id in ids {
            self.remove(&id);
        }
    }

    pub fn subscribe(&mut self) -> Subscription {
        let (tx, rx) = channel();
        self.observers.push(tx);
        Subscription { rx }
    }

    fn notify(&mut self, event: ChangeEvent) {
        // A failed send means the receiver was dropped: unsubscribe it.
        self.observers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}
