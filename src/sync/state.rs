use std::collections::HashMap;

use crate::model::{GistId, Revision};

/// Session-scoped sync bookkeeping, owned by the engine (no ambient
/// singleton). `reset` is invoked by the external logout flow.
#[derive(Debug, Default)]
pub struct SyncState {
    pub last_full_sync: Option<String>,
    /// Per-identity last-seen revision markers.
    pub seen_revisions: HashMap<GistId, Revision>,
    pub in_flight: usize,

    /// Monotonic full-sync generation counters. A sweep from generation g is
    /// discarded once a newer generation has completed.
    next_generation: u64,
    completed_generation: u64,
}

impl SyncState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_generation(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }

    /// Whether a sync started as `generation` may still apply its tombstone
    /// sweep.
    pub fn sweep_allowed(&self, generation: u64) -> bool {
        generation > self.completed_generation
    }

    pub fn complete_generation(&mut self, generation: u64, at: String) {
        if generation > self.completed_generation {
            self.completed_generation = generation;
            self.last_full_sync = Some(at);
        }
    }

    pub fn note_revision(&mut self, id: GistId, revision: Revision) {
        self.seen_revisions.insert(id, revision);
    }

    pub fn forget(&mut self, id: &GistId) {
        self.seen_revisions.remove(id);
    }

    pub fn last_seen(&self, id: &GistId) -> Option<&Revision> {
        self.seen_revisions.get(id)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn superseded_generation_may_not_sweep() {
        let mut st = SyncState::new();
        let g1 = st.begin_generation();
        let g2 = st.begin_generation();
        assert!(st.sweep_allowed(g1));
        st.complete_generation(g2, "t".into());
        // The older sync's results arrive late; its sweep is discarded.
        assert!(!st.sweep_allowed(g1));
        assert!(!st.sweep_allowed(g2));
    }

    #[test]
    fn reset_clears_session_state() {
        let mut st = SyncState::new();
        st.note_revision(GistId("a".into()), Revision("r1".into()));
        let g = st.begin_generation();
        st.complete_generation(g, "t".into());
        st.reset();
        assert!(st.last_seen(&GistId("a".into())).is_none());
        assert!(st.last_full_sync.is_none());
    }
}
