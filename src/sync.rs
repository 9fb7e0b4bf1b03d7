//! Sync engine: reconciles the remote collection with the local cache,
//! fronts optimistic CRUD, and keeps the index/readers consistent through
//! partial failures.

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;

use anyhow::{Result, anyhow};
use log::{debug, info, warn};

use crate::cache::{GistCache, Subscription};
use crate::model::{GistDraft, GistId, GistRecord, Revision, now_ts};
use crate::remote::{RemoteError, RemoteGist, RemoteGists};
use crate::staleness::{Staleness, classify};

mod state;
pub use self::state::SyncState;

/// Bounded retry budget for transient failures.
const MAX_ATTEMPTS: u32 = 3;
const BACKOFF_BASE_MS: u64 = 200;

/// A queued local mutation between optimistic apply and its terminal remote
/// outcome.
#[derive(Clone, Debug)]
struct QueuedOp {
    kind: OpKind,
    attempts: u32,
}

#[derive(Clone, Debug)]
enum OpKind {
    Create {
        temp_id: GistId,
        draft: GistDraft,
    },
    Update {
        draft: GistDraft,
        /// Revision the edit was based on; sent as the precondition.
        base: Revision,
        /// Exact pre-optimistic snapshot for rollback.
        pre_image: GistRecord,
    },
    Delete {
        base: Revision,
        pre_image: GistRecord,
        /// Order position to restore on rollback.
        position: usize,
    },
}

#[derive(Clone, Debug)]
pub enum SyncEvent {
    Created { temp: GistId, id: GistId },
    Updated { id: GistId },
    Deleted { id: GistId },
    /// Optimistic state abandoned; the cache already shows the rollback.
    RolledBack { id: GistId, error: RemoteError },
    RefetchScheduled { id: GistId },
    Refetched { id: GistId },
    /// Record vanished remotely; local copy dropped.
    RemovedRemotely { id: GistId },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub fetched: usize,
    pub removed: usize,
    /// False when a newer sync superseded this one before its sweep.
    pub sweep_applied: bool,
}

pub struct SyncEngine<R: RemoteGists> {
    cache: GistCache,
    remote: R,
    state: SyncState,
    /// Per-identity operation queues; only the front of each is in flight.
    queues: HashMap<GistId, VecDeque<QueuedOp>>,
    /// Records marked stale, refetched on `drive`, with attempt counts.
    refetch: HashMap<GistId, u32>,
}

impl<R: RemoteGists> SyncEngine<R> {
    pub fn new(remote: R) -> Self {
        Self {
            cache: GistCache::new(),
            remote,
            state: SyncState::new(),
            queues: HashMap::new(),
            refetch: HashMap::new(),
        }
    }

    pub fn cache(&self) -> &GistCache {
        &self.cache
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn remote_mut(&mut self) -> &mut R {
        &mut self.remote
    }

    pub fn state(&self) -> &SyncState {
        &self.state
    }

    pub fn subscribe(&mut self) -> Subscription {
        self.cache.subscribe()
    }

    pub fn has_pending(&self) -> bool {
        !self.queues.is_empty() || !self.refetch.is_empty()
    }

    /// Ids with a queued operation are mid-flight: never clobbered by sync
    /// merges and immune to the tombstone sweep.
    fn is_pending(&self, id: &GistId) -> bool {
        self.queues.contains_key(id)
    }

    /// Invoked by the external logout flow.
    pub fn reset_session(&mut self) {
        self.queues.clear();
        self.refetch.clear();
        self.state.reset();
        self.cache.clear();
        info!("session state reset");
    }

    // ---- full sync ------------------------------------------------------

    /// Fetch the entire remote collection page by page. Fetched records are
    /// merged immediately; the tombstone sweep only runs once every page has
    /// arrived, so a partial failure freshens but never deletes.
    pub fn full_sync(&mut self) -> Result<SyncReport> {
        let generation = self.state.begin_generation();
        self.state.in_flight += 1;
        let result = self.full_sync_inner(generation);
        self.state.in_flight -= 1;
        result
    }

    fn full_sync_inner(&mut self, generation: u64) -> Result<SyncReport> {
        let mut seen: HashSet<GistId> = HashSet::new();
        let mut fetched = 0usize;
        let mut token: Option<String> = None;

        loop {
            let page = self
                .list_page_with_retries(token.as_deref())
                .map_err(|e| anyhow!(e).context("fetch gist page"))?;
            for gist in page.gists {
                seen.insert(GistId(gist.id.clone()));
                self.merge_remote(gist);
                fetched += 1;
            }
            match page.next {
                Some(next) => token = Some(next),
                None => break,
            }
        }

        if !self.state.sweep_allowed(generation) {
            debug!("sync generation {generation} superseded; discarding sweep");
            return Ok(SyncReport {
                fetched,
                removed: 0,
                sweep_applied: false,
            });
        }

        // Tombstone sweep: drop records absent from the completed listing.
        // Mid-flight records (pending creates in particular) are immune
        // until their remote call resolves.
        let stale: Vec<GistId> = self
            .cache
            .ids()
            .into_iter()
            .filter(|id| !seen.contains(id) && !self.is_pending(id))
            .collect();
        let removed = stale.len();
        for id in stale {
            debug!("tombstone sweep removes {id}");
            self.cache.remove(&id);
            self.state.forget(&id);
        }
        self.state.complete_generation(generation, now_ts());
        info!("full sync: {fetched} fetched, {removed} swept");
        Ok(SyncReport {
            fetched,
            removed,
            sweep_applied: true,
        })
    }

    fn list_page_with_retries(
        &mut self,
        token: Option<&str>,
    ) -> Result<crate::remote::GistPage, RemoteError> {
        let mut attempt = 0u32;
        loop {
            match self.remote.list_page(token) {
                Ok(page) => return Ok(page),
                Err(e) if e.is_transient() && attempt + 1 < MAX_ATTEMPTS => {
                    warn!("page fetch failed (attempt {}): {e}", attempt + 1);
                    std::thread::sleep(backoff(attempt));
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Merge one remote record into the cache, preserving local-only tags.
    /// Records with a pending local operation are left alone; their own
    /// remote call settles the question.
    fn merge_remote(&mut self, gist: RemoteGist) {
        let id = GistId(gist.id.clone());
        let pending = self.is_pending(&id);
        let incoming = Revision(gist.revision.clone());

        match classify(self.state.last_seen(&id), &incoming, pending) {
            Staleness::Unchanged if pending || self.cache.contains(&id) => {
                // Nothing moved; keep the cached record (it may hold lazily
                // fetched file content the listing omits). A queued delete
                // already took the record out of the cache, and the listing
                // must not put it back while that delete is in flight.
                return;
            }
            Staleness::Conflict => {
                debug!("{id} changed remotely while an edit is in flight; not clobbering");
                return;
            }
            _ => {}
        }

        let mut record: GistRecord = gist.into();
        if let Some(existing) = self.cache.get(&id) {
            record.tags = existing.tags.clone();
        }
        self.state.note_revision(id, record.revision.clone());
        self.cache.upsert(record);
    }

    // ---- optimistic CRUD -------------------------------------------------

    /// Optimistically insert a new gist and queue the remote create.
    /// Returns the temporary identity (visible immediately at the head).
    pub fn submit_create(&mut self, draft: GistDraft) -> GistId {
        let temp_id = GistId::new_local();
        let record = draft.clone().into_record(temp_id.clone(), &now_ts());
        self.cache.upsert(record);
        self.enqueue(
            temp_id.clone(),
            OpKind::Create {
                temp_id: temp_id.clone(),
                draft,
            },
        );
        temp_id
    }

    /// Optimistically apply an edit and queue the remote update.
    pub fn submit_update(&mut self, id: &GistId, draft: GistDraft) -> Result<()> {
        let base = self
            .cache
            .get(id)
            .ok_or_else(|| anyhow!("unknown gist {id}"))?
            .clone();
        let optimistic = draft.apply_to(&base, &now_ts());
        // The precondition is the last confirmed revision, not an optimistic
        // marker a queued predecessor may have left on the cache record.
        let base_rev = match self.last_confirmed_revision(id) {
            Some(rev) => rev,
            None => base.revision.clone(),
        };
        self.cache.upsert(optimistic);
        self.enqueue(
            id.clone(),
            OpKind::Update {
                draft,
                base: base_rev,
                pre_image: base,
            },
        );
        Ok(())
    }

    /// Optimistically remove and queue the remote delete.
    pub fn submit_delete(&mut self, id: &GistId) -> Result<()> {
        let position = self
            .cache
            .position(id)
            .ok_or_else(|| anyhow!("unknown gist {id}"))?;
        let base_rev = self
            .last_confirmed_revision(id)
            .or_else(|| self.cache.get(id).map(|r| r.revision.clone()))
            .ok_or_else(|| anyhow!("unknown gist {id}"))?;
        let pre_image = self
            .cache
            .remove(id)
            .ok_or_else(|| anyhow!("unknown gist {id}"))?;
        self.enqueue(
            id.clone(),
            OpKind::Delete {
                base: base_rev,
                pre_image,
                position,
            },
        );
        Ok(())
    }

    fn last_confirmed_revision(&self, id: &GistId) -> Option<Revision> {
        if let Some(queue) = self.queues.get(id) {
            // A queued predecessor means the cache revision is optimistic;
            // chain off the base the earlier op carries.
            for op in queue.iter().rev() {
                match &op.kind {
                    OpKind::Update { base, .. } | OpKind::Delete { base, .. } => {
                        return Some(base.clone());
                    }
                    OpKind::Create { .. } => return Some(Revision::pending()),
                }
            }
        }
        self.state.last_seen(id).cloned()
    }

    fn enqueue(&mut self, id: GistId, kind: OpKind) {
        self.queues
            .entry(id)
            .or_default()
            .push_back(QueuedOp { kind, attempts: 0 });
    }

    // ---- driving ---------------------------------------------------------

    /// One remote attempt per identity queue head plus one pass over the
    /// refetch set. Returns the events this pass produced.
    pub fn drive(&mut self) -> Vec<SyncEvent> {
        let mut events = Vec::new();
        // Refetches scheduled during this pass wait for the next one, so a
        // rollback is observable before the refreshed record lands.
        let refetch_now: Vec<GistId> = self.refetch.keys().cloned().collect();
        let ids: Vec<GistId> = self.queues.keys().cloned().collect();
        for id in ids {
            self.drive_one(&id, &mut events);
        }
        self.drive_refetches(&refetch_now, &mut events);
        events
    }

    /// Drive to quiescence, sleeping between passes when retries remain.
    pub fn flush(&mut self) -> Vec<SyncEvent> {
        let mut all = Vec::new();
        let mut pass = 0u32;
        while self.has_pending() {
            all.extend(self.drive());
            if self.has_pending() {
                std::thread::sleep(backoff(pass.min(4)));
                pass += 1;
            }
        }
        all
    }

    fn drive_one(&mut self, id: &GistId, events: &mut Vec<SyncEvent>) {
        let Some(op) = self.queues.get(id).and_then(|q| q.front()).cloned() else {
            return;
        };

        self.state.in_flight += 1;
        let outcome = match &op.kind {
            OpKind::Create { draft, .. } => self.remote.create(draft).map(Some),
            OpKind::Update { draft, base, .. } => self.remote.update(id, base, draft).map(Some),
            OpKind::Delete { base, .. } => self.remote.delete(id, base).map(|_| None),
        };
        self.state.in_flight -= 1;

        match outcome {
            Ok(confirmed) => self.complete_head(id, &op.kind, confirmed, events),
            Err(e) if e.is_transient() && op.attempts + 1 < MAX_ATTEMPTS => {
                warn!("{id}: transient failure (attempt {}): {e}", op.attempts + 1);
                if let Some(q) = self.queues.get_mut(id)
                    && let Some(front) = q.front_mut()
                {
                    front.attempts += 1;
                }
            }
            Err(e) => self.fail_head(id, &op.kind, e, events),
        }
    }

    /// Terminal success of the head operation.
    fn complete_head(
        &mut self,
        id: &GistId,
        kind: &OpKind,
        confirmed: Option<RemoteGist>,
        events: &mut Vec<SyncEvent>,
    ) {
        let mut queue = self.queues.remove(id).unwrap_or_default();
        queue.pop_front();

        match kind {
            OpKind::Create { temp_id, .. } => {
                let gist = confirmed.expect("create returns the created gist");
                let final_id = GistId(gist.id.clone());
                let mut record: GistRecord = gist.into();
                if let Some(temp) = self.cache.get(temp_id) {
                    record.tags = temp.tags.clone();
                }
                self.state
                    .note_revision(final_id.clone(), record.revision.clone());
                let revision = record.revision.clone();
                // One observable instant: temp out, final in, same position.
                self.cache.replace_id(temp_id, record);
                events.push(SyncEvent::Created {
                    temp: temp_id.clone(),
                    id: final_id.clone(),
                });
                // Ops queued behind the create now target the real identity.
                if !queue.is_empty() {
                    rebase_queue(&mut queue, &revision, self.cache.get(&final_id));
                    self.queues.insert(final_id, queue);
                }
            }
            OpKind::Update { .. } => {
                let gist = confirmed.expect("update returns the updated gist");
                let mut record: GistRecord = gist.into();
                if let Some(existing) = self.cache.get(id) {
                    record.tags = existing.tags.clone();
                }
                self.state
                    .note_revision(id.clone(), record.revision.clone());
                if queue.is_empty() {
                    self.cache.upsert(record);
                } else {
                    // A later optimistic edit is still on display; only the
                    // queued op's base and rollback snapshot move forward.
                    rebase_queue(&mut queue, &record.revision, Some(&record));
                    self.queues.insert(id.clone(), queue);
                }
                events.push(SyncEvent::Updated { id: id.clone() });
            }
            OpKind::Delete { .. } => {
                self.state.forget(id);
                events.push(SyncEvent::Deleted { id: id.clone() });
                // Nothing can be queued behind a delete: the record left the
                // cache at submit time, so later submits were rejected.
            }
        }
    }

    /// Terminal failure of the head operation: mandatory synchronous
    /// rollback, then abort everything queued behind it (those edits were
    /// based on the failed outcome).
    fn fail_head(
        &mut self,
        id: &GistId,
        kind: &OpKind,
        error: RemoteError,
        events: &mut Vec<SyncEvent>,
    ) {
        let queue = self.queues.remove(id).unwrap_or_default();

        match (&error, kind) {
            // Remote deleted the record out from under us: remote-ahead,
            // the local copy goes too.
            (RemoteError::NotFound(_), OpKind::Update { .. } | OpKind::Delete { .. }) => {
                self.cache.remove(id);
                self.state.forget(id);
                events.push(SyncEvent::RemovedRemotely { id: id.clone() });
                return;
            }
            (_, OpKind::Create { temp_id, .. }) => {
                self.cache.remove(temp_id);
            }
            (_, OpKind::Update { pre_image, .. }) => {
                self.cache.upsert(pre_image.clone());
            }
            (_, OpKind::Delete {
                pre_image,
                position,
                ..
            }) => {
                self.cache.restore_at(*position, pre_image.clone());
            }
        }

        if matches!(error, RemoteError::PreconditionFailed(_)) && !id.is_local() {
            self.schedule_refetch(id.clone(), events);
        }

        warn!("{id}: rolled back ({error})");
        for _ in 0..queue.len() {
            events.push(SyncEvent::RolledBack {
                id: id.clone(),
                error: error.clone(),
            });
        }
    }

    fn schedule_refetch(&mut self, id: GistId, events: &mut Vec<SyncEvent>) {
        self.refetch.entry(id.clone()).or_insert(0);
        events.push(SyncEvent::RefetchScheduled { id });
    }

    fn drive_refetches(&mut self, ids: &[GistId], events: &mut Vec<SyncEvent>) {
        for id in ids.iter().cloned() {
            if !self.refetch.contains_key(&id) {
                continue;
            }
            if self.is_pending(&id) {
                // A new edit beat the refetch; it will settle the record.
                self.refetch.remove(&id);
                continue;
            }
            self.state.in_flight += 1;
            let outcome = self.remote.fetch(&id);
            self.state.in_flight -= 1;
            match outcome {
                Ok(gist) => {
                    self.refetch.remove(&id);
                    self.merge_remote(gist);
                    events.push(SyncEvent::Refetched { id });
                }
                Err(RemoteError::NotFound(_)) => {
                    self.refetch.remove(&id);
                    self.cache.remove(&id);
                    self.state.forget(&id);
                    events.push(SyncEvent::RemovedRemotely { id });
                }
                Err(e) if e.is_transient() => {
                    let attempts = self.refetch.entry(id.clone()).or_insert(0);
                    *attempts += 1;
                    if *attempts >= MAX_ATTEMPTS {
                        warn!("giving up refetch of {id}: {e}");
                        self.refetch.remove(&id);
                    }
                }
                Err(e) => {
                    warn!("refetch of {id} failed: {e}");
                    self.refetch.remove(&id);
                }
            }
        }
    }

    // ---- local metadata & lazy content ----------------------------------

    /// Replace a record's tag set. Purely local; callers persist the
    /// assignment through the store.
    pub fn set_tags(&mut self, id: &GistId, tags: std::collections::BTreeSet<String>) -> Result<()> {
        let mut record = self
            .cache
            .get(id)
            .ok_or_else(|| anyhow!("unknown gist {id}"))?
            .clone();
        record.tags = tags;
        self.cache.upsert(record);
        Ok(())
    }

    /// File content, fetching lazily when the listing omitted it.
    pub fn file_content(&mut self, id: &GistId, filename: &str) -> Result<String> {
        let record = self
            .cache
            .get(id)
            .ok_or_else(|| anyhow!("unknown gist {id}"))?;
        let file = record
            .file(filename)
            .ok_or_else(|| anyhow!("no file {filename} in {id}"))?;
        if let Some(content) = &file.content {
            return Ok(content.clone());
        }

        let mut attempt = 0u32;
        let content = loop {
            match self.remote.fetch_file(id, filename) {
                Ok(c) => break c,
                Err(e) if e.is_transient() && attempt + 1 < MAX_ATTEMPTS => {
                    std::thread::sleep(backoff(attempt));
                    attempt += 1;
                }
                Err(e) => return Err(anyhow!(e).context("fetch file content")),
            }
        };

        let mut record = record.clone();
        if let Some(f) = record.files.iter_mut().find(|f| f.filename == filename) {
            f.content = Some(content.clone());
            f.size = content.len() as u64;
        }
        self.cache.upsert(record);
        Ok(content)
    }
}

/// After a queued predecessor confirms, later ops for the same identity
/// chain off the confirmed revision and roll back to the confirmed record.
fn rebase_queue(queue: &mut VecDeque<QueuedOp>, revision: &Revision, confirmed: Option<&GistRecord>) {
    if let Some(front) = queue.front_mut() {
        match &mut front.kind {
            OpKind::Update { base, pre_image, .. } => {
                *base = revision.clone();
                if let Some(rec) = confirmed {
                    *pre_image = rec.clone();
                }
            }
            OpKind::Delete { base, pre_image, .. } => {
                *base = revision.clone();
                if let Some(rec) = confirmed {
                    *pre_image = rec.clone();
                }
            }
            OpKind::Create { .. } => {}
        }
    }
}

fn backoff(attempt: u32) -> Duration {
    Duration::from_millis(BACKOFF_BASE_MS << attempt)
}
