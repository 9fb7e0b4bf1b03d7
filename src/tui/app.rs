use std::io;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use crate::cache::Subscription;
use crate::model::GistId;
use crate::nav::Navigator;
use crate::remote::HttpRemote;
use crate::store::LocalStore;
use crate::sync::{SyncEngine, SyncEvent};

use super::input::Input;
use super::keys;
use super::render;

/// Sidebar filter over the cache's ordered view.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(super) enum Filter {
    #[default]
    All,
    Language(String),
    Tag(String),
}

pub(super) struct App {
    pub(super) engine: SyncEngine<HttpRemote>,
    pub(super) store: LocalStore,
    pub(super) nav: Navigator,
    pub(super) changes: Subscription,
    pub(super) filter: Filter,
    pub(super) input: Input,
    pub(super) status: Option<String>,
    pub(super) quit: bool,
}

impl App {
    pub(super) fn new(mut engine: SyncEngine<HttpRemote>, store: LocalStore) -> Self {
        let changes = engine.subscribe();
        Self {
            engine,
            store,
            nav: Navigator::new(),
            changes,
            filter: Filter::All,
            input: Input::default(),
            status: None,
            quit: false,
        }
    }

    /// Ordered view the list pane shows: cache order narrowed by the filter.
    pub(super) fn visible_ids(&self) -> Vec<GistId> {
        let cache = self.engine.cache();
        match &self.filter {
            Filter::All => cache.ids(),
            Filter::Language(lang) => {
                let bucket = cache.index().by_language(lang);
                cache.ids().into_iter().filter(|i| bucket.contains(i)).collect()
            }
            Filter::Tag(tag) => {
                let bucket = cache.index().by_tag(tag);
                cache.ids().into_iter().filter(|i| bucket.contains(i)).collect()
            }
        }
    }

    pub(super) fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> Result<()> {
        let sync_interval = Duration::from_secs(120);
        let mut last_sync = Instant::now();
        self.run_sync();

        loop {
            terminal
                .draw(|f| render::draw(f, self))
                .context("draw frame")?;
            if self.quit {
                return Ok(());
            }

            if event::poll(Duration::from_millis(50)).context("poll")? {
                match event::read().context("read event")? {
                    Event::Key(k) if k.kind == KeyEventKind::Press => keys::handle_key(self, k),
                    _ => {}
                }
            }

            // Pending optimistic operations advance one attempt per tick.
            if self.engine.has_pending() {
                let events = self.engine.drive();
                self.apply_events(&events);
            }

            if last_sync.elapsed() >= sync_interval {
                self.run_sync();
                last_sync = Instant::now();
            }

            self.reconcile_view();
        }
    }

    pub(super) fn run_sync(&mut self) {
        match self.engine.full_sync() {
            Ok(report) => {
                self.status = Some(format!(
                    "synced: {} gists, {} removed",
                    report.fetched, report.removed
                ));
                self.restore_tags();
            }
            Err(err) => self.status = Some(format!("sync failed: {err:#}")),
        }
        self.reconcile_view();
    }

    /// Reapply persisted tag assignments to freshly synced records.
    fn restore_tags(&mut self) {
        let Ok(state) = self.store.read_state() else {
            return;
        };
        for (id, tags) in state.tags {
            if self.engine.cache().get(&id).is_some_and(|r| r.tags != tags) {
                let _ = self.engine.set_tags(&id, tags);
            }
        }
    }

    pub(super) fn apply_events(&mut self, events: &[SyncEvent]) {
        for ev in events {
            match ev {
                SyncEvent::Created { temp, id } => {
                    let _ = self.store.rename_tag_owner(temp, id);
                    self.status = Some(format!("created {id}"));
                }
                SyncEvent::Updated { id } => self.status = Some(format!("updated {id}")),
                SyncEvent::Deleted { id } => self.status = Some(format!("deleted {id}")),
                SyncEvent::RolledBack { id, error } => {
                    self.status = Some(format!("{id}: rolled back ({error})"));
                }
                SyncEvent::RefetchScheduled { id } => {
                    self.status = Some(format!("{id}: stale, refetching"));
                }
                SyncEvent::Refetched { id } => self.status = Some(format!("refreshed {id}")),
                SyncEvent::RemovedRemotely { id } => {
                    self.status = Some(format!("{id} was deleted remotely"));
                }
            }
        }
    }

    /// Drain cache change notifications and re-clamp the cursor against the
    /// current visible view.
    pub(super) fn reconcile_view(&mut self) {
        let changed = !self.changes.drain().is_empty();
        let ids = self.visible_ids();
        if changed {
            self.nav.prune_selection(&ids);
        }
        self.nav.on_view_changed(ids.len());
    }
}
