//! Shared fixtures: an in-memory gist service with scriptable failures.

use std::collections::{HashMap, VecDeque};

use gistling::model::{FileEntry, GistDraft, GistId, Revision};
use gistling::remote::{GistPage, RemoteError, RemoteFile, RemoteGist, RemoteGists};

/// Deterministic stand-in for the remote service. Holds server-side gist
/// state, serves it in pages, and fails calls according to per-operation
/// scripts (front of the queue first).
pub struct ScriptedRemote {
    pub gists: Vec<RemoteGist>,
    pub page_size: usize,
    /// Queued outcomes per operation name ("list", "fetch", "create",
    /// "update", "delete", "file"): `Some(err)` fails that call, `None`
    /// lets it through. Exhausted queues always pass.
    pub failures: HashMap<&'static str, VecDeque<Option<RemoteError>>>,
    /// Every remote call, for asserting retry counts and serialization.
    pub calls: Vec<String>,
    /// When set, listing pages omit file bodies (as the real endpoint does
    /// for large files); `fetch_file` still serves them.
    pub elide_content: bool,
    next_id: u32,
    next_rev: u32,
}

#[allow(dead_code)]
impl ScriptedRemote {
    pub fn new(gists: Vec<RemoteGist>) -> Self {
        Self {
            gists,
            page_size: 100,
            failures: HashMap::new(),
            calls: Vec::new(),
            elide_content: false,
            next_id: 1,
            next_rev: 1,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn script_failure(&mut self, op: &'static str, err: RemoteError) {
        self.failures.entry(op).or_default().push_back(Some(err));
    }

    /// Let the next call of `op` succeed (placeholder before a scripted
    /// failure deeper in the queue).
    pub fn script_pass(&mut self, op: &'static str) {
        self.failures.entry(op).or_default().push_back(None);
    }

    pub fn calls_for(&self, op: &str) -> usize {
        self.calls.iter().filter(|c| c.starts_with(op)).count()
    }

    /// Mutate a gist server-side, bumping its revision (simulates another
    /// client editing behind our back).
    pub fn bump(&mut self, id: &str, description: &str) {
        let rev = self.fresh_rev();
        let gist = self
            .gists
            .iter_mut()
            .find(|g| g.id == id)
            .expect("gist exists server-side");
        gist.description = description.to_string();
        gist.revision = rev;
    }

    pub fn drop_gist(&mut self, id: &str) {
        self.gists.retain(|g| g.id != id);
    }

    fn fresh_rev(&mut self) -> String {
        self.next_rev += 1;
        format!("r{}", self.next_rev)
    }

    fn pop_failure(&mut self, op: &'static str) -> Option<RemoteError> {
        self.failures.get_mut(op)?.pop_front().flatten()
    }
}

impl RemoteGists for ScriptedRemote {
    fn list_page(&mut self, token: Option<&str>) -> Result<GistPage, RemoteError> {
        let start: usize = token.map(|t| t.parse().unwrap_or(0)).unwrap_or(0);
        self.calls.push(format!("list page {}", start / self.page_size.max(1)));
        if let Some(err) = self.pop_failure("list") {
            return Err(err);
        }
        let end = (start + self.page_size).min(self.gists.len());
        let next = if end < self.gists.len() {
            Some(end.to_string())
        } else {
            None
        };
        let mut gists = self.gists[start..end].to_vec();
        if self.elide_content {
            for g in &mut gists {
                for f in &mut g.files {
                    f.content = None;
                }
            }
        }
        Ok(GistPage { gists, next })
    }

    fn fetch(&mut self, id: &GistId) -> Result<RemoteGist, RemoteError> {
        self.calls.push(format!("fetch {id}"));
        if let Some(err) = self.pop_failure("fetch") {
            return Err(err);
        }
        self.gists
            .iter()
            .find(|g| g.id == id.as_str())
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(id.to_string()))
    }

    fn create(&mut self, draft: &GistDraft) -> Result<RemoteGist, RemoteError> {
        self.calls.push(format!("create {}", draft.description));
        if let Some(err) = self.pop_failure("create") {
            return Err(err);
        }
        self.next_id += 1;
        let rev = self.fresh_rev();
        let gist = RemoteGist {
            id: format!("g{}", self.next_id),
            description: draft.description.clone(),
            public: draft.public,
            files: to_remote_files(&draft.files),
            revision: rev,
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
        };
        self.gists.insert(0, gist.clone());
        Ok(gist)
    }

    fn update(
        &mut self,
        id: &GistId,
        base: &Revision,
        draft: &GistDraft,
    ) -> Result<RemoteGist, RemoteError> {
        self.calls.push(format!("update {id}"));
        if let Some(err) = self.pop_failure("update") {
            return Err(err);
        }
        let rev = self.fresh_rev();
        let gist = self
            .gists
            .iter_mut()
            .find(|g| g.id == id.as_str())
            .ok_or_else(|| RemoteError::NotFound(id.to_string()))?;
        if gist.revision != base.as_str() {
            return Err(RemoteError::PreconditionFailed(id.to_string()));
        }
        gist.description = draft.description.clone();
        gist.public = draft.public;
        gist.files = to_remote_files(&draft.files);
        gist.revision = rev;
        Ok(gist.clone())
    }

    fn delete(&mut self, id: &GistId, base: &Revision) -> Result<(), RemoteError> {
        self.calls.push(format!("delete {id}"));
        if let Some(err) = self.pop_failure("delete") {
            return Err(err);
        }
        let gist = self
            .gists
            .iter()
            .find(|g| g.id == id.as_str())
            .ok_or_else(|| RemoteError::NotFound(id.to_string()))?;
        if gist.revision != base.as_str() {
            return Err(RemoteError::PreconditionFailed(id.to_string()));
        }
        self.gists.retain(|g| g.id != id.as_str());
        Ok(())
    }

    fn fetch_file(&mut self, id: &GistId, filename: &str) -> Result<String, RemoteError> {
        self.calls.push(format!("file {id}/{filename}"));
        if let Some(err) = self.pop_failure("file") {
            return Err(err);
        }
        self.gists
            .iter()
            .find(|g| g.id == id.as_str())
            .and_then(|g| g.files.iter().find(|f| f.filename == filename))
            .and_then(|f| f.content.clone())
            .ok_or_else(|| RemoteError::NotFound(id.to_string()))
    }
}

fn to_remote_files(files: &[FileEntry]) -> Vec<RemoteFile> {
    files
        .iter()
        .map(|f| RemoteFile {
            filename: f.filename.clone(),
            size: f.size,
            content: f.content.clone(),
        })
        .collect()
}

#[allow(dead_code)]
pub fn remote_gist(id: &str, revision: &str, files: &[(&str, &str)]) -> RemoteGist {
    RemoteGist {
        id: id.to_string(),
        description: format!("gist {id}"),
        public: false,
        files: files
            .iter()
            .map(|(name, content)| RemoteFile {
                filename: name.to_string(),
                size: content.len() as u64,
                content: Some(content.to_string()),
            })
            .collect(),
        revision: revision.to_string(),
        created_at: "2026-01-01T00:00:00Z".to_string(),
        updated_at: "2026-01-01T00:00:00Z".to_string(),
    }
}

#[allow(dead_code)]
pub fn draft(description: &str, files: &[(&str, &str)]) -> GistDraft {
    GistDraft {
        description: description.to_string(),
        public: false,
        files: files
            .iter()
            .map(|(name, content)| FileEntry::new(name, Some(content.to_string())))
            .collect(),
    }
}
