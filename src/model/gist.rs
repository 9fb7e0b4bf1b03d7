use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::languages::{RAW_LANGUAGE, language_for_extension};

/// Opaque remote identity of a gist, stable across syncs. Identities
/// synthesized locally for not-yet-confirmed creates carry a `local-` prefix.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GistId(pub String);

impl GistId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Synthesize a temporary identity for an optimistic create.
    pub fn new_local() -> Self {
        let mut bytes = [0u8; 8];
        // Zeroes on getrandom failure still yield a usable temp id; the
        // remote-assigned id replaces it either way.
        let _ = getrandom::getrandom(&mut bytes);
        let mut s = String::with_capacity(22);
        s.push_str("local-");
        for b in bytes {
            s.push_str(&format!("{:02x}", b));
        }
        Self(s)
    }

    pub fn is_local(&self) -> bool {
        self.0.starts_with("local-")
    }
}

impl std::fmt::Display for GistId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque remote-assigned revision marker; advances on every remote mutation.
/// Compared only for equality, never interpreted.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Revision(pub String);

impl Revision {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Marker used on optimistic records before the remote confirms.
    pub fn pending() -> Self {
        Self("pending".to_string())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub filename: String,
    pub language: String,
    /// Lazily fetched for large files; `None` until requested.
    pub content: Option<String>,
    pub size: u64,
}

impl FileEntry {
    pub fn new(filename: &str, content: Option<String>) -> Self {
        let size = content.as_deref().map(|c| c.len() as u64).unwrap_or(0);
        Self {
            filename: filename.to_string(),
            language: language_for_filename(filename).to_string(),
            content,
            size,
        }
    }
}

/// Local mutation status of a cached record. A closed set so rollback
/// handling can match exhaustively.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PendingState {
    #[default]
    Committed,
    PendingCreate,
    PendingUpdate,
    PendingDelete,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GistRecord {
    pub id: GistId,
    pub description: String,
    pub public: bool,
    pub files: Vec<FileEntry>,
    pub revision: Revision,
    pub created_at: String,
    pub updated_at: String,

    /// User-assigned, local-only; the remote never sees tags.
    #[serde(default)]
    pub tags: BTreeSet<String>,

    #[serde(default)]
    pub pending: PendingState,
}

impl GistRecord {
    /// Primary language, derived from file extensions: the most frequent
    /// language across files, first-seen order breaking ties.
    pub fn primary_language(&self) -> &str {
        let mut counts: Vec<(&str, usize)> = Vec::new();
        for f in &self.files {
            match counts.iter_mut().find(|(l, _)| *l == f.language) {
                Some((_, n)) => *n += 1,
                None => counts.push((&f.language, 1)),
            }
        }
        // First strict maximum, so ties resolve in first-seen order.
        let mut best: Option<(&str, usize)> = None;
        for &(lang, n) in &counts {
            if best.is_none_or(|(_, m)| n > m) {
                best = Some((lang, n));
            }
        }
        best.map(|(l, _)| l).unwrap_or(RAW_LANGUAGE)
    }

    pub fn file(&self, filename: &str) -> Option<&FileEntry> {
        self.files.iter().find(|f| f.filename == filename)
    }
}

/// Payload of a create or update: what the user intends the gist to become.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GistDraft {
    pub description: String,
    pub public: bool,
    pub files: Vec<FileEntry>,
}

impl GistDraft {
    /// The optimistic record a draft produces before the remote confirms.
    pub fn into_record(self, id: GistId, now: &str) -> GistRecord {
        GistRecord {
            id,
            description: self.description,
            public: self.public,
            files: self.files,
            revision: Revision::pending(),
            created_at: now.to_string(),
            updated_at: now.to_string(),
            tags: BTreeSet::new(),
            pending: PendingState::PendingCreate,
        }
    }

    /// Apply a draft over an existing record, keeping identity, revision and
    /// local-only metadata.
    pub fn apply_to(&self, base: &GistRecord, now: &str) -> GistRecord {
        GistRecord {
            id: base.id.clone(),
            description: self.description.clone(),
            public: self.public,
            files: self.files.clone(),
            revision: base.revision.clone(),
            created_at: base.created_at.clone(),
            updated_at: now.to_string(),
            tags: base.tags.clone(),
            pending: PendingState::PendingUpdate,
        }
    }
}

pub fn language_for_filename(filename: &str) -> &'static str {
    let ext = filename.rsplit_once('.').map(|(_, e)| e).unwrap_or("");
    language_for_extension(ext)
}

pub fn now_ts() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "<time>".to_string())
}
