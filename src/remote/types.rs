//! DTOs for remote gist-service requests/responses.

use serde::{Deserialize, Serialize};

use crate::model::{FileEntry, GistId, GistRecord, PendingState, Revision, language_for_filename};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RemoteFile {
    pub filename: String,
    pub size: u64,

    /// Omitted by the listing endpoint for large files.
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RemoteGist {
    pub id: String,
    pub description: String,
    pub public: bool,
    pub files: Vec<RemoteFile>,
    pub revision: String,
    pub created_at: String,
    pub updated_at: String,
}

/// One page of the remote listing; `next` is an opaque token, absent on the
/// last page.
#[derive(Debug, Serialize, Deserialize)]
pub struct GistPage {
    pub gists: Vec<RemoteGist>,

    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GistPayload {
    pub description: String,
    pub public: bool,
    pub files: Vec<RemoteFile>,
}

impl From<RemoteGist> for GistRecord {
    fn from(g: RemoteGist) -> Self {
        let files = g
            .files
            .into_iter()
            .map(|f| FileEntry {
                language: language_for_filename(&f.filename).to_string(),
                filename: f.filename,
                content: f.content,
                size: f.size,
            })
            .collect();
        GistRecord {
            id: GistId(g.id),
            description: g.description,
            public: g.public,
            files,
            revision: Revision(g.revision),
            created_at: g.created_at,
            updated_at: g.updated_at,
            tags: Default::default(),
            pending: PendingState::Committed,
        }
    }
}
