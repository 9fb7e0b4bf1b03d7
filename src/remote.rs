use crate::model::{GistDraft, GistId, Revision};

mod error;
mod http;
mod types;

pub use self::error::RemoteError;
pub use self::http::HttpRemote;
pub use self::types::{GistPage, GistPayload, RemoteFile, RemoteGist};

/// The remote gist service as seen by the sync engine. Every call is a
/// suspension point in the cooperative model; everything between calls runs
/// to completion.
pub trait RemoteGists {
    /// One page of the user's collection; `token` is the opaque continuation
    /// from the previous page, `None` for the first.
    fn list_page(&mut self, token: Option<&str>) -> Result<GistPage, RemoteError>;

    fn fetch(&mut self, id: &GistId) -> Result<RemoteGist, RemoteError>;

    fn create(&mut self, draft: &GistDraft) -> Result<RemoteGist, RemoteError>;

    /// `base` is the revision precondition: the call fails with
    /// [`RemoteError::PreconditionFailed`] if the remote has moved past it.
    fn update(
        &mut self,
        id: &GistId,
        base: &Revision,
        draft: &GistDraft,
    ) -> Result<RemoteGist, RemoteError>;

    fn delete(&mut self, id: &GistId, base: &Revision) -> Result<(), RemoteError>;

    /// Content of a single file, for entries the listing left unloaded.
    fn fetch_file(&mut self, id: &GistId, filename: &str) -> Result<String, RemoteError>;
}
