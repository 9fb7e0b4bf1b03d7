use std::time::Duration;

use crate::model::{FileEntry, GistDraft, GistId, RemoteConfig, Revision};

use super::types::{GistPage, GistPayload, RemoteFile, RemoteGist};
use super::{RemoteError, RemoteGists};

/// Blocking HTTP client for the gist service. Bearer-token auth; revision
/// preconditions travel in `If-Match`.
pub struct HttpRemote {
    remote: RemoteConfig,
    token: String,
    client: reqwest::blocking::Client,
}

impl HttpRemote {
    pub fn new(remote: RemoteConfig, token: String) -> Result<Self, RemoteError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent("gistling")
            .timeout(Duration::from_secs(20))
            .build()
            .map_err(|e| RemoteError::Transient(format!("build http client: {e}")))?;
        Ok(Self {
            remote,
            token,
            client,
        })
    }

    fn auth(&self) -> String {
        format!("Bearer {}", self.token)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.remote.base_url, path)
    }

    fn classify_send(err: reqwest::Error) -> RemoteError {
        // Timeouts and connection drops take the transient retry path.
        RemoteError::Transient(err.to_string())
    }

    fn ensure_ok(
        resp: reqwest::blocking::Response,
        id: Option<&GistId>,
    ) -> Result<reqwest::blocking::Response, RemoteError> {
        use reqwest::StatusCode;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RemoteError::Unauthorized,
            StatusCode::NOT_FOUND => {
                RemoteError::NotFound(id.map(|i| i.0.clone()).unwrap_or_default())
            }
            StatusCode::PRECONDITION_FAILED | StatusCode::CONFLICT => {
                RemoteError::PreconditionFailed(id.map(|i| i.0.clone()).unwrap_or_default())
            }
            StatusCode::TOO_MANY_REQUESTS => RemoteError::RateLimited,
            s if s.is_server_error() => RemoteError::Transient(format!("server error {s}")),
            s => RemoteError::Unknown {
                status: s.as_u16(),
                message: resp.text().unwrap_or_default(),
            },
        })
    }

    fn payload(draft: &GistDraft) -> GistPayload {
        GistPayload {
            description: draft.description.clone(),
            public: draft.public,
            files: draft
                .files
                .iter()
                .map(|f: &FileEntry| RemoteFile {
                    filename: f.filename.clone(),
                    size: f.size,
                    content: f.content.clone(),
                })
                .collect(),
        }
    }
}

impl RemoteGists for HttpRemote {
    fn list_page(&mut self, token: Option<&str>) -> Result<GistPage, RemoteError> {
        let url = match token {
            Some(t) => format!("{}?page_token={}", self.url("/gists"), t),
            None => self.url("/gists"),
        };
        let resp = self
            .client
            .get(url)
            .header("Authorization", self.auth())
            .send()
            .map_err(Self::classify_send)?;
        Self::ensure_ok(resp, None)?
            .json()
            .map_err(|e| RemoteError::Transient(format!("decode gist page: {e}")))
    }

    fn fetch(&mut self, id: &GistId) -> Result<RemoteGist, RemoteError> {
        let resp = self
            .client
            .get(self.url(&format!("/gists/{}", id.as_str())))
            .header("Authorization", self.auth())
            .send()
            .map_err(Self::classify_send)?;
        Self::ensure_ok(resp, Some(id))?
            .json()
            .map_err(|e| RemoteError::Transient(format!("decode gist: {e}")))
    }

    fn create(&mut self, draft: &GistDraft) -> Result<RemoteGist, RemoteError> {
        let resp = self
            .client
            .post(self.url("/gists"))
            .header("Authorization", self.auth())
            .json(&Self::payload(draft))
            .send()
            .map_err(Self::classify_send)?;
        Self::ensure_ok(resp, None)?
            .json()
            .map_err(|e| RemoteError::Transient(format!("decode created gist: {e}")))
    }

    fn update(
        &mut self,
        id: &GistId,
        base: &Revision,
        draft: &GistDraft,
    ) -> Result<RemoteGist, RemoteError> {
        let resp = self
            .client
            .patch(self.url(&format!("/gists/{}", id.as_str())))
            .header("Authorization", self.auth())
            .header("If-Match", base.as_str())
            .json(&Self::payload(draft))
            .send()
            .map_err(Self::classify_send)?;
        Self::ensure_ok(resp, Some(id))?
            .json()
            .map_err(|e| RemoteError::Transient(format!("decode updated gist: {e}")))
    }

    fn delete(&mut self, id: &GistId, base: &Revision) -> Result<(), RemoteError> {
        let resp = self
            .client
            .delete(self.url(&format!("/gists/{}", id.as_str())))
            .header("Authorization", self.auth())
            .header("If-Match", base.as_str())
            .send()
            .map_err(Self::classify_send)?;
        Self::ensure_ok(resp, Some(id)).map(|_| ())
    }

    fn fetch_file(&mut self, id: &GistId, filename: &str) -> Result<String, RemoteError> {
        let resp = self
            .client
            .get(self.url(&format!("/gists/{}/files/{}", id.as_str(), filename)))
            .header("Authorization", self.auth())
            .send()
            .map_err(Self::classify_send)?;
        Self::ensure_ok(resp, Some(id))?
            .text()
            .map_err(|e| RemoteError::Transient(format!("read file content: {e}")))
    }
}
