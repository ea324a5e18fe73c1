//! Remote document fetch.

use crate::error::Result;

/// Raw response from the remote document service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

impl FetchResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    /// 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Fetches the exported text of a remote sheet.
///
/// Returns `Err` only when the service could not be reached; a reachable
/// service answering with an error status returns `Ok` with that status.
pub trait DocumentSource: Send + Sync {
    fn fetch(&self, document_id: &str, sub_document_id: Option<&str>) -> Result<FetchResponse>;
}
