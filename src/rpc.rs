use async_trait::async_trait;

use crate::endpoint::Endpoint;
use crate::models::{Note, NoteFilter, NoteLimits, Notebook};
use crate::ServiceResult;

/// The generated note-store client stub, treated as an opaque capability.
///
/// Every method takes the access token obtained through the authorization
/// flow. Failures surface as [`crate::ServiceError`] so the wrapper can
/// normalize them uniformly; this crate ships no wire codec of its own.
#[async_trait(?Send)]
pub trait NoteStoreRpc {
    async fn list_notebooks(&self, token: &str) -> ServiceResult<Vec<Notebook>>;

    async fn create_notebook(&self, token: &str, notebook: Notebook) -> ServiceResult<Notebook>;

    async fn find_notes(
        &self,
        token: &str,
        filter: NoteFilter,
        offset: i32,
        max_notes: i32,
    ) -> ServiceResult<Vec<Note>>;

    async fn get_note(
        &self,
        token: &str,
        guid: &str,
        with_content: bool,
        with_resources_data: bool,
        with_resources_recognition: bool,
        with_resources_alternate_data: bool,
    ) -> ServiceResult<Note>;

    async fn update_note(&self, token: &str, note: Note) -> ServiceResult<Note>;

    async fn create_note(&self, token: &str, note: Note) -> ServiceResult<Note>;

    /// Request a share key for the note with the given guid.
    async fn share_note(&self, token: &str, guid: &str) -> ServiceResult<String>;

    /// The title constraints the service advertises. Stubs and clients
    /// without a limits call fall back to the published defaults.
    fn limits(&self) -> NoteLimits {
        NoteLimits::default()
    }
}

/// Builds a note-store client bound to a decomposed endpoint.
///
/// A fresh client is constructed for every call; construction must be
/// cheap and must not itself touch the network.
pub trait RpcConnector {
    type Client: NoteStoreRpc;

    fn connect(&self, endpoint: &Endpoint) -> Self::Client;
}
