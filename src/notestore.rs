use regex::Regex;
use tracing::{debug, warn};

use crate::endpoint::Endpoint;
use crate::enml;
use crate::error::normalize;
use crate::models::{Note, NoteFilter, NoteLimits, NoteSortOrder, Notebook};
use crate::rpc::{NoteStoreRpc, RpcConnector};
use crate::{Error, FlowError, Result, ServiceError, Session};

/// Authenticated wrapper over the note-store RPC client.
///
/// Every operation follows the same protocol: decompose the session's
/// note-store URL, build a fresh client for it, invoke the remote call
/// with the stored access token, then record either the operation's
/// success message or the normalized failure in the session. Failures are
/// terminal for the operation; nothing is retried.
pub struct NoteStore<C> {
    connector: C,
}

impl<C> NoteStore<C>
where
    C: RpcConnector,
{
    pub fn new(connector: C) -> Self {
        NoteStore { connector }
    }

    /// A client bound to the session's note-store endpoint, plus the
    /// endpoint itself and the access token. Fails before any connection
    /// attempt when the session lacks token credentials.
    fn client_for(&self, session: &Session) -> Result<(C::Client, Endpoint, String)> {
        let token = session
            .access_token
            .clone()
            .ok_or(FlowError::NotAuthenticated)?;
        let url = session
            .note_store_url
            .as_deref()
            .ok_or(FlowError::NotAuthenticated)?;
        let endpoint = Endpoint::parse(url)?;
        debug!(host = %endpoint.host, port = endpoint.port, "connecting note-store client");
        let client = self.connector.connect(&endpoint);
        Ok((client, endpoint, token))
    }

    fn fail<T>(&self, session: &mut Session, operation: &str, err: Error) -> Result<T> {
        let message = normalize(operation, &err);
        warn!("{}", message);
        session.set_error(message);
        Err(err)
    }

    /// Fetch all notebooks of the authenticated user. An empty list is a
    /// valid result, distinct from failure. The notebook names are cached
    /// in the session as a side effect.
    pub async fn list_notebooks(&self, session: &mut Session) -> Result<Vec<Notebook>> {
        let result: Result<Vec<Notebook>> = async {
            let (client, _, token) = self.client_for(session)?;
            Ok(client.list_notebooks(&token).await?)
        }
        .await;
        match result {
            Ok(notebooks) => {
                session.cached_notebook_names =
                    notebooks.iter().map(|n| n.name.clone()).collect();
                session.set_status("Successfully listed content owner's notebooks");
                Ok(notebooks)
            }
            Err(err) => self.fail(session, "listNotebooks", err),
        }
    }

    /// Create a notebook; `stack` optionally places it in a grouping.
    pub async fn create_notebook(
        &self,
        session: &mut Session,
        name: &str,
        stack: Option<&str>,
    ) -> Result<Notebook> {
        let result: Result<Notebook> = async {
            let (client, _, token) = self.client_for(session)?;
            let notebook = Notebook {
                guid: None,
                name: name.to_string(),
                stack: stack.map(str::to_string),
            };
            Ok(client.create_notebook(&token, notebook).await?)
        }
        .await;
        match result {
            Ok(notebook) => {
                session.set_status("Successfully created a new notebook");
                Ok(notebook)
            }
            Err(err) => self.fail(session, "createNotebook", err),
        }
    }

    /// Page through a notebook's notes, always sorted by creation time
    /// ascending. `offset` and `max_notes` bound the page; anything further
    /// is left to the service to enforce.
    pub async fn find_notes_by_notebook(
        &self,
        session: &mut Session,
        notebook_guid: &str,
        offset: i32,
        max_notes: i32,
    ) -> Result<Vec<Note>> {
        let result: Result<Vec<Note>> = async {
            let (client, _, token) = self.client_for(session)?;
            let filter = NoteFilter {
                notebook_guid: Some(notebook_guid.to_string()),
                order: NoteSortOrder::Created,
                ascending: true,
            };
            Ok(client.find_notes(&token, filter, offset, max_notes).await?)
        }
        .await;
        match result {
            Ok(notes) => {
                session.set_status("Successfully found requested notes");
                Ok(notes)
            }
            Err(err) => self.fail(session, "findNotes", err),
        }
    }

    /// Fetch a note; the flags independently control which optional payload
    /// sections the service includes.
    pub async fn get_note(
        &self,
        session: &mut Session,
        guid: &str,
        with_content: bool,
        with_resources_data: bool,
        with_resources_recognition: bool,
        with_resources_alternate_data: bool,
    ) -> Result<Note> {
        let result: Result<Note> = async {
            let (client, _, token) = self.client_for(session)?;
            Ok(client
                .get_note(
                    &token,
                    guid,
                    with_content,
                    with_resources_data,
                    with_resources_recognition,
                    with_resources_alternate_data,
                )
                .await?)
        }
        .await;
        match result {
            Ok(note) => {
                session.set_status("Successfully retrieved note");
                Ok(note)
            }
            Err(err) => self.fail(session, "getNote", err),
        }
    }

    /// Push the full note object as given; the caller is responsible for
    /// the correctness of every field.
    pub async fn update_note(&self, session: &mut Session, note: Note) -> Result<Note> {
        let result: Result<Note> = async {
            let (client, _, token) = self.client_for(session)?;
            Ok(client.update_note(&token, note).await?)
        }
        .await;
        match result {
            Ok(updated) => {
                session.set_status("Successfully updated note");
                Ok(updated)
            }
            Err(err) => self.fail(session, "updateNote", err),
        }
    }

    /// Move a note to another notebook.
    ///
    /// This is a full update with the notebook field rewritten locally,
    /// not an atomic move; the service offers no move primitive here.
    pub async fn move_note(
        &self,
        session: &mut Session,
        note: Note,
        to_notebook_guid: &str,
    ) -> Result<Note> {
        let result: Result<Note> = async {
            let (client, _, token) = self.client_for(session)?;
            let mut moved = note;
            moved.notebook_guid = Some(to_notebook_guid.to_string());
            Ok(client.update_note(&token, moved).await?)
        }
        .await;
        match result {
            Ok(updated) => {
                session.set_status("Successfully moved note");
                Ok(updated)
            }
            Err(err) => self.fail(session, "moveNote", err),
        }
    }

    /// Request a share key for the note and derive the public sharing URL.
    ///
    /// The shard identifier comes from the third segment of the note-store
    /// path; this is a brittle path-layout contract with the service.
    pub async fn shared_note_url(&self, session: &mut Session, guid: &str) -> Result<String> {
        let result: Result<String> = async {
            let (client, endpoint, token) = self.client_for(session)?;
            let share_key = client.share_note(&token, guid).await?;
            let shard = endpoint
                .shard_id()
                .ok_or_else(|| Error::BadEndpoint(format!("no shard segment in {}", endpoint.path)))?;
            Ok(format!(
                "https://{}/shard/{}/sh/{}/{}",
                endpoint.host, shard, guid, share_key
            ))
        }
        .await;
        match result {
            Ok(url) => {
                session.set_status("Successfully retrieved shared note url");
                Ok(url)
            }
            Err(err) => self.fail(session, "shareNote", err),
        }
    }

    /// Create a note from a title and plain-text content.
    ///
    /// The title is validated against the service-advertised constraints
    /// before anything goes over the wire; the content is wrapped in the
    /// minimal markup envelope. With no `notebook_guid` the service files
    /// the note in the default notebook.
    pub async fn create_simple_note(
        &self,
        session: &mut Session,
        title: &str,
        content: &str,
        notebook_guid: Option<&str>,
    ) -> Result<Note> {
        let result: Result<Note> = async {
            let (client, _, token) = self.client_for(session)?;
            validate_title(title, &client.limits())?;
            let note = Note {
                guid: None,
                title: title.to_string(),
                content: Some(enml::wrap_plain_text(content)),
                notebook_guid: notebook_guid.map(str::to_string),
            };
            Ok(client.create_note(&token, note).await?)
        }
        .await;
        match result {
            Ok(created) => {
                session.set_status(format!(
                    "Successfully created new note with GUID: {}",
                    created.guid.as_deref().unwrap_or_default()
                ));
                Ok(created)
            }
            Err(err) => self.fail(session, "createNote", err),
        }
    }
}

fn validate_title(title: &str, limits: &NoteLimits) -> Result<()> {
    let pattern = Regex::new(&limits.title_regex)
        .map_err(|e| ServiceError::other(format!("service advertised a bad title pattern: {}", e)))?;
    let len = title.len();
    if len < limits.title_len_min || len > limits.title_len_max || !pattern.is_match(title) {
        return Err(ServiceError::other(format!("Invalid note title: {}", title)).into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use async_trait::async_trait;

    use super::*;
    use crate::{ServiceErrorKind, ServiceResult};

    #[derive(Default)]
    struct Recorder {
        calls: Vec<&'static str>,
        endpoints: Vec<Endpoint>,
        last_token: Option<String>,
        last_notebook: Option<Notebook>,
        last_note: Option<Note>,
        last_filter: Option<NoteFilter>,
        last_flags: Option<(bool, bool, bool, bool)>,
    }

    #[derive(Default)]
    struct StubConnector {
        recorder: Rc<RefCell<Recorder>>,
        notebooks: Vec<Notebook>,
        notes: Vec<Note>,
        share_key: String,
        fail_with: Option<ServiceError>,
    }

    struct StubRpc {
        recorder: Rc<RefCell<Recorder>>,
        notebooks: Vec<Notebook>,
        notes: Vec<Note>,
        share_key: String,
        fail_with: Option<ServiceError>,
    }

    impl RpcConnector for StubConnector {
        type Client = StubRpc;

        fn connect(&self, endpoint: &Endpoint) -> StubRpc {
            self.recorder.borrow_mut().endpoints.push(endpoint.clone());
            StubRpc {
                recorder: Rc::clone(&self.recorder),
                notebooks: self.notebooks.clone(),
                notes: self.notes.clone(),
                share_key: self.share_key.clone(),
                fail_with: self.fail_with.clone(),
            }
        }
    }

    impl StubRpc {
        fn record(&self, call: &'static str, token: &str) -> ServiceResult<()> {
            let mut recorder = self.recorder.borrow_mut();
            recorder.calls.push(call);
            recorder.last_token = Some(token.to_string());
            match &self.fail_with {
                Some(err) => Err(err.clone()),
                None => Ok(()),
            }
        }
    }

    #[async_trait(?Send)]
    impl NoteStoreRpc for StubRpc {
        async fn list_notebooks(&self, token: &str) -> ServiceResult<Vec<Notebook>> {
            self.record("list_notebooks", token)?;
            Ok(self.notebooks.clone())
        }

        async fn create_notebook(
            &self,
            token: &str,
            notebook: Notebook,
        ) -> ServiceResult<Notebook> {
            self.record("create_notebook", token)?;
            let mut created = notebook;
            created.guid = Some("nb-guid".to_string());
            self.recorder.borrow_mut().last_notebook = Some(created.clone());
            Ok(created)
        }

        async fn find_notes(
            &self,
            token: &str,
            filter: NoteFilter,
            _offset: i32,
            _max_notes: i32,
        ) -> ServiceResult<Vec<Note>> {
            self.record("find_notes", token)?;
            self.recorder.borrow_mut().last_filter = Some(filter);
            Ok(self.notes.clone())
        }

        async fn get_note(
            &self,
            token: &str,
            guid: &str,
            with_content: bool,
            with_resources_data: bool,
            with_resources_recognition: bool,
            with_resources_alternate_data: bool,
        ) -> ServiceResult<Note> {
            self.record("get_note", token)?;
            self.recorder.borrow_mut().last_flags = Some((
                with_content,
                with_resources_data,
                with_resources_recognition,
                with_resources_alternate_data,
            ));
            Ok(Note {
                guid: Some(guid.to_string()),
                ..Note::default()
            })
        }

        async fn update_note(&self, token: &str, note: Note) -> ServiceResult<Note> {
            self.record("update_note", token)?;
            self.recorder.borrow_mut().last_note = Some(note.clone());
            Ok(note)
        }

        async fn create_note(&self, token: &str, note: Note) -> ServiceResult<Note> {
            self.record("create_note", token)?;
            let mut created = note;
            created.guid = Some("new-guid".to_string());
            self.recorder.borrow_mut().last_note = Some(created.clone());
            Ok(created)
        }

        async fn share_note(&self, token: &str, _guid: &str) -> ServiceResult<String> {
            self.record("share_note", token)?;
            Ok(self.share_key.clone())
        }
    }

    fn authenticated_session() -> Session {
        let mut session = Session::new();
        session.access_token = Some("access-token".to_string());
        session.note_store_url = Some("https://notes.example.com/edam/note/s1/".to_string());
        session
    }

    fn store_with(connector: StubConnector) -> (NoteStore<StubConnector>, Rc<RefCell<Recorder>>) {
        let recorder = Rc::clone(&connector.recorder);
        (NoteStore::new(connector), recorder)
    }

    #[tokio::test]
    async fn list_notebooks_caches_names_and_sets_status() {
        let (store, _recorder) = store_with(StubConnector {
            notebooks: vec![Notebook::named("Inbox"), Notebook::named("Archive")],
            ..StubConnector::default()
        });
        let mut session = authenticated_session();

        let notebooks = store.list_notebooks(&mut session).await.unwrap();
        assert_eq!(notebooks.len(), 2);
        assert_eq!(
            session.cached_notebook_names,
            vec!["Inbox".to_string(), "Archive".to_string()]
        );
        assert_eq!(
            session.status(),
            Some("Successfully listed content owner's notebooks")
        );
    }

    #[tokio::test]
    async fn empty_notebook_list_is_success() {
        let (store, _recorder) = store_with(StubConnector::default());
        let mut session = authenticated_session();

        let notebooks = store.list_notebooks(&mut session).await.unwrap();
        assert!(notebooks.is_empty());
        assert_eq!(session.last_error(), None);
        assert_eq!(
            session.status(),
            Some("Successfully listed content owner's notebooks")
        );
    }

    #[tokio::test]
    async fn remote_failure_is_normalized() {
        let (store, _recorder) = store_with(StubConnector {
            fail_with: Some(ServiceError::new(
                ServiceErrorKind::User,
                8,
                "authenticationToken",
            )),
            ..StubConnector::default()
        });
        let mut session = authenticated_session();

        assert!(store.list_notebooks(&mut session).await.is_err());
        assert_eq!(
            session.last_error(),
            Some("listNotebooks error: INVALID_AUTH: authenticationToken")
        );
        assert!(session.cached_notebook_names.is_empty());
    }

    #[tokio::test]
    async fn connector_receives_the_decomposed_endpoint() {
        let (store, recorder) = store_with(StubConnector::default());
        let mut session = authenticated_session();

        store.list_notebooks(&mut session).await.unwrap();
        let recorder = recorder.borrow();
        assert_eq!(recorder.endpoints.len(), 1);
        let endpoint = &recorder.endpoints[0];
        assert_eq!(endpoint.host, "notes.example.com");
        assert_eq!(endpoint.port, 443);
        assert_eq!(endpoint.path, "/edam/note/s1/");
        assert_eq!(recorder.last_token.as_deref(), Some("access-token"));
    }

    #[tokio::test]
    async fn unauthenticated_session_fails_before_connecting() {
        let (store, recorder) = store_with(StubConnector::default());
        let mut session = Session::new();

        assert!(store.list_notebooks(&mut session).await.is_err());
        assert!(recorder.borrow().endpoints.is_empty());
        assert_eq!(
            session.last_error(),
            Some("listNotebooks error: session has no token credentials")
        );
    }

    #[tokio::test]
    async fn create_notebook_with_and_without_stack() {
        let (store, recorder) = store_with(StubConnector::default());
        let mut session = authenticated_session();

        let plain = store
            .create_notebook(&mut session, "Inbox", None)
            .await
            .unwrap();
        assert_eq!(plain.stack, None);

        let stacked = store
            .create_notebook(&mut session, "Work", Some("Projects"))
            .await
            .unwrap();
        assert_eq!(stacked.stack.as_deref(), Some("Projects"));
        assert_eq!(stacked.guid.as_deref(), Some("nb-guid"));
        assert_eq!(
            recorder.borrow().last_notebook.as_ref().unwrap().name,
            "Work"
        );
        assert_eq!(session.status(), Some("Successfully created a new notebook"));
    }

    #[tokio::test]
    async fn find_notes_always_orders_by_created_ascending() {
        let (store, recorder) = store_with(StubConnector::default());
        let mut session = authenticated_session();

        store
            .find_notes_by_notebook(&mut session, "nb-guid", 0, 50)
            .await
            .unwrap();
        let filter = recorder.borrow().last_filter.clone().unwrap();
        assert_eq!(filter.notebook_guid.as_deref(), Some("nb-guid"));
        assert_eq!(filter.order, NoteSortOrder::Created);
        assert!(filter.ascending);
        assert_eq!(session.status(), Some("Successfully found requested notes"));
    }

    #[tokio::test]
    async fn get_note_forwards_the_payload_flags() {
        let (store, recorder) = store_with(StubConnector::default());
        let mut session = authenticated_session();

        store
            .get_note(&mut session, "g1", true, false, true, false)
            .await
            .unwrap();
        assert_eq!(
            recorder.borrow().last_flags,
            Some((true, false, true, false))
        );
        assert_eq!(session.status(), Some("Successfully retrieved note"));
    }

    #[tokio::test]
    async fn move_note_rewrites_the_notebook_and_updates() {
        let (store, recorder) = store_with(StubConnector::default());
        let mut session = authenticated_session();

        let note = Note {
            guid: Some("g1".to_string()),
            title: "t".to_string(),
            content: None,
            notebook_guid: Some("old".to_string()),
        };
        let moved = store.move_note(&mut session, note, "new").await.unwrap();
        assert_eq!(moved.notebook_guid.as_deref(), Some("new"));
        assert_eq!(recorder.borrow().calls, vec!["update_note"]);
        assert_eq!(session.status(), Some("Successfully moved note"));
    }

    #[tokio::test]
    async fn shared_note_url_has_the_fixed_layout() {
        let (store, _recorder) = store_with(StubConnector {
            share_key: "k1".to_string(),
            ..StubConnector::default()
        });
        let mut session = authenticated_session();

        let url = store.shared_note_url(&mut session, "g1").await.unwrap();
        assert_eq!(url, "https://notes.example.com/shard/s1/sh/g1/k1");
        assert_eq!(
            session.status(),
            Some("Successfully retrieved shared note url")
        );
    }

    #[tokio::test]
    async fn shared_note_url_fails_on_shallow_paths() {
        let (store, _recorder) = store_with(StubConnector {
            share_key: "k1".to_string(),
            ..StubConnector::default()
        });
        let mut session = authenticated_session();
        session.note_store_url = Some("https://notes.example.com/edam".to_string());

        assert!(store.shared_note_url(&mut session, "g1").await.is_err());
        assert!(session.last_error().unwrap().starts_with("shareNote error:"));
    }

    #[tokio::test]
    async fn create_simple_note_rejects_bad_titles_before_any_call() {
        let (store, recorder) = store_with(StubConnector::default());
        let mut session = authenticated_session();

        for bad in &[
            "".to_string(),
            " leading space".to_string(),
            "x".repeat(256),
        ] {
            assert!(store
                .create_simple_note(&mut session, bad, "content", None)
                .await
                .is_err());
        }
        assert!(recorder.borrow().calls.is_empty());
        assert!(session
            .last_error()
            .unwrap()
            .starts_with("createNote error: Invalid note title:"));
    }

    #[tokio::test]
    async fn create_simple_note_wraps_content_and_reports_guid() {
        let (store, recorder) = store_with(StubConnector::default());
        let mut session = authenticated_session();

        let created = store
            .create_simple_note(&mut session, "Shopping list", "line1\nline2", Some("nb"))
            .await
            .unwrap();
        assert_eq!(created.guid.as_deref(), Some("new-guid"));
        let recorder = recorder.borrow();
        let sent = recorder.last_note.as_ref().unwrap();
        let content = sent.content.as_deref().unwrap();
        assert!(content.starts_with(enml::DOCUMENT_HEADER));
        assert!(content.contains("line1<br />\nline2"));
        assert!(content.ends_with(enml::DOCUMENT_FOOTER));
        assert_eq!(sent.notebook_guid.as_deref(), Some("nb"));
        assert_eq!(
            session.status(),
            Some("Successfully created new note with GUID: new-guid")
        );
    }

    #[tokio::test]
    async fn create_simple_note_without_notebook_uses_service_default() {
        let (store, recorder) = store_with(StubConnector::default());
        let mut session = authenticated_session();

        store
            .create_simple_note(&mut session, "Untitled thoughts", "hi", None)
            .await
            .unwrap();
        assert_eq!(
            recorder.borrow().last_note.as_ref().unwrap().notebook_guid,
            None
        );
    }

    #[tokio::test]
    async fn each_operation_builds_a_fresh_client() {
        let (store, recorder) = store_with(StubConnector::default());
        let mut session = authenticated_session();

        store.list_notebooks(&mut session).await.unwrap();
        store.list_notebooks(&mut session).await.unwrap();
        assert_eq!(recorder.borrow().endpoints.len(), 2);
    }

    mod end_to_end {
        use std::collections::HashMap;

        use super::*;
        use crate::{
            AuthorizationSigner, CallbackTarget, OAuthEndpoints, OAuthFlow, TokenResponse,
        };

        struct GrantingSigner;

        #[async_trait(?Send)]
        impl AuthorizationSigner for GrantingSigner {
            async fn obtain_temporary_credentials(
                &self,
                _endpoint: &str,
                _callback_url: &str,
            ) -> crate::Result<TokenResponse> {
                Ok(TokenResponse {
                    oauth_token: "tmp-token".to_string(),
                    oauth_token_secret: "tmp-secret".to_string(),
                    remain: HashMap::new(),
                })
            }

            async fn exchange_token_credentials(
                &self,
                _endpoint: &str,
                token: &str,
                _token_secret: &str,
                verifier: &str,
            ) -> crate::Result<TokenResponse> {
                assert_eq!(token, "tmp-token");
                assert_eq!(verifier, "v");
                let remain = vec![(
                    "edam_noteStoreUrl".to_string(),
                    "https://notes.example.com/edam/note/s1/".to_string(),
                )]
                .into_iter()
                .collect();
                Ok(TokenResponse {
                    oauth_token: "access-token".to_string(),
                    oauth_token_secret: "access-secret".to_string(),
                    remain,
                })
            }
        }

        #[tokio::test]
        async fn authorize_then_list_notebooks() {
            let signer = GrantingSigner;
            let flow = OAuthFlow::new(
                &signer,
                OAuthEndpoints {
                    temporary_credentials_url: "https://auth.example.com/oauth".to_string(),
                    authorization_url: "https://auth.example.com/OAuth.action".to_string(),
                    token_credentials_url: "https://auth.example.com/oauth".to_string(),
                },
                CallbackTarget {
                    secure: true,
                    host: "app.example.com".to_string(),
                    port: 443,
                },
            );
            let mut session = Session::new();

            flow.begin_authorization(&mut session, "/index.php")
                .await
                .unwrap();
            flow.complete_authorization(&mut session, "oauth_verifier=v")
                .unwrap();
            flow.exchange_for_token_credentials(&mut session)
                .await
                .unwrap();

            let (store, _recorder) = store_with(StubConnector {
                notebooks: vec![Notebook::named("Inbox"), Notebook::named("Travel")],
                ..StubConnector::default()
            });
            let notebooks = store.list_notebooks(&mut session).await.unwrap();
            let names: Vec<&str> = notebooks.iter().map(|n| n.name.as_str()).collect();
            assert_eq!(names, vec!["Inbox", "Travel"]);
            assert_eq!(
                session.cached_notebook_names,
                vec!["Inbox".to_string(), "Travel".to_string()]
            );
            assert_eq!(
                session.status(),
                Some("Successfully listed content owner's notebooks")
            );
        }
    }
}
