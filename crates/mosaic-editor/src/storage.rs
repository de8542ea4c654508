//! Remote file store seam.
//!
//! The concrete provider lives with the host; the engine only needs to list,
//! read, and write named files. Helpers here drive a save or an open against
//! any [`RemoteStore`] and fold the outcome into the session, the auto-save
//! state, and the sign-in state.

use crate::autosave::AutoSave;
use crate::session::{ProjectSession, SessionError};
use mosaic_core::{LoadError, from_json, to_json};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("authorization expired")]
    Unauthorized,
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store rejected the request (status {status})")]
    Rejected { status: u16 },
}

impl StoreError {
    /// Classify an HTTP-style status code. Status 0 means the request never
    /// reached the store.
    pub fn from_status(status: u16, message: &str) -> Self {
        match status {
            401 => StoreError::Unauthorized,
            0 | 408 | 429 | 500..=599 => StoreError::Unavailable(if message.is_empty() {
                format!("status {status}")
            } else {
                message.to_string()
            }),
            _ => StoreError::Rejected { status },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteFile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub modified_time: Option<String>,
}

/// A remote file store.
#[allow(async_fn_in_trait)]
pub trait RemoteStore {
    /// Files whose name matches `query`.
    async fn list(&self, query: &str) -> Result<Vec<RemoteFile>, StoreError>;

    async fn read(&self, id: &str) -> Result<String, StoreError>;

    /// Create (`id == None`) or overwrite a file. Returns its id.
    async fn write(&self, id: Option<&str>, name: &str, content: &str) -> Result<String, StoreError>;
}

/// Sign-in state as far as the engine cares.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuthState {
    pub signed_in: bool,
    /// Set when a request came back unauthorized; cleared by signing in.
    pub needs_reauth: bool,
}

impl AuthState {
    pub fn sign_in(&mut self) {
        self.signed_in = true;
        self.needs_reauth = false;
    }

    /// Authorization expired: sign out and ask for a fresh sign-in.
    pub fn expire(&mut self) {
        if self.signed_in {
            log::warn!("storage: authorization expired, signing out");
        }
        self.signed_in = false;
        self.needs_reauth = true;
    }

    /// Fold a store error into the sign-in state.
    pub fn observe(&mut self, err: &StoreError) {
        if *err == StoreError::Unauthorized {
            self.expire();
        }
    }
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("could not encode project: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum OpenError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Load(#[from] LoadError),
}

/// Write every unsaved project to the store, or the active one when nothing
/// is pending. The caller must have started the attempt
/// (`AutoSave::poll` or `AutoSave::start_now`); it is completed here, and
/// only reports synced once no project is left unsaved. Returns the number
/// of files written.
pub async fn save_pending<S: RemoteStore>(
    store: &S,
    session: &mut ProjectSession,
    autosave: &mut AutoSave,
    auth: &mut AuthState,
    now: f64,
    epoch_ms: u64,
) -> Result<usize, SaveError> {
    let fail = |autosave: &mut AutoSave, err: StoreError| {
        autosave.complete(Err(&err), now);
        err
    };
    if !auth.signed_in {
        return Err(fail(autosave, StoreError::Unauthorized).into());
    }

    let mut written = 0;
    loop {
        let record = match session.take_save_target() {
            Ok(record) => record,
            Err(err) => {
                autosave.complete(Err(&StoreError::Unavailable(err.to_string())), now);
                return Err(err.into());
            }
        };
        let project = record.id;
        let remote_id = record.remote_id.clone();
        let name = record.file_name();
        let json = match to_json(record) {
            Ok(json) => json,
            Err(err) => {
                session.mark_unsaved(project);
                autosave.complete(Err(&StoreError::Unavailable(err.to_string())), now);
                return Err(err.into());
            }
        };

        match store.write(remote_id.as_deref(), &name, &json).await {
            Ok(id) => {
                log::debug!("storage: saved {project} as {id}");
                session.mark_saved(project, &id, epoch_ms);
                written += 1;
            }
            Err(err) => {
                session.mark_unsaved(project);
                auth.observe(&err);
                return Err(fail(autosave, err).into());
            }
        }
        if !session.has_unsaved() {
            break;
        }
    }
    autosave.complete(Ok(()), now);
    Ok(written)
}

/// Read a project file from the store and open it in the session.
pub async fn open_remote<S: RemoteStore>(
    store: &S,
    session: &mut ProjectSession,
    auth: &mut AuthState,
    id: &str,
) -> Result<usize, OpenError> {
    let text = store.read(id).await.inspect_err(|err| auth.observe(err))?;
    let mut record = from_json(&text)?;
    record.remote_id = Some(id.to_string());
    Ok(session.open_project(record))
}
