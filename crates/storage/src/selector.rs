use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use pathway_core::model::{OwnerKey, UserPath};

use crate::repository::{ProgressStore, StorageError};

/// Which backend served the last operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreBackend {
    Remote,
    Local,
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Remote => "remote",
            Self::Local => "local",
        })
    }
}

/// Who is asking: an authenticated user (if any) plus the device key used locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user: Option<OwnerKey>,
    pub device: OwnerKey,
}

impl Identity {
    #[must_use]
    pub fn anonymous(device: OwnerKey) -> Self {
        Self { user: None, device }
    }

    #[must_use]
    pub fn signed_in(user: OwnerKey, device: OwnerKey) -> Self {
        Self {
            user: Some(user),
            device,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Loaded {
    pub paths: Vec<UserPath>,
    pub backend: StoreBackend,
}

/// Routes loads and saves to the remote store when a user is signed in,
/// degrading to the local store when the remote call fails.
///
/// Writes that degrade are not replayed to the remote store later.
pub struct StoreSelector {
    remote: Option<Arc<dyn ProgressStore>>,
    local: Arc<dyn ProgressStore>,
    active: Mutex<StoreBackend>,
}

impl StoreSelector {
    #[must_use]
    pub fn new(remote: Option<Arc<dyn ProgressStore>>, local: Arc<dyn ProgressStore>) -> Self {
        Self {
            remote,
            local,
            active: Mutex::new(StoreBackend::Local),
        }
    }

    #[must_use]
    pub fn local_only(local: Arc<dyn ProgressStore>) -> Self {
        Self::new(None, local)
    }

    /// Backend used by the most recent load or save.
    #[must_use]
    pub fn active_backend(&self) -> StoreBackend {
        *self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn mark(&self, backend: StoreBackend) {
        *self.active.lock().unwrap_or_else(PoisonError::into_inner) = backend;
    }

    fn remote_for<'a>(
        &'a self,
        identity: &'a Identity,
    ) -> Option<(&'a dyn ProgressStore, &'a OwnerKey)> {
        match (&self.remote, &identity.user) {
            (Some(remote), Some(user)) => Some((remote.as_ref(), user)),
            _ => None,
        }
    }

    /// Load the identity's paths.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` only when the local store fails too.
    pub async fn load(&self, identity: &Identity) -> Result<Loaded, StorageError> {
        if let Some((remote, user)) = self.remote_for(identity) {
            match remote.load(user).await {
                Ok(paths) => {
                    self.mark(StoreBackend::Remote);
                    return Ok(Loaded {
                        paths,
                        backend: StoreBackend::Remote,
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        owner = %user,
                        error = %e,
                        "remote load failed, using local store"
                    );
                }
            }
        }

        let paths = self.local.load(&identity.device).await?;
        self.mark(StoreBackend::Local);
        Ok(Loaded {
            paths,
            backend: StoreBackend::Local,
        })
    }

    /// Replace the identity's whole path set, returning the backend that took the write.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` only when the local store fails too.
    pub async fn save(
        &self,
        identity: &Identity,
        paths: &[UserPath],
    ) -> Result<StoreBackend, StorageError> {
        if let Some((remote, user)) = self.remote_for(identity) {
            let result = match remote.ensure_owner(user).await {
                Ok(()) => remote.replace_all(user, paths).await,
                Err(e) => Err(e),
            };
            match result {
                Ok(()) => {
                    self.mark(StoreBackend::Remote);
                    return Ok(StoreBackend::Remote);
                }
                Err(e) => {
                    tracing::warn!(
                        owner = %user,
                        device = %identity.device,
                        error = %e,
                        "remote save failed, writing to local store"
                    );
                }
            }
        }

        self.local.ensure_owner(&identity.device).await?;
        self.local.replace_all(&identity.device, paths).await?;
        self.mark(StoreBackend::Local);
        tracing::debug!(device = %identity.device, paths = paths.len(), "saved to local store");
        Ok(StoreBackend::Local)
    }
}
