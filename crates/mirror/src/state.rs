//! Application state shared across handlers.

use std::sync::Arc;

use secrecy::SecretString;

use crate::db::ProductStore;
use crate::services::ProductSyncService;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    sync: ProductSyncService,
    webhook_secret: Option<SecretString>,
}

impl AppState {
    /// Create the state. Without a webhook secret every webhook is rejected.
    #[must_use]
    pub fn new(sync: ProductSyncService, webhook_secret: Option<SecretString>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                sync,
                webhook_secret,
            }),
        }
    }

    #[must_use]
    pub fn sync(&self) -> &ProductSyncService {
        &self.inner.sync
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn ProductStore> {
        self.inner.sync.store()
    }

    /// Shared secret for webhook signatures.
    #[must_use]
    pub fn webhook_secret(&self) -> Option<&SecretString> {
        self.inner.webhook_secret.as_ref()
    }
}
