//! Storage traits describing persistence adapters.
//!
//! Both stores are synchronous: callers on the async runtime move work onto
//! the blocking pool before touching them.

use std::time::SystemTime;

use thiserror::Error;

use crate::domain::pages::PageName;
use crate::domain::users::UserRecord;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no source exists for `{name}`")]
    NotFound { name: String },
    #[error("storage i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored data is corrupt: {message}")]
    Corrupt { message: String },
}

impl StoreError {
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::Corrupt {
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Raw page sources addressed by logical page name.
pub trait PageStore: Send + Sync {
    /// Read the full source of `name`.
    fn read(&self, name: &PageName) -> Result<Vec<u8>, StoreError>;

    /// Replace the source of `name`. Readers never observe a partial write.
    fn write(&self, name: &PageName, contents: &[u8]) -> Result<(), StoreError>;

    /// Last modification time of the source of `name`.
    fn mod_time(&self, name: &PageName) -> Result<SystemTime, StoreError>;
}

/// Account storage used by the login layer.
pub trait UserRepo: Send + Sync {
    fn find(&self, username: &str) -> Result<Option<UserRecord>, StoreError>;

    fn save(&self, user: UserRecord) -> Result<(), StoreError>;

    /// Drop every stored account.
    fn reset(&self) -> Result<(), StoreError>;
}
