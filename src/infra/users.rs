//! Account storage in a TOML file.
//!
//! ```toml
//! [[users]]
//! username = "admin"
//! email = "root@localhost"
//! role = "admin"
//! salt = "…"
//! hash = "…"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::application::repos::{StoreError, UserRepo};
use crate::cache::RecoverPoison;
use crate::domain::users::UserRecord;

const SOURCE: &str = "infra::users";

#[derive(Debug, Default, Serialize, Deserialize)]
struct UsersFile {
    #[serde(default)]
    users: Vec<UserRecord>,
}

/// Users kept in memory and written back to disk on every change.
#[derive(Debug)]
pub struct TomlUserStore {
    path: PathBuf,
    users: RwLock<BTreeMap<String, UserRecord>>,
}

impl TomlUserStore {
    /// Load users from `path`. A missing file is an empty store.
    pub fn open(path: PathBuf) -> Result<Self, StoreError> {
        let users = match fs::read_to_string(&path) {
            Ok(text) => {
                let file: UsersFile = toml::from_str(&text)
                    .map_err(|err| StoreError::corrupt(format!("{}: {err}", path.display())))?;
                file.users
                    .into_iter()
                    .map(|user| (user.username.clone(), user))
                    .collect()
            }
            Err(err) if err.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(StoreError::Io(err)),
        };

        Ok(Self {
            path,
            users: RwLock::new(users),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, users: &BTreeMap<String, UserRecord>) -> Result<(), StoreError> {
        let file = UsersFile {
            users: users.values().cloned().collect(),
        };
        let text = toml::to_string(&file).map_err(|err| StoreError::corrupt(err.to_string()))?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;
        let mut staged = NamedTempFile::new_in(&dir)?;
        staged.write_all(text.as_bytes())?;
        staged
            .persist(&self.path)
            .map_err(|err| StoreError::Io(err.error))?;
        Ok(())
    }
}

impl UserRepo for TomlUserStore {
    fn find(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self
            .users
            .read()
            .recover(SOURCE, "find")
            .get(username)
            .cloned())
    }

    fn save(&self, user: UserRecord) -> Result<(), StoreError> {
        let mut users = self.users.write().recover(SOURCE, "save");
        users.insert(user.username.clone(), user);
        self.persist(&users)
    }

    fn reset(&self) -> Result<(), StoreError> {
        let mut users = self.users.write().recover(SOURCE, "reset");
        users.clear();
        self.persist(&users)
    }
}
