//! Filesystem-backed page sources: `<root>/<name>.md`.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tempfile::NamedTempFile;

use crate::application::repos::{PageStore, StoreError};
use crate::domain::pages::PageName;

const PAGE_EXTENSION: &str = "md";

#[derive(Debug)]
pub struct FsPageStore {
    root: PathBuf,
}

impl FsPageStore {
    /// Open the page directory, creating it if necessary.
    pub fn new(root: PathBuf) -> Result<Self, std::io::Error> {
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of the source for `name`.
    pub fn path_for(&self, name: &PageName) -> PathBuf {
        self.root
            .join(format!("{}.{PAGE_EXTENSION}", name.as_str()))
    }

    fn map_io(name: &PageName, err: std::io::Error) -> StoreError {
        if err.kind() == ErrorKind::NotFound {
            StoreError::not_found(name.as_str())
        } else {
            StoreError::Io(err)
        }
    }
}

impl PageStore for FsPageStore {
    fn read(&self, name: &PageName) -> Result<Vec<u8>, StoreError> {
        fs::read(self.path_for(name)).map_err(|err| Self::map_io(name, err))
    }

    fn write(&self, name: &PageName, contents: &[u8]) -> Result<(), StoreError> {
        // Stage next to the target so the final rename stays on one filesystem.
        let mut staged = NamedTempFile::new_in(&self.root)?;
        staged.write_all(contents)?;
        staged.as_file().sync_all()?;
        staged
            .persist(self.path_for(name))
            .map_err(|err| StoreError::Io(err.error))?;
        Ok(())
    }

    fn mod_time(&self, name: &PageName) -> Result<SystemTime, StoreError> {
        fs::metadata(self.path_for(name))
            .and_then(|meta| meta.modified())
            .map_err(|err| Self::map_io(name, err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(value: &str) -> PageName {
        PageName::new(value).expect("valid page name")
    }

    #[test]
    fn write_then_read_returns_contents() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsPageStore::new(dir.path().join("page")).expect("store");

        store.write(&name("home"), b"# Home").expect("write");

        assert_eq!(store.read(&name("home")).expect("read"), b"# Home");
        assert!(dir.path().join("page/home.md").is_file());
    }

    #[test]
    fn overwrite_replaces_previous_contents() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsPageStore::new(dir.path().to_path_buf()).expect("store");

        store.write(&name("home"), b"first version").expect("write");
        store.write(&name("home"), b"second").expect("overwrite");

        assert_eq!(store.read(&name("home")).expect("read"), b"second");
    }

    #[test]
    fn missing_source_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsPageStore::new(dir.path().to_path_buf()).expect("store");

        assert!(store.read(&name("absent")).expect_err("read").is_not_found());
        assert!(
            store
                .mod_time(&name("absent"))
                .expect_err("stat")
                .is_not_found()
        );
    }

    #[test]
    fn write_leaves_no_staging_files_behind() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsPageStore::new(dir.path().to_path_buf()).expect("store");

        store.write(&name("a"), b"x").expect("write");
        store.write(&name("b"), b"y").expect("write");

        let mut files: Vec<_> = fs::read_dir(dir.path())
            .expect("read_dir")
            .map(|entry| entry.expect("entry").file_name())
            .collect();
        files.sort();
        assert_eq!(files, vec!["a.md", "b.md"]);
    }

    #[test]
    fn mod_time_reports_file_mtime() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsPageStore::new(dir.path().to_path_buf()).expect("store");
        store.write(&name("home"), b"x").expect("write");

        let expected = fs::metadata(dir.path().join("home.md"))
            .and_then(|meta| meta.modified())
            .expect("metadata");
        assert_eq!(store.mod_time(&name("home")).expect("stat"), expected);
    }
}
