//! File-backed document store.
//!
//! ## Storage Layout
//!
//! ```text
//! <data_dir>/
//!   patients/<s1>/<s2>/<id>.yaml
//!   staff/<s1>/<s2>/<id>.yaml
//!   vitals/<s1>/<s2>/<id>.yaml
//!   alerts/<s1>/<s2>/<id>.yaml
//! ```
//!
//! where `s1` and `s2` are the first four hex characters of the record id. Writes land in a
//! temporary sibling file first and are renamed into place, so readers never observe a
//! half-written document.

use super::store::{Collection, DocumentStore, StoreError, StoreResult};
use crate::constants::DOCUMENT_EXTENSION;
use medairon_uuid::RecordId;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open (creating if needed) a store rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DirCreation` if the root directory cannot be created.
    pub fn open(root: &Path) -> StoreResult<Self> {
        fs::create_dir_all(root).map_err(StoreError::DirCreation)?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    fn document_path(&self, collection: Collection, id: &RecordId) -> PathBuf {
        id.sharded_file(&self.root.join(collection.dir_name()), DOCUMENT_EXTENSION)
    }
}

impl DocumentStore for FileStore {
    fn put(&self, collection: Collection, id: &RecordId, body: &str) -> StoreResult<()> {
        let path = self.document_path(collection, id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(StoreError::DirCreation)?;
        }

        let tmp = path.with_extension(format!("{DOCUMENT_EXTENSION}.tmp"));
        fs::write(&tmp, body).map_err(StoreError::FileWrite)?;
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(StoreError::FileWrite(e));
        }
        Ok(())
    }

    fn get(&self, collection: Collection, id: &RecordId) -> StoreResult<Option<String>> {
        let path = self.document_path(collection, id);
        match fs::read_to_string(&path) {
            Ok(body) => Ok(Some(body)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::FileRead(e)),
        }
    }

    fn list(&self, collection: Collection) -> StoreResult<Vec<String>> {
        let base = self.root.join(collection.dir_name());
        let mut bodies = Vec::new();

        let s1_iter = match fs::read_dir(&base) {
            Ok(it) => it,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(bodies),
            Err(e) => return Err(StoreError::FileRead(e)),
        };

        for s1 in s1_iter.flatten() {
            let s1_path = s1.path();
            if !s1_path.is_dir() {
                continue;
            }

            let s2_iter = match fs::read_dir(&s1_path) {
                Ok(it) => it,
                Err(_) => continue,
            };

            for s2 in s2_iter.flatten() {
                let s2_path = s2.path();
                if !s2_path.is_dir() {
                    continue;
                }

                let doc_iter = match fs::read_dir(&s2_path) {
                    Ok(it) => it,
                    Err(_) => continue,
                };

                for doc in doc_iter.flatten() {
                    let doc_path = doc.path();
                    let is_document = doc_path.is_file()
                        && doc_path.extension().and_then(|e| e.to_str())
                            == Some(DOCUMENT_EXTENSION);
                    if !is_document {
                        continue;
                    }

                    match fs::read_to_string(&doc_path) {
                        Ok(body) => bodies.push(body),
                        Err(e) => {
                            tracing::warn!("failed to read document {}: {}", doc_path.display(), e)
                        }
                    }
                }
            }
        }

        Ok(bodies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn put_writes_sharded_yaml_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = FileStore::open(temp_dir.path()).unwrap();
        let id = RecordId::parse("ab12cd34ef56ab12cd34ef56ab12cd34").unwrap();

        store.put(Collection::Alerts, &id, "title: x\n").unwrap();

        let expected = temp_dir
            .path()
            .join("alerts")
            .join("ab")
            .join("12")
            .join("ab12cd34ef56ab12cd34ef56ab12cd34.yaml");
        assert!(expected.is_file());
        assert!(!expected.with_extension("yaml.tmp").exists());
    }

    #[test]
    fn get_returns_none_for_missing_document() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = FileStore::open(temp_dir.path()).unwrap();
        assert!(store
            .get(Collection::Patients, &RecordId::new())
            .unwrap()
            .is_none());
    }

    #[test]
    fn put_replaces_existing_document() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = FileStore::open(temp_dir.path()).unwrap();
        let id = RecordId::new();

        store.put(Collection::Staff, &id, "v: 1\n").unwrap();
        store.put(Collection::Staff, &id, "v: 2\n").unwrap();

        assert_eq!(
            store.get(Collection::Staff, &id).unwrap().as_deref(),
            Some("v: 2\n")
        );
        assert_eq!(store.list(Collection::Staff).unwrap().len(), 1);
    }

    #[test]
    fn list_is_scoped_to_collection() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = FileStore::open(temp_dir.path()).unwrap();

        for _ in 0..3 {
            store.put(Collection::Vitals, &RecordId::new(), "v: 1\n").unwrap();
        }
        store.put(Collection::Alerts, &RecordId::new(), "a: 1\n").unwrap();

        assert_eq!(store.list(Collection::Vitals).unwrap().len(), 3);
        assert_eq!(store.list(Collection::Alerts).unwrap().len(), 1);
        assert!(store.list(Collection::Patients).unwrap().is_empty());
    }
}
