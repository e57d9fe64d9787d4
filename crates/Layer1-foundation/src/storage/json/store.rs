//! JSON 파일 저장소
//!
//! One directory, many small JSON documents. Writes go through a sibling
//! `.tmp` file and a rename, so a crash never leaves half a document behind.

use crate::{Error, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};

/// 글로벌/프로젝트 디렉토리 이름
pub const APP_DIR_NAME: &str = "codexec";

/// Directory-scoped JSON document store
#[derive(Debug, Clone)]
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// ~/.config/codexec/
    pub fn global() -> Result<Self> {
        dirs::config_dir()
            .map(|base| Self::new(base.join(APP_DIR_NAME)))
            .ok_or_else(|| Error::Config("No user config directory on this platform".to_string()))
    }

    /// {root}/.codexec/
    pub fn project(root: impl AsRef<Path>) -> Self {
        Self::new(root.as_ref().join(format!(".{}", APP_DIR_NAME)))
    }

    pub fn current_project() -> Result<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| Error::Config(format!("Working directory unavailable: {}", e)))?;
        Ok(Self::project(cwd))
    }

    pub fn base_dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.file_path(name).is_file()
    }

    /// `Ok(None)` when the document does not exist; a corrupt one is an error
    pub fn load_optional<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        let path = self.file_path(name);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::Storage(format!("Cannot read {}: {}", path.display(), e))),
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| Error::Storage(format!("Malformed {}: {}", path.display(), e)))
    }

    pub fn save<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        self.write(name, value, false)
    }

    /// Like [`save`](Self::save), but owner-only (0600) on unix
    pub fn save_private<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        self.write(name, value, true)
    }

    /// Missing documents are not an error
    pub fn remove(&self, name: &str) -> Result<()> {
        let path = self.file_path(name);
        match std::fs::remove_file(&path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
                Err(Error::Storage(format!("Cannot remove {}: {}", path.display(), e)))
            }
            _ => Ok(()),
        }
    }

    fn write<T: Serialize>(&self, name: &str, value: &T, private: bool) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| Error::Storage(format!("Cannot create {}: {}", self.dir.display(), e)))?;

        let path = self.file_path(name);
        let tmp = self.file_path(&format!("{}.tmp", name));
        let body = serde_json::to_vec_pretty(value)?;

        std::fs::write(&tmp, body)
            .map_err(|e| Error::Storage(format!("Cannot write {}: {}", tmp.display(), e)))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if private {
                std::fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o600))?;
            }
        }
        #[cfg(not(unix))]
        let _ = private;

        std::fs::rename(&tmp, &path)
            .map_err(|e| Error::Storage(format!("Cannot replace {}: {}", path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Doc {
        server: String,
        retries: u32,
    }

    #[test]
    fn test_missing_then_saved_then_removed() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path().join("a").join("b"));

        assert_eq!(store.load_optional::<Doc>("doc.json").unwrap(), None);

        let doc = Doc {
            server: "http://localhost:8000".into(),
            retries: 0,
        };
        store.save("doc.json", &doc).unwrap();
        assert!(store.exists("doc.json"));
        assert!(!store.exists("doc.json.tmp"));
        assert_eq!(store.load_optional::<Doc>("doc.json").unwrap(), Some(doc));

        store.remove("doc.json").unwrap();
        store.remove("doc.json").unwrap();
        assert!(!store.exists("doc.json"));
    }

    #[test]
    fn test_malformed_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        std::fs::write(store.file_path("doc.json"), "{\"server\":").unwrap();

        assert!(matches!(store.load_optional::<Doc>("doc.json"), Err(Error::Storage(_))));
    }

    #[test]
    fn test_project_dir_name() {
        let store = JsonStore::project("/work/repo");
        assert_eq!(store.base_dir(), Path::new("/work/repo/.codexec"));
    }

    #[cfg(unix)]
    #[test]
    fn test_private_save_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        store.save_private("secret.json", &serde_json::json!({"k": "v"})).unwrap();

        let mode = std::fs::metadata(store.file_path("secret.json")).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
