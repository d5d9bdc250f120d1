use crate::auth::password::{PasswordRecord, DEFAULT_HASH_ROUNDS};
use crate::prelude::{CoreError, CoreResult};
use log::{debug, warn};
use std::collections::BTreeMap;
use std::fs;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub type CredentialMap = BTreeMap<String, PasswordRecord>;

/// In-memory mirror of the persisted username -> password record mapping.
pub struct CredentialStore {
    path: PathBuf,
    users: CredentialMap,
    hash_rounds: u32,
}

impl CredentialStore {
    /// Loads the store at `path`. A missing file is an empty store; an
    /// unreadable or malformed one is a [`CoreError::StorageRead`].
    pub fn load<P: AsRef<Path>>(path: P) -> CoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let users = read_map(&path)?;
        debug!("loaded {} credential records from {}", users.len(), path.display());
        Ok(Self {
            path,
            users,
            hash_rounds: DEFAULT_HASH_ROUNDS,
        })
    }

    /// Like [`CredentialStore::load`], but a read failure yields an empty store.
    ///
    /// An unreadable file is first copied to `<name>.corrupt` next to it, since
    /// the next registration replaces the store.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(store) => store,
            Err(err) => {
                warn!("{err}; starting with an empty credential store");
                if path.exists() {
                    let backup = corrupt_backup_path(path);
                    match fs::copy(path, &backup) {
                        Ok(_) => warn!("unreadable store kept as {}", backup.display()),
                        Err(copy_err) => {
                            warn!("cannot copy {} aside: {copy_err}", path.display())
                        }
                    }
                }
                Self::empty(path)
            }
        }
    }

    pub fn empty<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            users: CredentialMap::new(),
            hash_rounds: DEFAULT_HASH_ROUNDS,
        }
    }

    pub fn with_hash_rounds(mut self, rounds: u32) -> Self {
        self.hash_rounds = rounds.max(1);
        self
    }

    /// Replaces the persisted store with the full current mapping.
    ///
    /// The mapping is written to a sibling temporary file which is then
    /// renamed over the store, so readers never observe a partial write.
    pub fn save(&self) -> CoreResult<()> {
        let write_error = |reason: String| CoreError::StorageWrite {
            path: self.path.clone(),
            reason,
        };

        let parent = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent).map_err(|e| write_error(e.to_string()))?;

        let mut temp = NamedTempFile::new_in(parent).map_err(|e| write_error(e.to_string()))?;
        {
            let mut writer = BufWriter::new(temp.as_file_mut());
            serde_json::to_writer_pretty(&mut writer, &self.users)
                .map_err(|e| write_error(e.to_string()))?;
            writer.flush().map_err(|e| write_error(e.to_string()))?;
        }
        temp.as_file()
            .sync_all()
            .map_err(|e| write_error(e.to_string()))?;
        temp.persist(&self.path)
            .map_err(|e| write_error(e.error.to_string()))?;
        Ok(())
    }

    /// Adds a user and persists the store. The insert is rolled back when the
    /// store cannot be written.
    pub fn register(&mut self, username: &str, password: &str) -> CoreResult<()> {
        if self.users.contains_key(username) {
            return Err(CoreError::AlreadyExists(username.to_string()));
        }

        let record = PasswordRecord::derive(password, self.hash_rounds);
        self.users.insert(username.to_string(), record);
        if let Err(err) = self.save() {
            self.users.remove(username);
            return Err(err);
        }
        Ok(())
    }

    pub fn authenticate(&self, username: &str, password: &str) -> bool {
        self.users
            .get(username)
            .map(|record| record.verify(password))
            .unwrap_or(false)
    }

    pub fn contains(&self, username: &str) -> bool {
        self.users.contains_key(username)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

pub fn corrupt_backup_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_else(|| "users.json".into());
    name.push(".corrupt");
    path.with_file_name(name)
}

fn read_map(path: &Path) -> CoreResult<CredentialMap> {
    let read_error = |reason: String| CoreError::StorageRead {
        path: path.to_path_buf(),
        reason,
    };

    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(CredentialMap::new()),
        Err(err) => return Err(read_error(err.to_string())),
    };
    serde_json::from_str(&contents).map_err(|e| read_error(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> CredentialStore {
        CredentialStore::load(dir.path().join("users.json"))
            .unwrap()
            .with_hash_rounds(16)
    }

    #[test]
    fn missing_file_loads_as_empty_store() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert!(store.is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn corrupt_file_is_a_read_error_unless_defaulted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("users.json");
        fs::write(&path, b"{ not json").unwrap();

        assert!(matches!(
            CredentialStore::load(&path),
            Err(CoreError::StorageRead { .. })
        ));
        assert!(CredentialStore::load_or_default(&path).is_empty());
    }

    #[test]
    fn corrupt_file_is_kept_aside_before_the_next_save() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("users.json");
        fs::write(&path, b"{ \"alice\": truncated").unwrap();

        let mut store = CredentialStore::load_or_default(&path).with_hash_rounds(16);
        let backup = dir.path().join("users.json.corrupt");
        assert_eq!(corrupt_backup_path(&path), backup);
        assert_eq!(fs::read(&backup).unwrap(), b"{ \"alice\": truncated");

        store.register("bob", "pw").unwrap();
        assert!(CredentialStore::load(&path).unwrap().authenticate("bob", "pw"));
        assert_eq!(fs::read(&backup).unwrap(), b"{ \"alice\": truncated");
    }

    #[test]
    fn missing_file_leaves_no_backup() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("users.json");
        assert!(CredentialStore::load_or_default(&path).is_empty());
        assert!(!corrupt_backup_path(&path).exists());
    }

    #[test]
    fn registered_user_survives_reload() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.register("alice", "pw1").unwrap();

        let reloaded = CredentialStore::load(store.path()).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert!(reloaded.authenticate("alice", "pw1"));
        assert!(!reloaded.authenticate("alice", "pw2"));
        assert!(!reloaded.authenticate("bob", "pw1"));
    }

    #[test]
    fn second_registration_fails_and_leaves_store_unchanged() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.register("alice", "pw1").unwrap();
        let before = fs::read_to_string(store.path()).unwrap();

        let err = store.register("alice", "other").unwrap_err();
        assert!(matches!(err, CoreError::AlreadyExists(ref name) if name == "alice"));
        assert_eq!(store.len(), 1);
        assert!(store.authenticate("alice", "pw1"));
        assert!(!store.authenticate("alice", "other"));
        assert_eq!(fs::read_to_string(store.path()).unwrap(), before);
    }

    #[test]
    fn persisted_store_never_holds_the_raw_password() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.register("carol", "hunter2-plaintext").unwrap();

        let contents = fs::read_to_string(store.path()).unwrap();
        assert!(contents.contains("carol"));
        assert!(!contents.contains("hunter2-plaintext"));
    }

    #[test]
    fn empty_username_registers_once_like_any_other_name() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.register("", "").unwrap();
        assert!(store.contains(""));
        assert!(store.authenticate("", ""));

        assert!(matches!(
            store.register("", "pw"),
            Err(CoreError::AlreadyExists(ref name)) if name.is_empty()
        ));
        assert_eq!(CredentialStore::load(store.path()).unwrap().len(), 1);
    }

    #[test]
    fn failed_write_rolls_back_the_insert() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"file, not a directory").unwrap();
        let mut store = CredentialStore::empty(blocker.join("users.json")).with_hash_rounds(16);

        let err = store.register("erin", "pw").unwrap_err();
        assert!(matches!(err, CoreError::StorageWrite { .. }));
        assert!(!store.contains("erin"));
    }
}
