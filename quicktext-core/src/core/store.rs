//! Encrypted, crash-safe persistence of the snippet library.

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::core::codec::{decode_snippets, encode_snippets};
use crate::core::paths::AppPaths;
use crate::core::snippet::Snippet;
use crate::core::vault::{KeyFileCipher, VaultCipher, VaultError, VAULT_ENTROPY};
use crate::{QuicktextError, Result};

/// Why a load degraded to an empty library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadWarning {
    /// The blob could not be decrypted for this user (other account, lost key, corruption).
    Decryption,
    /// The decrypted payload was not a valid record list.
    Malformed,
    /// Reading the file failed.
    Io(String),
    /// The file or key could not be read due to permissions.
    Permission,
    /// Anything else.
    Unexpected(String),
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decryption => write!(
                f,
                "Saved snippets could not be decrypted for this user. Starting with an empty library."
            ),
            Self::Malformed => write!(
                f,
                "Saved snippets are damaged and could not be read. Starting with an empty library."
            ),
            Self::Io(e) => write!(f, "Could not read saved snippets ({e}). Starting with an empty library."),
            Self::Permission => write!(
                f,
                "Permission denied while reading saved snippets. Starting with an empty library."
            ),
            Self::Unexpected(e) => write!(
                f,
                "Unexpected error while loading snippets ({e}). Starting with an empty library."
            ),
        }
    }
}

/// Result of [`SecureSnippetStore::load`]: always a library, sometimes with a warning.
#[derive(Debug, Clone, Default)]
pub struct StoreLoad {
    pub snippets: Vec<Snippet>,
    pub warning: Option<LoadWarning>,
}

/// Owns the encrypted library file on disk.
///
/// The store never holds the live library; it only turns snippet slices into
/// bytes on disk and back.
pub struct SecureSnippetStore {
    path: PathBuf,
    cipher: Box<dyn VaultCipher>,
    write_lock: Mutex<()>,
    last_load_error: Mutex<Option<LoadWarning>>,
}

impl SecureSnippetStore {
    pub fn new<P: AsRef<Path>>(path: P, cipher: Box<dyn VaultCipher>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            cipher,
            write_lock: Mutex::new(()),
            last_load_error: Mutex::new(None),
        }
    }

    /// Opens the store at the standard location, encrypted with the per-user key file.
    pub fn open_default(paths: &AppPaths) -> Self {
        Self::new(
            paths.snippets_file(),
            Box::new(KeyFileCipher::new(paths.vault_key_file())),
        )
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The warning produced by the most recent [`load`](Self::load), if any.
    pub fn last_load_error(&self) -> Option<LoadWarning> {
        self.last_load_error
            .lock()
            .ok()
            .and_then(|guard| guard.clone())
    }

    /// Reads and decrypts the library.
    ///
    /// Never fails: a missing or empty file yields an empty library, and any
    /// decryption, parse, or I/O problem yields an empty library plus a
    /// [`LoadWarning`].
    pub fn load(&self) -> StoreLoad {
        let outcome = match self.try_load() {
            Ok(snippets) => StoreLoad {
                snippets,
                warning: None,
            },
            Err(e) => {
                let warning = classify_load_error(&e);
                log::warn!("failed to load {}: {e}", self.path.display());
                StoreLoad {
                    snippets: Vec::new(),
                    warning: Some(warning),
                }
            }
        };

        if let Ok(mut last) = self.last_load_error.lock() {
            *last = outcome.warning.clone();
        }
        outcome
    }

    fn try_load(&self) -> Result<Vec<Snippet>> {
        let encrypted = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if encrypted.is_empty() {
            return Ok(Vec::new());
        }

        let plaintext = self.cipher.decrypt(&encrypted, VAULT_ENTROPY)?;
        let snippets = decode_snippets(&plaintext)?;
        log::debug!("loaded {} snippets from {}", snippets.len(), self.path.display());
        Ok(snippets)
    }

    /// Encrypts and writes the library.
    ///
    /// The blob is written to a temporary sibling file, flushed, and then
    /// renamed over the real file, so the file on disk is always either the
    /// previous complete version or the new one.
    ///
    /// # Errors
    ///
    /// Returns [`QuicktextError::Vault`] if encryption fails, or
    /// [`QuicktextError::Io`] for filesystem and permission failures. The
    /// existing file is untouched in either case.
    pub fn save(&self, snippets: &[Snippet]) -> Result<()> {
        let plaintext = encode_snippets(snippets)?;
        let encrypted = self.cipher.encrypt(&plaintext, VAULT_ENTROPY)?;

        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| QuicktextError::Runtime("store write lock poisoned".to_string()))?;
        write_atomically(&self.path, &encrypted)?;
        log::debug!("saved {} snippets to {}", snippets.len(), self.path.display());
        Ok(())
    }
}

/// Writes `bytes` to `path` through a temporary file in the same directory.
pub(crate) fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;

    let mut temp = tempfile::Builder::new()
        .prefix(".quicktext-")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| QuicktextError::Io(e.error))?;
    Ok(())
}

fn classify_load_error(error: &QuicktextError) -> LoadWarning {
    match error {
        QuicktextError::Vault(VaultError::Io(e)) | QuicktextError::Io(e)
            if e.kind() == std::io::ErrorKind::PermissionDenied =>
        {
            LoadWarning::Permission
        }
        QuicktextError::Vault(VaultError::Io(e)) | QuicktextError::Io(e) => {
            LoadWarning::Io(e.to_string())
        }
        QuicktextError::Vault(_) => LoadWarning::Decryption,
        QuicktextError::Json(_) => LoadWarning::Malformed,
        other => LoadWarning::Unexpected(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::vault::PlaintextCipher;
    use tempfile::TempDir;

    fn encrypted_store(dir: &TempDir) -> SecureSnippetStore {
        SecureSnippetStore::new(
            dir.path().join("snippets.bin"),
            Box::new(KeyFileCipher::with_user_context(
                dir.path().join("vault.key"),
                "tester@localhost",
            )),
        )
    }

    struct FailingCipher;

    impl VaultCipher for FailingCipher {
        fn encrypt(&self, _plaintext: &[u8], _context: &[u8]) -> std::result::Result<Vec<u8>, VaultError> {
            Err(VaultError::Encrypt)
        }

        fn decrypt(&self, _blob: &[u8], _context: &[u8]) -> std::result::Result<Vec<u8>, VaultError> {
            Err(VaultError::Decrypt)
        }
    }

    #[test]
    fn test_load_missing_file_is_empty_without_warning() {
        let dir = TempDir::new().unwrap();
        let loaded = encrypted_store(&dir).load();
        assert!(loaded.snippets.is_empty());
        assert!(loaded.warning.is_none());
    }

    #[test]
    fn test_load_empty_file_is_empty_without_warning() {
        let dir = TempDir::new().unwrap();
        let store = encrypted_store(&dir);
        fs::write(store.path(), b"").unwrap();
        let loaded = store.load();
        assert!(loaded.snippets.is_empty());
        assert!(loaded.warning.is_none());
    }

    #[test]
    fn test_save_then_load_round_trips_normalized() {
        let dir = TempDir::new().unwrap();
        let store = encrypted_store(&dir);

        let mut blank = Snippet::new("x", "body", "Sales", "k");
        blank.title = "   ".to_string();
        blank.category = "".to_string();
        let snippets = vec![Snippet::new("Hello", "World", "General", "greet"), blank];

        store.save(&snippets).unwrap();
        let loaded = store.load();

        assert!(loaded.warning.is_none());
        let expected: Vec<Snippet> = snippets.into_iter().map(Snippet::normalized).collect();
        assert_eq!(loaded.snippets, expected);
        assert_eq!(loaded.snippets[1].title, "New Snippet");
        assert_eq!(loaded.snippets[1].category, "General");
    }

    #[test]
    fn test_file_on_disk_is_not_plaintext() {
        let dir = TempDir::new().unwrap();
        let store = encrypted_store(&dir);
        store
            .save(&[Snippet::new("Visible title", "Visible body", "General", "")])
            .unwrap();
        let raw = fs::read(store.path()).unwrap();
        assert!(!String::from_utf8_lossy(&raw).contains("Visible"));
    }

    #[test]
    fn test_plaintext_cipher_writes_pretty_json() {
        let dir = TempDir::new().unwrap();
        let store = SecureSnippetStore::new(dir.path().join("snippets.json"), Box::new(PlaintextCipher));
        store.save(&[Snippet::new("T", "C", "General", "")]).unwrap();
        let raw = fs::read_to_string(store.path()).unwrap();
        assert!(raw.starts_with("[\n"));
    }

    #[test]
    fn test_failed_save_leaves_previous_file_intact() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("snippets.bin");
        let good = SecureSnippetStore::new(&path, Box::new(PlaintextCipher));
        good.save(&[Snippet::new("Keep me", "", "General", "")]).unwrap();

        let broken = SecureSnippetStore::new(&path, Box::new(FailingCipher));
        let err = broken
            .save(&[Snippet::new("Replacement", "", "General", "")])
            .unwrap_err();
        assert!(matches!(err, QuicktextError::Vault(_)));

        let loaded = good.load();
        assert_eq!(loaded.snippets.len(), 1);
        assert_eq!(loaded.snippets[0].title, "Keep me");
    }

    #[test]
    fn test_interrupted_write_leaves_previous_file_readable() {
        let dir = TempDir::new().unwrap();
        let store = encrypted_store(&dir);
        store.save(&[Snippet::new("Stable", "v1", "General", "")]).unwrap();

        // A crash between writing the temp file and renaming it leaves a stray sibling.
        fs::write(dir.path().join(".quicktext-crash.tmp"), b"QTV\x01partial").unwrap();

        let loaded = store.load();
        assert!(loaded.warning.is_none());
        assert_eq!(loaded.snippets[0].content, "v1");
    }

    #[test]
    fn test_no_temp_files_left_after_save() {
        let dir = TempDir::new().unwrap();
        let store = encrypted_store(&dir);
        store.save(&[Snippet::new("A", "B", "General", "")]).unwrap();
        store.save(&[Snippet::new("A", "C", "General", "")]).unwrap();

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_wrong_user_degrades_to_empty_with_decryption_warning() {
        let dir = TempDir::new().unwrap();
        encrypted_store(&dir)
            .save(&[Snippet::new("Private", "", "General", "")])
            .unwrap();

        let other = SecureSnippetStore::new(
            dir.path().join("snippets.bin"),
            Box::new(KeyFileCipher::with_user_context(
                dir.path().join("vault.key"),
                "someone-else@localhost",
            )),
        );
        let loaded = other.load();
        assert!(loaded.snippets.is_empty());
        assert_eq!(loaded.warning, Some(LoadWarning::Decryption));
        assert_eq!(other.last_load_error(), Some(LoadWarning::Decryption));
    }

    #[test]
    fn test_malformed_payload_degrades_to_empty() {
        let dir = TempDir::new().unwrap();
        let store = SecureSnippetStore::new(dir.path().join("snippets.json"), Box::new(PlaintextCipher));
        fs::write(store.path(), b"{ definitely not records").unwrap();
        let loaded = store.load();
        assert!(loaded.snippets.is_empty());
        assert_eq!(loaded.warning, Some(LoadWarning::Malformed));
        assert!(loaded.warning.unwrap().to_string().contains("damaged"));
    }

    #[test]
    fn test_unreadable_path_degrades_to_io_warning() {
        let dir = TempDir::new().unwrap();
        // A directory where the file should be cannot be read as a file.
        fs::create_dir(dir.path().join("snippets.bin")).unwrap();
        let loaded = encrypted_store(&dir).load();
        assert!(loaded.snippets.is_empty());
        assert!(matches!(
            loaded.warning,
            Some(LoadWarning::Io(_)) | Some(LoadWarning::Permission)
        ));
    }

    #[test]
    fn test_successful_load_clears_last_error() {
        let dir = TempDir::new().unwrap();
        let store = SecureSnippetStore::new(dir.path().join("s.json"), Box::new(PlaintextCipher));
        fs::write(store.path(), b"garbage").unwrap();
        store.load();
        assert!(store.last_load_error().is_some());

        store.save(&[]).unwrap();
        store.load();
        assert!(store.last_load_error().is_none());
    }
}
