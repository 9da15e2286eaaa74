//! At-rest encryption for the snippet library.
//!
//! [`VaultCipher`] is the seam between the store and the platform's
//! user-scoped secret storage. [`KeyFileCipher`] is the portable
//! implementation: a random secret kept in a per-user key file, expanded with
//! HKDF-SHA256 over the OS user identity and sealed with ChaCha20-Poly1305.
//!
//! Blob layout: `b"QTV"`, one version byte, a 12-byte nonce, then the
//! ciphertext with its 16-byte tag.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chacha20poly1305::aead::{Aead, AeadCore, KeyInit, OsRng, Payload};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use hkdf::Hkdf;
use rand_core::RngCore;
use sha2::Sha256;
use thiserror::Error;
use zeroize::Zeroizing;

use crate::core::identity::current_user_context;

/// Versioned application secret mixed into every key derivation and used as AAD.
pub const VAULT_ENTROPY: &[u8] = b"Quicktext.LocalVault.v1";

const MAGIC: &[u8; 3] = b"QTV";
const FORMAT_VERSION: u8 = 1;
const NONCE_LEN: usize = 12;
const SECRET_LEN: usize = 32;
const HEADER_LEN: usize = MAGIC.len() + 1 + NONCE_LEN;

/// Errors raised while sealing or opening a vault blob.
#[derive(Debug, Error)]
pub enum VaultError {
    /// The blob does not start with the vault header.
    #[error("not a vault blob")]
    NotAVault,

    /// The blob was written by an unknown format version.
    #[error("unsupported vault version {0}")]
    UnsupportedVersion(u8),

    /// Authentication failed: wrong user, wrong key file, or corrupted data.
    #[error("could not decrypt the vault for this user")]
    Decrypt,

    /// The cipher refused to seal the plaintext.
    #[error("could not encrypt the vault")]
    Encrypt,

    /// The key file exists but is unreadable or the wrong size.
    #[error("invalid key file {path}: {reason}")]
    InvalidKeyFile { path: PathBuf, reason: String },

    /// Reading or creating the key file failed.
    #[error("key file I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Encrypts and decrypts the library blob for the current user.
///
/// `context` is the versioned application entropy; implementations must
/// refuse to decrypt a blob sealed under a different context.
pub trait VaultCipher: Send + Sync {
    fn encrypt(&self, plaintext: &[u8], context: &[u8]) -> Result<Vec<u8>, VaultError>;
    fn decrypt(&self, blob: &[u8], context: &[u8]) -> Result<Vec<u8>, VaultError>;
}

/// User-scoped cipher backed by a locally held secret.
pub struct KeyFileCipher {
    key_path: PathBuf,
    user_context: String,
}

impl KeyFileCipher {
    /// Creates a cipher bound to the current OS user with its secret at `key_path`.
    pub fn new(key_path: impl Into<PathBuf>) -> Self {
        Self::with_user_context(key_path, current_user_context())
    }

    /// Creates a cipher bound to an explicit user identity.
    pub fn with_user_context(key_path: impl Into<PathBuf>, user_context: impl Into<String>) -> Self {
        Self {
            key_path: key_path.into(),
            user_context: user_context.into(),
        }
    }

    pub fn key_path(&self) -> &Path {
        &self.key_path
    }

    fn read_secret(&self) -> Result<Option<Zeroizing<[u8; SECRET_LEN]>>, VaultError> {
        let bytes = match fs::read(&self.key_path) {
            Ok(bytes) => Zeroizing::new(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if bytes.len() != SECRET_LEN {
            return Err(VaultError::InvalidKeyFile {
                path: self.key_path.clone(),
                reason: format!("expected {SECRET_LEN} bytes, found {}", bytes.len()),
            });
        }
        let mut secret = Zeroizing::new([0u8; SECRET_LEN]);
        secret.copy_from_slice(&bytes);
        Ok(Some(secret))
    }

    fn read_or_create_secret(&self) -> Result<Zeroizing<[u8; SECRET_LEN]>, VaultError> {
        if let Some(secret) = self.read_secret()? {
            return Ok(secret);
        }

        let mut secret = Zeroizing::new([0u8; SECRET_LEN]);
        OsRng.fill_bytes(secret.as_mut());

        if let Some(parent) = self.key_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = open_private(&self.key_path)?;
        file.write_all(secret.as_ref())?;
        file.sync_all()?;
        log::info!("created vault key file at {}", self.key_path.display());
        Ok(secret)
    }

    fn derive_key(&self, secret: &[u8], context: &[u8]) -> Result<Zeroizing<[u8; 32]>, VaultError> {
        let hk = Hkdf::<Sha256>::new(Some(context), secret);
        let mut okm = Zeroizing::new([0u8; 32]);
        hk.expand(self.user_context.as_bytes(), okm.as_mut())
            .map_err(|_| VaultError::Encrypt)?;
        Ok(okm)
    }
}

impl VaultCipher for KeyFileCipher {
    fn encrypt(&self, plaintext: &[u8], context: &[u8]) -> Result<Vec<u8>, VaultError> {
        let secret = self.read_or_create_secret()?;
        let key = self.derive_key(secret.as_ref(), context)?;
        let cipher = ChaCha20Poly1305::new(Key::from_slice(key.as_ref()));
        let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);

        let ciphertext = cipher
            .encrypt(&nonce, Payload { msg: plaintext, aad: context })
            .map_err(|_| VaultError::Encrypt)?;

        let mut blob = Vec::with_capacity(HEADER_LEN + ciphertext.len());
        blob.extend_from_slice(MAGIC);
        blob.push(FORMAT_VERSION);
        blob.extend_from_slice(nonce.as_slice());
        blob.extend_from_slice(&ciphertext);
        Ok(blob)
    }

    fn decrypt(&self, blob: &[u8], context: &[u8]) -> Result<Vec<u8>, VaultError> {
        if blob.len() < HEADER_LEN || &blob[..MAGIC.len()] != MAGIC {
            return Err(VaultError::NotAVault);
        }
        let version = blob[MAGIC.len()];
        if version != FORMAT_VERSION {
            return Err(VaultError::UnsupportedVersion(version));
        }

        // Without a key file nothing this user wrote can be opened.
        let secret = self.read_secret()?.ok_or(VaultError::Decrypt)?;
        let key = self.derive_key(secret.as_ref(), context)?;
        let cipher = ChaCha20Poly1305::new(Key::from_slice(key.as_ref()));
        let nonce = Nonce::from_slice(&blob[MAGIC.len() + 1..HEADER_LEN]);

        cipher
            .decrypt(nonce, Payload { msg: &blob[HEADER_LEN..], aad: context })
            .map_err(|_| VaultError::Decrypt)
    }
}

/// Stores bytes unencrypted. Useful for inspecting the payload while debugging.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaintextCipher;

impl VaultCipher for PlaintextCipher {
    fn encrypt(&self, plaintext: &[u8], _context: &[u8]) -> Result<Vec<u8>, VaultError> {
        Ok(plaintext.to_vec())
    }

    fn decrypt(&self, blob: &[u8], _context: &[u8]) -> Result<Vec<u8>, VaultError> {
        Ok(blob.to_vec())
    }
}

#[cfg(unix)]
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;
    fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    fs::OpenOptions::new().write(true).create_new(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn cipher_in(dir: &TempDir, user: &str) -> KeyFileCipher {
        KeyFileCipher::with_user_context(dir.path().join("vault.key"), user)
    }

    #[test]
    fn test_encrypt_then_decrypt() {
        let dir = TempDir::new().unwrap();
        let cipher = cipher_in(&dir, "alice@host");

        let blob = cipher.encrypt(b"secret snippets", VAULT_ENTROPY).unwrap();
        assert_eq!(&blob[..3], b"QTV");
        assert!(!blob.windows(7).any(|w| w == b"snippet"));

        let plain = cipher.decrypt(&blob, VAULT_ENTROPY).unwrap();
        assert_eq!(plain, b"secret snippets");
    }

    #[test]
    fn test_key_file_created_once() {
        let dir = TempDir::new().unwrap();
        let cipher = cipher_in(&dir, "alice@host");
        cipher.encrypt(b"a", VAULT_ENTROPY).unwrap();
        let first = fs::read(cipher.key_path()).unwrap();
        cipher.encrypt(b"b", VAULT_ENTROPY).unwrap();
        let second = fs::read(cipher.key_path()).unwrap();
        assert_eq!(first.len(), 32);
        assert_eq!(first, second);
    }

    #[cfg(unix)]
    #[test]
    fn test_key_file_is_private() {
        use std::os::unix::fs::PermissionsExt;
        let dir = TempDir::new().unwrap();
        let cipher = cipher_in(&dir, "alice@host");
        cipher.encrypt(b"a", VAULT_ENTROPY).unwrap();
        let mode = fs::metadata(cipher.key_path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_other_user_cannot_decrypt() {
        let dir = TempDir::new().unwrap();
        let blob = cipher_in(&dir, "alice@host")
            .encrypt(b"data", VAULT_ENTROPY)
            .unwrap();
        let result = cipher_in(&dir, "mallory@host").decrypt(&blob, VAULT_ENTROPY);
        assert!(matches!(result, Err(VaultError::Decrypt)));
    }

    #[test]
    fn test_other_context_cannot_decrypt() {
        let dir = TempDir::new().unwrap();
        let cipher = cipher_in(&dir, "alice@host");
        let blob = cipher.encrypt(b"data", VAULT_ENTROPY).unwrap();
        let result = cipher.decrypt(&blob, b"Quicktext.LocalVault.v2");
        assert!(matches!(result, Err(VaultError::Decrypt)));
    }

    #[test]
    fn test_missing_key_file_cannot_decrypt() {
        let dir = TempDir::new().unwrap();
        let cipher = cipher_in(&dir, "alice@host");
        let blob = cipher.encrypt(b"data", VAULT_ENTROPY).unwrap();
        fs::remove_file(cipher.key_path()).unwrap();
        assert!(matches!(
            cipher.decrypt(&blob, VAULT_ENTROPY),
            Err(VaultError::Decrypt)
        ));
    }

    #[test]
    fn test_tampered_blob_is_rejected() {
        let dir = TempDir::new().unwrap();
        let cipher = cipher_in(&dir, "alice@host");
        let mut blob = cipher.encrypt(b"data", VAULT_ENTROPY).unwrap();
        let last = blob.len() - 1;
        blob[last] ^= 0xff;
        assert!(matches!(
            cipher.decrypt(&blob, VAULT_ENTROPY),
            Err(VaultError::Decrypt)
        ));
    }

    #[test]
    fn test_garbage_is_not_a_vault() {
        let dir = TempDir::new().unwrap();
        let cipher = cipher_in(&dir, "alice@host");
        assert!(matches!(
            cipher.decrypt(b"[{\"id\":1}]", VAULT_ENTROPY),
            Err(VaultError::NotAVault)
        ));
    }

    #[test]
    fn test_unknown_version_is_rejected() {
        let mut blob = b"QTV".to_vec();
        blob.push(9);
        blob.extend_from_slice(&[0u8; 40]);
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            cipher_in(&dir, "a@b").decrypt(&blob, VAULT_ENTROPY),
            Err(VaultError::UnsupportedVersion(9))
        ));
    }
}
