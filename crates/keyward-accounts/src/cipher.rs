//! AES-256-GCM encryption under a PBKDF2-HMAC-SHA256 password-derived key.
//!
//! Every blob gets its own random salt and nonce; the password is never used
//! directly as a cipher key. The blob is a compact JSON object carrying the
//! ciphertext, nonce, salt and iteration count, so decryption only needs the
//! password and the blob string.

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::Hmac;
use keyward_core::config::{CipherConfig, MAX_ITERATIONS};
use keyward_core::SecretString;
use rand::RngCore;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::{AccountError, Result};

const NONCE_SIZE: usize = 12;
const SALT_SIZE: usize = 16;
const KEY_SIZE: usize = 32;

/// Iteration count used when no configuration is supplied.
pub const DEFAULT_ITERATIONS: u32 = 100_000;

/// Key-derivation parameters applied when encrypting.
///
/// Decryption reads the parameters back from the blob itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CipherParams {
    /// PBKDF2 iteration count.
    pub iterations: u32,
}

impl Default for CipherParams {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
        }
    }
}

impl From<&CipherConfig> for CipherParams {
    fn from(config: &CipherConfig) -> Self {
        Self {
            iterations: config.iterations,
        }
    }
}

/// Serialized form of an encrypted payload.
#[derive(Debug, Serialize, Deserialize)]
struct EncryptedBlob {
    /// Ciphertext with GCM tag, base64.
    data: String,
    /// Nonce, base64.
    iv: String,
    /// PBKDF2 salt, base64.
    salt: String,
    /// PBKDF2 iteration count.
    iterations: u32,
}

fn malformed(reason: impl Into<String>) -> AccountError {
    AccountError::MalformedKeyMaterial(reason.into())
}

/// Derive a 256-bit key from `password` and `salt` via PBKDF2-HMAC-SHA256.
fn derive_key(password: &[u8], salt: &[u8], iterations: u32) -> Zeroizing<[u8; KEY_SIZE]> {
    let mut key = Zeroizing::new([0u8; KEY_SIZE]);
    pbkdf2::pbkdf2::<Hmac<Sha256>>(password, salt, iterations, &mut key[..]);
    key
}

/// Encrypt `payload` (as JSON) under `password`, returning the blob string.
///
/// The same payload encrypted twice produces different blobs.
pub fn encrypt<T: Serialize>(
    password: &SecretString,
    payload: &T,
    params: CipherParams,
) -> Result<String> {
    if params.iterations == 0 || params.iterations > MAX_ITERATIONS {
        return Err(AccountError::EncryptionFailed(format!(
            "iteration count must be between 1 and {MAX_ITERATIONS}, got {}",
            params.iterations
        )));
    }
    let plaintext = Zeroizing::new(serde_json::to_vec(payload)?);

    let mut salt = [0u8; SALT_SIZE];
    rand::thread_rng().fill_bytes(&mut salt);

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);

    let key = derive_key(password.as_bytes(), &salt, params.iterations);
    let cipher = Aes256Gcm::new_from_slice(&key[..])
        .map_err(|e| AccountError::EncryptionFailed(e.to_string()))?;

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_slice())
        .map_err(|e| AccountError::EncryptionFailed(e.to_string()))?;

    let blob = EncryptedBlob {
        data: STANDARD.encode(ciphertext),
        iv: STANDARD.encode(nonce_bytes),
        salt: STANDARD.encode(salt),
        iterations: params.iterations,
    };
    Ok(serde_json::to_string(&blob)?)
}

/// Decrypt a blob produced by [`encrypt`].
///
/// Fails with [`AccountError::WrongPassword`] when the GCM tag does not
/// authenticate (wrong password or tampered ciphertext), and with
/// [`AccountError::MalformedKeyMaterial`] when the blob or the decrypted
/// payload cannot be parsed.
pub fn decrypt<T: DeserializeOwned>(password: &SecretString, blob: &str) -> Result<T> {
    let blob: EncryptedBlob =
        serde_json::from_str(blob).map_err(|e| malformed(format!("ciphertext blob: {e}")))?;

    let data = STANDARD
        .decode(&blob.data)
        .map_err(|e| malformed(format!("ciphertext base64: {e}")))?;
    let iv = STANDARD
        .decode(&blob.iv)
        .map_err(|e| malformed(format!("iv base64: {e}")))?;
    let salt = STANDARD
        .decode(&blob.salt)
        .map_err(|e| malformed(format!("salt base64: {e}")))?;

    if iv.len() != NONCE_SIZE {
        return Err(malformed(format!(
            "iv must be {NONCE_SIZE} bytes, got {}",
            iv.len()
        )));
    }
    if blob.iterations == 0 {
        return Err(malformed("iteration count must be positive"));
    }
    if blob.iterations > MAX_ITERATIONS {
        return Err(malformed(format!(
            "iteration count {} exceeds {MAX_ITERATIONS}",
            blob.iterations
        )));
    }

    let key = derive_key(password.as_bytes(), &salt, blob.iterations);
    let cipher = Aes256Gcm::new_from_slice(&key[..]).map_err(|e| malformed(e.to_string()))?;

    let plaintext = Zeroizing::new(
        cipher
            .decrypt(Nonce::from_slice(&iv), data.as_slice())
            .map_err(|_| AccountError::WrongPassword)?,
    );

    serde_json::from_slice(&plaintext).map_err(|e| malformed(format!("decrypted payload: {e}")))
}

/// Run [`encrypt`] on the blocking pool so key derivation does not stall the runtime.
pub async fn encrypt_blocking<T>(
    password: SecretString,
    payload: T,
    params: CipherParams,
) -> Result<String>
where
    T: Serialize + Send + 'static,
{
    tokio::task::spawn_blocking(move || encrypt(&password, &payload, params))
        .await
        .map_err(|e| AccountError::Storage(format!("encrypt task failed: {e}")))?
}

/// Run [`decrypt`] on the blocking pool.
///
/// Dropping the returned future discards the result; nothing is written anywhere.
pub async fn decrypt_blocking<T>(password: SecretString, blob: String) -> Result<T>
where
    T: DeserializeOwned + Send + 'static,
{
    tokio::task::spawn_blocking(move || decrypt(&password, &blob))
        .await
        .map_err(|e| AccountError::Storage(format!("decrypt task failed: {e}")))?
}
