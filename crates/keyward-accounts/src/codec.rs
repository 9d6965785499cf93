//! Conversion between exported Ed25519 keypairs and live signing keys.
//!
//! Also derives the public identifiers (base64 public key, hex address) and
//! produces/verifies serialized signatures of the form
//! `base64(flag || signature || public_key)`.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ed25519_dalek::{
    Signature, Signer, SigningKey, Verifier, VerifyingKey, PUBLIC_KEY_LENGTH, SECRET_KEY_LENGTH,
    SIGNATURE_LENGTH,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::{AccountError, Result};

/// Scheme flag byte prepended to public keys and serialized signatures.
pub const ED25519_FLAG: u8 = 0x00;

/// Length of a serialized signature: flag, signature, public key.
pub const SERIALIZED_SIGNATURE_LENGTH: usize = 1 + SIGNATURE_LENGTH + PUBLIC_KEY_LENGTH;

/// Signature scheme of an exported keypair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeySchema {
    #[serde(rename = "ED25519")]
    Ed25519,
}

/// Externally exchangeable keypair representation.
///
/// Only ever held transiently: inside the encrypted payload, or while an
/// account is being created. The private key is zeroed on drop and never
/// printed.
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(rename_all = "camelCase")]
pub struct ExportedKeypair {
    #[zeroize(skip)]
    pub schema: KeySchema,

    /// Base64 of the 32-byte seed (or legacy 64-byte `seed || public`).
    pub private_key: String,
}

impl ExportedKeypair {
    /// Parse an exported keypair from JSON, reporting any problem as
    /// [`AccountError::MalformedKeyMaterial`].
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| AccountError::MalformedKeyMaterial(format!("exported keypair: {e}")))
    }
}

impl fmt::Debug for ExportedKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportedKeypair")
            .field("schema", &self.schema)
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

fn malformed(reason: impl Into<String>) -> AccountError {
    AccountError::MalformedKeyMaterial(reason.into())
}

/// Decode an exported keypair into a signing key.
pub fn to_internal(exported: &ExportedKeypair) -> Result<SigningKey> {
    let bytes = Zeroizing::new(
        STANDARD
            .decode(&exported.private_key)
            .map_err(|e| malformed(format!("private key base64: {e}")))?,
    );

    let mut seed = Zeroizing::new([0u8; SECRET_KEY_LENGTH]);
    match bytes.len() {
        SECRET_KEY_LENGTH => {
            seed.copy_from_slice(&bytes);
            Ok(SigningKey::from_bytes(&seed))
        }
        n if n == SECRET_KEY_LENGTH + PUBLIC_KEY_LENGTH => {
            seed.copy_from_slice(&bytes[..SECRET_KEY_LENGTH]);
            let key = SigningKey::from_bytes(&seed);
            if key.verifying_key().as_bytes()[..] != bytes[SECRET_KEY_LENGTH..] {
                return Err(malformed("public half does not match private seed"));
            }
            Ok(key)
        }
        n => Err(malformed(format!(
            "private key must be {SECRET_KEY_LENGTH} or {} bytes, got {n}",
            SECRET_KEY_LENGTH + PUBLIC_KEY_LENGTH
        ))),
    }
}

/// Export a signing key. The result must not be persisted in plaintext.
pub fn to_exported(key: &SigningKey) -> ExportedKeypair {
    let seed = Zeroizing::new(key.to_bytes());
    ExportedKeypair {
        schema: KeySchema::Ed25519,
        private_key: STANDARD.encode(&seed[..]),
    }
}

/// Base64 encoding of the verifying key.
pub fn public_key(key: &VerifyingKey) -> String {
    STANDARD.encode(key.as_bytes())
}

/// Decode a base64 public key produced by [`public_key`].
pub fn decode_public_key(encoded: &str) -> Result<VerifyingKey> {
    let bytes = STANDARD
        .decode(encoded)
        .map_err(|e| malformed(format!("public key base64: {e}")))?;
    let bytes: [u8; PUBLIC_KEY_LENGTH] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| malformed(format!("public key must be {PUBLIC_KEY_LENGTH} bytes")))?;
    VerifyingKey::from_bytes(&bytes).map_err(|e| malformed(format!("public key: {e}")))
}

/// Address derived from a verifying key: `0x` + hex(SHA-256(flag || public key)).
pub fn address(key: &VerifyingKey) -> String {
    let mut hasher = Sha256::new();
    hasher.update([ED25519_FLAG]);
    hasher.update(key.as_bytes());
    format!("0x{}", hex::encode(hasher.finalize()))
}

/// Sign `message` and return the serialized signature.
pub fn sign(key: &SigningKey, message: &[u8]) -> String {
    let signature = key.sign(message);

    let mut serialized = Vec::with_capacity(SERIALIZED_SIGNATURE_LENGTH);
    serialized.push(ED25519_FLAG);
    serialized.extend_from_slice(&signature.to_bytes());
    serialized.extend_from_slice(key.verifying_key().as_bytes());
    STANDARD.encode(serialized)
}

/// Verify a serialized signature against `message` and a base64 public key.
///
/// Returns `false` for any decoding problem, a public key that does not match
/// the one embedded in the signature, or an invalid signature.
pub fn verify_serialized_signature(message: &[u8], serialized: &str, public_key: &str) -> bool {
    let Ok(bytes) = STANDARD.decode(serialized) else {
        return false;
    };
    if bytes.len() != SERIALIZED_SIGNATURE_LENGTH || bytes[0] != ED25519_FLAG {
        return false;
    }
    let Ok(expected) = decode_public_key(public_key) else {
        return false;
    };

    let (sig_bytes, embedded) = bytes[1..].split_at(SIGNATURE_LENGTH);
    if embedded != expected.as_bytes() {
        return false;
    }
    let Ok(signature) = Signature::from_slice(sig_bytes) else {
        return false;
    };
    expected.verify(message, &signature).is_ok()
}
