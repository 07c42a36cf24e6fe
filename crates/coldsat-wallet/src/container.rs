//! Versioned, password-encrypted wallet container.
//!
//! # Format (version 2.0)
//! ```text
//! {
//!   "version": "2.0",
//!   "algorithm": "aes-256-cbc",
//!   "keyDerivation": "pbkdf2",
//!   "pbkdf2Params": { "digest": "sha256", "iterations": 100000 },
//!   "salt": hex(32 bytes),
//!   "iv": hex(16 bytes),
//!   "data": hex(AES-256-CBC(PKCS#7(record JSON))),
//!   "checksum": hex(SHA-256(record JSON))
//! }
//! ```
//!
//! The checksum is unkeyed. It catches corruption and wrong keys, not
//! deliberate edits by someone who can rewrite the file.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;
use zeroize::Zeroizing;

use coldsat_core::constants::{
    CONTAINER_ALGORITHM, CONTAINER_KDF_DIGEST, CONTAINER_KDF_ITERATIONS, CONTAINER_KEY_DERIVATION,
    CONTAINER_VERSION, IV_LEN, SALT_LEN,
};

use crate::encryption;
use crate::error::WalletError;
use crate::record::WalletRecord;

/// Highest iteration count a container may declare.
pub const MAX_KDF_ITERATIONS: u32 = 10 * CONTAINER_KDF_ITERATIONS;

/// PBKDF2 parameters recorded in the container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    pub digest: String,
    pub iterations: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            digest: CONTAINER_KDF_DIGEST.to_string(),
            iterations: CONTAINER_KDF_ITERATIONS,
        }
    }
}

/// Body of a version 2.0 container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerV2 {
    pub version: String,
    pub algorithm: String,
    pub key_derivation: String,
    #[serde(rename = "pbkdf2Params")]
    pub kdf_params: KdfParams,
    pub salt: String,
    pub iv: String,
    pub data: String,
    #[serde(default)]
    pub checksum: String,
}

/// A parsed container, discriminated by its `version` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Container {
    V2(ContainerV2),
}

#[derive(Deserialize)]
struct VersionProbe {
    version: String,
}

impl Container {
    /// Parse container JSON. The version is checked before the rest of the
    /// structure, so unknown versions are never partially interpreted.
    pub fn parse(bytes: &[u8]) -> Result<Self, WalletError> {
        let probe: VersionProbe =
            serde_json::from_slice(bytes).map_err(|e| WalletError::Format(e.to_string()))?;
        if probe.version != CONTAINER_VERSION {
            return Err(WalletError::UnsupportedVersion(probe.version));
        }
        let body: ContainerV2 =
            serde_json::from_slice(bytes).map_err(|e| WalletError::Format(e.to_string()))?;
        Ok(Self::V2(body))
    }
}

/// Encrypt a record with the standard 100,000 PBKDF2 iterations.
pub fn encrypt(record: &WalletRecord, password: &str) -> Result<String, WalletError> {
    encrypt_with(record, password, &KdfParams::default())
}

/// Encrypt a record with explicit KDF parameters. Returns the container JSON.
pub fn encrypt_with(
    record: &WalletRecord,
    password: &str,
    params: &KdfParams,
) -> Result<String, WalletError> {
    check_kdf(params)?;
    let plaintext = Zeroizing::new(
        serde_json::to_vec(record).map_err(|e| WalletError::Format(e.to_string()))?,
    );
    let checksum = Sha256::digest(plaintext.as_slice());

    let mut salt = [0u8; SALT_LEN];
    let mut iv = [0u8; IV_LEN];
    let mut rng = rand::rngs::OsRng;
    rng.try_fill_bytes(&mut salt)
        .and_then(|()| rng.try_fill_bytes(&mut iv))
        .map_err(|e| WalletError::EntropyUnavailable(e.to_string()))?;

    let key = encryption::derive_key(password.as_bytes(), &salt, params.iterations);
    let ciphertext = encryption::encrypt(&key, &iv, &plaintext);

    let container = ContainerV2 {
        version: CONTAINER_VERSION.to_string(),
        algorithm: CONTAINER_ALGORITHM.to_string(),
        key_derivation: CONTAINER_KEY_DERIVATION.to_string(),
        kdf_params: params.clone(),
        salt: hex::encode(salt),
        iv: hex::encode(iv),
        data: hex::encode(ciphertext),
        checksum: hex::encode(checksum),
    };
    serde_json::to_string(&container).map_err(|e| WalletError::Format(e.to_string()))
}

/// Decrypt container JSON back into a record.
///
/// Failure kinds, in the order they are checked: [`WalletError::Format`] for
/// unparseable containers, [`WalletError::UnsupportedVersion`],
/// [`WalletError::Format`] for bad hex or lengths,
/// [`WalletError::BadPassword`] for bad padding or non-JSON plaintext,
/// [`WalletError::Format`] for JSON that is not a record, and
/// [`WalletError::Integrity`] for a checksum mismatch. A checksum that is
/// absent or not hex is not verified.
pub fn decrypt(bytes: &[u8], password: &str) -> Result<WalletRecord, WalletError> {
    let Container::V2(body) = Container::parse(bytes)?;
    check_identifiers(&body)?;

    let salt = decode_hex("salt", &body.salt)?;
    let ciphertext = decode_hex("data", &body.data)?;
    let iv: [u8; IV_LEN] = decode_hex("iv", &body.iv)?
        .try_into()
        .map_err(|v: Vec<u8>| WalletError::Format(format!("iv is {} bytes, expected {IV_LEN}", v.len())))?;

    let key = encryption::derive_key(password.as_bytes(), &salt, body.kdf_params.iterations);
    let plaintext = encryption::decrypt(&key, &iv, &ciphertext)?;

    let value: serde_json::Value =
        serde_json::from_slice(&plaintext).map_err(|_| WalletError::BadPassword)?;
    let record: WalletRecord =
        serde_json::from_value(value).map_err(|e| WalletError::Format(e.to_string()))?;

    if !body.checksum.is_empty() {
        match hex::decode(&body.checksum) {
            Ok(expected) => {
                if Sha256::digest(plaintext.as_slice()).as_slice() != expected.as_slice() {
                    return Err(WalletError::Integrity);
                }
            }
            Err(e) => debug!(error = %e, "checksum is not hex, skipping verification"),
        }
    }
    Ok(record)
}

fn check_identifiers(body: &ContainerV2) -> Result<(), WalletError> {
    let expect = |field: &str, got: &str, want: &str| {
        if got.eq_ignore_ascii_case(want) {
            Ok(())
        } else {
            Err(WalletError::Format(format!("{field} is {got:?}, expected {want:?}")))
        }
    };
    expect("algorithm", &body.algorithm, CONTAINER_ALGORITHM)?;
    expect("keyDerivation", &body.key_derivation, CONTAINER_KEY_DERIVATION)?;
    expect("pbkdf2Params.digest", &body.kdf_params.digest, CONTAINER_KDF_DIGEST)?;
    check_kdf(&body.kdf_params)
}

fn check_kdf(params: &KdfParams) -> Result<(), WalletError> {
    if params.iterations == 0 {
        return Err(WalletError::Format("pbkdf2 iterations must be positive".into()));
    }
    if params.iterations > MAX_KDF_ITERATIONS {
        return Err(WalletError::Format(format!(
            "pbkdf2 iterations {} exceed the limit of {MAX_KDF_ITERATIONS}",
            params.iterations
        )));
    }
    if !params.digest.eq_ignore_ascii_case(CONTAINER_KDF_DIGEST) {
        return Err(WalletError::Format(format!("unsupported digest {:?}", params.digest)));
    }
    Ok(())
}

fn decode_hex(field: &str, s: &str) -> Result<Vec<u8>, WalletError> {
    hex::decode(s).map_err(|e| WalletError::Format(format!("{field}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::Network;

    const ABANDON: &str = "abandon abandon abandon abandon abandon abandon \
                           abandon abandon abandon abandon abandon about";

    fn fast() -> KdfParams {
        KdfParams {
            iterations: 1_000,
            ..KdfParams::default()
        }
    }

    fn record() -> WalletRecord {
        WalletRecord::derive("savings", ABANDON, "", Network::Bitcoin, false).unwrap()
    }

    fn edit(json: &str, f: impl FnOnce(&mut serde_json::Value)) -> Vec<u8> {
        let mut v: serde_json::Value = serde_json::from_str(json).unwrap();
        f(&mut v);
        serde_json::to_vec(&v).unwrap()
    }

    #[test]
    fn roundtrip_with_default_parameters() {
        let rec = record();
        let json = encrypt(&rec, "correct horse").unwrap();
        assert_eq!(decrypt(json.as_bytes(), "correct horse").unwrap(), rec);
    }

    #[test]
    fn header_fields_are_written() {
        let json = encrypt_with(&record(), "pw", &fast()).unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["version"], "2.0");
        assert_eq!(v["algorithm"], "aes-256-cbc");
        assert_eq!(v["keyDerivation"], "pbkdf2");
        assert_eq!(v["pbkdf2Params"]["digest"], "sha256");
        assert_eq!(v["pbkdf2Params"]["iterations"], 1_000);
        assert_eq!(v["salt"].as_str().unwrap().len(), SALT_LEN * 2);
        assert_eq!(v["iv"].as_str().unwrap().len(), IV_LEN * 2);
        assert_eq!(v["checksum"].as_str().unwrap().len(), 64);
    }

    #[test]
    fn default_iterations_are_written() {
        let json = encrypt(&record(), "pw").unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["pbkdf2Params"]["iterations"], 100_000);
    }

    #[test]
    fn salt_and_iv_are_fresh_per_save() {
        let rec = record();
        let a: serde_json::Value =
            serde_json::from_str(&encrypt_with(&rec, "pw", &fast()).unwrap()).unwrap();
        let b: serde_json::Value =
            serde_json::from_str(&encrypt_with(&rec, "pw", &fast()).unwrap()).unwrap();
        assert_ne!(a["salt"], b["salt"]);
        assert_ne!(a["iv"], b["iv"]);
        assert_ne!(a["data"], b["data"]);
        assert_eq!(a["checksum"], b["checksum"]);
    }

    #[test]
    fn wrong_password_is_detected() {
        let json = encrypt_with(&record(), "right", &fast()).unwrap();
        let err = decrypt(json.as_bytes(), "wrong").unwrap_err();
        assert!(
            matches!(err, WalletError::BadPassword | WalletError::Integrity),
            "got {err:?}"
        );
    }

    #[test]
    fn unknown_version_rejected_before_anything_else() {
        let json = encrypt_with(&record(), "pw", &fast()).unwrap();
        let bytes = edit(&json, |v| {
            v["version"] = "3.0".into();
            v["data"] = "zz-not-hex".into();
        });
        assert_eq!(
            decrypt(&bytes, "pw").unwrap_err(),
            WalletError::UnsupportedVersion("3.0".into())
        );
    }

    #[test]
    fn version_one_container_is_unsupported_even_with_other_fields() {
        let legacy = br#"{"version":"1.0","encrypted":"abcd"}"#;
        assert_eq!(
            decrypt(legacy, "pw").unwrap_err(),
            WalletError::UnsupportedVersion("1.0".into())
        );
    }

    #[test]
    fn malformed_json_is_format_error() {
        assert!(matches!(decrypt(b"{not json", "pw"), Err(WalletError::Format(_))));
        assert!(matches!(decrypt(b"{}", "pw"), Err(WalletError::Format(_))));
        assert!(matches!(
            decrypt(br#"{"version":"2.0"}"#, "pw"),
            Err(WalletError::Format(_))
        ));
    }

    #[test]
    fn bad_hex_is_format_error() {
        let json = encrypt_with(&record(), "pw", &fast()).unwrap();
        for field in ["salt", "iv", "data"] {
            let bytes = edit(&json, |v| v[field] = "xyz".into());
            assert!(
                matches!(decrypt(&bytes, "pw"), Err(WalletError::Format(_))),
                "field {field}"
            );
        }
    }

    #[test]
    fn truncated_ciphertext_is_format_error() {
        let json = encrypt_with(&record(), "pw", &fast()).unwrap();
        let bytes = edit(&json, |v| {
            let data = v["data"].as_str().unwrap().to_string();
            v["data"] = data[..data.len() - 2].into();
        });
        assert!(matches!(decrypt(&bytes, "pw"), Err(WalletError::Format(_))));
    }

    #[test]
    fn short_iv_is_format_error() {
        let json = encrypt_with(&record(), "pw", &fast()).unwrap();
        let bytes = edit(&json, |v| v["iv"] = "00112233".into());
        assert!(matches!(decrypt(&bytes, "pw"), Err(WalletError::Format(_))));
    }

    #[test]
    fn unknown_algorithm_is_format_error() {
        let json = encrypt_with(&record(), "pw", &fast()).unwrap();
        let bytes = edit(&json, |v| v["algorithm"] = "aes-128-gcm".into());
        assert!(matches!(decrypt(&bytes, "pw"), Err(WalletError::Format(_))));
    }

    #[test]
    fn identifiers_compare_case_insensitively() {
        let rec = record();
        let json = encrypt_with(&rec, "pw", &fast()).unwrap();
        let bytes = edit(&json, |v| v["algorithm"] = "AES-256-CBC".into());
        assert_eq!(decrypt(&bytes, "pw").unwrap(), rec);
    }

    #[test]
    fn checksum_mismatch_is_integrity_error() {
        let json = encrypt_with(&record(), "pw", &fast()).unwrap();
        let bytes = edit(&json, |v| v["checksum"] = hex::encode([0u8; 32]).into());
        assert_eq!(decrypt(&bytes, "pw").unwrap_err(), WalletError::Integrity);
    }

    #[test]
    fn absent_checksum_is_skipped() {
        let rec = record();
        let json = encrypt_with(&rec, "pw", &fast()).unwrap();
        let removed = edit(&json, |v| {
            v.as_object_mut().unwrap().remove("checksum");
        });
        assert_eq!(decrypt(&removed, "pw").unwrap(), rec);
        let empty = edit(&json, |v| v["checksum"] = "".into());
        assert_eq!(decrypt(&empty, "pw").unwrap(), rec);
    }

    #[test]
    fn non_hex_checksum_still_opens() {
        let rec = record();
        let json = encrypt_with(&rec, "pw", &fast()).unwrap();
        let bytes = edit(&json, |v| v["checksum"] = "sha256:not-hex".into());
        assert_eq!(decrypt(&bytes, "pw").unwrap(), rec);
    }

    #[test]
    fn stored_iteration_count_is_honoured() {
        let rec = record();
        let json = encrypt_with(&rec, "pw", &fast()).unwrap();
        assert_eq!(decrypt(json.as_bytes(), "pw").unwrap(), rec);
        let bytes = edit(&json, |v| v["pbkdf2Params"]["iterations"] = 1_001.into());
        assert!(matches!(
            decrypt(&bytes, "pw"),
            Err(WalletError::BadPassword | WalletError::Integrity)
        ));
    }

    #[test]
    fn excessive_iterations_rejected_before_stretching() {
        let json = encrypt_with(&record(), "pw", &fast()).unwrap();
        let bytes = edit(&json, |v| v["pbkdf2Params"]["iterations"] = 4_000_000_000u32.into());
        assert!(matches!(decrypt(&bytes, "pw"), Err(WalletError::Format(_))));
        let params = KdfParams {
            iterations: MAX_KDF_ITERATIONS + 1,
            ..KdfParams::default()
        };
        assert!(matches!(encrypt_with(&record(), "pw", &params), Err(WalletError::Format(_))));
    }

    #[test]
    fn zero_iterations_rejected() {
        let params = KdfParams {
            iterations: 0,
            ..KdfParams::default()
        };
        assert!(matches!(encrypt_with(&record(), "pw", &params), Err(WalletError::Format(_))));
    }

    #[test]
    fn empty_password_is_allowed() {
        let rec = record();
        let json = encrypt_with(&rec, "", &fast()).unwrap();
        assert_eq!(decrypt(json.as_bytes(), "").unwrap(), rec);
    }
}
