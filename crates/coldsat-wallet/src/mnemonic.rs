//! BIP-39 mnemonic generation and mnemonic-to-seed.
//!
//! Seeds are computed directly with PBKDF2-HMAC-SHA512 rather than through a
//! parsed [`Mnemonic`], so that phrases with a bad checksum or unknown words
//! still yield a seed. Checksum enforcement is opt-in via [`validate`].

use bip39::{Language, Mnemonic};
use rand::RngCore;
use sha2::Sha512;
use unicode_normalization::UnicodeNormalization;
use zeroize::Zeroize;

use coldsat_core::constants::{MNEMONIC_ENTROPY_LEN, SEED_LEN, SEED_PBKDF2_ROUNDS, SEED_SALT_PREFIX};

use crate::error::WalletError;
use crate::keys::Seed;

/// Generate a fresh 24-word English mnemonic from 256 bits of OS entropy.
pub fn generate() -> Result<String, WalletError> {
    let mut entropy = [0u8; MNEMONIC_ENTROPY_LEN];
    rand::rngs::OsRng
        .try_fill_bytes(&mut entropy)
        .map_err(|e| WalletError::EntropyUnavailable(e.to_string()))?;
    let phrase = Mnemonic::from_entropy_in(Language::English, &entropy)
        .map(|m| m.to_string())
        .map_err(|e| WalletError::InvalidMnemonic(e.to_string()));
    entropy.zeroize();
    phrase
}

/// Check word membership and checksum of an English phrase.
///
/// Used only when strict mnemonic validation is configured.
pub fn validate(phrase: &str) -> Result<(), WalletError> {
    Mnemonic::parse_in_normalized(Language::English, phrase)
        .map(|_| ())
        .map_err(|e| WalletError::InvalidMnemonic(e.to_string()))
}

/// The 2048-word English BIP-39 list.
pub fn word_list() -> &'static [&'static str; 2048] {
    Language::English.word_list()
}

/// BIP-39 seed: PBKDF2-HMAC-SHA512(phrase, "mnemonic" || NFKD(passphrase), 2048).
///
/// The phrase is hashed exactly as given.
pub fn to_seed(phrase: &str, passphrase: &str) -> Seed {
    let mut salt = String::with_capacity(SEED_SALT_PREFIX.len() + passphrase.len());
    salt.push_str(SEED_SALT_PREFIX);
    salt.extend(passphrase.nfkd());

    let mut bytes = [0u8; SEED_LEN];
    pbkdf2::pbkdf2_hmac::<Sha512>(phrase.as_bytes(), salt.as_bytes(), SEED_PBKDF2_ROUNDS, &mut bytes);
    salt.zeroize();

    let seed = Seed::from_bytes(bytes);
    bytes.zeroize();
    seed
}

#[cfg(test)]
mod tests {
    use super::*;

    const ABANDON: &str = "abandon abandon abandon abandon abandon abandon \
                           abandon abandon abandon abandon abandon about";

    /// A generated phrase has 24 words, all from the list, and a valid checksum.
    #[test]
    fn generated_phrase_is_valid_24_words() {
        let phrase = generate().unwrap();
        let words: Vec<&str> = phrase.split(' ').collect();
        assert_eq!(words.len(), 24);
        assert!(words.iter().all(|w| word_list().contains(w)));
        validate(&phrase).unwrap();
    }

    /// Two generated phrases differ.
    #[test]
    fn generated_phrases_are_fresh() {
        assert_ne!(generate().unwrap(), generate().unwrap());
    }

    /// BIP-39 reference vector with the TREZOR passphrase.
    #[test]
    fn seed_matches_reference_vector() {
        let seed = to_seed(ABANDON, "TREZOR");
        assert_eq!(
            hex::encode(seed.as_bytes()),
            "c55257c360c07c72029aebc1b53c05ed0362ada38ead3e3e9efa3708e5349553\
             1f09a6987599d18264c1e1c92f2cf141630c7a3c4ab7c81b2f001698e7463b04"
        );
    }

    /// Composed and decomposed forms of the same passphrase give one seed.
    #[test]
    fn passphrase_is_nfkd_normalized() {
        let composed = to_seed(ABANDON, "caf\u{00e9}");
        let decomposed = to_seed(ABANDON, "cafe\u{0301}");
        assert_eq!(composed.as_bytes(), decomposed.as_bytes());
    }

    /// Compatibility forms fold too (fullwidth letters, ligatures).
    #[test]
    fn passphrase_compatibility_forms_fold() {
        let plain = to_seed(ABANDON, "fiA");
        let compat = to_seed(ABANDON, "\u{fb01}\u{ff21}");
        assert_eq!(plain.as_bytes(), compat.as_bytes());
    }

    /// Garbage phrases still produce a seed; no checksum is enforced.
    #[test]
    fn garbage_phrase_still_seeds() {
        let a = to_seed("not a real mnemonic", "");
        let b = to_seed("not a real mnemonic!", "");
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    /// Strict validation rejects an unknown word and a bad checksum.
    #[test]
    fn strict_validation_rejects_bad_phrases() {
        assert!(matches!(
            validate("abandon abandon invalidword"),
            Err(WalletError::InvalidMnemonic(_))
        ));
        let bad_checksum = ABANDON.replace("about", "abandon");
        assert!(validate(&bad_checksum).is_err());
        validate(ABANDON).unwrap();
    }

    #[test]
    fn word_list_bounds() {
        let list = word_list();
        assert_eq!(list.len(), 2048);
        assert_eq!(list[0], "abandon");
        assert_eq!(list[2047], "zoo");
    }
}
