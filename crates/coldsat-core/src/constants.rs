//! Engine constants. All monetary values in satoshis (1 BTC = 10^8 sats).

pub const SATS_PER_BTC: u64 = 100_000_000;

/// Minimum value of any output the engine creates.
///
/// Payments below this are rejected and change below it is forfeited to the
/// miner instead of producing an output.
pub const DUST_THRESHOLD: u64 = 546;

/// Lower bound (inclusive) on the total fee of a send.
pub const MIN_TOTAL_FEE: u64 = 2_000;

/// Upper bound (inclusive) on the total fee of a send.
pub const MAX_TOTAL_FEE: u64 = 50_000;

/// Lower bound (inclusive) on the miner share when a fee split is requested.
pub const MIN_MINER_FEE: u64 = 1_000;

/// Upper bound (inclusive) on the miner share when a fee split is requested.
pub const MAX_MINER_FEE: u64 = 50_000;

/// Upper bound (inclusive) on the beneficiary share of a fee split.
pub const MAX_DEVELOPER_FEE: u64 = 10_000;

// --- Key derivation ---

/// The single BIP-84 path every wallet spends from.
///
/// Purpose 84 (native segwit), coin type 0, account 0, external chain, index 0.
pub const DERIVATION_PATH: &str = "m/84'/0'/0'/0/0";

/// Number of words in a freshly generated mnemonic.
pub const MNEMONIC_WORDS: usize = 24;

/// Entropy behind a 24-word mnemonic, in bytes.
pub const MNEMONIC_ENTROPY_LEN: usize = 32;

/// PBKDF2-HMAC-SHA512 rounds for mnemonic-to-seed.
pub const SEED_PBKDF2_ROUNDS: u32 = 2048;

/// Length of the BIP-39 seed in bytes.
pub const SEED_LEN: usize = 64;

/// Salt prefix for mnemonic-to-seed; the normalized passphrase is appended.
pub const SEED_SALT_PREFIX: &str = "mnemonic";

// --- Wallet container ---

/// The only container version this engine reads or writes.
///
/// # Examples
///
/// ```
/// use coldsat_core::constants::CONTAINER_VERSION;
/// assert_eq!(CONTAINER_VERSION, "2.0");
/// ```
pub const CONTAINER_VERSION: &str = "2.0";

pub const CONTAINER_ALGORITHM: &str = "aes-256-cbc";
pub const CONTAINER_KEY_DERIVATION: &str = "pbkdf2";
pub const CONTAINER_KDF_DIGEST: &str = "sha256";

/// PBKDF2-HMAC-SHA256 rounds used to stretch the wallet password.
pub const CONTAINER_KDF_ITERATIONS: u32 = 100_000;

/// Salt length in bytes.
pub const SALT_LEN: usize = 32;

/// AES-CBC initialization vector length in bytes.
pub const IV_LEN: usize = 16;

/// AES-256 key length in bytes.
pub const KEY_LEN: usize = 32;

/// AES block size in bytes.
pub const AES_BLOCK_LEN: usize = 16;

/// Extension appended to saved wallet files.
pub const WALLET_FILE_EXTENSION: &str = "wallet";
