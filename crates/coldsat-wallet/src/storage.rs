//! Wallet files on disk.
//!
//! Files are created exclusively and never overwritten: a name that is taken
//! gets a `(n)` counter instead.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use coldsat_core::constants::WALLET_FILE_EXTENSION;

use crate::error::WalletError;

/// Upper bound on `(n)` suffixes tried before giving up.
const MAX_NAME_ATTEMPTS: u32 = 10_000;

/// `"my wallet"` -> `"my_wallet"`.
pub fn file_stem(wallet_name: &str) -> String {
    wallet_name.replace(' ', "_")
}

/// Candidate file name for attempt `n` (0 is the plain name).
fn candidate(stem: &str, n: u32) -> String {
    if n == 0 {
        format!("{stem}.{WALLET_FILE_EXTENSION}")
    } else {
        format!("{stem}({n}).{WALLET_FILE_EXTENSION}")
    }
}

/// Write `contents` to a new file for `wallet_name` under `dir`.
///
/// Creates `dir` if needed. Returns the path actually written.
pub fn save_new(dir: &Path, wallet_name: &str, contents: &str) -> Result<PathBuf, WalletError> {
    let stem = file_stem(wallet_name);
    if stem.is_empty() {
        return Err(WalletError::InvalidInput("wallet name is empty".into()));
    }
    if stem.contains(['/', '\\']) || stem == "." || stem == ".." {
        return Err(WalletError::InvalidInput(format!(
            "wallet name {wallet_name:?} is not a valid file name"
        )));
    }
    fs::create_dir_all(dir)?;

    for n in 0..MAX_NAME_ATTEMPTS {
        let path = dir.join(candidate(&stem, n));
        match create_private(&path) {
            Ok(mut file) => {
                file.write_all(contents.as_bytes())?;
                file.sync_all()?;
                info!(path = %path.display(), "wallet file written");
                return Ok(path);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                debug!(path = %path.display(), "wallet file name taken");
            }
            Err(e) => return Err(e.into()),
        }
    }
    Err(WalletError::Io(format!(
        "no free file name for {stem} after {MAX_NAME_ATTEMPTS} attempts"
    )))
}

/// Read a wallet file.
pub fn load(path: &Path) -> Result<Vec<u8>, WalletError> {
    fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => WalletError::Io(format!("wallet file not found: {}", path.display())),
        _ => e.into(),
    })
}

#[cfg(unix)]
fn create_private(path: &Path) -> std::io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;
    OpenOptions::new().write(true).create_new(true).mode(0o600).open(path)
}

#[cfg(not(unix))]
fn create_private(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().write(true).create_new(true).open(path)
}
