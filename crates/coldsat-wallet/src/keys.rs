//! Seed handling and the fixed BIP-84 key derivation.
//!
//! A wallet owns exactly one key, at [`DERIVATION_PATH`]. The path is parsed
//! once into BIP-32 steps and walked one step at a time so a failure can name
//! the depth it happened at.

use std::fmt;
use std::str::FromStr;

use bitcoin::bip32::{ChildNumber, DerivationPath, Xpriv};
use bitcoin::secp256k1::{Secp256k1, Signing};
use bitcoin::{Address, CompressedPublicKey, Network, NetworkKind, PrivateKey, ScriptBuf};
use zeroize::{Zeroize, ZeroizeOnDrop};

use coldsat_core::constants::{DERIVATION_PATH, SEED_LEN};

use crate::error::WalletError;
use crate::mnemonic;

/// A 64-byte BIP-39 seed.
///
/// Secret material is zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Seed {
    bytes: [u8; SEED_LEN],
}

impl Seed {
    pub fn from_bytes(bytes: [u8; SEED_LEN]) -> Self {
        Self { bytes }
    }

    /// Raw seed bytes. Handle with care.
    pub fn as_bytes(&self) -> &[u8; SEED_LEN] {
        &self.bytes
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Seed").field("bytes", &"[REDACTED]").finish()
    }
}

/// The BIP-84 receive path as BIP-32 steps.
pub fn wallet_path() -> Result<DerivationPath, WalletError> {
    DerivationPath::from_str(DERIVATION_PATH).map_err(|e| WalletError::KeyDerivation {
        depth: 0,
        reason: format!("bad path {DERIVATION_PATH}: {e}"),
    })
}

/// The single spending key of a wallet with its address.
#[derive(Clone)]
pub struct SpendingKey {
    private_key: PrivateKey,
    public_key: CompressedPublicKey,
    address: Address,
}

impl SpendingKey {
    /// Derive from a mnemonic and passphrase.
    ///
    /// With `strict_mnemonic` unset any phrase is accepted, matching the
    /// companion wallet format.
    pub fn from_mnemonic(
        phrase: &str,
        passphrase: &str,
        network: Network,
        strict_mnemonic: bool,
    ) -> Result<Self, WalletError> {
        if strict_mnemonic {
            mnemonic::validate(phrase)?;
        }
        let seed = mnemonic::to_seed(phrase, passphrase);
        Self::from_seed(&seed, network)
    }

    /// Walk [`DERIVATION_PATH`] from the master key of `seed`.
    pub fn from_seed(seed: &Seed, network: Network) -> Result<Self, WalletError> {
        let secp = Secp256k1::signing_only();
        let master = Xpriv::new_master(network, seed.as_bytes()).map_err(|e| {
            WalletError::KeyDerivation {
                depth: 0,
                reason: e.to_string(),
            }
        })?;

        let path = wallet_path()?;
        let steps: &[ChildNumber] = path.as_ref();
        let leaf = walk(&secp, master, steps)?;

        let private_key = leaf.to_priv();
        let public_key = CompressedPublicKey::from_private_key(&secp, &private_key).map_err(|e| {
            WalletError::KeyDerivation {
                depth: steps.len(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self::assemble(private_key, public_key, network))
    }

    /// Rebuild from a stored WIF, checking it belongs to `network`.
    pub fn from_wif(wif: &str, network: Network) -> Result<Self, WalletError> {
        let private_key =
            PrivateKey::from_wif(wif).map_err(|e| WalletError::Format(format!("private key: {e}")))?;
        if private_key.network != NetworkKind::from(network) {
            return Err(WalletError::KeyMismatch(format!(
                "private key is not for {network}"
            )));
        }
        if !private_key.compressed {
            return Err(WalletError::KeyMismatch(
                "uncompressed private key cannot spend native segwit outputs".into(),
            ));
        }
        let secp = Secp256k1::signing_only();
        let public_key = CompressedPublicKey::from_private_key(&secp, &private_key)
            .map_err(|e| WalletError::KeyMismatch(e.to_string()))?;
        Ok(Self::assemble(private_key, public_key, network))
    }

    fn assemble(private_key: PrivateKey, public_key: CompressedPublicKey, network: Network) -> Self {
        let address = Address::p2wpkh(&public_key, network);
        Self {
            private_key,
            public_key,
            address,
        }
    }

    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    pub fn public_key(&self) -> &CompressedPublicKey {
        &self.public_key
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Wallet-Import-Format with the compressed flag.
    pub fn wif(&self) -> String {
        self.private_key.to_wif()
    }

    /// 33-byte compressed public key as lowercase hex.
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key.to_bytes())
    }

    /// The witness-v0 keyhash script paying to this key.
    pub fn script_pubkey(&self) -> ScriptBuf {
        self.address.script_pubkey()
    }
}

impl fmt::Debug for SpendingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpendingKey")
            .field("address", &self.address.to_string())
            .field("public_key", &self.public_key_hex())
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

fn walk<C: Signing>(
    secp: &Secp256k1<C>,
    master: Xpriv,
    steps: &[ChildNumber],
) -> Result<Xpriv, WalletError> {
    steps.iter().enumerate().try_fold(master, |parent, (i, step)| {
        parent
            .derive_priv(secp, &[*step])
            .map_err(|e| WalletError::KeyDerivation {
                depth: i + 1,
                reason: format!("{step}: {e}"),
            })
    })
}
