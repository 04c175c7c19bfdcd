//! Wallet Addresses and Signatures
//!
//! Address validation is format-only. EVM networks (ethereum, polygon) must
//! match `0x` + 40 hex chars; other networks accept any non-empty string.
//!
//! Signature verification goes through [`SignatureVerifier`]. Solana keys
//! are Ed25519 and are verified with `ed25519-dalek`; keys and signatures
//! may be base58 (the wallet-native form) or hex. EVM (secp256k1)
//! recovery is not wired in, so those networks report
//! [`VortexError::UnsupportedNetwork`] instead of pretending success.

use crate::error::{VortexError, VortexResult};
use crate::types::Network;
use ed25519_dalek::{Signature as DalekSignature, Verifier, VerifyingKey};
use once_cell::sync::Lazy;
use regex::Regex;

static EVM_ADDRESS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^0x[a-fA-F0-9]{40}$").expect("Invalid EVM address regex"));

/// Check an address against its network's format
pub fn is_valid_address(address: &str, network: &Network) -> bool {
    if network.is_evm() {
        EVM_ADDRESS.is_match(address)
    } else {
        !address.is_empty()
    }
}

/// Validate, returning the error used at the boundary
pub fn validate_address(address: &str, network: &Network) -> VortexResult<()> {
    if is_valid_address(address, network) {
        Ok(())
    } else {
        Err(VortexError::InvalidWalletAddress {
            address: address.to_string(),
            network: network.to_string(),
        })
    }
}

/// `0x1234...abcd` style display form; short addresses are returned as-is
pub fn format_wallet_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 12 {
        return address.to_string();
    }
    let prefix: String = chars[..6].iter().collect();
    let suffix: String = chars[chars.len() - 4..].iter().collect();
    format!("{prefix}...{suffix}")
}

/// Verifies that `signature` over `message` was produced by `address`
pub trait SignatureVerifier: Send + Sync {
    /// Networks this verifier handles
    fn supports(&self, network: &Network) -> bool;

    /// `Ok(false)` for a well-formed but wrong signature; `Err` for
    /// malformed input or an unsupported network.
    fn verify(
        &self,
        network: &Network,
        address: &str,
        message: &[u8],
        signature: &str,
    ) -> VortexResult<bool>;
}

/// Ed25519 verifier for Solana-style wallets.
///
/// The address is the 32-byte public key and the signature is 64 bytes.
/// Exactly `2 * N` hex digits (optionally `0x` prefixed) decode as hex;
/// anything else decodes as base58.
#[derive(Debug, Default, Clone, Copy)]
pub struct Ed25519Verifier;

impl Ed25519Verifier {
    fn decode_fixed<const N: usize>(what: &str, value: &str) -> VortexResult<[u8; N]> {
        let invalid = |e: String| VortexError::InvalidSignatureEncoding {
            reason: format!("{what}: {e}"),
        };
        let stripped = value.strip_prefix("0x").unwrap_or(value);
        let is_hex = stripped.len() == 2 * N && stripped.bytes().all(|b| b.is_ascii_hexdigit());
        let bytes = if is_hex || value.starts_with("0x") {
            hex::decode(stripped).map_err(|e| invalid(e.to_string()))?
        } else {
            bs58::decode(value)
                .into_vec()
                .map_err(|e| invalid(e.to_string()))?
        };
        bytes
            .as_slice()
            .try_into()
            .map_err(|_| VortexError::InvalidSignatureEncoding {
                reason: format!("{what}: expected {N} bytes, got {}", bytes.len()),
            })
    }
}

impl SignatureVerifier for Ed25519Verifier {
    fn supports(&self, network: &Network) -> bool {
        matches!(network, Network::Solana)
    }

    fn verify(
        &self,
        network: &Network,
        address: &str,
        message: &[u8],
        signature: &str,
    ) -> VortexResult<bool> {
        if !self.supports(network) {
            return Err(VortexError::UnsupportedNetwork {
                network: network.to_string(),
            });
        }

        let key_bytes: [u8; 32] = Self::decode_fixed("public key", address)?;
        let sig_bytes: [u8; 64] = Self::decode_fixed("signature", signature)?;

        let key = VerifyingKey::from_bytes(&key_bytes).map_err(|e| {
            VortexError::InvalidSignatureEncoding {
                reason: format!("public key: {e}"),
            }
        })?;
        let sig = DalekSignature::from_bytes(&sig_bytes);

        Ok(key.verify(message, &sig).is_ok())
    }
}

/// Dispatches to the first registered verifier that supports the network
#[derive(Default)]
pub struct VerifierRegistry {
    verifiers: Vec<Box<dyn SignatureVerifier>>,
}

impl VerifierRegistry {
    /// Registry with every built-in verifier
    pub fn with_defaults() -> Self {
        let mut registry = Self::default();
        registry.register(Box::new(Ed25519Verifier));
        registry
    }

    pub fn register(&mut self, verifier: Box<dyn SignatureVerifier>) {
        self.verifiers.push(verifier);
    }

    pub fn verify(
        &self,
        network: &Network,
        address: &str,
        message: &[u8],
        signature: &str,
    ) -> VortexResult<bool> {
        let verifier = self
            .verifiers
            .iter()
            .find(|v| v.supports(network))
            .ok_or_else(|| VortexError::UnsupportedNetwork {
                network: network.to_string(),
            })?;
        verifier.verify(network, address, message, signature)
    }
}
