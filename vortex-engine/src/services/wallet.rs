//! Wallet Manager
//!
//! TOLA balances and the single wallet binding per user. Signature checks go
//! through the [`VerifierRegistry`]; networks without a registered verifier
//! are refused rather than accepted.

use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;
use vortex_core::{
    format_wallet_address, validate_address, EventBus, MarketEvent, Network, UserId,
    VerifierRegistry, VortexError, WalletBinding,
};
use vortex_store::{LedgerRepository, WalletRepository};

use crate::error::EngineResult;

/// Wallet type recorded when the client sends none
pub const DEFAULT_WALLET_TYPE: &str = "metamask";

/// Result of a successful wallet connection
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ConnectedWallet {
    pub binding: WalletBinding,
    /// `0x1234...abcd` display form
    pub formatted_address: String,
}

/// Wallet manager
pub struct WalletManager {
    ledger: Arc<dyn LedgerRepository>,
    wallets: Arc<dyn WalletRepository>,
    verifiers: VerifierRegistry,
    events: Arc<EventBus>,
}

impl WalletManager {
    pub fn new(
        ledger: Arc<dyn LedgerRepository>,
        wallets: Arc<dyn WalletRepository>,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            ledger,
            wallets,
            verifiers: VerifierRegistry::with_defaults(),
            events,
        }
    }

    /// Replace the signature verifiers
    pub fn with_verifiers(mut self, verifiers: VerifierRegistry) -> Self {
        self.verifiers = verifiers;
        self
    }

    /// Sum of the user's points; zero when none exist
    pub async fn get_user_tola_balance(&self, user_id: UserId) -> EngineResult<Decimal> {
        Ok(self.ledger.balance(user_id).await?)
    }

    pub async fn connect_wallet(
        &self,
        user_id: UserId,
        address: &str,
        wallet_type: Option<&str>,
        network: Network,
    ) -> EngineResult<ConnectedWallet> {
        if user_id.is_anonymous() {
            return Err(VortexError::not_logged_in("connect a wallet").into());
        }
        let address = address.trim();
        if address.is_empty() {
            return Err(VortexError::missing("wallet_address").into());
        }
        validate_address(address, &network)?;

        let wallet_type = wallet_type
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_WALLET_TYPE)
            .to_string();

        let binding = WalletBinding {
            user_id,
            address: address.to_string(),
            wallet_type: wallet_type.clone(),
            network: network.clone(),
            connected_at: Utc::now(),
        };
        self.wallets.upsert(binding.clone()).await?;

        info!(user_id = %user_id, network = %network, wallet_type = %wallet_type, "wallet connected");
        self.events.publish(&MarketEvent::WalletConnected {
            user_id,
            address: binding.address.clone(),
            wallet_type,
            network,
            timestamp: binding.connected_at,
        });

        Ok(ConnectedWallet {
            formatted_address: format_wallet_address(&binding.address),
            binding,
        })
    }

    /// Remove the binding; succeeds whether or not one existed
    pub async fn disconnect_wallet(&self, user_id: UserId) -> EngineResult<()> {
        if user_id.is_anonymous() {
            return Err(VortexError::not_logged_in("disconnect a wallet").into());
        }
        let removed = self.wallets.delete(user_id).await?;
        info!(user_id = %user_id, removed, "wallet disconnected");
        self.events.publish(&MarketEvent::WalletDisconnected {
            user_id,
            timestamp: Utc::now(),
        });
        Ok(())
    }

    pub async fn get_wallet(&self, user_id: UserId) -> EngineResult<Option<WalletBinding>> {
        Ok(self.wallets.get(user_id).await?)
    }

    /// Verify that `signature` over `message` was produced by `address`
    pub fn verify_signature(
        &self,
        network: &Network,
        address: &str,
        message: &[u8],
        signature: &str,
    ) -> EngineResult<bool> {
        Ok(self.verifiers.verify(network, address, message, signature)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signer, SigningKey};
    use rand::rngs::OsRng;
    use vortex_store::VortexDatabase;

    const EVM: &str = "0x1234567890abcdef1234567890abcdef12345678";

    async fn manager() -> (WalletManager, VortexDatabase) {
        let db = VortexDatabase::in_memory().unwrap();
        db.init_schema().await.unwrap();
        let manager = WalletManager::new(
            db.ledger.clone(),
            db.wallets.clone(),
            Arc::new(EventBus::new()),
        );
        (manager, db)
    }

    #[tokio::test]
    async fn test_balance_defaults_to_zero() {
        let (manager, db) = manager().await;
        assert_eq!(manager.get_user_tola_balance(UserId(9)).await.unwrap(), Decimal::ZERO);

        db.ledger.award_points(UserId(9), Decimal::new(75, 1), "bonus").await.unwrap();
        assert_eq!(
            manager.get_user_tola_balance(UserId(9)).await.unwrap(),
            Decimal::new(75, 1)
        );
    }

    #[tokio::test]
    async fn test_connect_formats_and_stores() {
        let (manager, _db) = manager().await;
        let connected = manager
            .connect_wallet(UserId(3), EVM, None, Network::Polygon)
            .await
            .unwrap();
        assert_eq!(connected.formatted_address, "0x1234...5678");
        assert_eq!(connected.binding.wallet_type, DEFAULT_WALLET_TYPE);

        let stored = manager.get_wallet(UserId(3)).await.unwrap().unwrap();
        assert_eq!(stored.address, EVM);
        assert_eq!(stored.network, Network::Polygon);
    }

    #[tokio::test]
    async fn test_connect_rejects_bad_evm_address() {
        let (manager, _db) = manager().await;
        let err = manager
            .connect_wallet(UserId(3), "0x1234", Some("metamask"), Network::Ethereum)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "invalid_wallet_address");
        assert!(manager.get_wallet(UserId(3)).await.unwrap().is_none());

        let err = manager
            .connect_wallet(UserId::ANONYMOUS, EVM, None, Network::Polygon)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "auth_error");
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent() {
        let (manager, _db) = manager().await;
        manager
            .connect_wallet(UserId(3), "short", Some("phantom"), Network::Solana)
            .await
            .unwrap();
        manager.disconnect_wallet(UserId(3)).await.unwrap();
        manager.disconnect_wallet(UserId(3)).await.unwrap();
        assert!(manager.get_wallet(UserId(3)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_verify_signature_by_network() {
        let (manager, _db) = manager().await;
        let key = SigningKey::generate(&mut OsRng);
        let address = hex::encode(key.verifying_key().to_bytes());
        let signature = hex::encode(key.sign(b"connect wallet").to_bytes());

        assert!(manager
            .verify_signature(&Network::Solana, &address, b"connect wallet", &signature)
            .unwrap());
        assert!(!manager
            .verify_signature(&Network::Solana, &address, b"other message", &signature)
            .unwrap());

        let err = manager
            .verify_signature(&Network::Ethereum, EVM, b"connect wallet", &signature)
            .unwrap_err();
        assert_eq!(err.code(), "unsupported_network");
    }
}
