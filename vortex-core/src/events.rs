//! Marketplace Event Bus
//!
//! Typed publish/subscribe for domain side effects (wallet connected,
//! transaction completed, NFT minted, ...). Subscribers are registered per
//! event kind and called synchronously in registration order. Publishing
//! never fails and returns nothing: a subscriber error is logged and the
//! remaining subscribers still run.

use crate::types::{Network, TokenId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

/// Events emitted by the marketplace services
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum MarketEvent {
    /// A user bound a wallet address
    WalletConnected {
        user_id: UserId,
        address: String,
        wallet_type: String,
        network: Network,
        #[serde(with = "chrono::serde::ts_seconds")]
        timestamp: DateTime<Utc>,
    },

    /// A user removed their wallet binding
    WalletDisconnected {
        user_id: UserId,
        #[serde(with = "chrono::serde::ts_seconds")]
        timestamp: DateTime<Utc>,
    },

    /// A ledger row was appended
    TransactionCompleted {
        transaction_id: i64,
        tx_type: String,
        sender_id: UserId,
        recipient_id: UserId,
        amount: Decimal,
        fee: Decimal,
        #[serde(with = "chrono::serde::ts_seconds")]
        timestamp: DateTime<Utc>,
    },

    /// A (mock) NFT was recorded
    NftMinted {
        token_id: TokenId,
        creator_wallet: String,
        royalty_count: usize,
        #[serde(with = "chrono::serde::ts_seconds")]
        timestamp: DateTime<Utc>,
    },

    /// A HURAII image was saved to a user's library
    ImageSaved {
        user_id: UserId,
        image_id: i64,
        agent: String,
        #[serde(with = "chrono::serde::ts_seconds")]
        timestamp: DateTime<Utc>,
    },

    /// An analytics action was recorded
    AnalyticsTracked {
        user_id: UserId,
        action_type: String,
        #[serde(with = "chrono::serde::ts_seconds")]
        timestamp: DateTime<Utc>,
    },

    /// License activated or deactivated
    LicenseChanged {
        status: String,
        #[serde(with = "chrono::serde::ts_seconds")]
        timestamp: DateTime<Utc>,
    },
}

/// Discriminant used for subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    WalletConnected,
    WalletDisconnected,
    TransactionCompleted,
    NftMinted,
    ImageSaved,
    AnalyticsTracked,
    LicenseChanged,
}

impl MarketEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            MarketEvent::WalletConnected { .. } => EventKind::WalletConnected,
            MarketEvent::WalletDisconnected { .. } => EventKind::WalletDisconnected,
            MarketEvent::TransactionCompleted { .. } => EventKind::TransactionCompleted,
            MarketEvent::NftMinted { .. } => EventKind::NftMinted,
            MarketEvent::ImageSaved { .. } => EventKind::ImageSaved,
            MarketEvent::AnalyticsTracked { .. } => EventKind::AnalyticsTracked,
            MarketEvent::LicenseChanged { .. } => EventKind::LicenseChanged,
        }
    }
}

/// Listener for marketplace events
pub trait EventSubscriber: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Handle one event. Errors are logged by the bus, never propagated.
    fn on_event(&self, event: &MarketEvent) -> Result<(), String>;
}

/// Event bus: kind -> ordered subscriber list
#[derive(Default)]
pub struct EventBus {
    subscribers: RwLock<HashMap<EventKind, Vec<Arc<dyn EventSubscriber>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a subscriber for `kind`
    pub fn subscribe(&self, kind: EventKind, subscriber: Arc<dyn EventSubscriber>) {
        match self.subscribers.write() {
            Ok(mut map) => map.entry(kind).or_default().push(subscriber),
            Err(poisoned) => poisoned.into_inner().entry(kind).or_default().push(subscriber),
        }
    }

    /// Number of subscribers for `kind`
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        let map = match self.subscribers.read() {
            Ok(map) => map,
            Err(poisoned) => poisoned.into_inner(),
        };
        map.get(&kind).map_or(0, Vec::len)
    }

    /// Deliver `event` to every subscriber of its kind, in order
    pub fn publish(&self, event: &MarketEvent) {
        let kind = event.kind();
        // Clone the list so subscribers may subscribe without deadlocking
        let targets: Vec<Arc<dyn EventSubscriber>> = {
            let map = match self.subscribers.read() {
                Ok(map) => map,
                Err(poisoned) => poisoned.into_inner(),
            };
            map.get(&kind).cloned().unwrap_or_default()
        };

        debug!(?kind, subscribers = targets.len(), "publishing market event");

        for subscriber in targets {
            if let Err(e) = subscriber.on_event(event) {
                warn!(subscriber = subscriber.name(), ?kind, error = %e, "event subscriber failed");
            }
        }
    }
}

/// Subscriber that logs every event it receives
pub struct LoggingSubscriber;

impl EventSubscriber for LoggingSubscriber {
    fn name(&self) -> &str {
        "logging"
    }

    fn on_event(&self, event: &MarketEvent) -> Result<(), String> {
        tracing::info!(kind = ?event.kind(), "market event");
        Ok(())
    }
}
