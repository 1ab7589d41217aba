//! Wire types for the payment handshake.
//!
//! [`PaymentRequirements`] travel server → client in the `X-Payment` header of
//! a 402 response. [`Payment`] travels client → server in the
//! `X-Payment-Response` header of the retried request. The verify/settle DTOs
//! are the JSON bodies of the facilitator API.
//!
//! All types serialize with camelCase field names, and optional fields are
//! omitted when unset.

use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use crate::timestamp::UnixTimestamp;

/// The `exact` payment scheme: the payment must transfer exactly the
/// required amount.
pub const SCHEME_EXACT: &str = "exact";

/// Payment details required by a server for a protected resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequirements {
    /// Payment scheme (e.g. `"exact"`).
    pub scheme: String,

    /// Amount in the smallest unit of the token.
    pub amount: String,

    /// Contract address of the payment token.
    pub token: String,

    /// Network identifier of the chain.
    pub chain: String,

    /// Address that should receive the payment.
    pub recipient: String,

    /// Unique identifier of this payment request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,

    /// When these requirements stop being payable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<UnixTimestamp>,

    /// URL of a facilitator able to verify the payment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facilitator: Option<String>,
}

impl PaymentRequirements {
    /// Creates requirements for the [`SCHEME_EXACT`] scheme.
    ///
    /// Nonce, expiry and facilitator are left unset.
    #[must_use]
    pub fn exact(
        amount: impl Into<String>,
        token: impl Into<String>,
        chain: impl Into<String>,
        recipient: impl Into<String>,
    ) -> Self {
        Self {
            scheme: SCHEME_EXACT.to_owned(),
            amount: amount.into(),
            token: token.into(),
            chain: chain.into(),
            recipient: recipient.into(),
            nonce: None,
            expiry: None,
            facilitator: None,
        }
    }

    /// Sets the nonce.
    #[must_use]
    pub fn with_nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }

    /// Sets the expiry.
    #[must_use]
    pub const fn with_expiry(mut self, expiry: UnixTimestamp) -> Self {
        self.expiry = Some(expiry);
        self
    }

    /// Sets the facilitator URL.
    #[must_use]
    pub fn with_facilitator(mut self, url: impl Into<String>) -> Self {
        self.facilitator = Some(url.into());
        self
    }

    /// Returns a copy with a generated nonce and an expiry of `now + ttl`
    /// wherever those fields are unset. Fields already set are kept.
    #[must_use]
    pub fn with_defaults<F>(&self, nonce: F, ttl: Duration) -> Self
    where
        F: FnOnce() -> String,
    {
        let mut filled = self.clone();
        if filled.nonce.as_deref().is_none_or(str::is_empty) {
            filled.nonce = Some(nonce());
        }
        if filled.expiry.is_none_or(|e| e.as_secs() == 0) {
            filled.expiry = Some(UnixTimestamp::now() + ttl);
        }
        filled
    }

    /// Returns `true` if an expiry is set and lies strictly before `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: UnixTimestamp) -> bool {
        self.expiry.is_some_and(|expiry| expiry < now)
    }

    /// Serializes to a JSON string.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parses from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if the input is not valid JSON for this type.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// A payment made by a client in answer to [`PaymentRequirements`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    /// Payment scheme used.
    pub scheme: String,

    /// Hash of the payment transaction.
    pub tx_hash: String,

    /// Network identifier of the chain.
    pub chain: String,

    /// Contract address of the payment token.
    pub token: String,

    /// Amount in the smallest unit of the token.
    pub amount: String,

    /// Address that sent the payment.
    pub sender: String,

    /// Address that received the payment.
    pub recipient: String,

    /// Nonce copied from the requirements being paid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,

    /// When the payment was made.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<UnixTimestamp>,
}

impl Payment {
    /// Builds a payment answering `requirements` exactly, stamped with the
    /// current time.
    #[must_use]
    pub fn for_requirements(
        requirements: &PaymentRequirements,
        tx_hash: impl Into<String>,
        sender: impl Into<String>,
    ) -> Self {
        Self {
            scheme: requirements.scheme.clone(),
            tx_hash: tx_hash.into(),
            chain: requirements.chain.clone(),
            token: requirements.token.clone(),
            amount: requirements.amount.clone(),
            sender: sender.into(),
            recipient: requirements.recipient.clone(),
            nonce: requirements.nonce.clone(),
            timestamp: Some(UnixTimestamp::now()),
        }
    }

    /// Serializes to a JSON string.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parses from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if the input is not valid JSON for this type.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Body of `POST /verify`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    /// Transaction to look up.
    pub tx_hash: String,
    /// Chain the transaction lives on.
    pub chain: String,
}

impl From<&Payment> for VerifyRequest {
    fn from(payment: &Payment) -> Self {
        Self {
            tx_hash: payment.tx_hash.clone(),
            chain: payment.chain.clone(),
        }
    }
}

/// Response of `POST /verify`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VerifyResponse {
    /// Whether the transaction is a valid payment.
    pub valid: bool,
    /// Verified transaction hash.
    pub tx_hash: String,
    /// Chain of the transaction.
    pub chain: String,
    /// Token transferred.
    pub token: String,
    /// Amount transferred.
    pub amount: String,
    /// Sender of the transfer.
    pub sender: String,
    /// Recipient of the transfer.
    pub recipient: String,
    /// Reason the payment is invalid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Body of `POST /settle`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleRequest {
    /// The payment to settle.
    pub payment: Payment,
}

/// Response of `POST /settle`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleResponse {
    /// Whether the payment was settled.
    pub settled: bool,
    /// Settled transaction hash.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    /// Reason settlement failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// When settlement happened.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<UnixTimestamp>,
}

/// Response of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"` when the service answers.
    pub status: String,
    /// Version of the facilitator service.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
}

impl HealthResponse {
    /// Creates a healthy response reporting `version`.
    #[must_use]
    pub fn ok(version: impl Into<String>) -> Self {
        Self {
            status: "ok".to_owned(),
            version: version.into(),
        }
    }
}

/// A verified payment attached to a single request.
///
/// Inserted into the request extensions by the payment gate once the
/// verifier accepts the payment; dropped with the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentContext {
    /// The payment sent by the client.
    pub payment: Payment,
    /// Whether the payment passed verification.
    pub verified: bool,
    /// When verification completed.
    pub verified_at: SystemTime,
}

impl PaymentContext {
    /// Creates a context for a payment verified just now.
    #[must_use]
    pub fn verified(payment: Payment) -> Self {
        Self {
            payment,
            verified: true,
            verified_at: SystemTime::now(),
        }
    }
}
