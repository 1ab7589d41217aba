//! In-process facilitator checking payment structure.
//!
//! [`LocalFacilitator`] answers verify and settle requests without talking to
//! any chain: a transaction is valid when it names a transaction hash and a
//! chain the facilitator accepts. It proves nothing about the transaction and
//! keeps no record of settled payments; real deployments put a chain-backed
//! [`Facilitator`] behind the same router.

use std::collections::BTreeSet;
use std::convert::Infallible;

use pay402::{
    Facilitator, Payment, SettleRequest, SettleResponse, UnixTimestamp, VerifyRequest,
    VerifyResponse,
};

/// Reasons a [`LocalFacilitator`] refuses a payment.
///
/// Reported in the `error` field of verify and settle responses.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocalFacilitatorError {
    /// The transaction hash is empty.
    #[error("missing transaction hash")]
    MissingTxHash,

    /// The chain is not in the accepted set.
    #[error("chain {0} is not accepted")]
    UnsupportedChain(String),
}

/// Facilitator validating the shape of a payment.
#[derive(Debug, Clone, Default)]
pub struct LocalFacilitator {
    accepted_chains: BTreeSet<String>,
}

impl LocalFacilitator {
    /// Creates a facilitator accepting the given chains.
    ///
    /// An empty set accepts every chain.
    pub fn new<I, S>(accepted_chains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            accepted_chains: accepted_chains.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the accepted chains; empty means every chain.
    pub const fn accepted_chains(&self) -> &BTreeSet<String> {
        &self.accepted_chains
    }

    /// Returns `true` if payments on `chain` are accepted.
    #[must_use]
    pub fn accepts(&self, chain: &str) -> bool {
        self.accepted_chains.is_empty() || self.accepted_chains.contains(chain)
    }

    fn check(&self, tx_hash: &str, chain: &str) -> Result<(), LocalFacilitatorError> {
        if tx_hash.is_empty() {
            return Err(LocalFacilitatorError::MissingTxHash);
        }
        if !self.accepts(chain) {
            return Err(LocalFacilitatorError::UnsupportedChain(chain.to_owned()));
        }
        Ok(())
    }
}

fn settled(payment: &Payment) -> SettleResponse {
    SettleResponse {
        settled: true,
        tx_hash: Some(payment.tx_hash.clone()),
        error: None,
        timestamp: Some(UnixTimestamp::now()),
    }
}

#[async_trait::async_trait]
impl Facilitator for LocalFacilitator {
    type Error = Infallible;

    async fn verify(&self, request: &VerifyRequest) -> Result<VerifyResponse, Infallible> {
        let response = match self.check(&request.tx_hash, &request.chain) {
            Ok(()) => VerifyResponse {
                valid: true,
                tx_hash: request.tx_hash.clone(),
                chain: request.chain.clone(),
                ..VerifyResponse::default()
            },
            Err(reason) => {
                tracing::debug!(tx_hash = %request.tx_hash, %reason, "Verification refused");
                VerifyResponse {
                    valid: false,
                    tx_hash: request.tx_hash.clone(),
                    chain: request.chain.clone(),
                    error: Some(reason.to_string()),
                    ..VerifyResponse::default()
                }
            }
        };
        Ok(response)
    }

    async fn settle(&self, request: &SettleRequest) -> Result<SettleResponse, Infallible> {
        let payment = &request.payment;
        let response = match self.check(&payment.tx_hash, &payment.chain) {
            Ok(()) => {
                tracing::info!(tx_hash = %payment.tx_hash, chain = %payment.chain, "Payment settled");
                settled(payment)
            }
            Err(reason) => SettleResponse {
                settled: false,
                error: Some(reason.to_string()),
                ..SettleResponse::default()
            },
        };
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pay402::PaymentRequirements;

    fn payment(chain: &str) -> Payment {
        let requirements = PaymentRequirements::exact("1000", "0xToken", chain, "0xRecipient");
        Payment::for_requirements(&requirements, "0xabc", "0xSender")
    }

    #[tokio::test]
    async fn empty_chain_set_accepts_everything() {
        let facilitator = LocalFacilitator::default();
        let response = facilitator
            .verify(&VerifyRequest::from(&payment("137")))
            .await
            .unwrap();
        assert!(response.valid);
        assert_eq!(response.tx_hash, "0xabc");
        assert_eq!(response.chain, "137");
        assert!(response.error.is_none());
    }

    #[tokio::test]
    async fn unknown_chain_is_invalid() {
        let facilitator = LocalFacilitator::new(["8453"]);
        let response = facilitator
            .verify(&VerifyRequest::from(&payment("1")))
            .await
            .unwrap();
        assert!(!response.valid);
        assert_eq!(response.error.as_deref(), Some("chain 1 is not accepted"));
    }

    #[tokio::test]
    async fn missing_tx_hash_is_invalid() {
        let facilitator = LocalFacilitator::new(["8453"]);
        let mut p = payment("8453");
        p.tx_hash.clear();
        let response = facilitator.verify(&VerifyRequest::from(&p)).await.unwrap();
        assert!(!response.valid);
        assert_eq!(response.error.as_deref(), Some("missing transaction hash"));
    }

    #[tokio::test]
    async fn settle_stamps_accepted_payment() {
        let facilitator = LocalFacilitator::new(["8453"]);
        let before = UnixTimestamp::now();
        let response = facilitator
            .settle(&SettleRequest { payment: payment("8453") })
            .await
            .unwrap();
        assert!(response.settled);
        assert_eq!(response.tx_hash.as_deref(), Some("0xabc"));
        assert!(response.timestamp.unwrap() >= before);

        let refused = facilitator
            .settle(&SettleRequest { payment: payment("10") })
            .await
            .unwrap();
        assert!(!refused.settled);
        assert!(refused.timestamp.is_none());
    }
}
