//! Payment verification.
//!
//! The payment gate hands every decoded [`Payment`] to a [`PaymentVerifier`]
//! together with the [`PaymentRequirements`] it was supposed to satisfy.
//!
//! - [`FieldMatchVerifier`] compares chain, token, amount and recipient. It
//!   proves nothing about the transaction itself and is only a placeholder
//!   for an on-chain check.
//! - [`FacilitatorVerifier`] asks a [`Facilitator`] about the transaction and
//!   cross-checks what it reports.

use std::sync::Arc;

#[cfg(feature = "telemetry")]
use tracing::{debug, instrument};

use crate::error::VerifierError;
use crate::facilitator::Facilitator;
use crate::proto::{Payment, PaymentRequirements, SCHEME_EXACT, VerifyRequest, VerifyResponse};

/// Decides whether a payment satisfies a set of requirements.
///
/// Return `Ok(false)` for a payment that was checked and rejected, and
/// `Err` when the check itself could not be carried out.
#[async_trait::async_trait]
pub trait PaymentVerifier: Send + Sync {
    /// Verifies `payment` against `requirements`.
    async fn verify(
        &self,
        payment: &Payment,
        requirements: &PaymentRequirements,
    ) -> Result<bool, VerifierError>;
}

#[async_trait::async_trait]
impl<T> PaymentVerifier for Arc<T>
where
    T: PaymentVerifier + ?Sized,
{
    async fn verify(
        &self,
        payment: &Payment,
        requirements: &PaymentRequirements,
    ) -> Result<bool, VerifierError> {
        (**self).verify(payment, requirements).await
    }
}

/// Accepts a payment whose chain, token, amount and recipient equal the
/// requirements.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldMatchVerifier;

impl FieldMatchVerifier {
    /// Returns the name of the first field that differs, if any.
    #[must_use]
    pub fn mismatch(payment: &Payment, requirements: &PaymentRequirements) -> Option<&'static str> {
        if payment.chain != requirements.chain {
            Some("chain")
        } else if payment.token != requirements.token {
            Some("token")
        } else if payment.amount != requirements.amount {
            Some("amount")
        } else if payment.recipient != requirements.recipient {
            Some("recipient")
        } else {
            None
        }
    }
}

#[async_trait::async_trait]
impl PaymentVerifier for FieldMatchVerifier {
    async fn verify(
        &self,
        payment: &Payment,
        requirements: &PaymentRequirements,
    ) -> Result<bool, VerifierError> {
        match Self::mismatch(payment, requirements) {
            #[cfg_attr(not(feature = "telemetry"), allow(unused_variables))]
            Some(field) => {
                #[cfg(feature = "telemetry")]
                debug!(field, tx_hash = %payment.tx_hash, "Payment does not match requirements");
                Ok(false)
            }
            None => Ok(true),
        }
    }
}

/// Verifies payments by asking a [`Facilitator`] about the transaction.
///
/// Only the [`SCHEME_EXACT`] scheme is understood. The payment is first
/// checked with [`FieldMatchVerifier`]. The facilitator must then report the
/// transaction as valid, and every field it fills in (transaction hash,
/// chain, token, amount, recipient) must agree with the payment and the
/// requirements. Empty fields in the facilitator's answer are not compared.
#[derive(Debug, Clone)]
pub struct FacilitatorVerifier<F> {
    facilitator: F,
}

impl<F> FacilitatorVerifier<F> {
    /// Creates a verifier backed by `facilitator`.
    pub const fn new(facilitator: F) -> Self {
        Self { facilitator }
    }

    /// Returns the underlying facilitator.
    pub const fn facilitator(&self) -> &F {
        &self.facilitator
    }
}

/// Checks a facilitator's report against the payment and requirements.
fn report_matches(
    report: &VerifyResponse,
    payment: &Payment,
    requirements: &PaymentRequirements,
) -> bool {
    let agrees = |reported: &str, expected: &str| reported.is_empty() || reported == expected;
    report.valid
        && agrees(&report.tx_hash, &payment.tx_hash)
        && agrees(&report.chain, &requirements.chain)
        && agrees(&report.token, &requirements.token)
        && agrees(&report.amount, &requirements.amount)
        && agrees(&report.recipient, &requirements.recipient)
}

#[async_trait::async_trait]
impl<F> PaymentVerifier for FacilitatorVerifier<F>
where
    F: Facilitator,
{
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "pay402.verifier.facilitator", skip_all, fields(tx_hash = %payment.tx_hash), err)
    )]
    async fn verify(
        &self,
        payment: &Payment,
        requirements: &PaymentRequirements,
    ) -> Result<bool, VerifierError> {
        if payment.scheme != SCHEME_EXACT {
            return Err(VerifierError::UnsupportedScheme(payment.scheme.clone()));
        }
        if payment.tx_hash.is_empty() {
            return Err(VerifierError::MissingField("txHash"));
        }
        if FieldMatchVerifier::mismatch(payment, requirements).is_some() {
            return Ok(false);
        }

        let report = self
            .facilitator
            .verify(&VerifyRequest::from(payment))
            .await
            .map_err(VerifierError::facilitator)?;

        #[cfg(feature = "telemetry")]
        debug!(valid = report.valid, error = ?report.error, "Facilitator verification result");

        Ok(report_matches(&report, payment, requirements))
    }
}
