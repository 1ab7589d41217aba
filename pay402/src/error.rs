//! Error types for payment verification.

/// Boxed error type used where a collaborator's concrete error is opaque.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised by a [`PaymentVerifier`](crate::PaymentVerifier).
///
/// A verifier error means the payment could not be checked at all; a
/// payment that was checked and found wanting is reported as `Ok(false)`.
#[derive(Debug, thiserror::Error)]
pub enum VerifierError {
    /// The payment uses a scheme the verifier does not support.
    #[error("unsupported payment scheme: {0}")]
    UnsupportedScheme(String),

    /// The payment is missing a field required for verification.
    #[error("payment is missing {0}")]
    MissingField(&'static str),

    /// A facilitator could not be reached or answered with an error.
    #[error("facilitator error: {0}")]
    Facilitator(#[source] BoxError),

    /// Any other failure of a custom verifier.
    #[error("{0}")]
    Other(#[source] BoxError),
}

impl VerifierError {
    /// Wraps a facilitator error.
    pub fn facilitator<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Facilitator(Box::new(err))
    }

    /// Wraps an error raised by a custom verifier.
    pub fn other<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Other(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn other_keeps_the_message_of_the_wrapped_error() {
        let err = VerifierError::other("ledger offline");
        assert!(matches!(err, VerifierError::Other(_)));
        assert_eq!(err.to_string(), "ledger offline");
    }
}
