//! Encoding and decoding of payment headers.
//!
//! Both payment headers carry plain (not base64) JSON:
//!
//! - `X-Payment` holds [`PaymentRequirements`]
//! - `X-Payment-Response` holds a [`Payment`]

use pay402::{Payment, PaymentRequirements};

use crate::constants::{X_PAYMENT_HEADER, X_PAYMENT_RESPONSE_HEADER};
use crate::error::HttpError;

/// Encodes [`PaymentRequirements`] for the `X-Payment` header.
///
/// # Errors
///
/// Returns [`HttpError::Json`] if JSON serialization fails.
pub fn encode_payment_requirements(requirements: &PaymentRequirements) -> Result<String, HttpError> {
    Ok(requirements.to_json()?)
}

/// Decodes an `X-Payment` header value.
///
/// # Errors
///
/// Returns [`HttpError::EmptyHeader`] for a blank value and
/// [`HttpError::Json`] if the value is not a valid requirements object.
pub fn decode_payment_requirements(header_value: &[u8]) -> Result<PaymentRequirements, HttpError> {
    let bytes = non_empty(header_value, X_PAYMENT_HEADER)?;
    Ok(serde_json::from_slice(bytes)?)
}

/// Encodes a [`Payment`] for the `X-Payment-Response` header.
///
/// # Errors
///
/// Returns [`HttpError::Json`] if JSON serialization fails.
pub fn encode_payment(payment: &Payment) -> Result<String, HttpError> {
    Ok(payment.to_json()?)
}

/// Decodes an `X-Payment-Response` header value.
///
/// # Errors
///
/// Returns [`HttpError::EmptyHeader`] for a blank value and
/// [`HttpError::Json`] if the value is not a valid payment object.
pub fn decode_payment(header_value: &[u8]) -> Result<Payment, HttpError> {
    let bytes = non_empty(header_value, X_PAYMENT_RESPONSE_HEADER)?;
    Ok(serde_json::from_slice(bytes)?)
}

fn non_empty<'a>(value: &'a [u8], header: &'static str) -> Result<&'a [u8], HttpError> {
    let trimmed = value.trim_ascii();
    if trimmed.is_empty() {
        Err(HttpError::EmptyHeader(header))
    } else {
        Ok(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requirements_header_round_trip() {
        let requirements = PaymentRequirements::exact("5", "0xToken", "8453", "0xRecipient")
            .with_nonce("n-1");
        let encoded = encode_payment_requirements(&requirements).unwrap();
        assert!(encoded.starts_with('{'));
        let decoded = decode_payment_requirements(encoded.as_bytes()).unwrap();
        assert_eq!(decoded, requirements);
    }

    #[test]
    fn blank_headers_are_rejected() {
        assert!(matches!(
            decode_payment(b"   "),
            Err(HttpError::EmptyHeader(X_PAYMENT_RESPONSE_HEADER))
        ));
        assert!(matches!(
            decode_payment_requirements(b""),
            Err(HttpError::EmptyHeader(X_PAYMENT_HEADER))
        ));
    }

    #[test]
    fn malformed_payment_is_a_json_error() {
        assert!(matches!(decode_payment(b"{not json"), Err(HttpError::Json(_))));
        assert!(matches!(
            decode_payment(br#"{"scheme":"exact"}"#),
            Err(HttpError::Json(_))
        ));
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let payment = Payment::for_requirements(
            &PaymentRequirements::exact("5", "0xToken", "8453", "0xRecipient"),
            "0xtx",
            "0xSender",
        );
        let encoded = format!("  {}  ", encode_payment(&payment).unwrap());
        assert_eq!(decode_payment(encoded.as_bytes()).unwrap(), payment);
    }
}
