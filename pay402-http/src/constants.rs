//! HTTP-specific constants for the payment handshake.

/// Header carrying JSON [`PaymentRequirements`](pay402::PaymentRequirements)
/// (server → client).
pub const X_PAYMENT_HEADER: &str = "X-Payment";

/// Header carrying a JSON [`Payment`](pay402::Payment) (client → server).
pub const X_PAYMENT_RESPONSE_HEADER: &str = "X-Payment-Response";

/// Value of the `WWW-Authenticate` header on 402 responses.
pub const WWW_AUTHENTICATE_VALUE: &str = "X-Payment";

/// Facilitator endpoint for payment verification.
pub const VERIFY_PATH: &str = "/verify";

/// Facilitator endpoint for payment settlement.
pub const SETTLE_PATH: &str = "/settle";

/// Facilitator health endpoint.
pub const HEALTH_PATH: &str = "/health";
