#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! HTTP transport for the 402 payment handshake.
//!
//! Provides header names and codecs plus (feature-gated) client and server
//! middleware.
//!
//! # Modules
//!
//! - [`constants`] - HTTP header names and fixed header values
//! - [`headers`] - JSON encoding/decoding of payment headers
//! - [`error`] - HTTP transport error types
//! - [`client`] - reqwest middleware that pays and retries on 402 (feature: `client`)
//! - [`server`] - tower payment gate and remote facilitator client (feature: `server`)

pub mod constants;
pub mod error;
pub mod headers;

#[cfg(feature = "client")]
pub mod client;
#[cfg(feature = "server")]
pub mod server;
