// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! External API integrations for the NFT mint gateway
//!
//! This crate provides one client per outbound collaborator, plus the
//! [`registry::ServiceRegistry`] that owns them for the lifetime of the server.
//!
//! # Architecture
//!
//! - **Image pipeline**: [`openai`] generates images, [`resize`] shrinks them to base64
//! - **Storage**: [`arweave`] uploads media and returns a content id
//! - **Indexer**: [`indexer`] resolves tokens and metadata through Mintbase GraphQL
//! - **Licensing**: [`firestore`] reads license records, [`license`] asks a verification endpoint
//! - **Wallet**: [`wallet`] builds sign-transaction and marketplace links
//! - **Validation Utilities**: [`non_empty_string::NonEmptyString`] for credentials and identifiers
//!
//! Every client owns a `reqwest::Client` with a per-request timeout, maps its
//! failures into a client-specific error and converts that into
//! [`api_client::ApiError`].

use url::Url;

pub mod arweave;
pub mod firestore;
pub mod indexer;
pub mod license;
pub mod non_empty_string;
pub mod openai;
pub mod registry;
pub mod resize;
pub mod wallet;

pub use arweave::*;
pub use firestore::*;
pub use indexer::*;
pub use license::*;
pub use non_empty_string::NonEmptyString;
pub use openai::*;
pub use registry::*;
pub use resize::*;
pub use wallet::*;

/// User agent sent with every outbound request
pub(crate) const USER_AGENT: &str = concat!("nft-mint-gateway/", env!("CARGO_PKG_VERSION"));

/// Join `path` onto `base`, treating `base` as a directory even without a trailing slash
pub(crate) fn join_path(base: &Url, path: &str) -> Result<Url, url::ParseError> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        base.set_path(&format!("{}/", base.path()));
    }
    base.join(path)
}
