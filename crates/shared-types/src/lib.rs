// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Shared types for the NFT mint gateway
//!
//! This crate provides domain types that are shared across the workspace:
//! the NEAR network selector, license records and the wallet transaction
//! payload built when minting.

pub mod license;
pub mod network;
pub mod transaction;

pub use license::{LicenseRecord, domain_from_origin};
pub use network::{Network, NetworkParseError};
pub use transaction::{Action, FunctionCallParams, MintArgs, TokenMetadata, Transaction};
