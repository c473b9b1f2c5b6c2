// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Wallet and marketplace links
//!
//! Minting happens in the user's wallet: the gateway only builds a
//! `sign-transaction` deep link carrying the mint transaction, plus links to
//! the marketplace page of a minted token. No request leaves the process.

use api_client::ApiError;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use shared_types::{MintArgs, TokenMetadata, Transaction};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::{NonEmptyString, join_path};

/// Gas attached to a mint call (200 Tgas)
pub const DEFAULT_MINT_GAS: &str = "200000000000000";
/// Deposit attached to a mint call, in yoctoNEAR (0.01 NEAR)
pub const DEFAULT_MINT_DEPOSIT: &str = "10000000000000000000000";

/// Characters `encodeURIComponent` escapes: everything but `A-Z a-z 0-9 - _ . ! ~ * ' ( )`
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Configuration for wallet and marketplace links
#[derive(Debug, Clone)]
pub struct WalletConfig {
    /// Base URL of the wallet
    pub wallet_url: Url,
    /// Base URL of the marketplace
    pub marketplace_url: Url,
    /// Minter contract receiving the mint call
    pub minter: NonEmptyString,
    /// NFT contract the token is minted on
    pub nft_contract: NonEmptyString,
    /// Gas attached to the mint call
    pub gas: String,
    /// Deposit attached to the mint call
    pub deposit: String,
}

/// Errors produced while building links
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum WalletError {
    /// Gas or deposit is not an unsigned integer
    #[error("invalid {field} amount '{value}': expected an unsigned integer")]
    InvalidAmount { field: &'static str, value: String },

    /// Base URL cannot be extended
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Transaction could not be serialized
    #[error("failed to serialize transaction: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<WalletError> for ApiError {
    fn from(value: WalletError) -> Self {
        match value {
            WalletError::InvalidAmount { .. } => ApiError::Configuration {
                message: value.to_string(),
            },
            WalletError::Url(error) => ApiError::Configuration {
                message: error.to_string(),
            },
            WalletError::Json(error) => ApiError::Custom {
                error: anyhow::Error::new(error),
            },
        }
    }
}

/// Everything needed to mint one token
#[derive(Debug, Clone, Copy)]
pub struct MintDraft<'a> {
    /// Content id of the uploaded media
    pub content_id: &'a str,
    /// Token title
    pub title: &'a str,
    /// Token description
    pub description: &'a str,
    /// Where the wallet returns after signing
    pub callback_url: &'a str,
    /// Explicit token id
    pub token_id: Option<&'a str>,
}

/// Builds wallet sign URLs and marketplace links for one network
#[derive(Debug, Clone)]
pub struct MintbaseLinks {
    config: WalletConfig,
}

impl MintbaseLinks {
    /// Create a link builder, validating the gas and deposit amounts
    ///
    /// # Errors
    ///
    /// Returns `WalletError::InvalidAmount` if gas or deposit is not a decimal integer.
    pub fn new(config: WalletConfig) -> Result<Self, WalletError> {
        for (field, value) in [("gas", &config.gas), ("deposit", &config.deposit)] {
            if value.parse::<u128>().is_err() {
                return Err(WalletError::InvalidAmount {
                    field,
                    value: value.clone(),
                });
            }
        }
        Ok(Self { config })
    }

    /// NFT contract tokens are minted on
    pub fn nft_contract(&self) -> &str {
        self.config.nft_contract.as_str()
    }

    /// Mint transaction for `draft`
    ///
    /// # Errors
    ///
    /// Returns `WalletError::Json` if the metadata cannot be serialized.
    pub fn mint_transaction(&self, draft: &MintDraft<'_>) -> Result<Transaction, WalletError> {
        let metadata = TokenMetadata {
            reference: draft.content_id.to_string(),
            title: draft.title.to_string(),
            description: draft.description.to_string(),
        };
        let args = MintArgs::new(
            &metadata,
            self.config.nft_contract.as_str(),
            draft.token_id.map(ToString::to_string),
        )?;

        Ok(Transaction::mint(
            self.config.minter.as_str(),
            args,
            &self.config.gas,
            &self.config.deposit,
        ))
    }

    /// Wallet URL asking the user to sign the mint transaction for `draft`
    ///
    /// # Errors
    ///
    /// Returns a `WalletError` if the transaction cannot be serialized or the
    /// wallet URL cannot be extended.
    pub fn sign_url(&self, draft: &MintDraft<'_>) -> Result<Url, WalletError> {
        let transactions = [self.mint_transaction(draft)?];
        let transactions_data = serde_json::to_string(&transactions)?;

        let mut url = join_path(&self.config.wallet_url, "sign-transaction")?;
        url.query_pairs_mut()
            .append_pair("transactions_data", &transactions_data)
            .append_pair("callback_url", draft.callback_url);

        debug!(content_id = draft.content_id, "built sign URL");
        Ok(url)
    }

    /// Marketplace page of the token with `metadata_id`, percent-encoded as a whole
    ///
    /// The id is inserted as is and the URL encoded once with
    /// `encodeURIComponent` rules, the form embedding widgets pass around as
    /// a single query value.
    pub fn token_page_link(&self, metadata_id: &str) -> String {
        let page = format!(
            "{}/meta/{metadata_id}",
            self.config.marketplace_url.as_str().trim_end_matches('/')
        );
        utf8_percent_encode(&page, URI_COMPONENT).to_string()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;

    fn links() -> MintbaseLinks {
        MintbaseLinks::new(WalletConfig {
            wallet_url: Url::parse("https://testnet.wallet.mintbase.xyz").unwrap(),
            marketplace_url: Url::parse("https://testnet.mintbase.xyz").unwrap(),
            minter: NonEmptyString::new("minter.testnet").unwrap(),
            nft_contract: NonEmptyString::new("woo.mintspace2.testnet").unwrap(),
            gas: DEFAULT_MINT_GAS.to_string(),
            deposit: DEFAULT_MINT_DEPOSIT.to_string(),
        })
        .unwrap()
    }

    fn draft() -> MintDraft<'static> {
        MintDraft {
            content_id: "arweave-id",
            title: "Sunset & sea",
            description: "Calm \"evening\"",
            callback_url: "https://shop.example/done?x=1",
            token_id: None,
        }
    }

    #[test]
    fn rejects_non_numeric_amounts() {
        let mut config = links().config;
        config.deposit = "0.01".to_string();
        assert!(matches!(
            MintbaseLinks::new(config),
            Err(WalletError::InvalidAmount {
                field: "deposit",
                ..
            })
        ));
    }

    #[test]
    fn sign_url_round_trips_transaction() {
        let url = links().sign_url(&draft()).unwrap();
        assert_eq!(url.path(), "/sign-transaction");

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs[0].0, "transactions_data");
        assert_eq!(pairs[1], ("callback_url".to_string(), "https://shop.example/done?x=1".to_string()));

        let transactions: Value = serde_json::from_str(&pairs[0].1).unwrap();
        let tx = &transactions[0];
        assert_eq!(tx["receiverId"], "minter.testnet");
        assert_eq!(tx["signerId"], "");
        let params = &tx["actions"][0]["params"];
        assert_eq!(params["methodName"], "mint");
        assert_eq!(params["gas"], DEFAULT_MINT_GAS);
        assert_eq!(params["deposit"], DEFAULT_MINT_DEPOSIT);
        assert_eq!(params["args"]["nft_contract_id"], "woo.mintspace2.testnet");

        let metadata: Value =
            serde_json::from_str(params["args"]["metadata"].as_str().unwrap()).unwrap();
        assert_eq!(metadata["reference"], "arweave-id");
        assert_eq!(metadata["title"], "Sunset & sea");
        assert_eq!(metadata["description"], "Calm \"evening\"");
    }

    #[test]
    fn token_id_reaches_mint_args() {
        let draft = MintDraft {
            token_id: Some("7"),
            ..draft()
        };
        let tx = links().mint_transaction(&draft).unwrap();
        let shared_types::Action::FunctionCall(params) = &tx.actions[0];
        assert_eq!(params.args.token_id.as_deref(), Some("7"));
    }

    #[test]
    fn token_page_link_is_fully_encoded() {
        let link = links().token_page_link("woo.mintspace2.testnet:abc123");
        assert_eq!(
            link,
            "https%3A%2F%2Ftestnet.mintbase.xyz%2Fmeta%2Fwoo.mintspace2.testnet%3Aabc123"
        );
    }

    #[test]
    fn token_page_link_encodes_id_once() {
        let link = links().token_page_link("c.testnet:a b~(1)");
        assert_eq!(
            link,
            "https%3A%2F%2Ftestnet.mintbase.xyz%2Fmeta%2Fc.testnet%3Aa%20b~(1)"
        );

        let mut config = links().config;
        config.marketplace_url = Url::parse("https://market.example/base/").unwrap();
        let link = MintbaseLinks::new(config).unwrap().token_page_link("x!*'y");
        assert_eq!(link, "https%3A%2F%2Fmarket.example%2Fbase%2Fmeta%2Fx!*'y");
    }
}
