// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Wallet transaction payloads
//!
//! These types mirror the `transactions_data` JSON understood by the wallet
//! `sign-transaction` page. Field names on the wire are camelCase except for
//! contract call arguments, which are passed to the contract verbatim.

use serde::{Deserialize, Serialize};

/// Contract method invoked to mint a token
pub const MINT_METHOD: &str = "mint";

/// Off-chain metadata attached to a minted token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    /// Content id of the uploaded media
    pub reference: String,
    /// Token title
    pub title: String,
    /// Token description
    pub description: String,
}

/// Arguments of the minter contract's `mint` method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintArgs {
    /// Token metadata, serialized as a JSON string
    pub metadata: String,
    /// NFT contract the token is minted on
    pub nft_contract_id: String,
    /// Explicit token id, when the caller picked one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_id: Option<String>,
}

impl MintArgs {
    /// Build mint arguments, serializing `metadata` into the string form the contract expects
    ///
    /// # Errors
    ///
    /// Returns a `serde_json::Error` if the metadata cannot be serialized.
    pub fn new(
        metadata: &TokenMetadata,
        nft_contract_id: impl Into<String>,
        token_id: Option<String>,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            metadata: serde_json::to_string(metadata)?,
            nft_contract_id: nft_contract_id.into(),
            token_id,
        })
    }
}

/// Parameters of a function-call action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionCallParams {
    /// Contract method name
    pub method_name: String,
    /// Method arguments
    pub args: MintArgs,
    /// Attached gas in yoctoNEAR gas units, as a decimal string
    pub gas: String,
    /// Attached deposit in yoctoNEAR, as a decimal string
    pub deposit: String,
}

/// A single action inside a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "params")]
pub enum Action {
    /// Call a contract method
    FunctionCall(FunctionCallParams),
}

/// A transaction awaiting user signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Contract receiving the transaction
    pub receiver_id: String,
    /// Signer account; empty lets the wallet use the connected account
    pub signer_id: String,
    /// Actions executed in order
    pub actions: Vec<Action>,
}

impl Transaction {
    /// A transaction calling `mint` on `minter` with the given arguments
    pub fn mint(
        minter: impl Into<String>,
        args: MintArgs,
        gas: impl Into<String>,
        deposit: impl Into<String>,
    ) -> Self {
        Self {
            receiver_id: minter.into(),
            signer_id: String::new(),
            actions: vec![Action::FunctionCall(FunctionCallParams {
                method_name: MINT_METHOD.to_string(),
                args,
                gas: gas.into(),
                deposit: deposit.into(),
            })],
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    fn metadata() -> TokenMetadata {
        TokenMetadata {
            reference: "abc123".to_string(),
            title: "Sunset".to_string(),
            description: "A \"quoted\" sunset".to_string(),
        }
    }

    #[test]
    fn mint_args_embed_metadata_as_string() {
        let args = MintArgs::new(&metadata(), "nft.testnet", None).unwrap();
        let parsed: Value = serde_json::from_str(&args.metadata).unwrap();
        assert_eq!(parsed["reference"], "abc123");
        assert_eq!(parsed["title"], "Sunset");
        assert_eq!(parsed["description"], "A \"quoted\" sunset");
    }

    #[test]
    fn mint_transaction_wire_shape() {
        let args = MintArgs::new(&metadata(), "nft.testnet", None).unwrap();
        let tx = Transaction::mint("minter.testnet", args, "300", "10");
        let value = serde_json::to_value(&tx).unwrap();

        assert_eq!(value["receiverId"], "minter.testnet");
        assert_eq!(value["signerId"], "");
        let action = &value["actions"][0];
        assert_eq!(action["type"], "FunctionCall");
        assert_eq!(action["params"]["methodName"], "mint");
        assert_eq!(action["params"]["gas"], "300");
        assert_eq!(action["params"]["deposit"], "10");
        assert_eq!(action["params"]["args"]["nft_contract_id"], "nft.testnet");
        assert!(action["params"]["args"].get("token_id").is_none());
    }

    #[test]
    fn token_id_is_forwarded_when_present() {
        let args = MintArgs::new(&metadata(), "nft.testnet", Some("42".to_string())).unwrap();
        let value = serde_json::to_value(&args).unwrap();
        assert_eq!(value["token_id"], json!("42"));
    }
}
