// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! NEAR network selector
//!
//! Every deployment targets exactly one NEAR network. The selector decides
//! which contract ids, wallet and indexer endpoints are used for minting and
//! token lookups.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use utoipa::ToSchema;

/// Supported NEAR networks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, ToSchema)]
pub enum Network {
    /// NEAR testnet
    #[default]
    Testnet,
    /// NEAR mainnet
    Mainnet,
}

/// Error returned when a network name cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown network '{0}', expected 'testnet' or 'mainnet'")]
pub struct NetworkParseError(pub String);

impl Network {
    /// Lowercase network name as used in configuration and NEAR account suffixes
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Testnet => "testnet",
            Self::Mainnet => "mainnet",
        }
    }

    /// Returns all supported networks
    pub const fn all() -> &'static [Self] {
        &[Self::Testnet, Self::Mainnet]
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = NetworkParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "testnet" => Ok(Self::Testnet),
            "mainnet" => Ok(Self::Mainnet),
            _ => Err(NetworkParseError(s.to_string())),
        }
    }
}

impl Serialize for Network {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Network {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Network::from_str(&raw).map_err(|_| {
            serde::de::Error::invalid_value(
                serde::de::Unexpected::Str(&raw),
                &"a supported network (testnet, mainnet)",
            )
        })
    }
}
