// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Server configuration module
//!
//! This module provides configuration structures and logic for the mint gateway,
//! supporting different environments, per-network profiles and validation of
//! configuration parameters.

use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    time::Duration,
};

use anyhow::{Result, anyhow, ensure};
use config::{Config, ConfigError, Environment as ConfigEnv, File};
use external_apis::{
    DEFAULT_FIRESTORE_BASE_URL, DEFAULT_IMAGE_MODEL, DEFAULT_IMAGE_SIZE, DEFAULT_IMAGE_STYLE,
    DEFAULT_LICENSE_COLLECTION, DEFAULT_MEDIA_FILE_NAME, DEFAULT_MINT_DEPOSIT, DEFAULT_MINT_GAS,
    DEFAULT_OPENAI_BASE_URL,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use shared_types::Network;
use url::Url;

use crate::error::{ServerError, ServerResult};

/// Width of the preview returned by generate-image
pub const DEFAULT_PREVIEW_WIDTH: u32 = 256;
/// Width of the image uploaded by mint
pub const DEFAULT_MINT_IMAGE_WIDTH: u32 = 512;
/// Deadline of a whole gateway request; at least the slowest pipeline's client timeouts
pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 180;

/// Flat variables of the serverless deployment and the key each one sets
const LEGACY_ENV_KEYS: &[(&str, &str)] = &[
    ("PORT", "port"),
    ("NETWORK", "network"),
    ("OPENAI_API_KEY", "external_apis.openai.api_key"),
    ("OPENAI_IMAGE_MODEL", "external_apis.openai.image_model"),
    ("OPENAI_IMAGE_SIZE", "external_apis.openai.image_size"),
    ("RESIZE_URL", "external_apis.resize.url"),
    ("RESIZE_WIDTH", "external_apis.resize.default_width"),
    ("NFT_CONTRACT_TESTNET", "networks.testnet.nft_contract"),
    ("NFT_CONTRACT_MAINNET", "networks.mainnet.nft_contract"),
    ("MINTER_TESTNET", "networks.testnet.minter"),
    ("MINTER_MAINNET", "networks.mainnet.minter"),
    ("MINTBASE_WALLET_TESTNET", "networks.testnet.wallet_url"),
    ("MINTBASE_WALLET_MAINNET", "networks.mainnet.wallet_url"),
    ("MINTBASE_BASE_URL_TESTNET", "networks.testnet.marketplace_url"),
    ("MINTBASE_BASE_URL_MAINNET", "networks.mainnet.marketplace_url"),
    ("MINTBASE_GRAPHQL_URL_TESTNET", "networks.testnet.indexer_url"),
    ("MINTBASE_GRAPHQL_URL_MAINNET", "networks.mainnet.indexer_url"),
    ("MINTBASE_GRAPHQL_API_KEY", "external_apis.indexer.api_key"),
    ("ARWEAVE_UPLOAD_URL", "external_apis.arweave.upload_url"),
    ("ARWEAVE_UPLOAD_API_KEY", "external_apis.arweave.api_key"),
    ("FIREBASE_API_KEY", "external_apis.firestore.api_key"),
    ("FIREBASE_PROJECT_ID", "external_apis.firestore.project_id"),
    ("LICENSE_VERIFY_URL", "external_apis.license_verification.url"),
];

/// A validated server port that ensures the value is appropriate for the environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerPort {
    port: u16,
    environment: Environment,
}

impl ServerPort {
    /// Create a new `ServerPort`, ensuring it's valid for the given environment
    ///
    /// # Errors
    ///
    /// Returns an error if the port is 0 in non-testing environments
    pub fn new(port: u16, environment: Environment) -> Result<Self> {
        if port == 0 && environment != Environment::Testing {
            return Err(anyhow!("port cannot be 0 in non-testing environments"));
        }
        Ok(Self { port, environment })
    }

    /// Create a safe default port for development
    pub const fn default_development() -> Self {
        Self {
            port: 3000,
            environment: Environment::Development,
        }
    }

    /// Create a safe testing port (port 0)
    pub const fn testing() -> Self {
        Self {
            port: 0,
            environment: Environment::Testing,
        }
    }

    /// Get the port value
    pub fn value(&self) -> u16 {
        self.port
    }
}

impl Serialize for ServerPort {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(self.port)
    }
}

impl<'de> Deserialize<'de> for ServerPort {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let port = u16::deserialize(deserializer)?;
        // validated again in `load` once the environment is known
        Ok(Self {
            port,
            environment: Environment::Development,
        })
    }
}

/// A validated timeout duration in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutSeconds(Duration);

impl TimeoutSeconds {
    /// Create a new `TimeoutSeconds`, ensuring the value is within valid bounds
    ///
    /// # Errors
    ///
    /// Returns an error if timeout is 0 or greater than 300 seconds
    pub fn new(seconds: u64) -> Result<Self> {
        ensure!(seconds != 0, "timeout must be greater than 0");
        ensure!(seconds <= 300, "timeout cannot exceed 300");
        Ok(Self(Duration::from_secs(seconds)))
    }

    /// Create a safe default timeout (30 seconds)
    pub const fn default_value() -> Self {
        Self(Duration::from_secs(30))
    }

    /// Create a safe testing timeout (5 seconds)
    pub const fn testing() -> Self {
        Self(Duration::from_secs(5))
    }

    const fn from_secs_unchecked(seconds: u64) -> Self {
        Self(Duration::from_secs(seconds))
    }

    /// Get the timeout value
    pub fn value(&self) -> Duration {
        self.0
    }

    /// Get the timeout value in whole seconds
    pub fn as_secs(&self) -> u64 {
        self.0.as_secs()
    }
}

impl Serialize for TimeoutSeconds {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.0.as_secs())
    }
}

impl<'de> Deserialize<'de> for TimeoutSeconds {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let seconds = u64::deserialize(deserializer)?;
        Self::new(seconds).map_err(|e| de::Error::custom(e.to_string()))
    }
}

impl Default for TimeoutSeconds {
    fn default() -> Self {
        Self::default_value()
    }
}

/// Environment types for configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Production environment
    Production,
    /// Development environment
    Development,
    /// Testing environment
    Testing,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Production => write!(f, "production"),
            Environment::Development => write!(f, "development"),
            Environment::Testing => write!(f, "testing"),
        }
    }
}

/// Contracts and endpoints of one NEAR network
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkProfile {
    /// NFT contract tokens are minted on
    pub nft_contract: String,
    /// Minter contract receiving the mint call
    pub minter: String,
    /// Mintbase wallet base URL
    pub wallet_url: Url,
    /// Mintbase marketplace base URL
    pub marketplace_url: Url,
    /// Mintbase GraphQL indexer endpoint
    pub indexer_url: Url,
}

impl NetworkProfile {
    fn with_urls(wallet: &str, marketplace: &str, indexer: &str) -> Self {
        Self {
            nft_contract: String::new(),
            minter: String::new(),
            wallet_url: parse_static_url(wallet),
            marketplace_url: parse_static_url(marketplace),
            indexer_url: parse_static_url(indexer),
        }
    }
}

/// One profile per network; `ServerConfig::network` picks the active one
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkProfiles {
    /// Testnet profile
    pub testnet: NetworkProfile,
    /// Mainnet profile
    pub mainnet: NetworkProfile,
}

impl NetworkProfiles {
    /// Profile of `network`
    pub fn get(&self, network: Network) -> &NetworkProfile {
        match network {
            Network::Testnet => &self.testnet,
            Network::Mainnet => &self.mainnet,
        }
    }
}

impl Default for NetworkProfiles {
    fn default() -> Self {
        Self {
            testnet: NetworkProfile::with_urls(
                "https://testnet.wallet.mintbase.xyz",
                "https://testnet.mintbase.xyz",
                "https://graph.mintbase.xyz/testnet",
            ),
            mainnet: NetworkProfile::with_urls(
                "https://wallet.mintbase.xyz",
                "https://www.mintbase.xyz",
                "https://graph.mintbase.xyz/mainnet",
            ),
        }
    }
}

/// OpenAI image generation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiSettings {
    /// API key
    pub api_key: String,
    /// API base URL
    pub base_url: Url,
    /// Image model
    pub image_model: String,
    /// Image size, e.g. `1024x1024`
    pub image_size: String,
    /// Image style; empty sends none
    pub image_style: String,
    /// Request timeout
    pub timeout_seconds: TimeoutSeconds,
}

/// Resize service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResizeSettings {
    /// Resize endpoint
    pub url: Url,
    /// Width used by generate-image when the request has none
    pub default_width: u32,
    /// Whether generate-image returns a resized preview
    pub embed_generated: bool,
    /// Request timeout
    pub timeout_seconds: TimeoutSeconds,
}

/// Media upload settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArweaveSettings {
    /// Upload endpoint
    pub upload_url: Url,
    /// Mintbase API key
    pub api_key: String,
    /// Request timeout
    pub timeout_seconds: TimeoutSeconds,
}

/// Indexer settings; the endpoint comes from the network profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexerSettings {
    /// Mintbase GraphQL API key
    pub api_key: String,
    /// Request timeout
    pub timeout_seconds: TimeoutSeconds,
}

/// License store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirestoreSettings {
    /// REST API base URL
    pub base_url: Url,
    /// Firebase project id
    pub project_id: String,
    /// Firebase web API key
    pub api_key: String,
    /// Collection holding license documents
    pub collection: String,
    /// Request timeout
    pub timeout_seconds: TimeoutSeconds,
}

/// License verification endpoint used by the license gate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicenseVerificationSettings {
    /// Verification endpoint, usually this gateway's own `/verify-license`
    pub url: Url,
    /// Request timeout
    pub timeout_seconds: TimeoutSeconds,
}

/// Settings of every outbound collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalApisConfig {
    /// Image generation
    pub openai: OpenAiSettings,
    /// Image resizing
    pub resize: ResizeSettings,
    /// Media upload
    pub arweave: ArweaveSettings,
    /// Token indexer
    pub indexer: IndexerSettings,
    /// License store
    pub firestore: FirestoreSettings,
    /// License verification
    pub license_verification: LicenseVerificationSettings,
}

impl Default for ExternalApisConfig {
    fn default() -> Self {
        Self {
            openai: OpenAiSettings {
                api_key: String::new(),
                base_url: parse_static_url(DEFAULT_OPENAI_BASE_URL),
                image_model: DEFAULT_IMAGE_MODEL.to_string(),
                image_size: DEFAULT_IMAGE_SIZE.to_string(),
                image_style: DEFAULT_IMAGE_STYLE.to_string(),
                timeout_seconds: TimeoutSeconds::from_secs_unchecked(120),
            },
            resize: ResizeSettings {
                url: parse_static_url("http://127.0.0.1:8080/resize"),
                default_width: DEFAULT_PREVIEW_WIDTH,
                embed_generated: true,
                timeout_seconds: TimeoutSeconds::default(),
            },
            arweave: ArweaveSettings {
                upload_url: parse_static_url("https://ar.mintbase.xyz"),
                api_key: String::new(),
                timeout_seconds: TimeoutSeconds::from_secs_unchecked(60),
            },
            indexer: IndexerSettings {
                api_key: String::new(),
                timeout_seconds: TimeoutSeconds::from_secs_unchecked(20),
            },
            firestore: FirestoreSettings {
                base_url: parse_static_url(DEFAULT_FIRESTORE_BASE_URL),
                project_id: String::new(),
                api_key: String::new(),
                collection: DEFAULT_LICENSE_COLLECTION.to_string(),
                timeout_seconds: TimeoutSeconds::from_secs_unchecked(10),
            },
            license_verification: LicenseVerificationSettings {
                url: parse_static_url("http://127.0.0.1:3000/verify-license"),
                timeout_seconds: TimeoutSeconds::from_secs_unchecked(10),
            },
        }
    }
}

/// Mint transaction settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MintConfig {
    /// Gas attached to the mint call
    pub gas: String,
    /// Deposit attached to the mint call, in yoctoNEAR
    pub deposit: String,
    /// Width the image is resized to before upload
    pub image_width: u32,
    /// File name of the uploaded media
    pub media_file_name: String,
}

impl Default for MintConfig {
    fn default() -> Self {
        Self {
            gas: DEFAULT_MINT_GAS.to_string(),
            deposit: DEFAULT_MINT_DEPOSIT.to_string(),
            image_width: DEFAULT_MINT_IMAGE_WIDTH,
            media_file_name: DEFAULT_MEDIA_FILE_NAME.to_string(),
        }
    }
}

/// License gate in front of generate-image and mint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicenseGateConfig {
    /// Whether gated routes require a verified license key
    pub enabled: bool,
}

impl Default for LicenseGateConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Server configuration for different environments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    pub host: IpAddr,
    /// Server port (validated for environment compatibility)
    pub port: ServerPort,
    /// Deadline of a whole request in seconds (validated range: 1-300)
    pub timeout_seconds: TimeoutSeconds,
    /// Environment type
    pub environment: Environment,
    /// Active NEAR network
    pub network: Network,
    /// Per-network contracts and endpoints
    pub networks: NetworkProfiles,
    /// Outbound collaborators
    pub external_apis: ExternalApisConfig,
    /// Mint transaction settings
    pub mint: MintConfig,
    /// License gate
    pub license_gate: LicenseGateConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: ServerPort::default_development(),
            timeout_seconds: TimeoutSeconds::from_secs_unchecked(DEFAULT_REQUEST_TIMEOUT_SECONDS),
            environment: Environment::Development,
            network: Network::default(),
            networks: NetworkProfiles::default(),
            external_apis: ExternalApisConfig::default(),
            mint: MintConfig::default(),
            license_gate: LicenseGateConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Create configuration from environment variables and optional configuration files
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Config` if configuration is invalid or cannot be loaded.
    pub fn from_env() -> ServerResult<Self> {
        Self::load().map_err(|e| ServerError::Config {
            message: format!("failed to load configuration: {e}"),
        })
    }

    /// Load configuration using the config crate with hierarchical sources
    ///
    /// Configuration is loaded in the following order (later sources override earlier ones):
    /// 1. Default values
    /// 2. Configuration file (config.json)
    /// 3. Environment-specific files (config.{env}.json)
    /// 4. Flat variables of the serverless deployment (`OPENAI_API_KEY`, `NETWORK`, ...)
    /// 5. Environment variables with `SERVER__` prefix and `__` nesting
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if configuration cannot be loaded or is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let env_var = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let mut config_builder = Config::builder()
            .add_source(Config::try_from(&Self::default())?)
            .add_source(File::with_name("config.json").required(false))
            .add_source(
                File::with_name(&format!("config.{}.json", env_var.to_lowercase())).required(false),
            )
            .add_source(legacy_env_source()?)
            .add_source(
                ConfigEnv::with_prefix("SERVER")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        if std::env::var("ENVIRONMENT").is_ok() {
            config_builder = config_builder.set_override("environment", env_var.to_lowercase())?;
        }

        let config = config_builder.build()?;
        let mut server_config: Self = config.try_deserialize()?;

        server_config.port = ServerPort::new(server_config.port.value(), server_config.environment)
            .map_err(|e| ConfigError::Message(format!("invalid port configuration: {e}")))?;

        let slowest = server_config.slowest_pipeline();
        if server_config.timeout_seconds.value() < slowest {
            return Err(ConfigError::Message(format!(
                "timeout_seconds ({}) is shorter than the slowest pipeline's client timeouts ({}s)",
                server_config.timeout_seconds.as_secs(),
                slowest.as_secs()
            )));
        }

        Ok(server_config)
    }

    /// Sum of the client timeouts along the longest chain of outbound calls
    ///
    /// generate-image: verifier, image generation, resize.
    /// mint: verifier, resize, upload.
    /// The lookups and verify-license make one call each.
    pub fn slowest_pipeline(&self) -> Duration {
        let apis = &self.external_apis;
        let gate = if self.license_gate.enabled {
            apis.license_verification.timeout_seconds.value()
        } else {
            Duration::ZERO
        };
        let resize = apis.resize.timeout_seconds.value();

        let generate = gate + apis.openai.timeout_seconds.value() + resize;
        let mint = gate + resize + apis.arweave.timeout_seconds.value();
        let lookup = apis
            .indexer
            .timeout_seconds
            .value()
            .max(apis.firestore.timeout_seconds.value());

        generate.max(mint).max(lookup)
    }

    /// Create configuration optimized for testing
    ///
    /// Every credential is a placeholder and the license gate is off.
    pub fn for_testing() -> Self {
        let mut external_apis = ExternalApisConfig::default();
        external_apis.openai.api_key = "test-openai-key".to_string();
        external_apis.arweave.api_key = "test-arweave-key".to_string();
        external_apis.indexer.api_key = "test-indexer-key".to_string();
        external_apis.firestore.project_id = "test-project".to_string();
        external_apis.firestore.api_key = "test-firebase-key".to_string();

        let mut networks = NetworkProfiles::default();
        networks.testnet.nft_contract = "test.mintspace2.testnet".to_string();
        networks.testnet.minter = "minter.test.testnet".to_string();
        networks.mainnet.nft_contract = "test.mintbase1.near".to_string();
        networks.mainnet.minter = "minter.test.near".to_string();

        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: ServerPort::testing(),
            timeout_seconds: TimeoutSeconds::testing(),
            environment: Environment::Testing,
            network: Network::Testnet,
            networks,
            external_apis,
            mint: MintConfig::default(),
            license_gate: LicenseGateConfig { enabled: false },
        }
    }

    /// Get socket address for binding
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port.value())
    }

    /// Profile of the active network
    pub fn active_network(&self) -> &NetworkProfile {
        self.networks.get(self.network)
    }
}

/// Source built from the flat variables of the serverless deployment
fn legacy_env_source() -> Result<Config, ConfigError> {
    LEGACY_ENV_KEYS
        .iter()
        .try_fold(Config::builder(), |builder, (var, key)| {
            builder.set_override_option(*key, std::env::var(var).ok())
        })?
        .build()
}

// Only used with literals that are known to parse.
fn parse_static_url(url: &str) -> Url {
    Url::parse(url).unwrap_or_else(|_| unreachable!("static URL {url} is valid"))
}
