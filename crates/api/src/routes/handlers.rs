// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! HTTP request handlers module
//!
//! Each gateway handler decodes its body, validates required fields, runs its
//! outbound calls in sequence and shapes the result. A failed outbound call
//! aborts the handler with a 500 carrying the handler's own message.

use api_client::ApiError;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use external_apis::MintDraft;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::{
    error::ServerError,
    extractors::JsonExtractor,
    metrics::track_upstream,
    state::{HealthCheck, ServerState},
};

const GENERATE_IMAGE_ERROR: &str = "Error generating image";
const MINT_ERROR: &str = "Error in minting process";
const FETCH_METADATA_ERROR: &str = "Error fetching metadata";
const VERIFICATION_ERROR: &str = "Internal server error during verification";

/// Message of a 500 answered by the gateway endpoint at `path`
pub(crate) fn failure_message(path: &str) -> &'static str {
    match path {
        "/generate-image" => GENERATE_IMAGE_ERROR,
        "/mint" | "/get-token-link" => MINT_ERROR,
        "/get-token-url-by-reference" => FETCH_METADATA_ERROR,
        _ => VERIFICATION_ERROR,
    }
}

const LICENSE_FIELDS_REQUIRED: &str = "License key and domain are required";
const LICENSE_NOT_FOUND: &str = "License key not found";
const LICENSE_REFUSED: &str = "License key is not active or domain is not allowed";

/// Trimmed value of a required field, or a 400 naming it
fn required<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str, ServerError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ServerError::ValidationError(format!("Missing {field}")))
}

/// Health check endpoint handler
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    summary = "Health check endpoint",
    description = "Returns the current health status of the gateway including version, environment, active network and the status of every outbound client.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthCheck),
        (status = 503, description = "Service unavailable", body = String)
    )
)]
pub async fn health_handler(
    State(state): State<ServerState>,
) -> Result<impl IntoResponse, ServerError> {
    let health = state.health_check().await?;
    Ok(Json(health))
}

/// Image generation request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateImageRequest {
    /// Prompt describing the image
    #[schema(example = "A lighthouse on a cliff at dawn")]
    pub description: Option<String>,
    /// Width of the embedded preview in pixels
    #[schema(example = 256)]
    pub width: Option<u32>,
}

/// Generated image
#[skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateImageResponse {
    /// URL of the full-size generated image
    pub image_url: String,
    /// Resized preview, base64 encoded
    pub image: Option<String>,
}

/// Generate an image from a text prompt
///
/// # Errors
///
/// Returns `ServerError` if the prompt is missing or image generation fails.
#[utoipa::path(
    post,
    path = "/generate-image",
    tag = "images",
    summary = "Generate an image",
    description = "Generates an image from the prompt and, when enabled, returns a resized base64 preview alongside the image URL. Requires a license key when the license gate is enabled.",
    request_body = GenerateImageRequest,
    params(("X-License-Key" = Option<String>, Header, description = "License key checked against the Origin domain")),
    responses(
        (status = 200, description = "Image generated", body = GenerateImageResponse),
        (status = 400, description = "Missing description", body = String),
        (status = 403, description = "License key missing or refused", body = String),
        (status = 500, description = "Image generation failed", body = String)
    )
)]
pub async fn generate_image_handler(
    State(state): State<ServerState>,
    JsonExtractor(request): JsonExtractor<GenerateImageRequest>,
) -> Result<Json<GenerateImageResponse>, ServerError> {
    let description = required(request.description.as_deref(), "description")?;
    let registry = state.registry();

    let generated = track_upstream("openai", registry.openai().generate_image(description))
        .await
        .map_err(|e| ServerError::upstream(GENERATE_IMAGE_ERROR, e))?;

    let resize = &state.config().external_apis.resize;
    let image = if resize.embed_generated {
        // 0 means "no width given"
        let width = request
            .width
            .filter(|width| *width > 0)
            .unwrap_or(resize.default_width);
        let resized = track_upstream(
            "resize",
            registry.resize().resize(generated.url.as_str(), width),
        )
        .await
        .map_err(|e| ServerError::upstream(GENERATE_IMAGE_ERROR, e))?;
        Some(resized.base64)
    } else {
        None
    };

    info!(image_url = %generated.url, preview = image.is_some(), "image generated");

    Ok(Json(GenerateImageResponse {
        image_url: generated.url.to_string(),
        image,
    }))
}

/// Mint request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MintRequest {
    /// Image to mint
    #[schema(example = "https://images.example/generated.png")]
    pub image_url: Option<String>,
    /// Token title
    #[schema(example = "Dawn lighthouse")]
    pub name: Option<String>,
    /// Token description
    pub description: Option<String>,
    /// Where the wallet returns after signing
    #[schema(example = "https://shop.example/minted")]
    pub redirect_url: Option<String>,
    /// Explicit token id
    pub token_id: Option<String>,
}

/// Wallet link for signing the mint
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MintResponse {
    /// Wallet URL asking the user to sign the mint transaction
    pub sign_url: String,
}

/// Upload an image and build the wallet link that mints it
///
/// # Errors
///
/// Returns `ServerError` if a required field is missing, or resizing,
/// uploading or building the link fails.
#[utoipa::path(
    post,
    path = "/mint",
    tag = "tokens",
    summary = "Prepare a mint",
    description = "Resizes the image, uploads it to permanent storage and returns a wallet URL that mints a token referencing the upload. Requires a license key when the license gate is enabled.",
    request_body = MintRequest,
    params(("X-License-Key" = Option<String>, Header, description = "License key checked against the Origin domain")),
    responses(
        (status = 200, description = "Sign URL built", body = MintResponse),
        (status = 400, description = "Missing required field", body = String),
        (status = 403, description = "License key missing or refused", body = String),
        (status = 500, description = "Minting process failed", body = String)
    )
)]
pub async fn mint_handler(
    State(state): State<ServerState>,
    JsonExtractor(request): JsonExtractor<MintRequest>,
) -> Result<Json<MintResponse>, ServerError> {
    let image_url = required(request.image_url.as_deref(), "imageUrl")?;
    let title = required(request.name.as_deref(), "name")?;
    let description = required(request.description.as_deref(), "description")?;
    let callback_url = required(request.redirect_url.as_deref(), "redirectUrl")?;
    let token_id = request
        .token_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty());

    let registry = state.registry();
    let width = state.config().mint.image_width;

    let resized = track_upstream("resize", registry.resize().resize(image_url, width))
        .await
        .map_err(|e| ServerError::upstream(MINT_ERROR, e))?;
    let png = resized.decode().map_err(|e| {
        ServerError::upstream(
            MINT_ERROR,
            ApiError::InvalidResponse {
                message: format!("resized image is not valid base64: {e}"),
            },
        )
    })?;

    let receipt = track_upstream("arweave", registry.arweave().upload_png(png))
        .await
        .map_err(|e| ServerError::upstream(MINT_ERROR, e))?;

    let sign_url = registry
        .links()
        .sign_url(&MintDraft {
            content_id: &receipt.id,
            title,
            description,
            callback_url,
            token_id,
        })
        .map_err(|e| ServerError::upstream(MINT_ERROR, e))?;

    info!(content_id = %receipt.id, "mint prepared");

    Ok(Json(MintResponse {
        sign_url: sign_url.to_string(),
    }))
}

/// Token link request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenLinkRequest {
    /// Token id on the configured NFT contract
    #[schema(example = "42")]
    pub token_id: Option<String>,
}

/// Marketplace link of a token
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenLinkResponse {
    /// Percent-encoded marketplace URL of the token's metadata page
    pub nft_url: String,
}

/// Resolve the marketplace page of a token
///
/// # Errors
///
/// Returns `ServerError` if the token id is missing or the lookup fails.
#[utoipa::path(
    post,
    path = "/get-token-link",
    tag = "tokens",
    summary = "Marketplace link of a token",
    description = "Looks up the token's metadata on the indexer and returns the percent-encoded marketplace URL of its metadata page.",
    request_body = TokenLinkRequest,
    responses(
        (status = 200, description = "Link resolved", body = TokenLinkResponse),
        (status = 400, description = "Missing tokenId", body = String),
        (status = 500, description = "Lookup failed", body = String)
    )
)]
pub async fn token_link_handler(
    State(state): State<ServerState>,
    JsonExtractor(request): JsonExtractor<TokenLinkRequest>,
) -> Result<Json<TokenLinkResponse>, ServerError> {
    let token_id = required(request.token_id.as_deref(), "tokenId")?;
    let registry = state.registry();
    let links = registry.links();

    let metadata_id = track_upstream(
        "mintbase-indexer",
        registry
            .indexer()
            .token_metadata_id(token_id, links.nft_contract()),
    )
    .await
    .map_err(|e| ServerError::upstream(MINT_ERROR, e))?;

    let nft_url = links.token_page_link(&metadata_id);

    Ok(Json(TokenLinkResponse { nft_url }))
}

/// Metadata lookup by reference
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenByReferenceRequest {
    /// Off-chain metadata reference, i.e. the upload content id
    #[schema(example = "n3vKQY5x0sbc8mVJhJ2r8pV6Qn1h3B9r6w4z0e7YwWc")]
    pub reference: Option<String>,
}

/// Metadata id matching a reference
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenByReferenceResponse {
    /// Metadata id on the indexer
    pub url: String,
}

/// Resolve the metadata id minted from an upload
///
/// # Errors
///
/// Returns `ServerError` if the reference is missing or the lookup fails.
#[utoipa::path(
    post,
    path = "/get-token-url-by-reference",
    tag = "tokens",
    summary = "Metadata id by reference",
    description = "Finds the metadata whose off-chain reference equals the given content id.",
    request_body = TokenByReferenceRequest,
    responses(
        (status = 200, description = "Metadata found", body = TokenByReferenceResponse),
        (status = 400, description = "Missing reference", body = String),
        (status = 500, description = "Lookup failed", body = String)
    )
)]
pub async fn token_by_reference_handler(
    State(state): State<ServerState>,
    JsonExtractor(request): JsonExtractor<TokenByReferenceRequest>,
) -> Result<Json<TokenByReferenceResponse>, ServerError> {
    let reference = required(request.reference.as_deref(), "reference")?;

    let url = track_upstream(
        "mintbase-indexer",
        state.registry().indexer().metadata_id_by_reference(reference),
    )
    .await
    .map_err(|e| ServerError::upstream(FETCH_METADATA_ERROR, e))?;

    Ok(Json(TokenByReferenceResponse { url }))
}

/// License verification request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyLicenseRequest {
    /// License key
    #[schema(example = "lic-3f9a")]
    pub license_key: Option<String>,
    /// Domain the key is used from, without scheme
    #[schema(example = "shop.example")]
    pub domain: Option<String>,
}

/// License verification result
#[skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyLicenseResponse {
    /// Whether the key is active and allowed for the domain
    pub verified: bool,
    /// Reason for a refusal
    pub error: Option<String>,
}

/// Check a license key against its allowed domains
///
/// # Errors
///
/// Returns `ServerError` if a field is missing, the key is unknown or the
/// license store fails.
#[utoipa::path(
    post,
    path = "/verify-license",
    tag = "licenses",
    summary = "Verify a license key",
    description = "Answers whether the license key is active and allowed for the domain.",
    request_body = VerifyLicenseRequest,
    responses(
        (status = 200, description = "License verified", body = VerifyLicenseResponse),
        (status = 400, description = "License key or domain missing", body = String),
        (status = 403, description = "License inactive or domain not allowed", body = VerifyLicenseResponse),
        (status = 404, description = "License key not found", body = String),
        (status = 500, description = "License store failed", body = String)
    )
)]
pub async fn verify_license_handler(
    State(state): State<ServerState>,
    JsonExtractor(request): JsonExtractor<VerifyLicenseRequest>,
) -> Result<(StatusCode, Json<VerifyLicenseResponse>), ServerError> {
    let fields_required = || ServerError::ValidationError(LICENSE_FIELDS_REQUIRED.to_string());
    let license_key =
        required(request.license_key.as_deref(), "licenseKey").map_err(|_| fields_required())?;
    let domain = required(request.domain.as_deref(), "domain").map_err(|_| fields_required())?;

    let record = track_upstream("firestore", state.registry().licenses().get_license(license_key))
        .await
        .map_err(|e| ServerError::upstream(VERIFICATION_ERROR, e))?
        .ok_or_else(|| ServerError::NotFound {
            message: LICENSE_NOT_FOUND.to_string(),
        })?;

    if record.permits(domain) {
        info!(%domain, "license verified");
        return Ok((
            StatusCode::OK,
            Json(VerifyLicenseResponse {
                verified: true,
                error: None,
            }),
        ));
    }

    warn!(%domain, active = record.is_active, "license refused");
    Ok((
        StatusCode::FORBIDDEN,
        Json(VerifyLicenseResponse {
            verified: false,
            error: Some(LICENSE_REFUSED.to_string()),
        }),
    ))
}
