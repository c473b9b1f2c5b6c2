// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! `OpenAPI` document of the gateway and the pages serving it

use axum::{Json, response::Html};
use utoipa::OpenApi;

use crate::{
    config::Environment,
    routes::handlers::{
        self, GenerateImageRequest, GenerateImageResponse, MintRequest, MintResponse,
        TokenByReferenceRequest, TokenByReferenceResponse, TokenLinkRequest, TokenLinkResponse,
        VerifyLicenseRequest, VerifyLicenseResponse,
    },
    state::{HealthCheck, HealthStatus},
};

/// `OpenAPI` document listing every gateway endpoint
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "NFT Mint Gateway",
        description = "Generates images, uploads them to permanent storage and prepares NEAR NFT mints signed in the user's wallet.",
        license(name = "Apache-2.0")
    ),
    paths(
        handlers::health_handler,
        handlers::generate_image_handler,
        handlers::mint_handler,
        handlers::token_link_handler,
        handlers::token_by_reference_handler,
        handlers::verify_license_handler,
    ),
    components(schemas(
        HealthCheck,
        HealthStatus,
        Environment,
        shared_types::Network,
        GenerateImageRequest,
        GenerateImageResponse,
        MintRequest,
        MintResponse,
        TokenLinkRequest,
        TokenLinkResponse,
        TokenByReferenceRequest,
        TokenByReferenceResponse,
        VerifyLicenseRequest,
        VerifyLicenseResponse,
    )),
    tags(
        (name = "health", description = "Service health"),
        (name = "images", description = "Image generation"),
        (name = "tokens", description = "Minting and token lookups"),
        (name = "licenses", description = "License verification"),
    )
)]
pub struct ApiDoc;

/// Route serving the `OpenAPI` document
pub const OPENAPI_JSON_PATH: &str = "/api-doc/openapi.json";

const SWAGGER_UI_VERSION: &str = "5.17.14";

/// `OpenAPI` document as JSON
pub async fn openapi_spec() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Swagger UI rendering [`OPENAPI_JSON_PATH`]
pub async fn swagger_ui() -> Html<String> {
    let assets = format!("https://unpkg.com/swagger-ui-dist@{SWAGGER_UI_VERSION}");
    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>NFT Mint Gateway API</title>
    <link rel="stylesheet" href="{assets}/swagger-ui.css" />
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="{assets}/swagger-ui-bundle.js"></script>
    <script>
        window.onload = () => {{
            window.ui = SwaggerUIBundle({{
                url: '{OPENAPI_JSON_PATH}',
                dom_id: '#swagger-ui',
                deepLinking: true,
            }});
        }};
    </script>
</body>
</html>
"#
    ))
}
