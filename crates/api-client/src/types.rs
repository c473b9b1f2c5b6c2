// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Payloads passed between the steps of a request pipeline

use base64::{DecodeError, Engine, prelude::BASE64_STANDARD};
use serde::{Deserialize, Serialize};
use url::Url;

/// An image produced by the image-generation service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedImage {
    /// Publicly reachable URL of the generated image
    pub url: Url,
    /// Prompt as rewritten by the model, when it reports one
    pub revised_prompt: Option<String>,
}

/// A resized image as returned by the resize service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResizedImage {
    /// Base64 encoded image, possibly as a `data:` URL
    pub base64: String,
}

impl ResizedImage {
    /// Decode the image bytes, ignoring any `data:<mime>;base64,` prefix
    ///
    /// # Errors
    ///
    /// Returns a `DecodeError` when the payload is not valid base64.
    pub fn decode(&self) -> Result<Vec<u8>, DecodeError> {
        BASE64_STANDARD.decode(self.payload())
    }

    /// The base64 payload without a data-URL prefix
    pub fn payload(&self) -> &str {
        self.base64
            .rsplit_once(";base64,")
            .map_or(self.base64.as_str(), |(_, data)| data)
            .trim()
    }
}

/// Receipt of a media upload to decentralized storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    /// Content id of the stored media
    pub id: String,
}
