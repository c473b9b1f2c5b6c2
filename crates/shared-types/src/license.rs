// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! License records
//!
//! A license key grants access to the privileged endpoints for a fixed set of
//! domains. Records are owned by an external store and only read here.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A license as stored in the license collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LicenseRecord {
    /// License key (document id in the store)
    pub key: String,
    /// Whether the license is currently active
    pub is_active: bool,
    /// Domains allowed to use this license
    pub domains: Vec<String>,
}

impl LicenseRecord {
    /// Returns `true` when the license is active and `domain` is on its allow-list
    ///
    /// Domains compare exactly; callers strip the scheme before asking.
    pub fn permits(&self, domain: &str) -> bool {
        self.is_active && self.domains.iter().any(|allowed| allowed == domain)
    }
}

/// Reduce an `Origin` header value to the bare domain used in license allow-lists
///
/// ```
/// use shared_types::license::domain_from_origin;
///
/// assert_eq!(domain_from_origin("https://shop.example.com"), "shop.example.com");
/// assert_eq!(domain_from_origin("localhost:3000"), "localhost:3000");
/// ```
pub fn domain_from_origin(origin: &str) -> &str {
    let origin = origin.trim();
    origin
        .strip_prefix("https://")
        .or_else(|| origin.strip_prefix("http://"))
        .unwrap_or(origin)
        .trim_end_matches('/')
}
