//! Store Info Model

use serde::{Deserialize, Serialize};

/// Store branding and contact information
///
/// Passed explicitly into the receipt renderer and email templates;
/// nothing reads branding from ambient global state.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StoreInfo {
    #[serde(default)]
    pub name: String,
    /// Tax identification number (RUC)
    #[serde(default)]
    pub ruc: String,
    #[serde(default)]
    pub address: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// Logo source: absolute path, assets-relative path, URL, or data URI
    pub logo: Option<String>,
    /// Brand accent color as a hex string (e.g. "#2d6a4f")
    pub accent_color: Option<String>,
}
