use serde::Serialize;

use crate::domain::api_key::ApiKey;

/// Freshly created key; `key` is returned once and never stored.
#[derive(Debug, Serialize)]
pub struct CreatedApiKey {
    #[serde(flatten)]
    pub api_key: ApiKey,
    pub key: String,
}
