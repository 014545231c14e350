//! Token metadata document pinned before launch.

use serde::Serialize;
use tracing::{info, warn};

use super::draft::DraftRecord;
use crate::pinning::PinningService;

pub const TOKEN_DECIMALS: u8 = 18;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BurstAudio {
    pub name: Option<String>,
    #[serde(rename = "ipfsURI")]
    pub ipfs_uri: Option<String>,
}

/// Wire shape read by the burst front end.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenMetadata {
    pub name: String,
    pub ticker: String,
    pub logo: Option<String>,
    pub banner: Option<String>,
    pub website: String,
    pub x: String,
    pub telegram: String,
    pub discord: String,
    pub description: String,
    pub decimals: u8,
    pub burst_audio: BurstAudio,
}

impl TokenMetadata {
    /// Social links default to empty strings; images are filled in by the
    /// caller once uploaded.
    pub fn from_draft(draft: &DraftRecord) -> Self {
        let text = |v: &Option<String>| v.clone().unwrap_or_default();
        Self {
            name: text(&draft.name),
            ticker: text(&draft.symbol),
            logo: None,
            banner: None,
            website: text(&draft.website),
            x: text(&draft.twitter),
            telegram: text(&draft.telegram),
            discord: text(&draft.discord),
            description: text(&draft.description),
            decimals: TOKEN_DECIMALS,
            burst_audio: BurstAudio::default(),
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}_metadata.json", self.ticker)
    }
}

/// Pin `metadata` and return its URI, or `fallback` when pinning is disabled
/// or fails. A pinning outage never blocks a launch.
pub async fn pin_or_fallback(pinning: &PinningService, metadata: &TokenMetadata, fallback: &str) -> String {
    match pinning.upload_metadata(metadata, &metadata.file_name()).await {
        Ok(uri) => {
            info!(%uri, ticker = %metadata.ticker, "metadata pinned");
            uri
        }
        Err(e) => {
            warn!(ticker = %metadata.ticker, "metadata pinning unavailable, using fallback: {e}");
            fallback.to_string()
        }
    }
}
