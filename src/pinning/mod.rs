//! IPFS pinning for token metadata and images.
//!
//! Same enum-dispatch shape as the LLM providers. `Disabled` makes every
//! upload fail so callers fall back to their default URI.

pub mod pinata;

use thiserror::Error;

use crate::config::PinningConfig;

#[derive(Debug, Error)]
pub enum PinningError {
    #[error("pinning is disabled")]
    Disabled,
    #[error("pinning request failed: {0}")]
    Request(String),
    #[error("pinning service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected pinning response: {0}")]
    Response(String),
}

#[derive(Debug, Clone)]
pub enum PinningService {
    Pinata(pinata::PinataClient),
    Disabled,
}

impl PinningService {
    /// Pin a JSON document; returns its `ipfs://` URI.
    pub async fn upload_metadata<T: serde::Serialize>(
        &self,
        document: &T,
        name: &str,
    ) -> Result<String, PinningError> {
        match self {
            PinningService::Pinata(p) => p.pin_json(document, name).await,
            PinningService::Disabled => Err(PinningError::Disabled),
        }
    }

    /// Pin raw image bytes; returns their `ipfs://` URI.
    pub async fn upload_image(&self, bytes: Vec<u8>, file_name: &str) -> Result<String, PinningError> {
        match self {
            PinningService::Pinata(p) => p.pin_file(bytes, file_name).await,
            PinningService::Disabled => Err(PinningError::Disabled),
        }
    }
}

/// Construct the configured service. `jwt` comes from `PINATA_JWT`.
pub fn build(config: &PinningConfig, jwt: Option<String>) -> Result<PinningService, PinningError> {
    if !config.enabled {
        return Ok(PinningService::Disabled);
    }
    let jwt = jwt.ok_or_else(|| {
        PinningError::Request("PINATA_JWT is required when pinning is enabled".into())
    })?;
    let client = pinata::PinataClient::new(config.api_base_url.clone(), jwt, config.timeout_seconds)?;
    Ok(PinningService::Pinata(client))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_rejects_uploads() {
        let svc = PinningService::Disabled;
        assert!(matches!(
            svc.upload_metadata(&serde_json::json!({"a": 1}), "a.json").await,
            Err(PinningError::Disabled)
        ));
        assert!(matches!(
            svc.upload_image(vec![1, 2, 3], "logo.png").await,
            Err(PinningError::Disabled)
        ));
    }

    #[test]
    fn enabled_without_jwt_is_an_error() {
        let cfg = PinningConfig {
            enabled: true,
            api_base_url: "http://127.0.0.1:9".into(),
            timeout_seconds: 1,
            fallback_metadata_uri: "ipfs://fallback".into(),
        };
        assert!(build(&cfg, None).is_err());
        assert!(matches!(build(&cfg, Some("jwt".into())), Ok(PinningService::Pinata(_))));

        let off = PinningConfig { enabled: false, ..cfg };
        assert!(matches!(build(&off, None), Ok(PinningService::Disabled)));
    }
}
