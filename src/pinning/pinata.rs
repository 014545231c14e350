//! Pinata pinning API (`/pinning/pinJSONToIPFS`, `/pinning/pinFileToIPFS`).
//!
//! Wire types are private. Everything is pinned as CID v1 and named so it
//! can be found in the Pinata dashboard.

use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use super::PinningError;

#[derive(Debug, Clone)]
pub struct PinataClient {
    client: Client,
    api_base_url: String,
    jwt: String,
}

impl PinataClient {
    pub fn new(api_base_url: String, jwt: String, timeout_seconds: u64) -> Result<Self, PinningError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| PinningError::Request(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, api_base_url: api_base_url.trim_end_matches('/').to_string(), jwt })
    }

    pub async fn pin_json<T: Serialize>(&self, content: &T, name: &str) -> Result<String, PinningError> {
        let payload = PinJsonRequest {
            pinata_content: content,
            pinata_metadata: PinataMetadata { name },
            pinata_options: PinataOptions { cid_version: 1 },
        };
        let url = format!("{}/pinning/pinJSONToIPFS", self.api_base_url);
        debug!(%url, %name, "pinning json");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.jwt)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                error!(%url, error = %e, "pinata request failed (transport)");
                PinningError::Request(e.to_string())
            })?;
        let uri = read_pin(response).await?;
        info!(%name, %uri, "pinned json");
        Ok(uri)
    }

    pub async fn pin_file(&self, bytes: Vec<u8>, file_name: &str) -> Result<String, PinningError> {
        let metadata = serde_json::to_string(&PinataMetadata { name: file_name })
            .map_err(|e| PinningError::Request(e.to_string()))?;
        let options = serde_json::to_string(&PinataOptions { cid_version: 1 })
            .map_err(|e| PinningError::Request(e.to_string()))?;
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime_for(file_name))
            .map_err(|e| PinningError::Request(e.to_string()))?;
        let form = Form::new()
            .part("file", part)
            .text("pinataMetadata", metadata)
            .text("pinataOptions", options);

        let url = format!("{}/pinning/pinFileToIPFS", self.api_base_url);
        debug!(%url, %file_name, "pinning file");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.jwt)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                error!(%url, error = %e, "pinata request failed (transport)");
                PinningError::Request(e.to_string())
            })?;
        let uri = read_pin(response).await?;
        info!(%file_name, %uri, "pinned file");
        Ok(uri)
    }
}

fn mime_for(file_name: &str) -> &'static str {
    let ext = file_name.rsplit('.').next().unwrap_or_default().to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "mp3" => "audio/mpeg",
        _ => "image/png",
    }
}

async fn read_pin(response: Response) -> Result<String, PinningError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(PinningError::Status { status: status.as_u16(), body });
    }
    let parsed: PinResponse = response
        .json()
        .await
        .map_err(|e| PinningError::Response(e.to_string()))?;
    ipfs_uri(&parsed.ipfs_hash)
}

fn ipfs_uri(hash: &str) -> Result<String, PinningError> {
    let hash = hash.trim();
    if hash.is_empty() {
        return Err(PinningError::Response("empty IpfsHash".into()));
    }
    Ok(format!("ipfs://{hash}"))
}

// ── Private wire types ────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PinJsonRequest<'a, T: Serialize> {
    pinata_content: &'a T,
    pinata_metadata: PinataMetadata<'a>,
    pinata_options: PinataOptions,
}

#[derive(Serialize)]
struct PinataMetadata<'a> {
    name: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PinataOptions {
    cid_version: u8,
}

#[derive(Deserialize)]
struct PinResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// One-shot HTTP responder. Resolves to the raw request it received.
    async fn serve_once(status: u16, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 8192];
            loop {
                let n = sock.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
                let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else { continue };
                let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
                let len = head
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok());
                let done = match len {
                    Some(len) => buf.len() >= end + 4 + len,
                    None => !head.contains("chunked") || buf.ends_with(b"0\r\n\r\n"),
                };
                if done {
                    break;
                }
            }
            let resp = format!(
                "HTTP/1.1 {status} OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            sock.write_all(resp.as_bytes()).await.unwrap();
            let _ = sock.shutdown().await;
            String::from_utf8_lossy(&buf).into_owned()
        });
        (format!("http://{addr}"), handle)
    }

    #[test]
    fn request_body_shape() {
        let content = serde_json::json!({"name": "Test"});
        let req = PinJsonRequest {
            pinata_content: &content,
            pinata_metadata: PinataMetadata { name: "Test.json" },
            pinata_options: PinataOptions { cid_version: 1 },
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["pinataContent"]["name"], "Test");
        assert_eq!(v["pinataMetadata"]["name"], "Test.json");
        assert_eq!(v["pinataOptions"]["cidVersion"], 1);
    }

    #[test]
    fn uri_and_mime_helpers() {
        assert_eq!(ipfs_uri("bafy123").unwrap(), "ipfs://bafy123");
        assert!(ipfs_uri("  ").is_err());
        assert_eq!(mime_for("logo.JPG"), "image/jpeg");
        assert_eq!(mime_for("banner"), "image/png");
    }

    #[tokio::test]
    async fn pin_json_posts_with_bearer_and_reads_hash() {
        let (base, server) = serve_once(200, r#"{"IpfsHash":"bafyjson","PinSize":10}"#).await;
        let client = PinataClient::new(base, "secret-jwt".into(), 5).unwrap();
        let uri = client.pin_json(&serde_json::json!({"ticker": "TST"}), "Test.json").await.unwrap();
        assert_eq!(uri, "ipfs://bafyjson");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /pinning/pinJSONToIPFS"));
        assert!(request.to_ascii_lowercase().contains("authorization: bearer secret-jwt"));
        assert!(request.contains("\"ticker\":\"TST\""));
    }

    #[tokio::test]
    async fn pin_file_sends_multipart() {
        let (base, server) = serve_once(200, r#"{"IpfsHash":"bafyfile"}"#).await;
        let client = PinataClient::new(base, "jwt".into(), 5).unwrap();
        let uri = client.pin_file(b"PNGDATA".to_vec(), "TST_logo.png").await.unwrap();
        assert_eq!(uri, "ipfs://bafyfile");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /pinning/pinFileToIPFS"));
        assert!(request.contains("filename=\"TST_logo.png\""));
        assert!(request.contains("PNGDATA"));
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let (base, server) = serve_once(401, r#"{"error":"bad jwt"}"#).await;
        let client = PinataClient::new(base, "jwt".into(), 5).unwrap();
        let err = client.pin_json(&serde_json::json!({}), "x.json").await.unwrap_err();
        assert!(matches!(err, PinningError::Status { status: 401, .. }));
        server.await.unwrap();
    }
}
