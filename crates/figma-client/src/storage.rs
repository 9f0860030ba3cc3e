//! Object storage upload via presigned PUT URLs.
//!
//! The upload is a single request sequence: read the file, presign a PUT for
//! a freshly generated key, PUT the bytes, and report the public URL. There is
//! no retry; any non-success status fails the upload.

use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use secrecy::ExposeSecret;
use sha2::{Digest, Sha256};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::error::{ClientError, ClientResult};

type HmacSha256 = Hmac<Sha256>;

/// Lifetime of a presigned upload URL in seconds.
pub const PRESIGN_EXPIRY_SECS: u64 = 900;

const SIGNING_ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SERVICE: &str = "s3";

/// Location of an uploaded object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub url: String,
    pub key: String,
    pub content_type: &'static str,
}

/// Write side of the object store.
#[async_trait]
pub trait ObjectStorage: Send + Sync + fmt::Debug {
    /// Upload a local file under a generated key.
    async fn upload(&self, path: &Path) -> ClientResult<StoredObject>;
}

/// Content type chosen from the file extension.
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("svg") => "image/svg+xml",
        Some("jpg" | "jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}

/// S3 uploader using SigV4 query-string presigning.
#[derive(Debug)]
pub struct S3Uploader {
    config: StorageConfig,
    http: reqwest::Client,
}

impl S3Uploader {
    pub fn new(config: StorageConfig) -> ClientResult<Self> {
        if config.bucket.is_empty() || config.region.is_empty() {
            return Err(ClientError::config_error(
                "storage bucket and region must be non-empty",
            ));
        }
        let http = reqwest::Client::builder().build()?;
        Ok(Self { config, http })
    }

    /// Random object key; the original file name is not preserved.
    fn generate_key(&self, path: &Path) -> String {
        let mut key = String::new();
        if let Some(prefix) = self.config.key_prefix.as_deref() {
            let prefix = prefix.trim_matches('/');
            if !prefix.is_empty() {
                key.push_str(prefix);
                key.push('/');
            }
        }
        key.push_str(&Uuid::new_v4().to_string());
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            key.push('.');
            key.push_str(&ext.to_ascii_lowercase());
        }
        key
    }

    /// Public URL for an uploaded key.
    pub fn public_url(&self, key: &str) -> String {
        match self.config.public_base_url.as_deref() {
            Some(base) => format!("{}/{}", base.trim_end_matches('/'), key),
            None => format!("https://{}/{}", self.config.host(), uri_encode(key, false)),
        }
    }
}

#[async_trait]
impl ObjectStorage for S3Uploader {
    async fn upload(&self, path: &Path) -> ClientResult<StoredObject> {
        let body = tokio::fs::read(path).await?;
        let content_type = content_type_for(path);
        let key = self.generate_key(path);
        let presigned = presign_put(&self.config, &key, Utc::now(), PRESIGN_EXPIRY_SECS)?;

        debug!(%key, content_type, bytes = body.len(), "Uploading object");
        let response = self
            .http
            .put(&presigned)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ClientError::storage_error(status.as_u16(), message));
        }

        let url = self.public_url(&key);
        info!(%key, %url, "Object uploaded");
        Ok(StoredObject {
            url,
            key,
            content_type,
        })
    }
}

/// Build a SigV4 presigned PUT URL for `key`.
///
/// Only `host` is signed, so the uploader may choose the `Content-Type`
/// header freely.
pub fn presign_put(
    config: &StorageConfig,
    key: &str,
    now: DateTime<Utc>,
    expires_secs: u64,
) -> ClientResult<String> {
    let host = config.host();
    let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let date = now.format("%Y%m%d").to_string();
    let scope = format!("{date}/{}/{SERVICE}/aws4_request", config.region);
    let canonical_uri = format!("/{}", uri_encode(key, false));

    let mut params: Vec<(String, String)> = vec![
        ("X-Amz-Algorithm".into(), SIGNING_ALGORITHM.into()),
        (
            "X-Amz-Credential".into(),
            format!("{}/{scope}", config.access_key_id),
        ),
        ("X-Amz-Date".into(), amz_date.clone()),
        ("X-Amz-Expires".into(), expires_secs.to_string()),
        ("X-Amz-SignedHeaders".into(), "host".into()),
    ];
    if let Some(token) = &config.session_token {
        params.push((
            "X-Amz-Security-Token".into(),
            token.expose_secret().to_string(),
        ));
    }
    params.sort();

    let canonical_query = params
        .iter()
        .map(|(k, v)| format!("{}={}", uri_encode(k, true), uri_encode(v, true)))
        .collect::<Vec<_>>()
        .join("&");

    let canonical_request = format!(
        "PUT\n{canonical_uri}\n{canonical_query}\nhost:{host}\n\nhost\nUNSIGNED-PAYLOAD"
    );
    let string_to_sign = format!(
        "{SIGNING_ALGORITHM}\n{amz_date}\n{scope}\n{}",
        hex(&Sha256::digest(canonical_request.as_bytes()))
    );

    let secret = format!("AWS4{}", config.secret_access_key.expose_secret());
    let k_date = hmac_sha256(secret.as_bytes(), date.as_bytes())?;
    let k_region = hmac_sha256(&k_date, config.region.as_bytes())?;
    let k_service = hmac_sha256(&k_region, SERVICE.as_bytes())?;
    let k_signing = hmac_sha256(&k_service, b"aws4_request")?;
    let signature = hex(&hmac_sha256(&k_signing, string_to_sign.as_bytes())?);

    Ok(format!(
        "https://{host}{canonical_uri}?{canonical_query}&X-Amz-Signature={signature}"
    ))
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> ClientResult<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| ClientError::config_error(format!("invalid signing key: {e}")))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// SigV4 URI encoding: unreserved characters pass through, everything else is
/// `%XX` upper-case. `/` is kept in paths and encoded in query components.
fn uri_encode(input: &str, encode_slash: bool) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            b'/' if !encode_slash => out.push('/'),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
