//! Cloud object-store collaborator.
//!
//! [`ObjectStore`] is the narrow seam the transfer gateway depends on;
//! [`GcsObjectStore`] talks to the Cloud Storage JSON API. Unlike plain HTTP
//! transfers, a non-2xx answer from the store is a transfer error.

use std::path::Path;

use async_trait::async_trait;
use tracing::debug;

use super::write_response_body;
use crate::config::ObjectStoreConfig;
use crate::sandbox::SandboxError;

/// Scheme prefix stripped from object URLs.
pub const OBJECT_URL_SCHEME: &str = "gs://";

/// `scheme://bucket/object-key`, split on the first `/` after the bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectUrl {
    pub bucket: String,
    pub key: String,
}

impl ObjectUrl {
    /// Parse `gs://bucket/key`. A bare `bucket/key` is accepted too.
    pub fn parse(raw: &str) -> Result<Self, SandboxError> {
        let rest = raw.strip_prefix(OBJECT_URL_SCHEME).unwrap_or(raw);
        match rest.split_once('/') {
            Some((bucket, key)) if !bucket.is_empty() && !key.is_empty() => Ok(Self {
                bucket: bucket.to_string(),
                key: key.to_string(),
            }),
            _ => Err(SandboxError::InvalidObjectUrl(raw.to_string())),
        }
    }
}

impl std::fmt::Display for ObjectUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{OBJECT_URL_SCHEME}{}/{}", self.bucket, self.key)
    }
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Download the object into `dest`. Returns bytes written.
    async fn download_to_file(&self, object: &ObjectUrl, dest: &Path)
        -> Result<u64, SandboxError>;

    /// Upload the contents of `src` as the object.
    async fn upload_from_file(&self, object: &ObjectUrl, src: &Path) -> Result<(), SandboxError>;
}

/// Google Cloud Storage over its JSON API.
pub struct GcsObjectStore {
    base_url: String,
    token: Option<String>,
    http: reqwest::Client,
}

impl GcsObjectStore {
    pub fn new(cfg: &ObjectStoreConfig, http: reqwest::Client) -> Self {
        Self {
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            token: cfg.effective_token(),
            http,
        }
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    fn media_url(&self, object: &ObjectUrl) -> String {
        format!(
            "{}/storage/v1/b/{}/o/{}?alt=media",
            self.base_url,
            urlencoding::encode(&object.bucket),
            urlencoding::encode(&object.key)
        )
    }

    fn upload_url(&self, object: &ObjectUrl) -> String {
        format!(
            "{}/upload/storage/v1/b/{}/o?uploadType=media&name={}",
            self.base_url,
            urlencoding::encode(&object.bucket),
            urlencoding::encode(&object.key)
        )
    }
}

#[async_trait]
impl ObjectStore for GcsObjectStore {
    async fn download_to_file(
        &self,
        object: &ObjectUrl,
        dest: &Path,
    ) -> Result<u64, SandboxError> {
        let resp = self
            .authorize(self.http.get(self.media_url(object)))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SandboxError::Transfer(format!(
                "object store returned {status} for {object}: {body}"
            )));
        }

        let written = write_response_body(resp, dest).await?;
        debug!(%object, written, "Object downloaded");
        Ok(written)
    }

    async fn upload_from_file(&self, object: &ObjectUrl, src: &Path) -> Result<(), SandboxError> {
        let content = tokio::fs::read(src)
            .await
            .map_err(|e| SandboxError::from_io(src, e))?;
        let mime = mime_guess::from_path(&object.key).first_or_octet_stream();

        let resp = self
            .authorize(self.http.post(self.upload_url(object)))
            .header(reqwest::header::CONTENT_TYPE, mime.essence_str())
            .body(content)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SandboxError::Transfer(format!(
                "object store returned {status} for {object}: {body}"
            )));
        }

        debug!(%object, "Object uploaded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{body_bytes, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store(server: &MockServer, token: Option<&str>) -> GcsObjectStore {
        let cfg = ObjectStoreConfig {
            base_url: server.uri(),
            access_token: token.map(String::from),
        };
        GcsObjectStore::new(&cfg, reqwest::Client::new())
    }

    #[test]
    fn parses_scheme_bucket_and_key() {
        let url = ObjectUrl::parse("gs://media-bucket/in/clip.mp4").unwrap();
        assert_eq!(url.bucket, "media-bucket");
        assert_eq!(url.key, "in/clip.mp4");
        assert_eq!(url.to_string(), "gs://media-bucket/in/clip.mp4");
    }

    #[test]
    fn accepts_bare_bucket_path() {
        let url = ObjectUrl::parse("media-bucket/clip.mp4").unwrap();
        assert_eq!(url.bucket, "media-bucket");
        assert_eq!(url.key, "clip.mp4");
    }

    #[test]
    fn rejects_missing_bucket_or_key() {
        for raw in ["gs://bucket-only", "gs://bucket/", "gs:///key", ""] {
            assert!(
                matches!(ObjectUrl::parse(raw), Err(SandboxError::InvalidObjectUrl(_))),
                "{raw} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn download_fetches_media_with_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/storage/v1/b/media-bucket/o/in%2Fclip.mp4"))
            .and(query_param("alt", "media"))
            .and(header("authorization", "Bearer t0ken"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"frames".to_vec()))
            .mount(&server)
            .await;

        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("clip.mp4");
        let object = ObjectUrl::parse("gs://media-bucket/in/clip.mp4").unwrap();
        let written = store(&server, Some("t0ken"))
            .download_to_file(&object, &dest)
            .await
            .unwrap();

        assert_eq!(written, 6);
        assert_eq!(std::fs::read(&dest).unwrap(), b"frames");
    }

    #[tokio::test]
    async fn download_error_status_leaves_no_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_string("denied"))
            .mount(&server)
            .await;

        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("clip.mp4");
        let object = ObjectUrl::parse("gs://media-bucket/clip.mp4").unwrap();
        let err = store(&server, None)
            .download_to_file(&object, &dest)
            .await
            .unwrap_err();

        assert!(matches!(err, SandboxError::Transfer(ref msg) if msg.contains("403")));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn upload_posts_file_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload/storage/v1/b/media-bucket/o"))
            .and(query_param("uploadType", "media"))
            .and(query_param("name", "out/clip.mp3"))
            .and(header("content-type", "audio/mpeg"))
            .and(body_bytes(b"mp3 data".to_vec()))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .expect(1)
            .mount(&server)
            .await;

        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("clip.mp3");
        std::fs::write(&src, b"mp3 data").unwrap();
        let object = ObjectUrl::parse("gs://media-bucket/out/clip.mp3").unwrap();
        store(&server, None)
            .upload_from_file(&object, &src)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn upload_of_missing_file_is_not_found() {
        let server = MockServer::start().await;
        let tmp = TempDir::new().unwrap();
        let object = ObjectUrl::parse("gs://b/k").unwrap();
        let err = store(&server, None)
            .upload_from_file(&object, &tmp.path().join("absent"))
            .await
            .unwrap_err();
        assert!(matches!(err, SandboxError::NotFound(_)));
    }
}
