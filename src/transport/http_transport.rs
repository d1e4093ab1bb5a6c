use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use hyper::{Body, Client, Request, Response, StatusCode, Uri};
use hyper::client::HttpConnector;
use hyper::header::{AUTHORIZATION, ETAG, IF_MATCH, IF_NONE_MATCH, USER_AGENT};
use hyper_tls::HttpsConnector;
use tracing::trace;
use url::Url;

use crate::error::{PublishError, TransportError};
use crate::transport::{Authentication, RemoteRepository, RemoteResource, WriteOutcome, WritePrecondition};
use crate::util::checksums::ExpectedChecksum;

const USER_AGENT_VALUE: &str = concat!("snapshot-vault/", env!("CARGO_PKG_VERSION"));

/// Reads and writes resources relative to a fixed base URL over HTTP(S), with basic
///  authentication and conditional `PUT`s.
///
/// Instances do HTTP connection caching internally, so keeping them alive has performance benefits.
pub struct HttpRepository {
    client: Client<HttpsConnector<HttpConnector>>,
    base_url: Url, // with trailing '/'
    authorization: Option<String>,
    timeout: Duration,
}
impl HttpRepository {
    pub fn new(base_url: Url, authentication: Authentication, timeout: Duration) -> Result<HttpRepository, PublishError> {
        let mut base_url = base_url;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        // check that the base URL is a valid URI for hyper
        Uri::try_from(base_url.as_str())
            .map_err(|e| PublishError::InvalidRepositoryUrl { url: base_url.to_string(), reason: e.to_string() })?;

        let authorization = match authentication {
            Authentication::None => None,
            Authentication::Basic { username, password } => {
                Some(format!("Basic {}", STANDARD.encode(format!("{}:{}", username, password))))
            }
        };

        Ok(HttpRepository {
            client: Client::builder()
                .build::<_, Body>(HttpsConnector::new()),
            base_url,
            authorization,
            timeout,
        })
    }

    fn url_for(&self, name: &str) -> Result<Url, TransportError> {
        self.base_url.join(name.trim_start_matches('/'))
            .map_err(|e| TransportError::InvalidLocation(format!("{}: {}", name, e)))
    }

    fn request(&self, method: &str, url: &Url) -> hyper::http::request::Builder {
        let mut builder = Request::builder()
            .method(method)
            .uri(url.as_str())
            .header(USER_AGENT, USER_AGENT_VALUE);
        if let Some(authorization) = &self.authorization {
            builder = builder.header(AUTHORIZATION, authorization);
        }
        builder
    }

    async fn with_timeout<T>(&self, url: &Url, f: impl Future<Output = Result<T, TransportError>>) -> Result<T, TransportError> {
        match tokio::time::timeout(self.timeout, f).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout { url: url.to_string(), timeout: self.timeout }),
        }
    }

    async fn send(&self, url: &Url, request: Request<Body>) -> Result<Response<Body>, TransportError> {
        trace!("{} {}", request.method(), url);
        self.client.request(request)
            .await
            .map_err(|source| TransportError::Http { url: url.to_string(), source })
    }

    fn expected_checksums(response: &Response<Body>) -> Vec<ExpectedChecksum> {
        let header = |name: &str| response.headers().get(name).and_then(|h| h.to_str().ok());

        let mut result = Vec::new();
        if let Some(sha1) = header("x-checksum-sha1").or_else(|| header("x-goog-meta-checksum-sha1")).and_then(ExpectedChecksum::sha1) {
            result.push(sha1);
        }
        if let Some(md5) = header("x-checksum-md5").or_else(|| header("x-goog-meta-checksum-md5")).and_then(ExpectedChecksum::md5) {
            result.push(md5);
        }
        result
    }
}

fn invalid_request(url: &Url, e: hyper::http::Error) -> TransportError {
    TransportError::InvalidLocation(format!("{}: {}", url, e))
}

#[async_trait]
impl RemoteRepository for HttpRepository {
    async fn read(&self, name: &str) -> Result<Option<RemoteResource>, TransportError> {
        let url = self.url_for(name)?;
        let request = self.request("GET", &url)
            .body(Body::empty())
            .map_err(|e| invalid_request(&url, e))?;

        self.with_timeout(&url, async {
            let response = self.send(&url, request).await?;

            if response.status() == StatusCode::NOT_FOUND || response.status() == StatusCode::GONE {
                trace!("{} does not exist", url);
                return Ok(None);
            }
            if !response.status().is_success() {
                return Err(TransportError::HttpStatus { status: response.status().as_u16(), url: url.to_string() });
            }

            let etag = response.headers().get(ETAG)
                .and_then(|h| h.to_str().ok())
                .map(|s| s.to_string());
            let expected_checksums = Self::expected_checksums(&response);

            let content = hyper::body::to_bytes(response.into_body())
                .await
                .map_err(|source| TransportError::Http { url: url.to_string(), source })?;

            for expected in &expected_checksums {
                expected.verify(url.as_str(), &content)?;
            }

            Ok(Some(RemoteResource { content, etag }))
        }).await
    }

    async fn write(&self, name: &str, content: Bytes, precondition: WritePrecondition) -> Result<WriteOutcome, TransportError> {
        let url = self.url_for(name)?;
        let mut builder = self.request("PUT", &url);
        builder = match &precondition {
            WritePrecondition::Unconditional => builder,
            WritePrecondition::IfAbsent => builder.header(IF_NONE_MATCH, "*"),
            WritePrecondition::IfMatch(etag) => builder.header(IF_MATCH, etag.as_str()),
        };
        let request = builder
            .body(Body::from(content))
            .map_err(|e| invalid_request(&url, e))?;

        self.with_timeout(&url, async {
            let response = self.send(&url, request).await?;

            if response.status() == StatusCode::PRECONDITION_FAILED {
                trace!("precondition {:?} failed for {}", precondition, url);
                return Ok(WriteOutcome::PreconditionFailed);
            }
            if !response.status().is_success() {
                return Err(TransportError::HttpStatus { status: response.status().as_u16(), url: url.to_string() });
            }
            Ok(WriteOutcome::Written)
        }).await
    }
}
