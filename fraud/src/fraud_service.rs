//! Fraud prevention service implementation
//!
//! Thin HTTP adapter around [`Matcher`]: parses the request body, enforces the
//! batch limits, runs the matcher and shapes the response.

use std::convert::Infallible;

use hyper::body::HttpBody;
use hyper::header::{HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};
use hyper::{Body, Method, Request, Response, StatusCode};

use crate::config::RuntimeConfig;
use crate::engine::entry::{PurchaseBatch, PurchaseRecord};
use crate::engine::matchlogic::Matcher;
use crate::error::{FraudError, FraudResult};
use crate::metrics;

/// Route of the validate operation, compared case-insensitively.
pub const VALIDATE_PATH: &str = "/fraudprevention/validate";

#[derive(Debug, Clone)]
pub struct FraudServiceSVC {
    min_batch_size: usize,
    max_batch_size: usize,
    max_body_bytes: usize,
    matcher: Matcher,
}

impl Default for FraudServiceSVC {
    fn default() -> Self {
        Self::from_config(&RuntimeConfig::new())
    }
}

impl FraudServiceSVC {
    pub fn new(min_batch_size: usize, max_batch_size: usize) -> Self {
        Self {
            min_batch_size,
            max_batch_size,
            max_body_bytes: RuntimeConfig::new().max_body_bytes,
            matcher: Matcher::new(),
        }
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    pub fn from_config(config: &RuntimeConfig) -> Self {
        Self::new(config.min_batch_size, config.max_batch_size)
            .with_max_body_bytes(config.max_body_bytes)
    }

    /// Validates a raw request body and returns the fraudulent purchases.
    ///
    /// Batch limits are checked before the matcher runs.
    pub fn validate(&self, body: &[u8]) -> FraudResult<Vec<PurchaseRecord>> {
        let batch: PurchaseBatch = serde_json::from_slice(body)?;
        let purchases = batch.purchases.ok_or(FraudError::MissingPurchases)?;
        if purchases.len() < self.min_batch_size {
            return Err(FraudError::NotEnoughPurchases {
                min: self.min_batch_size,
                actual: purchases.len(),
            });
        }
        if purchases.len() > self.max_batch_size {
            return Err(FraudError::BatchTooLarge {
                max: self.max_batch_size,
                actual: purchases.len(),
            });
        }
        log::debug!("validating {} purchases", purchases.len());
        self.matcher.evaluate(&purchases)
    }

    /// Routes a single HTTP request.
    pub async fn call(&self, request: Request<Body>) -> Result<Response<Body>, Infallible> {
        let path = request.uri().path().trim_end_matches('/');
        if !path.eq_ignore_ascii_case(VALIDATE_PATH) {
            return Ok(text_response(StatusCode::NOT_FOUND, "Not Found"));
        }
        if request.method() != Method::POST {
            return Ok(text_response(
                StatusCode::METHOD_NOT_ALLOWED,
                "Method Not Allowed",
            ));
        }
        Ok(self.validate_request(request).await)
    }

    /// Collects the body, refusing anything above `max_body_bytes` whether or
    /// not the client declared a `Content-Length`.
    async fn read_body(&self, request: Request<Body>) -> FraudResult<Vec<u8>> {
        let declared = request
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<usize>().ok());
        if declared.map_or(false, |len| len > self.max_body_bytes) {
            return Err(FraudError::BodyTooLarge {
                max: self.max_body_bytes,
            });
        }

        let mut body = request.into_body();
        let mut buffer = Vec::with_capacity(declared.unwrap_or(0));
        while let Some(chunk) = body.data().await {
            let chunk = chunk.map_err(|e| FraudError::InvalidBody(e.to_string()))?;
            if buffer.len() + chunk.len() > self.max_body_bytes {
                return Err(FraudError::BodyTooLarge {
                    max: self.max_body_bytes,
                });
            }
            buffer.extend_from_slice(&chunk);
        }
        Ok(buffer)
    }

    async fn validate_request(&self, request: Request<Body>) -> Response<Body> {
        let result = metrics::record_metrics("validate", || async move {
            let body = self.read_body(request).await?;
            let fraudulent = self.validate(&body)?;
            let encoded = serde_json::to_vec(&fraudulent)
                .map_err(|e| FraudError::Internal(format!("encode response: {}", e)))?;
            Ok::<_, FraudError>((fraudulent.len(), encoded))
        })
        .await;

        match result {
            Ok((flagged, encoded)) => {
                log::info!("validate done, {} purchases flagged", flagged);
                metrics::record_flagged(flagged);
                let mut response = Response::new(Body::from(encoded));
                response
                    .headers_mut()
                    .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                response
            }
            Err(e) => error_response(&e),
        }
    }
}

fn error_response(e: &FraudError) -> Response<Body> {
    if e.is_client_error() {
        log::warn!("validate rejected: {}", e);
    } else {
        log::error!("An unexpected error occurred while processing the request: {}", e);
    }
    metrics::record_rejected(e.reason());
    text_response(e.status_code(), e.public_message())
}

fn text_response(status: StatusCode, message: impl Into<Body>) -> Response<Body> {
    let mut response = Response::new(message.into());
    *response.status_mut() = status;
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}
