// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Remote transform service.
//!
//! The editing session never talks to the network itself. It hands a
//! [`TransformInput`] to a [`TransformGateway`] and gets back either the
//! replacement video bytes or a [`GatewayError`]. Gateways must not panic;
//! every call resolves to one of the two outcomes.

pub mod http;

use crate::models::source::{DownloadRequest, DownloadedFile, VideoInfo};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use thiserror::Error;

pub use http::HttpGateway;

/// Upload progress callback, called with fractions in `[0.0, 1.0]`.
pub type ProgressFn = Arc<dyn Fn(f32) + Send + Sync>;

/// Failure reported by a gateway.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GatewayError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

/// Parameters of one transform.
#[derive(Debug, Clone, PartialEq)]
pub enum TransformOp {
    Trim { start: f64, end: f64 },
    Caption { subtitle_text: String },
    Combined { start: f64, end: f64, subtitle_text: String },
}

impl TransformOp {
    /// Endpoint path segment.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Trim { .. } => "trim",
            Self::Caption { .. } => "caption",
            Self::Combined { .. } => "combined",
        }
    }
}

/// Everything needed to run one transform remotely.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformInput {
    pub video: Bytes,
    pub title: String,
    pub op: TransformOp,
}

/// The remote service: source lookup, download and the three transforms.
#[async_trait]
pub trait TransformGateway: Send + Sync {
    /// Look up title, duration and formats of a source URL.
    async fn fetch_info(&self, url: &str) -> Result<VideoInfo, GatewayError>;

    /// Download the source in the requested format.
    async fn download(&self, request: &DownloadRequest) -> Result<DownloadedFile, GatewayError>;

    /// Upload a video with transform parameters and receive the result.
    async fn transform(
        &self,
        input: TransformInput,
        progress: ProgressFn,
    ) -> Result<Bytes, GatewayError>;

    /// Fetch an arbitrary resource such as a thumbnail.
    async fn fetch_bytes(&self, url: &str) -> Result<Bytes, GatewayError>;
}
