//! Inbound request inspection.
//!
//! # Responsibilities
//! - Choose the decode strategy from method and content type
//! - Resolve the client address from proxy headers or the peer address
//! - Build the per-request [`RequestContext`]

use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::http::{header, HeaderMap, Method, Request};
use mediatype::names::{APPLICATION, FORM_DATA, JSON, MULTIPART, PLAIN, TEXT};
use mediatype::MediaType;

use crate::operation::RequestContext;

pub const X_REAL_IP: &str = "x-real-ip";
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// How the request document is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStrategy {
    /// Query string parameters.
    Get,
    /// Body is one JSON value.
    JsonBody,
    /// `multipart/form-data` with `operations`, `map` and file parts.
    Multipart,
    /// POST with a content type that carries no operations.
    NoBody,
    /// Any method other than GET and POST.
    Unsupported,
}

impl DecodeStrategy {
    pub fn select(method: &Method, headers: &HeaderMap) -> Self {
        match *method {
            Method::GET => DecodeStrategy::Get,
            Method::POST => {
                let mime = headers
                    .get(header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| MediaType::parse(v).ok());
                match mime {
                    Some(m) if m.ty == APPLICATION && m.subty == JSON => DecodeStrategy::JsonBody,
                    Some(m) if m.ty == TEXT && m.subty == PLAIN => DecodeStrategy::JsonBody,
                    Some(m) if m.ty == MULTIPART && m.subty == FORM_DATA => {
                        DecodeStrategy::Multipart
                    }
                    _ => DecodeStrategy::NoBody,
                }
            }
            _ => DecodeStrategy::Unsupported,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DecodeStrategy::Get => "get",
            DecodeStrategy::JsonBody => "json",
            DecodeStrategy::Multipart => "multipart",
            DecodeStrategy::NoBody => "no_body",
            DecodeStrategy::Unsupported => "unsupported",
        }
    }
}

/// Resolve the client address.
///
/// Order: `X-Real-IP`, first entry of `X-Forwarded-For`, host part of the
/// peer address, then the peer address verbatim.
pub fn resolve_remote_ip(headers: &HeaderMap, peer: Option<&str>) -> String {
    let header_value = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
    };

    if let Some(real_ip) = header_value(X_REAL_IP) {
        return real_ip.to_string();
    }
    if let Some(forwarded) = header_value(X_FORWARDED_FOR) {
        let first = forwarded.split(',').next().unwrap_or(forwarded);
        return first.trim().to_string();
    }
    match peer {
        Some(peer) => match peer.parse::<SocketAddr>() {
            Ok(addr) => addr.ip().to_string(),
            Err(_) => peer.to_string(),
        },
        None => String::new(),
    }
}

impl RequestContext {
    /// Capture headers and client address from an inbound request.
    pub fn from_request<B>(request: &Request<B>) -> Self {
        let peer = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.to_string());
        Self {
            remote_ip: resolve_remote_ip(request.headers(), peer.as_deref()),
            headers: request.headers().clone(),
        }
    }
}
