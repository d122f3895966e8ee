//! Delivery gate: turns a request path into a bundle response.
//!
//! Pure and synchronous. The HTTP adapter in [`crate::server`] only moves
//! requests in and [`GateResponse`]s out.

use axum::http::{header, HeaderName, Method, StatusCode};
use clientlib_engine::{BundleRequest, Engine};
use clientlib_model::ClientlibType;
use clientlib_protocol::{
    parse_category_and_hash_from_suffix, parse_hash_from_suffix, AddressError, RequestPathInfo,
    SOURCE_MAP_EXTENSION,
};

pub(crate) const CACHE_IMMUTABLE: &str = "public, max-age=31536000, immutable";
pub(crate) const CACHE_REVALIDATE: &str = "no-cache";
const JSON_CONTENT_TYPE: &str = "application/json;charset=UTF-8";

/// Incoming request as seen by the gate
#[derive(Debug, Clone)]
pub(crate) struct GateRequest {
    pub method: Method,
    pub path: String,
    pub if_none_match: Option<String>,
}

impl GateRequest {
    #[cfg(test)]
    pub(crate) fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            if_none_match: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct GateResponse {
    pub status: StatusCode,
    pub headers: Vec<(HeaderName, String)>,
    pub body: Vec<u8>,
}

impl GateResponse {
    fn empty(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    fn text(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            headers: vec![(header::CONTENT_TYPE, "text/plain;charset=UTF-8".to_string())],
            body: message.into().into_bytes(),
        }
    }

    fn with_header(mut self, name: HeaderName, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    #[cfg(test)]
    pub(crate) fn header(&self, name: &HeaderName) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// What a request path addresses
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Decoded {
    /// Source map request
    SourceMap,
    /// No extension: nothing to do
    NoExtension,
    Bundle {
        request: BundleRequest,
        hash: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DecodeError {
    /// Extension that is not a bundled type
    UnknownExtension(String),
    /// Neither public nor the category path
    NotPublic(String),
    Address(AddressError),
}

/// Classify a request path without touching the bundle content.
pub(crate) fn decode(engine: &Engine, path: &str) -> Result<Decoded, DecodeError> {
    let info = RequestPathInfo::parse(path, |resource, ext| engine.resource_exists(resource, ext));
    let Some(extension) = info.extension.as_deref() else {
        return Ok(Decoded::NoExtension);
    };
    if extension == SOURCE_MAP_EXTENSION {
        return Ok(Decoded::SourceMap);
    }
    let kind = ClientlibType::from_extension(extension)
        .ok_or_else(|| DecodeError::UnknownExtension(extension.to_string()))?;
    let minified = info.is_minified();

    if engine.is_category_path(&info.resource_path) {
        let address =
            parse_category_and_hash_from_suffix(&info.suffix, extension).map_err(DecodeError::Address)?;
        return Ok(Decoded::Bundle {
            request: BundleRequest::category(kind, address.category, minified),
            hash: address.hash,
        });
    }
    if !engine.is_public(&info.resource_path) {
        return Err(DecodeError::NotPublic(info.resource_path));
    }
    let hash = if info.suffix.is_empty() {
        None
    } else {
        parse_hash_from_suffix(&info.suffix)
    };
    Ok(Decoded::Bundle {
        request: BundleRequest::path(kind, info.resource_path, minified),
        hash,
    })
}

/// Full gate: method check, decoding, rendering and cache headers.
pub(crate) fn respond(engine: &Engine, request: &GateRequest) -> GateResponse {
    let head = request.method == Method::HEAD;
    if request.method != Method::GET && !head {
        return GateResponse::empty(StatusCode::METHOD_NOT_ALLOWED)
            .with_header(header::ALLOW, "GET, HEAD");
    }

    let (bundle_request, requested_hash) = match decode(engine, &request.path) {
        Ok(Decoded::SourceMap) => {
            return GateResponse::empty(StatusCode::OK)
                .with_header(header::CONTENT_TYPE, JSON_CONTENT_TYPE)
                .with_header(header::CONTENT_LENGTH, "0");
        }
        Ok(Decoded::NoExtension) => {
            log::info!("No extension in {}; dropping request", request.path);
            return GateResponse::empty(StatusCode::OK);
        }
        Ok(Decoded::Bundle { request, hash }) => (request, hash),
        Err(DecodeError::Address(err)) => {
            log::warn!("{err}");
            return GateResponse::text(StatusCode::BAD_REQUEST, err.to_string());
        }
        Err(DecodeError::UnknownExtension(ext)) => {
            log::debug!("Unsupported extension {ext} in {}", request.path);
            return GateResponse::empty(StatusCode::NOT_FOUND);
        }
        Err(DecodeError::NotPublic(path)) => {
            log::debug!("{path} is not a public path");
            return GateResponse::empty(StatusCode::NOT_FOUND);
        }
    };

    let delivery = match engine.bundle(&bundle_request) {
        Ok(Some(delivery)) => delivery,
        Ok(None) => return GateResponse::empty(StatusCode::NOT_FOUND),
        Err(err) => {
            log::error!("Failed to render {}: {err}", request.path);
            return GateResponse::text(StatusCode::INTERNAL_SERVER_ERROR, "bundle rendering failed");
        }
    };
    let bundle = delivery.bundle;

    let etag = bundle.etag();
    let cache_control = if requested_hash.as_deref() == Some(bundle.hash.as_str()) {
        CACHE_IMMUTABLE
    } else {
        CACHE_REVALIDATE
    };

    if request
        .if_none_match
        .as_deref()
        .is_some_and(|value| etag_matches(value, &etag))
    {
        return GateResponse::empty(StatusCode::NOT_MODIFIED)
            .with_header(header::ETAG, etag)
            .with_header(header::CACHE_CONTROL, cache_control);
    }

    let length = bundle.content.len();
    let body = if head {
        Vec::new()
    } else {
        bundle.content.into_bytes()
    };
    GateResponse {
        status: StatusCode::OK,
        headers: Vec::new(),
        body,
    }
    .with_header(header::CONTENT_TYPE, content_type(bundle.kind))
    .with_header(header::CONTENT_LENGTH, length.to_string())
    .with_header(header::ETAG, etag)
    .with_header(header::CACHE_CONTROL, cache_control)
}

fn content_type(kind: ClientlibType) -> &'static str {
    match kind {
        ClientlibType::Css => "text/css;charset=UTF-8",
        ClientlibType::Js => "application/javascript;charset=UTF-8",
        ClientlibType::Link | ClientlibType::Img => "application/octet-stream",
    }
}

fn etag_matches(header_value: &str, etag: &str) -> bool {
    header_value
        .split(',')
        .map(str::trim)
        .any(|candidate| candidate == "*" || candidate.trim_start_matches("W/") == etag)
}
