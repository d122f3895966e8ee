use crate::gate::{GateRequest, GateResponse};
use axum::{
    body::Body,
    http::{header::IF_NONE_MATCH, HeaderMap, Method, Response as HttpResponse, StatusCode, Uri},
    response::Response,
};

pub(crate) fn gate_request(method: Method, uri: &Uri, headers: &HeaderMap) -> GateRequest {
    let if_none_match = headers
        .get(IF_NONE_MATCH)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    GateRequest {
        method,
        path: uri.path().to_string(),
        if_none_match,
    }
}

pub(crate) fn build_response(response: GateResponse) -> Response {
    let mut builder = HttpResponse::builder().status(response.status);
    for (name, value) in &response.headers {
        builder = builder.header(name, value.as_str());
    }
    builder
        .body(Body::from(response.body))
        .unwrap_or_else(|err| {
            log::error!("Invalid gate response: {err}");
            internal_error()
        })
}

pub(crate) fn internal_error() -> Response {
    let mut response = Response::new(Body::from("internal error"));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
}
