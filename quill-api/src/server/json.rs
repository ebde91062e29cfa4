//! JSON bodies in and out of the post routes.
//!
//! Extraction failures and serialization failures both turn into
//! [`ServerError`], so clients only ever see the `{code, message}` error shape.

use crate::server::ServerError;
use axum::{
    Json as AxumJson,
    extract::FromRequest,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::TypedHeader;
use headers::ContentType;
use serde::Serialize;

#[derive(FromRequest, Debug, Clone, Copy, Default)]
#[from_request(via(AxumJson), rejection(ServerError))]
pub struct Json<T>(pub T);

/// A freshly stored resource: `201 Created` with the resource as body.
#[derive(Debug, Clone, Copy)]
pub struct Created<T>(pub T);

fn encode<T: Serialize>(status: StatusCode, value: &T) -> Response {
    let mut body = Vec::with_capacity(256);
    match serde_json::to_writer(&mut body, value) {
        Ok(()) => (status, TypedHeader(ContentType::json()), body).into_response(),
        Err(err) => ServerError::JsonResponse(err).into_response(),
    }
}

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        encode(StatusCode::OK, &self.0)
    }
}

impl<T: Serialize> IntoResponse for Created<T> {
    fn into_response(self) -> Response {
        encode(StatusCode::CREATED, &self.0)
    }
}
