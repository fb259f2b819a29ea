use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::error::BridgeError;

#[derive(Debug)]
pub enum AppError {
    /// The device id is not one this bridge subscribes to.
    UnknownDevice(String),
    /// MyEldom refused or never answered the forwarded request.
    Upstream(BridgeError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::UnknownDevice(id) => (StatusCode::NOT_FOUND, format!("unknown device: {id}")),
            Self::Upstream(e) => (StatusCode::BAD_GATEWAY, e.to_string()),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<BridgeError> for AppError {
    fn from(e: BridgeError) -> Self {
        Self::Upstream(e)
    }
}
