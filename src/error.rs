use actix_web::{HttpResponse, http::StatusCode};
use thiserror::Error;

use crate::response::{ErrorBody, ErrorMessage};

/// Failures that abort an action request before a transaction is returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("Invalid input query parameter: to")]
    InvalidRecipient,
    #[error("Invalid input query parameter: amount ({0})")]
    InvalidAmount(&'static str),
    #[error("Invalid \"account\" provided")]
    MissingSource,
    #[error("Invalid \"account\" provided: {0}")]
    InvalidSource(String),
    #[error("Account may not be rent exempt: {0}")]
    BelowRentExemption(String),
    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),
    #[error("Failed to encode transaction: {0}")]
    Encoding(String),
}

impl actix_web::error::ResponseError for ActionError {
    fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::BadRequest().json(ErrorBody::new(self.to_string()))
    }
}

/// Wraps an [`ActionError`] raised while serving the discovery endpoint, which
/// answers with a 500 and a `message` body.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct DiscoveryError(#[from] pub ActionError);

impl actix_web::error::ResponseError for DiscoveryError {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::InternalServerError().json(ErrorMessage {
            message: self.0.to_string(),
        })
    }
}

/// Transport or protocol failure talking to the cluster.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("request to {method} failed: {source}")]
    Transport {
        method: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{method} returned error {code}: {message}")]
    Remote {
        method: &'static str,
        code: i64,
        message: String,
    },
    #[error("{method} returned a malformed result: {reason}")]
    Decode {
        method: &'static str,
        reason: String,
    },
}

/// Reward mint failures. Logged by the dispatcher, never returned to a client.
#[derive(Debug, Error)]
pub enum MintError {
    #[error("associated token account error: {0}")]
    AssociatedAccount(#[source] RpcError),
    #[error("mint failed: {0}")]
    MintFailed(String),
}

impl MintError {
    /// Any failure in the reward pipeline surfaces as `MintFailed`, keeping the
    /// underlying cause in the message.
    pub fn into_mint_failed(self) -> Self {
        match self {
            MintError::AssociatedAccount(e) => {
                MintError::MintFailed(format!("associated token account error: {}", e))
            }
            failed @ MintError::MintFailed(_) => failed,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{ResponseError, body::to_bytes};

    #[actix_web::test]
    async fn action_errors_render_as_bad_request_with_error_field() {
        let err = ActionError::BelowRentExemption("Recipient111".to_string());
        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Account may not be rent exempt: Recipient111");
    }

    #[actix_web::test]
    async fn discovery_errors_render_as_server_error_with_message_field() {
        let err = DiscoveryError::from(ActionError::InvalidRecipient);
        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["message"], "Invalid input query parameter: to");
    }

    #[test]
    fn associated_account_errors_fold_into_mint_failed() {
        let err = MintError::AssociatedAccount(RpcError::Remote {
            method: "getAccountInfo",
            code: -32602,
            message: "bad params".to_string(),
        })
        .into_mint_failed();

        match err {
            MintError::MintFailed(msg) => {
                assert!(msg.contains("getAccountInfo"));
                assert!(msg.contains("bad params"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
