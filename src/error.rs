// API failure kinds with one HTTP rendering each.
//
// Expired tokens answer 401 with a JSON body the frontend can react to; a
// token that fails signature checks answers a bare 403. Everything the caller
// cannot act on collapses to 500.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("No game name entered")]
    EmptyQuery,
    #[error("No results found")]
    NoResults,
    #[error("Token expired")]
    TokenExpired,
    #[error("token failed verification")]
    TokenInvalid,
    #[error("authentication required")]
    Unauthenticated,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::EmptyQuery => StatusCode::BAD_REQUEST,
            ApiError::TokenExpired | ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::TokenInvalid => StatusCode::FORBIDDEN,
            ApiError::NoResults | ApiError::Database(_) | ApiError::Other(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            // Bare status, no body: the frontend treats any 403 as "sign in again".
            ApiError::TokenInvalid => HttpResponse::Forbidden().finish(),
            _ => HttpResponse::build(self.status_code())
                .json(json!({ "error": self.to_string() })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::header::CONTENT_TYPE;

    #[test]
    fn status_codes_follow_the_contract() {
        assert_eq!(ApiError::EmptyQuery.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::NoResults.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(ApiError::TokenExpired.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::TokenInvalid.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            ApiError::Unauthenticated.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Database(sqlx::Error::RowNotFound).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn expired_token_renders_a_json_error_body() {
        let resp = ApiError::TokenExpired.error_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(resp.headers().get(CONTENT_TYPE).unwrap(), "application/json");
    }

    #[test]
    fn invalid_token_renders_a_bare_forbidden() {
        let resp = ApiError::TokenInvalid.error_response();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert!(resp.headers().get(CONTENT_TYPE).is_none());
    }
}
