use actix_web::http::header::AUTHORIZATION;
use actix_web::HttpRequest;
use thiserror::Error;
use uuid::Uuid;

use crate::services::auth as auth_service;

#[derive(Debug, Error)]
pub enum AuthMiddlewareError {
    #[error("Missing authorization token")]
    MissingToken,
    #[error("Invalid authorization token")]
    InvalidToken,
}

/// Extract the owning account id from the `Authorization: Bearer` header
pub fn extract_user_id(req: &HttpRequest, jwt_secret: &str) -> Result<Uuid, AuthMiddlewareError> {
    let auth_header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or(AuthMiddlewareError::MissingToken)?;

    let token = auth_header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(AuthMiddlewareError::InvalidToken)?;

    auth_service::verify_jwt(token, jwt_secret).map_err(|e| {
        log::debug!("Rejected bearer token: {}", e);
        AuthMiddlewareError::InvalidToken
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_jwt;
    use actix_web::test::TestRequest;

    #[test]
    fn test_auth_error_display() {
        assert_eq!(
            AuthMiddlewareError::MissingToken.to_string(),
            "Missing authorization token"
        );
        assert_eq!(
            AuthMiddlewareError::InvalidToken.to_string(),
            "Invalid authorization token"
        );
    }

    #[test]
    fn test_extract_user_id() {
        let user_id = Uuid::new_v4();
        let req = TestRequest::default()
            .insert_header((AUTHORIZATION, format!("Bearer {}", create_jwt(&user_id, "secret"))))
            .to_http_request();

        assert_eq!(extract_user_id(&req, "secret").unwrap(), user_id);
    }

    #[test]
    fn test_missing_header() {
        let req = TestRequest::default().to_http_request();
        assert!(matches!(
            extract_user_id(&req, "secret"),
            Err(AuthMiddlewareError::MissingToken)
        ));
    }

    #[test]
    fn test_wrong_scheme_and_secret() {
        let token = create_jwt(&Uuid::new_v4(), "secret");

        let basic = TestRequest::default()
            .insert_header((AUTHORIZATION, format!("Basic {}", token)))
            .to_http_request();
        assert!(matches!(
            extract_user_id(&basic, "secret"),
            Err(AuthMiddlewareError::InvalidToken)
        ));

        let bearer = TestRequest::default()
            .insert_header((AUTHORIZATION, format!("Bearer {}", token)))
            .to_http_request();
        assert!(matches!(
            extract_user_id(&bearer, "other-secret"),
            Err(AuthMiddlewareError::InvalidToken)
        ));
    }
}
