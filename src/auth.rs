use async_trait::async_trait;
use axum::extract::{FromRequest, RequestParts};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

/// The authenticated caller, as established by the session layer in front of
/// this service. The id is trusted; ownership and role are re-verified by the
/// engine for every mutating operation.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Principal {
    pub id: Uuid,
    pub role: Role,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Shipper,
    Carrier,
    Other,
}

impl Principal {
    pub fn is_shipper(&self) -> bool {
        self.role == Role::Shipper
    }

    pub fn is_carrier(&self) -> bool {
        self.role == Role::Carrier
    }
}

const PRINCIPAL_ID_HEADER: &str = "x-principal-id";
const PRINCIPAL_ROLE_HEADER: &str = "x-principal-role";

#[async_trait]
impl<B: Send> FromRequest<B> for Principal {
    type Rejection = Error;

    async fn from_request(req: &mut RequestParts<B>) -> Result<Self, Self::Rejection> {
        let headers = req.headers();

        let id = headers
            .get(PRINCIPAL_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value).ok())
            .ok_or(Error::Unauthorized("missing authenticated principal"))?;

        let role = match headers
            .get(PRINCIPAL_ROLE_HEADER)
            .and_then(|value| value.to_str().ok())
        {
            Some("shipper") => Role::Shipper,
            Some("carrier") => Role::Carrier,
            _ => Role::Other,
        };

        Ok(Self { id, role })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    #[test]
    fn extracts_principal_from_gateway_headers() {
        let id = Uuid::new_v4();
        let request = Request::builder()
            .header("x-principal-id", id.to_string())
            .header("x-principal-role", "carrier")
            .body(())
            .unwrap();
        let mut parts = RequestParts::new(request);

        let principal = tokio_test::block_on(Principal::from_request(&mut parts)).unwrap();

        assert_eq!(principal.id, id);
        assert!(principal.is_carrier());
        assert!(!principal.is_shipper());
    }

    #[test]
    fn missing_principal_is_unauthorized() {
        let request = Request::builder().body(()).unwrap();
        let mut parts = RequestParts::new(request);

        let err = tokio_test::block_on(Principal::from_request(&mut parts)).unwrap_err();
        assert_eq!(err.kind(), "unauthorized");
    }

    #[test]
    fn unknown_role_maps_to_other() {
        let request = Request::builder()
            .header("x-principal-id", Uuid::new_v4().to_string())
            .header("x-principal-role", "auditor")
            .body(())
            .unwrap();
        let mut parts = RequestParts::new(request);

        let principal = tokio_test::block_on(Principal::from_request(&mut parts)).unwrap();
        assert_eq!(principal.role, Role::Other);
    }
}
