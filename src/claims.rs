//! Insurance claims endpoints

use crate::error::Result;
use crate::http::{ApiClient, ApiResponse};
use crate::resources::Resource;
use crate::types::{Claim, ClaimCreate, ClaimUpdate};

impl ApiClient {
    /// `GET /api/claims`
    pub async fn fetch_claims(&self) -> Result<Vec<Claim>> {
        self.get_json(Resource::Claims.path()).await
    }

    /// `POST /api/claims`
    pub async fn create_claim(&self, claim: &ClaimCreate) -> Result<Claim> {
        self.post_json(Resource::Claims.path(), claim).await
    }

    /// `PATCH /api/claims/{id}`; only the fields set in `update` change
    pub async fn update_claim(&self, id: i64, update: &ClaimUpdate) -> Result<Claim> {
        self.patch_json(&Resource::Claims.item_path(&id.to_string()), update)
            .await
    }

    /// `DELETE /api/claims/{id}`, returning the raw response
    pub async fn delete_claim(&self, id: i64) -> Result<ApiResponse> {
        self.delete(&Resource::Claims.item_path(&id.to_string())).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Pipeline;
    use crate::session::MemorySession;
    use crate::test_support::StubTransport;
    use crate::types::ClaimStatus;
    use reqwest::{Method, StatusCode};
    use serde_json::json;
    use std::sync::Arc;

    const CLAIM: &str = r#"{"id":7,"patient_id":12,"scheme":"NHIF","amount":1500.0,"description":null,"status":"pending","submitted_at":"2024-03-01T09:00:00","processed_at":null,"outcome":null}"#;

    fn client(transport: Arc<StubTransport>) -> ApiClient {
        ApiClient::from_parts(
            "http://hms.test",
            transport,
            Pipeline::new(),
            Arc::new(MemorySession::with_token("tok")),
        )
    }

    #[tokio::test]
    async fn test_fetch_claims() {
        let transport = Arc::new(StubTransport::new(|_| {
            Ok(ApiResponse::new(StatusCode::OK, format!("[{}]", CLAIM)))
        }));
        let claims = client(transport.clone()).fetch_claims().await.unwrap();

        assert_eq!(claims.len(), 1);
        assert_eq!(claims[0].scheme, "NHIF");
        assert_eq!(transport.requests()[0].method, Method::GET);
        assert_eq!(transport.urls(), vec!["/api/claims".to_string()]);
    }

    #[tokio::test]
    async fn test_create_posts_body() {
        let transport = Arc::new(StubTransport::ok(CLAIM));
        let created = client(transport.clone())
            .create_claim(&ClaimCreate {
                patient_id: 12,
                scheme: "NHIF".into(),
                amount: 1500.0,
                description: None,
            })
            .await
            .unwrap();

        assert_eq!(created.id, 7);
        let sent = transport.requests().remove(0);
        assert_eq!(sent.method, Method::POST);
        assert_eq!(
            sent.body,
            Some(json!({"patient_id": 12, "scheme": "NHIF", "amount": 1500.0}))
        );
    }

    #[tokio::test]
    async fn test_update_patches_only_given_fields() {
        let transport = Arc::new(StubTransport::ok(CLAIM));
        let update = ClaimUpdate {
            status: Some(ClaimStatus::Approved),
            outcome: Some("covered".into()),
            ..Default::default()
        };
        client(transport.clone()).update_claim(7, &update).await.unwrap();

        let sent = transport.requests().remove(0);
        assert_eq!(sent.method, Method::PATCH);
        assert_eq!(sent.url(""), "/api/claims/7");
        assert_eq!(sent.body, Some(json!({"status": "approved", "outcome": "covered"})));
    }

    #[tokio::test]
    async fn test_delete_returns_raw_response() {
        let transport = Arc::new(StubTransport::status(StatusCode::NO_CONTENT, ""));
        let response = client(transport.clone()).delete_claim(7).await.unwrap();

        assert_eq!(response.status, StatusCode::NO_CONTENT);
        assert!(response.body.is_empty());
        assert_eq!(transport.requests()[0].method, Method::DELETE);
    }

    #[tokio::test]
    async fn test_failed_update_surfaces_status() {
        let transport = Arc::new(StubTransport::status(StatusCode::NOT_FOUND, r#"{"detail":"Claim not found"}"#));
        let err = client(transport)
            .update_claim(99, &ClaimUpdate::default())
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(404));
    }
}
