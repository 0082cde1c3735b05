use crate::webhook::apis::{AdmissionReviewRequest, AdmissionReviewResponse, Kind, Request, Response};
use anyhow::Context as _;
use async_trait::async_trait;

/// Type that is able to mutate admission requests.
#[async_trait]
pub trait Admit: Send + Sync {
    /// Decides on a single request. Always allows it; mutation, if any,
    /// is returned as a patch.
    async fn admit(&self, request: &Request) -> Response;
}

/// AdmissionReview workflow around a single hook.
/// Transport (TLS, HTTP) is left to the caller.
pub struct Server<H> {
    hook: H,
}

impl<H: Admit> Server<H> {
    pub fn new(hook: H) -> Self {
        Server { hook }
    }

    pub fn hook(&self) -> &H {
        &self.hook
    }

    /// Entrypoint for mutation requests
    pub async fn review(&self, review: &AdmissionReviewRequest) -> AdmissionReviewResponse {
        let response = self.hook.admit(&review.request).await;
        AdmissionReviewResponse {
            api_version: review.api_version,
            kind: Kind,
            response,
        }
    }

    /// Same as `review`, operating on serialized AdmissionReview.
    /// # Errors
    /// Fails if input is not an AdmissionReview. Such requests never reach
    /// the hook.
    pub async fn review_json(&self, body: &[u8]) -> anyhow::Result<Vec<u8>> {
        let review: AdmissionReviewRequest =
            serde_json::from_slice(body).context("Input is not an AdmissionReview")?;
        let response = self.review(&review).await;
        serde_json::to_vec(&response).context("failed to serialize AdmissionReview")
    }
}
