use anyhow::Context as _;
use apis::{Request, Response, Status};

pub mod apis;
pub mod server;

enum Choice {
    /// Object is admitted as is. Message explains why it was not mutated.
    Unchanged { reason: String },
    /// Object is admitted with a patch applied
    Patched { patch: json_patch::Patch },
}

/// High-level builder for webhook decisions.
///
/// There is no way to deny a request: the hook may only enrich
/// workloads, never block them.
pub struct Decision(Choice);

impl Decision {
    pub fn allow_unchanged(reason: &str) -> Self {
        Decision(Choice::Unchanged {
            reason: reason.to_string(),
        })
    }

    /// Creates a decision from the error which prevented mutation.
    /// Error chain is rendered as `context: cause`.
    pub fn allow_after_error(err: &anyhow::Error) -> Self {
        Decision::allow_unchanged(&format!("{:#}", err))
    }

    pub fn allow_and_patch(patch: json_patch::Patch) -> Self {
        Decision(Choice::Patched { patch })
    }

    pub fn is_patched(&self) -> bool {
        matches!(self.0, Choice::Patched { .. })
    }

    /// Message shown to the user, empty when patched
    pub fn message(&self) -> &str {
        match &self.0 {
            Choice::Unchanged { reason } => reason,
            Choice::Patched { .. } => "",
        }
    }

    /// Encodes patch, as it is sent on the wire.
    /// # Errors
    /// Fails if the patch can not be serialized.
    pub fn encode(self) -> anyhow::Result<EncodedDecision> {
        let patch = match self.0 {
            Choice::Unchanged { reason } => return Ok(EncodedDecision::unchanged(reason)),
            Choice::Patched { patch } => patch,
        };
        let patch = serde_json::to_vec(&patch).context("failed to marshal patch bytes")?;
        Ok(EncodedDecision {
            reason: String::new(),
            patch: Some(apis::Patch {
                patch_type: apis::PatchType::JsonPatch,
                patch: base64::encode(&patch),
            }),
        })
    }
}

/// Decision with its patch already serialized
pub struct EncodedDecision {
    reason: String,
    patch: Option<apis::Patch>,
}

impl EncodedDecision {
    pub fn unchanged(reason: String) -> Self {
        EncodedDecision {
            reason,
            patch: None,
        }
    }

    pub fn is_patched(&self) -> bool {
        self.patch.is_some()
    }

    pub fn finish(self, req: &Request) -> Response {
        Response {
            allowed: true,
            uid: req.uid.clone(),
            status: Some(Status::success(&self.reason)),
            patch: self.patch,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request() -> Request {
        serde_json::from_value(json!({
            "uid": "705ab4f5-6393-11e8-b7cc-42010a800002",
            "kind": { "group": "apps", "version": "v1", "kind": "Deployment" },
            "object": {}
        }))
        .unwrap()
    }

    #[test]
    fn unchanged_carries_message() {
        let response = Decision::allow_unchanged("no release label found")
            .encode()
            .unwrap()
            .finish(&request());
        assert!(response.allowed);
        assert_eq!(response.uid, "705ab4f5-6393-11e8-b7cc-42010a800002");
        assert!(response.patch.is_none());
        assert_eq!(
            response.status.unwrap().message.as_deref(),
            Some("no release label found")
        );
    }

    #[test]
    fn error_chain_becomes_message() {
        let err = anyhow::anyhow!("boom").context("could not unmarshal raw object");
        let decision = Decision::allow_after_error(&err);
        assert!(!decision.is_patched());
        assert_eq!(decision.message(), "could not unmarshal raw object: boom");
    }

    #[test]
    fn patch_is_base64_json() {
        let patch: json_patch::Patch = serde_json::from_value(json!([
            { "op": "add", "path": "/spec/template/spec/schedulerName", "value": "s" }
        ]))
        .unwrap();
        let response = Decision::allow_and_patch(patch.clone())
            .encode()
            .unwrap()
            .finish(&request());
        let encoded = response.patch.unwrap();
        assert_eq!(encoded.patch_type, apis::PatchType::JsonPatch);
        let decoded: json_patch::Patch =
            serde_json::from_slice(&base64::decode(&encoded.patch).unwrap()).unwrap();
        assert_eq!(decoded, patch);
        assert_eq!(response.status.unwrap().message.as_deref(), Some(""));
    }
}
