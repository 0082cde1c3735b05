//! Low-level types

#[derive(serde::Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Status {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Status {
    pub const SUCCESS: &'static str = "Success";

    /// Successful status carrying (possibly empty) message
    pub fn success(message: &str) -> Self {
        Status {
            status: Some(Self::SUCCESS.to_string()),
            code: None,
            message: Some(message.to_string()),
        }
    }
}

macro_rules! define_const_string {
    ($string:literal, $name: ident) => {
        #[derive(Debug, Copy, Clone)]
        pub struct $name;

        impl serde::ser::Serialize for $name {
            fn serialize<S: serde::ser::Serializer>(
                &self,
                serializer: S,
            ) -> Result<S::Ok, S::Error> {
                $string.serialize(serializer)
            }
        }

        impl<'de> serde::de::Deserialize<'de> for $name {
            fn deserialize<D: serde::de::Deserializer<'de>>(
                deserializer: D,
            ) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                if s != $string {
                    return Err(<D::Error as serde::de::Error>::custom(format_args!(
                        "expected string '{}', got '{}'",
                        $string, s
                    )));
                }
                Ok(Self)
            }
        }
    };
}

define_const_string!("AdmissionReview", Kind);

/// AdmissionReview versions served. Response uses version of the request.
#[derive(serde::Serialize, serde::Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
pub enum ApiVersion {
    #[serde(rename = "admission.k8s.io/v1")]
    V1,
    #[serde(rename = "admission.k8s.io/v1beta1")]
    V1Beta1,
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct AdmissionReviewRequest {
    #[serde(rename = "apiVersion")]
    pub api_version: ApiVersion,
    pub kind: Kind,
    pub request: Request,
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupVersionKind {
    #[serde(default)]
    pub group: String,
    pub version: String,
    pub kind: String,
}

#[derive(serde::Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub uid: String,
    pub kind: GroupVersionKind,
    /// Admitted object, as it was sent by the apiserver
    #[serde(default)]
    pub object: serde_json::Value,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub operation: Option<String>,
}

#[derive(serde::Serialize, Debug, Clone)]
pub struct AdmissionReviewResponse {
    #[serde(rename = "apiVersion")]
    pub api_version: ApiVersion,
    pub kind: Kind,
    pub response: Response,
}

#[derive(serde::Serialize, Debug, Clone)]
pub struct Response {
    pub uid: String,
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(flatten)]
    pub patch: Option<Patch>,
}

#[derive(serde::Serialize, Debug, Clone)]
pub struct Patch {
    #[serde(rename = "patchType")]
    pub patch_type: PatchType,
    /// base64-encoded JSON patch
    pub patch: String,
}

#[derive(serde::Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchType {
    #[serde(rename = "JSONPatch")]
    JsonPatch,
}

/// Resource this hook's configuration is keyed by
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupVersionResource {
    pub group: String,
    pub version: String,
    /// Plural resource name
    pub resource: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_both_review_versions() {
        for version in &["admission.k8s.io/v1", "admission.k8s.io/v1beta1"] {
            let review: AdmissionReviewRequest = serde_json::from_value(json!({
                "apiVersion": version,
                "kind": "AdmissionReview",
                "request": {
                    "uid": "abc",
                    "kind": { "group": "apps", "version": "v1", "kind": "Deployment" },
                    "object": {}
                }
            }))
            .unwrap();
            assert_eq!(review.request.kind.kind, "Deployment");
            assert!(review.request.namespace.is_none());
        }
    }

    #[test]
    fn rejects_other_envelopes() {
        let res = serde_json::from_value::<AdmissionReviewRequest>(json!({
            "apiVersion": "admission.k8s.io/v1",
            "kind": "TokenReview",
            "request": { "uid": "abc", "kind": { "version": "v1", "kind": "Pod" } }
        }));
        assert!(res.is_err());
    }

    #[test]
    fn patch_is_flattened_into_response() {
        let response = Response {
            uid: "abc".to_string(),
            allowed: true,
            status: Some(Status::success("")),
            patch: Some(Patch {
                patch_type: PatchType::JsonPatch,
                patch: "W10=".to_string(),
            }),
        };
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "uid": "abc",
                "allowed": true,
                "status": { "status": "Success", "message": "" },
                "patchType": "JSONPatch",
                "patch": "W10="
            })
        );
    }
}
