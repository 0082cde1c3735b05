//! Error utilities

/// Describes error reason
#[non_exhaustive]
#[derive(Debug, PartialEq, Eq)]
pub enum ErrorClass {
    NotFound,
    Conflict,
    /// Catch-all variant. Since this enum is non-exhaustive,
    /// it should be handled with `_` pattern
    Unknown,
}

/// Tries to classify k8s error
pub fn classify(error_reason: &str) -> ErrorClass {
    match error_reason {
        "NotFound" => ErrorClass::NotFound,
        "Conflict" => ErrorClass::Conflict,
        _ => ErrorClass::Unknown,
    }
}

/// Tries to classify k8s error, wrapped in kube Error
pub fn classify_kube(error: &kube::Error) -> ErrorClass {
    match error {
        kube::Error::Api(api) => classify(&api.reason),
        _ => ErrorClass::Unknown,
    }
}

/// Creates an error that looks like one returned by the apiserver.
pub(crate) fn api_error(reason: &str, code: u16, message: String) -> kube::Error {
    kube::Error::Api(kube::error::ErrorResponse {
        status: "Failure".to_string(),
        message,
        reason: reason.to_string(),
        code,
    })
}

pub(crate) fn not_found(kind: &str, namespace: &str, name: &str) -> kube::Error {
    api_error(
        "NotFound",
        404,
        format!("{} \"{}\" not found in namespace \"{}\"", kind, name, namespace),
    )
}

pub(crate) fn conflict(kind: &str, name: &str) -> kube::Error {
    api_error(
        "Conflict",
        409,
        format!(
            "Operation cannot be fulfilled on {} \"{}\": the object has been modified; \
             please apply your changes to the latest version and try again",
            kind, name
        ),
    )
}
