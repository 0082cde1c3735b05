//! JSON patch sent back for matched workloads

use json_patch::{AddOperation, Patch, PatchOperation};
use std::collections::BTreeMap;

pub const POD_ANNOTATIONS_PATH: &str = "/spec/template/metadata/annotations";
pub const SCHEDULER_NAME_PATH: &str = "/spec/template/spec/schedulerName";

/// Builds the patch for a workload that has an assignment.
///
/// `existing_annotation` is the current value of the spot annotation on
/// the pod template. When it is set, the annotation is left as is.
/// Scheduler name is always set.
pub fn build(
    annotation_key: &str,
    percentage: &str,
    existing_annotation: Option<&str>,
    scheduler_name: &str,
) -> Patch {
    let mut ops = Vec::with_capacity(2);
    match existing_annotation {
        None => {
            let mut annotations = BTreeMap::new();
            annotations.insert(annotation_key.to_string(), percentage.to_string());
            ops.push(PatchOperation::Add(AddOperation {
                path: POD_ANNOTATIONS_PATH.to_string(),
                value: serde_json::json!(annotations),
            }));
        }
        Some(current) => {
            tracing::debug!(
                annotation = annotation_key,
                value = current,
                "annotation is already present"
            );
        }
    }
    ops.push(PatchOperation::Add(AddOperation {
        path: SCHEDULER_NAME_PATH.to_string(),
        value: serde_json::Value::String(scheduler_name.to_string()),
    }));
    Patch(ops)
}
