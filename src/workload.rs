//! Workload controllers the hook knows how to mutate

use anyhow::Context as _;
use kube::api::ObjectMeta;
use std::{collections::BTreeMap, fmt};

pub const RELEASE_LABEL: &str = "release";

/// Resource kinds with a pod template the hook can patch
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString, strum::IntoStaticStr)]
pub enum WorkloadKind {
    Deployment,
    StatefulSet,
    ReplicaSet,
}

/// The fields all supported workloads share.
/// apiVersion and the rest of the spec are not looked at, so
/// `apps/v1beta1`/`apps/v1beta2` objects and objects missing fields
/// the hook does not need (selector, serviceName, pod spec) are accepted.
#[derive(serde::Deserialize, Debug)]
struct WorkloadProjection {
    metadata: Option<ObjectMeta>,
    spec: Option<WorkloadSpecProjection>,
}

#[derive(serde::Deserialize, Debug)]
struct WorkloadSpecProjection {
    template: Option<PodTemplateProjection>,
}

#[derive(serde::Deserialize, Debug)]
struct PodTemplateProjection {
    metadata: Option<ObjectMeta>,
}

impl WorkloadKind {
    /// Returns `None` for kinds this hook is not applicable to.
    pub fn from_kind(kind: &str) -> Option<Self> {
        kind.parse().ok()
    }

    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Decodes admitted object into descriptor.
    pub fn decode(self, object: &serde_json::Value) -> anyhow::Result<WorkloadDescriptor> {
        tracing::trace!(kind = self.name(), "decoding workload");
        let workload: WorkloadProjection =
            serde_json::from_value(object.clone()).context("could not unmarshal raw object")?;
        Ok(WorkloadDescriptor::new(workload))
    }
}

/// Parts of the workload the hook looks at
#[derive(Debug, Clone, Default)]
pub struct WorkloadDescriptor {
    pub name: String,
    pub labels: Option<BTreeMap<String, String>>,
    /// Annotations of the pod template, not of the workload itself
    pub pod_annotations: Option<BTreeMap<String, String>>,
}

impl WorkloadDescriptor {
    fn new(workload: WorkloadProjection) -> Self {
        let meta = workload.metadata.unwrap_or_default();
        WorkloadDescriptor {
            name: meta.name.unwrap_or_default(),
            labels: meta.labels,
            pod_annotations: workload
                .spec
                .and_then(|spec| spec.template)
                .and_then(|template| template.metadata)
                .and_then(|meta| meta.annotations),
        }
    }

    /// Value of the release label, if it is set to a non-empty string
    pub fn release(&self) -> Option<&str> {
        self.labels
            .as_ref()
            .and_then(|labels| labels.get(RELEASE_LABEL))
            .map(String::as_str)
            .filter(|release| !release.is_empty())
    }

    pub fn pod_annotation(&self, key: &str) -> Option<&str> {
        self.pod_annotations
            .as_ref()
            .and_then(|annotations| annotations.get(key))
            .map(String::as_str)
    }

    /// Computes the assignment table key of this workload.
    /// Returns `None` when the release label is missing.
    pub fn identity(&self, kind: WorkloadKind) -> Option<ResourceIdentity> {
        self.release()
            .map(|release| ResourceIdentity::new(release, kind, &self.name))
    }
}

/// Key of the assignment table: `{release}.{kind}.{name}`.
/// Only kind is lowercased; whatever fills the table must produce
/// exactly the same string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceIdentity(String);

impl ResourceIdentity {
    fn new(release: &str, kind: WorkloadKind, name: &str) -> Self {
        ResourceIdentity(format!(
            "{}.{}.{}",
            release,
            kind.name().to_lowercase(),
            name
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
