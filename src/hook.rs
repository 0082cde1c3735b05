//! Spot admission hook.
//!
//! Workloads labeled with a release get their pod template annotated with
//! the on-demand percentage found in the assignment table, and are handed
//! to the spot scheduler. The table entry is removed once the patch is
//! ready. Requests are never denied: anything unexpected results in an
//! unpatched, allowed response explaining why.

use crate::{
    assignment::{self, AssignmentStore, Lookup, TableRef},
    config::HookConfig,
    patch,
    webhook::{
        apis::{GroupVersionResource, Request, Response},
        server::Admit,
        Decision, EncodedDecision,
    },
    workload::{ResourceIdentity, WorkloadKind},
};
use async_trait::async_trait;

/// Admission decision engine
pub struct SpotHook<S> {
    store: S,
    config: HookConfig,
    table: TableRef,
}

impl<S: AssignmentStore> SpotHook<S> {
    pub fn new(store: S, config: HookConfig) -> Self {
        tracing::info!(
            spot_annotation_key = config.annotation_key.as_str(),
            spot_api_resource_group = config.resource_group.as_str(),
            spot_api_resource_version = config.resource_version.as_str(),
            spot_api_resource_name = config.resource_name.as_str(),
            spot_configmap_namespace = config.configmap_namespace.as_str(),
            spot_configmap_name = config.configmap_name.as_str(),
            spot_scheduler_name = config.scheduler_name.as_str(),
            "admission hook parameters"
        );
        let table = TableRef {
            namespace: config.configmap_namespace.clone(),
            name: config.configmap_name.clone(),
        };
        SpotHook {
            store,
            config,
            table,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Resource (plural) and singular name the hook is registered for
    pub fn mutating_resource(&self) -> (GroupVersionResource, String) {
        (
            GroupVersionResource {
                group: self.config.resource_group.clone(),
                version: self.config.resource_version.clone(),
                resource: format!("{}s", self.config.resource_name),
            },
            self.config.resource_name.clone(),
        )
    }

    /// Decides on the request, without side effects.
    /// Returns identity of the workload if it was computed.
    async fn decide(&self, req: &Request) -> (Decision, Option<ResourceIdentity>) {
        let kind = match WorkloadKind::from_kind(&req.kind.kind) {
            Some(kind) => kind,
            None => {
                let reason = format!(
                    "resource type {} is not applicable for this webhook",
                    req.kind.kind
                );
                return (Decision::allow_unchanged(&reason), None);
            }
        };
        tracing::debug!(kind = kind.name(), "found workload in request");

        let workload = match kind.decode(&req.object) {
            Ok(w) => w,
            Err(err) => return (Decision::allow_after_error(&err), None),
        };

        let identity = match workload.identity(kind) {
            Some(identity) => identity,
            None => return (Decision::allow_unchanged("no release label found"), None),
        };

        let percentage = match assignment::lookup(&self.store, &self.table, &identity).await {
            Ok(Lookup::Found(value)) => value,
            Ok(Lookup::Empty) => {
                return (
                    Decision::allow_unchanged("there's no data in spot deploy ConfigMap"),
                    Some(identity),
                )
            }
            Ok(Lookup::Missing) => {
                return (
                    Decision::allow_unchanged("resource not found in spot deploy ConfigMap"),
                    Some(identity),
                )
            }
            Err(err) => return (Decision::allow_after_error(&err), Some(identity)),
        };

        tracing::debug!(resource = %identity, "creating patches");
        let patch = patch::build(
            &self.config.annotation_key,
            &percentage,
            workload.pod_annotation(&self.config.annotation_key),
            &self.config.scheduler_name,
        );
        (Decision::allow_and_patch(patch), Some(identity))
    }

    /// Best-effort removal of the consumed entry.
    /// Failures are logged only.
    async fn cleanup(&self, identity: &ResourceIdentity) {
        if let Err(err) = assignment::consume(&self.store, &self.table, identity).await {
            tracing::warn!(resource = %identity, "failed to clean up spot deploy ConfigMap: {:#}", err);
        }
    }
}

fn log_unchanged(identity: Option<&ResourceIdentity>, reason: &str) {
    let resource = identity.map(ResourceIdentity::as_str).unwrap_or("");
    tracing::warn!(resource = resource, "resource won't be mutated: {}", reason);
}

#[async_trait]
impl<S: AssignmentStore> Admit for SpotHook<S> {
    #[tracing::instrument(skip(self, request), fields(uid = request.uid.as_str(), kind = request.kind.kind.as_str()))]
    async fn admit(&self, request: &Request) -> Response {
        tracing::debug!(
            name = ?request.name,
            namespace = ?request.namespace,
            operation = ?request.operation,
            "admission request"
        );
        let (decision, identity) = self.decide(request).await;
        if !decision.is_patched() {
            log_unchanged(identity.as_ref(), decision.message());
        }
        let encoded = match decision.encode() {
            Ok(encoded) => encoded,
            Err(err) => {
                let reason = format!("{:#}", err);
                log_unchanged(identity.as_ref(), &reason);
                EncodedDecision::unchanged(reason)
            }
        };
        if encoded.is_patched() {
            if let Some(identity) = &identity {
                self.cleanup(identity).await;
                tracing::debug!(resource = %identity, "sending patched response");
            }
        }
        encoded.finish(request)
    }
}
