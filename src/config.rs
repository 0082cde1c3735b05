//! Hook configuration

use clap::Args;

pub const DEFAULT_ANNOTATION_KEY: &str = "admission.banzaicloud.com";
pub const DEFAULT_RESOURCE_GROUP: &str = "app.banzaicloud.io/odPercentage";
pub const DEFAULT_RESOURCE_VERSION: &str = "v1beta1";
pub const DEFAULT_RESOURCE_NAME: &str = "spotscheduling";
pub const DEFAULT_CONFIGMAP_NAMESPACE: &str = "pipeline-system";
pub const DEFAULT_CONFIGMAP_NAME: &str = "spot-deploy-config";
pub const DEFAULT_SCHEDULER_NAME: &str = "spot-scheduler";

/// Parameters of the spot admission hook.
/// Every value can be given as a flag or as an environment variable.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct HookConfig {
    /// Pod template annotation that carries the on-demand percentage
    #[clap(long = "spot-annotation-key", env = "SPOT_ANNOTATION_KEY", default_value = DEFAULT_ANNOTATION_KEY)]
    pub annotation_key: String,
    /// API group of the custom resource this hook is registered for
    #[clap(long = "spot-api-resource-group", env = "SPOT_API_RESOURCE_GROUP", default_value = DEFAULT_RESOURCE_GROUP)]
    pub resource_group: String,
    /// API version of the custom resource
    #[clap(long = "spot-api-resource-version", env = "SPOT_API_RESOURCE_VERSION", default_value = DEFAULT_RESOURCE_VERSION)]
    pub resource_version: String,
    /// Singular name of the custom resource
    #[clap(long = "spot-api-resource-name", env = "SPOT_API_RESOURCE_NAME", default_value = DEFAULT_RESOURCE_NAME)]
    pub resource_name: String,
    /// Namespace of the assignment ConfigMap
    #[clap(long = "spot-configmap-namespace", env = "SPOT_CONFIGMAP_NAMESPACE", default_value = DEFAULT_CONFIGMAP_NAMESPACE)]
    pub configmap_namespace: String,
    /// Name of the assignment ConfigMap
    #[clap(long = "spot-configmap-name", env = "SPOT_CONFIGMAP_NAME", default_value = DEFAULT_CONFIGMAP_NAME)]
    pub configmap_name: String,
    /// Scheduler that patched pod templates are handed to
    #[clap(long = "spot-scheduler-name", env = "SPOT_SCHEDULER_NAME", default_value = DEFAULT_SCHEDULER_NAME)]
    pub scheduler_name: String,
}

impl Default for HookConfig {
    fn default() -> Self {
        HookConfig {
            annotation_key: DEFAULT_ANNOTATION_KEY.to_string(),
            resource_group: DEFAULT_RESOURCE_GROUP.to_string(),
            resource_version: DEFAULT_RESOURCE_VERSION.to_string(),
            resource_name: DEFAULT_RESOURCE_NAME.to_string(),
            configmap_namespace: DEFAULT_CONFIGMAP_NAMESPACE.to_string(),
            configmap_name: DEFAULT_CONFIGMAP_NAME.to_string(),
            scheduler_name: DEFAULT_SCHEDULER_NAME.to_string(),
        }
    }
}

impl HookConfig {
    fn fields(&self) -> [(&'static str, &str); 7] {
        [
            ("spot_annotation_key", &self.annotation_key),
            ("spot_api_resource_group", &self.resource_group),
            ("spot_api_resource_version", &self.resource_version),
            ("spot_api_resource_name", &self.resource_name),
            ("spot_configmap_namespace", &self.configmap_namespace),
            ("spot_configmap_name", &self.configmap_name),
            ("spot_scheduler_name", &self.scheduler_name),
        ]
    }

    /// Checks that no parameter is empty.
    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, value) in self.fields().iter() {
            if value.is_empty() {
                anyhow::bail!("configuration parameter {} must not be empty", name);
            }
        }
        Ok(())
    }
}
