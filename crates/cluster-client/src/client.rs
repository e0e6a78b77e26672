//! Cluster connection and resource resolution.
//!
//! `ClusterClient` is built once per run from the ambient kubeconfig (or the
//! in-cluster service account) and turns a [`ResourceRef`] into a
//! [`ResourceHandle`] via API discovery.

use crate::error::ClusterError;
use crate::resource_ref::ResourceRef;
use crate::watch::{self, EventStream};
use crate::watcher_trait::ResourceWatcher;
use futures::{StreamExt, future};
use kube::api::{Api, ApiResource, DynamicObject, WatchParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::discovery::{ApiCapabilities, Discovery, Scope};
use kube::{Client, Config};
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info};

/// Resource version to start watching from; `0` replays existing objects
/// as `ADDED` events before streaming changes.
const WATCH_FROM_VERSION: &str = "0";

/// Where and as whom to connect.
#[derive(Debug, Clone, Default)]
pub struct ConnectionOptions {
    pub kubeconfig: Option<PathBuf>,
    pub context: Option<String>,
    pub cluster: Option<String>,
    pub user: Option<String>,
    /// Overrides the namespace of the selected context
    pub namespace: Option<String>,
}

impl ConnectionOptions {
    fn kubeconfig_options(&self) -> KubeConfigOptions {
        KubeConfigOptions {
            context: self.context.clone(),
            cluster: self.cluster.clone(),
            user: self.user.clone(),
        }
    }

    fn selects_kubeconfig_entries(&self) -> bool {
        self.context.is_some() || self.cluster.is_some() || self.user.is_some()
    }
}

/// Connected cluster client.
#[derive(Clone)]
pub struct ClusterClient {
    client: Client,
    namespace: String,
}

impl ClusterClient {
    /// Loads connection configuration and creates the client.
    pub async fn connect(options: &ConnectionOptions) -> Result<Self, ClusterError> {
        let config = load_config(options).await?;
        let namespace = options
            .namespace
            .clone()
            .unwrap_or_else(|| config.default_namespace.clone());

        info!("Connecting to cluster at {}", config.cluster_url);
        let client = Client::try_from(config).map_err(ClusterError::Connection)?;

        Ok(Self { client, namespace })
    }

    /// Namespace used for namespaced resources.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Resolves a resource reference against the cluster's discovery data.
    ///
    /// Cluster-scoped resources ignore `namespace`.
    pub async fn resolve(
        &self,
        resource_ref: &ResourceRef,
        namespace: &str,
    ) -> Result<ResourceHandle, ClusterError> {
        let mut discovery = Discovery::new(self.client.clone());
        if !resource_ref.group.is_empty() {
            discovery = discovery.filter(&[resource_ref.group.as_str()]);
        }
        let discovery = discovery.run().await.map_err(ClusterError::Discovery)?;

        let candidates = discovery.groups_alphabetical().into_iter().flat_map(|group| {
            if resource_ref.version.is_empty() {
                group.recommended_resources()
            } else {
                group.versioned_resources(&resource_ref.version)
            }
        });

        let (resource, capabilities) = select_resource(candidates, &resource_ref.kind)
            .ok_or_else(|| {
                ClusterError::Mapping(format!("no matches for resource {resource_ref}"))
            })?;

        debug!(
            "Resolved {} to {}/{} ({:?})",
            resource_ref, resource.api_version, resource.plural, capabilities.scope
        );

        let api = match capabilities.scope {
            Scope::Cluster => Api::all_with(self.client.clone(), &resource),
            Scope::Namespaced => Api::namespaced_with(self.client.clone(), namespace, &resource),
        };

        Ok(ResourceHandle {
            api,
            resource,
            scope: capabilities.scope,
        })
    }
}

async fn load_config(options: &ConnectionOptions) -> Result<Config, ClusterError> {
    let kube_options = options.kubeconfig_options();

    if let Some(path) = &options.kubeconfig {
        let kubeconfig = Kubeconfig::read_from(path).map_err(|e| {
            ClusterError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        return Config::from_custom_kubeconfig(kubeconfig, &kube_options)
            .await
            .map_err(|e| ClusterError::Config(e.to_string()));
    }

    if options.selects_kubeconfig_entries() {
        return Config::from_kubeconfig(&kube_options)
            .await
            .map_err(|e| ClusterError::Config(e.to_string()));
    }

    Config::infer()
        .await
        .map_err(|e| ClusterError::Config(e.to_string()))
}

/// Picks the first candidate whose kind or plural name matches `kind`,
/// ignoring case.
///
/// Candidates arrive with the core group first, then other groups in
/// alphabetical order, so the core group wins ties.
pub fn select_resource(
    candidates: impl IntoIterator<Item = (ApiResource, ApiCapabilities)>,
    kind: &str,
) -> Option<(ApiResource, ApiCapabilities)> {
    candidates.into_iter().find(|(resource, _)| {
        resource.kind.eq_ignore_ascii_case(kind) || resource.plural.eq_ignore_ascii_case(kind)
    })
}

/// A resolved resource endpoint that can be watched.
#[derive(Clone)]
pub struct ResourceHandle {
    api: Api<DynamicObject>,
    resource: ApiResource,
    scope: Scope,
}

impl ResourceHandle {
    /// The discovered resource type.
    #[must_use]
    pub fn resource(&self) -> &ApiResource {
        &self.resource
    }

    /// True when the resource lives outside namespaces.
    #[must_use]
    pub fn is_cluster_scoped(&self) -> bool {
        matches!(self.scope, Scope::Cluster)
    }
}

impl fmt::Debug for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceHandle")
            .field("resource", &self.resource)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl ResourceWatcher for ResourceHandle {
    async fn watch(&self, name: Option<&str>) -> Result<EventStream, ClusterError> {
        let params = watch_params(name);
        let stream = self
            .api
            .watch(&params, WATCH_FROM_VERSION)
            .await
            .map_err(ClusterError::WatchEstablish)?;

        info!("Watching {}", self.resource.plural);

        Ok(stream
            .filter_map(|item| future::ready(watch::from_raw(item)))
            .boxed())
    }
}

fn watch_params(name: Option<&str>) -> WatchParams {
    match name {
        Some(name) => WatchParams::default().fields(&format!("metadata.name={name}")),
        None => WatchParams::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::api::GroupVersionKind;

    fn candidate(
        group: &str,
        version: &str,
        kind: &str,
        scope: Scope,
    ) -> (ApiResource, ApiCapabilities) {
        let resource = ApiResource::from_gvk(&GroupVersionKind::gvk(group, version, kind));
        let capabilities = ApiCapabilities {
            scope,
            subresources: vec![],
            operations: vec!["watch".to_string(), "list".to_string()],
        };
        (resource, capabilities)
    }

    fn discovered() -> Vec<(ApiResource, ApiCapabilities)> {
        vec![
            candidate("", "v1", "Namespace", Scope::Cluster),
            candidate("", "v1", "Pod", Scope::Namespaced),
            candidate("", "v1", "Event", Scope::Namespaced),
            candidate("apps", "v1", "Deployment", Scope::Namespaced),
            candidate("events.k8s.io", "v1", "Event", Scope::Namespaced),
        ]
    }

    #[test]
    fn test_select_resource_by_kind_ignores_case() {
        let (resource, caps) = select_resource(discovered(), "pod").unwrap();
        assert_eq!(resource.kind, "Pod");
        assert!(matches!(caps.scope, Scope::Namespaced));
    }

    #[test]
    fn test_select_resource_by_plural() {
        let (resource, _) = select_resource(discovered(), "deployments").unwrap();
        assert_eq!(resource.api_version, "apps/v1");
    }

    #[test]
    fn test_select_resource_prefers_first_group() {
        let (resource, _) = select_resource(discovered(), "event").unwrap();
        assert_eq!(resource.group, "");
    }

    #[test]
    fn test_select_resource_cluster_scope() {
        let (_, caps) = select_resource(discovered(), "Namespace").unwrap();
        assert!(matches!(caps.scope, Scope::Cluster));
    }

    #[test]
    fn test_select_resource_unknown_kind() {
        assert!(select_resource(discovered(), "widget").is_none());
    }

    #[test]
    fn test_watch_params_single_object() {
        let params = watch_params(Some("my-pod"));
        assert_eq!(params.field_selector.as_deref(), Some("metadata.name=my-pod"));
        assert!(watch_params(None).field_selector.is_none());
    }

    #[test]
    fn test_connection_options_selection() {
        let mut options = ConnectionOptions::default();
        assert!(!options.selects_kubeconfig_entries());
        options.context = Some("staging".to_string());
        assert!(options.selects_kubeconfig_entries());
        assert_eq!(options.kubeconfig_options().context.as_deref(), Some("staging"));
    }
}
