use std::sync::OnceLock;

use k8s_openapi::api::core::v1::Secret;
use kube::{Api, Client};
use tokio::runtime::{Handle, RuntimeFlavor};

use super::manifest;
use super::provider::{KeyStore, KeyStoreError, SecretScope};

/// Key store reading `Secret` objects from the current cluster context.
///
/// Lookups are synchronous: each one parks the calling worker with
/// [`tokio::task::block_in_place`] and drives the request on the captured
/// runtime handle. The client is built from the ambient kubeconfig on first
/// use, so constructing the store never touches the cluster.
#[derive(Clone)]
pub struct ClusterKeyStore {
    handle: Handle,
    client: OnceLock<Client>,
}

impl std::fmt::Debug for ClusterKeyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterKeyStore")
            .field("connected", &self.client.get().is_some())
            .finish()
    }
}

impl ClusterKeyStore {
    /// Capture the current runtime. Requires a multi-threaded runtime.
    pub fn new() -> Result<Self, KeyStoreError> {
        let handle = Handle::try_current()
            .map_err(|e| KeyStoreError::ClusterUnavailable(format!("no async runtime: {e}")))?;
        if handle.runtime_flavor() != RuntimeFlavor::MultiThread {
            return Err(KeyStoreError::ClusterUnavailable(
                "cluster lookups need a multi-threaded runtime".to_string(),
            ));
        }
        Ok(Self {
            handle,
            client: OnceLock::new(),
        })
    }

    /// Use an already configured client
    pub fn with_client(client: Client) -> Result<Self, KeyStoreError> {
        let store = Self::new()?;
        let _ = store.client.set(client);
        Ok(store)
    }

    fn client(&self) -> Result<Client, KeyStoreError> {
        if let Some(client) = self.client.get() {
            return Ok(client.clone());
        }
        let client = self.block_on(Client::try_default())?;
        tracing::debug!("connected to cluster");
        Ok(self.client.get_or_init(|| client).clone())
    }

    fn block_on<F: std::future::Future>(&self, future: F) -> F::Output {
        tokio::task::block_in_place(|| self.handle.block_on(future))
    }

    fn fetch(&self, scope: &SecretScope) -> Result<Secret, KeyStoreError> {
        let SecretScope::Cluster { namespace, name } = scope else {
            return Err(KeyStoreError::UnsupportedScope {
                backend: "cluster",
                scope: scope.to_string(),
            });
        };

        let api: Api<Secret> = Api::namespaced(self.client()?, namespace);
        tracing::debug!(%namespace, %name, "fetching secret");
        self.block_on(api.get_opt(name))?
            .ok_or_else(|| KeyStoreError::not_found(scope, "secret"))
    }
}

impl KeyStore for ClusterKeyStore {
    fn private_key_material(&self, scope: &SecretScope) -> Result<Vec<u8>, KeyStoreError> {
        let secret = self.fetch(scope)?;
        manifest::private_key_material(&secret)
            .map(<[u8]>::to_vec)
            .ok_or_else(|| KeyStoreError::not_found(scope, "private key"))
    }

    fn public_key_material(&self, scope: &SecretScope) -> Result<Vec<u8>, KeyStoreError> {
        let secret = self.fetch(scope)?;
        manifest::public_key_material(&secret)
            .map(<[u8]>::to_vec)
            .ok_or_else(|| KeyStoreError::not_found(scope, "public key"))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_requires_runtime() {
        assert!(matches!(
            ClusterKeyStore::new(),
            Err(KeyStoreError::ClusterUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_rejects_current_thread_runtime() {
        assert!(matches!(
            ClusterKeyStore::new(),
            Err(KeyStoreError::ClusterUnavailable(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_rejects_local_scope() {
        let store = ClusterKeyStore::new().unwrap();
        let scope = SecretScope::Local("key.pem".into());
        assert!(matches!(
            store.private_key_material(&scope),
            Err(KeyStoreError::UnsupportedScope { .. })
        ));
    }
}
