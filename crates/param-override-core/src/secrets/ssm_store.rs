//! AWS Systems Manager Parameter Store backend
//!
//! The SDK client is async; the override pass is a blocking startup step.
//! Lookups are driven to completion by [`block_on`], which reuses the caller's
//! multi-thread runtime when there is one and a shared background runtime
//! otherwise. The client is created on the first lookup, never at
//! construction, so applications that do not reference the marker need
//! neither AWS credentials nor network access.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_ssm::error::DisplayErrorContext;
use once_cell::sync::OnceCell;
use tokio::runtime::{Builder as RuntimeBuilder, Handle, Runtime, RuntimeFlavor};

use crate::env::{PlaceholderError, StandardEnvironment};
use super::traits::{ParameterStore, SecretStoreError, SecretStoreResult};

/// Marker for values resolved from SSM, e.g. `{ssmParameter}/db/user`
pub const SSM_PREFIX: &str = "{ssmParameter}";

/// Configuration property selecting the AWS region
pub const REGION_PROPERTY: &str = "param-override.ssm.region";

/// Configuration property overriding the SSM endpoint (LocalStack, VPC endpoints)
pub const ENDPOINT_PROPERTY: &str = "param-override.ssm.endpoint-url";

/// Process variable fallback for [`REGION_PROPERTY`]
pub const REGION_ENV: &str = "PARAM_OVERRIDE_SSM_REGION";

/// Process variable fallback for [`ENDPOINT_PROPERTY`]
pub const ENDPOINT_ENV: &str = "PARAM_OVERRIDE_SSM_ENDPOINT";

/// Connection settings for the SSM client
///
/// Anything left unset falls through to the AWS default provider chain
/// (`AWS_REGION`, profiles, instance metadata, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SsmSettings {
    pub region: Option<String>,
    pub endpoint_url: Option<String>,
}

impl SsmSettings {
    /// Read settings from `PARAM_OVERRIDE_SSM_REGION` / `PARAM_OVERRIDE_SSM_ENDPOINT`
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings from variables served by `lookup`
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            region: non_empty(lookup(REGION_ENV)),
            endpoint_url: non_empty(lookup(ENDPOINT_ENV)),
        }
    }

    /// Read settings from configuration properties, falling back to the
    /// process variables for anything not configured
    ///
    /// Placeholders in the property values are resolved, so
    /// `param-override.ssm.region=${AWS_REGION}` works.
    pub fn from_environment(env: &StandardEnvironment) -> Result<Self, PlaceholderError> {
        let fallback = Self::from_env();
        Ok(Self {
            region: non_empty(env.get_string(REGION_PROPERTY)?).or(fallback.region),
            endpoint_url: non_empty(env.get_string(ENDPOINT_PROPERTY)?).or(fallback.endpoint_url),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Single-parameter fetch against SSM
///
/// Implemented by [`SdkParameterClient`] for AWS and by fakes in tests.
#[async_trait]
pub trait ParameterClient: Send + Sync {
    /// Fetch one parameter value by its full path
    async fn get_parameter(&self, name: &str, with_decryption: bool) -> SecretStoreResult<String>;
}

/// [`ParameterClient`] backed by `aws-sdk-ssm`
#[derive(Debug, Clone)]
pub struct SdkParameterClient {
    client: aws_sdk_ssm::Client,
}

impl SdkParameterClient {
    /// Build a client from the default AWS configuration plus `settings`
    pub async fn connect(settings: &SsmSettings) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = &settings.region {
            loader = loader.region(aws_sdk_ssm::config::Region::new(region.clone()));
        }
        let shared_config = loader.load().await;

        let mut builder = aws_sdk_ssm::config::Builder::from(&shared_config);
        if let Some(endpoint) = settings.endpoint_url.as_deref() {
            builder = builder.endpoint_url(endpoint);
        }

        Self {
            client: aws_sdk_ssm::Client::from_conf(builder.build()),
        }
    }

    pub fn from_client(client: aws_sdk_ssm::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ParameterClient for SdkParameterClient {
    async fn get_parameter(&self, name: &str, with_decryption: bool) -> SecretStoreResult<String> {
        let response = self
            .client
            .get_parameter()
            .name(name)
            .with_decryption(with_decryption)
            .send()
            .await;

        match response {
            Ok(output) => output
                .parameter()
                .and_then(|p| p.value())
                .map(str::to_string)
                .ok_or_else(|| SecretStoreError::NotFound(name.to_string())),
            Err(err) => {
                let missing = err
                    .as_service_error()
                    .is_some_and(|e| e.is_parameter_not_found() || e.is_parameter_version_not_found());
                if missing {
                    Err(SecretStoreError::NotFound(name.to_string()))
                } else {
                    Err(SecretStoreError::RemoteUnavailable(format!(
                        "GetParameter failed for '{}': {}",
                        name,
                        DisplayErrorContext(&err)
                    )))
                }
            }
        }
    }
}

/// Factory invoked once, on the first lookup, to create the client
///
/// Async setup inside the factory can be driven with [`block_on`].
pub type ClientFactory =
    Box<dyn Fn(&SsmSettings) -> SecretStoreResult<Arc<dyn ParameterClient>> + Send + Sync>;

static BACKGROUND_RUNTIME: OnceCell<Runtime> = OnceCell::new();

fn background_runtime() -> SecretStoreResult<&'static Runtime> {
    BACKGROUND_RUNTIME.get_or_try_init(|| {
        RuntimeBuilder::new_multi_thread()
            .worker_threads(1)
            .thread_name("param-override-ssm")
            .enable_all()
            .build()
            .map_err(|e| SecretStoreError::RemoteUnavailable(format!("runtime init: {}", e)))
    })
}

/// Run a future to completion from synchronous code without nesting runtimes
///
/// - Inside a multi-thread runtime the worker is handed over with
///   `block_in_place` and the future runs on the caller's runtime.
/// - Inside a current-thread runtime the thread cannot be handed over, so the
///   future runs on the background runtime from a scoped helper thread.
/// - Outside any runtime the future runs on the background runtime directly.
///
/// The background runtime is process-wide and never dropped.
pub fn block_on<F>(future: F) -> SecretStoreResult<F::Output>
where
    F: Future + Send,
    F::Output: Send,
{
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            Ok(tokio::task::block_in_place(|| handle.block_on(future)))
        }
        Ok(_) => {
            let runtime = background_runtime()?;
            std::thread::scope(|scope| {
                scope
                    .spawn(|| runtime.block_on(future))
                    .join()
                    .map_err(|_| SecretStoreError::RemoteUnavailable("SSM lookup thread panicked".to_string()))
            })
        }
        Err(_) => Ok(background_runtime()?.block_on(future)),
    }
}

/// Parameter store backed by AWS SSM
///
/// Every lookup is one `GetParameter` call with decryption requested, so
/// `SecureString` parameters come back in plaintext. Nothing is cached.
///
/// `resolve` blocks the calling thread. It may be called from plain
/// synchronous code or from within a tokio runtime, see [`block_on`].
///
/// # Example
///
/// ```no_run
/// use param_override_core::secrets::{ParameterStore, SsmParameterStore, SsmSettings};
///
/// let store = SsmParameterStore::new(SsmSettings {
///     region: Some("eu-west-1".to_string()),
///     endpoint_url: None,
/// });
/// let password = store.resolve("/prod/db/password").unwrap();
/// ```
pub struct SsmParameterStore {
    settings: SsmSettings,
    factory: ClientFactory,
    client: OnceCell<Arc<dyn ParameterClient>>,
}

impl SsmParameterStore {
    /// Store using the AWS SDK client
    pub fn new(settings: SsmSettings) -> Self {
        Self::with_client_factory(
            settings,
            Box::new(|settings: &SsmSettings| -> SecretStoreResult<Arc<dyn ParameterClient>> {
                let client = block_on(SdkParameterClient::connect(settings))?;
                Ok(Arc::new(client))
            }),
        )
    }

    /// Store with settings from the process environment
    pub fn from_env() -> Self {
        Self::new(SsmSettings::from_env())
    }

    /// Store with a custom client factory
    pub fn with_client_factory(settings: SsmSettings, factory: ClientFactory) -> Self {
        Self {
            settings,
            factory,
            client: OnceCell::new(),
        }
    }

    pub fn settings(&self) -> &SsmSettings {
        &self.settings
    }

    /// Whether the client has been created yet
    pub fn is_connected(&self) -> bool {
        self.client.get().is_some()
    }

    /// The client, created on first use
    ///
    /// Concurrent first calls build it exactly once. A failed attempt leaves
    /// the cell empty so the next lookup retries.
    fn client(&self) -> SecretStoreResult<&Arc<dyn ParameterClient>> {
        self.client.get_or_try_init(|| (self.factory)(&self.settings))
    }
}

impl fmt::Debug for SsmParameterStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SsmParameterStore")
            .field("settings", &self.settings)
            .field("connected", &self.is_connected())
            .finish()
    }
}

impl ParameterStore for SsmParameterStore {
    fn name(&self) -> &str {
        "ssm"
    }

    fn prefix(&self) -> &str {
        SSM_PREFIX
    }

    fn resolve(&self, key: &str) -> SecretStoreResult<String> {
        let client = self.client()?;
        block_on(client.get_parameter(key, true))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MapPropertySource;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeClient {
        values: HashMap<String, String>,
        requests: Arc<Mutex<Vec<(String, bool)>>>,
    }

    #[async_trait]
    impl ParameterClient for FakeClient {
        async fn get_parameter(&self, name: &str, with_decryption: bool) -> SecretStoreResult<String> {
            tokio::task::yield_now().await;
            self.requests.lock().push((name.to_string(), with_decryption));
            self.values
                .get(name)
                .cloned()
                .ok_or_else(|| SecretStoreError::NotFound(name.to_string()))
        }
    }

    struct Harness {
        store: SsmParameterStore,
        builds: Arc<AtomicUsize>,
        requests: Arc<Mutex<Vec<(String, bool)>>>,
    }

    /// Store whose factory counts builds and fails the first `failures` of them
    fn harness(values: &[(&str, &str)], failures: usize) -> Harness {
        let builds = Arc::new(AtomicUsize::new(0));
        let requests = Arc::new(Mutex::new(Vec::new()));
        let values: HashMap<String, String> = values
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let factory_builds = Arc::clone(&builds);
        let factory_requests = Arc::clone(&requests);
        let store = SsmParameterStore::with_client_factory(
            SsmSettings::default(),
            Box::new(move |_settings: &SsmSettings| -> SecretStoreResult<Arc<dyn ParameterClient>> {
                let attempt = factory_builds.fetch_add(1, Ordering::SeqCst);
                if attempt < failures {
                    return Err(SecretStoreError::RemoteUnavailable("no credentials".to_string()));
                }
                Ok(Arc::new(FakeClient {
                    values: values.clone(),
                    requests: Arc::clone(&factory_requests),
                }))
            }),
        );

        Harness { store, builds, requests }
    }

    #[test]
    fn test_ssm_store_identity() {
        let store = SsmParameterStore::new(SsmSettings::default());
        assert_eq!(store.name(), "ssm");
        assert_eq!(store.prefix(), "{ssmParameter}");
        // Construction alone never builds a client
        assert!(!store.is_connected());
    }

    #[test]
    fn test_client_built_lazily_and_once() {
        let h = harness(&[("/db/user", "admin"), ("/db/pass", "s3cret")], 0);
        assert_eq!(h.builds.load(Ordering::SeqCst), 0);

        assert_eq!(h.store.resolve("/db/user").unwrap(), "admin");
        assert_eq!(h.store.resolve("/db/pass").unwrap(), "s3cret");
        assert_eq!(h.store.resolve("/db/user").unwrap(), "admin");

        assert!(h.store.is_connected());
        assert_eq!(h.builds.load(Ordering::SeqCst), 1);
        // No caching: three lookups, three requests, all decrypted
        let requests = h.requests.lock().clone();
        assert_eq!(requests.len(), 3);
        assert!(requests.iter().all(|(_, decrypt)| *decrypt));
    }

    #[test]
    fn test_not_found_propagates() {
        let h = harness(&[], 0);
        assert_eq!(
            h.store.resolve("/missing"),
            Err(SecretStoreError::NotFound("/missing".to_string()))
        );
    }

    #[test]
    fn test_failed_client_build_is_retried() {
        let h = harness(&[("/k", "v")], 1);

        assert!(matches!(h.store.resolve("/k"), Err(SecretStoreError::RemoteUnavailable(_))));
        assert!(!h.store.is_connected());

        assert_eq!(h.store.resolve("/k").unwrap(), "v");
        assert_eq!(h.builds.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_concurrent_first_use_builds_once() {
        let h = Arc::new(harness(&[("/k", "v")], 0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let h = Arc::clone(&h);
                std::thread::spawn(move || h.store.resolve("/k").unwrap())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), "v");
        }

        assert_eq!(h.builds.load(Ordering::SeqCst), 1);
        assert_eq!(h.requests.lock().len(), 8);
    }

    #[test]
    fn test_settings_from_environment() {
        let mut env = StandardEnvironment::new();
        env.sources_mut().add_last(
            MapPropertySource::new("app")
                .with_property(REGION_PROPERTY, "eu-central-1")
                .with_property(ENDPOINT_PROPERTY, " http://ssm.internal "),
        );

        let settings = SsmSettings::from_environment(&env).unwrap();
        assert_eq!(settings.region.as_deref(), Some("eu-central-1"));
        assert_eq!(settings.endpoint_url.as_deref(), Some("http://ssm.internal"));
    }

    #[test]
    fn test_blank_settings_count_as_unset() {
        assert_eq!(non_empty(Some("   ".to_string())), None);
        assert_eq!(non_empty(None), None);
        assert_eq!(non_empty(Some(" us-east-1".to_string())).as_deref(), Some("us-east-1"));
    }

    #[test]
    fn test_settings_resolve_placeholders() {
        let mut env = StandardEnvironment::new();
        env.sources_mut().add_last(
            MapPropertySource::new("app")
                .with_property("deploy.region", "ap-southeast-2")
                .with_property(REGION_PROPERTY, "${deploy.region}")
                .with_property(ENDPOINT_PROPERTY, "https://ssm.${deploy.region}.amazonaws.com"),
        );

        let settings = SsmSettings::from_environment(&env).unwrap();
        assert_eq!(settings.region.as_deref(), Some("ap-southeast-2"));
        assert_eq!(
            settings.endpoint_url.as_deref(),
            Some("https://ssm.ap-southeast-2.amazonaws.com")
        );
    }

    #[test]
    fn test_settings_circular_placeholder_fails() {
        let mut env = StandardEnvironment::new();
        env.sources_mut()
            .add_last(MapPropertySource::new("app").with_property(REGION_PROPERTY, "${param-override.ssm.region}"));

        assert!(matches!(
            SsmSettings::from_environment(&env),
            Err(PlaceholderError::Circular(_))
        ));
    }

    #[test]
    fn test_settings_from_variables() {
        let vars: HashMap<&str, &str> = [
            (REGION_ENV, "us-west-2"),
            (ENDPOINT_ENV, "http://localhost:4566"),
        ]
        .into_iter()
        .collect();

        let settings = SsmSettings::from_lookup(|name| vars.get(name).map(|v| v.to_string()));
        assert_eq!(settings.region.as_deref(), Some("us-west-2"));
        assert_eq!(settings.endpoint_url.as_deref(), Some("http://localhost:4566"));

        assert_eq!(SsmSettings::from_lookup(|_| None), SsmSettings::default());
    }

    #[test]
    fn test_resolve_inside_multi_thread_runtime() {
        let h = harness(&[("/db/user", "admin")], 0);
        let outer = RuntimeBuilder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap();

        let value = outer.block_on(async { h.store.resolve("/db/user") });
        assert_eq!(value.unwrap(), "admin");

        // The outer runtime can be dropped after the store was used inside it
        drop(outer);
        assert_eq!(h.store.resolve("/db/user").unwrap(), "admin");
        assert_eq!(h.builds.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_resolve_inside_current_thread_runtime() {
        let h = harness(&[("/db/user", "admin")], 0);
        let outer = RuntimeBuilder::new_current_thread().enable_all().build().unwrap();

        let value = outer.block_on(async { h.store.resolve("/db/user") });
        assert_eq!(value.unwrap(), "admin");
        assert_eq!(
            outer.block_on(async { h.store.resolve("/db/missing") }),
            Err(SecretStoreError::NotFound("/db/missing".to_string()))
        );
    }

    #[test]
    fn test_block_on_outside_runtime() {
        assert_eq!(block_on(async { 40 + 2 }).unwrap(), 42);
    }
}
