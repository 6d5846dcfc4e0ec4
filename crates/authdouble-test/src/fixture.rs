//! Per-test setup and teardown of interception.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use authdouble_responders::types::APPLICATION_JSON;
use authdouble_responders::{Clock, HawkAuthResponder, SystemClock, UserInfoResponder};
use authdouble_telemetry::log_schema_reset;
use http::Method;

use crate::app::AppUnderTest;
use crate::config::HarnessConfig;
use crate::error::InterceptError;
use crate::registry::{InterceptionRegistry, UrlPattern};

/// Sets up interception for one test according to the application's
/// capabilities.
///
/// ```ignore
/// let harness = TestHarness::new(HarnessConfig::default());
/// harness.run(&mut app, |app, interception| {
///     // drive the application; its auth calls hit `interception`
/// })?;
/// ```
#[derive(Clone)]
pub struct TestHarness {
    config: HarnessConfig,
    clock: Arc<dyn Clock>,
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new(HarnessConfig::default())
    }
}

impl TestHarness {
    pub fn new(config: HarnessConfig) -> Self {
        Self {
            config,
            clock: Arc::new(SystemClock),
        }
    }

    /// Stamp Hawk expiry times from `clock` instead of the wall clock.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// A fresh inactive registry with this harness's strictness settings.
    pub fn registry(&self) -> InterceptionRegistry {
        InterceptionRegistry::new(self.config.strict)
            .with_assert_all_fired(self.config.assert_all_fired)
    }

    /// Reset the application's storage, activate `registry` and bind the
    /// responders the application needs.
    ///
    /// The returned guard deactivates the registry when dropped, including
    /// during a panic. Use [`ActiveInterception::finish`] to observe
    /// teardown errors.
    pub fn setup<'r, A>(
        &self,
        app: &mut A,
        registry: &'r mut InterceptionRegistry,
    ) -> Result<ActiveInterception<'r>, InterceptError>
    where
        A: AppUnderTest + ?Sized,
    {
        if let Some(storage) = app.storage() {
            storage
                .reset_schema()
                .map_err(|e| InterceptError::Reset(format!("{:#}", e)))?;
            log_schema_reset!("storage schema reset");
        }

        registry.activate()?;
        let mut active = ActiveInterception {
            registry,
            finished: false,
        };

        if app.hawk_auth_enabled() {
            active.add_with_content_type(
                Method::POST,
                UrlPattern::exact(self.config.hawk_endpoint.as_str()),
                HawkAuthResponder::with_clock(Arc::clone(&self.clock)),
                Some(APPLICATION_JSON),
            )?;
        }

        if app.bearer_auth_enabled() {
            active.add(
                Method::GET,
                UrlPattern::regex(&self.config.userinfo_pattern)?,
                UserInfoResponder::new(),
            )?;
        }

        Ok(active)
    }

    /// Run `body` with interception active on a registry owned by this call.
    pub fn run<A, F, R>(&self, app: &mut A, body: F) -> Result<R, InterceptError>
    where
        A: AppUnderTest + ?Sized,
        F: FnOnce(&mut A, &mut ActiveInterception<'_>) -> R,
    {
        let mut registry = self.registry();
        let mut active = self.setup(app, &mut registry)?;
        let result = body(app, &mut active);
        active.finish()?;
        Ok(result)
    }
}

/// An activated registry, deactivated on drop.
#[derive(Debug)]
pub struct ActiveInterception<'r> {
    registry: &'r mut InterceptionRegistry,
    finished: bool,
}

impl ActiveInterception<'_> {
    /// Deactivate now and report teardown errors.
    pub fn finish(mut self) -> Result<(), InterceptError> {
        self.finished = true;
        self.registry.deactivate()
    }
}

impl Deref for ActiveInterception<'_> {
    type Target = InterceptionRegistry;

    fn deref(&self) -> &Self::Target {
        self.registry
    }
}

impl DerefMut for ActiveInterception<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.registry
    }
}

impl Drop for ActiveInterception<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Err(e) = self.registry.deactivate() {
            tracing::warn!(error = %e, "interception torn down with errors");
        }
    }
}
