//! What the harness needs from the application under test.

use std::collections::BTreeMap;

use serde_json::Value;

/// Storage whose schema can be rebuilt between tests.
pub trait SchemaReset {
    fn drop_all(&mut self) -> anyhow::Result<()>;

    fn create_all(&mut self) -> anyhow::Result<()>;

    /// Drop then recreate every table.
    fn reset_schema(&mut self) -> anyhow::Result<()> {
        self.drop_all()?;
        self.create_all()
    }
}

/// Capability markers of an application under test.
///
/// Every marker defaults to "absent"; applications override the ones they
/// support.
pub trait AppUnderTest {
    /// The application authenticates callers against a Hawk service.
    fn hawk_auth_enabled(&self) -> bool {
        false
    }

    /// The application resolves bearer tokens through a userinfo endpoint.
    fn bearer_auth_enabled(&self) -> bool {
        false
    }

    /// Storage to reset before each test, if the application has any.
    fn storage(&mut self) -> Option<&mut dyn SchemaReset> {
        None
    }
}

/// Size of the random `SECRET_KEY` in bytes.
pub const SECRET_KEY_LEN: usize = 24;

/// Application settings for a test run.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    values: BTreeMap<String, Value>,
}

impl AppConfig {
    /// `TESTING = true` and a fresh random hex `SECRET_KEY`, then `extra`
    /// entries on top (overriding either default).
    pub fn for_testing<I, K>(extra: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let secret: [u8; SECRET_KEY_LEN] = rand::random();
        let mut values = BTreeMap::new();
        values.insert("TESTING".to_string(), Value::Bool(true));
        values.insert("SECRET_KEY".to_string(), Value::String(hex::encode(secret)));
        values.extend(extra.into_iter().map(|(k, v)| (k.into(), v)));
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    pub fn into_inner(self) -> BTreeMap<String, Value> {
        self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Default)]
    struct CountingStore {
        log: Vec<&'static str>,
    }

    impl SchemaReset for CountingStore {
        fn drop_all(&mut self) -> anyhow::Result<()> {
            self.log.push("drop");
            Ok(())
        }

        fn create_all(&mut self) -> anyhow::Result<()> {
            self.log.push("create");
            Ok(())
        }
    }

    struct Bare;
    impl AppUnderTest for Bare {}

    #[test]
    fn test_reset_schema_drops_then_creates() {
        let mut store = CountingStore::default();
        store.reset_schema().unwrap();
        assert_eq!(store.log, vec!["drop", "create"]);
    }

    #[test]
    fn test_default_capabilities_absent() {
        let mut app = Bare;
        assert!(!app.hawk_auth_enabled());
        assert!(!app.bearer_auth_enabled());
        assert!(app.storage().is_none());
    }

    #[test]
    fn test_app_config_defaults() {
        let config = AppConfig::for_testing(Vec::<(String, Value)>::new());
        assert_eq!(config.get("TESTING"), Some(&json!(true)));
        let secret = config.get("SECRET_KEY").and_then(Value::as_str).unwrap();
        assert_eq!(secret.len(), SECRET_KEY_LEN * 2);
        assert!(secret.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_app_config_secret_differs_per_call() {
        let a = AppConfig::for_testing(Vec::<(String, Value)>::new());
        let b = AppConfig::for_testing(Vec::<(String, Value)>::new());
        assert_ne!(a.get("SECRET_KEY"), b.get("SECRET_KEY"));
    }

    #[test]
    fn test_app_config_extra_overrides() {
        let config = AppConfig::for_testing([
            ("TESTING", json!(false)),
            ("DATABASE_URL", json!("sqlite://")),
        ]);
        assert_eq!(config.get("TESTING"), Some(&json!(false)));
        assert_eq!(config.get("DATABASE_URL"), Some(&json!("sqlite://")));
        assert_eq!(config.iter().count(), 3);
    }
}
