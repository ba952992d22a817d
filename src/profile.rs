use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::Result;
use crate::store::JsonStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub target_lang: String,
}

impl UserProfile {
    pub fn new(target_lang: impl Into<String>) -> Self {
        Self {
            target_lang: target_lang.into(),
        }
    }
}

/// User id to profile mapping, persisted as a whole on every mutation
pub struct ProfileRegistry {
    store: JsonStore,
    resource: String,
    default_target_lang: String,
    profiles: BTreeMap<String, UserProfile>,
}

impl ProfileRegistry {
    /// Load the registry from `resource` in `store`
    pub async fn load(
        store: JsonStore,
        resource: impl Into<String>,
        default_target_lang: impl Into<String>,
    ) -> Result<Self> {
        let resource = resource.into();
        let profiles: BTreeMap<String, UserProfile> = store.load(&resource).await?;
        info!("Loaded {} user profile(s)", profiles.len());

        Ok(Self {
            store,
            resource,
            default_target_lang: default_target_lang.into(),
            profiles,
        })
    }

    /// Profile for `user_id`, creating the default in memory if unseen.
    /// The default is not persisted until the next `set`.
    pub fn get(&mut self, user_id: &str) -> UserProfile {
        let default_target_lang = &self.default_target_lang;
        self.profiles
            .entry(user_id.to_string())
            .or_insert_with(|| {
                debug!("Creating default profile for {}", user_id);
                UserProfile::new(default_target_lang.clone())
            })
            .clone()
    }

    /// Overwrite the profile for `user_id` and persist the registry
    pub async fn set(&mut self, user_id: &str, profile: UserProfile) -> Result<()> {
        self.profiles.insert(user_id.to_string(), profile);
        self.store.save(&self.resource, &self.profiles).await
    }

    pub async fn register(&mut self, user_id: &str, target_lang: &str) -> Result<UserProfile> {
        let mut profile = self.get(user_id);
        profile.target_lang = target_lang.to_string();
        self.set(user_id, profile.clone()).await?;
        info!("Registered {} with target language {}", user_id, target_lang);
        Ok(profile)
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.profiles.contains_key(user_id)
    }

    pub fn users(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TolkError;

    const PROFILES: &str = "user_profiles.json";

    async fn registry_in(dir: &std::path::Path) -> ProfileRegistry {
        ProfileRegistry::load(JsonStore::new(dir), PROFILES, "en")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_unseen_user_gets_stable_default() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = registry_in(dir.path()).await;

        assert_eq!(registry.get("bob"), UserProfile::new("en"));
        assert_eq!(registry.get("bob"), UserProfile::new("en"));
        assert!(registry.contains("bob"));
    }

    #[tokio::test]
    async fn test_lazy_default_is_not_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = registry_in(dir.path()).await;
        registry.get("bob");

        assert!(!dir.path().join(PROFILES).exists());
        let mut reloaded = registry_in(dir.path()).await;
        assert!(!reloaded.contains("bob"));
        assert_eq!(reloaded.get("bob").target_lang, "en");
    }

    #[tokio::test]
    async fn test_set_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = registry_in(dir.path()).await;
        registry.set("carol", UserProfile::new("ja")).await.unwrap();

        let mut reloaded = registry_in(dir.path()).await;
        assert_eq!(reloaded.get("carol"), UserProfile::new("ja"));
    }

    #[tokio::test]
    async fn test_register_overrides_default() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = registry_in(dir.path()).await;

        assert_eq!(registry.get("alice").target_lang, "en");
        let profile = registry.register("alice", "fr").await.unwrap();
        assert_eq!(profile.target_lang, "fr");
        assert_eq!(registry.get("alice").target_lang, "fr");

        let mut reloaded = registry_in(dir.path()).await;
        assert_eq!(reloaded.get("alice").target_lang, "fr");
        assert_eq!(reloaded.users().collect::<Vec<_>>(), vec!["alice"]);
    }

    #[tokio::test]
    async fn test_reads_existing_file_format() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(PROFILES),
            r#"{"dave": {"target_lang": "de"}}"#,
        )
        .unwrap();

        let mut registry = registry_in(dir.path()).await;
        assert_eq!(registry.get("dave").target_lang, "de");
    }

    #[tokio::test]
    async fn test_corrupt_bytes_do_not_block_loading() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(PROFILES), [0xff, 0xfe, 0x7b]).unwrap();

        let mut registry = registry_in(dir.path()).await;
        assert_eq!(registry.get("alice").target_lang, "en");
        registry.register("alice", "fr").await.unwrap();

        let mut reloaded = registry_in(dir.path()).await;
        assert_eq!(reloaded.get("alice").target_lang, "fr");
    }

    #[tokio::test]
    async fn test_configured_default_language() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = ProfileRegistry::load(JsonStore::new(dir.path()), PROFILES, "es")
            .await
            .unwrap();
        assert_eq!(registry.get("erin").target_lang, "es");
    }

    #[tokio::test]
    async fn test_set_failure_is_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = registry_in(dir.path()).await;
        std::fs::create_dir_all(dir.path().join(PROFILES)).unwrap();

        let result = registry.set("frank", UserProfile::new("it")).await;
        assert!(matches!(result, Err(TolkError::Persistence(_))));
    }
}
