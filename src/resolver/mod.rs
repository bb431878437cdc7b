//! Config resolution.
//!
//! Turns a snapshot and a [`ConfigRequest`] into a [`ConfigBundle`]: candidate
//! files are chosen by naming convention, parsed into flat layers and ordered
//! application+profile > application > profile > default.

mod bundle;
mod error;
pub mod naming;
pub mod parser;
mod request;

pub use bundle::{ConfigBundle, ConfigLayer};
pub use error::ResolveError;
pub use request::ConfigRequest;

use tracing::debug;

use crate::config::SourceConfig;
use crate::source::Fetched;

/// Stateless resolver; one per application, shared by all requests
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    search_paths: Vec<String>,
}

impl ConfigResolver {
    pub fn new(search_paths: Vec<String>) -> Self {
        Self { search_paths }
    }

    pub fn from_config(config: &SourceConfig) -> Self {
        Self::new(config.search_paths.clone())
    }

    /// Build the bundle for `request` from a fetched snapshot.
    ///
    /// Fails with `NotFound` only when no candidate file exists at all, which
    /// includes the default `application.*` layer.
    pub fn resolve(
        &self,
        request: &ConfigRequest,
        label: &str,
        fetched: &Fetched,
    ) -> Result<ConfigBundle, ResolveError> {
        let snapshot = &fetched.snapshot;
        let profiles = request.profiles();
        let candidates = naming::select(snapshot, &request.application, &profiles, &self.search_paths);

        if candidates.is_empty() {
            return Err(ResolveError::NotFound {
                application: request.application.clone(),
                profiles: request.profile.clone(),
                label: label.to_string(),
            });
        }

        let mut layers = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if let Some(reason) = snapshot.undecodable(&candidate.path) {
                return Err(ResolveError::Malformed {
                    file: candidate.path,
                    reason: reason.to_string(),
                });
            }
            let content = snapshot.file(&candidate.path).unwrap_or_default();
            let source = parser::parse(&candidate.path, content).map_err(|reason| {
                ResolveError::Malformed {
                    file: candidate.path.clone(),
                    reason,
                }
            })?;
            layers.push(ConfigLayer {
                name: candidate.path,
                rank: candidate.rank.value(),
                source,
            });
        }

        debug!(
            application = %request.application,
            label = %label,
            layers = layers.len(),
            "Resolved configuration"
        );

        Ok(ConfigBundle {
            name: request.application.clone(),
            profiles: profiles.into_iter().map(String::from).collect(),
            label: label.to_string(),
            version: snapshot.version.clone(),
            stale: fetched.stale,
            property_sources: layers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{FileContents, Snapshot};
    use proptest::prelude::*;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn fetched(files: &[(&str, &str)]) -> Fetched {
        let files: BTreeMap<String, String> = files
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Fetched {
            snapshot: Arc::new(Snapshot::new("main", Some("3f2c".to_string()), files)),
            stale: false,
        }
    }

    fn request(application: &str, profile: &str) -> ConfigRequest {
        ConfigRequest::new(application, profile, None)
    }

    #[test]
    fn test_profile_specific_value_wins() {
        let fetched = fetched(&[("application.yml", "a: 1\n"), ("billing-prod.yml", "a: 2\n")]);
        let bundle = ConfigResolver::default()
            .resolve(&request("billing", "prod"), "main", &fetched)
            .unwrap();

        assert_eq!(bundle.get("a"), Some("2"));
        assert_eq!(bundle.property_sources.len(), 2);
        assert_eq!(bundle.property_sources[0].name, "billing-prod.yml");
        assert_eq!(bundle.property_sources[1].name, "application.yml");
        assert_eq!(bundle.version.as_deref(), Some("3f2c"));
        assert_eq!(bundle.label, "main");
        assert!(!bundle.stale);
    }

    #[test]
    fn test_only_default_layer() {
        let fetched = fetched(&[("application.yml", "a: 1\n"), ("orders.yml", "a: 9\n")]);
        let bundle = ConfigResolver::default()
            .resolve(&request("billing", "prod"), "main", &fetched)
            .unwrap();

        assert_eq!(bundle.property_sources.len(), 1);
        assert_eq!(bundle.property_sources[0].name, "application.yml");
        assert_eq!(bundle.property_sources[0].rank, 3);
    }

    #[test]
    fn test_no_matching_files_is_not_found() {
        let fetched = fetched(&[("orders.yml", "a: 9\n")]);
        let err = ConfigResolver::default()
            .resolve(&request("billing", "prod"), "main", &fetched)
            .unwrap_err();
        assert!(matches!(err, ResolveError::NotFound { .. }));
    }

    #[test]
    fn test_application_specific_without_default() {
        let fetched = fetched(&[("billing.properties", "a=5\n")]);
        let bundle = ConfigResolver::default()
            .resolve(&request("billing", "prod"), "main", &fetched)
            .unwrap();
        assert_eq!(bundle.get("a"), Some("5"));
    }

    #[test]
    fn test_malformed_file_names_the_file() {
        let fetched = fetched(&[("application.yml", "a: 1\n"), ("billing.json", "{ nope")]);
        let err = ConfigResolver::default()
            .resolve(&request("billing", "prod"), "main", &fetched)
            .unwrap_err();
        match err {
            ResolveError::Malformed { file, .. } => assert_eq!(file, "billing.json"),
            other => panic!("expected Malformed, got {:?}", other),
        }
    }

    #[test]
    fn test_undecodable_file_fails_only_when_selected() {
        let mut contents = FileContents::default();
        contents.insert("application.yml".to_string(), b"a: 1\n".to_vec());
        contents.insert("legacy.properties".to_string(), b"name=caf\xe9\n".to_vec());
        let fetched = Fetched {
            snapshot: Arc::new(Snapshot::from_contents("main", None, contents)),
            stale: false,
        };

        let bundle = ConfigResolver::default()
            .resolve(&request("billing", "prod"), "main", &fetched)
            .unwrap();
        assert_eq!(bundle.get("a"), Some("1"));

        let err = ConfigResolver::default()
            .resolve(&request("legacy", "prod"), "main", &fetched)
            .unwrap_err();
        match err {
            ResolveError::Malformed { file, reason } => {
                assert_eq!(file, "legacy.properties");
                assert!(reason.contains("UTF-8"), "{reason}");
            }
            other => panic!("expected Malformed, got {:?}", other),
        }
    }

    #[test]
    fn test_multiple_profiles_later_wins() {
        let fetched = fetched(&[
            ("billing-prod.yml", "a: prod\nb: prod\n"),
            ("billing-east.yml", "a: east\n"),
        ]);
        let bundle = ConfigResolver::default()
            .resolve(&request("billing", "prod,east"), "main", &fetched)
            .unwrap();
        assert_eq!(bundle.profiles, vec!["prod", "east"]);
        assert_eq!(bundle.get("a"), Some("east"));
        assert_eq!(bundle.get("b"), Some("prod"));
    }

    #[test]
    fn test_stale_flag_carried() {
        let mut fetched = fetched(&[("application.yml", "a: 1\n")]);
        fetched.stale = true;
        let bundle = ConfigResolver::default()
            .resolve(&request("billing", "prod"), "main", &fetched)
            .unwrap();
        assert!(bundle.stale);
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let fetched = fetched(&[
            ("application.yml", "z: 1\na: 1\nnested:\n  k: v\n"),
            ("application-prod.properties", "y=2\n"),
            ("billing.toml", "x = 3\n"),
            ("billing-prod.json", "{\"w\": 4}"),
        ]);
        let resolver = ConfigResolver::default();
        let request = request("billing", "prod");

        let first = serde_json::to_vec(&resolver.resolve(&request, "main", &fetched).unwrap()).unwrap();
        let second = serde_json::to_vec(&resolver.resolve(&request, "main", &fetched).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    proptest! {
        #[test]
        fn property_layer_order_follows_rank(
            has_app_profile in any::<bool>(),
            has_app in any::<bool>(),
            has_profile in any::<bool>(),
            has_default in any::<bool>(),
        ) {
            let mut files = Vec::new();
            if has_default { files.push(("application.yml", "k: default\n")); }
            if has_profile { files.push(("application-prod.yml", "k: profile\n")); }
            if has_app { files.push(("billing.yml", "k: app\n")); }
            if has_app_profile { files.push(("billing-prod.yml", "k: app-profile\n")); }
            let fetched = fetched(&files);

            let result = ConfigResolver::default().resolve(&request("billing", "prod"), "main", &fetched);
            if files.is_empty() {
                prop_assert!(matches!(result, Err(ResolveError::NotFound { .. })), "expected NotFound");
            } else {
                let bundle = result.unwrap();
                prop_assert_eq!(bundle.property_sources.len(), files.len());
                let ranks: Vec<u8> = bundle.property_sources.iter().map(|l| l.rank).collect();
                let mut sorted = ranks.clone();
                sorted.sort();
                prop_assert_eq!(&ranks, &sorted);

                let expected = if has_app_profile { "app-profile" }
                    else if has_app { "app" }
                    else if has_profile { "profile" }
                    else { "default" };
                prop_assert_eq!(bundle.get("k"), Some(expected));
            }
        }
    }
}
