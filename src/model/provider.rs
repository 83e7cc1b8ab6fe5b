//! API description providers.
//!
//! A provider turns a `name:version` pair into a raw API document. The
//! directory provider reads the aws-sdk layout: one directory per service,
//! one dated directory per version, `api-2.json` inside, with an optional
//! `manifest.json` at the root mapping names to namespaces and version
//! aliases.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::PathBuf;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::GenError;

/// A source of service descriptions.
pub trait ApiProvider: fmt::Debug {
    /// The raw API document for a name/version pair, `None` when unknown.
    fn load(&self, name: &str, version: &str) -> Result<Option<Value>, GenError>;

    /// The namespace a manifest assigns to the service, if any.
    fn namespace_for(&self, name: &str) -> Option<String> {
        let _ = name;
        None
    }

    /// Available services, for listing and prompts.
    fn services(&self) -> Result<Vec<ServiceListing>, GenError>;
}

/// One row of the service catalog.
#[derive(Debug, Clone)]
pub struct ServiceListing {
    pub name: String,
    pub namespace: Option<String>,
    pub versions: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ManifestEntry {
    namespace: String,
    #[serde(default)]
    versions: BTreeMap<String, String>,
}

/// Loads documents from `<root>/<name>/<version>/api-2.json`.
#[derive(Debug)]
pub struct DirProvider {
    root: PathBuf,
    manifest: Option<BTreeMap<String, ManifestEntry>>,
}

impl DirProvider {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, GenError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(GenError::NotADirectory { path: root });
        }
        let manifest_path = root.join("manifest.json");
        let manifest = if manifest_path.is_file() {
            let raw = fs::read_to_string(&manifest_path).map_err(|source| GenError::Read {
                path: manifest_path.clone(),
                source,
            })?;
            Some(serde_json::from_str(&raw).map_err(|source| GenError::InvalidApi {
                path: manifest_path,
                source,
            })?)
        } else {
            None
        };
        Ok(Self { root, manifest })
    }

    fn resolve_version(&self, name: &str, version: &str) -> Option<String> {
        if version != "latest" {
            return Some(version.to_string());
        }
        if let Some(aliased) = self
            .manifest
            .as_ref()
            .and_then(|manifest| manifest.get(name))
            .and_then(|entry| entry.versions.get("latest"))
        {
            return Some(aliased.clone());
        }
        // Version directories are dated (2006-03-01), so the lexicographic
        // maximum is the newest.
        let entries = fs::read_dir(self.root.join(name)).ok()?;
        entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().join("api-2.json").is_file())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .max()
    }
}

impl ApiProvider for DirProvider {
    fn load(&self, name: &str, version: &str) -> Result<Option<Value>, GenError> {
        let Some(version) = self.resolve_version(name, version) else {
            return Ok(None);
        };
        let path = self.root.join(name).join(&version).join("api-2.json");
        if !path.is_file() {
            return Ok(None);
        }
        debug!(path = %path.display(), "loading api document");
        let raw = fs::read_to_string(&path).map_err(|source| GenError::Read {
            path: path.clone(),
            source,
        })?;
        let api = serde_json::from_str(&raw)
            .map_err(|source| GenError::InvalidApi { path, source })?;
        Ok(Some(api))
    }

    fn namespace_for(&self, name: &str) -> Option<String> {
        self.manifest
            .as_ref()?
            .get(name)
            .map(|entry| entry.namespace.clone())
    }

    fn services(&self) -> Result<Vec<ServiceListing>, GenError> {
        if let Some(manifest) = &self.manifest {
            return Ok(manifest
                .iter()
                .map(|(name, entry)| {
                    let mut versions: Vec<String> = entry.versions.values().cloned().collect();
                    versions.sort();
                    versions.dedup();
                    ServiceListing {
                        name: name.clone(),
                        namespace: Some(entry.namespace.clone()),
                        versions,
                    }
                })
                .collect());
        }

        let mut catalog: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for entry in WalkDir::new(&self.root).min_depth(3).max_depth(3) {
            let entry = entry.map_err(|source| GenError::Read {
                path: self.root.clone(),
                source: source.into(),
            })?;
            if !entry.file_type().is_file() || entry.file_name() != "api-2.json" {
                continue;
            }
            let Some(version_dir) = entry.path().parent() else {
                continue;
            };
            let Some(service_dir) = version_dir.parent() else {
                continue;
            };
            let (Some(version), Some(name)) = (
                version_dir.file_name().and_then(|name| name.to_str()),
                service_dir.file_name().and_then(|name| name.to_str()),
            ) else {
                continue;
            };
            catalog.entry(name.to_string()).or_default().push(version.to_string());
        }
        Ok(catalog
            .into_iter()
            .map(|(name, mut versions)| {
                versions.sort();
                ServiceListing {
                    name,
                    namespace: None,
                    versions,
                }
            })
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::path::Path;

    fn write_api(root: &Path, name: &str, version: &str) {
        let dir = root.join(name).join(version);
        fs::create_dir_all(&dir).unwrap();
        let api = format!(r##"{{"metadata": {{"apiVersion": "{version}"}}}}"##);
        fs::write(dir.join("api-2.json"), api).unwrap();
    }

    fn api_version(api: &Value) -> &str {
        api["metadata"]["apiVersion"].as_str().unwrap()
    }

    #[test]
    fn test_load_explicit_version() {
        let dir = tempfile::tempdir().unwrap();
        write_api(dir.path(), "s3", "2006-03-01");
        let provider = DirProvider::new(dir.path()).unwrap();
        let api = provider.load("s3", "2006-03-01").unwrap().unwrap();
        assert_eq!(api_version(&api), "2006-03-01");
    }

    #[test]
    fn test_latest_resolves_to_newest_directory() {
        let dir = tempfile::tempdir().unwrap();
        write_api(dir.path(), "dynamodb", "2011-12-05");
        write_api(dir.path(), "dynamodb", "2012-08-10");
        let provider = DirProvider::new(dir.path()).unwrap();
        let api = provider.load("dynamodb", "latest").unwrap().unwrap();
        assert_eq!(api_version(&api), "2012-08-10");
    }

    #[test]
    fn test_manifest_latest_alias_wins() {
        let dir = tempfile::tempdir().unwrap();
        write_api(dir.path(), "s3", "2006-03-01");
        write_api(dir.path(), "s3", "2019-01-01");
        fs::write(
            dir.path().join("manifest.json"),
            r##"{"s3": {"namespace": "S3", "versions": {"latest": "2006-03-01"}}}"##,
        )
        .unwrap();
        let provider = DirProvider::new(dir.path()).unwrap();
        let api = provider.load("s3", "latest").unwrap().unwrap();
        assert_eq!(api_version(&api), "2006-03-01");
        assert_eq!(provider.namespace_for("s3"), Some("S3".to_string()));
    }

    #[test]
    fn test_unknown_service_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let provider = DirProvider::new(dir.path()).unwrap();
        assert!(provider.load("nope", "latest").unwrap().is_none());
        assert!(provider.namespace_for("nope").is_none());
    }

    #[test]
    fn test_services_listing_without_manifest() {
        let dir = tempfile::tempdir().unwrap();
        write_api(dir.path(), "s3", "2006-03-01");
        write_api(dir.path(), "dynamodb", "2012-08-10");
        write_api(dir.path(), "dynamodb", "2011-12-05");
        let provider = DirProvider::new(dir.path()).unwrap();
        let listings = provider.services().unwrap();
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].name, "dynamodb");
        assert_eq!(listings[0].versions, ["2011-12-05", "2012-08-10"]);
        assert_eq!(listings[1].name, "s3");
        assert!(listings[1].namespace.is_none());
    }

    #[test]
    fn test_non_directory_root_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = DirProvider::new(dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, GenError::NotADirectory { .. }));
    }
}
