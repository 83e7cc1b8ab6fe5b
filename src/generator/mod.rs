//! PHP class generation from AWS service descriptions.
//!
//! ## Usage
//!
//! ```ignore
//! use awsgen::{DirProvider, DirWriter, Generator, Writer};
//!
//! let provider = DirProvider::new(Path::new("data"))?;
//! let mut generator = Generator::new("App\\AwsGen", Box::new(provider));
//! generator.add_service("s3", "latest")?;
//!
//! let files = generator.run()?;
//! let mut writer = DirWriter::new(Path::new("src"), true)?.psr4_prefix("App\\");
//! writer.write(&files)?;
//! ```
//!
//! For S3 this produces `S3Client` with `createBucket`/`createBucketAsync`
//! method pairs documented on the class, `CreateBucketRequest` with a static
//! `create()` factory and fluent setters, `CreateBucketOutput` with typed
//! getters, and one class per nested structure, list and map shape.

mod common;
mod context;
mod names;
mod service;

pub use common::common_classes;
pub use context::Context;
pub use names::{NameResolver, EMPTY_STRUCTURE_SHAPE};
pub use service::ServiceGenerator;

use serde_json::Value;
use tracing::info;

use crate::error::GenError;
use crate::model::provider::ApiProvider;
use crate::model::Service;
use crate::php::PhpFile;

/// Generates strictly typed classes for a set of AWS services under one
/// root namespace.
#[derive(Debug)]
pub struct Generator {
    namespace: String,
    provider: Box<dyn ApiProvider>,
    services: Vec<(String, Service)>,
}

impl Generator {
    pub fn new(namespace: &str, provider: Box<dyn ApiProvider>) -> Self {
        Self {
            namespace: namespace.trim_matches('\\').to_string(),
            provider,
            services: Vec::new(),
        }
    }

    /// Queue a service for generation. `version` accepts `latest`.
    ///
    /// The resolved service namespace is written back into the document's
    /// metadata so name resolution and the generated classes agree on it.
    pub fn add_service(&mut self, name: &str, version: &str) -> Result<&mut Self, GenError> {
        let Some(mut api) = self.provider.load(name, version)? else {
            return Err(GenError::ApiNotFound {
                name: name.to_string(),
                version: version.to_string(),
            });
        };

        let namespace = match self.provider.namespace_for(name) {
            Some(namespace) => namespace,
            None => {
                let metadata = api.get("metadata");
                let ns = metadata
                    .and_then(|metadata| metadata.get("namespace"))
                    .and_then(Value::as_str);
                let prefix = metadata
                    .and_then(|metadata| metadata.get("targetPrefix"))
                    .and_then(Value::as_str);
                names::service_display_name(ns, prefix)?
            }
        };

        if self.services.iter().any(|(existing, _)| existing == &namespace) {
            return Err(GenError::DuplicateService {
                name: name.to_string(),
            });
        }

        match api.get_mut("metadata").and_then(Value::as_object_mut) {
            Some(metadata) => {
                metadata.insert("namespace".to_string(), Value::String(namespace.clone()));
            }
            None => {
                if let Some(root) = api.as_object_mut() {
                    let mut metadata = serde_json::Map::new();
                    metadata.insert("namespace".to_string(), Value::String(namespace.clone()));
                    root.insert("metadata".to_string(), Value::Object(metadata));
                }
            }
        }

        let service = Service::new(api);
        info!(
            service = name,
            version,
            protocol = service.metadata("protocol").unwrap_or_default(),
            namespace,
            "added service"
        );
        self.services.push((namespace, service));
        Ok(self)
    }

    /// Generate everything: the support classes first, then each service's
    /// classes in the order the services were added.
    pub fn run(&self) -> Result<Vec<PhpFile>, GenError> {
        let mut files = common_classes(&self.namespace);
        for (_, service) in &self.services {
            let mut generator = ServiceGenerator::new(&self.namespace, service);
            files.extend(generator.run()?);
        }
        Ok(files)
    }
}
