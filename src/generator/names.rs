//! Class name resolution.
//!
//! Raw model names become PHP class names here: first-letter
//! capitalization, collision suffixing and reserved-word suffixing, with one
//! memoized name per model so repeated lookups stay stable across a service.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use crate::error::GenError;
use crate::model::{Service, Shape};

/// Shared class name for every zero-member structure of a service.
pub const EMPTY_STRUCTURE_SHAPE: &str = "EmptyStructureShape";

/// PHP words that cannot be used as class names.
pub static PHP_RESERVED_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "abstract",
        "and",
        "array",
        "as",
        "bool",
        "break",
        "callable",
        "case",
        "catch",
        "class",
        "clone",
        "const",
        "continue",
        "declare",
        "default",
        "die",
        "do",
        "echo",
        "else",
        "elseif",
        "empty",
        "enddeclare",
        "endfor",
        "endforeach",
        "endif",
        "endswitch",
        "endwhile",
        "enum",
        "eval",
        "exit",
        "extends",
        "false",
        "final",
        "finally",
        "float",
        "fn",
        "for",
        "foreach",
        "function",
        "global",
        "goto",
        "if",
        "implements",
        "include",
        "include_once",
        "instanceof",
        "insteadof",
        "int",
        "interface",
        "isset",
        "iterable",
        "list",
        "match",
        "mixed",
        "namespace",
        "never",
        "new",
        "null",
        "object",
        "or",
        "parent",
        "print",
        "private",
        "protected",
        "public",
        "readonly",
        "require",
        "require_once",
        "return",
        "self",
        "static",
        "string",
        "switch",
        "throw",
        "trait",
        "true",
        "try",
        "unset",
        "use",
        "var",
        "void",
        "while",
        "xor",
        "yield",
    ]
    .into_iter()
    .collect()
});

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum NameKey {
    Service,
    Shape(String),
}

/// Assigns and memoizes one class name per model of a service.
#[derive(Debug, Default)]
pub struct NameResolver {
    names: HashMap<NameKey, String>,
}

impl NameResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// The client class base name for the service.
    pub fn resolve_service(&mut self, service: &Service) -> Result<String, GenError> {
        if let Some(existing) = self.names.get(&NameKey::Service) {
            return Ok(existing.clone());
        }
        let display = service_display_name(
            service.metadata("namespace"),
            service.metadata("targetPrefix"),
        )?;
        Ok(self.claim(NameKey::Service, display))
    }

    /// The class name for a shape. Zero-member structures share one
    /// sentinel name that never takes part in collision suffixing.
    pub fn resolve_shape(&mut self, shape: &Shape) -> Result<String, GenError> {
        if let Shape::Structure(structure) = shape {
            if structure.is_empty() {
                return Ok(EMPTY_STRUCTURE_SHAPE.to_string());
            }
        }
        let raw = shape.name();
        if raw.is_empty() {
            return Err(GenError::NamelessShape);
        }
        let key = NameKey::Shape(raw.to_string());
        if let Some(existing) = self.names.get(&key) {
            return Ok(existing.clone());
        }
        let display = capitalize_first(raw);
        Ok(self.claim(key, display))
    }

    fn claim(&mut self, key: NameKey, display: String) -> String {
        let mut name = display;
        loop {
            let reserved = PHP_RESERVED_WORDS.contains(name.to_ascii_lowercase().as_str());
            let collides = self
                .names
                .values()
                .any(|taken| taken.eq_ignore_ascii_case(&name));
            if !reserved && !collides {
                break;
            }
            name.push('_');
        }
        self.names.insert(key, name.clone());
        name
    }
}

/// The display name of a service: the `namespace` metadata when present,
/// otherwise the `targetPrefix` with rewrites for prefixes that carry a
/// version suffix or wrong casing.
pub(crate) fn service_display_name(
    namespace: Option<&str>,
    target_prefix: Option<&str>,
) -> Result<String, GenError> {
    if let Some(namespace) = namespace {
        if !namespace.is_empty() {
            return Ok(namespace.to_string());
        }
    }
    let prefix = target_prefix.unwrap_or_default();
    if prefix.is_empty() {
        return Err(GenError::UnresolvedServiceName);
    }
    let lower = prefix.to_ascii_lowercase();
    let name = if lower.contains("dynamodbstreams") {
        "DynamoDbStreams".to_string()
    } else if lower.contains("dynamodb") {
        "DynamoDb".to_string()
    } else if lower.contains("signer") {
        "Singer".to_string()
    } else {
        prefix.to_string()
    };
    Ok(name)
}

pub(crate) fn capitalize_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub(crate) fn lower_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
