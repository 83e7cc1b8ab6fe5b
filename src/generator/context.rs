//! Class registry keyed by structural hash.
//!
//! Two shapes produce one class exactly when their hashes match. The hash
//! covers the shape's name and its one-level-resolved content, so nested
//! references contribute by name and recursive shapes hash in finite time.

use std::collections::HashMap;

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::GenError;
use crate::model::{Model, Operation, Shape};

#[derive(Debug)]
struct Registration<'a> {
    model: Model<'a>,
    operations: Vec<Option<Operation>>,
}

/// Registry of class-producing models, deduplicated by structural hash and
/// ordered by first registration.
#[derive(Debug, Default)]
pub struct Context<'a> {
    registrations: HashMap<String, Registration<'a>>,
    order: Vec<String>,
}

impl<'a> Context<'a> {
    pub fn new() -> Self {
        Self {
            registrations: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Register a model under the operation it was reached from. Returns
    /// `true` when an identically-shaped model was already registered.
    ///
    /// Shapes only exist inside an operation's input or output tree, so
    /// registering one without an operation is an error.
    pub fn register(
        &mut self,
        model: Model<'a>,
        operation: Option<&Operation>,
    ) -> Result<bool, GenError> {
        if matches!(model, Model::Shape(_)) && operation.is_none() {
            return Err(GenError::ShapeOutsideOperation);
        }
        let hash = Self::hash(&model)?;
        let existed = self.registrations.contains_key(&hash);
        self.registrations
            .entry(hash.clone())
            .or_insert_with(|| Registration {
                model,
                operations: Vec::new(),
            })
            .operations
            .push(operation.cloned());
        if !existed {
            self.order.push(hash);
        }
        Ok(existed)
    }

    /// Registered hashes in first-registration order.
    pub fn hashes(&self) -> &[String] {
        &self.order
    }

    pub fn model(&self, hash: &str) -> Option<&Model<'a>> {
        self.registrations
            .get(hash)
            .map(|registration| &registration.model)
    }

    /// The operation of the first registration, used to classify a shape as
    /// an operation input or output.
    pub fn operation(&self, hash: &str) -> Option<&Operation> {
        self.registrations.get(hash)?.operations.first()?.as_ref()
    }

    /// Hex SHA-256 over the canonical JSON of the model's identity content.
    pub fn hash(model: &Model<'_>) -> Result<String, GenError> {
        let content = match model {
            Model::Service(service) => service.def().clone(),
            Model::Shape(shape) => Self::shape_content(shape)?,
        };
        let digest = Sha256::digest(content.to_string().as_bytes());
        Ok(hex::encode(digest))
    }

    fn shape_content(shape: &Shape) -> Result<Value, GenError> {
        let name = Value::String(shape.name().to_string());
        let content = match shape {
            Shape::Structure(structure) => {
                let mut parts = vec![name];
                for (_, member) in structure.members()? {
                    parts.push(Value::Object(member.def().clone()));
                }
                parts
            }
            Shape::List(list) => vec![name, Value::Object(list.member()?.def().clone())],
            Shape::Map(map) => vec![name, Value::Object(map.value()?.def().clone())],
            Shape::Scalar(_) => vec![name, Value::Object(shape.def().clone())],
        };
        Ok(Value::Array(content))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::model::Service;

    const API: &str = r##"{
        "metadata": {"namespace": "X"},
        "operations": {
            "First": {"name": "First", "input": {"shape": "Req"}},
            "Second": {"name": "Second", "input": {"shape": "Req"}},
            "Third": {"name": "Third", "input": {"shape": "Node"}}
        },
        "shapes": {
            "Req": {"type": "structure", "members": {"Name": {"shape": "Str"}}},
            "Node": {"type": "structure", "members": {"Next": {"shape": "Node"}}},
            "Names": {"type": "list", "member": {"shape": "Str"}},
            "Str": {"type": "string"}
        }
    }"##;

    fn service() -> Service {
        Service::new(serde_json::from_str(API).unwrap())
    }

    #[test]
    fn test_same_shape_registers_once() {
        let service = service();
        let operations = service.operations();
        let (first, second) = (&operations[0], &operations[1]);
        let mut context = Context::new();

        let input = Model::Shape(Shape::Structure(first.input().unwrap()));
        assert!(!context.register(input, Some(first)).unwrap());

        let again = Model::Shape(Shape::Structure(second.input().unwrap()));
        assert!(context.register(again, Some(second)).unwrap());

        assert_eq!(context.hashes().len(), 1);
        // Classification uses the first registration's operation.
        let hash = context.hashes()[0].clone();
        assert_eq!(context.operation(&hash).unwrap().name(), "First");
    }

    #[test]
    fn test_shape_outside_operation_is_rejected() {
        let service = service();
        let operations = service.operations();
        let input = Model::Shape(Shape::Structure(operations[0].input().unwrap()));
        let mut context = Context::new();
        let err = context.register(input, None).unwrap_err();
        assert!(matches!(err, GenError::ShapeOutsideOperation));
    }

    #[test]
    fn test_registration_order_is_kept() {
        let service = service();
        let operations = service.operations();
        let first = &operations[0];
        let mut context = Context::new();

        context.register(Model::Service(&service), None).unwrap();
        let input = Model::Shape(Shape::Structure(first.input().unwrap()));
        context.register(input, Some(first)).unwrap();

        assert_eq!(context.hashes().len(), 2);
        let service_hash = Context::hash(&Model::Service(&service)).unwrap();
        assert_eq!(context.hashes()[0], service_hash);
        let shape_hash = context.hashes()[1].clone();
        assert!(matches!(context.model(&shape_hash), Some(Model::Shape(_))));
    }

    #[test]
    fn test_hash_is_deterministic_and_name_sensitive() {
        let service = service();
        let operations = service.operations();
        let input = || Model::Shape(Shape::Structure(operations[0].input().unwrap()));
        assert_eq!(Context::hash(&input()).unwrap(), Context::hash(&input()).unwrap());

        let node = Model::Shape(Shape::Structure(operations[2].input().unwrap()));
        assert_ne!(Context::hash(&input()).unwrap(), Context::hash(&node).unwrap());
    }

    #[test]
    fn test_recursive_shape_hashes_in_finite_time() {
        let service = service();
        let operations = service.operations();
        let third = &operations[2];
        let node = Shape::Structure(third.input().unwrap());
        let mut context = Context::new();
        assert!(!context
            .register(Model::Shape(node.clone()), Some(third))
            .unwrap());
        assert!(context.register(Model::Shape(node), Some(third)).unwrap());
    }
}
