//! API document model: services, operations and shapes.

pub mod provider;
mod shape;

use std::rc::Rc;

use serde_json::Value;

pub use shape::{ListShape, MapShape, ScalarShape, Shape, ShapeIndex, StructureShape};

use crate::error::GenError;

/// A parsed service description (`api-2.json`).
#[derive(Debug, Clone)]
pub struct Service {
    def: Value,
    index: Rc<ShapeIndex>,
}

impl Service {
    pub fn new(def: Value) -> Self {
        let shapes = def
            .get("shapes")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        Self {
            def,
            index: Rc::new(ShapeIndex::new(shapes)),
        }
    }

    /// A `metadata` entry such as `namespace`, `targetPrefix` or `protocol`.
    pub fn metadata(&self, key: &str) -> Option<&str> {
        self.def
            .get("metadata")
            .and_then(|metadata| metadata.get(key))
            .and_then(Value::as_str)
    }

    /// Operations in declared order.
    pub fn operations(&self) -> Vec<Operation> {
        let Some(operations) = self.def.get("operations").and_then(Value::as_object) else {
            return Vec::new();
        };
        operations
            .iter()
            .map(|(name, def)| Operation {
                name: name.clone(),
                def: def.clone(),
                index: Rc::clone(&self.index),
            })
            .collect()
    }

    /// The full document, used for structural hashing.
    pub fn def(&self) -> &Value {
        &self.def
    }
}

/// A single operation of a service.
#[derive(Debug, Clone)]
pub struct Operation {
    name: String,
    def: Value,
    index: Rc<ShapeIndex>,
}

impl Operation {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The input structure, synthesized empty when the operation takes none.
    pub fn input(&self) -> Result<StructureShape, GenError> {
        self.io_structure("input")
    }

    /// The output structure, synthesized empty when the operation returns
    /// none.
    pub fn output(&self) -> Result<StructureShape, GenError> {
        self.io_structure("output")
    }

    fn io_structure(&self, slot: &'static str) -> Result<StructureShape, GenError> {
        let Some(shape_ref) = self.def.get(slot) else {
            return Ok(StructureShape::empty(Rc::clone(&self.index)));
        };
        match self.index.resolve(shape_ref)? {
            Shape::Structure(structure) => Ok(structure),
            other => Err(GenError::NotAStructure {
                operation: self.name.clone(),
                slot,
                kind: other.kind().to_string(),
            }),
        }
    }
}

/// Anything the generator can register a class for.
#[derive(Debug, Clone)]
pub enum Model<'a> {
    Service(&'a Service),
    Shape(Shape),
}
