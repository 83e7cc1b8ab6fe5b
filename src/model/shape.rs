//! Shape model: the closed set of type-description nodes in an API document.
//!
//! Shape references (`{"shape": "Foo", ...}`) are resolved shallowly through
//! a per-service [`ShapeIndex`]: the resolved definition is the referenced
//! definition overlaid with the reference's extra keys, carrying the
//! referenced shape's name. Nested references stay by-name, which keeps
//! resolution total on recursive shapes.

use std::rc::Rc;

use serde_json::{Map, Value};

use crate::error::GenError;

/// All shape definitions of one service, keyed by shape name in document
/// order.
#[derive(Debug)]
pub struct ShapeIndex {
    defs: Map<String, Value>,
}

impl ShapeIndex {
    pub fn new(defs: Map<String, Value>) -> Self {
        Self { defs }
    }

    /// Resolve a shape reference value into a [`Shape`].
    pub fn resolve(self: &Rc<Self>, shape_ref: &Value) -> Result<Shape, GenError> {
        let name = shape_ref
            .get("shape")
            .and_then(Value::as_str)
            .ok_or(GenError::NamelessShape)?;

        let target = self
            .defs
            .get(name)
            .ok_or_else(|| GenError::ShapeNotFound { name: name.to_string() })?;

        let mut def = target.as_object().cloned().unwrap_or_default();
        if let Some(extras) = shape_ref.as_object() {
            for (key, value) in extras {
                if key != "shape" {
                    def.insert(key.clone(), value.clone());
                }
            }
        }
        def.insert("name".to_string(), Value::String(name.to_string()));

        Ok(Shape::from_def(name.to_string(), def, Rc::clone(self)))
    }
}

/// A type-description node of the API model.
#[derive(Debug, Clone)]
pub enum Shape {
    Structure(StructureShape),
    List(ListShape),
    Map(MapShape),
    Scalar(ScalarShape),
}

impl Shape {
    fn from_def(name: String, def: Map<String, Value>, index: Rc<ShapeIndex>) -> Self {
        match def.get("type").and_then(Value::as_str).unwrap_or_default() {
            "structure" => Self::Structure(StructureShape { name, def, index }),
            "list" => Self::List(ListShape { name, def, index }),
            "map" => Self::Map(MapShape { name, def, index }),
            _ => Self::Scalar(ScalarShape { name, def }),
        }
    }

    /// The referenced shape's name (empty for synthesized shapes).
    pub fn name(&self) -> &str {
        match self {
            Self::Structure(shape) => &shape.name,
            Self::List(shape) => &shape.name,
            Self::Map(shape) => &shape.name,
            Self::Scalar(shape) => &shape.name,
        }
    }

    /// The one-level-resolved definition, used for structural hashing.
    pub fn def(&self) -> &Map<String, Value> {
        match self {
            Self::Structure(shape) => &shape.def,
            Self::List(shape) => &shape.def,
            Self::Map(shape) => &shape.def,
            Self::Scalar(shape) => &shape.def,
        }
    }

    /// The type tag of the definition, for diagnostics.
    pub fn kind(&self) -> &str {
        match self {
            Self::Structure(_) => "structure",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Scalar(shape) => shape.type_tag(),
        }
    }
}

/// A record-like shape with named members.
#[derive(Debug, Clone)]
pub struct StructureShape {
    name: String,
    def: Map<String, Value>,
    index: Rc<ShapeIndex>,
}

impl StructureShape {
    /// A synthesized zero-member structure, used when an operation has no
    /// input or output reference.
    pub fn empty(index: Rc<ShapeIndex>) -> Self {
        let mut def = Map::new();
        def.insert("type".to_string(), Value::String("structure".to_string()));
        Self {
            name: String::new(),
            def,
            index,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_empty(&self) -> bool {
        self.def
            .get("members")
            .and_then(Value::as_object)
            .is_none_or(Map::is_empty)
    }

    /// Members in declared order, each resolved one level.
    pub fn members(&self) -> Result<Vec<(String, Shape)>, GenError> {
        let Some(members) = self.def.get("members").and_then(Value::as_object) else {
            return Ok(Vec::new());
        };
        let mut resolved = Vec::with_capacity(members.len());
        for (name, shape_ref) in members {
            resolved.push((name.clone(), self.index.resolve(shape_ref)?));
        }
        Ok(resolved)
    }

    pub fn is_required(&self, member: &str) -> bool {
        self.def
            .get("required")
            .and_then(Value::as_array)
            .is_some_and(|required| required.iter().any(|name| name.as_str() == Some(member)))
    }
}

/// An ordered sequence shape with a single element type.
#[derive(Debug, Clone)]
pub struct ListShape {
    name: String,
    def: Map<String, Value>,
    index: Rc<ShapeIndex>,
}

impl ListShape {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The element shape, resolved one level.
    pub fn member(&self) -> Result<Shape, GenError> {
        self.index.resolve(self.def.get("member").unwrap_or(&Value::Null))
    }
}

/// A keyed shape with primitive keys and a single value type.
#[derive(Debug, Clone)]
pub struct MapShape {
    name: String,
    def: Map<String, Value>,
    index: Rc<ShapeIndex>,
}

impl MapShape {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key(&self) -> Result<Shape, GenError> {
        self.index.resolve(self.def.get("key").unwrap_or(&Value::Null))
    }

    pub fn value(&self) -> Result<Shape, GenError> {
        self.index.resolve(self.def.get("value").unwrap_or(&Value::Null))
    }
}

/// A primitive shape (string, integer, boolean, timestamp, blob, ...).
#[derive(Debug, Clone)]
pub struct ScalarShape {
    name: String,
    def: Map<String, Value>,
}

impl ScalarShape {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_tag(&self) -> &str {
        self.def.get("type").and_then(Value::as_str).unwrap_or_default()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn index(json: &str) -> Rc<ShapeIndex> {
        let defs: Map<String, Value> = serde_json::from_str(json).unwrap();
        Rc::new(ShapeIndex::new(defs))
    }

    fn shape_ref(name: &str) -> Value {
        serde_json::json!({ "shape": name })
    }

    #[test]
    fn test_resolve_carries_target_name_and_kind() {
        let index = index(r##"{"Bucket": {"type": "string"}}"##);
        let shape = index.resolve(&shape_ref("Bucket")).unwrap();
        assert_eq!(shape.name(), "Bucket");
        assert!(matches!(shape, Shape::Scalar(_)));
        assert_eq!(shape.kind(), "string");
    }

    #[test]
    fn test_resolve_overlays_reference_extras() {
        let index = index(r##"{"Body": {"type": "blob"}}"##);
        let shape_ref = serde_json::json!({ "shape": "Body", "streaming": true });
        let shape = index.resolve(&shape_ref).unwrap();
        assert_eq!(shape.def().get("streaming"), Some(&Value::Bool(true)));
        assert!(!shape.def().contains_key("shape"));
        assert_eq!(shape.def().get("name"), Some(&Value::String("Body".into())));
    }

    #[test]
    fn test_resolve_unknown_shape_fails() {
        let index = index(r##"{}"##);
        let err = index.resolve(&shape_ref("Missing")).unwrap_err();
        assert!(matches!(err, GenError::ShapeNotFound { .. }));
    }

    #[test]
    fn test_structure_members_keep_declared_order() {
        let index = index(
            r##"{
                "Req": {
                    "type": "structure",
                    "required": ["B"],
                    "members": {"Z": {"shape": "S"}, "B": {"shape": "S"}, "A": {"shape": "S"}}
                },
                "S": {"type": "string"}
            }"##,
        );
        let Shape::Structure(req) = index.resolve(&shape_ref("Req")).unwrap() else {
            panic!("expected structure");
        };
        let names: Vec<String> = req.members().unwrap().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["Z", "B", "A"]);
        assert!(req.is_required("B"));
        assert!(!req.is_required("Z"));
    }

    #[test]
    fn test_recursive_structure_resolves_shallowly() {
        let index = index(
            r##"{
                "Node": {
                    "type": "structure",
                    "members": {"Next": {"shape": "Node"}, "Name": {"shape": "Str"}}
                },
                "Str": {"type": "string"}
            }"##,
        );
        let Shape::Structure(node) = index.resolve(&shape_ref("Node")).unwrap() else {
            panic!("expected structure");
        };
        let members = node.members().unwrap();
        let (_, next) = &members[0];
        // The nested reference stays by-name: one more level resolves fine.
        assert!(matches!(next, Shape::Structure(_)));
    }

    #[test]
    fn test_list_and_map_inner_shapes() {
        let index = index(
            r##"{
                "Names": {"type": "list", "member": {"shape": "Str"}},
                "Tags": {"type": "map", "key": {"shape": "Str"}, "value": {"shape": "Str"}},
                "Str": {"type": "string"}
            }"##,
        );
        let Shape::List(names) = index.resolve(&shape_ref("Names")).unwrap() else {
            panic!("expected list");
        };
        assert_eq!(names.member().unwrap().name(), "Str");

        let Shape::Map(tags) = index.resolve(&shape_ref("Tags")).unwrap() else {
            panic!("expected map");
        };
        assert_eq!(tags.key().unwrap().kind(), "string");
        assert_eq!(tags.value().unwrap().name(), "Str");
    }

    #[test]
    fn test_empty_structure() {
        let index = index(r##"{"Empty": {"type": "structure", "members": {}}}"##);
        let Shape::Structure(empty) = index.resolve(&shape_ref("Empty")).unwrap() else {
            panic!("expected structure");
        };
        assert!(empty.is_empty());
        assert!(StructureShape::empty(index).is_empty());
    }
}
