//! Per-service traversal and class mapping.
//!
//! One generator instance walks a service's operations depth-first,
//! registering every class-producing shape in the context, then maps each
//! registration to a PHP class: client, operation input, operation output
//! or plain data class.

use std::fmt;

use tracing::debug;

use crate::error::GenError;
use crate::generator::common::apply_data_storage;
use crate::generator::context::Context;
use crate::generator::names::{capitalize_first, lower_first, NameResolver};
use crate::model::{ListShape, MapShape, Model, Operation, Service, Shape, StructureShape};
use crate::php::{
    ClassKind, DocBlock, DocTag, PhpClass, PhpConstant, PhpFile, PhpMethod, PhpParam, PhpValue,
};

/// Which accessors a class exposes for its members.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AccessorStyle {
    /// Fluent bare-name setters only.
    Input,
    /// Bare-name getters only.
    Output,
    /// `get`/`set` prefixed pairs.
    Data,
}

type OperationFilter<'a> = dyn Fn(&Operation) -> bool + 'a;

/// Generates the classes of one service.
pub struct ServiceGenerator<'a> {
    namespace: String,
    service: &'a Service,
    names: NameResolver,
    context: Context<'a>,
    filter: Option<Box<OperationFilter<'a>>>,
}

impl fmt::Debug for ServiceGenerator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceGenerator")
            .field("namespace", &self.namespace)
            .field("filtered", &self.filter.is_some())
            .finish_non_exhaustive()
    }
}

impl<'a> ServiceGenerator<'a> {
    pub fn new(namespace: &str, service: &'a Service) -> Self {
        Self {
            namespace: namespace.trim_matches('\\').to_string(),
            service,
            names: NameResolver::new(),
            context: Context::new(),
            filter: None,
        }
    }

    /// Limit traversal to operations the predicate accepts. The client
    /// docblock still lists every operation.
    pub fn set_filter(&mut self, filter: impl Fn(&Operation) -> bool + 'a) {
        self.filter = Some(Box::new(filter));
    }

    /// Walk the service and map every registered model to a class.
    pub fn run(&mut self) -> Result<Vec<PhpFile>, GenError> {
        self.names = NameResolver::new();
        self.context = Context::new();
        self.visit_service()?;

        let entries: Vec<(String, Model<'a>, Option<Operation>)> = self
            .context
            .hashes()
            .iter()
            .filter_map(|hash| {
                let model = self.context.model(hash)?.clone();
                let operation = self.context.operation(hash).cloned();
                Some((hash.clone(), model, operation))
            })
            .collect();

        let mut files = Vec::with_capacity(entries.len());
        for (hash, model, operation) in entries {
            files.push(self.class_for(&hash, model, operation)?);
        }
        Ok(files)
    }

    fn visit_service(&mut self) -> Result<(), GenError> {
        debug!(
            service = self.service.metadata("namespace").unwrap_or_default(),
            "visiting service"
        );
        self.context.register(Model::Service(self.service), None)?;
        for operation in self.service.operations() {
            self.visit_operation(&operation)?;
        }
        Ok(())
    }

    fn visit_operation(&mut self, operation: &Operation) -> Result<(), GenError> {
        if let Some(filter) = &self.filter {
            if !filter(operation) {
                debug!(operation = operation.name(), "filtered out");
                return Ok(());
            }
        }
        debug!(operation = operation.name(), "visiting operation");
        let input = Shape::Structure(operation.input()?);
        self.visit_shape(&input, operation, 1)?;
        let output = Shape::Structure(operation.output()?);
        self.visit_shape(&output, operation, 1)?;
        Ok(())
    }

    fn visit_shape(
        &mut self,
        shape: &Shape,
        operation: &Operation,
        depth: usize,
    ) -> Result<(), GenError> {
        match shape {
            Shape::Structure(structure) => {
                if structure.is_empty() {
                    debug!(shape = shape.name(), depth, "skipping empty structure");
                    return Ok(());
                }
                if self.context.register(Model::Shape(shape.clone()), Some(operation))? {
                    debug!(shape = shape.name(), depth, "already registered");
                    return Ok(());
                }
                for (_, member) in structure.members()? {
                    self.visit_shape(&member, operation, depth + 1)?;
                }
            }
            Shape::List(list) => {
                if self.context.register(Model::Shape(shape.clone()), Some(operation))? {
                    debug!(shape = shape.name(), depth, "already registered");
                    return Ok(());
                }
                self.visit_shape(&list.member()?, operation, depth + 1)?;
            }
            Shape::Map(map) => {
                if self.context.register(Model::Shape(shape.clone()), Some(operation))? {
                    debug!(shape = shape.name(), depth, "already registered");
                    return Ok(());
                }
                self.visit_shape(&map.value()?, operation, depth + 1)?;
            }
            Shape::Scalar(_) => {
                debug!(shape = shape.name(), kind = shape.kind(), depth, "scalar, no class");
            }
        }
        Ok(())
    }

    fn class_for(
        &mut self,
        hash: &str,
        model: Model<'a>,
        operation: Option<Operation>,
    ) -> Result<PhpFile, GenError> {
        let class = match model {
            Model::Service(service) => self.client_class(service)?,
            Model::Shape(shape) => {
                let mut class = None;
                if let Some(operation) = &operation {
                    let input = operation.input()?;
                    if Context::hash(&Model::Shape(Shape::Structure(input.clone())))? == hash {
                        class = Some(self.input_class(&input, operation)?);
                    } else {
                        let output = operation.output()?;
                        if Context::hash(&Model::Shape(Shape::Structure(output.clone())))? == hash {
                            class = Some(self.output_class(&output)?);
                        }
                    }
                }
                match class {
                    Some(class) => class,
                    None => self.data_class(&shape)?,
                }
            }
        };
        Ok(PhpFile::new(class))
    }

    fn client_class(&mut self, service: &'a Service) -> Result<PhpClass, GenError> {
        let name = self.names.resolve_service(service)?;
        let mut tags = Vec::new();
        for operation in service.operations() {
            let method = lower_first(operation.name());
            let input = operation.input()?;
            let mut inputs = vec!["array".to_string()];
            if !input.is_empty() {
                inputs.push(self.structure_fqcn(&input)?);
            }
            let inputs = inputs.join("|");
            let output = operation.output()?;
            let returns = if output.is_empty() {
                "\\Aws\\Result".to_string()
            } else {
                self.structure_fqcn(&output)?
            };
            tags.push(DocTag::Method(format!("{returns} {method}({inputs} $input = [])")));
            tags.push(DocTag::Method(format!(
                "\\GuzzleHttp\\Promise\\Promise {method}Async({inputs} $input = [])"
            )));
        }

        let mut class = PhpClass::new(
            ClassKind::Class,
            &self.service_namespace()?,
            &format!("{name}Client"),
        );
        class.doc = Some(DocBlock::from_tags(tags));
        class.extends = Some(format!("\\Aws\\{name}\\{name}Client"));
        class.uses.push(format!("\\{}\\ClientTrait", self.namespace));
        Ok(class)
    }

    fn input_class(
        &mut self,
        input: &StructureShape,
        operation: &Operation,
    ) -> Result<PhpClass, GenError> {
        let shape = Shape::Structure(input.clone());
        let mut class = self.shape_class(&shape, AccessorStyle::Input)?;
        class.extends = Some(format!("\\{}\\AbstractInput", self.namespace));

        let output = operation.output()?;
        if !output.is_empty() {
            class.constants.push(PhpConstant {
                name: "OUTPUT_CLASS".to_string(),
                value: PhpValue::Str(self.structure_fqcn(&output)?),
            });
        }

        let mut create = PhpMethod::new("create");
        create.is_static = true;
        let mut tags = Vec::new();
        let mut calls = String::from("return (new static())");
        for (member_name, member) in input.members()? {
            if !input.is_required(&member_name) {
                continue;
            }
            let ty = self.member_value_type(&member, true)?;
            tags.push(DocTag::Param {
                name: member_name.clone(),
                types: vec![ty.clone()],
            });
            calls.push_str(&format!("->{}(${member_name})", accessor_base(&member_name)));
            create.params.push(PhpParam::new(&member_name, Some(&ty)));
        }
        calls.push(';');
        tags.push(DocTag::Return(vec!["static".to_string()]));
        create.doc = Some(DocBlock::from_tags(tags));
        create.body = Some(calls);
        class.methods.insert(0, create);
        Ok(class)
    }

    fn output_class(&mut self, output: &StructureShape) -> Result<PhpClass, GenError> {
        let shape = Shape::Structure(output.clone());
        let mut class = self.shape_class(&shape, AccessorStyle::Output)?;
        class.extends = Some("\\Aws\\Result".to_string());
        Ok(class)
    }

    fn data_class(&mut self, shape: &Shape) -> Result<PhpClass, GenError> {
        let mut class = self.shape_class(shape, AccessorStyle::Data)?;
        apply_data_storage(&mut class);
        Ok(class)
    }

    fn shape_class(&mut self, shape: &Shape, style: AccessorStyle) -> Result<PhpClass, GenError> {
        let name = self.names.resolve_shape(shape)?;
        let mut class = PhpClass::new(ClassKind::Class, &self.service_namespace()?, &name);
        match shape {
            Shape::Structure(structure) => {
                for (member_name, member) in structure.members()? {
                    let required = structure.is_required(&member_name);
                    self.apply_member(&mut class, &member_name, &member, required, style)?;
                }
            }
            Shape::List(list) => self.apply_list(&mut class, list)?,
            Shape::Map(map) => self.apply_map(&mut class, map)?,
            Shape::Scalar(_) => {
                return Err(GenError::UnmappableShape {
                    name: shape.name().to_string(),
                });
            }
        }
        Ok(class)
    }

    /// One member becomes a getter, a setter or both, depending on the
    /// accessor style. Bodies always index the raw member name.
    fn apply_member(
        &mut self,
        class: &mut PhpClass,
        member_name: &str,
        member: &Shape,
        required: bool,
        style: AccessorStyle,
    ) -> Result<(), GenError> {
        let value_type = self.member_value_type(member, required)?;
        let doc_types = self.member_doc_types(member, required)?;
        let get_body = self.member_get_body(member, member_name)?;
        let set_body = format!("$this['{member_name}'] = $value;\nreturn $this;");
        let accessor = accessor_base(member_name);

        match style {
            AccessorStyle::Input => {
                class
                    .methods
                    .push(setter(&accessor, &value_type, &doc_types, &set_body));
            }
            AccessorStyle::Output => {
                class
                    .methods
                    .push(getter(&accessor, &value_type, &doc_types, &get_body));
            }
            AccessorStyle::Data => {
                let suffix = capitalize_first(&accessor);
                class
                    .methods
                    .push(getter(&format!("get{suffix}"), &value_type, &doc_types, &get_body));
                class
                    .methods
                    .push(setter(&format!("set{suffix}"), &value_type, &doc_types, &set_body));
            }
        }
        Ok(())
    }

    /// The declared accessor type of a member.
    fn member_value_type(&mut self, member: &Shape, required: bool) -> Result<String, GenError> {
        match member {
            Shape::Structure(structure) if !structure.is_empty() => {
                let fqcn = self.shape_fqcn(member)?;
                Ok(nullable_unless(required, fqcn))
            }
            Shape::Structure(_) => Ok("array".to_string()),
            Shape::List(list) => self.collection_value_type(member, &list.member()?),
            Shape::Map(map) => self.collection_value_type(member, &map.value()?),
            Shape::Scalar(_) => Ok(nullable_unless(required, php_type(member)?)),
        }
    }

    fn collection_value_type(
        &mut self,
        collection: &Shape,
        element: &Shape,
    ) -> Result<String, GenError> {
        if is_primitive_like(element) {
            Ok("array".to_string())
        } else {
            self.shape_fqcn(collection)
        }
    }

    fn member_doc_types(&mut self, member: &Shape, required: bool) -> Result<Vec<String>, GenError> {
        match member {
            Shape::Structure(structure) if !structure.is_empty() => {
                let fqcn = self.shape_fqcn(member)?;
                Ok(if required {
                    vec![fqcn]
                } else {
                    vec!["null".to_string(), fqcn]
                })
            }
            Shape::Structure(_) => Ok(vec!["array".to_string()]),
            Shape::List(list) => self.collection_doc_types(member, &list.member()?),
            Shape::Map(map) => self.collection_doc_types(member, &map.value()?),
            Shape::Scalar(_) => {
                let ty = php_type(member)?;
                Ok(if required {
                    vec![ty]
                } else {
                    vec!["null".to_string(), ty]
                })
            }
        }
    }

    fn collection_doc_types(
        &mut self,
        collection: &Shape,
        element: &Shape,
    ) -> Result<Vec<String>, GenError> {
        match element {
            Shape::Scalar(_) => Ok(vec![format!("{}[]", php_type(element)?)]),
            _ if is_primitive_like(element) => Ok(vec!["array".to_string()]),
            _ => Ok(vec![
                "array".to_string(),
                self.shape_fqcn(collection)?,
                format!("{}[]", self.shape_fqcn(element)?),
            ]),
        }
    }

    fn member_get_body(&mut self, member: &Shape, member_name: &str) -> Result<String, GenError> {
        match member {
            Shape::Structure(structure) if !structure.is_empty() => {
                let fqcn = self.shape_fqcn(member)?;
                Ok(format!(
                    "return $this['{member_name}'] ? new {fqcn}($this['{member_name}']) : null;"
                ))
            }
            Shape::List(list) if !is_primitive_like(&list.member()?) => {
                let fqcn = self.shape_fqcn(member)?;
                Ok(format!("return new {fqcn}($this['{member_name}'] ?? []);"))
            }
            Shape::Map(map) if !is_primitive_like(&map.value()?) => {
                let fqcn = self.shape_fqcn(member)?;
                Ok(format!("return new {fqcn}($this['{member_name}'] ?? []);"))
            }
            _ => Ok(format!("return $this['{member_name}'];")),
        }
    }

    fn apply_list(&mut self, class: &mut PhpClass, list: &ListShape) -> Result<(), GenError> {
        let element = list.member()?;
        let mut get_iterator = PhpMethod::new("getIterator");
        get_iterator.return_type = Some("\\Traversable".to_string());
        let mut add = PhpMethod::new("add");

        if is_primitive_like(&element) {
            get_iterator.body = Some("return new \\ArrayIterator($this->data);".to_string());
            get_iterator.doc = Some(DocBlock::from_tags(vec![DocTag::Return(vec![
                "\\ArrayIterator".to_string(),
            ])]));
            let value_types = element_value_types(&element)?;
            add.params.push(PhpParam {
                name: "value".to_string(),
                ty: value_types.declared,
                default: None,
            });
            add.doc = Some(DocBlock::from_tags(vec![
                DocTag::Param {
                    name: "value".to_string(),
                    types: value_types.doc,
                },
                DocTag::Return(vec!["static".to_string()]),
            ]));
            add.body = Some("$this->data[] = $value;\nreturn $this;".to_string());
        } else {
            let element_fqcn = self.shape_fqcn(&element)?;
            let iterator_fqcn = format!("\\{}\\CreateObjectIterator", self.namespace);
            get_iterator.body = Some(format!(
                "return new {iterator_fqcn}(new \\ArrayIterator($this->data), {element_fqcn}::class);"
            ));
            get_iterator.doc = Some(DocBlock::from_tags(vec![DocTag::Return(vec![
                iterator_fqcn,
            ])]));
            add.params.push(PhpParam::new("value", Some(&element_fqcn)));
            add.doc = Some(DocBlock::from_tags(vec![
                DocTag::Param {
                    name: "value".to_string(),
                    types: vec![element_fqcn],
                },
                DocTag::Return(vec!["static".to_string()]),
            ]));
            add.body = Some("$this->data[] = $value->toArray();\nreturn $this;".to_string());
        }

        class.methods.push(get_iterator);
        class.methods.push(add);
        Ok(())
    }

    fn apply_map(&mut self, class: &mut PhpClass, map: &MapShape) -> Result<(), GenError> {
        let key_type = php_type(&map.key()?)?;
        let element = map.value()?;
        let mut get_iterator = PhpMethod::new("getIterator");
        get_iterator.return_type = Some("\\Traversable".to_string());
        let mut add = PhpMethod::new("add");
        add.params.push(PhpParam::new("key", Some(&key_type)));

        if is_primitive_like(&element) {
            get_iterator.body = Some("return new \\ArrayIterator($this->data);".to_string());
            get_iterator.doc = Some(DocBlock::from_tags(vec![DocTag::Return(vec![
                "\\ArrayIterator".to_string(),
            ])]));
            let value_types = element_value_types(&element)?;
            add.params.push(PhpParam {
                name: "value".to_string(),
                ty: value_types.declared,
                default: None,
            });
            add.doc = Some(DocBlock::from_tags(vec![
                DocTag::Param {
                    name: "key".to_string(),
                    types: vec![key_type],
                },
                DocTag::Param {
                    name: "value".to_string(),
                    types: value_types.doc,
                },
                DocTag::Return(vec!["static".to_string()]),
            ]));
            add.body = Some("$this->data[$key] = $value;\nreturn $this;".to_string());
        } else {
            let element_fqcn = self.shape_fqcn(&element)?;
            let iterator_fqcn = format!("\\{}\\CreateObjectIterator", self.namespace);
            get_iterator.body = Some(format!(
                "return new {iterator_fqcn}(new \\ArrayIterator($this->data), {element_fqcn}::class);"
            ));
            get_iterator.doc = Some(DocBlock::from_tags(vec![DocTag::Return(vec![
                iterator_fqcn,
            ])]));
            add.params.push(PhpParam::new("value", Some(&element_fqcn)));
            add.doc = Some(DocBlock::from_tags(vec![
                DocTag::Param {
                    name: "key".to_string(),
                    types: vec![key_type],
                },
                DocTag::Param {
                    name: "value".to_string(),
                    types: vec![element_fqcn],
                },
                DocTag::Return(vec!["static".to_string()]),
            ]));
            add.body = Some("$this->data[$key] = $value->toArray();\nreturn $this;".to_string());
        }

        class.methods.push(get_iterator);
        class.methods.push(add);
        Ok(())
    }

    fn service_namespace(&mut self) -> Result<String, GenError> {
        let service_name = self.names.resolve_service(self.service)?;
        Ok(format!("{}\\{}", self.namespace, service_name))
    }

    fn shape_fqcn(&mut self, shape: &Shape) -> Result<String, GenError> {
        let name = self.names.resolve_shape(shape)?;
        Ok(format!("\\{}\\{}", self.service_namespace()?, name))
    }

    fn structure_fqcn(&mut self, structure: &StructureShape) -> Result<String, GenError> {
        self.shape_fqcn(&Shape::Structure(structure.clone()))
    }
}

struct ElementValueTypes {
    declared: Option<String>,
    doc: Vec<String>,
}

/// Parameter typing for primitive-like collection elements. Zero-member
/// structure elements stay untyped raw arrays.
fn element_value_types(element: &Shape) -> Result<ElementValueTypes, GenError> {
    match element {
        Shape::Scalar(_) => {
            let ty = php_type(element)?;
            Ok(ElementValueTypes {
                declared: Some(ty.clone()),
                doc: vec![ty],
            })
        }
        _ => Ok(ElementValueTypes {
            declared: None,
            doc: vec!["array".to_string()],
        }),
    }
}

fn getter(name: &str, return_type: &str, doc_types: &[String], body: &str) -> PhpMethod {
    let mut method = PhpMethod::new(name);
    method.return_type = Some(return_type.to_string());
    method.doc = Some(DocBlock::from_tags(vec![DocTag::Return(doc_types.to_vec())]));
    method.body = Some(body.to_string());
    method
}

fn setter(name: &str, value_type: &str, doc_types: &[String], body: &str) -> PhpMethod {
    let mut method = PhpMethod::new(name);
    method.params.push(PhpParam::new("value", Some(value_type)));
    method.doc = Some(DocBlock::from_tags(vec![
        DocTag::Var(doc_types.to_vec()),
        DocTag::Return(vec!["static".to_string()]),
    ]));
    method.body = Some(body.to_string());
    method
}

/// Method base name for a member. `Countable::count()` is reserved on every
/// data-holding class, so a member of that name gets a suffix.
fn accessor_base(member_name: &str) -> String {
    if member_name.eq_ignore_ascii_case("count") {
        format!("{member_name}_")
    } else {
        member_name.to_string()
    }
}

fn nullable_unless(required: bool, ty: String) -> String {
    if required {
        ty
    } else {
        format!("?{ty}")
    }
}

fn is_primitive_like(shape: &Shape) -> bool {
    match shape {
        Shape::Scalar(_) => true,
        Shape::Structure(structure) => structure.is_empty(),
        Shape::List(_) | Shape::Map(_) => false,
    }
}

/// The PHP type a scalar shape maps to.
fn php_type(shape: &Shape) -> Result<String, GenError> {
    let tag = shape.kind();
    let ty = match tag {
        "string" | "blob" => "string",
        "timestamp" => "\\DateTime",
        "integer" => "int",
        "long" | "double" | "float" => "float",
        "boolean" => "bool",
        _ => {
            return Err(GenError::UnexpectedPhpType {
                tag: tag.to_string(),
            });
        }
    };
    Ok(ty.to_string())
}
