//! Namespace-level support classes emitted with every run.
//!
//! Generated service classes leave parsing and transport to the aws-sdk and
//! only wrap its array results. These four classes carry the shared plumbing
//! for that: array-backed input storage, output class lookup, result
//! wrapping on the client and element-wrapping iteration.

use crate::php::{
    ClassKind, DocBlock, DocTag, PhpClass, PhpConstant, PhpFile, PhpMethod, PhpParam, PhpProperty,
    PhpValue, Visibility,
};

const DATA_INTERFACES: [&str; 3] = ["\\IteratorAggregate", "\\ArrayAccess", "\\Countable"];

/// Back a class with the aws-sdk array data storage.
pub(crate) fn apply_data_storage(class: &mut PhpClass) {
    if !class.uses.iter().any(|used| used == "\\Aws\\HasDataTrait") {
        class.uses.push("\\Aws\\HasDataTrait".to_string());
    }
    for interface in DATA_INTERFACES {
        class.implement(interface);
    }
}

/// The support classes, in the order they are written.
pub fn common_classes(namespace: &str) -> Vec<PhpFile> {
    vec![
        PhpFile::new(abstract_input(namespace)),
        PhpFile::new(client_trait(namespace)),
        PhpFile::new(create_object_iterator(namespace)),
        PhpFile::new(input_interface(namespace)),
    ]
}

fn input_interface(namespace: &str) -> PhpClass {
    let mut class = PhpClass::new(ClassKind::Interface, namespace, "InputInterface");

    let mut to_array = PhpMethod::new("toArray");
    to_array.doc = Some(DocBlock::from_tags(vec![DocTag::Return(vec![
        "array".to_string(),
    ])]));

    let mut get_output_class = PhpMethod::new("getOutputClass");
    get_output_class.return_type = Some("?string".to_string());
    get_output_class.doc = Some(DocBlock::from_tags(vec![DocTag::Return(vec![
        "string".to_string(),
        "null".to_string(),
    ])]));

    class.methods = vec![to_array, get_output_class];
    class
}

fn abstract_input(namespace: &str) -> PhpClass {
    let mut class = PhpClass::new(ClassKind::AbstractClass, namespace, "AbstractInput");
    class.implement(&format!("\\{namespace}\\InputInterface"));
    apply_data_storage(&mut class);
    class.constants.push(PhpConstant {
        name: "OUTPUT_CLASS".to_string(),
        value: PhpValue::Null,
    });

    let mut get_output_class = PhpMethod::new("getOutputClass");
    get_output_class.return_type = Some("?string".to_string());
    get_output_class.body = Some("return static::OUTPUT_CLASS;".to_string());
    get_output_class.doc = Some(DocBlock::from_tags(vec![DocTag::Return(vec![
        "string".to_string(),
        "null".to_string(),
    ])]));
    class.methods.push(get_output_class);
    class
}

fn client_trait(namespace: &str) -> PhpClass {
    let mut class = PhpClass::new(ClassKind::Trait, namespace, "ClientTrait");

    let mut call = PhpMethod::new("__call");
    call.params = vec![
        PhpParam::new("name", Some("string")),
        PhpParam::new("args", Some("array")),
    ];
    call.doc = Some(DocBlock::from_tags(vec![
        DocTag::Param {
            name: "name".to_string(),
            types: vec!["string".to_string()],
        },
        DocTag::Param {
            name: "args".to_string(),
            types: vec!["array".to_string()],
        },
        DocTag::Return(vec![
            "\\Aws\\Result".to_string(),
            "\\GuzzleHttp\\Promise\\Promise".to_string(),
        ]),
    ]));
    call.body = Some(
        [
            "$outputClass = null;",
            "if (isset($args[0]) && $args[0] instanceof InputInterface) {",
            "    $outputClass = $args[0]->getOutputClass();",
            "    $args[0] = $args[0]->toArray();",
            "}",
            "",
            "$result = parent::__call($name, $args);",
            "",
            "if ($outputClass === null) {",
            "    return $result;",
            "}",
            "",
            "if ($result instanceof \\GuzzleHttp\\Promise\\PromiseInterface) {",
            "    return $result->then(function ($value) use ($outputClass) {",
            "        return new $outputClass($value->toArray());",
            "    });",
            "}",
            "",
            "return new $outputClass($result->toArray());",
        ]
        .join("\n"),
    );
    class.methods.push(call);
    class
}

fn create_object_iterator(namespace: &str) -> PhpClass {
    let mut class = PhpClass::new(ClassKind::Class, namespace, "CreateObjectIterator");
    class.extends = Some("\\IteratorIterator".to_string());
    class.properties.push(PhpProperty {
        name: "cls".to_string(),
        visibility: Visibility::Protected,
        doc: Some(DocBlock::from_tags(vec![DocTag::Var(vec![
            "string".to_string(),
        ])])),
    });

    let mut constructor = PhpMethod::new("__construct");
    constructor.params = vec![
        PhpParam::new("iterator", Some("\\Traversable")),
        PhpParam::new("cls", Some("string")),
    ];
    constructor.body =
        Some("parent::__construct($iterator);\n$this->cls = $cls;".to_string());

    let mut current = PhpMethod::new("current");
    current.return_type = Some("mixed".to_string());
    current.body = Some("return new $this->cls(parent::current());".to_string());
    current.doc = Some(DocBlock::from_tags(vec![DocTag::Return(vec![
        "mixed".to_string(),
    ])]));

    class.methods = vec![constructor, current];
    class
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::php::Emit;

    fn emitted(name: &str) -> String {
        common_classes("App\\AwsGen")
            .into_iter()
            .find(|file| file.class.name == name)
            .map(|file| file.emit())
            .unwrap_or_default()
    }

    #[test]
    fn test_classes_come_in_stable_order() {
        let names: Vec<String> = common_classes("App\\AwsGen")
            .iter()
            .map(|file| file.class.name.clone())
            .collect();
        assert_eq!(
            names,
            ["AbstractInput", "ClientTrait", "CreateObjectIterator", "InputInterface"]
        );
    }

    #[test]
    fn test_input_interface() {
        let code = emitted("InputInterface");
        assert!(code.contains("namespace App\\AwsGen;"));
        assert!(code.contains("interface InputInterface\n{"));
        assert!(code.contains("    public function toArray();\n"));
        assert!(code.contains("    public function getOutputClass(): ?string;\n"));
    }

    #[test]
    fn test_abstract_input_storage_and_constant() {
        let code = emitted("AbstractInput");
        assert!(code.contains(
            "abstract class AbstractInput implements \\App\\AwsGen\\InputInterface, \\IteratorAggregate, \\ArrayAccess, \\Countable"
        ));
        assert!(code.contains("    use \\Aws\\HasDataTrait;\n"));
        assert!(code.contains("    const OUTPUT_CLASS = null;\n"));
        assert!(code.contains("return static::OUTPUT_CLASS;"));
    }

    #[test]
    fn test_client_trait_wraps_results_and_promises() {
        let code = emitted("ClientTrait");
        assert!(code.contains("trait ClientTrait\n{"));
        assert!(code.contains("$args[0] instanceof InputInterface"));
        assert!(code.contains("$outputClass = $args[0]->getOutputClass();"));
        assert!(code.contains("$result = parent::__call($name, $args);"));
        assert!(code.contains("$result instanceof \\GuzzleHttp\\Promise\\PromiseInterface"));
        assert!(code.contains("return new $outputClass($value->toArray());"));
        assert!(code.contains("return new $outputClass($result->toArray());"));
    }

    #[test]
    fn test_create_object_iterator() {
        let code = emitted("CreateObjectIterator");
        assert!(code.contains("class CreateObjectIterator extends \\IteratorIterator\n{"));
        assert!(code.contains("    protected $cls;\n"));
        assert!(code.contains("parent::__construct($iterator);"));
        assert!(code.contains("return new $this->cls(parent::current());"));
    }

    #[test]
    fn test_data_storage_does_not_duplicate() {
        let mut class = PhpClass::new(ClassKind::Class, "App", "Names");
        class.implement("\\IteratorAggregate");
        apply_data_storage(&mut class);
        apply_data_storage(&mut class);
        assert_eq!(class.uses.len(), 1);
        assert_eq!(
            class.implements,
            ["\\IteratorAggregate", "\\ArrayAccess", "\\Countable"]
        );
    }
}
