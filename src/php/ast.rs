//! PHP AST types for class generation.
//!
//! One builder struct per construct: file, class, method, parameter,
//! property, constant and docblock. The generator assembles these nodes and
//! the emit module renders them.

/// A single generated file holding one class-like declaration.
#[derive(Debug, Clone)]
pub struct PhpFile {
    pub class: PhpClass,
}

impl PhpFile {
    pub fn new(class: PhpClass) -> Self {
        Self { class }
    }

    /// Relative output path: `App\AwsGen\S3` + `Bucket` -> `App/AwsGen/S3/Bucket.php`.
    pub fn path(&self) -> String {
        format!(
            "{}/{}.php",
            self.class.namespace.replace('\\', "/"),
            self.class.name
        )
    }
}

/// The declaration keyword of a class-like construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    Class,
    AbstractClass,
    Interface,
    Trait,
}

/// A class, interface or trait declaration.
#[derive(Debug, Clone)]
pub struct PhpClass {
    pub kind: ClassKind,
    pub name: String,
    /// Namespace without leading backslash: `App\AwsGen\S3`.
    pub namespace: String,
    pub doc: Option<DocBlock>,
    /// Fully qualified parent class, with leading backslash.
    pub extends: Option<String>,
    pub implements: Vec<String>,
    /// Fully qualified traits pulled in with `use`.
    pub uses: Vec<String>,
    pub constants: Vec<PhpConstant>,
    pub properties: Vec<PhpProperty>,
    pub methods: Vec<PhpMethod>,
}

impl PhpClass {
    pub fn new(kind: ClassKind, namespace: &str, name: &str) -> Self {
        Self {
            kind,
            name: name.to_string(),
            namespace: namespace.to_string(),
            doc: None,
            extends: None,
            implements: Vec::new(),
            uses: Vec::new(),
            constants: Vec::new(),
            properties: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Add an interface unless it is already implemented.
    pub fn implement(&mut self, interface: &str) {
        if !self.implements.iter().any(|existing| existing == interface) {
            self.implements.push(interface.to_string());
        }
    }
}

/// A method declaration. Interface methods carry no body.
#[derive(Debug, Clone)]
pub struct PhpMethod {
    pub name: String,
    pub is_static: bool,
    pub params: Vec<PhpParam>,
    /// Declared return type: `?string`, `array`, `\App\AwsGen\S3\Owner`.
    pub return_type: Option<String>,
    /// Statement lines, without indentation. `None` emits a signature only.
    pub body: Option<String>,
    pub doc: Option<DocBlock>,
}

impl PhpMethod {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            is_static: false,
            params: Vec::new(),
            return_type: None,
            body: None,
            doc: None,
        }
    }
}

/// A method parameter, name without the `$` sigil.
#[derive(Debug, Clone)]
pub struct PhpParam {
    pub name: String,
    pub ty: Option<String>,
    /// Default value as literal source text, e.g. `[]`.
    pub default: Option<String>,
}

impl PhpParam {
    pub fn new(name: &str, ty: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            ty: ty.map(str::to_string),
            default: None,
        }
    }
}

/// A class constant.
#[derive(Debug, Clone)]
pub struct PhpConstant {
    pub name: String,
    pub value: PhpValue,
}

/// Literal values appearing in constants.
#[derive(Debug, Clone)]
pub enum PhpValue {
    Null,
    Str(String),
}

/// Member visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

/// A property declaration, name without the `$` sigil.
#[derive(Debug, Clone)]
pub struct PhpProperty {
    pub name: String,
    pub visibility: Visibility,
    pub doc: Option<DocBlock>,
}

/// A docblock: free-form summary lines followed by tags.
#[derive(Debug, Clone, Default)]
pub struct DocBlock {
    pub lines: Vec<String>,
    pub tags: Vec<DocTag>,
}

impl DocBlock {
    pub fn from_tags(tags: Vec<DocTag>) -> Self {
        Self {
            lines: Vec::new(),
            tags,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.tags.is_empty()
    }
}

/// The docblock tags the generator emits.
#[derive(Debug, Clone)]
pub enum DocTag {
    /// `@param string|null $name`
    Param { name: String, types: Vec<String> },
    /// `@return static`
    Return(Vec<String>),
    /// `@var array`
    Var(Vec<String>),
    /// `@method \Aws\Result createBucket(array $input = [])`
    Method(String),
}
