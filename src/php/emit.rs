//! PHP code emission via the Emit trait.
//!
//! Each AST node renders itself to source text. Class members come out
//! indented one level, method bodies two, with one blank line between
//! members.

use super::ast::{
    ClassKind, DocBlock, DocTag, PhpClass, PhpConstant, PhpFile, PhpMethod, PhpParam, PhpProperty,
    PhpValue, Visibility,
};

const INDENT: &str = "    ";

/// Trait for emitting PHP source from AST nodes.
pub trait Emit {
    fn emit(&self) -> String;
}

impl Emit for PhpFile {
    fn emit(&self) -> String {
        format!(
            "<?php\n\nnamespace {};\n\n{}",
            self.class.namespace,
            self.class.emit()
        )
    }
}

impl Emit for PhpClass {
    fn emit(&self) -> String {
        let mut out = String::new();
        if let Some(doc) = &self.doc {
            if !doc.is_empty() {
                out.push_str(&doc.emit_indented(0));
            }
        }

        let keyword = match self.kind {
            ClassKind::Class => "class",
            ClassKind::AbstractClass => "abstract class",
            ClassKind::Interface => "interface",
            ClassKind::Trait => "trait",
        };
        out.push_str(keyword);
        out.push(' ');
        out.push_str(&self.name);
        if let Some(extends) = &self.extends {
            out.push_str(" extends ");
            out.push_str(extends);
        }
        if !self.implements.is_empty() {
            out.push_str(" implements ");
            out.push_str(&self.implements.join(", "));
        }
        out.push_str("\n{\n");

        let mut members: Vec<String> = Vec::new();
        if !self.uses.is_empty() {
            let uses: String = self
                .uses
                .iter()
                .map(|name| format!("{INDENT}use {name};\n"))
                .collect();
            members.push(uses);
        }
        members.extend(self.constants.iter().map(Emit::emit));
        members.extend(self.properties.iter().map(Emit::emit));
        members.extend(self.methods.iter().map(Emit::emit));
        out.push_str(&members.join("\n"));

        out.push_str("}\n");
        out
    }
}

impl Emit for PhpConstant {
    fn emit(&self) -> String {
        format!("{INDENT}const {} = {};\n", self.name, self.value.emit())
    }
}

impl Emit for PhpValue {
    fn emit(&self) -> String {
        match self {
            PhpValue::Null => "null".to_string(),
            PhpValue::Str(value) => {
                let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
                format!("'{escaped}'")
            }
        }
    }
}

impl Emit for Visibility {
    fn emit(&self) -> String {
        match self {
            Visibility::Public => "public".to_string(),
            Visibility::Protected => "protected".to_string(),
            Visibility::Private => "private".to_string(),
        }
    }
}

impl Emit for PhpProperty {
    fn emit(&self) -> String {
        let mut out = String::new();
        if let Some(doc) = &self.doc {
            out.push_str(&doc.emit_indented(1));
        }
        out.push_str(&format!(
            "{INDENT}{} ${};\n",
            self.visibility.emit(),
            self.name
        ));
        out
    }
}

impl Emit for PhpMethod {
    fn emit(&self) -> String {
        let mut out = String::new();
        if let Some(doc) = &self.doc {
            out.push_str(&doc.emit_indented(1));
        }
        let modifier = if self.is_static { "static " } else { "" };
        let params: Vec<String> = self.params.iter().map(Emit::emit).collect();
        let return_type = self
            .return_type
            .as_ref()
            .map(|ty| format!(": {ty}"))
            .unwrap_or_default();
        let signature = format!(
            "{INDENT}public {modifier}function {}({}){return_type}",
            self.name,
            params.join(", ")
        );

        match &self.body {
            None => {
                out.push_str(&signature);
                out.push_str(";\n");
            }
            Some(body) => {
                out.push_str(&signature);
                out.push_str(&format!("\n{INDENT}{{\n"));
                for line in body.lines() {
                    if line.is_empty() {
                        out.push('\n');
                    } else {
                        out.push_str(&format!("{INDENT}{INDENT}{line}\n"));
                    }
                }
                out.push_str(&format!("{INDENT}}}\n"));
            }
        }
        out
    }
}

impl Emit for PhpParam {
    fn emit(&self) -> String {
        let mut out = String::new();
        if let Some(ty) = &self.ty {
            out.push_str(ty);
            out.push(' ');
        }
        out.push('$');
        out.push_str(&self.name);
        if let Some(default) = &self.default {
            out.push_str(" = ");
            out.push_str(default);
        }
        out
    }
}

impl DocBlock {
    /// Emit at the given indentation level (4 spaces per level).
    pub fn emit_indented(&self, indent: usize) -> String {
        let prefix = INDENT.repeat(indent);
        let mut out = format!("{prefix}/**\n");
        for line in &self.lines {
            if line.is_empty() {
                out.push_str(&format!("{prefix} *\n"));
            } else {
                out.push_str(&format!("{prefix} * {line}\n"));
            }
        }
        if !self.lines.is_empty() && !self.tags.is_empty() {
            out.push_str(&format!("{prefix} *\n"));
        }
        for tag in &self.tags {
            out.push_str(&format!("{prefix} * {}\n", tag.emit()));
        }
        out.push_str(&format!("{prefix} */\n"));
        out
    }
}

impl Emit for DocTag {
    fn emit(&self) -> String {
        match self {
            DocTag::Param { name, types } => format!("@param {} ${name}", types.join("|")),
            DocTag::Return(types) => format!("@return {}", types.join("|")),
            DocTag::Var(types) => format!("@var {}", types.join("|")),
            DocTag::Method(signature) => format!("@method {signature}"),
        }
    }
}
