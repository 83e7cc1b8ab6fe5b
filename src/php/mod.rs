//! Typed PHP AST and source emission.

mod ast;
mod emit;

pub use ast::{
    ClassKind, DocBlock, DocTag, PhpClass, PhpConstant, PhpFile, PhpMethod, PhpParam, PhpProperty,
    PhpValue, Visibility,
};
pub use emit::Emit;
