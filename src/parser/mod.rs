// Parser module for extracting class structure from Python source files

pub mod ast;
mod python;

pub use ast::*;
pub use python::{clean_docstring, path_to_module_name, PythonParser, BANNED_ATTR_NAMES};
