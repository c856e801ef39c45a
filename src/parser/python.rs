// Python parser using tree-sitter

use crate::error::{Error, Result};
use crate::parser::ast::*;
use std::path::{Path, PathBuf};
use tree_sitter::{Node, Parser};

/// Attribute names that never describe a class's own configuration
pub const BANNED_ATTR_NAMES: &[&str] = &[
    "__all__",
    "__builtins__",
    "__class__",
    "__dict__",
    "__doc__",
    "__file__",
    "__module__",
    "__name__",
    "__package__",
    "__path__",
    "__spec__",
    "__weakref__",
];

/// Parser for Python source files
pub struct PythonParser {
    parser: Parser,
}

impl PythonParser {
    /// Create a new Python parser
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        let language = tree_sitter_python::language();
        parser
            .set_language(&language)
            .map_err(|e| Error::Parser(format!("Failed to set Python language: {}", e)))?;
        Ok(Self { parser })
    }

    /// Parse a Python file, naming it relative to `root`
    pub fn parse_file(&mut self, path: &Path, root: &Path) -> Result<ParsedFile> {
        let bytes = std::fs::read(path).map_err(|e| Error::parse(path, e.to_string()))?;
        let source = String::from_utf8_lossy(&bytes);

        let relative = path.strip_prefix(root).unwrap_or(path).to_path_buf();
        let module_name = path_to_module_name(&relative);
        self.parse_source(&source, relative, module_name)
    }

    /// Parse Python source code
    pub fn parse_source(
        &mut self,
        source: &str,
        path: PathBuf,
        module_name: String,
    ) -> Result<ParsedFile> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| Error::parse(&path, "tree-sitter produced no tree"))?;

        let root = tree.root_node();
        let bytes = source.as_bytes();
        let lines: Vec<&str> = source.lines().collect();
        let mut file = ParsedFile::new(path, module_name);

        file.docstring = leading_docstring(&root, bytes);

        let mut cursor = root.walk();
        for child in root.children(&mut cursor) {
            match child.kind() {
                "import_statement" => file.imports.extend(parse_import(&child, bytes)),
                "import_from_statement" => file.imports.extend(parse_import_from(&child, bytes)),
                "class_definition" | "decorated_definition" => {
                    if let Some(class) = parse_class(&child, bytes, &lines) {
                        file.classes.push(class);
                    }
                }
                _ => {}
            }
        }

        Ok(file)
    }
}

/// Convert a path relative to the source root into a dotted module name
pub fn path_to_module_name(relative: &Path) -> String {
    let mut parts: Vec<String> = relative
        .iter()
        .map(|s| s.to_string_lossy().to_string())
        .collect();

    if let Some(last) = parts.last_mut() {
        if let Some(stem) = last.strip_suffix(".py") {
            *last = stem.to_string();
        }
    }

    if parts.len() > 1 && parts.last().map(String::as_str) == Some("__init__") {
        parts.pop();
    }

    parts.join(".")
}

/// First string statement of a module or block body
fn leading_docstring(body: &Node, source: &[u8]) -> Option<String> {
    let mut cursor = body.walk();
    for child in body.children(&mut cursor) {
        match child.kind() {
            "comment" => continue,
            "expression_statement" => {
                let first = child.named_child(0)?;
                if first.kind() == "string" {
                    return string_literal_content(&first, source).map(|s| clean_docstring(&s));
                }
                return None;
            }
            _ => return None,
        }
    }
    None
}

/// Strip prefix and quotes from a string literal
fn string_literal_content(node: &Node, source: &[u8]) -> Option<String> {
    let text = node.utf8_text(source).ok()?;
    let text = text.trim_start_matches(|c: char| "rRuUbBfF".contains(c));

    let inner = ["\"\"\"", "'''", "\"", "'"].iter().find_map(|quote| {
        text.strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
    })?;
    Some(inner.to_string())
}

/// Normalise docstring indentation the way Python's `inspect.cleandoc` does
pub fn clean_docstring(raw: &str) -> String {
    let expanded = raw.replace('\t', "        ");
    let mut lines: Vec<&str> = expanded.lines().collect();
    if lines.is_empty() {
        return String::new();
    }

    let margin = lines
        .iter()
        .skip(1)
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);

    let mut cleaned: Vec<String> = Vec::with_capacity(lines.len());
    cleaned.push(lines.remove(0).trim_start().to_string());
    for line in lines {
        cleaned.push(line.get(margin..).unwrap_or("").trim_end().to_string());
    }

    while cleaned.first().map_or(false, |l| l.is_empty()) {
        cleaned.remove(0);
    }
    while cleaned.last().map_or(false, |l| l.is_empty()) {
        cleaned.pop();
    }

    cleaned.join("\n")
}

/// Parse an import statement: `import x` or `import x as y`
fn parse_import(node: &Node, source: &[u8]) -> Vec<Import> {
    let line = node.start_position().row + 1;
    let mut imports = Vec::new();

    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        let (module, alias) = match child.kind() {
            "dotted_name" => (child.utf8_text(source).ok(), None),
            "aliased_import" => (
                child
                    .child_by_field_name("name")
                    .and_then(|n| n.utf8_text(source).ok()),
                child
                    .child_by_field_name("alias")
                    .and_then(|n| n.utf8_text(source).ok()),
            ),
            _ => continue,
        };

        if let Some(module) = module {
            let name = match alias {
                Some(a) => ImportedName::with_alias(module, a),
                None => ImportedName::new(module),
            };
            imports.push(Import {
                module: module.to_string(),
                names: vec![name],
                kind: ImportKind::Direct,
                line,
            });
        }
    }

    imports
}

/// Parse an import-from statement: `from x import y`
fn parse_import_from(node: &Node, source: &[u8]) -> Option<Import> {
    let line = node.start_position().row + 1;
    let mut module = String::new();
    let mut names = Vec::new();
    let mut relative_level = 0;
    let mut seen_import_keyword = false;

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "relative_import" => {
                let mut inner_cursor = child.walk();
                for inner in child.children(&mut inner_cursor) {
                    match inner.kind() {
                        "import_prefix" => {
                            relative_level = inner
                                .utf8_text(source)
                                .ok()?
                                .chars()
                                .filter(|c| *c == '.')
                                .count();
                        }
                        "dotted_name" => module = inner.utf8_text(source).ok()?.to_string(),
                        _ => {}
                    }
                }
            }
            "dotted_name" => {
                let text = child.utf8_text(source).ok()?;
                if seen_import_keyword {
                    names.push(ImportedName::new(text));
                } else {
                    module = text.to_string();
                }
            }
            "import" => seen_import_keyword = true,
            "wildcard_import" => names.push(ImportedName::new("*")),
            "aliased_import" => {
                let name = child.child_by_field_name("name")?.utf8_text(source).ok()?;
                match child
                    .child_by_field_name("alias")
                    .and_then(|a| a.utf8_text(source).ok())
                {
                    Some(alias) => names.push(ImportedName::with_alias(name, alias)),
                    None => names.push(ImportedName::new(name)),
                }
            }
            _ => {}
        }
    }

    Some(if relative_level > 0 {
        Import::relative(&module, names, relative_level, line)
    } else {
        Import::from_import(&module, names, line)
    })
}

/// Parse a (possibly decorated) class definition
fn parse_class(node: &Node, source: &[u8], lines: &[&str]) -> Option<Class> {
    let class_node = if node.kind() == "decorated_definition" {
        node.child_by_field_name("definition")
            .filter(|d| d.kind() == "class_definition")?
    } else {
        *node
    };

    let name = class_node.child_by_field_name("name")?.utf8_text(source).ok()?;
    let mut class = Class::new(name, node.start_position().row + 1);
    class.line_end = node.end_position().row + 1;

    if let Some(superclasses) = class_node.child_by_field_name("superclasses") {
        class.bases = extract_bases(&superclasses, source);
    }

    if let Some(body) = class_node.child_by_field_name("body") {
        class.docstring = leading_docstring(&body, source);
        parse_class_body(&body, source, lines, &mut class);
    }

    Some(class)
}

/// Extract positional base classes, skipping keywords such as `metaclass=`
fn extract_bases(node: &Node, source: &[u8]) -> Vec<String> {
    let mut bases = Vec::new();
    let mut cursor = node.walk();

    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "identifier" | "attribute" | "subscript" | "call" => {
                if let Ok(text) = child.utf8_text(source) {
                    bases.push(text.to_string());
                }
            }
            _ => {}
        }
    }

    bases
}

fn parse_class_body(body: &Node, source: &[u8], lines: &[&str], class: &mut Class) {
    let mut cursor = body.walk();
    for child in body.named_children(&mut cursor) {
        match child.kind() {
            "expression_statement" => {
                if let Some(attr) = parse_class_attribute(&child, source) {
                    class.attributes.push(attr);
                }
            }
            "function_definition" | "decorated_definition" => {
                if let Some(method) = parse_method(&child, source, lines) {
                    class.methods.push(method);
                }
            }
            _ => {}
        }
    }
}

/// Parse `name = value` (optionally annotated) inside a class body
fn parse_class_attribute(node: &Node, source: &[u8]) -> Option<Attribute> {
    let assignment = node.named_child(0).filter(|n| n.kind() == "assignment")?;
    let left = assignment.child_by_field_name("left")?;
    if left.kind() != "identifier" {
        return None;
    }
    let name = left.utf8_text(source).ok()?;
    if BANNED_ATTR_NAMES.contains(&name) {
        return None;
    }

    let right = assignment.child_by_field_name("right")?;
    if right.kind() == "assignment" {
        // chained targets are rare in class bodies
        return None;
    }
    let value = render_value(&right, source)?;

    Some(Attribute::new(
        name,
        &value,
        assignment.start_position().row + 1,
    ))
}

/// Render a literal the way Python's `repr` shows it.
///
/// Containers are rebuilt from their elements, so comments, line breaks and
/// trailing commas in the source do not leak into the value.
fn render_value(node: &Node, source: &[u8]) -> Option<String> {
    match node.kind() {
        "list" => Some(format!("[{}]", render_elements(node, source)?.join(", "))),
        "set" | "dictionary" => Some(format!("{{{}}}", render_elements(node, source)?.join(", "))),
        "tuple" => {
            let items = render_elements(node, source)?;
            match items.as_slice() {
                [single] => Some(format!("({},)", single)),
                _ => Some(format!("({})", items.join(", "))),
            }
        }
        "pair" => {
            let key = render_value(&node.child_by_field_name("key")?, source)?;
            let value = render_value(&node.child_by_field_name("value")?, source)?;
            Some(format!("{}: {}", key, value))
        }
        "parenthesized_expression" => match render_elements(node, source)?.as_slice() {
            [inner] => Some(inner.clone()),
            _ => normalize_value(node, source),
        },
        _ => {
            let value = normalize_value(node, source)?;
            if value.contains('\n') {
                Some(value.split_whitespace().collect::<Vec<_>>().join(" "))
            } else {
                Some(value)
            }
        }
    }
}

fn render_elements(node: &Node, source: &[u8]) -> Option<Vec<String>> {
    let mut cursor = node.walk();
    let children: Vec<Node> = node
        .named_children(&mut cursor)
        .filter(|c| c.kind() != "comment")
        .collect();
    children
        .iter()
        .map(|child| render_value(child, source))
        .collect()
}

/// Render simple string literals in Python's repr style (single quotes)
fn normalize_value(node: &Node, source: &[u8]) -> Option<String> {
    let text = node.utf8_text(source).ok()?;
    let mut strings = Vec::new();
    collect_plain_strings(node, source, &mut strings);

    let offset = node.start_byte();
    let mut value = String::with_capacity(text.len());
    let mut last = 0;
    for (start, end) in strings {
        let (start, end) = (start - offset, end - offset);
        value.push_str(&text[last..start]);
        value.push('\'');
        value.push_str(&text[start + 1..end - 1]);
        value.push('\'');
        last = end;
    }
    value.push_str(&text[last..]);
    Some(value)
}

/// Byte ranges of double-quoted strings that read the same single-quoted
fn collect_plain_strings(node: &Node, source: &[u8], found: &mut Vec<(usize, usize)>) {
    if node.kind() == "string" {
        if let Ok(text) = node.utf8_text(source) {
            let simple = text.len() >= 2
                && text.starts_with('"')
                && !text.starts_with("\"\"\"")
                && !text[1..text.len() - 1].contains(['\'', '"', '\\']);
            if simple {
                found.push((node.start_byte(), node.end_byte()));
            }
        }
        return;
    }
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        collect_plain_strings(&child, source, found);
    }
}

/// Parse a method, unwrapping decorators
fn parse_method(node: &Node, source: &[u8], lines: &[&str]) -> Option<Function> {
    let (decorators, func_node) = if node.kind() == "decorated_definition" {
        let def = node
            .child_by_field_name("definition")
            .filter(|d| d.kind() == "function_definition")?;
        (extract_decorators(node, source), def)
    } else {
        (Vec::new(), *node)
    };

    let name = func_node.child_by_field_name("name")?.utf8_text(source).ok()?;
    let mut func = Function::new(name, node.start_position().row + 1);
    func.line_end = node.end_position().row + 1;
    func.decorators = decorators;

    if let Some(params) = func_node.child_by_field_name("parameters") {
        func.arguments = format_arguments(params.utf8_text(source).ok()?);
    }

    if let Some(body) = func_node.child_by_field_name("body") {
        func.docstring = leading_docstring(&body, source);
    }

    func.code = dedented_source(
        lines,
        node.start_position().row,
        node.end_position().row,
        node.start_position().column,
    );

    Some(func)
}

/// Extract decorators from a decorated definition
fn extract_decorators(node: &Node, source: &[u8]) -> Vec<String> {
    let mut decorators = Vec::new();
    let mut cursor = node.walk();

    for child in node.children(&mut cursor) {
        if child.kind() == "decorator" {
            if let Ok(text) = child.utf8_text(source) {
                let dec = text.trim_start_matches('@');
                let dec = dec.split('(').next().unwrap_or(dec);
                decorators.push(dec.trim().to_string());
            }
        }
    }

    decorators
}

/// `(self, request,\n    *args)` becomes `self, request, *args`
fn format_arguments(params: &str) -> String {
    let inner = params
        .trim()
        .strip_prefix('(')
        .and_then(|p| p.strip_suffix(')'))
        .unwrap_or(params);

    let collapsed = inner.split_whitespace().collect::<Vec<_>>().join(" ");
    let collapsed = collapsed.replace("( ", "(").replace(" )", ")");
    collapsed.trim_end_matches(',').trim().to_string()
}

/// Lines `start..=end`, with the first line's indentation removed from each
fn dedented_source(lines: &[&str], start: usize, end: usize, indent: usize) -> String {
    let mut code = String::new();
    for line in lines.iter().take(end + 1).skip(start) {
        let strip = line
            .char_indices()
            .take(indent)
            .take_while(|(_, c)| c.is_whitespace())
            .count();
        code.push_str(line.get(strip..).unwrap_or(""));
        code.push('\n');
    }
    code
}
