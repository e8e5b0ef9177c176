//! Java class declaration extraction using tree-sitter.
//!
//! Walks a compilation unit and turns every `class` declaration (nested
//! member classes included) into a [`ClassDescriptor`]: its fields with
//! their modifiers, the signatures of the methods it declares, and the
//! byte span of its body.

use serde::Serialize;
use tree_sitter::{Node, Parser};

use crate::model::{BodySpan, ClassDescriptor, FieldDescriptor, MethodSignature, Visibility};

#[derive(Debug, Clone, Default, Serialize)]
pub struct CompilationUnit {
    pub package: String,
    pub classes: Vec<ClassDescriptor>,
}

#[tracing::instrument(skip_all, fields(source_len = source.len()))]
pub fn parse_compilation_unit(source: &str) -> Option<CompilationUnit> {
    if source.trim().is_empty() {
        return None;
    }

    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_java::LANGUAGE.into())
        .ok()?;
    let tree = parser.parse(source, None)?;
    let root = tree.root_node();
    if root.has_error() {
        tracing::warn!("source contains syntax errors; extraction may be partial");
    }
    let bytes = source.as_bytes();

    let mut unit = CompilationUnit::default();
    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        match child.kind() {
            "package_declaration" => {
                unit.package = extract_package(&child, bytes);
            }
            "class_declaration" => {
                let prefix = unit.package.clone();
                extract_class(&child, bytes, &prefix, &mut unit.classes);
            }
            _ => {}
        }
    }

    Some(unit)
}

pub fn parse_classes(source: &str) -> Vec<ClassDescriptor> {
    parse_compilation_unit(source)
        .map(|unit| unit.classes)
        .unwrap_or_default()
}

fn extract_package(node: &Node, source: &[u8]) -> String {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "scoped_identifier" || child.kind() == "identifier" {
            return node_text(&child, source).to_string();
        }
    }
    String::new()
}

/// Pushes `node` and then its nested classes, outer first.
fn extract_class(node: &Node, source: &[u8], prefix: &str, out: &mut Vec<ClassDescriptor>) {
    let Some(name) = node.child_by_field_name("name") else {
        return;
    };
    let simple = node_text(&name, source);
    let qualified = if prefix.is_empty() {
        simple.to_string()
    } else {
        format!("{prefix}.{simple}")
    };

    let mut class = ClassDescriptor::new(qualified.clone());
    let Some(body) = node.child_by_field_name("body") else {
        out.push(class);
        return;
    };
    class.body = body_span(node, &body, source);
    if class.body.is_none() {
        tracing::warn!(class = %qualified, "class body is not closed; accessors will not be emitted");
    }

    let mut nested = Vec::new();
    let mut cursor = body.walk();
    for member in body.children(&mut cursor) {
        match member.kind() {
            "field_declaration" => extract_fields(&member, source, &mut class.fields),
            "method_declaration" => {
                if let Some(sig) = extract_method(&member, source) {
                    class.methods.push(sig);
                }
            }
            "class_declaration" => nested.push(member),
            _ => {}
        }
    }

    out.push(class);
    for inner in nested {
        extract_class(&inner, source, &qualified, out);
    }
}

/// Span of a body whose closing `}` is really in the source. Error recovery
/// may end a truncated body with a zero-width MISSING brace instead.
fn body_span(class: &Node, body: &Node, source: &[u8]) -> Option<BodySpan> {
    let mut cursor = body.walk();
    let last = body.children(&mut cursor).last()?;
    if last.kind() != "}" || last.is_missing() || last.end_byte() == last.start_byte() {
        return None;
    }
    let close = last.start_byte();
    if source.get(close) != Some(&b'}') {
        return None;
    }
    Some(BodySpan {
        start: body.start_byte(),
        close,
        indent_column: line_indent(source, class.start_byte()),
    })
}

#[derive(Debug, Default)]
struct Modifiers {
    visibility: Option<Visibility>,
    is_static: bool,
    is_final: bool,
}

fn extract_modifiers(node: &Node) -> Modifiers {
    let mut mods = Modifiers::default();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() != "modifiers" {
            continue;
        }
        let mut inner = child.walk();
        for m in child.children(&mut inner) {
            match m.kind() {
                "public" => mods.visibility = Some(Visibility::Public),
                "protected" => mods.visibility = Some(Visibility::Protected),
                "private" => mods.visibility = Some(Visibility::Private),
                "static" => mods.is_static = true,
                "final" => mods.is_final = true,
                _ => {}
            }
        }
    }
    mods
}

fn extract_fields(node: &Node, source: &[u8], fields: &mut Vec<FieldDescriptor>) {
    let Some(ty) = node.child_by_field_name("type") else {
        return;
    };
    let base_type = normalize_whitespace(node_text(&ty, source));
    let mods = extract_modifiers(node);

    let mut cursor = node.walk();
    for declarator in node.children_by_field_name("declarator", &mut cursor) {
        let Some(name) = declarator.child_by_field_name("name") else {
            continue;
        };
        let declared_type = match declarator.child_by_field_name("dimensions") {
            Some(dims) => format!("{base_type}{}", strip_whitespace(node_text(&dims, source))),
            None => base_type.clone(),
        };
        fields.push(FieldDescriptor {
            name: node_text(&name, source).to_string(),
            declared_type,
            visibility: mods.visibility.unwrap_or(Visibility::Package),
            is_static: mods.is_static,
            is_final: mods.is_final,
        });
    }
}

fn extract_method(node: &Node, source: &[u8]) -> Option<MethodSignature> {
    let name = node.child_by_field_name("name")?;
    let mut return_type = node
        .child_by_field_name("type")
        .map(|t| normalize_whitespace(node_text(&t, source)))
        .unwrap_or_else(|| "void".to_string());
    if let Some(dims) = node.child_by_field_name("dimensions") {
        return_type.push_str(&strip_whitespace(node_text(&dims, source)));
    }

    let mut parameter_types = Vec::new();
    if let Some(params) = node.child_by_field_name("parameters") {
        let mut cursor = params.walk();
        for param in params.children(&mut cursor) {
            match param.kind() {
                "formal_parameter" => {
                    let Some(ty) = param.child_by_field_name("type") else {
                        continue;
                    };
                    let mut ty = normalize_whitespace(node_text(&ty, source));
                    if let Some(dims) = param.child_by_field_name("dimensions") {
                        ty.push_str(&strip_whitespace(node_text(&dims, source)));
                    }
                    parameter_types.push(ty);
                }
                "spread_parameter" => {
                    if let Some(ty) = spread_parameter_type(&param, source) {
                        parameter_types.push(format!("{ty}..."));
                    }
                }
                _ => {}
            }
        }
    }

    Some(MethodSignature {
        name: node_text(&name, source).to_string(),
        parameter_types,
        return_type,
        is_static: extract_modifiers(node).is_static,
    })
}

fn spread_parameter_type(node: &Node, source: &[u8]) -> Option<String> {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "modifiers" | "variable_declarator" => continue,
            _ => return Some(normalize_whitespace(node_text(&child, source))),
        }
    }
    None
}

fn line_indent(source: &[u8], offset: usize) -> usize {
    let line_start = source[..offset]
        .iter()
        .rposition(|b| *b == b'\n')
        .map(|p| p + 1)
        .unwrap_or(0);
    source[line_start..offset]
        .iter()
        .take_while(|b| **b == b' ' || **b == b'\t')
        .count()
}

fn node_text<'a>(node: &Node, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn strip_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}
