//! Renders synthesized accessors as Java methods and splices them into the
//! class bodies of the source they were planned from.

use serde::{Deserialize, Serialize};

use crate::model::{AccessorOrigin, AccessorPair, ClassDescriptor};
use crate::structure::parse_classes;
use crate::synth::{ClassPlan, PropertySynthesizer};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmitOptions {
    pub indent_width: usize,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self { indent_width: 4 }
    }
}

impl EmitOptions {
    pub fn fingerprint(&self) -> String {
        format!("v{}:indent={}", env!("CARGO_PKG_VERSION"), self.indent_width)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Rewrite {
    pub plans: Vec<ClassPlan>,
    pub source: String,
    pub changed: bool,
}

pub fn render_accessors(pair: &AccessorPair, indent: &str, step: &str) -> String {
    let field = &pair.backing_field;
    let mut out = String::new();
    if pair.getter == AccessorOrigin::Synthesized {
        out.push_str(&format!(
            "\n{indent}public {ty} {name}() {{\n{indent}{step}return this.{field};\n{indent}}}\n",
            ty = field.declared_type,
            name = pair.getter_name,
            field = field.name,
        ));
    }
    if pair.setter == AccessorOrigin::Synthesized {
        out.push_str(&format!(
            "\n{indent}public void {name}({ty} {field}) {{\n{indent}{step}this.{field} = {field};\n{indent}}}\n",
            ty = field.declared_type,
            name = pair.setter_name,
            field = field.name,
        ));
    }
    out
}

pub fn render_plan(plan: &ClassPlan, member_indent: &str, step: &str) -> String {
    plan.accessors
        .iter()
        .map(|pair| render_accessors(pair, member_indent, step))
        .collect()
}

/// Returns `source` with every missing accessor inserted before the
/// closing brace of its class.
#[tracing::instrument(skip_all, fields(source_len = source.len()))]
pub fn apply(source: &str, options: EmitOptions) -> Rewrite {
    let classes = parse_classes(source);
    let synth = PropertySynthesizer::new();
    let plans: Vec<ClassPlan> = classes.iter().map(|c| synth.plan(c)).collect();

    let mut splices = splice_points(source, &classes, &plans, options);
    // Later offsets first so earlier ones stay valid.
    splices.sort_by(|a, b| b.0.cmp(&a.0));

    let mut rewritten = source.to_string();
    for (offset, text) in splices.iter() {
        rewritten.insert_str(*offset, text);
    }

    Rewrite {
        changed: !splices.is_empty(),
        plans,
        source: rewritten,
    }
}

fn splice_points(
    source: &str,
    classes: &[ClassDescriptor],
    plans: &[ClassPlan],
    options: EmitOptions,
) -> Vec<(usize, String)> {
    let step = " ".repeat(options.indent_width);
    let mut splices = Vec::new();

    for (class, plan) in classes.iter().zip(plans) {
        if plan.synthesized_count() == 0 {
            continue;
        }
        let Some(span) = class.body else {
            continue;
        };

        let class_indent = " ".repeat(span.indent_column);
        let member_indent = format!("{class_indent}{step}");
        let rendered = render_plan(plan, &member_indent, &step);

        let (offset, text) = match brace_line_start(source, span.close) {
            Some(line_start) => (line_start, rendered),
            None => (span.close, format!("{rendered}{class_indent}")),
        };
        let text = if needs_leading_newline(source, offset) {
            format!("\n{text}")
        } else {
            text
        };
        splices.push((offset, text));
    }

    splices
}

/// Start of the closing brace's line when only whitespace precedes it.
fn brace_line_start(source: &str, close: usize) -> Option<usize> {
    let before = &source[..close];
    let line_start = before.rfind('\n').map(|p| p + 1)?;
    before[line_start..]
        .chars()
        .all(|c| c == ' ' || c == '\t')
        .then_some(line_start)
}

fn needs_leading_newline(source: &str, offset: usize) -> bool {
    !source[..offset].ends_with('\n')
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRODUCT: &str = r#"package models;

public class Product {
    public String name;
    public Integer price;

    public void setPrice(Integer price) {
        if (price < 0) throw new IllegalArgumentException("invalid value");
        this.price = price;
    }
}
"#;

    #[test]
    fn apply_inserts_missing_accessors_only() {
        let rewrite = apply(PRODUCT, EmitOptions::default());
        assert!(rewrite.changed);
        let out = &rewrite.source;

        assert!(out.contains("    public String getName() {\n        return this.name;\n    }\n"));
        assert!(out.contains("    public void setName(String name) {\n        this.name = name;\n    }\n"));
        assert!(out.contains("    public Integer getPrice() {"));
        assert_eq!(out.matches("public void setPrice(").count(), 1);
        assert!(out.contains("IllegalArgumentException(\"invalid value\")"));
        assert!(out.trim_end().ends_with('}'));
    }

    #[test]
    fn apply_is_idempotent() {
        let once = apply(PRODUCT, EmitOptions::default());
        let twice = apply(&once.source, EmitOptions::default());
        assert!(!twice.changed);
        assert_eq!(once.source, twice.source);
    }

    #[test]
    fn apply_leaves_source_untouched_when_nothing_to_synthesize() {
        let source = "class A {\n    private int x;\n    public static final int Y = 1;\n}\n";
        let rewrite = apply(source, EmitOptions::default());
        assert!(!rewrite.changed);
        assert_eq!(rewrite.source, source);
    }

    #[test]
    fn apply_handles_nested_classes_and_one_line_bodies() {
        let source = "public class Outer {\n    public static class Inner { public int y; }\n}\n";
        let rewrite = apply(source, EmitOptions::default());
        assert!(rewrite.source.contains("        public int getY() {\n            return this.y;\n        }\n"));
        assert!(rewrite.source.contains("        public void setY(int y) {"));

        let again = apply(&rewrite.source, EmitOptions::default());
        assert!(!again.changed);
    }

    #[test]
    fn apply_keeps_setter_with_qualified_parameter_type() {
        let source = "import java.util.List;\n\nclass A {\n    public List<String> items;\n\n    public void setItems(java.util.List<String> items) {\n        this.items = items;\n    }\n}\n";
        let rewrite = apply(source, EmitOptions::default());
        assert_eq!(rewrite.source.matches("void setItems(").count(), 1);
        assert!(rewrite.source.contains("public List<String> getItems() {"));
    }

    #[test]
    fn apply_skips_same_erasure_and_varargs_setters() {
        let source = "class A {\n    public java.util.List<String> items;\n    public int[] xs;\n\n    public void setItems(java.util.List<Integer> items) {}\n\n    public void setXs(int... xs) {}\n}\n";
        let rewrite = apply(source, EmitOptions::default());
        assert_eq!(rewrite.source.matches("void setItems(").count(), 1);
        assert_eq!(rewrite.source.matches("void setXs(").count(), 1);
        assert!(rewrite.source.contains("public int[] getXs() {"));
    }

    #[test]
    fn apply_leaves_unclosed_class_untouched() {
        let source = "class A {\n    public int x;\n";
        let rewrite = apply(source, EmitOptions::default());
        assert!(!rewrite.changed);
        assert_eq!(rewrite.source, source);
    }

    #[test]
    fn fingerprint_tracks_crate_version() {
        let fingerprint = EmitOptions::default().fingerprint();
        assert!(fingerprint.contains(env!("CARGO_PKG_VERSION")));
        assert!(fingerprint.ends_with("indent=4"));
    }

    #[test]
    fn apply_respects_indent_width() {
        let source = "class A {\n  public int x;\n}\n";
        let rewrite = apply(source, EmitOptions { indent_width: 2 });
        assert!(rewrite.source.contains("\n  public int getX() {\n    return this.x;\n  }\n"));
    }
}
