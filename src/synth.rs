//! Accessor synthesis for bean-style properties.
//!
//! For every public, non-static, non-final field the synthesizer decides,
//! per direction, whether an accessor must be generated or whether the class
//! already declares one. A declared `getX()`/`isX()` or a declared
//! `setX(T)` always wins over a generated one.

use serde::{Deserialize, Serialize};

use crate::model::{AccessorOrigin, AccessorPair, ClassDescriptor, FieldDescriptor, MethodSignature};

const BOXED_PAIRS: [(&str, &str); 8] = [
    ("boolean", "Boolean"),
    ("byte", "Byte"),
    ("char", "Character"),
    ("short", "Short"),
    ("int", "Integer"),
    ("long", "Long"),
    ("float", "Float"),
    ("double", "Double"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassPlan {
    pub class_name: String,
    pub accessors: Vec<AccessorPair>,
}

impl ClassPlan {
    pub fn synthesized_count(&self) -> usize {
        self.accessors
            .iter()
            .map(|a| {
                usize::from(a.getter == AccessorOrigin::Synthesized)
                    + usize::from(a.setter == AccessorOrigin::Synthesized)
            })
            .sum()
    }

    pub fn accessor(&self, property: &str) -> Option<&AccessorPair> {
        self.accessors.iter().find(|a| a.property() == property)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PropertySynthesizer;

impl PropertySynthesizer {
    pub fn new() -> Self {
        Self
    }

    #[tracing::instrument(skip_all, fields(class = %class.name, fields = class.fields.len()))]
    pub fn plan(&self, class: &ClassDescriptor) -> ClassPlan {
        let accessors = self.synthesize(&class.fields, &class.methods);
        tracing::debug!(accessors = accessors.len(), "planned accessors");
        ClassPlan {
            class_name: class.name.clone(),
            accessors,
        }
    }

    pub fn synthesize(
        &self,
        fields: &[FieldDescriptor],
        methods: &[MethodSignature],
    ) -> Vec<AccessorPair> {
        fields
            .iter()
            .filter(|f| f.is_eligible())
            .map(|field| {
                let suffix = capitalize(&field.name);
                let getter_name = format!("get{suffix}");
                let setter_name = format!("set{suffix}");
                let getter = if has_getter(methods, &suffix) {
                    AccessorOrigin::UserDefined
                } else {
                    AccessorOrigin::Synthesized
                };
                let setter = if has_setter(methods, &setter_name, &field.declared_type) {
                    AccessorOrigin::UserDefined
                } else {
                    AccessorOrigin::Synthesized
                };
                AccessorPair {
                    getter_name,
                    setter_name,
                    backing_field: field.clone(),
                    getter,
                    setter,
                }
            })
            .collect()
    }
}

pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn has_getter(methods: &[MethodSignature], suffix: &str) -> bool {
    let get = format!("get{suffix}");
    let is = format!("is{suffix}");
    methods
        .iter()
        .any(|m| m.parameter_types.is_empty() && (m.name == get || m.name == is))
}

/// A one-parameter `setX` blocks synthesis when its erasure would clash
/// with the generated `setX(T)`, or when it takes the boxed counterpart.
fn has_setter(methods: &[MethodSignature], setter_name: &str, field_type: &str) -> bool {
    let field_erasure = erase_type(field_type);
    methods
        .iter()
        .filter(|m| m.name == setter_name && m.parameter_types.len() == 1)
        .map(|m| erase_type(&m.parameter_types[0]))
        .any(|param| param == field_erasure || is_boxed_pair(&param, &field_erasure))
}

/// Same type modulo whitespace and package qualifiers, or a primitive and
/// its wrapper.
pub fn types_compatible(a: &str, b: &str) -> bool {
    let a = normalize_type(a);
    let b = normalize_type(b);
    a == b || is_boxed_pair(&a, &b)
}

fn is_boxed_pair(a: &str, b: &str) -> bool {
    BOXED_PAIRS
        .iter()
        .any(|(p, w)| (a == *p && b == *w) || (a == *w && b == *p))
}

/// Drops whitespace, reduces every qualified name (type arguments included)
/// to its simple name, and spells varargs as an array.
pub fn normalize_type(ty: &str) -> String {
    let compact: String = ty.chars().filter(|c| !c.is_whitespace()).collect();
    let compact = compact.replace("...", "[]");

    let mut out = String::with_capacity(compact.len());
    let mut segment_start = 0;
    for c in compact.chars() {
        if c == '.' {
            out.truncate(segment_start);
            continue;
        }
        out.push(c);
        if !(c.is_alphanumeric() || c == '_' || c == '$') {
            segment_start = out.len();
        }
    }
    out
}

/// Normalized type with every type-argument list removed.
pub fn erase_type(ty: &str) -> String {
    let mut depth = 0usize;
    normalize_type(ty)
        .chars()
        .filter(|c| match c {
            '<' => {
                depth += 1;
                false
            }
            '>' => {
                depth = depth.saturating_sub(1);
                false
            }
            _ => depth == 0,
        })
        .collect()
}

pub fn primitive_of(ty: &str) -> Option<&'static str> {
    let ty = normalize_type(ty);
    BOXED_PAIRS.iter().find(|(p, _)| *p == ty).map(|(p, _)| *p)
}
