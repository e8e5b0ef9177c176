//! Declaration model shared by extraction, synthesis and emission.

use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Protected,
    Private,
    /// No access modifier (Java's package-private default).
    Package,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub declared_type: String,
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_final: bool,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
            visibility: Visibility::Public,
            is_static: false,
            is_final: false,
        }
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    pub fn with_final(mut self, is_final: bool) -> Self {
        self.is_final = is_final;
        self
    }

    /// Public, non-static, non-final fields get accessors.
    pub fn is_eligible(&self) -> bool {
        self.visibility == Visibility::Public && !self.is_static && !self.is_final
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodSignature {
    pub name: String,
    pub parameter_types: Vec<String>,
    pub return_type: String,
    pub is_static: bool,
}

impl MethodSignature {
    pub fn new(
        name: impl Into<String>,
        parameter_types: Vec<String>,
        return_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            parameter_types,
            return_type: return_type.into(),
            is_static: false,
        }
    }

    pub fn getter(name: impl Into<String>, return_type: impl Into<String>) -> Self {
        Self::new(name, Vec::new(), return_type)
    }

    pub fn setter(name: impl Into<String>, parameter_type: impl Into<String>) -> Self {
        Self::new(name, vec![parameter_type.into()], "void")
    }
}

/// Byte offsets of a class body inside the source it was parsed from.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodySpan {
    pub start: usize,
    /// Offset of the closing `}`.
    pub close: usize,
    /// Column of the class declaration, used to indent emitted members.
    pub indent_column: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDescriptor {
    pub name: String,
    pub fields: Vec<FieldDescriptor>,
    pub methods: Vec<MethodSignature>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<BodySpan>,
}

impl ClassDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            methods: Vec::new(),
            body: None,
        }
    }

    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_method(mut self, method: MethodSignature) -> Self {
        self.methods.push(method);
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessorOrigin {
    Synthesized,
    UserDefined,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccessorPair {
    pub getter_name: String,
    pub setter_name: String,
    pub backing_field: FieldDescriptor,
    pub getter: AccessorOrigin,
    pub setter: AccessorOrigin,
}

impl AccessorPair {
    pub fn property(&self) -> &str {
        &self.backing_field.name
    }

    pub fn synthesizes_anything(&self) -> bool {
        self.getter == AccessorOrigin::Synthesized || self.setter == AccessorOrigin::Synthesized
    }
}
