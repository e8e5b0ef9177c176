//! Runtime property interface over a class descriptor.
//!
//! A [`BeanClass`] binds every eligible field to a getter and a setter.
//! Directions the class authors itself are bound to the closures registered
//! on the builder; all others are bound to a plain field read or write.
//! Reads and writes through [`Bean::get`] and [`Bean::set`] always go
//! through that table, so custom validation cannot be bypassed.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::ops::RangeInclusive;
use std::sync::Arc;

use crate::model::{AccessorOrigin, ClassDescriptor, MethodSignature};
use crate::synth::{ClassPlan, PropertySynthesizer, capitalize, normalize_type, primitive_of};

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Char(char),
    Str(String),
}

impl Value {
    /// Default value of a freshly constructed field of type `ty`.
    pub fn default_for(ty: &str) -> Self {
        match normalize_type(ty).as_str() {
            "boolean" => Value::Bool(false),
            "byte" | "short" | "int" | "long" => Value::Int(0),
            "float" | "double" => Value::Float(0.0),
            "char" => Value::Char('\0'),
            _ => Value::Null,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "floating",
            Value::Char(_) => "char",
            Value::Str(_) => "string",
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// The value as stored in a field of type `ty`, or `None` when the
    /// assignment would not compile in Java. Primitive fields accept the
    /// widening conversions from `char` and integers; wrappers only box.
    fn coerce(self, ty: &str) -> Option<Value> {
        let ty = normalize_type(ty);
        let declared_primitive = primitive_of(&ty);
        let Some(primitive) = declared_primitive.or_else(|| wrapper_primitive(&ty)) else {
            let accepted = match self {
                Value::Null => true,
                Value::Str(_) => ty == "String" || ty == "Object",
                _ => ty == "Object",
            };
            return accepted.then_some(self);
        };
        let widens = declared_primitive.is_some();

        match (self, primitive) {
            (Value::Null, _) => (!widens).then_some(Value::Null),
            (Value::Bool(v), "boolean") => Some(Value::Bool(v)),
            (Value::Char(c), "char") => Some(Value::Char(c)),
            (Value::Char(c), "int" | "long") if widens => Some(Value::Int(i64::from(u32::from(c)))),
            (Value::Char(c), "float" | "double") if widens => {
                Some(Value::Float(f64::from(u32::from(c))))
            }
            (Value::Int(v), p) if integral_range(p).is_some_and(|r| r.contains(&v)) => {
                Some(Value::Int(v))
            }
            (Value::Int(v), "float" | "double") if widens => Some(Value::Float(v as f64)),
            (Value::Float(v), "float" | "double") => Some(Value::Float(v)),
            _ => None,
        }
    }
}

fn integral_range(primitive: &str) -> Option<RangeInclusive<i64>> {
    match primitive {
        "byte" => Some(i64::from(i8::MIN)..=i64::from(i8::MAX)),
        "short" => Some(i64::from(i16::MIN)..=i64::from(i16::MAX)),
        "int" => Some(i64::from(i32::MIN)..=i64::from(i32::MAX)),
        "long" => Some(i64::MIN..=i64::MAX),
        _ => None,
    }
}

fn wrapper_primitive(ty: &str) -> Option<&'static str> {
    match ty {
        "Boolean" => Some("boolean"),
        "Byte" => Some("byte"),
        "Character" => Some("char"),
        "Short" => Some("short"),
        "Integer" => Some("int"),
        "Long" => Some("long"),
        "Float" => Some("float"),
        "Double" => Some("double"),
        _ => None,
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Char(v) => write!(f, "'{v}'"),
            Value::Str(v) => write!(f, "\"{v}\""),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PropertyError {
    #[error("class {class} has no property `{property}`")]
    UnknownProperty { class: String, property: String },

    #[error("cannot assign {found} value to property `{property}` of type {expected}")]
    TypeMismatch {
        property: String,
        expected: String,
        found: &'static str,
    },

    #[error("{0}")]
    Rejected(String),

    #[error("accessor {method} is declared by {class} but no body was registered")]
    MissingAccessorBody { class: String, method: String },
}

impl PropertyError {
    /// Error for a custom setter to signal an invalid value.
    pub fn invalid(message: impl Into<String>) -> Self {
        PropertyError::Rejected(message.into())
    }
}

/// Raw field storage handed to accessor bodies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldValues {
    values: BTreeMap<String, Value>,
}

impl FieldValues {
    pub fn get(&self, field: &str) -> Value {
        self.values.get(field).cloned().unwrap_or(Value::Null)
    }

    pub fn set(&mut self, field: &str, value: Value) {
        self.values.insert(field.to_string(), value);
    }
}

pub type GetterFn = Arc<dyn Fn(&FieldValues) -> Value + Send + Sync>;
pub type SetterFn = Arc<dyn Fn(&mut FieldValues, Value) -> Result<(), PropertyError> + Send + Sync>;

#[derive(Clone)]
enum GetterBinding {
    Field(String),
    Custom(GetterFn),
}

#[derive(Clone)]
enum SetterBinding {
    Field { field: String, ty: String },
    Custom(SetterFn),
}

#[derive(Clone)]
struct PropertyBinding {
    getter: GetterBinding,
    setter: SetterBinding,
}

pub struct BeanClassBuilder {
    class: ClassDescriptor,
    getters: HashMap<String, GetterFn>,
    setters: HashMap<String, SetterFn>,
    unknown: Vec<String>,
}

impl BeanClassBuilder {
    pub fn new(class: ClassDescriptor) -> Self {
        Self {
            class,
            getters: HashMap::new(),
            setters: HashMap::new(),
            unknown: Vec::new(),
        }
    }

    /// Registers a user-defined `getX()` body for `field`.
    pub fn getter<F>(mut self, field: &str, body: F) -> Self
    where
        F: Fn(&FieldValues) -> Value + Send + Sync + 'static,
    {
        if let Some(ty) = self.property_type(field) {
            let name = format!("get{}", capitalize(field));
            declare(&mut self.class, MethodSignature::getter(name.clone(), ty));
            self.getters.insert(name, Arc::new(body));
        }
        self
    }

    /// Registers a user-defined `setX(T)` body for `field`.
    pub fn setter<F>(mut self, field: &str, body: F) -> Self
    where
        F: Fn(&mut FieldValues, Value) -> Result<(), PropertyError> + Send + Sync + 'static,
    {
        if let Some(ty) = self.property_type(field) {
            let name = format!("set{}", capitalize(field));
            declare(&mut self.class, MethodSignature::setter(name.clone(), ty));
            self.setters.insert(name, Arc::new(body));
        }
        self
    }

    /// Fails with `UnknownProperty` if a body was registered for a field
    /// that is missing or not eligible.
    pub fn build(self) -> Result<BeanClass, PropertyError> {
        if let Some(property) = self.unknown.first() {
            return Err(PropertyError::UnknownProperty {
                class: self.class.name.clone(),
                property: property.clone(),
            });
        }
        let plan = PropertySynthesizer::new().plan(&self.class);
        let mut properties = BTreeMap::new();

        for pair in plan.accessors.iter() {
            let field = pair.backing_field.name.clone();
            let getter = match pair.getter {
                AccessorOrigin::Synthesized => GetterBinding::Field(field.clone()),
                AccessorOrigin::UserDefined => {
                    let body = self
                        .getters
                        .get(&pair.getter_name)
                        .or_else(|| self.getters.get(&is_name(&field)))
                        .ok_or_else(|| self.missing(&pair.getter_name))?;
                    GetterBinding::Custom(Arc::clone(body))
                }
            };
            let setter = match pair.setter {
                AccessorOrigin::Synthesized => SetterBinding::Field {
                    field: field.clone(),
                    ty: pair.backing_field.declared_type.clone(),
                },
                AccessorOrigin::UserDefined => {
                    let body = self
                        .setters
                        .get(&pair.setter_name)
                        .ok_or_else(|| self.missing(&pair.setter_name))?;
                    SetterBinding::Custom(Arc::clone(body))
                }
            };
            properties.insert(field, PropertyBinding { getter, setter });
        }

        Ok(BeanClass {
            inner: Arc::new(BeanClassInner {
                class: self.class,
                plan,
                properties,
            }),
        })
    }

    fn property_type(&mut self, field: &str) -> Option<String> {
        let ty = self
            .class
            .field(field)
            .filter(|f| f.is_eligible())
            .map(|f| f.declared_type.clone());
        if ty.is_none() {
            self.unknown.push(field.to_string());
        }
        ty
    }

    fn missing(&self, method: &str) -> PropertyError {
        PropertyError::MissingAccessorBody {
            class: self.class.name.clone(),
            method: method.to_string(),
        }
    }
}

fn is_name(field: &str) -> String {
    format!("is{}", capitalize(field))
}

fn declare(class: &mut ClassDescriptor, method: MethodSignature) {
    if !class.methods.contains(&method) {
        class.methods.push(method);
    }
}

struct BeanClassInner {
    class: ClassDescriptor,
    plan: ClassPlan,
    properties: BTreeMap<String, PropertyBinding>,
}

/// A class whose accessor table has been resolved. Cheap to clone.
#[derive(Clone)]
pub struct BeanClass {
    inner: Arc<BeanClassInner>,
}

impl fmt::Debug for BeanClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanClass")
            .field("class", &self.inner.class.name)
            .field("properties", &self.inner.properties.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl BeanClass {
    pub fn builder(class: ClassDescriptor) -> BeanClassBuilder {
        BeanClassBuilder::new(class)
    }

    pub fn name(&self) -> &str {
        &self.inner.class.name
    }

    pub fn plan(&self) -> &ClassPlan {
        &self.inner.plan
    }

    pub fn properties(&self) -> impl Iterator<Item = &str> {
        self.inner.properties.keys().map(String::as_str)
    }

    pub fn instantiate(&self) -> Bean {
        let mut fields = FieldValues::default();
        for field in self.inner.class.fields.iter() {
            fields.set(&field.name, Value::default_for(&field.declared_type));
        }
        Bean {
            class: self.clone(),
            fields,
        }
    }

    fn binding(&self, property: &str) -> Result<&PropertyBinding, PropertyError> {
        self.inner
            .properties
            .get(property)
            .ok_or_else(|| PropertyError::UnknownProperty {
                class: self.inner.class.name.clone(),
                property: property.to_string(),
            })
    }
}

#[derive(Clone)]
pub struct Bean {
    class: BeanClass,
    fields: FieldValues,
}

impl fmt::Debug for Bean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bean")
            .field("class", &self.class.name())
            .field("fields", &self.fields)
            .finish()
    }
}

impl Bean {
    pub fn class(&self) -> &BeanClass {
        &self.class
    }

    pub fn get(&self, property: &str) -> Result<Value, PropertyError> {
        Ok(match &self.class.binding(property)?.getter {
            GetterBinding::Field(field) => self.fields.get(field),
            GetterBinding::Custom(body) => body(&self.fields),
        })
    }

    pub fn set(&mut self, property: &str, value: Value) -> Result<(), PropertyError> {
        let class = self.class.clone();
        match &class.binding(property)?.setter {
            SetterBinding::Field { field, ty } => {
                let found = value.kind();
                let Some(value) = value.coerce(ty) else {
                    return Err(PropertyError::TypeMismatch {
                        property: property.to_string(),
                        expected: ty.clone(),
                        found,
                    });
                };
                self.fields.set(field, value);
                Ok(())
            }
            SetterBinding::Custom(body) => body(&mut self.fields, value),
        }
    }

    /// Direct field storage, bypassing accessors.
    pub fn fields(&self) -> &FieldValues {
        &self.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldDescriptor, Visibility};
    use crate::structure::parse_classes;

    fn item_class() -> ClassDescriptor {
        ClassDescriptor::new("models.Item")
            .with_field(FieldDescriptor::new("price", "Integer"))
            .with_field(FieldDescriptor::new("anotherValue", "Integer"))
            .with_field(FieldDescriptor::new("name", "String"))
            .with_field(FieldDescriptor::new("secret", "String").with_visibility(Visibility::Private))
    }

    fn item() -> BeanClass {
        BeanClass::builder(item_class())
            .setter("price", |fields, value| {
                if value.as_int().is_some_and(|v| v < 0) {
                    return Err(PropertyError::invalid("invalid value"));
                }
                fields.set("price", value);
                Ok(())
            })
            .getter("anotherValue", |fields| match fields.get("anotherValue") {
                Value::Null => Value::Int(0),
                other => other,
            })
            .setter("anotherValue", |fields, value| {
                let stored = match value {
                    Value::Int(v) => Value::Int(v * 2),
                    other => other,
                };
                fields.set("anotherValue", stored);
                Ok(())
            })
            .build()
            .unwrap()
    }

    #[test]
    fn custom_setter_rejection_is_not_bypassed() {
        let class = item();
        let mut bean = class.instantiate();

        let err = bean.set("price", Value::Int(-1)).unwrap_err();
        assert_eq!(err, PropertyError::Rejected("invalid value".into()));
        assert_eq!(bean.get("price").unwrap(), Value::Null);

        bean.set("price", Value::Int(10)).unwrap();
        assert_eq!(bean.get("price").unwrap(), Value::Int(10));

        let price = class.plan().accessor("price").unwrap();
        assert_eq!(price.setter, AccessorOrigin::UserDefined);
        assert_eq!(price.getter, AccessorOrigin::Synthesized);
    }

    #[test]
    fn custom_accessors_transform_values() {
        let mut bean = item().instantiate();

        bean.set("anotherValue", Value::Null).unwrap();
        assert_eq!(bean.get("anotherValue").unwrap(), Value::Int(0));

        bean.set("anotherValue", Value::Int(4)).unwrap();
        assert_eq!(bean.get("anotherValue").unwrap(), Value::Int(8));
        assert_eq!(bean.fields().get("anotherValue"), Value::Int(8));
    }

    #[test]
    fn synthesized_accessors_read_and_write_fields() {
        let mut bean = item().instantiate();
        bean.set("name", Value::Str("lamp".into())).unwrap();
        assert_eq!(bean.get("name").unwrap(), Value::Str("lamp".into()));
    }

    #[test]
    fn private_fields_are_not_properties() {
        let class = item();
        let bean = class.instantiate();
        assert!(matches!(
            bean.get("secret"),
            Err(PropertyError::UnknownProperty { .. })
        ));
        assert_eq!(
            class.properties().collect::<Vec<_>>(),
            vec!["anotherValue", "name", "price"]
        );
    }

    #[test]
    fn synthesized_setter_checks_declared_type() {
        let class = BeanClass::builder(
            ClassDescriptor::new("Counter").with_field(FieldDescriptor::new("count", "int")),
        )
        .build()
        .unwrap();
        let mut bean = class.instantiate();
        assert_eq!(bean.get("count").unwrap(), Value::Int(0));

        let err = bean.set("count", Value::Null).unwrap_err();
        assert!(matches!(err, PropertyError::TypeMismatch { found: "null", .. }));
        assert!(bean.set("count", Value::Str("x".into())).is_err());
        bean.set("count", Value::Int(3)).unwrap();
        assert_eq!(bean.get("count").unwrap(), Value::Int(3));
    }

    #[test]
    fn synthesized_setter_enforces_integral_ranges() {
        let class = BeanClass::builder(
            ClassDescriptor::new("Packet")
                .with_field(FieldDescriptor::new("flag", "byte"))
                .with_field(FieldDescriptor::new("port", "short"))
                .with_field(FieldDescriptor::new("size", "Integer"))
                .with_field(FieldDescriptor::new("offset", "long")),
        )
        .build()
        .unwrap();
        let mut bean = class.instantiate();

        assert!(matches!(
            bean.set("flag", Value::Int(300)),
            Err(PropertyError::TypeMismatch { found: "integer", .. })
        ));
        bean.set("flag", Value::Int(-128)).unwrap();
        assert!(bean.set("port", Value::Int(40_000)).is_err());
        bean.set("port", Value::Int(i64::from(i16::MAX))).unwrap();
        assert!(bean.set("size", Value::Int(i64::from(i32::MAX) + 1)).is_err());
        bean.set("size", Value::Null).unwrap();
        bean.set("offset", Value::Int(i64::MAX)).unwrap();
        assert_eq!(bean.get("flag").unwrap(), Value::Int(-128));
    }

    #[test]
    fn char_widens_into_primitive_numeric_fields() {
        let class = BeanClass::builder(
            ClassDescriptor::new("Glyph")
                .with_field(FieldDescriptor::new("code", "int"))
                .with_field(FieldDescriptor::new("weight", "double"))
                .with_field(FieldDescriptor::new("boxed", "Integer"))
                .with_field(FieldDescriptor::new("small", "short")),
        )
        .build()
        .unwrap();
        let mut bean = class.instantiate();

        bean.set("code", Value::Char('A')).unwrap();
        assert_eq!(bean.get("code").unwrap(), Value::Int(65));
        bean.set("weight", Value::Char('A')).unwrap();
        assert_eq!(bean.get("weight").unwrap(), Value::Float(65.0));
        bean.set("weight", Value::Int(2)).unwrap();
        assert_eq!(bean.get("weight").unwrap(), Value::Float(2.0));
        assert!(bean.set("boxed", Value::Char('A')).is_err());
        assert!(bean.set("small", Value::Char('A')).is_err());
    }

    #[test]
    fn registering_body_for_non_property_fails_to_build() {
        let err = BeanClass::builder(item_class())
            .setter("prise", |fields, value| {
                fields.set("prise", value);
                Ok(())
            })
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            PropertyError::UnknownProperty {
                class: "models.Item".into(),
                property: "prise".into(),
            }
        );

        let err = BeanClass::builder(item_class())
            .getter("secret", |fields| fields.get("secret"))
            .build()
            .unwrap_err();
        assert!(matches!(err, PropertyError::UnknownProperty { property, .. } if property == "secret"));
    }

    #[test]
    fn declared_accessor_without_body_fails_to_build() {
        let classes = parse_classes(
            r#"
public class Item {
    public Integer price;
    public void setPrice(Integer price) { this.price = price; }
}
"#,
        );
        let err = BeanClass::builder(classes[0].clone()).build().unwrap_err();
        assert_eq!(
            err,
            PropertyError::MissingAccessorBody {
                class: "Item".into(),
                method: "setPrice".into(),
            }
        );
    }
}
