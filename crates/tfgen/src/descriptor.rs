//! Language-neutral descriptions of the structured types the generators walk.
//!
//! A [`TypeDescriptor`] is the reflected shape of one structured type: its
//! qualified name and an ordered list of [`FieldDescriptor`]s. Field types are
//! expressed as a [`FieldType`] sum type which references other structured
//! types by qualified name, so that descriptors can be self-referential. All
//! referenced types live in a [`Catalog`].

use std::fmt::Display;

use indexmap::IndexMap;
use serde::Serialize;
use strum::{EnumIter, IntoStaticStr};

use crate::naming;

/// Every primitive kind a field can have, including the numeric width.
///
/// The [`Display`] implementation yields the spelling used in generated code,
/// for example `int8` or `float64`.
#[derive(Clone, Copy, Debug, EnumIter, Hash, IntoStaticStr, PartialEq, Eq, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Float32,
    Float64,
    String,
    Bool,
}

impl Display for PrimitiveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_name())
    }
}

impl PrimitiveKind {
    /// The spelling of this primitive in generated code.
    pub fn type_name(self) -> &'static str {
        self.into()
    }

    /// Collapses the width information. Every signed and unsigned integer maps
    /// to [`PrimitiveFamily::Int`], both float widths map to
    /// [`PrimitiveFamily::Float`].
    pub fn family(self) -> PrimitiveFamily {
        match self {
            Self::Int
            | Self::Int8
            | Self::Int16
            | Self::Int32
            | Self::Int64
            | Self::Uint
            | Self::Uint8
            | Self::Uint16
            | Self::Uint32
            | Self::Uint64 => PrimitiveFamily::Int,
            Self::Float32 | Self::Float64 => PrimitiveFamily::Float,
            Self::String => PrimitiveFamily::String,
            Self::Bool => PrimitiveFamily::Bool,
        }
    }
}

/// A primitive kind with its width information removed.
///
/// The [`Display`] implementation yields the name used to build canonical
/// helper names, for example `sliceOfPtrInt` or `diffStringMap`.
#[derive(Clone, Copy, Debug, EnumIter, Hash, IntoStaticStr, PartialEq, Eq)]
pub enum PrimitiveFamily {
    Int,
    Float,
    String,
    Bool,
}

impl Display for PrimitiveFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.into())
    }
}

/// The declared type of a field.
#[derive(Clone, Debug, Hash, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "of")]
pub enum FieldType {
    /// A primitive value.
    Primitive(PrimitiveKind),

    /// A nullable wrapper around another type (a pointer in generated code).
    Optional(Box<FieldType>),

    /// An ordered sequence of another type.
    Sequence(Box<FieldType>),

    /// A string-keyed mapping to another type.
    Mapping(Box<FieldType>),

    /// A structured type, referenced by its qualified name in the [`Catalog`].
    Struct(String),

    /// A type none of the generators understand. The string is its spelling.
    Unsupported(String),
}

impl Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Primitive(kind) => write!(f, "{kind}"),
            Self::Optional(inner) => write!(f, "*{inner}"),
            Self::Sequence(inner) => write!(f, "[]{inner}"),
            Self::Mapping(inner) => write!(f, "map[string]{inner}"),
            Self::Struct(name) | Self::Unsupported(name) => f.write_str(name),
        }
    }
}

impl From<PrimitiveKind> for FieldType {
    fn from(kind: PrimitiveKind) -> Self {
        Self::Primitive(kind)
    }
}

impl FieldType {
    pub fn optional(inner: impl Into<Self>) -> Self {
        Self::Optional(Box::new(inner.into()))
    }

    pub fn sequence(inner: impl Into<Self>) -> Self {
        Self::Sequence(Box::new(inner.into()))
    }

    pub fn mapping(inner: impl Into<Self>) -> Self {
        Self::Mapping(Box::new(inner.into()))
    }

    pub fn structure(qualified_name: impl Into<String>) -> Self {
        Self::Struct(qualified_name.into())
    }
}

/// One field of a structured type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    /// The identifier of the field in generated code, for example `HostIPC`.
    pub name: String,

    #[serde(rename = "type")]
    pub ty: FieldType,

    /// The serialization tag, for example `hostIPC,omitempty`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    /// Documentation attached to the field by the introspection adapter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, ty: impl Into<FieldType>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            tag: None,
            description: None,
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The first comma-separated segment of the serialization tag, if any.
    pub fn serialized_name(&self) -> Option<&str> {
        self.tag
            .as_deref()
            .and_then(|tag| tag.split(',').next())
            .filter(|name| !name.is_empty())
    }

    /// Returns `true` if the serialization tag marks this field as never
    /// serialized (`-`).
    pub fn is_serialization_skipped(&self) -> bool {
        self.serialized_name() == Some("-")
    }

    /// The snake_case key this field uses in the flat configuration map.
    pub fn external_name(&self) -> String {
        naming::snake_case(self.path_segment())
    }

    /// The segment used to address this field in a patch path. This is the
    /// serialized name when a tag is present and the identifier otherwise.
    pub fn path_segment(&self) -> &str {
        match self.serialized_name() {
            Some(name) if name != "-" => name,
            _ => &self.name,
        }
    }
}

/// The reflected shape of one structured type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDescriptor {
    qualified_name: String,
    fields: Vec<FieldDescriptor>,
}

impl TypeDescriptor {
    /// Creates an empty descriptor. The qualified name is spelled the way the
    /// generated code refers to the type, for example `v1.PodSpec`.
    pub fn new(qualified_name: impl Into<String>) -> Self {
        Self {
            qualified_name: qualified_name.into(),
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Shorthand for [`TypeDescriptor::with_field`] without tag or docs.
    pub fn field(self, name: impl Into<String>, ty: impl Into<FieldType>) -> Self {
        self.with_field(FieldDescriptor::new(name, ty))
    }

    pub fn push_field(&mut self, field: FieldDescriptor) {
        self.fields.push(field);
    }

    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    /// The unqualified name, which is the part after the last `.`.
    pub fn name(&self) -> &str {
        self.qualified_name
            .rsplit('.')
            .next()
            .unwrap_or(&self.qualified_name)
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }
}

/// Every structured type reachable from a root type, keyed by qualified name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Catalog {
    types: IndexMap<String, TypeDescriptor>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, descriptor: TypeDescriptor) -> Self {
        self.insert(descriptor);
        self
    }

    /// Inserts a descriptor, returning the one previously registered under the
    /// same qualified name.
    pub fn insert(&mut self, descriptor: TypeDescriptor) -> Option<TypeDescriptor> {
        self.types
            .insert(descriptor.qualified_name.clone(), descriptor)
    }

    pub fn get(&self, qualified_name: &str) -> Option<&TypeDescriptor> {
        self.types.get(qualified_name)
    }

    pub fn contains(&self, qualified_name: &str) -> bool {
        self.types.contains_key(qualified_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.types.values()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
