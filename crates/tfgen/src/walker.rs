//! Field classification by kind, shared by every generator.
//!
//! The walker strips optional wrappers and sequence layers off a [`FieldType`]
//! and derives a [`Kind`] the generators can dispatch on.

use std::fmt::Display;

use snafu::{OptionExt, Snafu};

use crate::descriptor::{Catalog, FieldDescriptor, FieldType, PrimitiveKind, TypeDescriptor};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, PartialEq, Eq, Snafu)]
pub enum Error {
    #[snafu(display("type {qualified_name:?} is not registered in the catalog"))]
    UnknownType { qualified_name: String },

    #[snafu(display(
        "root type {type_name:?} must be a structure, a sequence of structures or a pointer to either"
    ))]
    InvalidRoot { type_name: String },
}

/// A non-fatal failure for a single field. Generators log it and skip the
/// field; siblings are still generated.
#[derive(Debug, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub))]
pub enum FieldError {
    #[snafu(display("unable to process field {field:?} of type {type_name}"))]
    UnsupportedKind { field: String, type_name: String },

    #[snafu(display("field {field:?} refers back to {type_name:?} which is still being generated"))]
    RecursiveType { field: String, type_name: String },
}

impl FieldError {
    pub fn unsupported(field: &FieldDescriptor) -> Self {
        Self::UnsupportedKind {
            field: field.name.clone(),
            type_name: field.ty.to_string(),
        }
    }

    /// Logs the skipped field. Generation continues with its siblings.
    pub fn warn(&self, owner: &TypeDescriptor) {
        tracing::warn!(owner = owner.qualified_name(), error = %self, "skipping field");
    }
}

/// Removes every layer of optional wrapping. Applying it to an already
/// stripped type returns the type unchanged.
pub fn strip_optional(ty: &FieldType) -> &FieldType {
    let mut current = ty;
    while let FieldType::Optional(inner) = current {
        current = inner;
    }
    current
}

/// Removes one layer of sequence wrapping, if present.
pub fn strip_sequence(ty: &FieldType) -> &FieldType {
    match ty {
        FieldType::Sequence(element) => element,
        other => other,
    }
}

pub fn is_optional(ty: &FieldType) -> bool {
    matches!(ty, FieldType::Optional(_))
}

/// The classification of a field type the generators dispatch on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Kind {
    Primitive(PrimitiveKind),

    /// A sequence of primitives, possibly optional-wrapped elements.
    PrimitiveSequence {
        element: PrimitiveKind,
        optional_elements: bool,
    },

    /// A string-keyed mapping to primitives, possibly optional-wrapped values.
    PrimitiveMapping {
        element: PrimitiveKind,
        optional_elements: bool,
    },

    /// A single nested structure.
    Struct(String),

    /// A sequence of structures, possibly optional-wrapped elements.
    StructSequence {
        name: String,
        optional_elements: bool,
    },

    /// Anything else. Carries the spelling of the offending type.
    Unsupported(String),
}

impl Kind {
    /// Derives the kind of a field type, looking through optional wrappers.
    pub fn of(ty: &FieldType) -> Self {
        match strip_optional(ty) {
            FieldType::Primitive(kind) => Self::Primitive(*kind),
            FieldType::Struct(name) => Self::Struct(name.clone()),
            FieldType::Sequence(element) => {
                let optional_elements = is_optional(element);
                match strip_optional(element) {
                    FieldType::Primitive(kind) => Self::PrimitiveSequence {
                        element: *kind,
                        optional_elements,
                    },
                    FieldType::Struct(name) => Self::StructSequence {
                        name: name.clone(),
                        optional_elements,
                    },
                    _ => Self::Unsupported(ty.to_string()),
                }
            }
            FieldType::Mapping(element) => match strip_optional(element) {
                FieldType::Primitive(kind) => Self::PrimitiveMapping {
                    element: *kind,
                    optional_elements: is_optional(element),
                },
                _ => Self::Unsupported(ty.to_string()),
            },
            FieldType::Unsupported(_) | FieldType::Optional(_) => Self::Unsupported(ty.to_string()),
        }
    }

    pub fn is_collection(&self) -> bool {
        matches!(
            self,
            Self::PrimitiveSequence { .. } | Self::PrimitiveMapping { .. } | Self::StructSequence { .. }
        )
    }
}

impl Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let star = |optional: bool| if optional { "*" } else { "" };
        match self {
            Self::Primitive(kind) => write!(f, "{kind}"),
            Self::PrimitiveSequence {
                element,
                optional_elements,
            } => write!(f, "[]{star}{element}", star = star(*optional_elements)),
            Self::PrimitiveMapping {
                element,
                optional_elements,
            } => write!(f, "map[string]{star}{element}", star = star(*optional_elements)),
            Self::Struct(name) => write!(f, "struct {name}"),
            Self::StructSequence {
                name,
                optional_elements,
            } => write!(f, "[]{star}{name}", star = star(*optional_elements)),
            Self::Unsupported(spelling) => write!(f, "unsupported {spelling}"),
        }
    }
}

/// Looks up a structured type in the catalog.
pub fn lookup<'a>(catalog: &'a Catalog, qualified_name: &str) -> Result<&'a TypeDescriptor> {
    catalog
        .get(qualified_name)
        .context(UnknownTypeSnafu { qualified_name })
}

/// The way a structured type is passed into or out of a generated function.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Shape {
    Value,
    Pointer,
    Slice,
    PtrSlice,
}

impl Shape {
    pub fn is_collection(self) -> bool {
        matches!(self, Self::Slice | Self::PtrSlice)
    }

    /// Whether the value (or each element of a collection) is a pointer.
    pub fn is_pointer(self) -> bool {
        matches!(self, Self::Pointer | Self::PtrSlice)
    }

    /// The suffix that tells two functions for different shapes of the same
    /// type apart.
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Value => "Value",
            Self::Pointer => "Ptr",
            Self::Slice => "Slice",
            Self::PtrSlice => "PtrSlice",
        }
    }

    /// How a structure with the given qualified name is spelled in this shape.
    pub fn spell(self, qualified_name: &str) -> String {
        match self {
            Self::Value => qualified_name.to_owned(),
            Self::Pointer => format!("*{qualified_name}"),
            Self::Slice => format!("[]{qualified_name}"),
            Self::PtrSlice => format!("[]*{qualified_name}"),
        }
    }

    /// The spelling of one element. Equal to [`Shape::spell`] for
    /// non-collections.
    pub fn spell_element(self, qualified_name: &str) -> String {
        match self {
            Self::Value | Self::Slice => qualified_name.to_owned(),
            Self::Pointer | Self::PtrSlice => format!("*{qualified_name}"),
        }
    }
}

/// A structured type resolved from the catalog together with its shape.
#[derive(Clone, Copy, Debug)]
pub struct StructTarget<'a> {
    pub descriptor: &'a TypeDescriptor,
    pub shape: Shape,
}

impl<'a> StructTarget<'a> {
    /// Resolves a root type. Accepted are structures, pointers to structures,
    /// and sequences of either.
    pub fn resolve(catalog: &'a Catalog, ty: &FieldType) -> Result<Self> {
        let (name, shape) = match strip_optional(ty) {
            FieldType::Struct(name) if is_optional(ty) => (name, Shape::Pointer),
            FieldType::Struct(name) => (name, Shape::Value),
            FieldType::Sequence(element) => match strip_optional(element) {
                FieldType::Struct(name) if is_optional(element) => (name, Shape::PtrSlice),
                FieldType::Struct(name) => (name, Shape::Slice),
                _ => return InvalidRootSnafu { type_name: ty.to_string() }.fail(),
            },
            _ => return InvalidRootSnafu { type_name: ty.to_string() }.fail(),
        };

        Ok(Self {
            descriptor: lookup(catalog, name)?,
            shape,
        })
    }

    pub fn type_name(&self) -> String {
        self.shape.spell(self.descriptor.qualified_name())
    }

    pub fn element_type_name(&self) -> String {
        self.shape.spell_element(self.descriptor.qualified_name())
    }
}
