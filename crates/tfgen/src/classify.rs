//! The field classifier contract.
//!
//! A classifier is consulted once per field and decides whether the field is
//! emitted at all, whether its derived [`Kind`] is replaced and which
//! [`SchemaAnnotation`] it carries. Classifiers are pure: they return a
//! [`Classification`] instead of mutating shared state.

use serde::Serialize;

use crate::{
    descriptor::{FieldDescriptor, TypeDescriptor},
    walker::Kind,
};

/// Schema metadata attached to one field.
///
/// Nothing prevents a classifier from setting both `required` and `optional`.
/// The generators render whatever they are given.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaAnnotation {
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub force_new: bool,
    pub conflicts_with: Vec<String>,
    pub description: String,
}

impl SchemaAnnotation {
    pub fn required() -> Self {
        Self {
            required: true,
            ..Self::default()
        }
    }

    pub fn optional() -> Self {
        Self {
            optional: true,
            ..Self::default()
        }
    }

    pub fn computed() -> Self {
        Self {
            computed: true,
            ..Self::default()
        }
    }

    pub fn with_force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_conflicts(mut self, paths: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.conflicts_with = paths.into_iter().map(Into::into).collect();
        self
    }

    /// Fields which are optional and not computed are only emitted when set.
    pub fn is_conditional(&self) -> bool {
        self.optional && !self.computed
    }
}

/// The decision a classifier makes for one field.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Classification {
    pub include: bool,
    pub kind_override: Option<Kind>,
    pub annotation: SchemaAnnotation,
}

impl Classification {
    pub fn included() -> Self {
        Self {
            include: true,
            ..Self::default()
        }
    }

    pub fn excluded() -> Self {
        Self::default()
    }

    pub fn with_kind(mut self, kind: Kind) -> Self {
        self.kind_override = Some(kind);
        self
    }

    pub fn with_annotation(mut self, annotation: SchemaAnnotation) -> Self {
        self.annotation = annotation;
        self
    }

    /// The kind the generators dispatch on: the override if one was elected,
    /// else the derived kind.
    pub fn kind(&self, derived: &Kind) -> Kind {
        self.kind_override.clone().unwrap_or_else(|| derived.clone())
    }
}

/// Everything a classifier knows about the field it is asked about.
#[derive(Clone, Copy, Debug)]
pub struct FieldContext<'a> {
    pub owner: &'a TypeDescriptor,
    pub field: &'a FieldDescriptor,
    pub kind: &'a Kind,
}

pub trait FieldClassifier {
    fn classify(&self, context: &FieldContext<'_>) -> Classification;
}

impl<F> FieldClassifier for F
where
    F: Fn(&FieldContext<'_>) -> Classification,
{
    fn classify(&self, context: &FieldContext<'_>) -> Classification {
        self(context)
    }
}

/// Includes every field without annotations.
#[derive(Clone, Copy, Debug, Default)]
pub struct IncludeAll;

impl FieldClassifier for IncludeAll {
    fn classify(&self, _: &FieldContext<'_>) -> Classification {
        Classification::included()
    }
}

/// Excludes every field.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExcludeAll;

impl FieldClassifier for ExcludeAll {
    fn classify(&self, _: &FieldContext<'_>) -> Classification {
        Classification::excluded()
    }
}

/// Looks up the human-readable description of a field. A miss is never fatal.
pub trait DocsLookup {
    fn lookup(&self, owner: &TypeDescriptor, field: &FieldDescriptor) -> Option<String>;
}

impl<F> DocsLookup for F
where
    F: Fn(&TypeDescriptor, &FieldDescriptor) -> Option<String>,
{
    fn lookup(&self, owner: &TypeDescriptor, field: &FieldDescriptor) -> Option<String> {
        self(owner, field)
    }
}

/// Uses the description the introspection adapter stored on the field.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmbeddedDocs;

impl DocsLookup for EmbeddedDocs {
    fn lookup(&self, _: &TypeDescriptor, field: &FieldDescriptor) -> Option<String> {
        field
            .description
            .as_deref()
            .map(str::trim)
            .filter(|description| !description.is_empty())
            .map(ToOwned::to_owned)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoDocs;

impl DocsLookup for NoDocs {
    fn lookup(&self, _: &TypeDescriptor, _: &FieldDescriptor) -> Option<String> {
        None
    }
}

/// Where a field ends up in an expander.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Placement {
    /// Assigned unconditionally in the struct literal.
    Inline(Classification),

    /// Assigned after construction, guarded by a presence check.
    Outline(Classification),

    Skipped,
}

/// Places a field using the inline and the outline classifier.
///
/// The inline classifier wins: a field both classifiers select is placed
/// inline exactly once.
pub fn place(
    inline: &dyn FieldClassifier,
    outline: &dyn FieldClassifier,
    context: &FieldContext<'_>,
) -> Placement {
    let inline_decision = inline.classify(context);
    let outline_decision = outline.classify(context);

    match (inline_decision.include, outline_decision.include) {
        (true, also_outline) => {
            if also_outline {
                tracing::debug!(
                    owner = context.owner.qualified_name(),
                    field = %context.field.name,
                    "field selected by both the inline and the outline classifier, placing it inline"
                );
            }
            Placement::Inline(inline_decision)
        }
        (false, true) => Placement::Outline(outline_decision),
        (false, false) => Placement::Skipped,
    }
}
