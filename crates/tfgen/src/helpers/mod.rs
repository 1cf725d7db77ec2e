//! Synthesizers for the helper functions a provider needs next to its schema:
//! flatteners (structured value to flat map), expanders (flat map to
//! structured value) and patch operations.
//!
//! Every top-level call creates a fresh [`GenerationContext`] which owns the
//! declarations of that call. The generator itself is never mutated, so one
//! instance can serve any number of calls.

use std::collections::{HashMap, HashSet};

use snafu::Snafu;

use crate::{
    classify::{Classification, ExcludeAll, FieldClassifier, FieldContext, IncludeAll},
    declaration::{self, DeclarationSet, FunctionDeclaration},
    descriptor::{Catalog, FieldDescriptor, TypeDescriptor},
    walker::{self, Kind, Shape, StructTarget},
};

mod expand;
mod flatten;
mod patch;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, PartialEq, Eq, Snafu)]
pub enum Error {
    #[snafu(display("failed to resolve the root type"))]
    ResolveRoot { source: walker::Error },

    #[snafu(display("failed to resolve the type of field {field:?}"))]
    ResolveField { source: walker::Error, field: String },

    #[snafu(display("failed to render the generated declarations"))]
    RenderDeclarations { source: declaration::Error },
}

pub struct HelperGenerator {
    input_var: String,
    output_var: String,

    /// Used by flatteners and patch operations.
    field_classifier: Box<dyn FieldClassifier>,

    /// Used by expanders, see [`crate::classify::place`].
    inline_classifier: Box<dyn FieldClassifier>,
    outline_classifier: Box<dyn FieldClassifier>,

    /// Must match [`crate::schema::SchemaGenerator::with_primitive_sequences_as_lists`]
    /// of the schema the patch operations read from.
    primitive_sequences_as_lists: bool,
}

impl HelperGenerator {
    /// Creates a generator which names the function input `input_var` and the
    /// value it builds `output_var`. Flatteners conventionally use `in` and
    /// `att`, expanders `cfg` and `obj`.
    pub fn new(input_var: impl Into<String>, output_var: impl Into<String>) -> Self {
        Self {
            input_var: input_var.into(),
            output_var: output_var.into(),
            field_classifier: Box::new(IncludeAll),
            inline_classifier: Box::new(IncludeAll),
            outline_classifier: Box::new(ExcludeAll),
            primitive_sequences_as_lists: false,
        }
    }

    pub fn with_field_classifier(mut self, classifier: impl FieldClassifier + 'static) -> Self {
        self.field_classifier = Box::new(classifier);
        self
    }

    pub fn with_inline_classifier(mut self, classifier: impl FieldClassifier + 'static) -> Self {
        self.inline_classifier = Box::new(classifier);
        self
    }

    pub fn with_outline_classifier(mut self, classifier: impl FieldClassifier + 'static) -> Self {
        self.outline_classifier = Box::new(classifier);
        self
    }

    /// Patch operations read primitive sequences as `TypeList` values instead
    /// of `*schema.Set`.
    pub fn with_primitive_sequences_as_lists(mut self, enabled: bool) -> Self {
        self.primitive_sequences_as_lists = enabled;
        self
    }

    /// Classifies every field of `owner` with the combined field classifier,
    /// yielding the included ones with their effective kind.
    fn classified_fields<'a>(
        &'a self,
        owner: &'a TypeDescriptor,
    ) -> impl Iterator<Item = (&'a FieldDescriptor, Kind, Classification)> + 'a {
        owner.fields().iter().filter_map(move |field| {
            let derived = Kind::of(&field.ty);
            let classification = self.field_classifier.classify(&FieldContext {
                owner,
                field,
                kind: &derived,
            });

            if classification.include {
                Some((field, classification.kind(&derived), classification))
            } else {
                tracing::debug!(owner = owner.qualified_name(), field = %field.name, "field excluded by classifier");
                None
            }
        })
    }
}

/// The result of claiming a function name for a type in a given shape.
enum Claim {
    /// The name is fresh, the caller has to generate the function.
    New(String),

    /// A function for this type and shape is already generated or in progress.
    Existing(String),
}

/// State of one top-level generation call.
struct GenerationContext<'a> {
    catalog: &'a Catalog,
    declarations: DeclarationSet,

    /// Names of the functions currently being generated, innermost last.
    in_progress: Vec<String>,

    names: HashMap<(String, Shape), String>,
    claimed: HashSet<String>,
}

impl<'a> GenerationContext<'a> {
    fn new(catalog: &'a Catalog) -> Self {
        Self {
            catalog,
            declarations: DeclarationSet::default(),
            in_progress: Vec::new(),
            names: HashMap::new(),
            claimed: HashSet::new(),
        }
    }

    /// Claims the function name of `prefix` for the target.
    ///
    /// The first shape of a type keeps the conventional name, other shapes get
    /// a suffix. Claiming the same type and shape again returns the existing
    /// name, which is a forward reference if the function is still in
    /// progress.
    fn claim(&mut self, prefix: &str, target: &StructTarget<'_>) -> Claim {
        let key = (target.descriptor.qualified_name().to_owned(), target.shape);
        if let Some(name) = self.names.get(&key) {
            if self.in_progress.contains(name) {
                tracing::trace!(function = name, "referencing function which is still in progress");
            }
            return Claim::Existing(name.clone());
        }

        let base = format!("{prefix}{name}", name = target.descriptor.name());
        let mut name = base.clone();
        if self.claimed.contains(&name) {
            name = format!("{base}{suffix}", suffix = target.shape.suffix());
            let mut counter = 2;
            while self.claimed.contains(&name) {
                name = format!("{base}{suffix}{counter}", suffix = target.shape.suffix());
                counter += 1;
            }
            tracing::debug!(
                function = name,
                type_name = target.type_name(),
                "function name already taken by another shape, adding a suffix"
            );
        }

        self.claimed.insert(name.clone());
        self.names.insert(key, name.clone());
        Claim::New(name)
    }

    fn begin(&mut self, name: &str) {
        self.in_progress.push(name.to_owned());
    }

    fn finish(&mut self, declaration: FunctionDeclaration) {
        self.in_progress.pop();
        self.declarations.insert(declaration);
    }
}

/// Variable names used inside one generated function.
struct Scope<'a> {
    /// The value fields are read from.
    input: &'a str,

    /// The map or value fields are written to.
    output: &'a str,
}

/// Resolves the struct a nested field refers to, in the shape declared by the
/// field.
fn nested_target<'a>(
    catalog: &'a Catalog,
    field: &FieldDescriptor,
    kind: &Kind,
) -> Option<Result<StructTarget<'a>>> {
    let (name, shape) = match kind {
        Kind::Struct(name) if walker::is_optional(&field.ty) => (name, Shape::Pointer),
        Kind::Struct(name) => (name, Shape::Value),
        Kind::StructSequence {
            name,
            optional_elements: true,
        } => (name, Shape::PtrSlice),
        Kind::StructSequence { name, .. } => (name, Shape::Slice),
        _ => return None,
    };

    Some(
        walker::lookup(catalog, name)
            .map(|descriptor| StructTarget { descriptor, shape })
            .map_err(|source| Error::ResolveField {
                source,
                field: field.name.clone(),
            }),
    )
}
