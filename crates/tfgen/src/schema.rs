//! The schema synthesizer.
//!
//! Turns the fields of a structured type into schema declarations. Nested
//! structures become nested resources built by recursing into the same
//! synthesizer.

use std::{collections::BTreeMap, fmt::Display};

use snafu::{ResultExt, Snafu};

use crate::{
    classify::{DocsLookup, EmbeddedDocs, FieldClassifier, FieldContext, IncludeAll, SchemaAnnotation},
    descriptor::{Catalog, FieldDescriptor, FieldType, PrimitiveFamily, PrimitiveKind, TypeDescriptor},
    render,
    walker::{self, FieldError, Kind, StructTarget},
};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, PartialEq, Eq, Snafu)]
pub enum Error {
    #[snafu(display("failed to resolve the root type"))]
    ResolveRoot { source: walker::Error },

    #[snafu(display("failed to resolve the type of field {field:?}"))]
    ResolveField { source: walker::Error, field: String },
}

/// The value type of a schema.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum ValueType {
    Bool,
    Int,
    Float,
    String,
    List,
    Set,
    Map,
}

impl Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Bool => "TypeBool",
            Self::Int => "TypeInt",
            Self::Float => "TypeFloat",
            Self::String => "TypeString",
            Self::List => "TypeList",
            Self::Set => "TypeSet",
            Self::Map => "TypeMap",
        })
    }
}

impl From<PrimitiveKind> for ValueType {
    /// Collapses every width into one value type.
    fn from(kind: PrimitiveKind) -> Self {
        match kind.family() {
            PrimitiveFamily::Int => Self::Int,
            PrimitiveFamily::Float => Self::Float,
            PrimitiveFamily::String => Self::String,
            PrimitiveFamily::Bool => Self::Bool,
        }
    }
}

/// One schema declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Schema {
    pub value_type: ValueType,
    pub description: String,
    pub required: bool,
    pub optional: bool,
    pub force_new: bool,
    pub computed: bool,
    pub conflicts_with: Vec<String>,
    pub max_items: Option<u32>,
    pub elem: Option<Elem>,

    /// Whether set members are hashed as strings.
    pub hash_strings: bool,
}

impl Schema {
    pub fn new(value_type: ValueType) -> Self {
        Self {
            value_type,
            description: String::new(),
            required: false,
            optional: false,
            force_new: false,
            computed: false,
            conflicts_with: Vec::new(),
            max_items: None,
            elem: None,
            hash_strings: false,
        }
    }

    fn with_annotation(mut self, annotation: &SchemaAnnotation, description: String) -> Self {
        self.required = annotation.required;
        self.optional = annotation.optional;
        self.force_new = annotation.force_new;
        self.computed = annotation.computed;
        self.conflicts_with.clone_from(&annotation.conflicts_with);
        self.description = description;
        self
    }

    /// The nested resource of a block, if this schema is one.
    pub fn nested_resource(&self) -> Option<&Resource> {
        match &self.elem {
            Some(Elem::Resource(resource)) => Some(resource),
            _ => None,
        }
    }
}

impl Display for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&render::schema(self))
    }
}

/// The element of a collection schema.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Elem {
    /// A primitive element.
    Schema(Box<Schema>),

    /// A nested block.
    Resource(Resource),
}

/// A set of fields keyed and sorted by external name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Resource {
    pub schema: BTreeMap<String, Schema>,
}

impl Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&render::resource(self))
    }
}

pub struct SchemaGenerator {
    classifier: Box<dyn FieldClassifier>,
    docs: Box<dyn DocsLookup>,
    primitive_sequences_as_lists: bool,
}

impl Default for SchemaGenerator {
    fn default() -> Self {
        Self {
            classifier: Box::new(IncludeAll),
            docs: Box::new(EmbeddedDocs),
            primitive_sequences_as_lists: false,
        }
    }
}

impl SchemaGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_classifier(mut self, classifier: impl FieldClassifier + 'static) -> Self {
        self.classifier = Box::new(classifier);
        self
    }

    pub fn with_docs(mut self, docs: impl DocsLookup + 'static) -> Self {
        self.docs = Box::new(docs);
        self
    }

    /// Emits sequences of primitives as ordered lists instead of sets.
    pub fn with_primitive_sequences_as_lists(mut self, enabled: bool) -> Self {
        self.primitive_sequences_as_lists = enabled;
        self
    }

    /// Builds the schema model of the root type's fields.
    pub fn resource_from_struct(&self, catalog: &Catalog, root: &FieldType) -> Result<Resource> {
        let target = StructTarget::resolve(catalog, root).context(ResolveRootSnafu)?;
        let mut in_progress = vec![target.descriptor.qualified_name().to_owned()];
        self.resource(catalog, target.descriptor, &mut in_progress)
    }

    /// Renders the schema declaration of every field of the root type, keyed
    /// by external field name.
    pub fn from_struct(&self, catalog: &Catalog, root: &FieldType) -> Result<BTreeMap<String, String>> {
        let resource = self.resource_from_struct(catalog, root)?;
        Ok(resource
            .schema
            .iter()
            .map(|(name, schema)| (name.clone(), render::schema(schema)))
            .collect())
    }

    fn resource(
        &self,
        catalog: &Catalog,
        descriptor: &TypeDescriptor,
        in_progress: &mut Vec<String>,
    ) -> Result<Resource> {
        let mut resource = Resource::default();

        for field in descriptor.fields() {
            let derived = Kind::of(&field.ty);
            let classification = self.classifier.classify(&FieldContext {
                owner: descriptor,
                field,
                kind: &derived,
            });
            if !classification.include {
                tracing::debug!(owner = descriptor.qualified_name(), field = %field.name, "field excluded by classifier");
                continue;
            }

            let kind = classification.kind(&derived);

            let schema = match &kind {
                Kind::Primitive(primitive) => Schema::new((*primitive).into()),
                Kind::PrimitiveSequence { element, .. } => {
                    let value_type = if self.primitive_sequences_as_lists {
                        ValueType::List
                    } else {
                        ValueType::Set
                    };
                    let mut schema = Schema::new(value_type);
                    schema.elem = Some(Elem::Schema(Box::new(Schema::new((*element).into()))));
                    schema.hash_strings = value_type == ValueType::Set && *element == PrimitiveKind::String;
                    schema
                }
                Kind::PrimitiveMapping { element, .. } => {
                    let mut schema = Schema::new(ValueType::Map);
                    schema.elem = Some(Elem::Schema(Box::new(Schema::new((*element).into()))));
                    schema
                }
                Kind::Struct(name) | Kind::StructSequence { name, .. } => {
                    if in_progress.contains(name) {
                        walker::RecursiveTypeSnafu {
                            field: &field.name,
                            type_name: name,
                        }
                        .build()
                        .warn(descriptor);
                        continue;
                    }

                    let nested = walker::lookup(catalog, name).context(ResolveFieldSnafu { field: &field.name })?;
                    in_progress.push(name.clone());
                    let nested = self.resource(catalog, nested, in_progress)?;
                    in_progress.pop();

                    let mut schema = if matches!(kind, Kind::Struct(_)) {
                        let mut schema = Schema::new(ValueType::List);
                        schema.max_items = Some(1);
                        schema
                    } else {
                        Schema::new(ValueType::Set)
                    };
                    schema.elem = Some(Elem::Resource(nested));
                    schema
                }
                Kind::Unsupported(_) => {
                    FieldError::unsupported(field).warn(descriptor);
                    continue;
                }
            };

            let description = self.description(descriptor, field, &classification.annotation);
            resource.schema.insert(
                field.external_name(),
                schema.with_annotation(&classification.annotation, description),
            );
        }

        Ok(resource)
    }

    /// The looked-up documentation wins over the classifier's description.
    fn description(
        &self,
        owner: &TypeDescriptor,
        field: &FieldDescriptor,
        annotation: &SchemaAnnotation,
    ) -> String {
        match self.docs.lookup(owner, field) {
            Some(docs) if !docs.is_empty() => docs,
            _ if !annotation.description.is_empty() => annotation.description.clone(),
            _ => {
                tracing::info!(owner = owner.qualified_name(), field = %field.name, "no documentation found");
                String::new()
            }
        }
    }
}
