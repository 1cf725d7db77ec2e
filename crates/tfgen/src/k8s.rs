//! A [`FieldClassifier`] for Kubernetes API types.
//!
//! Kubernetes documents field semantics in prose, so the annotation is derived
//! from well-known phrases in the field documentation.

use std::collections::BTreeSet;

use crate::{
    classify::{Classification, DocsLookup, EmbeddedDocs, FieldClassifier, FieldContext, SchemaAnnotation},
    descriptor::PrimitiveKind,
    walker::Kind,
};

/// Fields handled by separate data sources instead of the resource itself.
pub const DEFAULT_IGNORED_FIELDS: &[&str] = &[
    "v1.Pod.Status",
    "v1.Pod.PodSpec",
    "v1.Volume.VolumeSource",
    "v1.Service.Status",
    "v1.PodTemplateSpec.Spec",
    "v1.ReplicationController.Status",
];

/// Which of the classified fields are selected.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Selection {
    /// Every field not excluded by the heuristics. Use as the combined filter.
    #[default]
    All,

    /// Only required fields. Use as the inline filter of an expander.
    RequiredOnly,

    /// Only optional fields. Use as the outline filter of an expander.
    OptionalOnly,
}

#[derive(Clone, Debug)]
pub struct KubernetesClassifier<D = EmbeddedDocs> {
    docs: D,
    selection: Selection,
    ignored: BTreeSet<String>,
}

impl Default for KubernetesClassifier {
    fn default() -> Self {
        Self::new(EmbeddedDocs)
    }
}

impl<D> KubernetesClassifier<D>
where
    D: DocsLookup,
{
    pub fn new(docs: D) -> Self {
        Self {
            docs,
            selection: Selection::All,
            ignored: DEFAULT_IGNORED_FIELDS.iter().map(|&field| field.to_owned()).collect(),
        }
    }

    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    /// Adds a field to the ignore list, spelled `<owner qualified name>.<field>`.
    pub fn ignore(mut self, field: impl Into<String>) -> Self {
        self.ignored.insert(field.into());
        self
    }

    /// Replaces the ignore list.
    pub fn with_ignored(mut self, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.ignored = fields.into_iter().map(Into::into).collect();
        self
    }

    fn kind_override(kind: &Kind) -> Option<Kind> {
        let spelling = match kind {
            Kind::Struct(name) | Kind::Unsupported(name) => name.as_str(),
            _ => return None,
        };

        match spelling.trim_start_matches('*') {
            "v1.Time" => Some(Kind::Primitive(PrimitiveKind::String)),
            "resource.Quantity" | "intstr.IntOrString" => Some(Kind::Primitive(PrimitiveKind::Int)),
            _ => None,
        }
    }

    fn is_selected(&self, annotation: &SchemaAnnotation) -> bool {
        match self.selection {
            Selection::All => true,
            Selection::RequiredOnly => annotation.required,
            Selection::OptionalOnly => annotation.optional,
        }
    }
}

impl<D> FieldClassifier for KubernetesClassifier<D>
where
    D: DocsLookup,
{
    fn classify(&self, context: &FieldContext<'_>) -> Classification {
        let FieldContext { owner, field, kind } = *context;

        if field.is_serialization_skipped() {
            tracing::debug!(owner = owner.qualified_name(), field = %field.name, "ignoring field which is never serialized");
            return Classification::excluded();
        }

        let mut classification = Classification::included();
        if let Some(kind_override) = Self::kind_override(kind) {
            tracing::debug!(
                owner = owner.qualified_name(),
                field = %field.name,
                from = %kind,
                to = %kind_override,
                "converting field kind"
            );
            classification = classification.with_kind(kind_override);
        }

        let qualified_field = format!("{owner}.{field}", owner = owner.qualified_name(), field = field.name);
        if self.ignored.contains(&qualified_field) {
            tracing::debug!(field = %qualified_field, "ignoring field, it is implemented as a data source");
            return Classification::excluded();
        }

        let Some(docs) = self.docs.lookup(owner, field) else {
            tracing::warn!(
                owner = owner.qualified_name(),
                field = %field.name,
                "no documentation found, including field without annotation"
            );
            return classification;
        };

        if docs.contains("Deprecated:") {
            tracing::debug!(field = %qualified_field, "ignoring deprecated field");
            return Classification::excluded();
        }
        if docs.contains("NOT YET IMPLEMENTED.") {
            tracing::debug!(field = %qualified_field, "ignoring field which is not implemented yet");
            return Classification::excluded();
        }

        let mut annotation = if docs.contains("Read-only.") {
            SchemaAnnotation::computed()
        } else if docs.contains("Required.") || docs.contains("Required:") {
            SchemaAnnotation::required()
        } else {
            SchemaAnnotation::optional()
        };
        annotation.force_new = docs.contains("Cannot be updated.");
        annotation.description = docs;

        if !self.is_selected(&annotation) {
            tracing::trace!(field = %qualified_field, selection = ?self.selection, "field not selected");
            return Classification::excluded();
        }

        classification.with_annotation(annotation)
    }
}
