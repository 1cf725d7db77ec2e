//! Builds a [`Catalog`] from a JSON Schema document.
//!
//! The generators never reflect on types themselves. This adapter is the one
//! place where structured types enter the system, either from a JSON Schema
//! document on disk or from the schema [`schemars`] derives for a Rust type.
//! Every `k8s-openapi` type implements [`JsonSchema`], which makes the
//! Kubernetes API available without a hand-written catalog.

use std::collections::BTreeSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use snafu::{OptionExt, Snafu, ensure};

use crate::{
    descriptor::{Catalog, FieldDescriptor, FieldType, PrimitiveKind, TypeDescriptor},
    naming,
};

const INT_OR_STRING: &str = "intstr.IntOrString";
const ANY: &str = "interface{}";

/// Locations definitions are looked up in, in order.
const DEFINITION_ROOTS: &[&[&str]] = &[&["$defs"], &["definitions"], &["components", "schemas"]];

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, PartialEq, Eq, Snafu)]
pub enum Error {
    #[snafu(display("reference {reference:?} does not point to a definition of this document"))]
    UnresolvedReference { reference: String },

    #[snafu(display("the root schema {root_name:?} is not an object with properties"))]
    InvalidRootSchema { root_name: String },

    #[snafu(display("reference {reference:?} resolves to itself without passing an object"))]
    ReferenceCycle { reference: String },
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct IntrospectOptions {
    /// The package prefix for definition names without one.
    pub package: String,
}

impl Default for IntrospectOptions {
    fn default() -> Self {
        Self {
            package: "api".to_owned(),
        }
    }
}

/// A catalog together with the root type it was built from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Introspection {
    pub catalog: Catalog,
    pub root: FieldType,
}

/// Introspects the schema `schemars` generates for `T`.
pub fn from_schemars<T: JsonSchema>(options: &IntrospectOptions) -> Result<Introspection> {
    let schema = schemars::SchemaGenerator::default().into_root_schema_for::<T>();
    from_json_schema(&T::schema_name(), schema.as_value(), options)
}

/// Introspects a JSON Schema document.
///
/// If `root_name` names a definition of the document, that definition is the
/// root. Otherwise the document itself is the root schema and is registered
/// under `root_name`.
pub fn from_json_schema(root_name: &str, document: &Value, options: &IntrospectOptions) -> Result<Introspection> {
    let introspector = Introspector {
        document,
        options,
        root_name,
        catalog: Catalog::new(),
        aliases: Vec::new(),
    };
    introspector.run()
}

struct Introspector<'a> {
    document: &'a Value,
    options: &'a IntrospectOptions,
    root_name: &'a str,
    catalog: Catalog,

    /// References to non-object definitions currently being followed.
    aliases: Vec<&'a str>,
}

impl<'a> Introspector<'a> {
    fn run(mut self) -> Result<Introspection> {
        let root_schema = self.definition(self.root_name).unwrap_or(self.document);
        ensure!(
            is_structured(root_schema),
            InvalidRootSchemaSnafu {
                root_name: self.root_name
            }
        );

        let qualified_name = self.qualify(self.root_name);
        self.register(&qualified_name, root_schema)?;

        Ok(Introspection {
            catalog: self.catalog,
            root: FieldType::Struct(qualified_name),
        })
    }

    fn definition(&self, name: &str) -> Option<&'a Value> {
        DEFINITION_ROOTS.iter().find_map(|path| {
            path.iter()
                .try_fold(self.document, |value, segment| value.get(segment))
                .and_then(|definitions| definitions.get(name))
        })
    }

    /// `io.k8s.api.core.v1.PodSpec` becomes `v1.PodSpec`, a name without
    /// package is prefixed with the configured one.
    fn qualify(&self, name: &str) -> String {
        let mut segments = name.rsplit('.');
        match (segments.next(), segments.next()) {
            (Some(name), Some(package)) => format!("{package}.{name}"),
            _ => format!("{package}.{name}", package = self.options.package),
        }
    }

    /// Resolves a `$ref`, returning the definition name and its schema.
    fn resolve(&self, reference: &str) -> Result<(String, &'a Value)> {
        if reference == "#" {
            return Ok((self.root_name.to_owned(), self.document));
        }

        let name = DEFINITION_ROOTS
            .iter()
            .find_map(|path| reference.strip_prefix(&format!("#/{path}/", path = path.join("/"))))
            .map(|name| name.replace("~1", "/").replace("~0", "~"))
            .context(UnresolvedReferenceSnafu { reference })?;
        let schema = self
            .definition(&name)
            .context(UnresolvedReferenceSnafu { reference })?;

        Ok((name, schema))
    }

    /// Registers a structured type and every type reachable from it.
    fn register(&mut self, qualified_name: &str, schema: &'a Value) -> Result<()> {
        if self.catalog.contains(qualified_name) {
            return Ok(());
        }
        tracing::debug!(qualified_name, "registering type");

        // Registered before walking the properties so self-references terminate.
        self.catalog.insert(TypeDescriptor::new(qualified_name));

        let required: BTreeSet<&str> = schema
            .get("required")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
            .collect();

        let mut descriptor = TypeDescriptor::new(qualified_name);
        for (property, property_schema) in properties(schema) {
            let (ty, nullable) = self.field_type(&descriptor, property, property_schema)?;
            let ty = match ty {
                FieldType::Sequence(_) | FieldType::Mapping(_) => ty,
                ty if nullable || !required.contains(property.as_str()) => FieldType::optional(ty),
                ty => ty,
            };

            let mut field = FieldDescriptor::new(naming::go_identifier(property), ty).with_tag(property);
            if let Some(description) = property_schema.get("description").and_then(Value::as_str) {
                field = field.with_description(description);
            }
            descriptor.push_field(field);
        }

        self.catalog.insert(descriptor);
        Ok(())
    }

    /// Maps a property schema to a field type. The flag tells whether the
    /// schema admits `null`.
    fn field_type(
        &mut self,
        owner: &TypeDescriptor,
        property: &str,
        schema: &'a Value,
    ) -> Result<(FieldType, bool)> {
        if schema.get("x-kubernetes-int-or-string").and_then(Value::as_bool) == Some(true) {
            return Ok((FieldType::Unsupported(INT_OR_STRING.to_owned()), false));
        }

        if let Some(reference) = schema.get("$ref").and_then(Value::as_str) {
            let (name, definition) = self.resolve(reference)?;
            if is_structured(definition) {
                let qualified_name = self.qualify(&name);
                self.register(&qualified_name, definition)?;
                return Ok((FieldType::Struct(qualified_name), false));
            }

            ensure!(!self.aliases.contains(&reference), ReferenceCycleSnafu { reference });
            self.aliases.push(reference);
            let resolved = self.field_type(owner, property, definition);
            self.aliases.pop();
            return resolved;
        }

        for combinator in ["anyOf", "oneOf", "allOf"] {
            let Some(branches) = schema.get(combinator).and_then(Value::as_array) else {
                continue;
            };
            let (nulls, others): (Vec<&Value>, Vec<&Value>) = branches.iter().partition(|branch| is_null(branch));
            if let [single] = others.as_slice() {
                let (ty, nullable) = self.field_type(owner, property, *single)?;
                return Ok((ty, nullable || !nulls.is_empty()));
            }
            tracing::debug!(
                owner = owner.qualified_name(),
                property,
                combinator,
                "union of several types is not supported"
            );
            return Ok((FieldType::Unsupported(ANY.to_owned()), !nulls.is_empty()));
        }

        let (type_name, nullable) = match schema.get("type") {
            Some(Value::String(type_name)) => (Some(type_name.as_str()), false),
            Some(Value::Array(types)) => {
                let mut types = types.iter().filter_map(Value::as_str);
                let nullable = types.clone().any(|type_name| type_name == "null");
                (types.find(|&type_name| type_name != "null"), nullable)
            }
            _ => (None, false),
        };
        let format = schema.get("format").and_then(Value::as_str);

        let ty: FieldType = match type_name {
            Some("integer") => integer_kind(format).into(),
            Some("number") if format == Some("float") => PrimitiveKind::Float32.into(),
            Some("number") => PrimitiveKind::Float64.into(),
            Some("string") => PrimitiveKind::String.into(),
            Some("boolean") => PrimitiveKind::Bool.into(),
            Some("array") => {
                let element = match schema.get("items") {
                    Some(items) => self.field_type(owner, property, items)?.0,
                    None => FieldType::Unsupported(ANY.to_owned()),
                };
                FieldType::sequence(element)
            }
            Some("object") if is_structured(schema) => {
                let qualified_name = format!(
                    "{owner}{field}",
                    owner = owner.qualified_name(),
                    field = naming::go_identifier(property)
                );
                self.register(&qualified_name, schema)?;
                FieldType::Struct(qualified_name)
            }
            Some("object") => match schema.get("additionalProperties") {
                Some(values @ Value::Object(_)) => FieldType::mapping(self.field_type(owner, property, values)?.0),
                _ => FieldType::mapping(FieldType::Unsupported(ANY.to_owned())),
            },
            _ => FieldType::Unsupported(ANY.to_owned()),
        };

        Ok((ty, nullable))
    }
}

fn properties(schema: &Value) -> impl Iterator<Item = (&String, &Value)> {
    schema
        .get("properties")
        .and_then(Value::as_object)
        .into_iter()
        .flat_map(Map::iter)
}

fn is_structured(schema: &Value) -> bool {
    schema.get("properties").is_some_and(Value::is_object)
}

fn is_null(schema: &Value) -> bool {
    schema.get("type").and_then(Value::as_str) == Some("null")
}

fn integer_kind(format: Option<&str>) -> PrimitiveKind {
    match format {
        Some("int8") => PrimitiveKind::Int8,
        Some("int16") => PrimitiveKind::Int16,
        Some("int32") => PrimitiveKind::Int32,
        Some("int64") => PrimitiveKind::Int64,
        Some("uint") => PrimitiveKind::Uint,
        Some("uint8") => PrimitiveKind::Uint8,
        Some("uint16") => PrimitiveKind::Uint16,
        Some("uint32") => PrimitiveKind::Uint32,
        Some("uint64") => PrimitiveKind::Uint64,
        _ => PrimitiveKind::Int,
    }
}
