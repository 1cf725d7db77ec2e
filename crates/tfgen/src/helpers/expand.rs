use std::collections::BTreeMap;

use snafu::ResultExt;

use super::{
    Claim, GenerationContext, HelperGenerator, RenderDeclarationsSnafu, ResolveRootSnafu, Result, nested_target,
};
use crate::{
    classify::{FieldContext, Placement, place},
    declaration::{DeclarationSet, FunctionDeclaration},
    descriptor::{Catalog, FieldDescriptor, FieldType, TypeDescriptor},
    naming, render,
    walker::{FieldError, Kind, StructTarget, is_optional},
};

const FLAT_LIST: &str = "[]interface{}";
const FLAT_MAP: &str = "map[string]interface{}";

/// How one field is read from the configuration map and converted.
struct FieldRead {
    /// The type assertion reading the raw value.
    read: String,

    /// The conversion applied to the raw value, if any.
    conversion: Option<String>,

    /// Collections are only assigned when they are non-empty.
    is_collection: bool,
}

impl FieldRead {
    fn convert(&self, value: &str) -> String {
        match &self.conversion {
            Some(function) => render::call(function, value),
            None => value.to_owned(),
        }
    }
}

impl HelperGenerator {
    /// Generates one expander per distinct structured type reachable from
    /// `root`, keyed by function name.
    pub fn expanders_from_struct(&self, catalog: &Catalog, root: &FieldType) -> Result<BTreeMap<String, String>> {
        self.expander_declarations(catalog, root)?
            .render()
            .context(RenderDeclarationsSnafu)
    }

    pub fn expander_declarations(&self, catalog: &Catalog, root: &FieldType) -> Result<DeclarationSet> {
        let target = StructTarget::resolve(catalog, root).context(ResolveRootSnafu)?;
        let mut context = GenerationContext::new(catalog);
        self.expander(&mut context, target)?;
        Ok(context.declarations)
    }

    fn expander(&self, context: &mut GenerationContext<'_>, target: StructTarget<'_>) -> Result<String> {
        let name = match context.claim("expand", &target) {
            Claim::Existing(name) => return Ok(name),
            Claim::New(name) => name,
        };
        context.begin(&name);

        let config = &self.input_var;
        let output = &self.output_var;
        let qualified_name = target.descriptor.qualified_name();
        let collection = target.shape.is_collection();

        let literal_type = if target.shape.is_pointer() {
            format!("&{qualified_name}")
        } else {
            qualified_name.to_owned()
        };
        let zero = if collection {
            format!("{type_name}{{}}", type_name = target.type_name())
        } else {
            format!("{literal_type}{{}}")
        };

        let mut body = render::expand::empty_guard(&zero);
        if collection {
            body.push_str(&render::expand::collection_begin(
                config,
                output,
                &target.type_name(),
                &literal_type,
            ));
        } else {
            body.push_str(&render::expand::single_begin(config, output, &literal_type));
        }

        let outline_receiver = if collection {
            format!("{output}[i]")
        } else {
            output.clone()
        };
        let mut outline = String::new();

        for field in target.descriptor.fields() {
            let derived = Kind::of(&field.ty);
            let placement = place(
                self.inline_classifier.as_ref(),
                self.outline_classifier.as_ref(),
                &FieldContext {
                    owner: target.descriptor,
                    field,
                    kind: &derived,
                },
            );

            match placement {
                Placement::Inline(classification) => {
                    let kind = classification.kind(&derived);
                    if let Some(field_read) = self.read_field(context, target.descriptor, field, &kind)? {
                        body.push_str(&render::expand::literal_field(
                            &field.name,
                            &field_read.convert(&field_read.read),
                        ));
                    }
                }
                Placement::Outline(classification) => {
                    let kind = classification.kind(&derived);
                    if let Some(field_read) = self.read_field(context, target.descriptor, field, &kind)? {
                        outline.push_str(&render::expand::outline_field(
                            &field_read.read,
                            field_read.is_collection.then_some("len(v) > 0"),
                            &render::field_access(&outline_receiver, &field.name),
                            &field_read.convert("v"),
                        ));
                    }
                }
                Placement::Skipped => {
                    tracing::debug!(
                        owner = qualified_name,
                        field = %field.name,
                        "field selected by neither classifier"
                    );
                }
            }
        }

        body.push_str(render::expand::literal_end());
        body.push_str(&outline);
        if collection {
            body.push_str(render::expand::collection_end());
        }
        body.push_str(&render::expand::end(output));

        context.finish(FunctionDeclaration {
            name: name.clone(),
            arguments: render::expand::ARGUMENTS.to_owned(),
            outputs: target.type_name(),
            body,
            owner: qualified_name.to_owned(),
        });
        Ok(name)
    }

    fn read_field(
        &self,
        context: &mut GenerationContext<'_>,
        owner: &TypeDescriptor,
        field: &FieldDescriptor,
        kind: &Kind,
    ) -> Result<Option<FieldRead>> {
        let entry = render::map_entry(&self.input_var, &field.external_name());

        let field_read = match kind {
            Kind::Primitive(primitive) => FieldRead {
                read: render::type_assertion(&entry, primitive.type_name()),
                conversion: is_optional(&field.ty)
                    .then(|| format!("ptrTo{name}", name = naming::upper_first(primitive.type_name()))),
                is_collection: false,
            },
            Kind::PrimitiveSequence {
                element,
                optional_elements,
            } => {
                let ptr = if *optional_elements { "Ptr" } else { "" };
                FieldRead {
                    read: render::type_assertion(&entry, FLAT_LIST),
                    conversion: Some(format!("sliceOf{ptr}{family}", family = element.family())),
                    is_collection: true,
                }
            }
            Kind::PrimitiveMapping {
                element,
                optional_elements,
            } => {
                let ptr = if *optional_elements { "Ptr" } else { "" };
                FieldRead {
                    read: render::type_assertion(&entry, FLAT_MAP),
                    conversion: Some(format!("expand{family}{ptr}Map", family = element.family())),
                    is_collection: true,
                }
            }
            Kind::Struct(_) | Kind::StructSequence { .. } => {
                let Some(nested) = nested_target(context.catalog, field, kind) else {
                    return Ok(None);
                };
                FieldRead {
                    read: render::type_assertion(&entry, FLAT_LIST),
                    conversion: Some(self.expander(context, nested?)?),
                    is_collection: true,
                }
            }
            Kind::Unsupported(_) => {
                FieldError::unsupported(field).warn(owner);
                return Ok(None);
            }
        };

        Ok(Some(field_read))
    }
}
