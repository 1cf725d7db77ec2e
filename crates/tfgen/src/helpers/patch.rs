use std::collections::BTreeMap;

use snafu::ResultExt;

use super::{
    Claim, GenerationContext, HelperGenerator, RenderDeclarationsSnafu, ResolveFieldSnafu, ResolveRootSnafu, Result,
};
use crate::{
    declaration::{DeclarationSet, FunctionDeclaration},
    descriptor::{Catalog, FieldType, PrimitiveFamily, TypeDescriptor},
    render::{self, patch},
    walker::{self, FieldError, Kind, Shape, StructTarget},
};

/// The type a scalar read from the resource data is asserted to.
fn read_type(family: PrimitiveFamily) -> &'static str {
    match family {
        PrimitiveFamily::Int => "int",
        PrimitiveFamily::Float => "float64",
        PrimitiveFamily::String => "string",
        PrimitiveFamily::Bool => "bool",
    }
}

impl HelperGenerator {
    /// Generates one patch function per distinct structured type reachable
    /// from `root`. Each function emits replace operations for changed scalars
    /// and primitive sequences, diffs maps and recurses into nested structures.
    ///
    /// The shape of the root does not matter, patch functions always operate
    /// on a single instance.
    pub fn patch_ops_from_struct(&self, catalog: &Catalog, root: &FieldType) -> Result<BTreeMap<String, String>> {
        self.patch_declarations(catalog, root)?
            .render()
            .context(RenderDeclarationsSnafu)
    }

    pub fn patch_declarations(&self, catalog: &Catalog, root: &FieldType) -> Result<DeclarationSet> {
        let target = StructTarget::resolve(catalog, root).context(ResolveRootSnafu)?;
        let mut context = GenerationContext::new(catalog);
        self.patcher(&mut context, target.descriptor)?;
        Ok(context.declarations)
    }

    fn patcher(&self, context: &mut GenerationContext<'_>, descriptor: &TypeDescriptor) -> Result<String> {
        let target = StructTarget {
            descriptor,
            shape: Shape::Value,
        };
        let name = match context.claim("patch", &target) {
            Claim::Existing(name) => return Ok(name),
            Claim::New(name) => name,
        };
        context.begin(&name);

        let mut body = patch::begin().to_owned();
        for (field, kind, _) in self.classified_fields(descriptor) {
            let key = field.external_name();
            let path = field.path_segment();

            match kind {
                Kind::Primitive(primitive) => {
                    let value = render::type_assertion(&patch::get(&key), read_type(primitive.family()));
                    body.push_str(&patch::replace(&key, path, &value));
                }
                Kind::PrimitiveMapping { element, .. } => {
                    let helper = format!("diff{family}Map", family = element.family());
                    body.push_str(&patch::diff_map(&key, path, &helper));
                }
                Kind::PrimitiveSequence {
                    element,
                    optional_elements,
                } => {
                    let ptr = if optional_elements { "Ptr" } else { "" };
                    let list = if self.primitive_sequences_as_lists {
                        render::type_assertion(&patch::get(&key), "[]interface{}")
                    } else {
                        format!("{set}.List()", set = render::type_assertion(&patch::get(&key), "*schema.Set"))
                    };
                    let value = render::call(&format!("sliceOf{ptr}{family}", family = element.family()), &list);
                    body.push_str(&patch::replace(&key, path, &value));
                }
                Kind::Struct(nested) => {
                    let nested = walker::lookup(context.catalog, &nested).context(ResolveFieldSnafu {
                        field: field.name.clone(),
                    })?;
                    let function = self.patcher(context, nested)?;
                    body.push_str(&patch::nested(&function, &key, path));
                }
                Kind::StructSequence { .. } | Kind::Unsupported(_) => {
                    FieldError::unsupported(field).warn(descriptor);
                }
            }
        }
        body.push_str(patch::end());

        context.finish(FunctionDeclaration {
            name: name.clone(),
            arguments: patch::ARGUMENTS.to_owned(),
            outputs: patch::OUTPUTS.to_owned(),
            body,
            owner: descriptor.qualified_name().to_owned(),
        });
        Ok(name)
    }
}
