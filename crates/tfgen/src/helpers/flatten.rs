use std::collections::BTreeMap;

use snafu::ResultExt;

use super::{
    Claim, GenerationContext, HelperGenerator, RenderDeclarationsSnafu, ResolveRootSnafu, Result, Scope,
    nested_target,
};
use crate::{
    classify::Classification,
    declaration::{DeclarationSet, FunctionDeclaration},
    descriptor::{Catalog, FieldDescriptor, FieldType, PrimitiveFamily, PrimitiveKind, TypeDescriptor},
    render,
    walker::{FieldError, Kind, StructTarget, is_optional},
};

const ELEMENT_VAR: &str = "n";
const ELEMENT_MAP_VAR: &str = "m";

impl HelperGenerator {
    /// Generates one flattener per distinct structured type reachable from
    /// `root`, keyed by function name.
    pub fn flatteners_from_struct(&self, catalog: &Catalog, root: &FieldType) -> Result<BTreeMap<String, String>> {
        self.flattener_declarations(catalog, root)?
            .render()
            .context(RenderDeclarationsSnafu)
    }

    pub fn flattener_declarations(&self, catalog: &Catalog, root: &FieldType) -> Result<DeclarationSet> {
        let target = StructTarget::resolve(catalog, root).context(ResolveRootSnafu)?;
        let mut context = GenerationContext::new(catalog);
        self.flattener(&mut context, target)?;
        Ok(context.declarations)
    }

    fn flattener(&self, context: &mut GenerationContext<'_>, target: StructTarget<'_>) -> Result<String> {
        let name = match context.claim("flatten", &target) {
            Claim::Existing(name) => return Ok(name),
            Claim::New(name) => name,
        };
        context.begin(&name);

        let (scope, mut body) = if target.shape.is_collection() {
            let scope = Scope {
                input: ELEMENT_VAR,
                output: ELEMENT_MAP_VAR,
            };
            let begin = render::flatten::collection_begin(&self.output_var, &self.input_var, ELEMENT_VAR, ELEMENT_MAP_VAR);
            (scope, begin)
        } else {
            let scope = Scope {
                input: &self.input_var,
                output: &self.output_var,
            };
            (scope, render::flatten::single_begin(&self.output_var))
        };

        for (field, kind, classification) in self.classified_fields(target.descriptor) {
            if let Some(code) = self.flatten_field(context, target.descriptor, field, &kind, &classification, &scope)? {
                body.push_str(&code);
            }
        }

        if target.shape.is_collection() {
            body.push_str(&render::flatten::collection_end(&self.output_var, ELEMENT_MAP_VAR));
        } else {
            body.push_str(&render::flatten::single_end(&self.output_var));
        }

        context.finish(FunctionDeclaration {
            name: name.clone(),
            arguments: format!("{input} {ty}", input = self.input_var, ty = target.type_name()),
            outputs: render::flatten::outputs().to_owned(),
            body,
            owner: target.descriptor.qualified_name().to_owned(),
        });
        Ok(name)
    }

    fn flatten_field(
        &self,
        context: &mut GenerationContext<'_>,
        owner: &TypeDescriptor,
        field: &FieldDescriptor,
        kind: &Kind,
        classification: &Classification,
        scope: &Scope<'_>,
    ) -> Result<Option<String>> {
        let access = render::field_access(scope.input, &field.name);

        let value = match kind {
            Kind::Primitive(_) if is_optional(&field.ty) => render::deref(&access),
            Kind::Primitive(_) => access.clone(),
            Kind::PrimitiveSequence {
                element,
                optional_elements: true,
            } => render::call(&format!("flatten{family}Slice", family = element.family()), &access),
            Kind::PrimitiveSequence { .. } => access.clone(),
            Kind::PrimitiveMapping {
                element: PrimitiveKind::String,
                optional_elements: false,
            } => access.clone(),
            Kind::PrimitiveMapping {
                element,
                optional_elements,
            } => {
                let ptr = if *optional_elements { "Ptr" } else { "" };
                render::call(&format!("flatten{family}{ptr}Map", family = element.family()), &access)
            }
            Kind::Struct(_) | Kind::StructSequence { .. } => {
                let Some(nested) = nested_target(context.catalog, field, kind) else {
                    return Ok(None);
                };
                let function = self.flattener(context, nested?)?;
                render::call(&function, &access)
            }
            Kind::Unsupported(_) => {
                FieldError::unsupported(field).warn(owner);
                return Ok(None);
            }
        };

        let assignment = render::assign(&render::map_entry(scope.output, &field.external_name()), &value);
        // Pointers are dereferenced by the assignment, so they are checked
        // whatever the annotation says.
        let condition = (is_optional(&field.ty) || classification.annotation.is_conditional())
            .then(|| non_zero_condition(field, &access))
            .flatten();

        Ok(Some(match condition {
            Some(condition) => render::guarded(&condition, &assignment),
            None => assignment,
        }))
    }
}

/// The condition under which an optional field holds a value. The test
/// follows the declared type of the field, value structures have none.
fn non_zero_condition(field: &FieldDescriptor, access: &str) -> Option<String> {
    if is_optional(&field.ty) {
        return Some(render::not_equal(access, "nil"));
    }

    match Kind::of(&field.ty) {
        Kind::Primitive(kind) => {
            let zero = match kind.family() {
                PrimitiveFamily::Int | PrimitiveFamily::Float => "0",
                PrimitiveFamily::String => "\"\"",
                PrimitiveFamily::Bool => "false",
            };
            Some(render::not_equal(access, zero))
        }
        Kind::PrimitiveSequence { .. } | Kind::PrimitiveMapping { .. } | Kind::StructSequence { .. } => {
            Some(render::not_empty(access))
        }
        Kind::Struct(_) | Kind::Unsupported(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;
    use crate::{
        classify::{FieldContext, SchemaAnnotation},
        descriptor::TypeDescriptor,
    };

    fn flatteners(catalog: &Catalog, root: &FieldType) -> BTreeMap<String, String> {
        HelperGenerator::new("in", "att")
            .flatteners_from_struct(catalog, root)
            .expect("flattener generation succeeds")
    }

    fn simple_struct() -> TypeDescriptor {
        TypeDescriptor::new("helpergen.SimpleStruct")
            .field("MyInt", PrimitiveKind::Int)
            .field("MyInt8", PrimitiveKind::Int8)
            .field("MyUInt", PrimitiveKind::Uint)
            .field("MyFloat64", PrimitiveKind::Float64)
            .field("MyString", PrimitiveKind::String)
            .field("MyBool", PrimitiveKind::Bool)
    }

    #[test]
    fn primitives() {
        let catalog = Catalog::new().with(simple_struct());
        let output = flatteners(&catalog, &FieldType::structure("helpergen.SimpleStruct"));

        assert_eq!(output.len(), 1);
        assert_eq!(output["flattenSimpleStruct"], indoc! {r#"
            func flattenSimpleStruct(in helpergen.SimpleStruct) []interface{} {
            att := make(map[string]interface{})
            att["my_int"] = in.MyInt
            att["my_int8"] = in.MyInt8
            att["my_u_int"] = in.MyUInt
            att["my_float64"] = in.MyFloat64
            att["my_string"] = in.MyString
            att["my_bool"] = in.MyBool
            return []interface{}{att}
            }"#
        });

        let output = flatteners(&catalog, &FieldType::optional(FieldType::structure("helpergen.SimpleStruct")));
        assert!(output["flattenSimpleStruct"].starts_with("func flattenSimpleStruct(in *helpergen.SimpleStruct) []interface{} {\n"));
    }

    #[test]
    fn slice_of_structs() {
        let catalog = Catalog::new().with(
            TypeDescriptor::new("helpergen.SimpleStruct")
                .field("MyInt", PrimitiveKind::Int)
                .field("MyString", PrimitiveKind::String),
        );
        let output = flatteners(&catalog, &FieldType::sequence(FieldType::structure("helpergen.SimpleStruct")));

        assert_eq!(output["flattenSimpleStruct"], indoc! {r#"
            func flattenSimpleStruct(in []helpergen.SimpleStruct) []interface{} {
            att := make([]interface{}, len(in), len(in))
            for i, n := range in {
            m := make(map[string]interface{})
            m["my_int"] = n.MyInt
            m["my_string"] = n.MyString
            att[i] = m
            }
            return att
            }"#
        });
    }

    #[test]
    fn pointers_to_primitives() {
        let catalog = Catalog::new().with(
            TypeDescriptor::new("helpergen.SimpleStruct")
                .field("MyInt", FieldType::optional(PrimitiveKind::Int))
                .field("MyString", FieldType::optional(PrimitiveKind::String)),
        );
        let output = flatteners(&catalog, &FieldType::structure("helpergen.SimpleStruct"));

        assert_eq!(output["flattenSimpleStruct"], indoc! {r#"
            func flattenSimpleStruct(in helpergen.SimpleStruct) []interface{} {
            att := make(map[string]interface{})
            if in.MyInt != nil {
            att["my_int"] = *in.MyInt
            }
            if in.MyString != nil {
            att["my_string"] = *in.MyString
            }
            return []interface{}{att}
            }"#
        });
    }

    #[test]
    fn pointers_are_guarded_without_annotation() {
        let catalog = Catalog::new()
            .with(
                TypeDescriptor::new("api.Pod")
                    .field("Replicas", FieldType::optional(PrimitiveKind::Int32))
                    .field("Name", PrimitiveKind::String)
                    .field("Main", FieldType::optional(FieldType::structure("api.Container"))),
            )
            .with(TypeDescriptor::new("api.Container").field("Image", PrimitiveKind::String));
        let output = flatteners(&catalog, &FieldType::structure("api.Pod"));

        assert_eq!(output["flattenPod"], indoc! {r#"
            func flattenPod(in api.Pod) []interface{} {
            att := make(map[string]interface{})
            if in.Replicas != nil {
            att["replicas"] = *in.Replicas
            }
            att["name"] = in.Name
            if in.Main != nil {
            att["main"] = flattenContainer(in.Main)
            }
            return []interface{}{att}
            }"#
        });
    }

    #[test]
    fn nested_struct_generated_once() {
        let catalog = Catalog::new()
            .with(
                TypeDescriptor::new("helpergen.SimpleStruct")
                    .field("MyInt", PrimitiveKind::Int)
                    .field("MyNested", FieldType::structure("helpergen.NestedStruct"))
                    .field("OtherNested", FieldType::structure("helpergen.NestedStruct")),
            )
            .with(
                TypeDescriptor::new("helpergen.NestedStruct")
                    .field("NestedInt", PrimitiveKind::Int)
                    .field("NestedString", PrimitiveKind::String),
            );
        let output = flatteners(&catalog, &FieldType::structure("helpergen.SimpleStruct"));

        assert_eq!(output.len(), 2);
        assert_eq!(output["flattenSimpleStruct"], indoc! {r#"
            func flattenSimpleStruct(in helpergen.SimpleStruct) []interface{} {
            att := make(map[string]interface{})
            att["my_int"] = in.MyInt
            att["my_nested"] = flattenNestedStruct(in.MyNested)
            att["other_nested"] = flattenNestedStruct(in.OtherNested)
            return []interface{}{att}
            }"#
        });
        assert_eq!(output["flattenNestedStruct"], indoc! {r#"
            func flattenNestedStruct(in helpergen.NestedStruct) []interface{} {
            att := make(map[string]interface{})
            att["nested_int"] = in.NestedInt
            att["nested_string"] = in.NestedString
            return []interface{}{att}
            }"#
        });
    }

    #[test]
    fn different_shapes_get_distinct_functions() {
        let catalog = Catalog::new()
            .with(
                TypeDescriptor::new("api.Pod")
                    .field("Main", FieldType::optional(FieldType::structure("api.Container")))
                    .field("Sidecars", FieldType::sequence(FieldType::structure("api.Container"))),
            )
            .with(TypeDescriptor::new("api.Container").field("Image", PrimitiveKind::String));
        let output = flatteners(&catalog, &FieldType::structure("api.Pod"));

        assert!(output["flattenPod"].contains("att[\"main\"] = flattenContainer(in.Main)\n"));
        assert!(output["flattenPod"].contains("att[\"sidecars\"] = flattenContainerSlice(in.Sidecars)\n"));
        assert!(output["flattenContainer"].starts_with("func flattenContainer(in *api.Container) []interface{} {\n"));
        assert!(output["flattenContainerSlice"].starts_with("func flattenContainerSlice(in []api.Container) []interface{} {\n"));
    }

    #[test]
    fn primitive_collections() {
        let catalog = Catalog::new().with(
            TypeDescriptor::new("api.Spec")
                .field("Args", FieldType::sequence(PrimitiveKind::String))
                .field("Ports", FieldType::sequence(FieldType::optional(PrimitiveKind::Int32)))
                .field("Labels", FieldType::mapping(PrimitiveKind::String))
                .field("Weights", FieldType::mapping(PrimitiveKind::Float64))
                .field("Flags", FieldType::mapping(FieldType::optional(PrimitiveKind::Bool))),
        );
        let output = flatteners(&catalog, &FieldType::structure("api.Spec"));

        assert_eq!(output["flattenSpec"], indoc! {r#"
            func flattenSpec(in api.Spec) []interface{} {
            att := make(map[string]interface{})
            att["args"] = in.Args
            att["ports"] = flattenIntSlice(in.Ports)
            att["labels"] = in.Labels
            att["weights"] = flattenFloatMap(in.Weights)
            att["flags"] = flattenBoolPtrMap(in.Flags)
            return []interface{}{att}
            }"#
        });
    }

    #[test]
    fn optional_fields_are_guarded() {
        fn optional(context: &FieldContext<'_>) -> Classification {
            match context.field.name.as_str() {
                "Computed" => Classification::included().with_annotation(SchemaAnnotation {
                    optional: true,
                    computed: true,
                    ..SchemaAnnotation::default()
                }),
                "Required" => Classification::included().with_annotation(SchemaAnnotation::required()),
                _ => Classification::included().with_annotation(SchemaAnnotation::optional()),
            }
        }

        let catalog = Catalog::new()
            .with(
                TypeDescriptor::new("api.Spec")
                    .field("Count", PrimitiveKind::Int32)
                    .field("Ratio", PrimitiveKind::Float32)
                    .field("Name", PrimitiveKind::String)
                    .field("Enabled", PrimitiveKind::Bool)
                    .field("Limit", FieldType::optional(PrimitiveKind::Int64))
                    .field("Args", FieldType::sequence(PrimitiveKind::String))
                    .field("Nested", FieldType::structure("api.Nested"))
                    .field("Computed", PrimitiveKind::String)
                    .field("Required", PrimitiveKind::String),
            )
            .with(TypeDescriptor::new("api.Nested"));

        let output = HelperGenerator::new("in", "att")
            .with_field_classifier(optional)
            .flatteners_from_struct(&catalog, &FieldType::structure("api.Spec"))
            .expect("flattener generation succeeds");

        assert_eq!(output["flattenSpec"], indoc! {r#"
            func flattenSpec(in api.Spec) []interface{} {
            att := make(map[string]interface{})
            if in.Count != 0 {
            att["count"] = in.Count
            }
            if in.Ratio != 0 {
            att["ratio"] = in.Ratio
            }
            if in.Name != "" {
            att["name"] = in.Name
            }
            if in.Enabled != false {
            att["enabled"] = in.Enabled
            }
            if in.Limit != nil {
            att["limit"] = *in.Limit
            }
            if len(in.Args) > 0 {
            att["args"] = in.Args
            }
            att["nested"] = flattenNested(in.Nested)
            att["computed"] = in.Computed
            att["required"] = in.Required
            return []interface{}{att}
            }"#
        });
    }

    #[test]
    fn self_referencing_type_terminates() {
        let catalog = Catalog::new().with(
            TypeDescriptor::new("api.Node")
                .field("Value", PrimitiveKind::String)
                .field("Children", FieldType::sequence(FieldType::optional(FieldType::structure("api.Node")))),
        );
        let output = flatteners(&catalog, &FieldType::sequence(FieldType::optional(FieldType::structure("api.Node"))));

        assert_eq!(output.len(), 1);
        assert!(output["flattenNode"].contains("m[\"children\"] = flattenNode(n.Children)\n"));
    }

    #[test]
    fn unsupported_and_excluded_fields_are_skipped() {
        fn skip_secret(context: &FieldContext<'_>) -> Classification {
            if context.field.name == "Secret" {
                Classification::excluded()
            } else {
                Classification::included()
            }
        }

        let catalog = Catalog::new().with(
            TypeDescriptor::new("api.Spec")
                .field("Name", PrimitiveKind::String)
                .field("Secret", PrimitiveKind::String)
                .field("Port", FieldType::Unsupported("intstr.IntOrString".to_owned())),
        );
        let output = HelperGenerator::new("in", "att")
            .with_field_classifier(skip_secret)
            .flatteners_from_struct(&catalog, &FieldType::structure("api.Spec"))
            .expect("flattener generation succeeds");

        assert!(!output["flattenSpec"].contains("secret"));
        assert!(!output["flattenSpec"].contains("port"));
        assert!(output["flattenSpec"].contains("att[\"name\"] = in.Name\n"));
    }
}
