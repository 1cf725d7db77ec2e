//! Every literal fragment of generated source lives here.
//!
//! The generators decide *what* to emit and call into this module to spell it.
//! Each fragment is a small function with named slots.

use crate::{
    naming::quote,
    schema::{Elem, Resource, Schema},
};

/// The shared function declaration template.
pub fn function(name: &str, arguments: &str, outputs: &str, body: &str) -> String {
    format!("func {name}({arguments}) {outputs} {{\n{body}\n}}")
}

/// A schema literal, one attribute per line.
pub fn schema(schema: &Schema) -> String {
    let mut out = String::from("&schema.Schema{\n");
    for attribute in schema_attributes(schema) {
        out.push_str(&attribute);
        out.push('\n');
    }
    out.push('}');
    out
}

/// A schema literal on a single line, used for primitive set and map elements.
pub fn compact_schema(schema: &Schema) -> String {
    format!("&schema.Schema{{{attributes}}}", attributes = schema_attributes(schema).concat())
}

/// A nested resource with its fields sorted by name.
pub fn resource(resource: &Resource) -> String {
    let mut out = String::from("&schema.Resource{\nSchema: map[string]*schema.Schema{\n");
    for (name, field) in &resource.schema {
        out.push_str(&format!("{name}: {field},\n", name = quote(name), field = self::schema(field)));
    }
    out.push_str("},\n}");
    out
}

/// A top-level variable holding a schema map.
pub fn schema_map(variable: &str, fields: &[(String, String)]) -> String {
    let mut out = format!("var {variable} = map[string]*schema.Schema{{\n");
    for (name, field) in fields {
        out.push_str(&format!("{name}: {field},\n", name = quote(name)));
    }
    out.push('}');
    out
}

fn schema_attributes(schema: &Schema) -> Vec<String> {
    let mut attributes = vec![format!("Type: schema.{value_type},", value_type = schema.value_type)];

    if !schema.description.is_empty() {
        attributes.push(format!("Description: {description},", description = quote(&schema.description)));
    }
    if schema.required {
        attributes.push("Required: true,".to_owned());
    }
    if schema.optional {
        attributes.push("Optional: true,".to_owned());
    }
    if schema.force_new {
        attributes.push("ForceNew: true,".to_owned());
    }
    if schema.computed {
        attributes.push("Computed: true,".to_owned());
    }
    if !schema.conflicts_with.is_empty() {
        let paths: Vec<String> = schema.conflicts_with.iter().map(|path| quote(path)).collect();
        attributes.push(format!("ConflictsWith: []string{{{paths}}},", paths = paths.join(", ")));
    }
    if let Some(max_items) = schema.max_items {
        attributes.push(format!("MaxItems: {max_items},"));
    }
    match &schema.elem {
        Some(Elem::Schema(elem)) => attributes.push(format!("Elem: {elem},", elem = compact_schema(elem))),
        Some(Elem::Resource(elem)) => attributes.push(format!("Elem: {elem},", elem = resource(elem))),
        None => {}
    }
    if schema.hash_strings {
        attributes.push("Set: schema.HashString,".to_owned());
    }

    attributes
}

/// Reads `field` of `receiver`.
pub fn field_access(receiver: &str, field: &str) -> String {
    format!("{receiver}.{field}")
}

/// Reads the key `key` of the map `map`.
pub fn map_entry(map: &str, key: &str) -> String {
    format!("{map}[{key}]", key = quote(key))
}

pub fn call(function: &str, argument: &str) -> String {
    format!("{function}({argument})")
}

pub fn deref(value: &str) -> String {
    format!("*{value}")
}

pub fn type_assertion(value: &str, type_name: &str) -> String {
    format!("{value}.({type_name})")
}

pub fn assign(target: &str, value: &str) -> String {
    format!("{target} = {value}\n")
}

/// Wraps `statements` in an `if` block.
pub fn guarded(condition: &str, statements: &str) -> String {
    format!("if {condition} {{\n{statements}}}\n")
}

pub fn not_equal(value: &str, zero: &str) -> String {
    format!("{value} != {zero}")
}

pub fn not_empty(value: &str) -> String {
    format!("len({value}) > 0")
}

pub mod flatten {
    /// Start of a flattener for a single value.
    pub fn single_begin(map: &str) -> String {
        format!("{map} := make(map[string]interface{{}})\n")
    }

    pub fn single_end(map: &str) -> String {
        format!("return []interface{{}}{{{map}}}")
    }

    /// Start of a flattener for a collection. Each element `element` of
    /// `input` is flattened into its own `map`.
    pub fn collection_begin(output: &str, input: &str, element: &str, map: &str) -> String {
        format!(
            "{output} := make([]interface{{}}, len({input}), len({input}))\nfor i, {element} := range {input} {{\n{map} := make(map[string]interface{{}})\n"
        )
    }

    pub fn collection_end(output: &str, map: &str) -> String {
        format!("{output}[i] = {map}\n}}\nreturn {output}")
    }

    pub fn outputs() -> &'static str {
        "[]interface{}"
    }
}

pub mod expand {
    pub const ARGUMENTS: &str = "l []interface{}";

    /// The early return for an empty input. `zero` is the zero value of the
    /// returned type.
    pub fn empty_guard(zero: &str) -> String {
        format!("if len(l) == 0 || l[0] == nil {{\nreturn {zero}\n}}\n")
    }

    pub fn single_begin(config: &str, output: &str, literal_type: &str) -> String {
        format!("{config} := l[0].(map[string]interface{{}})\n{output} := {literal_type}{{\n")
    }

    pub fn collection_begin(config: &str, output: &str, collection_type: &str, literal_type: &str) -> String {
        format!(
            "{output} := make({collection_type}, len(l), len(l))\nfor i, n := range l {{\n{config} := n.(map[string]interface{{}})\n{output}[i] = {literal_type}{{\n"
        )
    }

    pub fn literal_end() -> &'static str {
        "}\n"
    }

    pub fn collection_end() -> &'static str {
        "}\n"
    }

    pub fn end(output: &str) -> String {
        format!("return {output}")
    }

    /// One field of the struct literal.
    pub fn literal_field(field: &str, value: &str) -> String {
        format!("{field}: {value},\n")
    }

    /// A field assigned only when present in the configuration map.
    pub fn outline_field(read: &str, extra_condition: Option<&str>, target: &str, value: &str) -> String {
        let condition = match extra_condition {
            Some(extra) => format!("ok && {extra}"),
            None => "ok".to_owned(),
        };
        format!("if v, ok := {read}; {condition} {{\n{target} = {value}\n}}\n")
    }
}

pub mod patch {
    pub const ARGUMENTS: &str = "keyPrefix, pathPrefix string, d *schema.ResourceData";
    pub const OUTPUTS: &str = "PatchOperations";

    pub fn begin() -> &'static str {
        "ops := make([]PatchOperation, 0, 0)\n"
    }

    pub fn end() -> &'static str {
        "return ops"
    }

    /// Replaces the value at `path` when `key` changed.
    pub fn replace(key: &str, path: &str, value: &str) -> String {
        format!(
            "if d.HasChange(keyPrefix+{key}) {{\nops = append(ops, &ReplaceOperation{{\nPath:  pathPrefix+{path},\nValue: {value},\n}})\n}}\n",
            key = super::quote(key),
            path = super::quote(path),
        )
    }

    /// Reads the new value of `key`.
    pub fn get(key: &str) -> String {
        format!("d.Get(keyPrefix+{key})", key = super::quote(key))
    }

    /// Diffs the map at `key` with a typed helper.
    pub fn diff_map(key: &str, path: &str, helper: &str) -> String {
        let key = super::quote(key);
        let path = super::quote(&format!("{path}/"));
        format!(
            "if d.HasChange(keyPrefix+{key}) {{\noldV, newV := d.GetChange(keyPrefix+{key})\ndiffOps := {helper}(pathPrefix+{path}, oldV.(map[string]interface{{}}), newV.(map[string]interface{{}}))\nops = append(ops, diffOps...)\n}}\n"
        )
    }

    /// Collects the operations of a nested structure.
    pub fn nested(function: &str, key: &str, path: &str) -> String {
        let key = super::quote(&format!("{key}.0."));
        let path = super::quote(&format!("{path}/"));
        format!("ops = append(ops, {function}(keyPrefix+{key}, pathPrefix+{path}, d)...)\n")
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;
    use crate::schema::ValueType;

    #[test]
    fn function_template() {
        let rendered = function("flattenFoo", "in api.Foo", "[]interface{}", "return nil");
        assert_eq!(rendered, "func flattenFoo(in api.Foo) []interface{} {\nreturn nil\n}");
    }

    #[test]
    fn schema_attribute_order() {
        let mut literal = Schema::new(ValueType::String);
        literal.description = "Some text".to_owned();
        literal.computed = true;
        literal.force_new = true;
        literal.optional = true;
        literal.conflicts_with = vec!["a".to_owned(), "b.0.c".to_owned()];

        assert_eq!(schema(&literal), indoc! {r#"
            &schema.Schema{
            Type: schema.TypeString,
            Description: "Some text",
            Optional: true,
            ForceNew: true,
            Computed: true,
            ConflictsWith: []string{"a", "b.0.c"},
            }"#
        });
    }

    #[test]
    fn compact_element() {
        let mut set = Schema::new(ValueType::Set);
        set.elem = Some(Elem::Schema(Box::new(Schema::new(ValueType::String))));
        set.hash_strings = true;

        assert_eq!(
            schema(&set),
            "&schema.Schema{\nType: schema.TypeSet,\nElem: &schema.Schema{Type: schema.TypeString,},\nSet: schema.HashString,\n}"
        );
    }

    #[test]
    fn resource_and_schema_map() {
        let mut nested = Resource::default();
        nested.schema.insert("image".to_owned(), Schema::new(ValueType::String));
        nested.schema.insert("args".to_owned(), Schema::new(ValueType::List));

        assert_eq!(resource(&nested), indoc! {r#"
            &schema.Resource{
            Schema: map[string]*schema.Schema{
            "args": &schema.Schema{
            Type: schema.TypeList,
            },
            "image": &schema.Schema{
            Type: schema.TypeString,
            },
            },
            }"#
        });

        let fields = [("name".to_owned(), "nameField".to_owned()), ("port".to_owned(), "portField".to_owned())];
        assert_eq!(
            schema_map("fields", &fields),
            "var fields = map[string]*schema.Schema{\n\"name\": nameField,\n\"port\": portField,\n}"
        );
    }

    #[test]
    fn patch_replace() {
        assert_eq!(patch::replace("my_int", "myInt", &patch::get("my_int")), indoc! {r#"
            if d.HasChange(keyPrefix+"my_int") {
            ops = append(ops, &ReplaceOperation{
            Path:  pathPrefix+"myInt",
            Value: d.Get(keyPrefix+"my_int"),
            })
            }
        "#});
    }

    #[test]
    fn outline_field() {
        assert_eq!(
            expand::outline_field(r#"cfg["my_int"].(int)"#, None, "obj.MyInt", "v"),
            "if v, ok := cfg[\"my_int\"].(int); ok {\nobj.MyInt = v\n}\n"
        );
        assert_eq!(
            expand::outline_field(r#"cfg["tags"].([]interface{})"#, Some("len(v) > 0"), "obj.Tags", "sliceOfString(v)"),
            "if v, ok := cfg[\"tags\"].([]interface{}); ok && len(v) > 0 {\nobj.Tags = sliceOfString(v)\n}\n"
        );
    }
}
