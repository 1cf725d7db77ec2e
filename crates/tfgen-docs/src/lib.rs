//! Markdown documentation pages for generated Terraform resources.
//!
//! A page is rendered from the [`Resource`] model the schema synthesizer
//! builds, so the documentation always matches the generated schema.

use std::{collections::BTreeMap, io};

use indoc::formatdoc;
use serde::{Deserialize, Serialize};
use snafu::{ResultExt, Snafu};
use tfgen::schema::{Elem, Resource, Schema};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to write documentation page"))]
    WritePage { source: io::Error },
}

/// Provider and resource metadata of one documentation page.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResourcePage {
    /// For example `kubernetes`.
    pub provider_key: String,

    /// For example `Kubernetes`.
    pub provider_name: String,

    /// For example `kubernetes_pod`.
    pub resource_key: String,

    /// For example `kubernetes-pod`.
    pub resource_slug: String,
}

impl ResourcePage {
    /// Renders the page for `resource`. Fields and nested blocks are listed in
    /// field name order.
    pub fn render(&self, resource: &Resource) -> String {
        let Self {
            provider_key,
            provider_name,
            resource_key,
            resource_slug,
        } = self;

        let mut page = formatdoc! {"
            ---
            layout: \"{provider_key}\"
            page_title: \"{provider_name}: {resource_key}\"
            sidebar_current: \"docs-{resource_slug}\"
            description: |-
              TODO
            ---

            # {title}

            TODO

            ## Example Usage

            ```
            resource \"{resource_key}\" \"example\" {{
              // TODO
            }}
            ```

            ## Argument Reference

            The following arguments are supported:

            ",
            title = markdown_header(resource_key),
        };
        page.push_str(&arguments(resource));

        let blocks = nested_blocks(resource);
        if !blocks.is_empty() {
            page.push_str("\n## Nested Blocks\n");
            for (name, block) in &blocks {
                page.push_str(&format!(
                    "\n### `{name}`\n\n#### Arguments\n\n{arguments}\n#### Attributes\n\n{attributes}",
                    arguments = arguments(block),
                    attributes = attributes(block),
                ));
            }
        }

        page.push_str(&formatdoc! {"

            ## Attributes Reference

            In addition to the arguments listed above, the following computed attributes are
            exported:

            {attributes}
            ## Import

            {resource_key} can be imported using its identifier, e.g.

            ```
            $ terraform import {resource_key}.example ...
            ```
            ",
            attributes = attributes(resource),
        });

        page
    }

    pub fn write_markdown(&self, resource: &Resource, writer: &mut impl io::Write) -> Result<()> {
        writer
            .write_all(self.render(resource).as_bytes())
            .context(WritePageSnafu)
    }
}

/// Escapes underscores, which Markdown would read as emphasis.
fn markdown_header(header: &str) -> String {
    header.replace('_', "\\_")
}

fn is_argument(schema: &Schema) -> bool {
    schema.required || schema.optional
}

fn is_attribute(schema: &Schema) -> bool {
    schema.computed && !schema.optional
}

fn arguments(resource: &Resource) -> String {
    let mut out = String::new();
    for (name, schema) in resource.schema.iter().filter(|(_, schema)| is_argument(schema)) {
        let presence = if schema.required { "(Required)" } else { "(Optional)" };
        let line = format!("* `{name}` - {presence} {description}", description = schema.description);
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

fn attributes(resource: &Resource) -> String {
    let mut out = String::new();
    for (name, schema) in resource.schema.iter().filter(|(_, schema)| is_attribute(schema)) {
        let line = format!("* `{name}` - {description}", description = schema.description);
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

/// Collects the nested blocks at any depth, keyed by field name.
fn nested_blocks(resource: &Resource) -> BTreeMap<&str, &Resource> {
    let mut blocks = BTreeMap::new();
    collect_nested_blocks(resource, &mut blocks);
    blocks
}

fn collect_nested_blocks<'a>(resource: &'a Resource, blocks: &mut BTreeMap<&'a str, &'a Resource>) {
    for (name, schema) in &resource.schema {
        match &schema.elem {
            Some(Elem::Resource(nested)) => {
                tracing::debug!(field = %name, "documenting nested block");
                if blocks.insert(name, nested).is_some() {
                    tracing::debug!(field = %name, "nested block documented more than once, keeping the last one");
                }
                collect_nested_blocks(nested, blocks);
            }
            Some(Elem::Schema(_)) => {
                tracing::info!(field = %name, "nested primitive elements are not documented, skipping");
            }
            None => {}
        }
    }
}
