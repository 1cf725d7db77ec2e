//! Runs the jobs of a [`Manifest`] and writes the generated files.
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use snafu::{ResultExt, Snafu};
use tfgen::{
    declaration,
    introspect::{self, IntrospectOptions, Introspection},
    render,
};

use crate::manifest::{Generator, Input, Job, Manifest};

const SCHEMA_IMPORT: &str = "import \"github.com/hashicorp/terraform/helper/schema\"";

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to read JSON Schema document {path:?}"))]
    ReadSchemaDocument { source: std::io::Error, path: PathBuf },

    #[snafu(display("failed to parse JSON Schema document {path:?}"))]
    ParseSchemaDocument {
        source: serde_json::Error,
        path: PathBuf,
    },

    #[snafu(display("failed to introspect the input of {output:?}"))]
    Introspect {
        source: introspect::Error,
        output: PathBuf,
    },

    #[snafu(display("failed to generate the schema of {output:?}"))]
    GenerateSchema {
        source: tfgen::schema::Error,
        output: PathBuf,
    },

    #[snafu(display("failed to generate the helper functions of {output:?}"))]
    GenerateHelpers {
        source: tfgen::helpers::Error,
        output: PathBuf,
    },

    #[snafu(display("failed to create output directory {path:?}"))]
    CreateOutputDirectory { source: std::io::Error, path: PathBuf },

    #[snafu(display("failed to write generated file {path:?}"))]
    WriteOutput { source: std::io::Error, path: PathBuf },
}

/// Runs every job of `manifest` and returns the paths of the written files.
///
/// JSON Schema inputs are resolved relative to `manifest_dir`, outputs
/// relative to `output_dir`.
pub fn run(manifest: &Manifest, manifest_dir: &Path, output_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(manifest.jobs.len());

    for job in &manifest.jobs {
        let contents = render_job(manifest, job, manifest_dir)?;

        let path = output_dir.join(&job.output);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context(CreateOutputDirectorySnafu { path: parent })?;
        }
        fs::write(&path, contents).context(WriteOutputSnafu { path: &path })?;

        let kind: &'static str = (&job.generator).into();
        tracing::info!(path = %path.display(), kind, "generated file");
        written.push(path);
    }

    Ok(written)
}

/// Renders the contents of the file a job produces.
pub fn render_job(manifest: &Manifest, job: &Job, manifest_dir: &Path) -> Result<String> {
    let output = &job.output;
    let Introspection { catalog, root } = introspect(&job.input, &manifest.introspection, manifest_dir, output)?;
    let package = &manifest.package;

    let contents = match &job.generator {
        Generator::Schema {
            variable,
            classifier,
            primitive_sequences_as_lists,
        } => {
            let fields: Vec<(String, String)> = classifier
                .schema_generator()
                .with_primitive_sequences_as_lists(*primitive_sequences_as_lists)
                .from_struct(&catalog, &root)
                .context(GenerateSchemaSnafu { output })?
                .into_iter()
                .collect();

            format!(
                "package {package}\n\n{SCHEMA_IMPORT}\n\n{schema_map}\n",
                schema_map = render::schema_map(variable, &fields)
            )
        }
        Generator::Flatteners {
            input_var,
            output_var,
            classifier,
        } => {
            let functions = classifier
                .flattener_generator(input_var, output_var)
                .flatteners_from_struct(&catalog, &root)
                .context(GenerateHelpersSnafu { output })?;

            helper_unit(package, None, "Flatteners", &functions)
        }
        Generator::Expanders {
            input_var,
            output_var,
            classifier,
        } => {
            let functions = classifier
                .expander_generator(input_var, output_var)
                .expanders_from_struct(&catalog, &root)
                .context(GenerateHelpersSnafu { output })?;

            helper_unit(package, None, "Expanders", &functions)
        }
        Generator::PatchOps {
            classifier,
            primitive_sequences_as_lists,
        } => {
            let functions = classifier
                .patch_generator(*primitive_sequences_as_lists)
                .patch_ops_from_struct(&catalog, &root)
                .context(GenerateHelpersSnafu { output })?;

            helper_unit(package, Some(SCHEMA_IMPORT), "Patch operations", &functions)
        }
        Generator::Docs { page, classifier } => {
            let resource = classifier
                .schema_generator()
                .resource_from_struct(&catalog, &root)
                .context(GenerateSchemaSnafu { output })?;

            page.render(&resource)
        }
    };

    Ok(contents)
}

fn introspect(input: &Input, options: &IntrospectOptions, manifest_dir: &Path, output: &Path) -> Result<Introspection> {
    match input {
        Input::Builtin(builtin) => {
            tracing::debug!(%builtin, "introspecting builtin type");
            builtin.introspect(options).context(IntrospectSnafu { output })
        }
        Input::JsonSchema { path, root } => {
            let path = manifest_dir.join(path);
            tracing::debug!(path = %path.display(), root, "introspecting JSON Schema document");

            let contents = fs::read_to_string(&path).context(ReadSchemaDocumentSnafu { path: &path })?;
            let document: serde_json::Value = serde_json::from_str(&contents).context(ParseSchemaDocumentSnafu { path: &path })?;
            introspect::from_json_schema(root, &document, options).context(IntrospectSnafu { output })
        }
    }
}

/// A Go source file holding the generated functions in name order.
fn helper_unit(
    package: &str,
    import: Option<&str>,
    section: &str,
    functions: &BTreeMap<String, String>,
) -> String {
    let mut unit = format!("package {package}\n\n");
    if let Some(import) = import {
        unit.push_str(import);
        unit.push_str("\n\n");
    }
    unit.push_str(&format!(
        "// {section}\n\n{functions}\n",
        functions = declaration::render_source(functions)
    ));
    unit
}
