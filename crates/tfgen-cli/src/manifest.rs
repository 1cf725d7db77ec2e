//! The YAML manifest describing which sources to generate.
//!
//! ```yaml
//! package: kubernetes
//! jobs:
//!   - output: schema_pod_spec.go
//!     input:
//!       builtin: PodSpec
//!     kind: schema
//!     variable: podSpecFields
//!     classifier: kubernetes
//! ```
use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use snafu::{ResultExt, Snafu};
use strum::IntoStaticStr;
use tfgen::{
    classify::{Classification, FieldClassifier, FieldContext, IncludeAll},
    helpers::HelperGenerator,
    introspect::IntrospectOptions,
    k8s::{KubernetesClassifier, Selection},
    schema::SchemaGenerator,
};
use tfgen_docs::ResourcePage;

use crate::builtin::BuiltinType;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to read manifest from {path:?}"))]
    ReadManifest { source: std::io::Error, path: PathBuf },

    #[snafu(display("failed to parse manifest {path:?}"))]
    ParseManifest {
        source: serde_yaml::Error,
        path: PathBuf,
    },
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Manifest {
    /// The package clause of every generated Go file.
    pub package: String,

    #[serde(default)]
    pub introspection: IntrospectOptions,

    pub jobs: Vec<Job>,
}

impl Manifest {
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).context(ReadManifestSnafu { path })?;
        serde_yaml::from_str(&contents).context(ParseManifestSnafu { path })
    }
}

/// One generated file.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    /// Relative to the output directory.
    pub output: PathBuf,

    pub input: Input,

    #[serde(flatten)]
    pub generator: Generator,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Input {
    Builtin(BuiltinType),

    /// A JSON Schema document, relative to the manifest. `root` names the
    /// definition to start from, or the document itself if it has no such
    /// definition.
    JsonSchema { path: PathBuf, root: String },
}

#[derive(Clone, Debug, Deserialize, IntoStaticStr, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Generator {
    #[serde(rename_all = "camelCase")]
    Schema {
        variable: String,

        #[serde(default)]
        classifier: ClassifierKind,

        #[serde(default)]
        primitive_sequences_as_lists: bool,
    },

    #[serde(rename_all = "camelCase")]
    Flatteners {
        #[serde(default = "Generator::default_flattener_input")]
        input_var: String,

        #[serde(default = "Generator::default_flattener_output")]
        output_var: String,

        #[serde(default)]
        classifier: ClassifierKind,
    },

    #[serde(rename_all = "camelCase")]
    Expanders {
        #[serde(default = "Generator::default_expander_input")]
        input_var: String,

        #[serde(default = "Generator::default_expander_output")]
        output_var: String,

        #[serde(default)]
        classifier: ClassifierKind,
    },

    #[serde(rename_all = "camelCase")]
    PatchOps {
        #[serde(default)]
        classifier: ClassifierKind,

        /// Has to match the schema job of the same type.
        #[serde(default)]
        primitive_sequences_as_lists: bool,
    },

    #[serde(rename_all = "camelCase")]
    Docs {
        #[serde(flatten)]
        page: ResourcePage,

        #[serde(default)]
        classifier: ClassifierKind,
    },
}

impl Generator {
    fn default_flattener_input() -> String {
        "in".to_owned()
    }

    fn default_flattener_output() -> String {
        "att".to_owned()
    }

    fn default_expander_input() -> String {
        "cfg".to_owned()
    }

    fn default_expander_output() -> String {
        "obj".to_owned()
    }
}

/// Decides which fields are emitted.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ClassifierKind {
    /// Every field, without annotations.
    #[default]
    All,

    /// Fields and annotations derived from the Kubernetes API documentation.
    Kubernetes,
}

impl ClassifierKind {
    fn classifier(self, selection: Selection) -> Classifier {
        match self {
            Self::All => Classifier::All(IncludeAll),
            Self::Kubernetes => Classifier::Kubernetes(KubernetesClassifier::default().with_selection(selection)),
        }
    }

    pub fn schema_generator(self) -> SchemaGenerator {
        SchemaGenerator::new().with_classifier(self.classifier(Selection::All))
    }

    pub fn flattener_generator(self, input_var: &str, output_var: &str) -> HelperGenerator {
        HelperGenerator::new(input_var, output_var).with_field_classifier(self.classifier(Selection::All))
    }

    /// Required fields become part of the literal, optional ones are assigned
    /// afterwards.
    pub fn expander_generator(self, input_var: &str, output_var: &str) -> HelperGenerator {
        let generator = HelperGenerator::new(input_var, output_var);
        match self {
            Self::All => generator,
            Self::Kubernetes => generator
                .with_inline_classifier(self.classifier(Selection::RequiredOnly))
                .with_outline_classifier(self.classifier(Selection::OptionalOnly)),
        }
    }

    pub fn patch_generator(self, primitive_sequences_as_lists: bool) -> HelperGenerator {
        HelperGenerator::new("d", "ops")
            .with_field_classifier(self.classifier(Selection::All))
            .with_primitive_sequences_as_lists(primitive_sequences_as_lists)
    }
}

enum Classifier {
    All(IncludeAll),
    Kubernetes(KubernetesClassifier),
}

impl FieldClassifier for Classifier {
    fn classify(&self, context: &FieldContext<'_>) -> Classification {
        match self {
            Self::All(classifier) => classifier.classify(context),
            Self::Kubernetes(classifier) => classifier.classify(context),
        }
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    fn parse(manifest: &str) -> Manifest {
        serde_yaml::from_str(manifest).expect("manifest parses")
    }

    #[test]
    fn parse_every_generator() {
        let manifest = parse(indoc! {"
            package: kubernetes
            jobs:
              - output: schema_pod_spec.go
                input:
                  builtin: PodSpec
                kind: schema
                variable: podSpecFields
                classifier: kubernetes
              - output: flatten.go
                input:
                  jsonSchema:
                    path: widget.json
                    root: Widget
                kind: flatteners
              - output: expand.go
                input:
                  builtin: Container
                kind: expanders
                outputVar: out
              - output: patch.go
                input:
                  builtin: Volume
                kind: patch-ops
                primitiveSequencesAsLists: true
              - output: docs/pod.html.markdown
                input:
                  builtin: PodSpec
                kind: docs
                providerKey: kubernetes
                providerName: Kubernetes
                resourceKey: kubernetes_pod
                resourceSlug: kubernetes-pod
        "});

        assert_eq!(manifest.package, "kubernetes");
        assert_eq!(manifest.introspection, IntrospectOptions::default());
        assert_eq!(manifest.jobs.len(), 5);

        assert_eq!(manifest.jobs[0].input, Input::Builtin(BuiltinType::PodSpec));
        assert_eq!(manifest.jobs[0].generator, Generator::Schema {
            variable: "podSpecFields".to_owned(),
            classifier: ClassifierKind::Kubernetes,
            primitive_sequences_as_lists: false,
        });

        assert_eq!(manifest.jobs[1].input, Input::JsonSchema {
            path: PathBuf::from("widget.json"),
            root: "Widget".to_owned(),
        });
        assert_eq!(manifest.jobs[1].generator, Generator::Flatteners {
            input_var: "in".to_owned(),
            output_var: "att".to_owned(),
            classifier: ClassifierKind::All,
        });

        assert_eq!(manifest.jobs[2].generator, Generator::Expanders {
            input_var: "cfg".to_owned(),
            output_var: "out".to_owned(),
            classifier: ClassifierKind::All,
        });
        assert_eq!(manifest.jobs[3].generator, Generator::PatchOps {
            classifier: ClassifierKind::All,
            primitive_sequences_as_lists: true,
        });
        assert_eq!(manifest.jobs[4].generator, Generator::Docs {
            page: ResourcePage {
                provider_key: "kubernetes".to_owned(),
                provider_name: "Kubernetes".to_owned(),
                resource_key: "kubernetes_pod".to_owned(),
                resource_slug: "kubernetes-pod".to_owned(),
            },
            classifier: ClassifierKind::All,
        });
    }

    #[test]
    fn custom_package_prefix() {
        let manifest = parse(indoc! {"
            package: widgets
            introspection:
              package: widgetapi
            jobs: []
        "});

        assert_eq!(manifest.introspection.package, "widgetapi");
        assert!(manifest.jobs.is_empty());
    }

    #[test]
    fn unknown_generator_kind() {
        let result = serde_yaml::from_str::<Manifest>(indoc! {"
            package: kubernetes
            jobs:
              - output: out.go
                input:
                  builtin: PodSpec
                kind: deep-copy
        "});

        assert!(result.is_err());
    }

    #[test]
    fn missing_manifest_file() {
        let error = Manifest::from_file(Path::new("/nonexistent/tfgen.yaml")).expect_err("file does not exist");
        assert!(matches!(error, Error::ReadManifest { .. }));
    }
}
