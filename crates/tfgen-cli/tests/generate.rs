use std::{fs, path::Path, process::Command};

use indoc::indoc;
use insta::assert_snapshot;
use tempfile::TempDir;
use tfgen_cli::{generate, manifest::Manifest};

const WIDGET_SCHEMA: &str = indoc! {r#"
    {
      "$defs": {
        "Widget": {
          "type": "object",
          "required": ["name"],
          "properties": {
            "name": {
              "type": "string",
              "description": "The name."
            },
            "replicas": {
              "type": "integer",
              "format": "int32"
            }
          }
        }
      }
    }
"#};

const WIDGET_MANIFEST: &str = indoc! {"
    package: widgets
    jobs:
      - output: schema_widget.go
        input:
          jsonSchema:
            path: widget.json
            root: Widget
        kind: schema
        variable: widgetSchema
      - output: structures_widget.go
        input:
          jsonSchema:
            path: widget.json
            root: Widget
        kind: flatteners
      - output: expanders_widget.go
        input:
          jsonSchema:
            path: widget.json
            root: Widget
        kind: expanders
      - output: patch/widget.go
        input:
          jsonSchema:
            path: widget.json
            root: Widget
        kind: patch-ops
      - output: docs/widget.html.markdown
        input:
          jsonSchema:
            path: widget.json
            root: Widget
        kind: docs
        providerKey: widgets
        providerName: Widgets
        resourceKey: widgets_widget
        resourceSlug: widgets-widget
"};

/// Writes the widget schema and manifest into a scratch directory and returns
/// the directory together with the manifest path.
fn workspace() -> (TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().expect("failed to create scratch directory");
    fs::write(dir.path().join("widget.json"), WIDGET_SCHEMA).expect("failed to write schema");

    let manifest = dir.path().join("tfgen.yaml");
    fs::write(&manifest, WIDGET_MANIFEST).expect("failed to write manifest");
    (dir, manifest)
}

fn read(dir: &Path, file: &str) -> String {
    fs::read_to_string(dir.join(file)).unwrap_or_else(|error| panic!("failed to read {file}: {error}"))
}

#[test]
fn generate_every_job() {
    let (dir, manifest_path) = workspace();
    let out = dir.path().join("out");

    let manifest = Manifest::from_file(&manifest_path).expect("manifest parses");
    let written = generate::run(&manifest, dir.path(), &out).expect("generation succeeds");
    assert_eq!(written.len(), 5);

    assert_snapshot!(read(&out, "schema_widget.go"), @r#"
    package widgets

    import "github.com/hashicorp/terraform/helper/schema"

    var widgetSchema = map[string]*schema.Schema{
    "name": &schema.Schema{
    Type: schema.TypeString,
    Description: "The name.",
    },
    "replicas": &schema.Schema{
    Type: schema.TypeInt,
    },
    }
    "#);

    assert_snapshot!(read(&out, "structures_widget.go"), @r#"
    package widgets

    // Flatteners

    func flattenWidget(in api.Widget) []interface{} {
    att := make(map[string]interface{})
    att["name"] = in.Name
    if in.Replicas != nil {
    att["replicas"] = *in.Replicas
    }
    return []interface{}{att}
    }
    "#);

    let expanders = read(&out, "expanders_widget.go");
    assert!(expanders.starts_with("package widgets\n\n// Expanders\n\nfunc expandWidget(l []interface{}) api.Widget {\n"));
    assert!(expanders.contains("Name: cfg[\"name\"].(string),\n"));

    let patches = read(&out, "patch/widget.go");
    assert!(patches.contains(
        "func patchWidget(keyPrefix, pathPrefix string, d *schema.ResourceData) PatchOperations {\n"
    ));
    assert!(patches.contains("Value: d.Get(keyPrefix+\"replicas\").(int),\n"));

    let docs = read(&out, "docs/widget.html.markdown");
    assert!(docs.starts_with("---\nlayout: \"widgets\"\n"));
    assert!(docs.contains("# widgets\\_widget\n"));
}

#[test]
fn custom_package_prefix() {
    let (dir, manifest_path) = workspace();
    let mut manifest = Manifest::from_file(&manifest_path).expect("manifest parses");
    manifest.introspection.package = "widgetv1".to_owned();
    manifest.jobs.truncate(2);

    let written = generate::run(&manifest, dir.path(), dir.path()).expect("generation succeeds");
    assert_eq!(written.len(), 2);

    let flatteners = read(dir.path(), "structures_widget.go");
    assert!(flatteners.contains("func flattenWidget(in widgetv1.Widget) []interface{} {\n"));
}

#[test]
fn invalid_root_aborts_generation() {
    let (dir, manifest_path) = workspace();
    let mut manifest = Manifest::from_file(&manifest_path).expect("manifest parses");
    manifest.jobs[0].input = tfgen_cli::manifest::Input::JsonSchema {
        path: "widget.json".into(),
        root: "Gadget".to_owned(),
    };

    let error = generate::run(&manifest, dir.path(), dir.path()).expect_err("Gadget is not defined");
    assert!(matches!(error, generate::Error::Introspect { .. }));
    assert!(!dir.path().join("schema_widget.go").exists());
}

#[test]
fn cli_lists_builtin_types() {
    let output = Command::new(env!("CARGO_BIN_EXE_tfgen"))
        .arg("types")
        .output()
        .expect("failed to run tfgen");

    assert!(output.status.success());
    assert_snapshot!(String::from_utf8_lossy(&output.stdout), @r"
    PodSpec
    PersistentVolumeSpec
    ServiceSpec
    ReplicationControllerSpec
    Container
    Volume
    ");
}

#[test]
fn cli_generates_from_manifest() {
    let (dir, manifest_path) = workspace();
    let out = dir.path().join("generated");

    let status = Command::new(env!("CARGO_BIN_EXE_tfgen"))
        .arg("generate")
        .arg("--manifest")
        .arg(&manifest_path)
        .arg("--output-dir")
        .arg(&out)
        .status()
        .expect("failed to run tfgen");

    assert!(status.success());
    assert!(out.join("schema_widget.go").is_file());
    assert!(out.join("docs/widget.html.markdown").is_file());
}

#[test]
fn cli_fails_on_missing_manifest() {
    let dir = tempfile::tempdir().expect("failed to create scratch directory");

    let output = Command::new(env!("CARGO_BIN_EXE_tfgen"))
        .arg("generate")
        .arg("--manifest")
        .arg(dir.path().join("missing.yaml"))
        .output()
        .expect("failed to run tfgen");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to load manifest"));
}
