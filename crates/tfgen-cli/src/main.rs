use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use snafu::{ResultExt, Snafu};
use strum::IntoEnumIterator;
use tfgen::introspect::IntrospectOptions;
use tfgen_cli::{builtin::BuiltinType, generate, logging, manifest::Manifest, yaml};

const LOG_ENV: &str = "TFGEN_LOG";

#[derive(Debug, Snafu)]
enum Error {
    #[snafu(display("failed to load manifest"))]
    LoadManifest { source: tfgen_cli::manifest::Error },

    #[snafu(display("failed to run generation jobs"))]
    Generate { source: generate::Error },

    #[snafu(display("failed to introspect {builtin}"))]
    Introspect {
        source: tfgen::introspect::Error,
        builtin: BuiltinType,
    },

    #[snafu(display("failed to print introspection of {builtin}"))]
    PrintIntrospection { source: yaml::Error, builtin: BuiltinType },
}

/// Generates Terraform provider sources from Kubernetes API types.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Runs every job of a manifest.
    Generate {
        #[arg(short, long, env = "TFGEN_MANIFEST")]
        manifest: PathBuf,

        #[arg(short, long, env = "TFGEN_OUTPUT_DIR", default_value = ".")]
        output_dir: PathBuf,
    },

    /// Prints the introspected catalog of a builtin type as YAML.
    Describe {
        #[arg(value_enum)]
        builtin: BuiltinType,

        /// The package prefix for types without one.
        #[arg(long, default_value = "api")]
        package: String,
    },

    /// Lists the builtin types.
    Types,
}

#[snafu::report]
fn main() -> Result<(), Error> {
    let cli = Cli::parse();
    logging::initialize_logging(LOG_ENV);

    match cli.command {
        Command::Generate { manifest, output_dir } => {
            let parsed = Manifest::from_file(&manifest).context(LoadManifestSnafu)?;
            let manifest_dir = manifest.parent().unwrap_or_else(|| Path::new("."));
            generate::run(&parsed, manifest_dir, &output_dir).context(GenerateSnafu)?;
        }
        Command::Describe { builtin, package } => {
            let introspection = builtin
                .introspect(&IntrospectOptions { package })
                .context(IntrospectSnafu { builtin })?;
            yaml::write_introspection(&introspection, std::io::stdout())
                .context(PrintIntrospectionSnafu { builtin })?;
        }
        Command::Types => {
            for builtin in BuiltinType::iter() {
                println!("{builtin}");
            }
        }
    }

    Ok(())
}
