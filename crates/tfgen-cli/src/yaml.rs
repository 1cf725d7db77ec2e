//! Prints an [`Introspection`] as a YAML document for `tfgen describe`.
use std::io::Write;

use snafu::{ResultExt, Snafu};
use tfgen::introspect::Introspection;

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to write the header of the catalog document"))]
    WriteHeader { source: std::io::Error },

    #[snafu(display("failed to serialize the catalog of {root}"))]
    SerializeCatalog { source: serde_yaml::Error, root: String },
}

/// Writes the catalog as one YAML document, preceded by a comment naming the
/// root type.
pub fn write_introspection(introspection: &Introspection, mut writer: impl Write) -> Result<()> {
    let Introspection { catalog, root } = introspection;

    writeln!(writer, "# root: {root}\n---").context(WriteHeaderSnafu)?;
    serde_yaml::to_writer(writer, catalog).context(SerializeCatalogSnafu {
        root: root.to_string(),
    })
}
