//! Generates Terraform provider source from structured type descriptions.
//!
//! The input is a [`descriptor::Catalog`] of structured types, usually built by
//! [`introspect`] from a JSON Schema document or a Kubernetes API type. From a
//! root type the generators produce:
//!
//! - schema declarations ([`schema::SchemaGenerator`]),
//! - flatteners, expanders and patch operations ([`helpers::HelperGenerator`]).
//!
//! Which fields are emitted, and with which annotations, is decided by a
//! [`classify::FieldClassifier`]. [`k8s::KubernetesClassifier`] derives the
//! annotations of Kubernetes API fields from their documentation.
pub mod classify;
pub mod declaration;
pub mod descriptor;
pub mod helpers;
pub mod introspect;
pub mod k8s;
pub mod naming;
pub mod render;
pub mod schema;
pub mod walker;
