use k8s_openapi::api::core::v1;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};
use tfgen::introspect::{self, IntrospectOptions, Introspection};

/// Kubernetes API types the generator can introspect without a schema file.
#[derive(
    Clone, Copy, Debug, Deserialize, Display, EnumIter, Hash, PartialEq, Eq, Serialize, clap::ValueEnum,
)]
#[value(rename_all = "PascalCase")]
pub enum BuiltinType {
    PodSpec,
    PersistentVolumeSpec,
    ServiceSpec,
    ReplicationControllerSpec,
    Container,
    Volume,
}

impl BuiltinType {
    pub fn introspect(self, options: &IntrospectOptions) -> introspect::Result<Introspection> {
        match self {
            Self::PodSpec => introspect::from_schemars::<v1::PodSpec>(options),
            Self::PersistentVolumeSpec => introspect::from_schemars::<v1::PersistentVolumeSpec>(options),
            Self::ServiceSpec => introspect::from_schemars::<v1::ServiceSpec>(options),
            Self::ReplicationControllerSpec => introspect::from_schemars::<v1::ReplicationControllerSpec>(options),
            Self::Container => introspect::from_schemars::<v1::Container>(options),
            Self::Volume => introspect::from_schemars::<v1::Volume>(options),
        }
    }
}
