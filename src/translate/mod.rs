//! Value Translation Layer
//!
//! Bidirectional mapping between the declarative model (tri-state
//! [`Value`](crate::domain::value::Value) trees shaped by the schema
//! registry) and the wire model (Zentral JSON records).

pub mod codec;
pub mod composite;
pub mod primitives;
pub mod records;

pub use codec::{
    BackendCodec, CustomViewCodec, DeclarationCodec, EntityCodec, Record, SantaRuleCodec, SchemaCodec,
    SoftwareUpdateEnforcementCodec,
};
pub use composite::{decode_block, encode_block};
pub use records::{BackendUnion, BackendVariant, CertIssuerBackend, RepositoryBackend};
