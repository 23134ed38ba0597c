//! Transport bindings derived from a resolved service.
//!
//! - [`http`] builds the per-endpoint HTTP plan (routes, parameter sources, formats).
//! - [`rpc`] synthesizes the per-service RPC message schema.

pub mod http;
pub mod rpc;

pub use self::http::{HttpBinding, MethodRoute, ParamBinding, ParamKind, PayloadFormat};
pub use self::rpc::{MessageId, RpcMethod, SchemaField, SchemaMessage, SchemaSet};
