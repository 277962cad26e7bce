//! Tiny ERP v2 upstream: payload codec, HTTP transport and typed client.

pub mod client;
pub mod codec;
mod error;
pub mod transport;

pub use client::{AccountKind, FormPayload, FormValue, Record, TinyClient};
pub use codec::{CodecError, EncodedJson, NestedPayload};
pub use error::ErpError;
pub use transport::{HttpTransport, UpstreamTransport};
