//! Model Context Protocol surface: JSON-RPC handling, sessions and the tool registry.

pub mod args;
pub mod catalog;
pub mod context;
pub mod handler;
pub mod protocol;
pub mod registry;
pub mod session;
pub mod tools;

pub use catalog::ToolCatalog;
pub use context::ToolContext;
pub use handler::{create_mcp_state, McpState, SERVER_NAME};
pub use registry::{DispatchError, McpRegistry, RegistryError};
pub use session::{InMemorySessionStore, Session, SessionManager, SessionStore, TenantIdentity};
