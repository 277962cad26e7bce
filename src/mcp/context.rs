//! MCP Tool Execution Context

use std::sync::Arc;

use super::session::Session;
use crate::erp::TinyClient;

/// Context provided to tool handlers during execution
#[derive(Clone, Debug)]
pub struct ToolContext {
    /// Session the call arrived on (tenant identity)
    pub session: Arc<Session>,

    /// ERP client bound to the session's upstream credential
    pub client: TinyClient,
}

impl ToolContext {
    pub fn new(session: Arc<Session>, client: TinyClient) -> Self {
        Self { session, client }
    }

    pub fn tenant_id(&self) -> &str {
        &self.session.tenant.tenant_id
    }
}
