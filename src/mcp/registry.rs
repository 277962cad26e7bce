//! MCP Tool Registry
//!
//! Binds every catalog descriptor to its handler. The binding is checked once
//! at startup, so a request can never reach a tool without an implementation.

use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use super::args::ToolArgs;
use super::catalog::ToolCatalog;
use super::context::ToolContext;
use super::protocol::ToolDefinition;
use super::tools;
use crate::erp::ErpError;

// ============================================================================
// Tool Types
// ============================================================================

/// Result type for tool execution: the raw ERP response
pub type ToolResult = Result<Value, ErpError>;

/// Boxed future for async tool execution
pub type ToolFuture = Pin<Box<dyn Future<Output = ToolResult> + Send>>;

/// Tool handler function type
pub type ToolHandler = Arc<dyn Fn(ToolContext, ToolArgs) -> ToolFuture + Send + Sync>;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Catalog tools without a handler: {}", .0.join(", "))]
    MissingHandler(Vec<String>),

    #[error("Handlers without a catalog entry: {}", .0.join(", "))]
    UnknownHandler(Vec<String>),

    #[error("Tool registered twice: {0}")]
    DuplicateTool(String),

    #[error("Invalid tool catalog: {0}")]
    InvalidCatalog(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error(transparent)]
    Erp(#[from] ErpError),
}

/// Handlers collected by name before being matched against the catalog.
#[derive(Default)]
pub struct HandlerTable {
    handlers: HashMap<&'static str, ToolHandler>,
    duplicates: Vec<&'static str>,
}

impl HandlerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F, Fut>(&mut self, name: &'static str, handler: F)
    where
        F: Fn(ToolContext, ToolArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ToolResult> + Send + 'static,
    {
        let handler: ToolHandler = Arc::new(move |ctx, args| Box::pin(handler(ctx, args)));
        if self.handlers.insert(name, handler).is_some() {
            self.duplicates.push(name);
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

// ============================================================================
// Registry
// ============================================================================

pub struct RegisteredTool {
    pub definition: ToolDefinition,
    handler: ToolHandler,
}

pub struct McpRegistry {
    tools: Vec<RegisteredTool>,
    index: HashMap<String, usize>,
}

impl McpRegistry {
    /// Pairs catalog entries with handlers, failing on any mismatch.
    pub fn new(catalog: ToolCatalog, handlers: HandlerTable) -> Result<Self, RegistryError> {
        let HandlerTable {
            mut handlers,
            duplicates,
        } = handlers;

        if let Some(name) = duplicates.first() {
            return Err(RegistryError::DuplicateTool(name.to_string()));
        }

        let missing: BTreeSet<String> = catalog
            .tools()
            .iter()
            .filter(|tool| !handlers.contains_key(tool.name.as_str()))
            .map(|tool| tool.name.clone())
            .collect();
        if !missing.is_empty() {
            return Err(RegistryError::MissingHandler(missing.into_iter().collect()));
        }

        let unknown: BTreeSet<String> = handlers
            .keys()
            .filter(|name| catalog.get(name).is_none())
            .map(|name| name.to_string())
            .collect();
        if !unknown.is_empty() {
            return Err(RegistryError::UnknownHandler(unknown.into_iter().collect()));
        }

        let mut tools = Vec::with_capacity(catalog.len());
        let mut index = HashMap::with_capacity(catalog.len());
        for definition in catalog.tools() {
            if let Some(handler) = handlers.remove(definition.name.as_str()) {
                index.insert(definition.name.clone(), tools.len());
                tools.push(RegisteredTool {
                    definition: definition.clone(),
                    handler,
                });
            }
        }

        Ok(Self { tools, index })
    }

    /// Embedded catalog with every ERP tool handler.
    pub fn with_all_tools() -> Result<Self, RegistryError> {
        let mut handlers = HandlerTable::new();
        tools::register_all_tools(&mut handlers);
        Self::new(ToolCatalog::embedded()?, handlers)
    }

    /// Tool descriptors in catalog order.
    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|tool| tool.definition.clone())
            .collect()
    }

    pub fn get_tool(&self, name: &str) -> Option<&RegisteredTool> {
        self.index.get(name).map(|i| &self.tools[*i])
    }

    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }

    /// Runs the named tool and returns the raw ERP response.
    pub async fn dispatch(
        &self,
        name: &str,
        arguments: Value,
        ctx: ToolContext,
    ) -> Result<Value, DispatchError> {
        let tool = self
            .get_tool(name)
            .ok_or_else(|| DispatchError::UnknownTool(name.to_string()))?;
        tracing::debug!("Tenant {} calling {}", ctx.tenant_id(), name);
        let handler = tool.handler.clone();
        Ok(handler(ctx, ToolArgs::new(arguments)).await?)
    }
}
