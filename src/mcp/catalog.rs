//! Static tool catalog advertised through `tools/list`.

use std::collections::HashSet;

use super::protocol::ToolDefinition;
use super::registry::RegistryError;

/// Catalog shipped with the binary.
const EMBEDDED_CATALOG: &str = include_str!("../../catalog/tools.json");

/// Ordered, immutable list of tool descriptors.
#[derive(Debug, Clone)]
pub struct ToolCatalog {
    tools: Vec<ToolDefinition>,
}

impl ToolCatalog {
    pub fn embedded() -> Result<Self, RegistryError> {
        Self::from_json(EMBEDDED_CATALOG)
    }

    /// Parses a JSON array of `{name, description, inputSchema}` objects.
    /// Tool names must be unique.
    pub fn from_json(json: &str) -> Result<Self, RegistryError> {
        let tools: Vec<ToolDefinition> = serde_json::from_str(json)?;
        Self::from_tools(tools)
    }

    pub fn from_tools(tools: Vec<ToolDefinition>) -> Result<Self, RegistryError> {
        let mut seen = HashSet::new();
        for tool in &tools {
            if !seen.insert(tool.name.as_str()) {
                return Err(RegistryError::DuplicateTool(tool.name.clone()));
            }
        }
        Ok(Self { tools })
    }

    pub fn tools(&self) -> &[ToolDefinition] {
        &self.tools
    }

    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.iter().find(|tool| tool.name == name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
