// Tool Registry
//
// Ordered set of tools, built once at startup and read-only afterwards.
// Shape problems are rejected here rather than discovered per call.

use tracing::debug;

use super::definition::{FieldType, ParameterSpec, ToolDefinition, ToolDescriptor};
use crate::error::{DispatchError, RegistryError};

#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: Vec<ToolDefinition>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool, rejecting empty or duplicate names and required fields
    /// missing from the schema (at any nesting level).
    pub fn register(&mut self, tool: ToolDefinition) -> Result<(), RegistryError> {
        if tool.name().trim().is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.tools.iter().any(|t| t.name() == tool.name()) {
            return Err(RegistryError::DuplicateTool(tool.name().to_string()));
        }
        check_required_declared(tool.name(), tool.parameters())?;

        debug!(tool = tool.name(), "registered tool");
        self.tools.push(tool);
        Ok(())
    }

    /// Builder-style `register`
    pub fn with_tool(mut self, tool: ToolDefinition) -> Result<Self, RegistryError> {
        self.register(tool)?;
        Ok(self)
    }

    /// Discovery listing in registration order
    pub fn list_tools(&self) -> Vec<ToolDescriptor> {
        self.tools.iter().map(ToolDefinition::descriptor).collect()
    }

    pub fn find_tool(&self, name: &str) -> Result<&ToolDefinition, DispatchError> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .ok_or_else(|| DispatchError::UnknownTool(name.to_string()))
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(ToolDefinition::name).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

fn check_required_declared(tool: &str, spec: &ParameterSpec) -> Result<(), RegistryError> {
    if let Some(field) = spec.required_fields().iter().find(|f| !spec.declares(f)) {
        return Err(RegistryError::UndeclaredRequiredField {
            tool: tool.to_string(),
            field: field.clone(),
        });
    }
    for (_, field) in spec.fields() {
        if let FieldType::Object(nested) = &field.field_type {
            check_required_declared(tool, nested)?;
        }
    }
    Ok(())
}
