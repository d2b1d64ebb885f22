// Tool Definitions
//
// Declarative description of a tool: name, description, parameter schema
// and the handler that performs it.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Arguments passed to a tool, keyed by parameter name
pub type ToolArguments = Map<String, Value>;

/// Primitive or composite type of a declared parameter
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Array(Box<FieldType>),
    Object(ParameterSpec),
}

impl FieldType {
    fn to_schema(&self) -> Value {
        match self {
            FieldType::String => json!({"type": "string"}),
            FieldType::Number => json!({"type": "number"}),
            FieldType::Boolean => json!({"type": "boolean"}),
            FieldType::Array(items) => json!({"type": "array", "items": items.to_schema()}),
            FieldType::Object(spec) => spec.to_json_schema(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub field_type: FieldType,
    pub description: Option<String>,
}

impl FieldSpec {
    pub fn new(field_type: FieldType, description: impl Into<String>) -> Self {
        Self {
            field_type,
            description: Some(description.into()),
        }
    }

    pub fn string(description: impl Into<String>) -> Self {
        Self::new(FieldType::String, description)
    }

    pub fn number(description: impl Into<String>) -> Self {
        Self::new(FieldType::Number, description)
    }

    pub fn boolean(description: impl Into<String>) -> Self {
        Self::new(FieldType::Boolean, description)
    }

    pub fn array_of(items: FieldType, description: impl Into<String>) -> Self {
        Self::new(FieldType::Array(Box::new(items)), description)
    }

    pub fn object(spec: ParameterSpec, description: impl Into<String>) -> Self {
        Self::new(FieldType::Object(spec), description)
    }

    fn to_schema(&self) -> Value {
        let mut schema = self.field_type.to_schema();
        if let (Some(description), Some(object)) = (&self.description, schema.as_object_mut()) {
            object.insert("description".to_string(), Value::String(description.clone()));
        }
        schema
    }
}

/// Object-shaped parameter schema with an ordered list of required fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSpec {
    fields: Vec<(String, FieldSpec)>,
    required: Vec<String>,
}

impl ParameterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.fields.push((name.into(), spec));
        self
    }

    pub fn required<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn required_fields(&self) -> &[String] {
        &self.required
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.fields.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    pub fn declares(&self, name: &str) -> bool {
        self.fields.iter().any(|(field, _)| field == name)
    }

    /// First required field, in declaration order, absent from `arguments`.
    ///
    /// Only presence is checked; value types are not.
    pub fn first_missing(&self, arguments: &ToolArguments) -> Option<&str> {
        self.required
            .iter()
            .find(|name| !arguments.contains_key(name.as_str()))
            .map(String::as_str)
    }

    /// Render as a JSON-schema `object`
    pub fn to_json_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|(name, spec)| (name.clone(), spec.to_schema()))
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": self.required,
        })
    }
}

/// Executes a tool call.
///
/// Any error is reported to the caller as a tool execution failure.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, arguments: ToolArguments) -> anyhow::Result<Value>;
}

#[async_trait]
impl<F, Fut> ToolHandler for F
where
    F: Fn(ToolArguments) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
{
    async fn call(&self, arguments: ToolArguments) -> anyhow::Result<Value> {
        (self)(arguments).await
    }
}

/// A registered tool; immutable once built
#[derive(Clone)]
pub struct ToolDefinition {
    name: String,
    description: String,
    parameters: ParameterSpec,
    handler: Arc<dyn ToolHandler>,
}

impl ToolDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: ParameterSpec,
        handler: impl ToolHandler + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            handler: Arc::new(handler),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn parameters(&self) -> &ParameterSpec {
        &self.parameters
    }

    pub fn handler(&self) -> Arc<dyn ToolHandler> {
        Arc::clone(&self.handler)
    }

    /// Discovery view published by `tools/list`
    pub fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name.clone(),
            description: self.description.clone(),
            input_schema: self.parameters.to_json_schema(),
        }
    }
}

impl fmt::Debug for ToolDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDefinition")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> ParameterSpec {
        ParameterSpec::new()
            .field(
                "transaction",
                FieldSpec::object(
                    ParameterSpec::new()
                        .field("amount", FieldSpec::number("Amount"))
                        .required(["amount"]),
                    "Transaction details",
                ),
            )
            .field("payment_methods", FieldSpec::array_of(FieldType::String, "Methods"))
            .field("is_recurring", FieldSpec::boolean("Recurring"))
            .required(["transaction", "is_recurring"])
    }

    #[test]
    fn test_json_schema_shape() {
        let schema = spec().to_json_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"], json!(["transaction", "is_recurring"]));
        assert_eq!(schema["properties"]["transaction"]["type"], "object");
        assert_eq!(schema["properties"]["transaction"]["description"], "Transaction details");
        assert_eq!(schema["properties"]["transaction"]["required"], json!(["amount"]));
        assert_eq!(schema["properties"]["payment_methods"]["items"]["type"], "string");
        assert_eq!(schema["properties"]["is_recurring"]["type"], "boolean");
    }

    #[test]
    fn test_first_missing_follows_declaration_order() {
        let spec = spec();
        let mut args = ToolArguments::new();
        assert_eq!(spec.first_missing(&args), Some("transaction"));

        args.insert("transaction".into(), json!({}));
        assert_eq!(spec.first_missing(&args), Some("is_recurring"));

        // presence only: a wrongly typed value still counts
        args.insert("is_recurring".into(), json!("yes"));
        assert_eq!(spec.first_missing(&args), None);
    }

    #[tokio::test]
    async fn test_closure_handler() {
        let echo = |args: ToolArguments| async move { Ok::<_, anyhow::Error>(Value::Object(args)) };
        let tool = ToolDefinition::new("echo", "Echo arguments", ParameterSpec::new(), echo);
        let mut args = ToolArguments::new();
        args.insert("x".into(), json!(1));
        let value = tool.handler().call(args).await.unwrap();
        assert_eq!(value, json!({"x": 1}));
        assert_eq!(tool.descriptor().input_schema["type"], "object");
    }
}
