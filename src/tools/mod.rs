// Tools
//
// Tool definitions, the registry that holds them, the dispatcher that runs
// them and the Acquired.com tools themselves.

pub mod definition;
pub mod dispatcher;
pub mod payment;
pub mod payment_link;
pub mod registry;

use std::sync::Arc;

pub use definition::{FieldSpec, FieldType, ParameterSpec, ToolArguments, ToolDefinition, ToolDescriptor, ToolHandler};
pub use dispatcher::{Dispatcher, Envelope, ErrorBody, InvocationRequest};
pub use payment::{create_payment_tool, CREATE_PAYMENT};
pub use payment_link::{create_payment_link_tool, CREATE_PAYMENT_LINK};
pub use registry::ToolRegistry;

use crate::error::RegistryError;
use crate::gateway::AcquiredClient;

/// The full Acquired.com tool set, in discovery order
pub fn acquired_registry(client: Arc<AcquiredClient>) -> Result<ToolRegistry, RegistryError> {
    ToolRegistry::new()
        .with_tool(create_payment_link_tool(Arc::clone(&client)))?
        .with_tool(create_payment_tool(client))
}
