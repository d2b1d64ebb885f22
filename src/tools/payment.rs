// create_payment Tool
//
// Thin wrapper over `POST /payments`. Also hosts the schema fragments and
// the forwarding handler shared with the payment-link tool.

use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use super::definition::{FieldSpec, ParameterSpec, ToolArguments, ToolDefinition, ToolHandler};
use crate::gateway::AcquiredClient;

pub const CREATE_PAYMENT: &str = "create_payment";

/// Posts the argument map verbatim to a fixed endpoint and returns the
/// parsed response untouched
pub struct ApiForwarder {
    client: Arc<AcquiredClient>,
    endpoint: &'static str,
    action: &'static str,
}

impl ApiForwarder {
    pub fn new(client: Arc<AcquiredClient>, endpoint: &'static str, action: &'static str) -> Self {
        Self { client, endpoint, action }
    }
}

#[async_trait]
impl ToolHandler for ApiForwarder {
    async fn call(&self, arguments: ToolArguments) -> anyhow::Result<Value> {
        info!(endpoint = self.endpoint, "forwarding tool arguments");
        self.client
            .post(self.endpoint, Value::Object(arguments))
            .await
            .with_context(|| format!("failed to {}", self.action))
    }
}

pub(crate) fn transaction_field() -> FieldSpec {
    FieldSpec::object(
        ParameterSpec::new()
            .field("order_id", FieldSpec::string("The unique order ID for the transaction."))
            .field("amount", FieldSpec::number("The amount for the transaction."))
            .field("currency", FieldSpec::string("The currency for the transaction."))
            .field("capture", FieldSpec::boolean("Whether to capture the payment immediately."))
            .field("custom_data", FieldSpec::string("Custom data associated with the transaction."))
            .required(["order_id", "amount", "currency", "capture", "custom_data"]),
        "Transaction details.",
    )
}

pub(crate) fn tds_field() -> FieldSpec {
    FieldSpec::object(
        ParameterSpec::new()
            .field("is_active", FieldSpec::boolean("Whether 3-D Secure is active."))
            .field(
                "challenge_preference",
                FieldSpec::string("The challenge preference for 3-D Secure."),
            )
            .field("contact_url", FieldSpec::string("The contact URL for customer inquiries."))
            .required(["is_active", "challenge_preference", "contact_url"]),
        "3-D Secure settings.",
    )
}

pub(crate) fn customer_field() -> FieldSpec {
    FieldSpec::object(
        ParameterSpec::new()
            .field("customer_id", FieldSpec::string("The ID of the customer."))
            .required(["customer_id"]),
        "Customer details.",
    )
}

fn payment_field() -> FieldSpec {
    FieldSpec::object(
        ParameterSpec::new()
            .field("reference", FieldSpec::string("A reference for the payment."))
            .field("card_id", FieldSpec::string("The ID of the card to be used for payment."))
            .required(["reference", "card_id"]),
        "Payment details.",
    )
}

pub fn create_payment_tool(client: Arc<AcquiredClient>) -> ToolDefinition {
    let parameters = ParameterSpec::new()
        .field("transaction", transaction_field())
        .field("payment", payment_field())
        .field("customer", customer_field())
        .field("tds", tds_field())
        .required(["transaction", "payment", "customer", "tds"]);

    ToolDefinition::new(
        CREATE_PAYMENT,
        "Create a payment using Acquired.com API.",
        parameters,
        ApiForwarder::new(client, "/payments", "create payment"),
    )
}
