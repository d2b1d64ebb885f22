// create_payment_link Tool
//
// Wraps `POST /payment-links`: a hosted checkout link for a transaction.

use std::sync::Arc;

use super::definition::{FieldSpec, FieldType, ParameterSpec, ToolDefinition};
use super::payment::{customer_field, tds_field, transaction_field, ApiForwarder};
use crate::gateway::AcquiredClient;

pub const CREATE_PAYMENT_LINK: &str = "create_payment_link";

pub fn create_payment_link_tool(client: Arc<AcquiredClient>) -> ToolDefinition {
    let payment = FieldSpec::object(
        ParameterSpec::new()
            .field("reference", FieldSpec::string("A reference for the payment."))
            .required(["reference"]),
        "Payment details.",
    );

    let parameters = ParameterSpec::new()
        .field("transaction", transaction_field())
        .field("payment", payment)
        .field("customer", customer_field())
        .field("tds", tds_field())
        .field("is_recurring", FieldSpec::boolean("Whether the payment is recurring."))
        .field("count_retry", FieldSpec::number("The number of retry attempts for the payment."))
        .field(
            "expires_in",
            FieldSpec::number("The expiration time for the payment link in seconds."),
        )
        .field(
            "redirect_url",
            FieldSpec::string("The URL to redirect the customer after payment."),
        )
        .field("webhook_url", FieldSpec::string("The URL for webhook notifications."))
        .field(
            "payment_methods",
            FieldSpec::array_of(FieldType::String, "The payment methods to be accepted."),
        )
        .field("submit_type", FieldSpec::string("The type of submission for the payment."))
        .required([
            "transaction",
            "payment",
            "tds",
            "is_recurring",
            "count_retry",
            "expires_in",
            "redirect_url",
            "webhook_url",
            "payment_methods",
            "submit_type",
        ]);

    ToolDefinition::new(
        CREATE_PAYMENT_LINK,
        "Create a payment link using Acquired.com API.",
        parameters,
        ApiForwarder::new(client, "/payment-links", "create payment link"),
    )
}
