//! Domain events published to NATS after commit.

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreEvent {
    OrderPlaced {
        sale_id: Uuid,
        customer_id: Uuid,
        total: Decimal,
    },
}

impl StoreEvent {
    pub fn subject(&self) -> &'static str {
        match self {
            Self::OrderPlaced { .. } => "shopfront.orders.placed",
        }
    }
}

/// Best-effort publish: checkout has already committed, so a publish failure
/// is logged and swallowed.
pub async fn publish(client: &async_nats::Client, event: &StoreEvent) {
    let payload = match serde_json::to_vec(event) {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::warn!(error = %err, "failed to serialize store event");
            return;
        }
    };
    if let Err(err) = client.publish(event.subject().to_string(), payload.into()).await {
        tracing::warn!(error = %err, subject = event.subject(), "failed to publish store event");
    }
}
