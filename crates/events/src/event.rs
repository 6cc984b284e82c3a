use serde::{Deserialize, Serialize, de::DeserializeOwned};

use emoney_core::{AccountId, Email};

/// Durable topic exchange every service publishes to.
pub const EXCHANGE_NAME: &str = "emoney_exchange";

pub const ACCOUNT_CREATED_ROUTING_KEY: &str = "account.created";

/// An event meant for consumers outside the publishing service.
///
/// Events are:
/// - **immutable** facts about something that already committed
/// - keyed, so a redelivered copy can be recognised and ignored
pub trait IntegrationEvent:
    Serialize + DeserializeOwned + Clone + core::fmt::Debug + Send + Sync + 'static
{
    /// Routing key on the topic exchange. Process-wide, never per call.
    const ROUTING_KEY: &'static str;

    /// Key consumers deduplicate on.
    fn idempotency_key(&self) -> String;
}

/// Published once an account row is durably committed.
///
/// Minimal on purpose: `{id, name, email}`, no credential or balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountCreated {
    pub id: AccountId,
    pub name: String,
    pub email: Email,
}

impl IntegrationEvent for AccountCreated {
    const ROUTING_KEY: &'static str = ACCOUNT_CREATED_ROUTING_KEY;

    fn idempotency_key(&self) -> String {
        self.id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_created_wire_shape() {
        let event = AccountCreated {
            id: AccountId::new(),
            name: "Alice".to_string(),
            email: Email::parse("alice@x.com").unwrap(),
        };
        let json = serde_json::to_value(&event).unwrap();
        let obj = json.as_object().unwrap();

        assert_eq!(obj.len(), 3);
        assert_eq!(obj["id"], event.id.to_string());
        assert_eq!(obj["name"], "Alice");
        assert_eq!(obj["email"], "alice@x.com");
        assert_eq!(event.idempotency_key(), event.id.to_string());
    }
}
