use crate::ids::{AccountId, BrokerId, CurrencyCode};

/// Structured domain events the engine emits (C8, §4.8/§6.1).
///
/// These are data, not log lines — `tracing` covers ambient operational
/// logging separately. A `Publisher` forwards each variant to whatever
/// external bus the host wires up (message queue, websocket fan-out, ...);
/// this crate only defines the shape.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "MsgType")]
pub enum DomainEvent {
    /// `U3` — emitted on every balance mutation (§4.1, §6.1).
    #[serde(rename = "U3")]
    BalanceUpdate {
        #[serde(rename = "ClientID")]
        account_id: AccountId,
        broker_id: BrokerId,
        currency: CurrencyCode,
        new_balance: i64,
    },

    /// `B11` — emitted on `User.set_verified` transitions (§4.8).
    #[serde(rename = "B11")]
    VerificationUpdate {
        #[serde(rename = "ClientID")]
        account_id: AccountId,
        #[serde(rename = "BrokerID")]
        broker_id: BrokerId,
        username: String,
        verified: i32,
        verification_data: Option<String>,
    },

    /// `C` — an e-mail job, plus a copy delivered to the `EMAIL` topic
    /// (§4.8, §6.1). `email_type` is always `"0"` per the wire schema;
    /// carried as a field rather than implied so downstream consumers
    /// needn't special-case it.
    #[serde(rename = "C")]
    EmailJob {
        email_thread_id: String,
        to: String,
        subject: String,
        language: String,
        email_type: String,
        raw_data: String,
        template: String,
        params: serde_json::Value,
    },
}

impl DomainEvent {
    pub fn email(
        email_thread_id: impl Into<String>,
        to: impl Into<String>,
        subject: impl Into<String>,
        language: impl Into<String>,
        template: impl Into<String>,
        raw_data: impl Into<String>,
        params: serde_json::Value,
    ) -> Self {
        let raw_data = raw_data.into();
        DomainEvent::EmailJob {
            email_thread_id: email_thread_id.into(),
            to: to.into(),
            subject: subject.into(),
            language: language.into(),
            email_type: "0".to_string(),
            template: template.into(),
            raw_data,
            params,
        }
    }

    /// Topic this event is published to, mirroring `publish(topic, event)`
    /// (§4.8). E-mail jobs additionally fan out to the `EMAIL` topic —
    /// callers do that second publish themselves (see `Publisher::emit`).
    pub fn topic(&self) -> &'static str {
        match self {
            DomainEvent::BalanceUpdate { .. } => "BALANCE",
            DomainEvent::VerificationUpdate { .. } => "VERIFICATION",
            DomainEvent::EmailJob { .. } => "USER",
        }
    }
}

/// Fire-and-forget event sink (§4.8). `publish` must not block the caller
/// on anything beyond handing the event to the transport; the matcher and
/// settlement code treat it as a suspension point (§5), never as a place
/// errors propagate back into the state machine.
pub trait Publisher {
    fn publish(&self, topic: &str, event: &DomainEvent);

    /// Publishes `event` on its own topic, plus a copy on `EMAIL` when it's
    /// an e-mail job (§4.8: "plus a copy to the `EMAIL` topic").
    fn emit(&self, event: &DomainEvent) {
        self.publish(event.topic(), event);
        if matches!(event, DomainEvent::EmailJob { .. }) {
            self.publish("EMAIL", event);
        }
    }
}

/// A `Publisher` that drops every event, for tests/dry runs that don't
/// care about the event stream.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullPublisher;

impl Publisher for NullPublisher {
    fn publish(&self, _topic: &str, _event: &DomainEvent) {}
}

/// A `Publisher` that records every event it receives, in order, for
/// assertions in tests.
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    events: std::sync::Mutex<Vec<(String, DomainEvent)>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<(String, DomainEvent)> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }
}

impl Publisher for RecordingPublisher {
    fn publish(&self, topic: &str, event: &DomainEvent) {
        self.events
            .lock()
            .unwrap()
            .push((topic.to_string(), event.clone()));
    }
}
