use crate::queue::QueuePolicy;
use serde::{Deserialize, Deserializer};
use std::time::Duration;

/// Default time the user has to answer a prompt on the Ledger
pub const DEFAULT_LEDGER_TIMEOUT: Duration = Duration::from_secs(30);

/// Default capacity of the progress event channel
pub const DEFAULT_EVENT_CAPACITY: usize = 16;

/// Settings of a [`SigningCoordinator`](crate::SigningCoordinator).
///
/// Can be loaded from JSON, all fields are optional:
///
/// ```
/// use algosign_coordinator::{CoordinatorConfig, QueuePolicy};
/// use std::time::Duration;
///
/// let config: CoordinatorConfig =
///     serde_json::from_str(r#"{ "ledger_timeout_ms": 5000, "queue_policy": "continue" }"#)?;
/// assert_eq!(config.ledger_timeout, Some(Duration::from_secs(5)));
/// assert_eq!(config.queue_policy, QueuePolicy::Continue);
/// assert_eq!(config.event_capacity, 16);
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// How long a single Ledger operation may take, `None` waits forever
    #[serde(rename = "ledger_timeout_ms", deserialize_with = "deserialize_millis")]
    pub ledger_timeout: Option<Duration>,
    /// What the queue does with pending Ledger requests after a failure
    pub queue_policy: QueuePolicy,
    /// Capacity of the progress event channel
    pub event_capacity: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            ledger_timeout: Some(DEFAULT_LEDGER_TIMEOUT),
            queue_policy: QueuePolicy::HaltOnFailure,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl CoordinatorConfig {
    #[must_use]
    pub fn ledger_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.ledger_timeout = timeout;
        self
    }

    #[must_use]
    pub fn queue_policy(mut self, policy: QueuePolicy) -> Self {
        self.queue_policy = policy;
        self
    }

    #[must_use]
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }
}

fn deserialize_millis<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
}
