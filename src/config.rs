use std::time::Duration;

use figment::{
    providers::{Env, Serialized},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::executors::step_executor::RetryPolicy;

pub const ENV_PREFIX: &str = "TRAVEL_SAGA_";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SagaConfig {
    /// How long a booked trip waits for the user to confirm.
    pub confirmation_timeout_secs: u64,
    pub max_attempts: u32,
    pub attempt_timeout_secs: u64,
    pub retry_backoff_millis: u64,
    /// A saga lock older than this may be taken over. Must outlast a full
    /// saga run including the confirmation wait.
    pub lock_timeout_secs: u64,
}

impl Default for SagaConfig {
    fn default() -> SagaConfig {
        SagaConfig {
            confirmation_timeout_secs: 120,
            max_attempts: 3,
            attempt_timeout_secs: 10,
            retry_backoff_millis: 0,
            lock_timeout_secs: 600,
        }
    }
}

impl SagaConfig {
    /// Defaults overridden by `TRAVEL_SAGA_*` environment variables.
    pub fn load() -> Result<Self, figment::Error> {
        Self::from_figment(Figment::from(Serialized::defaults(SagaConfig::default())))
    }

    pub fn from_figment(figment: Figment) -> Result<Self, figment::Error> {
        figment.merge(Env::prefixed(ENV_PREFIX)).extract()
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            attempt_timeout: Duration::from_secs(self.attempt_timeout_secs),
            backoff: Duration::from_millis(self.retry_backoff_millis),
        }
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs)
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_secs(self.lock_timeout_secs)
    }
}
