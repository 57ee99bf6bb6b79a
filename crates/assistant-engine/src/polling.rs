//! Task-run completion protocol.
//!
//! A run is observed only through snapshots: fetch, check `is_running`,
//! sleep, repeat. Fetches are strictly serial and a failed fetch aborts the
//! whole poll; only still-running observations are retried.

use std::future::Future;
use std::time::Duration;

use serde_json::Value;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::client::AssistantEngine;
use crate::error::{Error, Result};
use crate::models::TaskOutput;
use crate::options::TaskRunOption;
use crate::transport::Transport;

/// Cadence and budget for polling a task run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_retries: u32,
}

impl PollPolicy {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);
    pub const DEFAULT_MAX_RETRIES: u32 = 60;

    pub fn new(interval: Duration, max_retries: u32) -> Self {
        Self {
            interval,
            max_retries,
        }
    }

    /// Worst-case time spent sleeping before a timeout.
    pub fn max_wait(&self) -> Duration {
        self.interval.saturating_mul(self.max_retries)
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_INTERVAL, Self::DEFAULT_MAX_RETRIES)
    }
}

/// Poll `fetch` until it reports a finished run.
///
/// Returns `Ok(None)` once `max_retries` consecutive observations were still
/// running. With `max_retries == 0` nothing is fetched.
pub async fn poll_until_finished<F, Fut>(
    policy: &PollPolicy,
    mut fetch: F,
) -> Result<Option<TaskOutput>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<TaskOutput>>,
{
    let mut retry_count = 0;

    while retry_count < policy.max_retries {
        let output = fetch().await?;
        if !output.is_running {
            return Ok(Some(output));
        }

        debug!(
            attempt = retry_count + 1,
            max_retries = policy.max_retries,
            "Task run still running"
        );
        sleep(policy.interval).await;
        retry_count += 1;
    }

    Ok(None)
}

/// Read the run id out of an initiate-task-run response.
pub fn extract_run_id(response: &Value) -> Result<i64> {
    let missing = || Error::MissingField {
        entity: "task run",
        field: "run_id",
    };
    match response.get("run_id") {
        Some(Value::Number(n)) => n.as_i64().ok_or_else(missing),
        Some(Value::String(s)) => s.trim().parse().map_err(|_| missing()),
        _ => Err(missing()),
    }
}

impl<T: Transport> AssistantEngine<T> {
    /// Poll a task run until it is no longer running.
    pub async fn poll_task_run_until_complete(
        &self,
        task_key: &str,
        run_id: i64,
        policy: PollPolicy,
    ) -> Result<TaskOutput> {
        let finished =
            poll_until_finished(&policy, || self.get_task_run(task_key, run_id)).await?;

        match finished {
            Some(output) => {
                info!(task_key, run_id, "Task run complete");
                Ok(output)
            }
            None => {
                warn!(
                    task_key,
                    run_id,
                    max_retries = policy.max_retries,
                    "Polling exceeded the maximum number of retries"
                );
                Err(Error::PollTimeout {
                    task_key: task_key.to_string(),
                    run_id,
                    attempts: policy.max_retries,
                })
            }
        }
    }

    /// Start a task run and poll it to completion with the client's policy.
    pub async fn initiate_task_run_and_poll(
        &self,
        task_key: &str,
        option: &TaskRunOption,
    ) -> Result<TaskOutput> {
        let response = self.initiate_task_run(task_key, option).await?;
        let run_id = extract_run_id(&response)?;
        info!(task_key, run_id, "Task run initiated");

        self.poll_task_run_until_complete(task_key, run_id, self.poll_policy())
            .await
    }
}

#[cfg(test)]
#[path = "polling_tests.rs"]
mod tests;
