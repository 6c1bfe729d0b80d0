//! Service status values and the manager abstraction.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;

use super::error::ServiceControlError;

/// Current state of a service as reported by the service manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ServiceStatus {
    /// Not running.
    Stopped,
    /// Starting up.
    StartPending,
    /// Shutting down.
    StopPending,
    /// Running.
    Running,
    /// Resuming from pause.
    ContinuePending,
    /// Pausing.
    PausePending,
    /// Paused.
    Paused,
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Stopped => "Stopped",
            Self::StartPending => "StartPending",
            Self::StopPending => "StopPending",
            Self::Running => "Running",
            Self::ContinuePending => "ContinuePending",
            Self::PausePending => "PausePending",
            Self::Paused => "Paused",
        };
        formatter.write_str(label)
    }
}

impl FromStr for ServiceStatus {
    type Err = ServiceControlError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim() {
            "Stopped" => Ok(Self::Stopped),
            "StartPending" => Ok(Self::StartPending),
            "StopPending" => Ok(Self::StopPending),
            "Running" => Ok(Self::Running),
            "ContinuePending" => Ok(Self::ContinuePending),
            "PausePending" => Ok(Self::PausePending),
            "Paused" => Ok(Self::Paused),
            other => Err(ServiceControlError::UnknownStatus(other.to_owned())),
        }
    }
}

/// Status a transition waits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionTarget {
    /// Waiting for [`ServiceStatus::Stopped`].
    Stopped,
    /// Waiting for [`ServiceStatus::Running`].
    Running,
}

impl TransitionTarget {
    /// Whether `status` completes the transition.
    #[must_use]
    pub fn is_reached(self, status: ServiceStatus) -> bool {
        match self {
            Self::Stopped => status == ServiceStatus::Stopped,
            Self::Running => status == ServiceStatus::Running,
        }
    }
}

impl fmt::Display for TransitionTarget {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => formatter.write_str("stopped"),
            Self::Running => formatter.write_str("running"),
        }
    }
}

/// Poll cadence and optional bound for a service transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Sleep between status polls.
    pub interval: Duration,
    /// Maximum wait; `None` polls until the transition completes.
    pub timeout: Option<Duration>,
}

impl PollPolicy {
    /// Polls at `interval` with no upper bound.
    #[must_use]
    pub const fn unbounded(interval: Duration) -> Self {
        Self {
            interval,
            timeout: None,
        }
    }

    /// Polls at `interval` for at most `timeout`.
    #[must_use]
    pub const fn bounded(interval: Duration, timeout: Duration) -> Self {
        Self {
            interval,
            timeout: Some(timeout),
        }
    }
}

impl From<&provision_config::Config> for PollPolicy {
    fn from(config: &provision_config::Config) -> Self {
        Self {
            interval: config.poll_interval(),
            timeout: config.service_timeout(),
        }
    }
}

/// Commands and observes services through the operating system.
pub trait ServiceManager {
    /// Reports the service status, or `None` when the service is not installed.
    fn query(&self, name: &str) -> Result<Option<ServiceStatus>, ServiceControlError>;

    /// Issues a forced stop.
    fn stop(&self, name: &str) -> Result<(), ServiceControlError>;

    /// Issues a start; starting a running service is not an error.
    fn start(&self, name: &str) -> Result<(), ServiceControlError>;
}
