//! Stop-wait-confirm and start-wait-confirm loops.

use std::thread;
use std::time::Instant;

use super::error::{ServiceControlError, ServiceError};
use super::types::{PollPolicy, ServiceManager, ServiceStatus, TransitionTarget};

/// Drives a service to a target status and blocks until it is observed.
pub struct ServiceController<'a> {
    manager: &'a dyn ServiceManager,
    policy: PollPolicy,
}

impl<'a> ServiceController<'a> {
    /// Creates a controller polling `manager` according to `policy`.
    #[must_use]
    pub fn new(manager: &'a dyn ServiceManager, policy: PollPolicy) -> Self {
        Self { manager, policy }
    }

    /// Reports the current status, or `None` when the service is missing.
    pub fn status(&self, name: &str) -> Result<Option<ServiceStatus>, ServiceError> {
        Ok(self.manager.query(name)?)
    }

    /// Stops the service and waits until it reports [`ServiceStatus::Stopped`].
    ///
    /// A service that is not installed is left alone: nothing is stopped and
    /// the call succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Control`] when the manager fails and
    /// [`ServiceError::Timeout`] when the poll policy's bound elapses.
    pub fn stop(&self, name: &str) -> Result<(), ServiceError> {
        let Some(status) = self.manager.query(name)? else {
            tracing::info!(
                target: "agent_provision::service",
                service = name,
                "service is not installed; nothing to stop"
            );
            return Ok(());
        };
        tracing::info!(
            target: "agent_provision::service",
            service = name,
            %status,
            "stopping service"
        );
        self.manager.stop(name)?;
        self.wait_for(name, TransitionTarget::Stopped, |_| Ok(()))
    }

    /// Starts the service and waits until it reports [`ServiceStatus::Running`].
    ///
    /// The start command is re-issued on every poll so a service that drops
    /// back to stopped while starting is nudged again.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Control`] when the manager fails (including a
    /// missing service) and [`ServiceError::Timeout`] when the poll policy's
    /// bound elapses.
    pub fn start(&self, name: &str) -> Result<(), ServiceError> {
        tracing::info!(target: "agent_provision::service", service = name, "starting service");
        self.manager.start(name)?;
        self.wait_for(name, TransitionTarget::Running, |manager| manager.start(name))
    }

    fn wait_for<F>(
        &self,
        name: &str,
        target: TransitionTarget,
        mut nudge: F,
    ) -> Result<(), ServiceError>
    where
        F: FnMut(&dyn ServiceManager) -> Result<(), ServiceControlError>,
    {
        // A bound too large to represent as an instant never elapses.
        let deadline = self
            .policy
            .timeout
            .and_then(|timeout| Instant::now().checked_add(timeout));
        loop {
            match self.manager.query(name)? {
                Some(status) if target.is_reached(status) => {
                    tracing::info!(
                        target: "agent_provision::service",
                        service = name,
                        %status,
                        "service transition complete"
                    );
                    return Ok(());
                }
                Some(status) => {
                    tracing::debug!(
                        target: "agent_provision::service",
                        service = name,
                        %status,
                        %target,
                        "waiting for service"
                    );
                }
                None if target == TransitionTarget::Stopped => return Ok(()),
                None => {
                    return Err(ServiceControlError::NotFound {
                        name: name.to_owned(),
                    }
                    .into());
                }
            }
            if let (Some(deadline), Some(timeout)) = (deadline, self.policy.timeout)
                && Instant::now() >= deadline
            {
                return Err(ServiceError::timeout(name, target, timeout));
            }
            thread::sleep(self.policy.interval);
            nudge(self.manager)?;
        }
    }
}
