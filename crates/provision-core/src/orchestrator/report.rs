//! Run states and the machine-readable run report.

use std::fmt;

use camino::Utf8PathBuf;
use serde::Serialize;

use crate::host::HostIdentity;
use crate::install::CpuArchitecture;
use crate::rules::ConfigAssignment;
use crate::template::TemplateWarning;

/// Step of the provisioning pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisionState {
    /// Preconditions and classification; nothing has been mutated.
    Idle,
    /// Stopping the existing agent service.
    Stopping,
    /// Downloading the installer and template.
    Fetching,
    /// Running the installer.
    Installing,
    /// Moving the existing configuration aside.
    BackingUpConfig,
    /// Rendering and writing the new configuration.
    Rewriting,
    /// Starting the agent service.
    Starting,
    /// Every step succeeded.
    Done,
    /// A step failed; the pipeline halted.
    Failed,
}

impl ProvisionState {
    /// Whether the run has finished.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl fmt::Display for ProvisionState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Stopping => "stopping",
            Self::Fetching => "fetching",
            Self::Installing => "installing",
            Self::BackingUpConfig => "backing_up_config",
            Self::Rewriting => "rewriting",
            Self::Starting => "starting",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        formatter.write_str(label)
    }
}

/// Outcome of a provisioning run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisionReport {
    /// State the run finished in.
    pub state: ProvisionState,
    /// States entered, in order, starting with [`ProvisionState::Idle`].
    pub visited: Vec<ProvisionState>,
    /// State that was active when the run failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_at: Option<ProvisionState>,
    /// Architecture used to pick the installer.
    pub architecture: CpuArchitecture,
    /// Identity captured before any mutation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<HostIdentity>,
    /// Host name written into the configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_name: Option<String>,
    /// Resolved configuration values.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignment: Option<ConfigAssignment>,
    /// Exit code reported by the installer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installer_exit_code: Option<i32>,
    /// Whether the installer asked for a reboot.
    pub reboot_required: bool,
    /// Location of the previous configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_path: Option<Utf8PathBuf>,
    /// Template mismatches found while rendering.
    pub template_warnings: Vec<TemplateWarning>,
    /// Failure message when the run did not complete.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProvisionReport {
    pub(crate) fn new(architecture: CpuArchitecture) -> Self {
        Self {
            state: ProvisionState::Idle,
            visited: vec![ProvisionState::Idle],
            failed_at: None,
            architecture,
            identity: None,
            host_name: None,
            assignment: None,
            installer_exit_code: None,
            reboot_required: false,
            backup_path: None,
            template_warnings: Vec::new(),
            error: None,
        }
    }

    pub(crate) fn enter(&mut self, state: ProvisionState) {
        tracing::info!(
            target: "agent_provision::orchestrator",
            from = %self.state,
            to = %state,
            "state transition"
        );
        self.state = state;
        self.visited.push(state);
    }

    pub(crate) fn fail(&mut self, message: String) {
        tracing::error!(
            target: "agent_provision::orchestrator",
            state = %self.state,
            error = %message,
            "provisioning failed"
        );
        self.failed_at = Some(self.state);
        self.error = Some(message);
        self.enter(ProvisionState::Failed);
    }

    /// Whether the run reached [`ProvisionState::Done`].
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.state == ProvisionState::Done
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_records_the_active_state() {
        let mut report = ProvisionReport::new(CpuArchitecture::X64);
        report.enter(ProvisionState::Stopping);
        report.fail(String::from("service did not stop"));

        assert_eq!(report.state, ProvisionState::Failed);
        assert_eq!(report.failed_at, Some(ProvisionState::Stopping));
        assert!(report.state.is_terminal());
        assert!(!report.succeeded());
    }

    #[test]
    fn serialises_states_in_snake_case() {
        let mut report = ProvisionReport::new(CpuArchitecture::X86);
        report.enter(ProvisionState::BackingUpConfig);
        let value = serde_json::to_value(&report).expect("serialise report");

        assert_eq!(
            value.get("visited"),
            Some(&serde_json::json!(["idle", "backing_up_config"]))
        );
        assert_eq!(value.get("architecture"), Some(&serde_json::json!("x86")));
        assert!(value.get("error").is_none());
    }
}
