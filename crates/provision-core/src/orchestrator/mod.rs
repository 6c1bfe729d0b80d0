//! Sequential provisioning pipeline.
//!
//! The orchestrator checks privileges and captures the host identity before
//! touching anything, then walks `Stopping → Fetching → Installing →
//! BackingUpConfig → Rewriting → Starting`. The first failure halts the run;
//! nothing is retried or rolled back.

mod error;
mod report;

use camino::Utf8PathBuf;

use provision_config::{ArtifactUrl, Config};

use crate::fetch::ArtifactFetcher;
use crate::host::{self, HostIdentity, HostProbe};
use crate::install::{CpuArchitecture, InstallOutcome, InstallerArguments, PackageInstaller};
use crate::privilege::{self, PrivilegeCheck};
use crate::rules::{self, ConfigAssignment, InstallDefaults, RoutingRules};
use crate::service::{PollPolicy, ServiceController, ServiceManager};
use crate::store::ConfigStore;
use crate::template::{self, ConfigTemplate, RenderValues};

pub use error::{ProvisionError, ProvisionFailure};
pub use report::{ProvisionReport, ProvisionState};

/// Operating system services the pipeline drives.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    /// Administrative privilege check.
    pub privilege: &'a dyn PrivilegeCheck,
    /// Source of host facts.
    pub probe: &'a dyn HostProbe,
    /// Service manager.
    pub services: &'a dyn ServiceManager,
    /// Artefact downloader.
    pub fetcher: &'a dyn ArtifactFetcher,
    /// Package installer.
    pub installer: &'a dyn PackageInstaller,
    /// Configuration file storage.
    pub store: &'a dyn ConfigStore,
}

struct Artifacts<'a> {
    installer_url: &'a ArtifactUrl,
    template_url: &'a ArtifactUrl,
    installer_path: Utf8PathBuf,
    template_path: Utf8PathBuf,
}

struct Plan<'a> {
    identity: HostIdentity,
    host_name: String,
    defaults: InstallDefaults,
    assignment: ConfigAssignment,
    artifacts: Artifacts<'a>,
}

/// Drives one provisioning run.
pub struct Orchestrator<'a> {
    config: &'a Config,
    architecture: CpuArchitecture,
    collaborators: Collaborators<'a>,
}

impl<'a> Orchestrator<'a> {
    /// Builds an orchestrator for the detected architecture.
    #[must_use]
    pub fn new(config: &'a Config, collaborators: Collaborators<'a>) -> Self {
        Self::with_architecture(config, CpuArchitecture::detect(), collaborators)
    }

    /// Builds an orchestrator for an explicit architecture.
    #[must_use]
    pub const fn with_architecture(
        config: &'a Config,
        architecture: CpuArchitecture,
        collaborators: Collaborators<'a>,
    ) -> Self {
        Self {
            config,
            architecture,
            collaborators,
        }
    }

    /// Runs the pipeline to completion or to the first failure.
    ///
    /// # Errors
    ///
    /// Returns a [`ProvisionFailure`] carrying the report and the error that
    /// halted the run.
    pub fn run(&self) -> Result<ProvisionReport, Box<ProvisionFailure>> {
        let mut report = ProvisionReport::new(self.architecture);
        match self.execute(&mut report) {
            Ok(()) => {
                report.enter(ProvisionState::Done);
                Ok(report)
            }
            Err(error) => {
                report.fail(error.to_string());
                Err(Box::new(ProvisionFailure { report, error }))
            }
        }
    }

    fn execute(&self, report: &mut ProvisionReport) -> Result<(), ProvisionError> {
        let plan = self.plan(report)?;
        let controller = ServiceController::new(
            self.collaborators.services,
            PollPolicy::from(self.config),
        );

        report.enter(ProvisionState::Stopping);
        controller.stop(self.config.service_name())?;

        report.enter(ProvisionState::Fetching);
        self.fetch(&plan.artifacts)?;

        report.enter(ProvisionState::Installing);
        self.install(&plan, report)?;

        report.enter(ProvisionState::BackingUpConfig);
        report.backup_path = self
            .collaborators
            .store
            .backup(self.config.agent_config_path())?;

        report.enter(ProvisionState::Rewriting);
        self.rewrite(&plan, report)?;

        report.enter(ProvisionState::Starting);
        controller.start(self.config.service_name())?;
        Ok(())
    }

    fn plan(&self, report: &mut ProvisionReport) -> Result<Plan<'a>, ProvisionError> {
        privilege::require_elevation(self.collaborators.privilege)?;
        let identity = host::classify(self.collaborators.probe)?;
        report.identity = Some(identity);
        let host_name = self.collaborators.probe.host_name()?;
        report.host_name = Some(host_name.clone());

        let defaults = InstallDefaults::from(self.config);
        let assignment = rules::resolve(&identity, &RoutingRules::from(self.config), &defaults);
        report.assignment = Some(assignment.clone());

        let artifacts = self.artifacts()?;
        Ok(Plan {
            identity,
            host_name,
            defaults,
            assignment,
            artifacts,
        })
    }

    fn artifacts(&self) -> Result<Artifacts<'a>, ProvisionError> {
        let config = self.config;
        let installer_url = self.architecture.installer_url(config).ok_or(
            ProvisionError::MissingSetting {
                setting: self.architecture.installer_setting(),
            },
        )?;
        let template_url = config
            .template_url
            .as_ref()
            .ok_or(ProvisionError::MissingSetting {
                setting: "template_url",
            })?;
        let staging = config.download_dir();
        Ok(Artifacts {
            installer_url,
            template_url,
            installer_path: staging.join(installer_url.file_name()),
            template_path: staging.join(template_url.file_name()),
        })
    }

    fn fetch(&self, artifacts: &Artifacts<'_>) -> Result<(), ProvisionError> {
        let fetcher = self.collaborators.fetcher;
        fetcher.fetch(artifacts.installer_url, &artifacts.installer_path)?;
        fetcher.fetch(artifacts.template_url, &artifacts.template_path)?;
        tracing::info!(
            target: "agent_provision::orchestrator",
            installer = %artifacts.installer_path,
            template = %artifacts.template_path,
            "downloaded artefacts"
        );
        Ok(())
    }

    fn install(&self, plan: &Plan<'_>, report: &mut ProvisionReport) -> Result<(), ProvisionError> {
        let arguments =
            InstallerArguments::new(&plan.artifacts.installer_path, self.config, &plan.defaults);
        tracing::debug!(
            target: "agent_provision::orchestrator",
            arguments = %arguments,
            "running installer"
        );
        let exit_code = self.collaborators.installer.install(&arguments)?;
        report.installer_exit_code = Some(exit_code);
        let outcome = InstallOutcome::from_exit_code(exit_code)?;
        report.reboot_required = outcome.reboot_required;
        if outcome.reboot_required {
            tracing::warn!(
                target: "agent_provision::orchestrator",
                exit_code,
                "installer requested a reboot"
            );
        }
        Ok(())
    }

    fn rewrite(&self, plan: &Plan<'_>, report: &mut ProvisionReport) -> Result<(), ProvisionError> {
        let store = self.collaborators.store;
        let text = store.read_template(&plan.artifacts.template_path)?;
        let interface_addr = plan.identity.primary_ipv4.to_string();
        let rendered = template::render(
            &ConfigTemplate::parse(&text),
            RenderValues {
                assignment: &plan.assignment,
                interface_addr: &interface_addr,
                host_name: &plan.host_name,
            },
        );
        report.template_warnings = rendered.warnings().to_vec();
        store.write_config(self.config.agent_config_path(), &rendered.to_text())?;
        Ok(())
    }
}
