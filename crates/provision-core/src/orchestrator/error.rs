use thiserror::Error;

use crate::fetch::FetchError;
use crate::host::ClassificationError;
use crate::install::InstallError;
use crate::privilege::PrivilegeError;
use crate::service::ServiceError;
use crate::store::ConfigFileError;

use super::report::ProvisionReport;

/// Fatal errors that halt the provisioning pipeline.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// Administrative privileges are missing.
    #[error(transparent)]
    Privilege(#[from] PrivilegeError),
    /// The host could not be classified.
    #[error(transparent)]
    Classification(#[from] ClassificationError),
    /// A setting required by the pipeline is not configured.
    #[error("required setting '{setting}' is not configured")]
    MissingSetting {
        /// Configuration key.
        setting: &'static str,
    },
    /// The agent service could not be stopped or started.
    #[error(transparent)]
    Service(#[from] ServiceError),
    /// An artefact could not be downloaded.
    #[error(transparent)]
    Fetch(#[from] FetchError),
    /// The installer failed.
    #[error(transparent)]
    Install(#[from] InstallError),
    /// The configuration file could not be backed up, read, or written.
    #[error(transparent)]
    ConfigFile(#[from] ConfigFileError),
}

/// A halted run together with the report of how far it got.
#[derive(Debug, Error)]
#[error("provisioning failed during {}: {error}", failed_state(.report))]
pub struct ProvisionFailure {
    /// Report with [`super::ProvisionState::Failed`] as its final state.
    pub report: ProvisionReport,
    /// Error that halted the run.
    #[source]
    pub error: ProvisionError,
}

fn failed_state(report: &ProvisionReport) -> String {
    report
        .failed_at
        .map_or_else(|| String::from("unknown step"), |state| state.to_string())
}
