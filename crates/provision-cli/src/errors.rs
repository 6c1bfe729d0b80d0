//! Error types for the CLI runtime.

use std::io;
use std::sync::Arc;

use thiserror::Error;

use provision_core::{
    ClassificationError, ConfigFileError, PrivilegeError, ProvisionFailure, ServiceError,
};

use crate::telemetry::TelemetryError;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error(transparent)]
    Privilege(#[from] PrivilegeError),
    #[error(transparent)]
    Classification(#[from] ClassificationError),
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error(transparent)]
    ConfigFile(#[from] ConfigFileError),
    #[error(transparent)]
    Provision(#[from] Box<ProvisionFailure>),
    #[error("failed to build the download client: {0}")]
    HttpClient(reqwest::Error),
    #[error("failed to write output: {0}")]
    Output(io::Error),
    #[error("failed to serialise output: {0}")]
    Serialise(serde_json::Error),
}
