//! Operating system adapters for the provisioning collaborators.
//!
//! Windows facts and actions are reached through PowerShell and `msiexec`;
//! downloads use a blocking `reqwest` client.

mod http;
mod installer;
mod powershell;
mod privilege;
mod probe;
mod services;

use provision_config::Config;
use provision_core::{Collaborators, FsConfigStore};

use crate::AppError;

use http::HttpFetcher;
use installer::MsiexecInstaller;
use privilege::ProcessPrivilege;
use probe::PowerShellProbe;
use services::PowerShellServices;

/// Production adapters for every collaborator.
pub(crate) struct SystemPlatform {
    privilege: ProcessPrivilege,
    probe: PowerShellProbe,
    services: PowerShellServices,
    fetcher: HttpFetcher,
    installer: MsiexecInstaller,
    store: FsConfigStore,
}

impl SystemPlatform {
    pub(crate) fn new(config: &Config) -> Result<Self, AppError> {
        let fetcher = HttpFetcher::new(config.download_timeout()).map_err(AppError::HttpClient)?;
        Ok(Self {
            privilege: ProcessPrivilege::default(),
            probe: PowerShellProbe::default(),
            services: PowerShellServices::default(),
            fetcher,
            installer: MsiexecInstaller::default(),
            store: FsConfigStore::default(),
        })
    }

    pub(crate) fn collaborators(&self) -> Collaborators<'_> {
        Collaborators {
            privilege: &self.privilege,
            probe: &self.probe,
            services: &self.services,
            fetcher: &self.fetcher,
            installer: &self.installer,
            store: &self.store,
        }
    }
}
