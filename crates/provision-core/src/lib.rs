//! Provisioning pipeline for the monitoring agent.
//!
//! The crate is free of operating system calls apart from the filesystem
//! access in [`FsConfigStore`]. Everything else reaches the host through the
//! collaborator traits ([`HostProbe`], [`ServiceManager`], [`ArtifactFetcher`],
//! [`PackageInstaller`], [`PrivilegeCheck`]) implemented by the binary.

pub mod fetch;
pub mod host;
pub mod install;
pub mod orchestrator;
pub mod privilege;
pub mod rules;
pub mod service;
pub mod store;
pub mod template;

pub use fetch::{ArtifactFetcher, FetchError};
pub use host::{
    AddressRecord, AddressState, ClassificationError, HostIdentity, HostProbe, PrefixOrigin,
    SystemRole, classify, select_primary_address,
};
pub use install::{
    CpuArchitecture, InstallError, InstallOutcome, InstallerArguments, PackageInstaller,
};
pub use orchestrator::{
    Collaborators, Orchestrator, ProvisionError, ProvisionFailure, ProvisionReport,
    ProvisionState,
};
pub use privilege::{PrivilegeCheck, PrivilegeError, require_elevation};
pub use rules::{ConfigAssignment, InstallDefaults, RoutingRules, resolve};
pub use service::{
    PollPolicy, ServiceControlError, ServiceController, ServiceError, ServiceManager,
    ServiceStatus, TransitionTarget,
};
pub use store::{ConfigFileError, ConfigStore, FsConfigStore};
pub use template::{
    ConfigTemplate, LineEnding, MarkerKey, RenderValues, RenderedConfig, TemplateWarning, render,
};

#[cfg(test)]
mod tests;
