//! Host identity derivation.
//!
//! The classifier reduces the raw facts reported by a [`HostProbe`] to the
//! two values routing decisions depend on: the primary IPv4 address and the
//! system role. Classification runs once per provisioning run, before any
//! service or filesystem mutation.

use std::cmp::Reverse;
use std::fmt;
use std::net::Ipv4Addr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lease threshold under which a non-DHCP address still counts as dynamic.
pub const SHORT_LEASE: Duration = Duration::from_secs(24 * 60 * 60);

/// Role of the host as reported by the operating system product type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemRole {
    /// Client editions.
    Workstation,
    /// Server editions promoted to domain controller.
    DomainController,
    /// Server editions.
    Server,
}

impl SystemRole {
    /// Decodes the Win32 `ProductType` value.
    pub const fn from_product_type(product_type: u32) -> Result<Self, ClassificationError> {
        match product_type {
            1 => Ok(Self::Workstation),
            2 => Ok(Self::DomainController),
            3 => Ok(Self::Server),
            other => Err(ClassificationError::UnknownProductType(other)),
        }
    }
}

impl fmt::Display for SystemRole {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Workstation => formatter.write_str("workstation"),
            Self::DomainController => formatter.write_str("domain_controller"),
            Self::Server => formatter.write_str("server"),
        }
    }
}

/// Lifecycle state of an address as reported by the network stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum AddressState {
    /// Valid and usable for new connections.
    Preferred,
    /// Valid but no longer used for new connections.
    Deprecated,
    /// Still undergoing duplicate address detection.
    Tentative,
    /// Duplicate address detection failed.
    Duplicate,
    /// Any other state.
    Invalid,
}

/// How the address prefix was assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum PrefixOrigin {
    /// Statically configured.
    Manual,
    /// Well-known assignment such as loopback or link-local.
    WellKnown,
    /// Leased from a DHCP server.
    Dhcp,
    /// Learned from router advertisements.
    RouterAdvertisement,
    /// Any other origin.
    Other,
}

/// One IPv4 address reported by the network stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressRecord {
    /// The address itself.
    pub address: Ipv4Addr,
    /// Interface the address is bound to.
    pub interface_alias: String,
    /// Address lifecycle state.
    pub state: AddressState,
    /// Prefix assignment origin.
    pub origin: PrefixOrigin,
    /// Remaining valid lifetime; `None` when infinite.
    pub valid_lifetime: Option<Duration>,
}

impl AddressRecord {
    fn is_dhcp(&self) -> bool {
        self.origin == PrefixOrigin::Dhcp
    }

    fn has_short_lease(&self) -> bool {
        self.valid_lifetime
            .is_some_and(|lifetime| lifetime < SHORT_LEASE)
    }

    /// Whether the address qualifies as the host's primary address.
    #[must_use]
    pub fn is_candidate(&self) -> bool {
        self.state == AddressState::Preferred && (self.is_dhcp() || self.has_short_lease())
    }
}

/// Network identity facts used to select configuration values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HostIdentity {
    /// Address representing the host.
    pub primary_ipv4: Ipv4Addr,
    /// Workstation or server classification.
    pub system_role: SystemRole,
}

/// Source of raw host facts.
pub trait HostProbe {
    /// Enumerates the host's IPv4 addresses.
    fn ipv4_addresses(&self) -> Result<Vec<AddressRecord>, ClassificationError>;

    /// Reads the operating system product type.
    fn product_type(&self) -> Result<u32, ClassificationError>;

    /// Reads the host name written into the agent configuration.
    fn host_name(&self) -> Result<String, ClassificationError>;
}

/// Errors raised while deriving the host identity.
#[derive(Debug, Error)]
pub enum ClassificationError {
    /// No address was preferred and dynamically assigned.
    #[error("no preferred IPv4 address with a DHCP origin or a lease under 24 hours")]
    NoPreferredAddress,
    /// The product type did not map to a known role.
    #[error("unknown operating system product type {0}")]
    UnknownProductType(u32),
    /// The probe could not query the operating system.
    #[error("failed to query {what}: {message}")]
    Probe {
        /// Fact being queried.
        what: &'static str,
        /// Diagnostic from the underlying query.
        message: String,
    },
}

/// Picks the primary IPv4 address from the reported records.
///
/// DHCP-assigned candidates rank ahead of short-lease static ones; ties are
/// broken by the numerically lowest address so the result never depends on
/// enumeration order.
pub fn select_primary_address(records: &[AddressRecord]) -> Result<Ipv4Addr, ClassificationError> {
    records
        .iter()
        .filter(|record| record.is_candidate())
        .min_by_key(|record| (Reverse(record.is_dhcp()), record.address))
        .map(|record| record.address)
        .ok_or(ClassificationError::NoPreferredAddress)
}

/// Derives the host identity from the probe.
pub fn classify(probe: &dyn HostProbe) -> Result<HostIdentity, ClassificationError> {
    let records = probe.ipv4_addresses()?;
    let primary_ipv4 = select_primary_address(&records)?;
    let system_role = SystemRole::from_product_type(probe.product_type()?)?;
    tracing::info!(
        target: "agent_provision::host",
        address = %primary_ipv4,
        role = %system_role,
        candidates = records.iter().filter(|record| record.is_candidate()).count(),
        "classified host"
    );
    Ok(HostIdentity {
        primary_ipv4,
        system_role,
    })
}
