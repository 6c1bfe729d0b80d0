//! Host facts gathered through PowerShell.

use std::env;
use std::net::Ipv4Addr;
use std::time::Duration;

use serde::Deserialize;

use provision_core::{AddressRecord, AddressState, ClassificationError, HostProbe, PrefixOrigin};

use super::powershell::PowerShell;

const ADDRESS_SCRIPT: &str = concat!(
    "Get-NetIPAddress -AddressFamily IPv4 | Select-Object ",
    "@{n='IPAddress';e={$_.IPAddress}},",
    "@{n='InterfaceAlias';e={$_.InterfaceAlias}},",
    "@{n='AddressState';e={$_.AddressState.ToString()}},",
    "@{n='PrefixOrigin';e={$_.PrefixOrigin.ToString()}},",
    "@{n='ValidLifetimeSeconds';e={[uint64][math]::Floor($_.ValidLifetime.TotalSeconds)}}",
    " | ConvertTo-Json -Compress"
);

const PRODUCT_TYPE_SCRIPT: &str =
    "(Get-CimInstance -ClassName Win32_OperatingSystem).ProductType";

const HOST_NAME_SCRIPT: &str = "[System.Net.Dns]::GetHostName()";

/// Lifetimes at or above this many seconds are reported for infinite leases.
const INFINITE_LIFETIME_SECS: u64 = 0xFFFF_FFFF;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawAddress {
    #[serde(rename = "IPAddress")]
    ip_address: Ipv4Addr,
    interface_alias: String,
    address_state: AddressState,
    prefix_origin: PrefixOrigin,
    valid_lifetime_seconds: Option<u64>,
}

impl From<RawAddress> for AddressRecord {
    fn from(raw: RawAddress) -> Self {
        Self {
            address: raw.ip_address,
            interface_alias: raw.interface_alias,
            state: raw.address_state,
            origin: raw.prefix_origin,
            valid_lifetime: raw
                .valid_lifetime_seconds
                .filter(|seconds| *seconds < INFINITE_LIFETIME_SECS)
                .map(Duration::from_secs),
        }
    }
}

/// `ConvertTo-Json` emits a bare object when the pipeline yields one item.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Self::Many(items) => items,
            Self::One(item) => vec![item],
        }
    }
}

fn parse_addresses(json: &str) -> Result<Vec<AddressRecord>, ClassificationError> {
    if json.is_empty() {
        return Ok(Vec::new());
    }
    let parsed: OneOrMany<RawAddress> =
        serde_json::from_str(json).map_err(|error| ClassificationError::Probe {
            what: "IPv4 addresses",
            message: error.to_string(),
        })?;
    Ok(parsed.into_vec().into_iter().map(AddressRecord::from).collect())
}

fn parse_product_type(text: &str) -> Result<u32, ClassificationError> {
    text.trim()
        .parse()
        .map_err(|_| ClassificationError::Probe {
            what: "product type",
            message: format!("unexpected value '{}'", text.trim()),
        })
}

/// [`HostProbe`] backed by PowerShell cmdlets.
#[derive(Debug, Clone, Default)]
pub(crate) struct PowerShellProbe {
    shell: PowerShell,
}

impl PowerShellProbe {
    fn query(&self, what: &'static str, script: &str) -> Result<String, ClassificationError> {
        self.shell
            .run(script)
            .map_err(|error| ClassificationError::Probe {
                what,
                message: error.message(),
            })
    }
}

impl HostProbe for PowerShellProbe {
    fn ipv4_addresses(&self) -> Result<Vec<AddressRecord>, ClassificationError> {
        parse_addresses(&self.query("IPv4 addresses", ADDRESS_SCRIPT)?)
    }

    fn product_type(&self) -> Result<u32, ClassificationError> {
        parse_product_type(&self.query("product type", PRODUCT_TYPE_SCRIPT)?)
    }

    fn host_name(&self) -> Result<String, ClassificationError> {
        if let Some(name) = env::var("COMPUTERNAME")
            .ok()
            .filter(|name| !name.trim().is_empty())
        {
            return Ok(name);
        }
        self.query("host name", HOST_NAME_SCRIPT)
    }
}
