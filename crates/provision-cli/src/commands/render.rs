//! `render`: offline template rendering.

use std::io::Write;

use serde::Serialize;

use provision_config::Config;
use provision_core::{
    ConfigStore, ConfigTemplate, HostIdentity, HostProbe, InstallDefaults, RenderValues,
    RoutingRules, SystemRole, TemplateWarning, render, resolve, select_primary_address,
};

use crate::AppError;
use crate::cli::RenderArgs;
use crate::output::CommandOutput;

#[derive(Debug, Serialize)]
struct RenderDocument<'a> {
    identity: HostIdentity,
    host_name: &'a str,
    config: String,
    warnings: &'a [TemplateWarning],
}

/// Fills whatever the flags leave out from the host, querying only that fact.
fn identity_for(args: &RenderArgs, probe: &dyn HostProbe) -> Result<HostIdentity, AppError> {
    let primary_ipv4 = match args.interface {
        Some(address) => address,
        None => select_primary_address(&probe.ipv4_addresses()?)?,
    };
    let system_role = match args.role {
        Some(role) => role.into(),
        None => SystemRole::from_product_type(probe.product_type()?)?,
    };
    Ok(HostIdentity {
        primary_ipv4,
        system_role,
    })
}

pub(super) fn run<W: Write, E: Write>(
    config: &Config,
    args: &RenderArgs,
    probe: &dyn HostProbe,
    store: &dyn ConfigStore,
    output: &mut CommandOutput<W, E>,
) -> Result<(), AppError> {
    let text = store.read_template(&args.template)?;
    let identity = identity_for(args, probe)?;
    let host_name = match &args.hostname {
        Some(name) => name.clone(),
        None => probe.host_name()?,
    };
    let assignment = resolve(
        &identity,
        &RoutingRules::from(config),
        &InstallDefaults::from(config),
    );
    let interface_addr = identity.primary_ipv4.to_string();
    let rendered = render(
        &ConfigTemplate::parse(&text),
        RenderValues {
            assignment: &assignment,
            interface_addr: &interface_addr,
            host_name: &host_name,
        },
    );

    if output.is_json() {
        return output.json(&RenderDocument {
            identity,
            host_name: &host_name,
            config: rendered.to_text(),
            warnings: rendered.warnings(),
        });
    }
    for warning in rendered.warnings() {
        output.stderr_line(format_args!("warning: {warning}"))?;
    }
    output.stdout_text(&rendered.to_text())
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::net::Ipv4Addr;

    use camino::Utf8PathBuf;
    use mockall::mock;
    use provision_core::{AddressRecord, ClassificationError, FsConfigStore};
    use tempfile::TempDir;

    use super::*;
    use crate::cli::RoleArg;
    use crate::output::ResolvedOutputFormat;

    mock! {
        Probe {}
        impl HostProbe for Probe {
            fn ipv4_addresses(&self) -> Result<Vec<AddressRecord>, ClassificationError>;
            fn product_type(&self) -> Result<u32, ClassificationError>;
            fn host_name(&self) -> Result<String, ClassificationError>;
        }
    }

    struct Fixture {
        _dir: TempDir,
        template: Utf8PathBuf,
    }

    fn template(contents: &str) -> Fixture {
        let dir = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8 temp dir");
        let template = root.join("zabbix_agent2.conf");
        fs::write(&template, contents).expect("write template");
        Fixture {
            _dir: dir,
            template,
        }
    }

    fn routed_config() -> Config {
        Config {
            proxy_subnet_prefix: String::from("10.145."),
            primary_subnet_prefix: String::from("10.20."),
            proxy_server_address: Some(String::from("zabbix-proxy.corp.example")),
            primary_server_address: Some(String::from("zabbix.corp.example")),
            ..Config::default()
        }
    }

    #[test]
    fn explicit_identity_skips_the_probe() {
        let fixture = template("# cfg\nServer=\nHostMetaData=\nHostname=\nHostInterface=\nServerActive=\n");
        let args = RenderArgs {
            template: fixture.template.clone(),
            interface: Some(Ipv4Addr::new(10, 20, 3, 4)),
            hostname: Some(String::from("WIN-SRV2")),
            role: Some(RoleArg::Server),
        };
        let probe = MockProbe::new();
        let mut output = CommandOutput::new(Vec::new(), Vec::new(), ResolvedOutputFormat::Human);

        run(&routed_config(), &args, &probe, &FsConfigStore::default(), &mut output)
            .expect("render");

        let text = String::from_utf8(output.stdout).expect("utf8");
        assert_eq!(
            text,
            concat!(
                "# cfg\n",
                "Server=zabbix.corp.example\n",
                "HostMetaData=Windows servers\n",
                "Hostname=WIN-SRV2\n",
                "HostInterface=10.20.3.4\n",
                "ServerActive=zabbix.corp.example\n",
            )
        );
        assert!(output.stderr.is_empty());
    }

    #[test]
    fn missing_markers_are_warned_on_stderr() {
        let fixture = template("Timeout=3\n");
        let args = RenderArgs {
            template: fixture.template.clone(),
            interface: Some(Ipv4Addr::new(192, 168, 1, 5)),
            hostname: Some(String::from("WIN-HOST1")),
            role: Some(RoleArg::Workstation),
        };
        let mut output = CommandOutput::new(Vec::new(), Vec::new(), ResolvedOutputFormat::Human);

        run(
            &routed_config(),
            &args,
            &MockProbe::new(),
            &FsConfigStore::default(),
            &mut output,
        )
        .expect("render");

        assert_eq!(output.stdout, b"Timeout=3\n");
        let warnings = String::from_utf8(output.stderr).expect("utf8");
        assert_eq!(warnings.lines().count(), 5);
        assert!(warnings.contains("'Server='"));
    }

    #[test]
    fn omitted_role_is_read_from_the_product_type() {
        let fixture = template("HostMetaData=\n");
        let args = RenderArgs {
            template: fixture.template.clone(),
            interface: Some(Ipv4Addr::new(10, 145, 5, 9)),
            hostname: None,
            role: None,
        };
        let mut probe = MockProbe::new();
        probe.expect_ipv4_addresses().never();
        probe.expect_product_type().times(1).returning(|| Ok(3));
        probe
            .expect_host_name()
            .returning(|| Ok(String::from("WIN-SRV1")));
        let mut output = CommandOutput::new(Vec::new(), Vec::new(), ResolvedOutputFormat::Json);

        run(&routed_config(), &args, &probe, &FsConfigStore::default(), &mut output)
            .expect("render");

        let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
        assert_eq!(value["identity"]["primary_ipv4"], "10.145.5.9");
        assert_eq!(value["identity"]["system_role"], "server");
        assert_eq!(value["host_name"], "WIN-SRV1");
        assert_eq!(value["config"], "HostMetaData=Windows servers\n");
    }

    #[test]
    fn omitted_interface_is_selected_from_the_host() {
        let fixture = template("HostInterface=\n");
        let args = RenderArgs {
            template: fixture.template.clone(),
            interface: None,
            hostname: Some(String::from("WIN-HOST1")),
            role: Some(RoleArg::Workstation),
        };
        let mut probe = MockProbe::new();
        probe.expect_ipv4_addresses().times(1).returning(|| {
            Ok(vec![AddressRecord {
                address: Ipv4Addr::new(192, 168, 7, 7),
                interface_alias: String::from("Ethernet"),
                state: provision_core::AddressState::Preferred,
                origin: provision_core::PrefixOrigin::Dhcp,
                valid_lifetime: None,
            }])
        });
        probe.expect_product_type().never();
        let mut output = CommandOutput::new(Vec::new(), Vec::new(), ResolvedOutputFormat::Human);

        run(&routed_config(), &args, &probe, &FsConfigStore::default(), &mut output)
            .expect("render");

        assert_eq!(output.stdout, b"HostInterface=192.168.7.7\n");
    }

    #[test]
    fn missing_template_is_an_error() {
        let args = RenderArgs {
            template: Utf8PathBuf::from("/nonexistent/agent.conf"),
            interface: Some(Ipv4Addr::LOCALHOST),
            hostname: Some(String::from("host")),
            role: Some(RoleArg::Workstation),
        };
        let mut output = CommandOutput::new(Vec::new(), Vec::new(), ResolvedOutputFormat::Human);
        let error = run(
            &Config::default(),
            &args,
            &MockProbe::new(),
            &FsConfigStore::default(),
            &mut output,
        )
        .expect_err("template is missing");
        assert!(matches!(error, AppError::ConfigFile(_)));
    }

    #[test]
    fn role_argument_maps_to_system_role() {
        assert_eq!(SystemRole::from(RoleArg::DomainController), SystemRole::DomainController);
    }
}
