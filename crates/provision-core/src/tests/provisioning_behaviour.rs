//! Behaviour-driven tests for the provisioning pipeline.

use std::cell::RefCell;
use std::fs;
use std::net::Ipv4Addr;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tempfile::TempDir;

use provision_config::{ArtifactUrl, Config};

use crate::{
    AddressRecord, AddressState, ArtifactFetcher, ClassificationError, Collaborators,
    CpuArchitecture, FetchError, FsConfigStore, HostProbe, InstallError, InstallerArguments,
    Orchestrator, PackageInstaller, PrefixOrigin, PrivilegeCheck, PrivilegeError,
    ProvisionError, ProvisionFailure, ProvisionReport, ProvisionState, ServiceControlError,
    ServiceError, ServiceManager, ServiceStatus,
};

const PROXY: &str = "zabbix-proxy.corp.example";
const PRIMARY: &str = "zabbix.corp.example";
const DEFAULT_TEMPLATE: &str = "# agent\nHostInterface=\nHostname=\nServer=\nServerActive=\nHostMetaData=\nTimeout=3\n";

// ---------------------------------------------------------------------------
// Host double
// ---------------------------------------------------------------------------

/// How the service manager reacts to a stop command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopBehaviour {
    Stops,
    Denied,
    Hangs,
}

/// Single in-memory host implementing every collaborator.
struct FakeHost {
    elevated: bool,
    address: Ipv4Addr,
    address_origin: PrefixOrigin,
    address_lifetime: Option<Duration>,
    product_type: u32,
    service: RefCell<Option<ServiceStatus>>,
    stop_behaviour: StopBehaviour,
    download_status: Option<u16>,
    installer_exit_code: i32,
    template: String,
    calls: RefCell<Vec<String>>,
}

impl FakeHost {
    fn new() -> Self {
        Self {
            elevated: true,
            address: Ipv4Addr::new(192, 168, 1, 5),
            address_origin: PrefixOrigin::Dhcp,
            address_lifetime: Some(Duration::from_secs(691_200)),
            product_type: 1,
            service: RefCell::new(None),
            stop_behaviour: StopBehaviour::Stops,
            download_status: None,
            installer_exit_code: 0,
            template: String::from(DEFAULT_TEMPLATE),
            calls: RefCell::new(Vec::new()),
        }
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.borrow_mut().push(call.into());
    }

    fn called(&self, prefix: &str) -> bool {
        self.calls.borrow().iter().any(|call| call.starts_with(prefix))
    }
}

impl PrivilegeCheck for FakeHost {
    fn is_elevated(&self) -> Result<bool, PrivilegeError> {
        Ok(self.elevated)
    }
}

impl HostProbe for FakeHost {
    fn ipv4_addresses(&self) -> Result<Vec<AddressRecord>, ClassificationError> {
        Ok(vec![
            AddressRecord {
                address: Ipv4Addr::LOCALHOST,
                interface_alias: String::from("Loopback Pseudo-Interface 1"),
                state: AddressState::Preferred,
                origin: PrefixOrigin::WellKnown,
                valid_lifetime: None,
            },
            AddressRecord {
                address: self.address,
                interface_alias: String::from("Ethernet"),
                state: AddressState::Preferred,
                origin: self.address_origin,
                valid_lifetime: self.address_lifetime,
            },
        ])
    }

    fn product_type(&self) -> Result<u32, ClassificationError> {
        Ok(self.product_type)
    }

    fn host_name(&self) -> Result<String, ClassificationError> {
        Ok(String::from("WIN-HOST1"))
    }
}

impl ServiceManager for FakeHost {
    fn query(&self, _name: &str) -> Result<Option<ServiceStatus>, ServiceControlError> {
        Ok(*self.service.borrow())
    }

    fn stop(&self, name: &str) -> Result<(), ServiceControlError> {
        self.record(format!("stop {name}"));
        match self.stop_behaviour {
            StopBehaviour::Stops => {
                *self.service.borrow_mut() = Some(ServiceStatus::Stopped);
                Ok(())
            }
            StopBehaviour::Denied => Err(ServiceControlError::AccessDenied {
                operation: "stop",
                name: name.to_owned(),
            }),
            StopBehaviour::Hangs => {
                *self.service.borrow_mut() = Some(ServiceStatus::StopPending);
                Ok(())
            }
        }
    }

    fn start(&self, name: &str) -> Result<(), ServiceControlError> {
        self.record(format!("start {name}"));
        let mut service = self.service.borrow_mut();
        match *service {
            Some(_) => {
                *service = Some(ServiceStatus::Running);
                Ok(())
            }
            None => Err(ServiceControlError::NotFound {
                name: name.to_owned(),
            }),
        }
    }
}

impl ArtifactFetcher for FakeHost {
    fn fetch(&self, url: &ArtifactUrl, destination: &Utf8Path) -> Result<(), FetchError> {
        self.record(format!("fetch {}", url.file_name()));
        if let Some(status) = self.download_status {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }
        let contents = if destination.extension() == Some("conf") {
            self.template.as_str()
        } else {
            "MSI"
        };
        let write_error = |source| FetchError::Write {
            path: destination.to_path_buf(),
            source,
        };
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).map_err(write_error)?;
        }
        fs::write(destination, contents).map_err(write_error)
    }
}

impl PackageInstaller for FakeHost {
    fn install(&self, arguments: &InstallerArguments) -> Result<i32, InstallError> {
        self.record(format!("install {}", arguments.package()));
        let mut service = self.service.borrow_mut();
        if service.is_none() {
            *service = Some(ServiceStatus::Stopped);
        }
        Ok(self.installer_exit_code)
    }
}

// ---------------------------------------------------------------------------
// Test world
// ---------------------------------------------------------------------------

struct TestWorld {
    root: Utf8PathBuf,
    config: Config,
    host: FakeHost,
    outcome: Option<Result<ProvisionReport, Box<ProvisionFailure>>>,
    _temp_dir: TempDir,
}

impl TestWorld {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir");
        let root =
            Utf8PathBuf::from_path_buf(temp_dir.path().to_path_buf()).expect("utf8 temp dir");
        let config = Config {
            proxy_subnet_prefix: String::from("10.145."),
            primary_subnet_prefix: String::from("10.20."),
            proxy_server_address: Some(String::from(PROXY)),
            primary_server_address: Some(String::from(PRIMARY)),
            installer_url_x64: Some(artifact("https://repo.example/zabbix_agent2-x64.msi")),
            installer_url_x86: Some(artifact("https://repo.example/zabbix_agent2-x86.msi")),
            template_url: Some(artifact("https://repo.example/zabbix_agent2.conf")),
            agent_config_path: root.join("agent").join("zabbix_agent2.conf"),
            download_dir: Some(root.join("staging")),
            poll_interval_secs: 0,
            service_timeout_secs: 5,
            ..Config::default()
        };
        Self {
            root,
            config,
            host: FakeHost::new(),
            outcome: None,
            _temp_dir: temp_dir,
        }
    }

    fn error(&self) -> &ProvisionError {
        match self.outcome.as_ref().expect("provisioning should have run") {
            Ok(report) => panic!("expected a failed run, got {report:?}"),
            Err(failure) => &failure.error,
        }
    }

    fn report(&self) -> &ProvisionReport {
        match self.outcome.as_ref().expect("provisioning should have run") {
            Ok(report) => report,
            Err(failure) => &failure.report,
        }
    }

    fn written_config(&self) -> Option<String> {
        fs::read_to_string(self.config.agent_config_path()).ok()
    }
}

fn artifact(url: &str) -> ArtifactUrl {
    url.parse().expect("valid artefact url")
}

#[fixture]
fn world() -> TestWorld {
    TestWorld::new()
}

// ---------------------------------------------------------------------------
// Given steps
// ---------------------------------------------------------------------------

#[given("a server host at \"{address}\"")]
fn given_server(world: &mut TestWorld, address: String) {
    world.host.address = address.parse().expect("valid address");
    world.host.product_type = 3;
}

#[given("a workstation host at \"{address}\"")]
fn given_workstation(world: &mut TestWorld, address: String) {
    world.host.address = address.parse().expect("valid address");
    world.host.product_type = 1;
}

#[given("the agent service is running")]
fn given_service_running(world: &mut TestWorld) {
    *world.host.service.borrow_mut() = Some(ServiceStatus::Running);
}

#[given("the agent service is not installed")]
fn given_service_missing(world: &mut TestWorld) {
    *world.host.service.borrow_mut() = None;
}

#[given("an existing agent configuration")]
fn given_existing_config(world: &mut TestWorld) {
    let path = world.config.agent_config_path();
    fs::create_dir_all(path.parent().expect("config has a parent")).expect("create config dir");
    fs::write(path, "Server=old.corp.example\n").expect("seed config");
}

#[given("the process is not elevated")]
fn given_not_elevated(world: &mut TestWorld) {
    world.host.elevated = false;
}

#[given("the installer exits with code {code}")]
fn given_installer_code(world: &mut TestWorld, code: i32) {
    world.host.installer_exit_code = code;
}

#[given("the template is \"{text}\"")]
fn given_template(world: &mut TestWorld, text: String) {
    world.host.template = format!("{text}\n");
}

#[given("the host only has a static address at \"{address}\"")]
fn given_static_address(world: &mut TestWorld, address: String) {
    world.host.address = address.parse().expect("valid address");
    world.host.address_origin = PrefixOrigin::Manual;
    world.host.address_lifetime = None;
}

#[given("downloads answer with HTTP status {status}")]
fn given_download_status(world: &mut TestWorld, status: u16) {
    world.host.download_status = Some(status);
}

#[given("stopping the agent service is denied")]
fn given_stop_denied(world: &mut TestWorld) {
    world.host.stop_behaviour = StopBehaviour::Denied;
}

#[given("the agent service hangs while stopping")]
fn given_stop_hangs(world: &mut TestWorld) {
    world.host.stop_behaviour = StopBehaviour::Hangs;
}

#[given("service transitions time out after {secs} seconds")]
fn given_service_timeout(world: &mut TestWorld, secs: u64) {
    world.config.service_timeout_secs = secs;
}

#[given("no template URL is configured")]
fn given_no_template_url(world: &mut TestWorld) {
    world.config.template_url = None;
}

// ---------------------------------------------------------------------------
// When steps
// ---------------------------------------------------------------------------

#[when("provisioning runs")]
fn when_provisioning_runs(world: &mut TestWorld) {
    let store = FsConfigStore::default();
    let collaborators = Collaborators {
        privilege: &world.host,
        probe: &world.host,
        services: &world.host,
        fetcher: &world.host,
        installer: &world.host,
        store: &store,
    };
    let outcome =
        Orchestrator::with_architecture(&world.config, CpuArchitecture::X64, collaborators).run();
    world.outcome = Some(outcome);
}

// ---------------------------------------------------------------------------
// Then steps
// ---------------------------------------------------------------------------

#[then("the run finishes in state \"{state}\"")]
fn then_finishes(world: &mut TestWorld, state: String) {
    let report = world.report();
    assert_eq!(report.state.to_string(), state, "error: {:?}", report.error);
    assert!(world.outcome.as_ref().is_some_and(Result::is_ok));
}

#[then("the run fails during \"{state}\"")]
fn then_fails_during(world: &mut TestWorld, state: String) {
    let report = world.report();
    assert_eq!(report.state, ProvisionState::Failed);
    assert_eq!(report.failed_at.map(|failed| failed.to_string()), Some(state));
    assert!(report.error.is_some());
}

#[then("the states visited are \"{states}\"")]
fn then_states_visited(world: &mut TestWorld, states: String) {
    let visited: Vec<String> = world
        .report()
        .visited
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(visited.join(","), states);
}

#[then("the configuration contains \"{line}\"")]
fn then_config_contains(world: &mut TestWorld, line: String) {
    let written = world.written_config().expect("configuration written");
    assert!(
        written.lines().any(|candidate| candidate == line),
        "missing '{line}' in:\n{written}"
    );
}

#[then("the configuration is exactly \"{text}\"")]
fn then_config_exact(world: &mut TestWorld, text: String) {
    assert_eq!(world.written_config(), Some(format!("{text}\n")));
}

#[then("the previous configuration was backed up")]
fn then_backed_up(world: &mut TestWorld) {
    let backup = world
        .report()
        .backup_path
        .clone()
        .expect("backup path recorded");
    assert!(backup.starts_with(&world.root));
    assert_eq!(
        fs::read_to_string(&backup).expect("read backup"),
        "Server=old.corp.example\n"
    );
}

#[then("the agent service is left running")]
fn then_service_running(world: &mut TestWorld) {
    assert_eq!(*world.host.service.borrow(), Some(ServiceStatus::Running));
}

#[then("no host mutation was attempted")]
fn then_no_mutation(world: &mut TestWorld) {
    assert!(world.host.calls.borrow().is_empty());
    assert_eq!(*world.host.service.borrow(), Some(ServiceStatus::Running));
    assert!(world.written_config().is_none());
}

#[then("the configuration was not written")]
fn then_config_not_written(world: &mut TestWorld) {
    assert!(world.written_config().is_none());
}

#[then("the agent service was not started")]
fn then_not_started(world: &mut TestWorld) {
    assert!(!world.host.called("start"));
    assert_eq!(*world.host.service.borrow(), Some(ServiceStatus::Stopped));
}

#[then("the installer was not invoked")]
fn then_installer_not_invoked(world: &mut TestWorld) {
    assert!(!world.host.called("install"));
}

#[then("no start command was issued")]
fn then_no_start(world: &mut TestWorld) {
    assert!(!world.host.called("start"));
    assert!(world.written_config().is_none());
}

#[then("the agent service is left \"{status}\"")]
fn then_service_left(world: &mut TestWorld, status: String) {
    let observed = world.host.service.borrow().map(|current| current.to_string());
    assert_eq!(observed, Some(status));
}

#[then("the failure is \"{kind}\"")]
fn then_failure_kind(world: &mut TestWorld, kind: String) {
    let error = world.error();
    let matched = match kind.as_str() {
        "download status" => matches!(error, ProvisionError::Fetch(FetchError::Status { .. })),
        "access denied" => matches!(
            error,
            ProvisionError::Service(ServiceError::Control(
                ServiceControlError::AccessDenied { .. }
            ))
        ),
        "service timeout" => matches!(error, ProvisionError::Service(ServiceError::Timeout { .. })),
        "no preferred address" => matches!(
            error,
            ProvisionError::Classification(ClassificationError::NoPreferredAddress)
        ),
        other => panic!("unknown failure kind '{other}'"),
    };
    assert!(matched, "unexpected failure {error:?}");
}

#[then("no stop command was issued")]
fn then_no_stop(world: &mut TestWorld) {
    assert!(!world.host.called("stop"));
}

#[then("a reboot is reported as required")]
fn then_reboot_required(world: &mut TestWorld) {
    let report = world.report();
    assert!(report.reboot_required);
    assert_eq!(report.installer_exit_code, Some(3010));
}

#[then("{count} template warnings are reported")]
fn then_template_warnings(world: &mut TestWorld, count: usize) {
    assert_eq!(world.report().template_warnings.len(), count);
}

// ---------------------------------------------------------------------------
// Scenario registration
// ---------------------------------------------------------------------------

#[scenario(path = "tests/features/provisioning.feature")]
fn provisioning_behaviour(world: TestWorld) {
    let _ = world;
}
