//! Shared mock infrastructure for unit tests.
//!
//! Provides recording fakes for the cloud, probe, context, and state ports
//! so each test file doesn't have to re-define the same boilerplate.

#![allow(clippy::expect_used)]

use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;
use std::sync::Mutex;

use anyhow::{Result, bail};
use dockhost::application::ports::{
    ContextStore, DaemonEndpoint, DaemonProbe, Ec2Api, EfsApi, HostStateStore, LaunchSpec,
    LaunchedInstance, ProgressReporter,
};
use dockhost::domain::error::CloudApiError;
use dockhost::domain::host::HostRecord;

pub const LAUNCHED_ID: &str = "i-0abc";
pub const LAUNCHED_DNS: &str = "ip-10-0-0-7.ec2.internal";

/// Owned snapshot of the one-shot launch call.
#[derive(Debug, Clone)]
pub struct LaunchCall {
    pub image_id: String,
    pub instance_type: String,
    pub subnet_id: String,
    pub security_group_ids: Vec<String>,
    pub user_data: String,
    pub tag_keys: Vec<String>,
}

/// Recording fake for both cloud ports. Security groups created by a test
/// run get the id `sg-<name>`.
pub struct CloudFake {
    /// Pre-existing groups by name.
    pub existing: Mutex<Vec<(String, String)>>,
    pub gpu: bool,
    pub terminate_fails: bool,
    pub calls: Mutex<Vec<String>>,
    pub launches: Mutex<Vec<LaunchCall>>,
    pub mount_replacements: Mutex<Vec<Vec<String>>>,
}

impl Default for CloudFake {
    fn default() -> Self {
        Self {
            existing: Mutex::new(Vec::new()),
            gpu: false,
            terminate_fails: false,
            calls: Mutex::new(Vec::new()),
            launches: Mutex::new(Vec::new()),
            mount_replacements: Mutex::new(Vec::new()),
        }
    }
}

impl CloudFake {
    pub fn log(&self, call: impl Into<String>) {
        self.calls.lock().expect("mutex").push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("mutex").clone()
    }

    pub fn launches(&self) -> Vec<LaunchCall> {
        self.launches.lock().expect("mutex").clone()
    }
}

impl Ec2Api for CloudFake {
    async fn find_security_group(&self, name: &str, _: &str) -> Result<Option<String>> {
        self.log(format!("find:{name}"));
        Ok(self
            .existing
            .lock()
            .expect("mutex")
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, id)| id.clone()))
    }

    async fn create_security_group(
        &self,
        name: &str,
        _: &str,
        _: &str,
    ) -> Result<String, CloudApiError> {
        self.log(format!("create:{name}"));
        let id = format!("sg-{name}");
        self.existing
            .lock()
            .expect("mutex")
            .push((name.to_string(), id.clone()));
        Ok(id)
    }

    async fn authorize_ingress(
        &self,
        group_id: &str,
        peer: &str,
        _: (u16, u16),
        _: &str,
    ) -> Result<()> {
        self.log(format!("ingress:{group_id}:{peer}"));
        Ok(())
    }

    async fn authorize_egress(
        &self,
        group_id: &str,
        peer: &str,
        _: (u16, u16),
        _: &str,
    ) -> Result<()> {
        self.log(format!("egress:{group_id}:{peer}"));
        Ok(())
    }

    async fn revoke_default_egress(&self, group_id: &str) -> Result<()> {
        self.log(format!("revoke_egress:{group_id}"));
        Ok(())
    }

    async fn instance_has_gpu(&self, _: &str) -> Result<bool> {
        self.log("describe_instance_type");
        Ok(self.gpu)
    }

    async fn run_instance(&self, spec: &LaunchSpec<'_>) -> Result<LaunchedInstance> {
        self.log("run_instance");
        self.launches.lock().expect("mutex").push(LaunchCall {
            image_id: spec.image_id.to_string(),
            instance_type: spec.instance_type.to_string(),
            subnet_id: spec.subnet_id.to_string(),
            security_group_ids: spec.security_group_ids.to_vec(),
            user_data: spec.user_data.to_string(),
            tag_keys: spec.tags.iter().map(|t| t.key.clone()).collect(),
        });
        Ok(LaunchedInstance {
            instance_id: LAUNCHED_ID.to_string(),
            private_dns: LAUNCHED_DNS.to_string(),
        })
    }

    async fn terminate_instance(&self, instance_id: &str) -> Result<()> {
        self.log(format!("terminate:{instance_id}"));
        if self.terminate_fails {
            bail!("api unavailable")
        }
        Ok(())
    }
}

impl EfsApi for CloudFake {
    async fn replace_mount_target_security_groups(
        &self,
        mount_target_id: &str,
        groups: &[String],
    ) -> Result<()> {
        self.log(format!("replace_mount_groups:{mount_target_id}"));
        self.mount_replacements
            .lock()
            .expect("mutex")
            .push(groups.to_vec());
        Ok(())
    }
}

/// Probe that fails a configured number of times before succeeding.
pub struct ScriptedProbe {
    pub failures: u32,
    pub probes: Mutex<u32>,
}

impl ScriptedProbe {
    #[must_use]
    pub fn new(failures: u32) -> Self {
        Self {
            failures,
            probes: Mutex::new(0),
        }
    }

    pub fn count(&self) -> u32 {
        *self.probes.lock().expect("mutex")
    }
}

impl DaemonProbe for ScriptedProbe {
    async fn probe(&self, _: &DaemonEndpoint<'_>) -> Result<()> {
        let mut probes = self.probes.lock().expect("mutex");
        *probes += 1;
        if *probes <= self.failures {
            bail!("connection refused")
        }
        Ok(())
    }
}

/// Records context operations; `switch` can be scripted to fail.
#[derive(Default)]
pub struct ContextFake {
    pub switch_failures: u32,
    pub switches: Mutex<u32>,
    pub calls: Mutex<Vec<String>>,
}

impl ContextFake {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("mutex").clone()
    }
}

impl ContextStore for ContextFake {
    async fn create(&self, name: &str, _: &DaemonEndpoint<'_>) -> Result<ExitStatus> {
        self.calls.lock().expect("mutex").push(format!("create:{name}"));
        Ok(ExitStatus::from_raw(0))
    }

    async fn switch(&self, name: &str) -> Result<ExitStatus> {
        self.calls.lock().expect("mutex").push(format!("switch:{name}"));
        let mut switches = self.switches.lock().expect("mutex");
        *switches += 1;
        if *switches <= self.switch_failures {
            Ok(ExitStatus::from_raw(1 << 8))
        } else {
            Ok(ExitStatus::from_raw(0))
        }
    }

    async fn switch_default(&self) -> Result<ExitStatus> {
        self.calls
            .lock()
            .expect("mutex")
            .push("switch_default".to_string());
        Ok(ExitStatus::from_raw(0))
    }

    async fn remove_matching(&self, needle: &str) -> Result<ExitStatus> {
        self.calls
            .lock()
            .expect("mutex")
            .push(format!("remove:{needle}"));
        Ok(ExitStatus::from_raw(0))
    }
}

/// In-memory single-slot state store.
#[derive(Default)]
pub struct MemoryStore {
    pub record: Mutex<Option<HostRecord>>,
}

impl MemoryStore {
    #[must_use]
    pub fn with_record(record: HostRecord) -> Self {
        Self {
            record: Mutex::new(Some(record)),
        }
    }

    pub fn current(&self) -> Option<HostRecord> {
        self.record.lock().expect("mutex").clone()
    }
}

impl HostStateStore for MemoryStore {
    async fn load(&self) -> Result<Option<HostRecord>> {
        Ok(self.record.lock().expect("mutex").clone())
    }

    async fn save(&self, record: &HostRecord) -> Result<()> {
        *self.record.lock().expect("mutex") = Some(record.clone());
        Ok(())
    }
}

/// Reporter that drops everything.
pub struct NullReporter;

impl ProgressReporter for NullReporter {
    fn step(&self, _: &str) {}
    fn success(&self, _: &str) {}
    fn warn(&self, _: &str) {}
}
