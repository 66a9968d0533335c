//! End-to-end `create-host` scenarios against stubbed ports.

#![allow(clippy::expect_used)]

use dockhost::application::services::create_host::{CreateHostRequest, create_host};
use dockhost::bootstrap::BootstrapHooks;
use dockhost::domain::config::ProvisioningConfig;
use dockhost::domain::health::PollPolicy;

use crate::mocks::{
    CloudFake, ContextFake, LAUNCHED_DNS, LAUNCHED_ID, MemoryStore, NullReporter, ScriptedProbe,
};

fn config() -> ProvisioningConfig {
    ProvisioningConfig {
        region: "us-east-1".to_string(),
        vpc_id: "vpc-1".to_string(),
        subnet_ids: vec!["subnet-1".to_string(), "subnet-2".to_string()],
        security_groups: vec!["sg-client".to_string()],
        efs_ip_address: "10.0.0.5".to_string(),
        mount_target_id: "fsmt-1".to_string(),
        mount_target_security_groups: vec!["sg-mt".to_string()],
        user_uid: "200001".to_string(),
        image_id: "ami-1".to_string(),
        ..ProvisioningConfig::default()
    }
}

fn hooks() -> BootstrapHooks {
    BootstrapHooks {
        pre: "echo pre".to_string(),
        create_certs: "_tls_generate_certs() { true; }".to_string(),
        post: "echo post".to_string(),
    }
}

fn request<'a>(hooks: &'a BootstrapHooks, subnet_id: Option<&'a str>) -> CreateHostRequest<'a> {
    CreateHostRequest {
        instance_type: "m5.large",
        subnet_id,
        home: "/home/studio-user",
        hooks,
    }
}

/// Scenario A: empty `HostSGs`, no `--subnet-id` flag → the first configured
/// subnet is selected and a new DockerHost group is created.
#[tokio::test(start_paused = true)]
async fn scenario_a_defaults_select_first_subnet_and_create_host_group() {
    let cloud = CloudFake::default();
    let probe = ScriptedProbe::new(0);
    let contexts = ContextFake::default();
    let store = MemoryStore::default();
    let hooks = hooks();

    let record = create_host(
        &cloud,
        &cloud,
        &probe,
        &contexts,
        &store,
        &NullReporter,
        &config(),
        &PollPolicy::default(),
        &request(&hooks, None),
    )
    .await
    .expect("create-host");

    assert_eq!(record.instance_id, LAUNCHED_ID);
    let calls = cloud.calls();
    assert!(calls.contains(&"create:DockerHost".to_string()), "{calls:?}");
    assert!(calls.contains(&"create:EFSDockerHost".to_string()), "{calls:?}");

    let launches = cloud.launches();
    assert_eq!(launches.len(), 1);
    assert_eq!(launches[0].subnet_id, "subnet-1");
    assert_eq!(
        launches[0].security_group_ids,
        ["sg-DockerHost", "sg-EFSDockerHost"]
    );
    assert_eq!(launches[0].image_id, "ami-1");
    assert!(launches[0].tag_keys.contains(&"Name".to_string()));

    // the storage group was attached to the mount target
    let replacements = cloud.mount_replacements.lock().expect("mutex").clone();
    assert_eq!(replacements, [["sg-mt", "sg-EFSDockerHost"]]);
}

/// Scenario B: a subnet outside the configured set aborts before any policy
/// object or instance is created.
#[tokio::test]
async fn scenario_b_invalid_subnet_aborts_before_any_cloud_call() {
    let cloud = CloudFake::default();
    let probe = ScriptedProbe::new(0);
    let contexts = ContextFake::default();
    let store = MemoryStore::default();
    let hooks = hooks();

    let err = create_host(
        &cloud,
        &cloud,
        &probe,
        &contexts,
        &store,
        &NullReporter,
        &config(),
        &PollPolicy::default(),
        &request(&hooks, Some("subnet-9")),
    )
    .await
    .expect_err("expected Err");

    assert!(format!("{err:#}").contains("InvalidSubnetId"));
    assert!(cloud.calls().is_empty(), "no cloud call may be issued");
    assert!(store.current().is_none());
}

/// Scenario C: the health probe never succeeds → the poller runs its full
/// default budget, the instance is rolled back, and no record is written.
#[tokio::test(start_paused = true)]
async fn scenario_c_health_exhaustion_rolls_back_and_never_writes_a_record() {
    let cloud = CloudFake::default();
    let probe = ScriptedProbe::new(u32::MAX);
    let contexts = ContextFake::default();
    let store = MemoryStore::default();
    let hooks = hooks();
    let policy = PollPolicy::default();

    let err = create_host(
        &cloud,
        &cloud,
        &probe,
        &contexts,
        &store,
        &NullReporter,
        &config(),
        &policy,
        &request(&hooks, None),
    )
    .await
    .expect_err("expected Err");

    assert_eq!(probe.count(), policy.max_attempts);
    let terminations: Vec<_> = cloud
        .calls()
        .into_iter()
        .filter(|c| c.starts_with("terminate:"))
        .collect();
    assert_eq!(terminations, [format!("terminate:{LAUNCHED_ID}")]);
    // local cleanup ran as part of the rollback
    let context_calls = contexts.calls();
    assert!(context_calls.contains(&"switch_default".to_string()), "{context_calls:?}");
    assert!(context_calls.contains(&format!("remove:{LAUNCHED_ID}")), "{context_calls:?}");
    assert!(store.current().is_none(), "no record on failure");
    assert!(format!("{err:#}").contains("after 144 attempts"));
}

/// Scenario D: the probe succeeds on attempt 3 → the record is persisted and
/// the named context is created and activated.
#[tokio::test(start_paused = true)]
async fn scenario_d_success_persists_record_and_activates_context() {
    let cloud = CloudFake::default();
    let probe = ScriptedProbe::new(2);
    let contexts = ContextFake::default();
    let store = MemoryStore::default();
    let hooks = hooks();

    let record = create_host(
        &cloud,
        &cloud,
        &probe,
        &contexts,
        &store,
        &NullReporter,
        &config(),
        &PollPolicy::default(),
        &request(&hooks, None),
    )
    .await
    .expect("create-host");

    assert_eq!(probe.count(), 3);
    let saved = store.current().expect("record persisted");
    assert_eq!(saved, record);
    assert_eq!(saved.instance_id, LAUNCHED_ID);
    assert_eq!(saved.instance_dns, LAUNCHED_DNS);
    assert_eq!(saved.port, 1111);
    assert_eq!(saved.instance_type, "m5.large");

    let name = format!("m5.large_{LAUNCHED_ID}");
    assert_eq!(
        contexts.calls(),
        [format!("create:{name}"), format!("switch:{name}")]
    );
}

/// Caller-supplied host groups skip DockerHost provisioning entirely; the
/// storage group is still ensured.
#[tokio::test(start_paused = true)]
async fn configured_host_groups_skip_host_group_provisioning() {
    let cloud = CloudFake::default();
    let probe = ScriptedProbe::new(0);
    let contexts = ContextFake::default();
    let store = MemoryStore::default();
    let hooks = hooks();
    let mut cfg = config();
    cfg.host_security_groups = vec!["sg-custom".to_string()];

    create_host(
        &cloud,
        &cloud,
        &probe,
        &contexts,
        &store,
        &NullReporter,
        &cfg,
        &PollPolicy::default(),
        &request(&hooks, None),
    )
    .await
    .expect("create-host");

    let calls = cloud.calls();
    assert!(!calls.contains(&"create:DockerHost".to_string()), "{calls:?}");
    assert!(calls.contains(&"create:EFSDockerHost".to_string()), "{calls:?}");
    assert_eq!(
        cloud.launches()[0].security_group_ids,
        ["sg-custom", "sg-EFSDockerHost"]
    );
}

/// A storage group already present in the mount target's set is not
/// re-attached.
#[tokio::test(start_paused = true)]
async fn attached_storage_group_issues_no_mount_mutation() {
    let cloud = CloudFake::default();
    cloud
        .existing
        .lock()
        .expect("mutex")
        .push(("EFSDockerHost".to_string(), "sg-efs".to_string()));
    let probe = ScriptedProbe::new(0);
    let contexts = ContextFake::default();
    let store = MemoryStore::default();
    let hooks = hooks();
    let mut cfg = config();
    cfg.mount_target_security_groups = vec!["sg-mt".to_string(), "sg-efs".to_string()];

    create_host(
        &cloud,
        &cloud,
        &probe,
        &contexts,
        &store,
        &NullReporter,
        &cfg,
        &PollPolicy::default(),
        &request(&hooks, None),
    )
    .await
    .expect("create-host");

    assert!(cloud.mount_replacements.lock().expect("mutex").is_empty());
}

/// GPU instance types get the GPU daemon image and the passthrough option in
/// the bootstrap payload.
#[tokio::test(start_paused = true)]
async fn gpu_instance_type_selects_gpu_runtime_in_the_payload() {
    let cloud = CloudFake {
        gpu: true,
        ..CloudFake::default()
    };
    let probe = ScriptedProbe::new(0);
    let contexts = ContextFake::default();
    let store = MemoryStore::default();
    let hooks = hooks();
    let mut cfg = config();
    cfg.docker_image_nvidia_uri = "gpu:dind".to_string();

    create_host(
        &cloud,
        &cloud,
        &probe,
        &contexts,
        &store,
        &NullReporter,
        &cfg,
        &PollPolicy::default(),
        &request(&hooks, None),
    )
    .await
    .expect("create-host");

    let user_data = cloud.launches()[0].user_data.clone();
    assert!(user_data.contains("--gpus all"));
    assert!(user_data.contains(" gpu:dind "));
}

/// A healthy host whose context switch never lands keeps running with its
/// record persisted — the failure is surfaced, not masked.
#[tokio::test(start_paused = true)]
async fn switch_exhaustion_fails_the_run_but_keeps_the_record() {
    let cloud = CloudFake::default();
    let probe = ScriptedProbe::new(0);
    let contexts = ContextFake {
        switch_failures: u32::MAX,
        ..ContextFake::default()
    };
    let store = MemoryStore::default();
    let hooks = hooks();

    let err = create_host(
        &cloud,
        &cloud,
        &probe,
        &contexts,
        &store,
        &NullReporter,
        &config(),
        &PollPolicy::default(),
        &request(&hooks, None),
    )
    .await
    .expect_err("expected Err");

    assert!(format!("{err:#}").contains("unable to switch docker context"));
    assert!(store.current().is_some(), "record persisted before the switch");
    let terminations = cloud
        .calls()
        .into_iter()
        .filter(|c| c.starts_with("terminate:"))
        .count();
    assert_eq!(terminations, 0, "a healthy host is never rolled back");
}
