//! Cloud API adapters driving the `aws` CLI (v2) through a `CommandRunner`.
//!
//! Every call is `aws <service> <op> --region … --output json`; stdout is
//! parsed with `serde_json`, and a non-zero exit becomes a
//! [`CloudApiError`] with the provider error code recovered from stderr.

use anyhow::{Context, Result};
use serde_json::{Value, json};

use crate::application::ports::{Ec2Api, EfsApi, LaunchSpec, LaunchedInstance};
use crate::command_runner::CommandRunner;
use crate::domain::error::CloudApiError;

/// Provider error codes this tool reacts to; anything else stays codeless.
const KNOWN_ERROR_CODES: &[&str] = &[
    "InvalidGroup.Duplicate",
    "InvalidGroup.NotFound",
    "InvalidInstanceID.NotFound",
];

fn classify_failure(stderr: &[u8]) -> CloudApiError {
    let message = String::from_utf8_lossy(stderr).trim().to_string();
    let code = KNOWN_ERROR_CODES
        .iter()
        .find(|code| message.contains(*code))
        .map(|code| (*code).to_string());
    CloudApiError { code, message }
}

async fn run_json<R: CommandRunner>(
    runner: &R,
    args: &[&str],
) -> Result<Value, CloudApiError> {
    tracing::debug!("aws {} {}", args.first().unwrap_or(&""), args.get(1).unwrap_or(&""));
    let output = runner
        .run("aws", args)
        .await
        .map_err(|err| CloudApiError {
            code: None,
            message: format!("{err:#}"),
        })?;
    if !output.status.success() {
        return Err(classify_failure(&output.stderr));
    }
    if output.stdout.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(&output.stdout).map_err(|err| CloudApiError {
        code: None,
        message: format!("unparseable aws response: {err}"),
    })
}

fn group_rule_permissions(peer_group_id: &str, port_range: (u16, u16), description: &str) -> String {
    json!([{
        "IpProtocol": "tcp",
        "FromPort": port_range.0,
        "ToPort": port_range.1,
        "UserIdGroupPairs": [{
            "GroupId": peer_group_id,
            "Description": description,
        }],
    }])
    .to_string()
}

// ── EC2 ──────────────────────────────────────────────────────────────────────

/// EC2 adapter; generic over the runner so tests inject a mock.
pub struct AwsEc2Cli<R: CommandRunner> {
    runner: R,
    region: String,
}

impl<R: CommandRunner> AwsEc2Cli<R> {
    pub fn new(runner: R, region: impl Into<String>) -> Self {
        Self {
            runner,
            region: region.into(),
        }
    }

    async fn ec2(&self, op: &str, extra: &[&str]) -> Result<Value, CloudApiError> {
        let mut args = vec!["ec2", op, "--region", self.region.as_str(), "--output", "json"];
        args.extend_from_slice(extra);
        run_json(&self.runner, &args).await
    }
}

impl<R: CommandRunner> Ec2Api for AwsEc2Cli<R> {
    async fn find_security_group(&self, name: &str, vpc_id: &str) -> Result<Option<String>> {
        let name_filter = format!("Name=group-name,Values={name}");
        let vpc_filter = format!("Name=vpc-id,Values={vpc_id}");
        let response = match self
            .ec2(
                "describe-security-groups",
                &["--filters", &name_filter, &vpc_filter],
            )
            .await
        {
            Ok(value) => value,
            Err(err) if err.is_not_found() => return Ok(None),
            Err(err) => return Err(err).context("describe-security-groups"),
        };
        Ok(response["SecurityGroups"]
            .get(0)
            .and_then(|g| g["GroupId"].as_str())
            .map(ToString::to_string))
    }

    async fn create_security_group(
        &self,
        name: &str,
        description: &str,
        vpc_id: &str,
    ) -> Result<String, CloudApiError> {
        let response = self
            .ec2(
                "create-security-group",
                &[
                    "--group-name",
                    name,
                    "--description",
                    description,
                    "--vpc-id",
                    vpc_id,
                ],
            )
            .await?;
        response["GroupId"]
            .as_str()
            .map(ToString::to_string)
            .ok_or_else(|| CloudApiError {
                code: None,
                message: "create-security-group response missing GroupId".to_string(),
            })
    }

    async fn authorize_ingress(
        &self,
        group_id: &str,
        peer_group_id: &str,
        port_range: (u16, u16),
        description: &str,
    ) -> Result<()> {
        let permissions = group_rule_permissions(peer_group_id, port_range, description);
        self.ec2(
            "authorize-security-group-ingress",
            &["--group-id", group_id, "--ip-permissions", &permissions],
        )
        .await
        .context("authorize-security-group-ingress")?;
        Ok(())
    }

    async fn authorize_egress(
        &self,
        group_id: &str,
        peer_group_id: &str,
        port_range: (u16, u16),
        description: &str,
    ) -> Result<()> {
        let permissions = group_rule_permissions(peer_group_id, port_range, description);
        self.ec2(
            "authorize-security-group-egress",
            &["--group-id", group_id, "--ip-permissions", &permissions],
        )
        .await
        .context("authorize-security-group-egress")?;
        Ok(())
    }

    async fn revoke_default_egress(&self, group_id: &str) -> Result<()> {
        let permissions = json!([{
            "IpProtocol": "-1",
            "IpRanges": [{"CidrIp": "0.0.0.0/0"}],
        }])
        .to_string();
        self.ec2(
            "revoke-security-group-egress",
            &["--group-id", group_id, "--ip-permissions", &permissions],
        )
        .await
        .context("revoke-security-group-egress")?;
        Ok(())
    }

    async fn instance_has_gpu(&self, instance_type: &str) -> Result<bool> {
        let response = self
            .ec2("describe-instance-types", &["--instance-types", instance_type])
            .await
            .context("describe-instance-types")?;
        Ok(response["InstanceTypes"]
            .get(0)
            .is_some_and(|descriptor| descriptor.get("GpuInfo").is_some()))
    }

    async fn run_instance(&self, spec: &LaunchSpec<'_>) -> Result<LaunchedInstance> {
        let block_devices = json!([{
            "DeviceName": "/dev/xvda",
            "Ebs": {"VolumeSize": spec.volume_size_gb},
        }])
        .to_string();
        let tag_specs = json!([{
            "ResourceType": "instance",
            "Tags": spec.tags.iter().map(|t| json!({"Key": t.key, "Value": t.value})).collect::<Vec<_>>(),
        }])
        .to_string();

        let mut args: Vec<&str> = vec![
            "--image-id",
            spec.image_id,
            "--instance-type",
            spec.instance_type,
            "--subnet-id",
            spec.subnet_id,
            "--count",
            "1",
            "--block-device-mappings",
            &block_devices,
            "--tag-specifications",
            &tag_specs,
            "--cli-binary-format",
            "raw-in-base64-out",
            "--user-data",
            spec.user_data,
        ];
        args.push("--security-group-ids");
        args.extend(spec.security_group_ids.iter().map(String::as_str));
        if let Some(key_name) = spec.key_name {
            args.push("--key-name");
            args.push(key_name);
        }
        let profile;
        if let Some(arn) = spec.instance_profile_arn {
            profile = format!("Arn={arn}");
            args.push("--iam-instance-profile");
            args.push(&profile);
        }

        let response = self
            .ec2("run-instances", &args)
            .await
            .context("run-instances")?;
        let instance = response["Instances"]
            .get(0)
            .context("run-instances response missing Instances[0]")?;
        Ok(LaunchedInstance {
            instance_id: instance["InstanceId"]
                .as_str()
                .context("run-instances response missing InstanceId")?
                .to_string(),
            private_dns: instance["PrivateDnsName"]
                .as_str()
                .context("run-instances response missing PrivateDnsName")?
                .to_string(),
        })
    }

    async fn terminate_instance(&self, instance_id: &str) -> Result<()> {
        self.ec2("terminate-instances", &["--instance-ids", instance_id])
            .await
            .context("terminate-instances")?;
        Ok(())
    }
}

// ── EFS ──────────────────────────────────────────────────────────────────────

/// EFS adapter; generic over the runner so tests inject a mock.
pub struct AwsEfsCli<R: CommandRunner> {
    runner: R,
    region: String,
}

impl<R: CommandRunner> AwsEfsCli<R> {
    pub fn new(runner: R, region: impl Into<String>) -> Self {
        Self {
            runner,
            region: region.into(),
        }
    }
}

impl<R: CommandRunner> EfsApi for AwsEfsCli<R> {
    async fn replace_mount_target_security_groups(
        &self,
        mount_target_id: &str,
        groups: &[String],
    ) -> Result<()> {
        let mut args = vec![
            "efs",
            "modify-mount-target-security-groups",
            "--region",
            self.region.as_str(),
            "--output",
            "json",
            "--mount-target-id",
            mount_target_id,
            "--security-groups",
        ];
        args.extend(groups.iter().map(String::as_str));
        run_json(&self.runner, &args)
            .await
            .context("modify-mount-target-security-groups")?;
        Ok(())
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
