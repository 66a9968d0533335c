//! Bootstrap payload builder.
//!
//! Produces the instance user data: a MIME multipart document with a
//! cloud-config part (re-enabling user scripts on every boot) and a shell
//! script part that mounts the shared filesystem, generates the per-instance
//! TLS material, and starts the remote docker daemon container. The payload
//! is opaque to the orchestration engine — it is built here and forwarded to
//! the launch call as-is.

use crate::domain::config::AUX_PORT;
use crate::domain::host::{self, ROOT_MOUNT, STUDIO_MOUNT};

/// Caller-supplied hook script bodies, already normalized with
/// [`normalize_hook_script`].
#[derive(Debug, Clone, Default)]
pub struct BootstrapHooks {
    /// Runs before anything else.
    pub pre: String,
    /// Defines `_tls_generate_certs`, invoked with the certificate directory.
    pub create_certs: String,
    /// Runs after the daemon container is up.
    pub post: String,
}

/// Inputs for one rendered payload.
#[derive(Debug, Clone)]
pub struct UserData<'a> {
    /// Effective home directory of the local client.
    pub home: &'a str,
    pub efs_ip_address: &'a str,
    /// Export path component on the shared filesystem.
    pub user_uid: &'a str,
    /// Host port published to the daemon's TLS port.
    pub port: u16,
    /// Daemon container image (CPU or GPU variant).
    pub docker_image: &'a str,
    /// Accelerator passthrough option, when the instance type has one.
    pub gpu_option: Option<&'a str>,
    /// Extra ports published 1:1.
    pub additional_ports: &'a [u16],
    pub hooks: &'a BootstrapHooks,
}

/// Strip a leading shebang line and indent the body so it nests inside the
/// generated script.
#[must_use]
pub fn normalize_hook_script(raw: &str) -> String {
    let body = raw.strip_prefix("#!").map_or(raw, |rest| {
        rest.split_once('\n').map_or("", |(_, tail)| tail)
    });
    body.trim_end().replace('\n', "\n    ")
}

const NFS_MOUNT_OPTS: &str =
    "nfsvers=4.1,rsize=1048576,wsize=1048576,hard,timeo=600,retrans=2";

impl UserData<'_> {
    /// Render the full multipart user-data document.
    #[must_use]
    pub fn render(&self) -> String {
        let script = self.shell_script();
        format!(
            "Content-Type: multipart/mixed; boundary=\"//\"\n\
             MIME-Version: 1.0\n\
             \n\
             --//\n\
             Content-Type: text/cloud-config; charset=\"us-ascii\"\n\
             MIME-Version: 1.0\n\
             Content-Transfer-Encoding: 7bit\n\
             Content-Disposition: attachment; filename=\"cloud-config.txt\"\n\
             \n\
             #cloud-config\n\
             cloud_final_modules:\n\
             - [scripts-user, always]\n\
             \n\
             --//\n\
             Content-Type: text/x-shellscript; charset=\"us-ascii\"\n\
             MIME-Version: 1.0\n\
             Content-Transfer-Encoding: 7bit\n\
             Content-Disposition: attachment; filename=\"userdata.txt\"\n\
             \n\
             {script}\n\
             --//--"
        )
    }

    /// Whether the effective home needs its own third mount.
    fn home_is_standard(&self) -> bool {
        self.home == ROOT_MOUNT || self.home == STUDIO_MOUNT
    }

    fn mount_block(&self, target: &str) -> String {
        format!(
            "sudo mkdir -p {target}\n    \
             sudo mount -t nfs -o {NFS_MOUNT_OPTS} {}:/{} {target}",
            self.efs_ip_address, self.user_uid
        )
    }

    fn port_bindings(&self) -> String {
        let mut bindings = format!("-p {}:2376 -p {AUX_PORT}:{AUX_PORT}", self.port);
        for p in self.additional_ports {
            bindings.push_str(&format!(" -p {p}:{p}"));
        }
        bindings
    }

    fn daemon_run_line(&self, certs_dir: &str) -> String {
        let gpu = self
            .gpu_option
            .map(|opt| format!(" {opt}"))
            .unwrap_or_default();
        let home_volume = if self.home_is_standard() {
            String::new()
        } else {
            format!(" -v {0}:{0}", self.home)
        };
        format!(
            "sudo docker run -d {ports}{gpu} \
             -v {ROOT_MOUNT}:{ROOT_MOUNT} -v {STUDIO_MOUNT}:{STUDIO_MOUNT}{home_volume} \
             -v {certs_dir}:/certs \
             --privileged --name dockerd-server -e DOCKER_TLS_CERTDIR=\"/certs\" {image} \
             dockerd --tlsverify --tlscacert=/certs/ca/cert.pem \
             --tlscert=/certs/server/cert.pem --tlskey=/certs/server/key.pem \
             -H=0.0.0.0:2376",
            ports = self.port_bindings(),
            image = self.docker_image,
        )
    }

    fn shell_script(&self) -> String {
        // The certificate directory lands on the shared filesystem, so the
        // local poller sees it under the same contract path.
        let certs_base = if self.home_is_standard() {
            ROOT_MOUNT
        } else {
            self.home
        };
        let certs_dir =
            host::credentials_dir(certs_base, "${instance_type}", "${instance_id}");

        let mut mounts = vec![self.mount_block(ROOT_MOUNT), self.mount_block(STUDIO_MOUNT)];
        if !self.home_is_standard() {
            mounts.push(self.mount_block(self.home));
        }
        let mounts = mounts.join("\n\n    ");

        format!(
            "#!/bin/bash\n\
             set -x\n\
             exec > >(tee /var/log/user-data.log|logger -t user-data -s 2>/dev/console) 2>&1\n\
             \n    \
             {pre}\n\
             \n    \
             echo \"Mounting shared filesystem\"\n\
             \n    \
             {mounts}\n\
             \n    \
             {create_certs}\n\
             \n    \
             instance_type=$(curl http://169.254.169.254/latest/meta-data/instance-type)\n    \
             instance_id=$(curl http://169.254.169.254/latest/meta-data/instance-id)\n\
             \n    \
             CERTS={certs_dir}\n    \
             mkdir -p $CERTS\n\
             \n    \
             _tls_generate_certs \"$CERTS\"\n\
             \n    \
             {run_line}\n\
             \n    \
             {post}\n",
            pre = self.hooks.pre,
            create_certs = self.hooks.create_certs,
            run_line = self.daemon_run_line("$CERTS"),
            post = self.hooks.post,
        )
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
