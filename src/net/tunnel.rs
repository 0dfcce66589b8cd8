//! SSH port-forward transport.
//!
//! Spawns `ssh -N -L <local_port>:<remote_addr> <destination>` and routes every
//! admin request through the forwarded port. The ssh child lives as long as the
//! transport and is killed when it is dropped.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::process::{Child, Command};
use url::Url;

use crate::config::{AdminConfig, TunnelConfig};
use crate::error::{CaddyError, CaddyResult};
use crate::net::transport::{AdminRequest, AdminResponse, HttpTransport, Transport};
use crate::resilience::Backoff;

/// A running `ssh -L` child process.
#[derive(Debug)]
pub struct SshTunnel {
    child: Child,
    local_port: u16,
}

impl SshTunnel {
    /// Spawn ssh and wait until the forwarded port accepts connections.
    pub async fn open(config: &TunnelConfig) -> CaddyResult<Self> {
        let args = ssh_args(config);
        tracing::info!(
            destination = %config.destination,
            local_port = config.local_port,
            remote_addr = %config.remote_addr,
            "Opening SSH tunnel"
        );
        ensure_port_free(config.local_port).await?;

        let child = Command::new(&config.ssh_binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| CaddyError::network(format!("failed to spawn {}: {}", config.ssh_binary, e)))?;

        let mut tunnel = Self {
            child,
            local_port: config.local_port,
        };
        tunnel.wait_ready(config).await?;
        Ok(tunnel)
    }

    pub fn local_port(&self) -> u16 {
        self.local_port
    }

    async fn wait_ready(&mut self, config: &TunnelConfig) -> CaddyResult<()> {
        let mut backoff = Backoff::new(
            config.ready_attempts,
            config.ready_base_delay_ms,
            config.ready_max_delay_ms,
        );

        while let Some(delay) = backoff.next() {
            if let Some(status) = self.child.try_wait().map_err(CaddyError::network)? {
                return Err(CaddyError::network(format!("ssh exited early with {}", status)));
            }
            if TcpStream::connect(("127.0.0.1", self.local_port)).await.is_ok() {
                // A listener that is not ours would also accept; ssh must still be alive.
                if let Some(status) = self.child.try_wait().map_err(CaddyError::network)? {
                    return Err(CaddyError::network(format!("ssh exited early with {}", status)));
                }
                tracing::info!(local_port = self.local_port, attempts = backoff.attempts(), "SSH tunnel ready");
                return Ok(());
            }
            tokio::time::sleep(delay).await;
        }

        Err(CaddyError::network(format!(
            "SSH tunnel on port {} not ready after {} attempts",
            self.local_port,
            backoff.attempts()
        )))
    }
}

/// Fail when something already listens on the forward port, since readiness
/// polling could not tell it apart from the tunnel.
async fn ensure_port_free(port: u16) -> CaddyResult<()> {
    match TcpListener::bind(("127.0.0.1", port)).await {
        Ok(listener) => {
            drop(listener);
            Ok(())
        }
        Err(e) => Err(CaddyError::network(format!("local port {} is already in use: {}", port, e))),
    }
}

/// Arguments passed to the ssh binary for a local forward.
pub fn ssh_args(config: &TunnelConfig) -> Vec<String> {
    let mut args = vec![
        "-N".to_string(),
        "-o".to_string(),
        "ExitOnForwardFailure=yes".to_string(),
        "-L".to_string(),
        format!("{}:{}", config.local_port, config.remote_addr),
    ];
    args.extend(config.extra_args.iter().cloned());
    args.push(config.destination.clone());
    args
}

/// Transport that sends every request through an [`SshTunnel`].
#[derive(Debug)]
pub struct TunnelTransport {
    inner: HttpTransport,
    tunnel: SshTunnel,
}

impl TunnelTransport {
    pub async fn open(admin: &AdminConfig, tunnel: &TunnelConfig) -> CaddyResult<Self> {
        let tunnel = SshTunnel::open(tunnel).await?;
        let inner = HttpTransport::with_timeouts(
            &format!("http://127.0.0.1:{}", tunnel.local_port()),
            Duration::from_secs(admin.timeout_secs),
            Duration::from_secs(admin.connect_timeout_secs),
        )?;
        Ok(Self { inner, tunnel })
    }

    pub fn tunnel(&self) -> &SshTunnel {
        &self.tunnel
    }
}

#[async_trait]
impl Transport for TunnelTransport {
    async fn send(&self, request: AdminRequest) -> CaddyResult<AdminResponse> {
        self.inner.send(request).await
    }

    fn endpoint(&self) -> &Url {
        self.inner.endpoint()
    }
}
