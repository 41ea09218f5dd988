// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Start-up and shutdown ordering (C11, spec §4.11): wires every adapter and
//! actioner together, picks the port-knock or HTTP-push watcher variant,
//! installs signal handlers, and runs until told to stop.

use crate::config::Config;
use agentadapters::{AuthorizedKeysStore, FsAuthorizedKeysStore, HelperAuthorizedKeysStore, HttpLogEmitter, HttpMetadataClient, MetadataClient, SshdConfigAdapter, TokioFileSource};
use agentcore::{Error, InvestigationState, SystemClock};
use agentengine::{Actioner, Dispatcher, Exporter, HttpPushWatcher, MetadataWatcher, PortKnockWatcher, Reconciler, ReservedIpv6Actioner, SshKeysActioner, TroubleshootingActioner};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error as ThisError;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{info, warn};

/// Status reported on the `running`/`stopped` transitions (spec §4.11 steps
/// 6 and shutdown-1).
const STATUS_RUNNING: &str = "running";
const STATUS_STOPPED: &str = "stopped";
/// Delay between `running` status retries; retried forever until it succeeds
/// (spec §4.11 step 6 — `stopped` gets a single best-effort attempt instead).
const STATUS_PUSH_RETRY_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, ThisError)]
pub enum LifecycleError {
    #[error(transparent)]
    Agent(#[from] Error),

    #[error(transparent)]
    Logging(#[from] crate::logging::LoggingError),

    #[error("failed to install signal handler: {0}")]
    Signal(#[source] std::io::Error),

    #[error("the port-knock watcher needs a raw IP socket, which this platform does not support; pass --metadata-push instead")]
    PortKnockUnsupported,
}

#[cfg(target_os = "linux")]
fn port_knock_watcher(
    metadata_client: Arc<HttpMetadataClient>,
    dispatcher: Arc<Dispatcher>,
) -> Result<Arc<dyn MetadataWatcher>, LifecycleError> {
    let sniffer = Arc::new(agentadapters::RawSocketSniffer::new());
    Ok(Arc::new(PortKnockWatcher::new(sniffer, metadata_client, dispatcher)))
}

#[cfg(not(target_os = "linux"))]
fn port_knock_watcher(
    _metadata_client: Arc<HttpMetadataClient>,
    _dispatcher: Arc<Dispatcher>,
) -> Result<Arc<dyn MetadataWatcher>, LifecycleError> {
    Err(LifecycleError::PortKnockUnsupported)
}

/// Retries `push_status(STATUS_RUNNING, ...)` forever, 5s apart, until the
/// control plane accepts it (spec §4.11 step 6).
async fn report_running<M: MetadataClient>(metadata_client: &M, ssh_port: u16) {
    loop {
        match metadata_client.push_status(STATUS_RUNNING, ssh_port).await {
            Ok(()) => return,
            Err(err) => {
                warn!(%err, "failed to report running status, retrying");
                tokio::time::sleep(STATUS_PUSH_RETRY_INTERVAL).await;
            }
        }
    }
}

/// Drives the daemon from a loaded `Config` until a shutdown signal arrives.
pub async fn run(config: Config) -> Result<(), LifecycleError> {
    // 2. sshd config + reconciler.
    let sshd_config_adapter = SshdConfigAdapter::start(config.sshd_config_path.clone(), config.sshd_port_override).await?;
    let sshd_config = sshd_config_adapter.current();
    let store: Arc<dyn AuthorizedKeysStore> = if config.helper_mode {
        let helper_exe = std::env::current_exe().map_err(|e| LifecycleError::Agent(Error::WriteAuthorizedKeysFileFailed(e.to_string())))?;
        Arc::new(HelperAuthorizedKeysStore::new(helper_exe, sshd_config.authorized_keys_pattern.clone()))
    } else {
        Arc::new(FsAuthorizedKeysStore::new(sshd_config.authorized_keys_pattern.clone()))
    };
    let reconciler = Arc::new(Reconciler::new(store));

    let metadata_url = format!("{}/v1.json", config.metadata_base_url);
    let status_url = format!("{}/v1.json", config.metadata_base_url);
    let completion_url = format!("{}/completed", config.metadata_base_url);
    let metadata_client = Arc::new(HttpMetadataClient::new(metadata_url, status_url, completion_url));

    let emitter = Arc::new(HttpLogEmitter::new(
        format!("{}/logs", config.metadata_base_url),
        format!("{}/logs/error", config.metadata_base_url),
        format!("{}/logs/flush", config.metadata_base_url),
    ));
    let file_source = Arc::new(TokioFileSource::new());
    let investigations = InvestigationState::new();
    let exporter = Arc::new(Exporter::new(investigations.clone(), file_source, emitter, metadata_client.clone()));

    // 3. register actioners.
    let ssh_keys_actioner = Arc::new(SshKeysActioner::new(reconciler.clone(), config.default_os_user.clone(), Arc::new(SystemClock)));
    let reserved_ipv6_actioner = Arc::new(ReservedIpv6Actioner);
    let troubleshooting_actioner = Arc::new(TroubleshootingActioner::new(exporter));

    let actioners: Vec<Arc<dyn Actioner>> = vec![ssh_keys_actioner.clone(), reserved_ipv6_actioner, troubleshooting_actioner];
    let dispatcher = Arc::new(Dispatcher::new(actioners));

    let watcher: Arc<dyn MetadataWatcher> = if config.metadata_push {
        let (watcher, bound) = HttpPushWatcher::bind(config.metadata_push_addr, metadata_client.clone(), dispatcher.clone()).await?;
        info!(addr = %bound, "metadata push listener bound");
        Arc::new(watcher)
    } else {
        port_knock_watcher(metadata_client.clone(), dispatcher.clone())?
    };

    // 4. background expiry sweep, independent of metadata change events.
    let sweep_actioner = ssh_keys_actioner.clone();
    let sweep_reconciler = reconciler.clone();
    let sweep_interval = config.expiry_sweep_interval;
    let sweep_cancel = investigations.cancellation_token();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_interval);
        loop {
            tokio::select! {
                _ = sweep_cancel.cancelled() => return,
                _ = ticker.tick() => {
                    let now = chrono::Utc::now();
                    let cache = sweep_actioner.cached_keys();
                    let swept = sweep_reconciler.remove_expired_keys(&cache, now).await;
                    sweep_actioner.replace_cache(swept);
                }
            }
        }
    });

    // 5. signal handlers.
    let mut sigterm = signal(SignalKind::terminate()).map_err(LifecycleError::Signal)?;
    let mut sigint = signal(SignalKind::interrupt()).map_err(LifecycleError::Signal)?;
    let mut sigquit = signal(SignalKind::quit()).map_err(LifecycleError::Signal)?;
    let mut sigtstp = signal(SignalKind::from_raw(libc::SIGTSTP)).map_err(LifecycleError::Signal)?;

    // 6. report running, blocking startup on it (infinite retry).
    report_running(metadata_client.as_ref(), sshd_config.sshd_port).await;
    info!("droplet agent running");

    // 7. run the watcher until a graceful or fast-exit signal arrives.
    let run_watcher = watcher.clone();
    let run_handle = tokio::spawn(async move { run_watcher.run().await });

    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
        _ = sigint.recv() => info!("received SIGINT, shutting down"),
        _ = sigquit.recv() => warn!("received SIGQUIT, exiting without waiting for in-flight work"),
        _ = sigtstp.recv() => warn!("received SIGTSTP, exiting without waiting for in-flight work"),
    }

    // Shutdown step 1: best-effort single-attempt `stopped` push.
    if let Err(err) = metadata_client.push_status(STATUS_STOPPED, sshd_config.sshd_port).await {
        warn!(%err, "failed to report stopped status");
    }

    // Shutdown step 2: cancel background jobs (the expiry sweep, any
    // in-flight investigation's shared context).
    investigations.shutdown(config.shutdown_timeout).await;

    // Shutdown step 3: watcher shutdown, cascading into the dispatcher's
    // drain and every actioner's own cleanup.
    watcher.shutdown(config.shutdown_timeout).await;

    if let Ok(Err(err)) = run_handle.await {
        warn!(%err, "watcher run loop exited with an error");
    }

    Ok(())
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
