use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use tokio::{
    signal::unix::{SignalKind, signal},
    time::MissedTickBehavior,
};
use tokio_util::sync::CancellationToken;

use crate::{
    config::{Config, JarKind},
    consent::ConsentTracker,
    enforcer::{Allowlist, Sweeper},
    hooks::HookRegistry,
    jurisdiction::{HttpJurisdictionProbe, JurisdictionPort, StaticJurisdiction},
    recorder::{ConsentRecorder, HttpConsentRecorder, NoopConsentRecorder},
    store::{CookieJar, FileJar, MemoryJar},
};

fn build_jar(config: &Config) -> Arc<dyn CookieJar> {
    match config.jar.kind {
        JarKind::Memory => Arc::new(MemoryJar::new()),
        JarKind::File => Arc::new(FileJar::new(config.jar.path.clone())),
    }
}

fn build_recorder(config: &Config) -> Result<Arc<dyn ConsentRecorder>> {
    if !config.store_consent {
        return Ok(Arc::new(NoopConsentRecorder));
    }
    let endpoint = config
        .store_consent_endpoint
        .as_deref()
        .context("store_consent is enabled without store_consent_endpoint")?;
    let recorder = HttpConsentRecorder::new(endpoint)
        .map_err(|err| anyhow::anyhow!("failed to build consent recorder: {err}"))?;
    Ok(Arc::new(recorder))
}

fn build_jurisdiction(config: &Config) -> Result<Arc<dyn JurisdictionPort>> {
    if !config.eu_only {
        return Ok(Arc::new(StaticJurisdiction));
    }
    match config.eu_check_endpoint.as_deref() {
        Some(endpoint) => {
            let probe = HttpJurisdictionProbe::new(endpoint)
                .context("failed to build jurisdiction probe")?;
            Ok(Arc::new(probe))
        }
        None => Ok(Arc::new(StaticJurisdiction)),
    }
}

pub async fn run(config: Config) -> Result<()> {
    let config = Arc::new(config);

    if !config.popup_enabled {
        tracing::info!(target: "runtime", "consent_popup_disabled");
        return Ok(());
    }

    let jar = build_jar(&config);
    let recorder = build_recorder(&config)?;
    let jurisdiction = build_jurisdiction(&config)?;
    let hooks = Arc::new(HookRegistry::new());

    let mut tracker = ConsentTracker::initialize(
        Arc::clone(&config),
        Arc::clone(&jar),
        hooks,
        recorder,
    );

    if !tracker.storage_available() {
        tracing::warn!(target: "runtime", "cookie_storage_unavailable");
        return Ok(());
    }

    if config.eu_only && tracker.should_show_banner() && !jurisdiction.in_scope().await {
        let outcome = tracker.auto_agree();
        tracing::info!(target: "runtime", status = ?outcome.status, "out_of_scope_auto_agreed");
    }

    tracing::info!(
        target: "runtime",
        status = ?tracker.status(),
        banner = ?tracker.banner_mode(),
        show_banner = tracker.should_show_banner(),
        version_changed = tracker.version_changed(),
        "consent_initialized"
    );

    let allowlist = Allowlist::from_config(&config)
        .map_err(|err| anyhow::anyhow!("failed to compile cookie allow-list: {err}"))?;
    let sweeper = Sweeper::new(Arc::clone(&jar), allowlist, &config.hostname);

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        let mut sigint =
            signal(SignalKind::interrupt()).context("unable to listen for SIGINT (Ctrl+C)")?;
        let mut sigterm =
            signal(SignalKind::terminate()).context("unable to listen for SIGTERM")?;
        tokio::spawn(async move {
            let signal_name = tokio::select! {
                _ = sigint.recv() => "SIGINT",
                _ = sigterm.recv() => "SIGTERM",
            };
            tracing::info!(target: "runtime", signal = signal_name, "shutdown_requested");
            shutdown.cancel();
        });
    }

    let mut ticker =
        tokio::time::interval(Duration::from_secs(config.sweep_interval_secs.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        if !tracker.enforcement_required() {
            tracing::info!(target: "runtime", "enforcement_satisfied");
            break;
        }
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                let report = sweeper.sweep(tracker.categories());
                if !report.is_empty() {
                    tracing::debug!(
                        target: "runtime",
                        removed = ?report.removed,
                        expired = ?report.expired,
                        "sweep_completed"
                    );
                }
            }
        }
    }

    Ok(())
}
