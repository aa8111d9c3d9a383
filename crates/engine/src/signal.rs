// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-wide shutdown signal handler.
//!
//! Signal wiring is a property of the process, not of a run, so the handler
//! lives outside the execution context: the first caller installs it, every
//! later caller gets a handle onto the same broadcast channel. Each received
//! interrupt or termination signal posts one event.

use std::sync::OnceLock;
use tokio::sync::broadcast;

static SHUTDOWN: OnceLock<broadcast::Sender<()>> = OnceLock::new();

/// Install the signal handler (once) and return the shared shutdown sender.
///
/// Must be called from within a tokio runtime. Installation is idempotent:
/// repeated calls return handles onto the same channel.
pub fn install() -> broadcast::Sender<()> {
    SHUTDOWN
        .get_or_init(|| {
            let (tx, _) = broadcast::channel(16);
            tokio::spawn(listen(tx.clone()));
            tx
        })
        .clone()
}

#[cfg(unix)]
async fn listen(tx: broadcast::Sender<()>) {
    use tokio::signal::unix::{signal, SignalKind};
    let mut interrupt = match signal(SignalKind::interrupt()) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "failed to install SIGINT handler");
            return;
        }
    };
    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "failed to install SIGTERM handler");
            return;
        }
    };
    loop {
        tokio::select! {
            _ = interrupt.recv() => {}
            _ = terminate.recv() => {}
        }
        tracing::warn!("shutdown signal received");
        // Errors only mean no receiver is currently subscribed.
        let _ = tx.send(());
    }
}

#[cfg(not(unix))]
async fn listen(tx: broadcast::Sender<()>) {
    loop {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        tracing::warn!("shutdown signal received");
        let _ = tx.send(());
    }
}
