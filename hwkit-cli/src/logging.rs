// SPDX-License-Identifier: GPL-3.0-only

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::{Duration, SystemTime};

use anyhow::Context;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::Config;

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

const LOG_PREFIX: &str = "hwkit-hardware.log";
const KEEP_FOR: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Install the global subscriber. Stdout carries command output, so the
/// console layer writes to stderr.
pub(crate) fn init(config: &Config) {
    let level = config.log_level.as_directive();
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{level},zbus=warn")));
    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let file = config
        .log_to_disk
        .then(|| log_dir(config))
        .flatten()
        .and_then(|dir| match file_writer(&dir) {
            Ok(writer) => Some(writer),
            Err(e) => {
                eprintln!("hwkit-hardware: file logging disabled: {e:#}");
                None
            }
        });

    let Some((writer, guard)) = file else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
        return;
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false),
        )
        .init();
    let _ = LOG_GUARD.set(guard);
}

/// `log_dir` from the config, else `$XDG_STATE_HOME/hwkit`, else
/// `~/.local/state/hwkit`.
fn log_dir(config: &Config) -> Option<PathBuf> {
    if let Some(dir) = &config.log_dir {
        return Some(dir.clone());
    }
    std::env::var_os("XDG_STATE_HOME")
        .map(PathBuf::from)
        .filter(|p| p.is_absolute())
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".local/state")))
        .map(|base| base.join("hwkit"))
}

fn file_writer(dir: &Path) -> anyhow::Result<(NonBlocking, WorkerGuard)> {
    fs::create_dir_all(dir).with_context(|| format!("cannot create {}", dir.display()))?;
    remove_stale_logs(dir, SystemTime::now());
    Ok(tracing_appender::non_blocking(
        tracing_appender::rolling::daily(dir, LOG_PREFIX),
    ))
}

/// Daily files are named `<prefix>.<date>`; anything else in the directory
/// is left alone.
fn is_stale(file_name: &str, modified: SystemTime, now: SystemTime) -> bool {
    file_name.starts_with(LOG_PREFIX)
        && now
            .duration_since(modified)
            .is_ok_and(|age| age > KEEP_FOR)
}

fn remove_stale_logs(dir: &Path, now: SystemTime) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let Ok(metadata) = entry.metadata() else {
            continue;
        };
        let Ok(modified) = metadata.modified() else {
            continue;
        };
        if metadata.is_file() && is_stale(&entry.file_name().to_string_lossy(), modified, now) {
            let _ = fs::remove_file(entry.path());
        }
    }
}
