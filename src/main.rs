#![allow(clippy::print_stderr, clippy::print_stdout)]

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use std::io::Write;
use std::time::Duration;
use tracing::{info, warn};
use zklock::error::StoreError;
use zklock::lock::{self, LockConfig, LockOutcome};
use zklock::zk::ZkStore;

#[derive(Parser)]
#[command(
    name = "zklock",
    version,
    about = "ZooKeeper try-lock for exclusive cron jobs"
)]
struct Cli {
    /// Comma-separated host:port list for the ZooKeeper ensemble.
    #[arg(env = "ZKLOCK_HOSTS")]
    hosts: String,

    /// Lock directory under which candidates register, e.g. /locks/nightly.
    path: String,

    /// Retry budget for each bounded loop.
    #[arg(long, default_value_t = 5)]
    max_retries: u32,

    /// Fixed delay between retries, in milliseconds.
    #[arg(long, default_value_t = 500)]
    retry_delay_ms: u64,

    /// Session timeout negotiated with the ensemble, in milliseconds.
    #[arg(long, default_value_t = 30_000)]
    session_timeout_ms: u64,

    /// How long to hold the lock before releasing it, in milliseconds.
    #[arg(long, default_value_t = 10_000)]
    hold_ms: u64,

    /// Emit the outcome as JSON on stdout.
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Serialize)]
struct Report {
    outcome: &'static str,
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    candidate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    blocked_by: Option<String>,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:?}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing()?;

    let cfg = LockConfig {
        max_retries: cli.max_retries,
        retry_delay: Duration::from_millis(cli.retry_delay_ms),
    };

    let store = ZkStore::connect(&cli.hosts, Duration::from_millis(cli.session_timeout_ms))
        .with_context(|| format!("connect to {}", cli.hosts))?;

    // One exit: the session is closed even when the run fails.
    let result = match lock::try_lock(&store, &cli.path, cfg) {
        Ok(outcome) => report_outcome(&cli, outcome),
        Err(err) => Err(err.into()),
    };
    finish(result, store.close())
}

/// Logs a failed close and keeps the run's own result; expiry releases
/// the candidate eventually if the close did not get through.
fn finish(result: anyhow::Result<()>, close: Result<(), StoreError>) -> anyhow::Result<()> {
    if let Err(err) = close {
        warn!(error = %err, "close failed; release falls back to session expiry");
    }
    result
}

fn report_outcome(cli: &Cli, outcome: LockOutcome) -> anyhow::Result<()> {
    match outcome {
        LockOutcome::Acquired { candidate } => {
            write_report(
                cli.json,
                &Report {
                    outcome: "acquired",
                    path: cli.path.clone(),
                    candidate: Some(candidate),
                    blocked_by: None,
                },
                "lock acquired, proceeding",
            )?;
            // The lock exists only while the session does; hold it long
            // enough for the other scheduled instances to see Blocked.
            if cli.hold_ms > 0 {
                info!(hold_ms = cli.hold_ms, "holding lock");
                std::thread::sleep(Duration::from_millis(cli.hold_ms));
            }
        }
        LockOutcome::Blocked { holder } => {
            let human = format!("blocked by {holder}");
            write_report(
                cli.json,
                &Report {
                    outcome: "blocked",
                    path: cli.path.clone(),
                    candidate: None,
                    blocked_by: Some(holder),
                },
                &human,
            )?;
        }
    }
    Ok(())
}

fn init_tracing() -> anyhow::Result<()> {
    tracing_log::LogTracer::init().context("install log bridge")?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn write_report(json: bool, report: &Report, human: &str) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout();
    if json {
        let raw = serde_json::to_string_pretty(report).context("serialize JSON")?;
        stdout.write_all(raw.as_bytes()).context("write stdout")?;
    } else {
        stdout.write_all(human.as_bytes()).context("write stdout")?;
    }
    stdout.write_all(b"\n").context("write stdout newline")?;
    // Flushed eagerly: with --hold-ms the process lingers after reporting.
    stdout.flush().context("flush stdout")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn report_omits_absent_fields() -> anyhow::Result<()> {
        let report = Report {
            outcome: "blocked",
            path: "/locks/job".to_string(),
            candidate: None,
            blocked_by: Some("/locks/job/x-000000000000000a-0000000000".to_string()),
        };
        let value: Value = serde_json::to_value(&report)?;
        assert_eq!(value.get("outcome").and_then(Value::as_str), Some("blocked"));
        assert_eq!(
            value.get("blocked_by").and_then(Value::as_str),
            Some("/locks/job/x-000000000000000a-0000000000")
        );
        assert!(value.get("candidate").is_none());
        Ok(())
    }

    #[test]
    fn a_close_failure_never_masks_the_run_result() {
        assert!(finish(Ok(()), Err(StoreError::Transient)).is_ok());
        let failed = finish(Err(anyhow::anyhow!("no quorum")), Ok(()));
        assert!(failed.is_err());
    }

    #[test]
    fn both_outcomes_report_without_holding() -> anyhow::Result<()> {
        let cli = Cli {
            hosts: "127.0.0.1:2181".to_string(),
            path: "/locks/nightly".to_string(),
            max_retries: 5,
            retry_delay_ms: 500,
            session_timeout_ms: 30_000,
            hold_ms: 0,
            json: true,
        };
        report_outcome(
            &cli,
            LockOutcome::Acquired {
                candidate: "x-000000000000000a-0000000000".to_string(),
            },
        )?;
        report_outcome(
            &cli,
            LockOutcome::Blocked {
                holder: "/locks/nightly/x-000000000000000a-0000000000".to_string(),
            },
        )?;
        Ok(())
    }
}
