// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! `tapdiff run <task>`

use std::sync::Arc;
use tapdiff_capture::{CaptureLedger, CaptureSummary};
use tokio::sync::oneshot;

use super::{ctrl_c, CommandError, Project};
use crate::cli::RunArgs;
use crate::config::TaskConfig;
use crate::diff::{DiffStats, RequestFilter};
use crate::output::{print_info, print_warning};
use crate::proxy::{CommandSpec, Orchestrator, ProxyConfig, ProxyError, RunReport};
use crate::server::{self, AppState};

pub async fn run(project: &Project, args: &RunArgs) -> Result<i32, CommandError> {
    let task = project.config.task(&args.task)?.clone();

    // Bind before anything is written so a busy port leaves no capture behind.
    let mut orchestrator = Orchestrator::new(proxy_config(&task, args.port)?);
    let addr = orchestrator.bind().await?;

    let capture_id = uuid::Uuid::new_v4().to_string();
    let ledger = {
        let store = project.store.clone();
        let capture_id = capture_id.clone();
        let metadata = task.to_metadata(&args.task);
        Arc::new(tokio::task::spawn_blocking(move || store.init(&capture_id, Some(metadata))).await??)
    };
    print_info(format_args!("Capturing to {capture_id}"));
    print_info(format_args!("Proxy listening on http://{addr}"));

    let sessions = project.sessions()?;
    let control = match args.serve {
        Some(port) => Some(start_control_server(project, &sessions, port).await?),
        None => None,
    };

    let command = task
        .command
        .clone()
        .map(|c| CommandSpec::new(c).with_cwd(&project.config.root));
    if command.is_none() {
        print_info("No command configured, press Ctrl-C to stop");
    }
    let outcome = orchestrator.run(ledger.clone(), command, ctrl_c()).await;

    // Finalize regardless of how the command ended.
    finalize(&ledger).await?;
    let report = outcome?;
    if report.sink_failures > 0 {
        print_warning(format_args!(
            "{} interactions could not be saved",
            report.sink_failures
        ));
    }

    let stats = if args.collect_diffs() {
        let filter = RequestFilter::parse(&project.config.ignore_requests)?;
        let diff_id = sessions.start_diff(&capture_id, filter)?;
        let stats = sessions.wait(&diff_id).await?;
        let found = found_diffs(&stats);
        let ledger = Arc::clone(&ledger);
        tokio::task::spawn_blocking(move || ledger.add_diffs(found)).await??;
        Some(stats)
    } else {
        None
    };

    let summary = {
        let ledger = Arc::clone(&ledger);
        tokio::task::spawn_blocking(move || ledger.load_summary()).await??
    };
    print!("{}", render_summary(&capture_id, &report, &summary, stats.as_ref()));

    if let Some((stop, handle)) = control {
        let _ = stop.send(());
        match handle.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => print_warning(format_args!("control server failed: {e}")),
            Err(e) => print_warning(format_args!("control server failed: {e}")),
        }
    }

    Ok(exit_code(args, &summary, report.exit_code))
}

fn proxy_config(task: &TaskConfig, port: Option<u16>) -> Result<ProxyConfig, CommandError> {
    let mut config = ProxyConfig::new(task.proxy.host.clone(), port.unwrap_or(task.proxy.port));
    if let Some(target) = &task.target {
        let url = reqwest::Url::parse(target)
            .map_err(|e| ProxyError::InvalidUrl(format!("{target}: {e}")))?;
        config = config.with_target(url);
    }
    Ok(config)
}

async fn finalize(ledger: &Arc<CaptureLedger>) -> Result<(), CommandError> {
    let ledger = Arc::clone(ledger);
    tokio::task::spawn_blocking(move || ledger.finalize()).await??;
    Ok(())
}

type ControlServer = (
    oneshot::Sender<()>,
    tokio::task::JoinHandle<std::io::Result<()>>,
);

async fn start_control_server(
    project: &Project,
    sessions: &Arc<crate::diff::DiffSessions>,
    port: u16,
) -> Result<ControlServer, CommandError> {
    let address = format!("127.0.0.1:{port}");
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .map_err(|source| CommandError::Bind {
            address: address.clone(),
            source,
        })?;
    print_info(format_args!("Control API on http://{address}"));

    let state = AppState::new(Arc::clone(sessions))
        .with_ignore_requests(project.config.ignore_requests.clone());
    let (stop, stopped) = oneshot::channel::<()>();
    let handle = tokio::spawn(server::serve(listener, state, async {
        let _ = stopped.await;
    }));
    Ok((stop, handle))
}

/// Diffs plus undocumented endpoints: both count against the API description.
pub fn found_diffs(stats: &DiffStats) -> u64 {
    stats.diffs_count + stats.undocumented_urls_count
}

/// `--exit-on-diff` wins over `--pass-exit-code`; otherwise exit 0.
pub fn exit_code(args: &RunArgs, summary: &CaptureSummary, command_code: Option<i32>) -> i32 {
    if args.exit_on_diff() && summary.diffs_count > 0 {
        return 1;
    }
    if args.pass_exit_code() {
        return command_code.unwrap_or(0);
    }
    0
}

pub fn render_summary(
    capture_id: &str,
    report: &RunReport,
    summary: &CaptureSummary,
    stats: Option<&DiffStats>,
) -> String {
    let mut out = format!(
        "Captured {} {} in {capture_id}\n",
        summary.interactions_count,
        plural(summary.interactions_count, "interaction", "interactions"),
    );
    if let Some(code) = report.exit_code {
        out.push_str(&format!("Command exited with code {code}\n"));
    }
    if let Some(stats) = stats {
        if found_diffs(stats) == 0 {
            out.push_str("No diffs found\n");
        } else {
            out.push_str(&format!(
                "Found {} {} and {} undocumented {}\n",
                stats.diffs_count,
                plural(stats.diffs_count, "diff", "diffs"),
                stats.undocumented_urls_count,
                plural(stats.undocumented_urls_count, "URL", "URLs"),
            ));
            out.push_str(&format!("Run `tapdiff status {capture_id}` for details\n"));
        }
    }
    out
}

fn plural<'a>(n: u64, one: &'a str, many: &'a str) -> &'a str {
    if n == 1 {
        one
    } else {
        many
    }
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
