// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! `tapdiff status <capture-id>`

use serde::Serialize;
use tapdiff_capture::CaptureStatus;

use super::{ctrl_c, CommandError, Project};
use crate::cli::StatusArgs;
use crate::diff::{DiffRecord, DiffStats, InteractionPart, RequestFilter, UndocumentedUrl};
use crate::output::{print_info, print_warning};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub capture_id: String,
    pub stats: DiffStats,
    pub diffs: Vec<DiffRecord>,
    pub undocumented_urls: Vec<UndocumentedUrl>,
}

pub async fn status(project: &Project, args: &StatusArgs) -> Result<(), CommandError> {
    let sessions = project.sessions()?;
    let ledger = sessions.store().open(&args.capture_id)?;
    if ledger.load_status()?.status == CaptureStatus::Started {
        print_warning("capture is still running; press Ctrl-C to report what has arrived so far");
    }

    let patterns: Vec<&String> = project
        .config
        .ignore_requests
        .iter()
        .chain(&args.ignore)
        .collect();
    let diff_id = sessions.start_diff(&args.capture_id, RequestFilter::parse(&patterns)?)?;
    let stats = tokio::select! {
        stats = sessions.wait(&diff_id) => stats?,
        () = ctrl_c() => {
            print_info("interrupted");
            sessions.stats(&diff_id)?
        }
    };

    let report = StatusReport {
        capture_id: args.capture_id.clone(),
        stats,
        diffs: sessions.diffs(&diff_id)?.collect(),
        undocumented_urls: sessions.undocumented_urls(&diff_id)?.collect(),
    };
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_report(&report));
    }
    Ok(())
}

pub fn render_report(report: &StatusReport) -> String {
    let stats = &report.stats;
    let mut out = format!(
        "Capture {}: {} interactions ({} compared, {} ignored, {} unreadable)\n",
        report.capture_id,
        stats.interactions_count,
        stats.processed_count,
        stats.filtered_count,
        stats.skipped_count,
    );

    if report.undocumented_urls.is_empty() && report.diffs.is_empty() {
        out.push_str("\nTraffic matches the specification\n");
        return out;
    }
    if !report.undocumented_urls.is_empty() {
        out.push_str("\nUndocumented URLs:\n");
        for url in &report.undocumented_urls {
            out.push_str(&format!("  {} {} ({})\n", url.method, url.path, url.count));
        }
    }
    if !report.diffs.is_empty() {
        out.push_str("\nDiffs:\n");
        for diff in &report.diffs {
            out.push_str(&format!(
                "  {}  [{}]\n",
                describe(diff),
                diff.interaction_trail().pointer
            ));
        }
    }
    out
}

/// One-line, human-readable form of a diff.
pub fn describe(diff: &DiffRecord) -> String {
    let spec = diff.request_spec_trail();
    let endpoint = format!("{} {}", spec.method, spec.path);
    match (diff, &diff.interaction_trail().part) {
        (DiffRecord::UnmatchedResponseStatus { .. }, InteractionPart::ResponseStatus { status }) => {
            format!("{endpoint}: undocumented response status {status}")
        }
        (
            DiffRecord::UnmatchedRequestContentType { .. },
            InteractionPart::RequestBody { content_type },
        ) => format!(
            "{endpoint}: undocumented request body {}",
            content_type.as_deref().unwrap_or("without content type")
        ),
        (
            DiffRecord::UnmatchedResponseContentType { .. },
            InteractionPart::ResponseBody {
                status,
                content_type,
            },
        ) => format!(
            "{endpoint}: undocumented {status} response body {}",
            content_type.as_deref().unwrap_or("without content type")
        ),
        (diff, _) => format!("{endpoint}: {}", diff.kind()),
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
