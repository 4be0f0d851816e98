//! Audit command - run one audit session from a scanner feed on stdin
//!
//! Each input line is a scanned code. Lines starting with `:` are
//! directives:
//!
//! - `:status`   live found/missing/intruder counts
//! - `:log`      the session's scan log
//! - `:finish`   build and save the report
//! - `:abandon`  discard the session; asks again first, `:abandon!` skips
//!   the question
//!
//! Lines that are not valid UTF-8 are scanner noise and skipped. Confirmed
//! scans stamp "last audited" in the background; the stamps are drained
//! before the command exits.
//!
//! With `--json` every output is one `{"ok": true, "kind": ..., "data": ...}`
//! line.

use anyhow::Result;
use comfy_table::Color;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use stocktake_audit::{
    perform_effects, AuditError, AuditService, EffectSummary, IgnoreReason, ReconciliationReport,
    ReportId, ScanClassification, ScanEvent, ScanOutcome, SessionId,
};
use stocktake_db::StocktakeDb;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::cli::context::CliContext;
use crate::cli::error::HelpfulError;
use crate::cli::output::{
    classification_color, format_timestamp, print_json_line, print_table_colored, progress_bar,
};
use crate::cli::reports::print_report;

type Service = AuditService<StocktakeDb, StocktakeDb>;

#[derive(Debug)]
pub struct AuditArgs {
    pub location: String,
    pub inventory: Option<PathBuf>,
    pub camera: bool,
    pub allow_empty: bool,
    pub finish_on_eof: bool,
    pub json: bool,
}

/// One line of operator input.
#[derive(Debug, PartialEq, Eq)]
pub enum Input<'a> {
    Code(&'a str),
    Status,
    Log,
    Finish,
    Abandon,
    AbandonConfirmed,
    UnknownDirective(&'a str),
}

pub fn parse_input(line: &str) -> Input<'_> {
    let trimmed = line.trim();
    let Some(directive) = trimmed.strip_prefix(':') else {
        return Input::Code(line);
    };
    match directive.trim().to_ascii_lowercase().as_str() {
        "status" => Input::Status,
        "log" => Input::Log,
        "finish" => Input::Finish,
        "abandon" => Input::Abandon,
        "abandon!" => Input::AbandonConfirmed,
        _ => Input::UnknownDirective(trimmed),
    }
}

/// Strip the line terminator. `None` when the bytes are not UTF-8.
pub fn decode_line(bytes: &[u8]) -> Option<&str> {
    let bytes = bytes.strip_suffix(b"\n").unwrap_or(bytes);
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    std::str::from_utf8(bytes).ok()
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ScanOutput<'a> {
    event: &'a ScanEvent,
    progress_percent: u8,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IgnoredOutput {
    code: String,
    reason: IgnoreReason,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AbandonPendingOutput<'a> {
    location: &'a str,
    scans_at_risk: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FinishedOutput<'a> {
    report_id: &'a ReportId,
    report: &'a ReconciliationReport,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AbandonedOutput<'a> {
    session_id: &'a SessionId,
    location: &'a str,
    discarded_events: usize,
}

pub async fn run(ctx: &CliContext, args: AuditArgs) -> Result<()> {
    let db = ctx.open_db_synced(args.inventory.as_deref()).await?;
    let mut service = AuditService::with_options(db.clone(), db, ctx.config.audit_options());

    let id = match service.start_session(&args.location, args.allow_empty).await {
        Ok(id) => id,
        Err(AuditError::EmptyLocation(location)) => {
            return Err(HelpfulError::empty_location(&location).into());
        }
        Err(err) => return Err(err.into()),
    };

    if !args.json {
        let session = service.session(&id)?;
        println!(
            "Auditing '{}': {} asset(s) expected.",
            session.location(),
            session.expected().len()
        );
        println!("Scan one code per line. Directives: :status :log :finish :abandon");
    }

    let provider = service.provider();
    let mut stamps: JoinSet<EffectSummary> = JoinSet::new();
    let mut reader = BufReader::new(tokio::io::stdin());
    let mut buf = Vec::new();
    let mut abandon_requested = false;

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(err) => {
                warn!(session_id = %id, error = %err, "Scanner input failed; treating as end of input");
                break;
            }
        }
        let Some(line) = decode_line(&buf) else {
            warn!(session_id = %id, bytes = buf.len(), "Skipped scanner line that is not UTF-8");
            if !args.json {
                eprintln!("Skipped unreadable scanner input.");
            }
            continue;
        };

        let input = parse_input(line);
        if !matches!(input, Input::Abandon) {
            abandon_requested = false;
        }

        match input {
            Input::Code(raw) => {
                let outcome = if args.camera {
                    service.record_frame(&id, raw, Instant::now())?
                } else {
                    service.record_scan(&id, raw)?
                };
                if !outcome.effects().is_empty() {
                    let provider = Arc::clone(&provider);
                    let effects = outcome.effects().to_vec();
                    stamps.spawn(async move { perform_effects(provider.as_ref(), &effects).await });
                }
                print_outcome(&service, &id, raw, &outcome, args.json)?;
            }
            Input::Status => print_status(&service, &id, args.json)?,
            Input::Log => print_log(&service, &id, args.json)?,
            Input::Finish => {
                drain_stamps(&mut stamps).await;
                match finish(&mut service, &id, args.json).await {
                    Ok(()) => return Ok(()),
                    Err(AuditError::Persist(err)) => {
                        eprintln!("ERROR: Report was not saved: {:#}", err);
                        eprintln!("  The session is still open. TRY: :finish again, or :abandon");
                    }
                    Err(err) => return Err(err.into()),
                }
            }
            Input::Abandon if !abandon_requested => {
                abandon_requested = true;
                confirm_abandon(&service, &id, args.json)?;
            }
            Input::Abandon | Input::AbandonConfirmed => {
                drain_stamps(&mut stamps).await;
                return abandon(&mut service, &id, args.json);
            }
            Input::UnknownDirective(directive) => {
                eprintln!(
                    "Unknown directive '{}'. Use :status, :log, :finish or :abandon",
                    directive
                );
            }
        }
    }

    drain_stamps(&mut stamps).await;
    if args.finish_on_eof {
        finish(&mut service, &id, args.json).await?;
        return Ok(());
    }

    warn!(session_id = %id, "Scanner input ended without :finish");
    eprintln!("Input ended before :finish; the session was abandoned and nothing was saved.");
    eprintln!("  TRY: end the feed with :finish, or pass --finish-on-eof");
    abandon(&mut service, &id, args.json)
}

fn confirm_abandon(service: &Service, id: &SessionId, json: bool) -> Result<()> {
    let session = service.session(id)?;
    let scans_at_risk = session.events().len();
    eprintln!(
        "Abandoning discards {} scan(s) for '{}' and saves no report.",
        scans_at_risk,
        session.location()
    );
    eprintln!("  Enter :abandon again (or :abandon!) to confirm; anything else keeps auditing.");
    if json {
        print_json_line(
            "abandon_pending",
            &AbandonPendingOutput {
                location: session.location(),
                scans_at_risk,
            },
        )?;
    }
    Ok(())
}

async fn finish(service: &mut Service, id: &SessionId, json: bool) -> Result<(), AuditError> {
    let finished = service.finish_session(id).await?;
    if json {
        let output = FinishedOutput {
            report_id: &finished.report_id,
            report: &finished.report,
        };
        if let Err(err) = print_json_line("report", &output) {
            warn!(error = %err, "Failed to render report as JSON");
        }
    } else {
        println!();
        print_report(&finished.report_id, &finished.report);
    }
    Ok(())
}

fn abandon(service: &mut Service, id: &SessionId, json: bool) -> Result<()> {
    let (location, discarded_events) = {
        let session = service.session(id)?;
        (session.location().to_string(), session.events().len())
    };
    service.abandon_session(id)?;
    if json {
        print_json_line(
            "abandoned",
            &AbandonedOutput {
                session_id: id,
                location: &location,
                discarded_events,
            },
        )?;
    } else {
        println!(
            "Audit of '{}' abandoned; {} scan(s) discarded.",
            location, discarded_events
        );
    }
    Ok(())
}

async fn drain_stamps(stamps: &mut JoinSet<EffectSummary>) {
    let mut total = EffectSummary::default();
    while let Some(joined) = stamps.join_next().await {
        match joined {
            Ok(summary) => {
                total.applied += summary.applied;
                total.failed += summary.failed;
            }
            Err(err) => warn!(error = %err, "Audit stamp task did not complete"),
        }
    }
    if total != EffectSummary::default() {
        info!(
            applied = total.applied,
            failed = total.failed,
            "Last-audited stamps written"
        );
    }
}

fn print_outcome(
    service: &Service,
    id: &SessionId,
    raw: &str,
    outcome: &ScanOutcome,
    json: bool,
) -> Result<()> {
    match outcome {
        ScanOutcome::Recorded { event, .. } => {
            let progress_percent = service.projection(id)?.progress_percent;
            if json {
                return print_json_line(
                    "scan",
                    &ScanOutput {
                        event,
                        progress_percent,
                    },
                );
            }
            let label = format!("{:<10}", event.classification.as_str().to_uppercase());
            let detail = match (event.classification, &event.recorded_location) {
                (ScanClassification::Intruder, Some(location)) => {
                    format!("{}  recorded at {}", event.code, location)
                }
                _ => event.code.clone(),
            };
            println!("{} {:<32} {}", label, detail, progress_bar(progress_percent, 20));
        }
        ScanOutcome::Ignored(reason @ IgnoreReason::PromotionalElsewhere) => {
            let code = raw.trim().to_uppercase();
            if json {
                return print_json_line(
                    "ignored",
                    &IgnoredOutput {
                        code,
                        reason: *reason,
                    },
                );
            }
            println!(
                "{:<10} {}  promotional stock, not audited here",
                "IGNORED", code
            );
        }
        ScanOutcome::Ignored(IgnoreReason::Blank | IgnoreReason::Debounced) => {}
    }
    Ok(())
}

fn print_status(service: &Service, id: &SessionId, json: bool) -> Result<()> {
    let projection = service.projection(id)?;
    if json {
        return print_json_line("status", &projection);
    }
    println!(
        "{}  found {} of {}, {} missing, {} intruder(s)",
        progress_bar(projection.progress_percent, 20),
        projection.found_tags.len(),
        projection.expected_count(),
        projection.missing_tags.len(),
        projection.intruder_tags.len()
    );
    if !projection.missing_tags.is_empty() {
        println!("  missing: {}", projection.missing_tags.join(", "));
    }
    if !projection.intruder_tags.is_empty() {
        let intruders: Vec<String> = projection
            .intruder_tags
            .iter()
            .map(|i| format!("{} ({})", i.tag, i.location))
            .collect();
        println!("  intruders: {}", intruders.join(", "));
    }
    Ok(())
}

fn print_log(service: &Service, id: &SessionId, json: bool) -> Result<()> {
    let events = service.event_log(id)?;
    if json {
        return print_json_line("log", &events);
    }
    if events.is_empty() {
        println!("No scans recorded yet.");
        return Ok(());
    }
    let rows = events
        .iter()
        .map(|event| {
            vec![
                (format_timestamp(event.timestamp), None),
                (event.code.clone(), None),
                (
                    event.classification.as_str().to_string(),
                    Some(classification_color(event.classification)),
                ),
                (
                    event.recorded_location.clone().unwrap_or_default(),
                    Some(Color::DarkGrey),
                ),
            ]
        })
        .collect();
    print_table_colored(&["TIME", "CODE", "RESULT", "RECORDED AT"], rows);
    Ok(())
}
