//! Reports command - browse finished reconciliation reports

use anyhow::Result;
use clap::Subcommand;
use comfy_table::Color;
use stocktake_audit::{ReconciliationReport, ReportId};

use crate::cli::context::CliContext;
use crate::cli::error::HelpfulError;
use crate::cli::output::{
    format_timestamp, print_json, print_table, print_table_colored, report_status_color,
};

#[derive(Subcommand, Debug)]
pub enum ReportsAction {
    /// List finished audits, newest first
    List {
        /// Only reports for this location
        #[arg(short, long)]
        location: Option<String>,

        /// Maximum number of reports
        #[arg(short = 'n', long, default_value = "20")]
        limit: i64,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one report with its missing and intruder lists
    Show {
        /// Report id
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl ReportsAction {
    pub fn json(&self) -> bool {
        match self {
            ReportsAction::List { json, .. } | ReportsAction::Show { json, .. } => *json,
        }
    }
}

pub async fn run(ctx: &CliContext, action: ReportsAction) -> Result<()> {
    let db = ctx.open_db().await?;
    match action {
        ReportsAction::List {
            location,
            limit,
            json,
        } => {
            let location = location.as_deref().map(str::trim);
            let reports = db.reports_list(location, limit).await?;
            if json {
                return print_json(&reports);
            }
            if reports.is_empty() {
                println!("No reports yet.");
                return Ok(());
            }
            let rows = reports
                .iter()
                .map(|stored| {
                    let report = &stored.report;
                    vec![
                        (stored.id.to_string(), None),
                        (report.location.clone(), None),
                        (format_timestamp(report.timestamp), None),
                        (
                            format!("{}/{}", report.found_count, report.expected_count),
                            None,
                        ),
                        (report.intruder_tags.len().to_string(), None),
                        (
                            report.status.to_string(),
                            Some(report_status_color(report.status)),
                        ),
                    ]
                })
                .collect();
            print_table_colored(
                &["ID", "LOCATION", "FINISHED", "FOUND", "INTRUDERS", "STATUS"],
                rows,
            );
            Ok(())
        }
        ReportsAction::Show { id, json } => {
            let report_id =
                ReportId::parse(&id).map_err(|_| HelpfulError::report_not_found(&id))?;
            let stored = db
                .reports_get(&report_id)
                .await?
                .ok_or_else(|| HelpfulError::report_not_found(&id))?;
            if json {
                return print_json(&stored);
            }
            print_report(&stored.id, &stored.report);
            Ok(())
        }
    }
}

/// Human-readable rendering of a report.
pub fn print_report(id: &ReportId, report: &ReconciliationReport) {
    let status_color = report_status_color(report.status);
    print_table_colored(
        &["REPORT", "VALUE"],
        vec![
            vec![("Id".to_string(), None), (id.to_string(), None)],
            vec![
                ("Location".to_string(), None),
                (report.location.clone(), None),
            ],
            vec![
                ("Started".to_string(), None),
                (format_timestamp(report.started_at), None),
            ],
            vec![
                ("Finished".to_string(), None),
                (format_timestamp(report.timestamp), None),
            ],
            vec![
                ("Found".to_string(), None),
                (
                    format!("{} of {}", report.found_count, report.expected_count),
                    None,
                ),
            ],
            vec![
                ("Scans".to_string(), None),
                (report.scan_count.to_string(), None),
            ],
            vec![
                ("Status".to_string(), None),
                (report.status.to_string(), Some(status_color)),
            ],
        ],
    );

    if !report.missing_tags.is_empty() {
        println!();
        println!("Missing ({}):", report.missing_tags.len());
        let rows = report
            .missing_tags
            .iter()
            .map(|tag| vec![(tag.clone(), Some(Color::Red))])
            .collect();
        print_table_colored(&["TAG"], rows);
    }

    if !report.intruder_tags.is_empty() {
        println!();
        println!("Intruders ({}):", report.intruder_tags.len());
        let rows = report
            .intruder_tags
            .iter()
            .map(|intruder| vec![intruder.tag.clone(), intruder.location.clone()])
            .collect();
        print_table(&["TAG", "RECORDED AT"], rows);
    }
}
