//! Locations command - list auditable locations with expected counts

use anyhow::Result;
use comfy_table::Color;
use std::path::PathBuf;
use stocktake_audit::AuditService;

use crate::cli::context::CliContext;
use crate::cli::output::{print_json, print_table_colored};

#[derive(Debug)]
pub struct LocationsArgs {
    pub inventory: Option<PathBuf>,
    pub json: bool,
}

pub async fn run(ctx: &CliContext, args: LocationsArgs) -> Result<()> {
    let db = ctx.open_db_synced(args.inventory.as_deref()).await?;
    let service = AuditService::with_options(db.clone(), db, ctx.config.audit_options());
    let summaries = service.location_summaries().await?;

    if args.json {
        return print_json(&summaries);
    }

    if summaries.is_empty() {
        println!("No assets in the local inventory.");
        println!();
        println!("  TRY: stocktake locations --inventory <snapshot.json>");
        return Ok(());
    }

    let rows = summaries
        .iter()
        .map(|s| {
            let expected_color = if s.is_empty() {
                Some(Color::DarkGrey)
            } else {
                None
            };
            vec![
                (s.location.clone(), None),
                (s.auditable_count.to_string(), expected_color),
                (s.excluded_count.to_string(), Some(Color::DarkGrey)),
            ]
        })
        .collect();
    print_table_colored(&["LOCATION", "EXPECTED", "EXCLUDED"], rows);
    Ok(())
}
