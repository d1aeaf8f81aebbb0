//! Report command handler.

use color_eyre::Result;

use crate::context::Context;
use crate::models::ReportRow;

use super::App;

/// Prints report rows as `<type>: <STATUS> = <count>`.
pub(super) fn print_report(rows: &[ReportRow]) {
    println!("\nMigration Summary:");
    println!("{}", "-".repeat(40));
    if rows.is_empty() {
        println!("No migrations recorded");
    }
    for row in rows {
        println!("{}: {} = {}", row.component_type, row.status, row.count);
    }
}

impl App {
    pub async fn run_report(&self) -> Result<()> {
        let config = self.load_config()?;
        let ctx = Context::from(config)?;
        let rows = ctx.orchestrator().report().await?;
        print_report(&rows);
        Ok(())
    }
}
