//! `rssync sync`: create the catalog layout a descriptor declares.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use rssync_client::SoapCatalogClient;
use rssync_engine::{sync_descriptor, CatalogCall, DryRunClient, SyncReport};

use super::ConnectionArgs;

/// Arguments for `rssync sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Descriptor XML file.
    pub descriptor: PathBuf,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Walk the descriptor and print the calls a real run would issue.
    #[arg(long)]
    pub dry_run: bool,

    /// Emit the run report as JSON on stdout.
    #[arg(long)]
    pub json: bool,
}

impl SyncArgs {
    pub fn run(self) -> Result<()> {
        let config = self.connection.resolve(self.descriptor.clone())?;
        let descriptor = config.descriptor.display().to_string();

        let (report, plan) = if self.dry_run {
            let mut client = DryRunClient::new();
            let report = sync_descriptor(&config, &mut client)
                .with_context(|| format!("dry run of {descriptor} failed"))?;
            (report, Some(client.into_calls()))
        } else {
            let client = SoapCatalogClient::from_config(&config)
                .context("cannot connect without an endpoint (use --endpoint or --dry-run)")?;
            tracing::debug!(url = client.url(), "using report server");
            let report = sync_descriptor(&config, client)
                .with_context(|| format!("sync of {descriptor} failed"))?;
            (report, None)
        };

        if self.json {
            print_json(&report, plan.as_deref())?;
        } else {
            if let Some(plan) = &plan {
                print_plan(plan);
            }
            print_summary(&report, self.dry_run);
        }

        if !report.is_clean() {
            bail!("{} item(s) failed", report.failures.len());
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct SyncJson<'a> {
    dry_run: bool,
    report: &'a SyncReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    plan: Option<&'a [CatalogCall]>,
}

fn print_json(report: &SyncReport, plan: Option<&[CatalogCall]>) -> Result<()> {
    let payload = SyncJson {
        dry_run: plan.is_some(),
        report,
        plan,
    };
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

fn print_plan(plan: &[CatalogCall]) {
    for (index, call) in plan.iter().enumerate() {
        println!("[dry-run] {:>3}. {}", index + 1, call.describe());
    }
}

#[derive(Tabled)]
struct FailureRow {
    #[tabled(rename = "item")]
    kind: &'static str,
    #[tabled(rename = "target")]
    target: String,
    #[tabled(rename = "error")]
    message: String,
}

fn print_summary(report: &SyncReport, dry_run: bool) {
    let prefix = if dry_run { "[dry-run] " } else { "" };
    let elapsed = report
        .duration_ms()
        .map(|ms| format!(" in {ms} ms"))
        .unwrap_or_default();

    let headline = format!(
        "{prefix}{} synced to {}{elapsed}",
        if report.is_clean() { "✓" } else { "✗" },
        report.root
    );
    if report.is_clean() {
        println!("{}", headline.green());
    } else {
        println!("{}", headline.red());
    }

    println!(
        "  folders: {} created, {} existing",
        report.folders_created, report.folders_existing
    );
    println!(
        "  items:   {} data source(s), {} dataset(s), {} report(s), {} role(s)",
        report.data_sources, report.data_sets, report.documents, report.roles
    );
    println!(
        "  links:   {} data source link(s), {} item reference(s)",
        report.data_source_links, report.item_references
    );

    if report.is_clean() {
        return;
    }

    let rows: Vec<FailureRow> = report
        .failures
        .iter()
        .map(|f| FailureRow {
            kind: f.kind,
            target: f.target.clone(),
            message: f.message.clone(),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", format!("{} failure(s):", report.failures.len()).yellow());
    println!("{table}");
}
