//! Command-line interface.
//!
//! `serve` runs the HTTP console; every other subcommand performs one
//! operation against the reference service and prints the result.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use modelref_audit::{AuditReport, ClientFilter, SortColumn, SortDirection, SortState};
use modelref_client::ReferenceApi;
use modelref_types::{parse_record, AuditPreset, ModelCategory, ModelRecord};
use tracing::info;

use crate::snapshot::{SnapshotKey, SnapshotStore};

/// Model reference admin console
#[derive(Debug, Parser)]
#[command(name = "modelref-console")]
#[command(about = "Admin console for the model reference catalog")]
#[command(version)]
pub struct Cli {
    /// Root URL of the model reference service (overrides MODELREF_BASE_URL)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// API key for writes (overrides MODELREF_API_KEY)
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the console HTTP API
    Serve {
        /// Address to bind (overrides MODELREF_BIND)
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// List the categories known to the service
    Categories,

    /// List the records of a category
    Models {
        #[arg(value_parser = ModelCategory::parse)]
        category: ModelCategory,

        /// Read the legacy listing instead
        #[arg(long)]
        legacy: bool,

        /// Print records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Audit a category's usage and deletion risk
    Audit(AuditArgs),

    /// Create a record from a JSON file
    Create {
        #[arg(value_parser = ModelCategory::parse)]
        category: ModelCategory,

        /// Path to the record JSON
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Replace a record from a JSON file
    Update {
        #[arg(value_parser = ModelCategory::parse)]
        category: ModelCategory,

        name: String,

        /// Path to the record JSON
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Delete a record
    Delete {
        #[arg(value_parser = ModelCategory::parse)]
        category: ModelCategory,

        name: String,
    },
}

#[derive(Debug, Args)]
pub struct AuditArgs {
    #[arg(value_parser = ModelCategory::parse)]
    pub category: ModelCategory,

    /// Server-side preset, e.g. zero_usage or deletion_candidates
    #[arg(short, long, default_value = "all")]
    pub preset: AuditPreset,

    /// Keep text model variations as separate rows
    #[arg(long)]
    pub flat: bool,

    /// Case-insensitive search over names, descriptions and baselines
    #[arg(short, long)]
    pub search: Option<String>,

    /// Only rows carrying one of these tags (repeatable)
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Only rows carrying one of these parameter-size tags, e.g. 8B (repeatable)
    #[arg(long = "param-tag")]
    pub parameter_tags: Vec<String>,

    /// Only rows with at least one active worker
    #[arg(long)]
    pub active_only: bool,

    /// Column to sort by, e.g. usage_month
    #[arg(long)]
    pub sort: Option<SortColumn>,

    /// Sort descending
    #[arg(long, requires = "sort")]
    pub desc: bool,

    /// Also write the visible rows to this CSV file
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

impl AuditArgs {
    fn key(&self) -> SnapshotKey {
        SnapshotKey::new(self.category, self.preset, !self.flat)
    }

    fn filter(&self) -> ClientFilter {
        ClientFilter {
            search: self.search.clone(),
            tags: self.tags.clone(),
            parameter_tags: self.parameter_tags.clone(),
            active_workers_only: self.active_only,
        }
    }

    fn sort(&self) -> SortState {
        let direction = if self.desc { SortDirection::Desc } else { SortDirection::Asc };
        self.sort
            .map(|column| SortState::by(column, direction))
            .unwrap_or_default()
    }
}

/// Run a one-shot subcommand, writing human-readable output to `out`.
pub async fn run(command: Command, api: Arc<dyn ReferenceApi>, out: &mut impl Write) -> Result<()> {
    match command {
        Command::Serve { .. } => bail!("serve is handled by the binary entry point"),
        Command::Categories => {
            for category in api.list_categories().await? {
                writeln!(out, "{category}")?;
            }
        }
        Command::Models { category, legacy, json } => {
            let records = if legacy {
                api.list_legacy_models(category).await?
            } else {
                api.list_models(category).await?
            };
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(&records)?)?;
            } else {
                print_models(&records, out)?;
            }
        }
        Command::Audit(args) => {
            let snapshot = SnapshotStore::new(api).fetch(args.key()).await?;
            let report = snapshot.report(&args.filter(), args.sort());
            if let Some(path) = &args.csv {
                write_csv(path, &report).await?;
            }
            if args.json {
                writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
            } else {
                print_report(&report, out)?;
            }
        }
        Command::Create { category, file } => {
            let record = read_record(category, &file).await?;
            let created = api.create_model(category, &record, None).await?;
            info!(%category, name = %created.name, "model reference created");
            writeln!(out, "created {}", created.name)?;
        }
        Command::Update { category, name, file } => {
            let record = read_record(category, &file).await?;
            if record.name != name {
                bail!("record name '{}' does not match '{name}'", record.name);
            }
            api.update_model(category, &name, &record, None).await?;
            info!(%category, %name, "model reference updated");
            writeln!(out, "updated {name}")?;
        }
        Command::Delete { category, name } => {
            api.delete_model(category, &name, None).await?;
            info!(%category, %name, "model reference deleted");
            writeln!(out, "deleted {name}")?;
        }
    }
    Ok(())
}

async fn read_record(category: ModelCategory, path: &Path) -> Result<ModelRecord> {
    let body = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(parse_record(category, &body)?)
}

async fn write_csv(path: &Path, report: &AuditReport) -> Result<()> {
    tokio::fs::write(path, report.to_csv())
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), rows = report.rows.len(), "audit csv written");
    Ok(())
}

// ── Text output ──────────────────────────────────────────────────────────────

fn print_models(records: &[ModelRecord], out: &mut impl Write) -> Result<()> {
    for record in records {
        writeln!(out, "{:<60} {}", record.name, record.baseline().unwrap_or("-"))?;
    }
    Ok(())
}

fn print_report(report: &AuditReport, out: &mut impl Write) -> Result<()> {
    writeln!(
        out,
        "{} / {}: {} of {} rows, {} critical, {} warning",
        report.category,
        report.preset_label,
        report.rows.len(),
        report.total_rows,
        report.critical_count,
        report.warning_count,
    )?;
    if report.degraded {
        writeln!(out, "audit statistics unavailable; showing records only")?;
    }
    writeln!(
        out,
        "   {:<48} {:>7} {:>9} {:>7} {:>5}",
        "name", "workers", "month", "usage%", "risk"
    )?;
    for row in &report.rows {
        let marker = if row.is_critical {
            "!!"
        } else if row.has_warning {
            "! "
        } else {
            "  "
        };
        let workers = row.worker_count.map_or("-".to_owned(), |w| w.to_string());
        let month = row.usage_month().map_or("-".to_owned(), |m| m.to_string());
        writeln!(
            out,
            "{marker} {:<48} {:>7} {:>9} {:>7.2} {:>5}",
            row.name, workers, month, row.usage_percentage, row.risk_score
        )?;
    }
    Ok(())
}
