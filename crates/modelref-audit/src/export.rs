//! CSV export of the visible audit rows.

use modelref_types::ModelCategory;

use crate::metrics::ModelWithAuditMetrics;

pub const CSV_HEADER: [&str; 12] = [
    "Name",
    "Baseline",
    "Workers",
    "Usage Day",
    "Usage Month",
    "Usage Total",
    "Usage %",
    "Cost-Benefit",
    "File Hosts",
    "Flags",
    "Size GB",
    "Notes",
];

/// Download name of the export for `category`.
pub fn file_name(category: ModelCategory) -> String {
    category.export_file_name()
}

/// Quote `field` when it contains a comma, a quote or a line break, doubling
/// embedded quotes.
pub fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_owned()
    }
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn decimal(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.2}")).unwrap_or_default()
}

fn notes(row: &ModelWithAuditMetrics) -> String {
    let mut notes = Vec::new();
    if let Some(group) = &row.group {
        notes.push(format!("{} variations", group.variations.len()));
    }
    if row.is_degraded() {
        notes.push("no audit data".to_owned());
    }
    notes.join("; ")
}

/// Cells of one row, in header order.
pub fn row_fields(row: &ModelWithAuditMetrics) -> [String; 12] {
    let usage = row.usage;
    [
        row.name.clone(),
        row.baseline.clone().unwrap_or_default(),
        optional(row.worker_count),
        optional(usage.map(|u| u.day)),
        optional(usage.map(|u| u.month)),
        optional(usage.map(|u| u.total)),
        decimal(usage.map(|_| row.usage_percentage)),
        decimal(row.cost_benefit_score),
        row.file_hosts.join("; "),
        row.flags
            .map(|f| f.active_labels().join("; "))
            .unwrap_or_default(),
        decimal(row.size_gb),
        notes(row),
    ]
}

/// Render `rows` as CSV with a header line. Lines end with `\n`.
pub fn to_csv(rows: &[ModelWithAuditMetrics]) -> String {
    let mut out = CSV_HEADER.join(",");
    out.push('\n');
    for row in rows {
        let line: Vec<String> = row_fields(row).iter().map(|f| escape_field(f)).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }
    out
}
