use crate::domain::rate::RateRecord;

const COLUMNS: [(&str, usize); 7] = [
    ("Country", 10),
    ("Category", 10),
    ("QualityDescription", 50),
    ("Profile", 10),
    ("BillingCycle", 12),
    ("Rate", 6),
    ("Status", 7),
];

const SEPARATOR: &str = " | ";

pub fn not_found(country: &str) -> String {
    format!("No records found for {country} with given filters.")
}

/// Renders the lookup result as reply text: a fixed-width table, or the
/// not-found notice when `records` is empty.
pub fn render(country: &str, records: &[RateRecord]) -> String {
    if records.is_empty() {
        return not_found(country);
    }

    let header = render_row(COLUMNS.iter().map(|(title, _)| (*title).to_string()));
    let rule = "-".repeat(header.chars().count());

    let mut lines = Vec::with_capacity(records.len() + 2);
    lines.push(header);
    lines.push(rule);
    lines.extend(records.iter().map(|record| render_row(record_cells(record))));
    lines.join("\n")
}

fn record_cells(record: &RateRecord) -> impl Iterator<Item = String> {
    [
        record.country.clone(),
        record.category.clone().unwrap_or_default(),
        record.quality_description.clone().unwrap_or_default(),
        record.profile.clone().unwrap_or_default(),
        record.billing_cycle.clone().unwrap_or_default(),
        record.rate.map(format_rate).unwrap_or_default(),
        record.status.clone().unwrap_or_default(),
    ]
    .into_iter()
}

/// Whole numbers keep one decimal place, so `1` renders as `1.0`.
fn format_rate(rate: f64) -> String {
    if rate.is_finite() && rate.fract() == 0.0 {
        format!("{rate:.1}")
    } else {
        rate.to_string()
    }
}

fn render_row(cells: impl Iterator<Item = String>) -> String {
    cells
        .zip(COLUMNS.iter())
        .map(|(value, (_, width))| fit(&value, *width))
        .collect::<Vec<_>>()
        .join(SEPARATOR)
}

fn fit(value: &str, width: usize) -> String {
    let truncated = value.chars().take(width).collect::<String>();
    format!("{truncated:<width$}")
}
