//! ExportStage: serialize records to a CSV document with a metadata block.
//!
//! Layout:
//!   metadata lines (one escaped value per row)
//!   blank separator line
//!   header row
//!   one row per record
//!
//! Text generation is pure. Handing the document to a download sink is the
//! caller's job.

use crate::{
    query::View,
    sink::Download,
    types::{Amount, Timestamp},
};
use chrono::NaiveDate;

pub const CSV_MIME_TYPE: &str = "text/csv;charset=utf-8;";

/// Quote iff the value contains a comma, a double quote or a line break;
/// internal quotes are doubled.
pub fn escape_csv_value(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Missing values export as an empty field.
pub fn escape_optional(value: Option<&str>) -> String {
    value.map(escape_csv_value).unwrap_or_default()
}

/// Plain decimal, no thousands separators.
pub fn format_amount(amount: Amount) -> String {
    format!("{amount}")
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn format_datetime(at: Timestamp) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Thousands-separated whole baht for display text: `฿125,000`.
pub fn format_baht(amount: Amount) -> String {
    format!("฿{}", group_thousands(amount.round() as i64))
}

fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if value < 0 {
        grouped.insert(0, '-');
    }
    grouped
}

/// `- Date Range: {from} to {to}` with "No start/end date" fallbacks.
pub fn date_range_line(from: Option<NaiveDate>, to: Option<NaiveDate>) -> String {
    format!(
        "- Date Range: {} to {}",
        from.map(format_date).unwrap_or_else(|| "No start date".to_string()),
        to.map(format_date).unwrap_or_else(|| "No end date".to_string()),
    )
}

pub fn search_line(term: &str) -> String {
    if term.is_empty() {
        "- Search Term: No search applied".to_string()
    } else {
        format!("- Search Term: {term}")
    }
}

/// Filename-safe slug: lowercase `[a-z0-9]` runs joined by `-`.
/// Every other character separates runs.
pub fn slugify(value: &str) -> String {
    value
        .to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Upper-case the first character, leave the rest alone.
pub fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Build the CSV document for `records` as seen through `view` with `criteria`.
pub fn export_csv<V: View>(
    view: &V,
    records: &[V::Record],
    criteria: &V::Criteria,
    exported_at: Timestamp,
) -> Download {
    let mut metadata = vec![
        view.title().to_string(),
        format!("Export Date: {}", format_datetime(exported_at)),
    ];
    metadata.extend(view.extra_metadata());
    metadata.push(format!("Total Records: {}", records.len()));
    if view.has_amount() {
        let total: Amount = records.iter().filter_map(|r| view.amount(r)).sum();
        metadata.push(format!("Total Amount (THB): {}", format_amount(total)));
    }
    metadata.push("Applied Filters:".to_string());
    metadata.extend(view.filter_summary(criteria));

    let mut lines: Vec<String> = metadata.iter().map(|line| escape_csv_value(line)).collect();
    lines.push(String::new());
    lines.push(
        view.columns()
            .iter()
            .map(|c| escape_csv_value(c))
            .collect::<Vec<_>>()
            .join(","),
    );
    for record in records {
        let row = view
            .row(record)
            .iter()
            .map(|cell| escape_optional(cell.as_deref()))
            .collect::<Vec<_>>()
            .join(",");
        lines.push(row);
    }

    log::info!(
        "Exported {} {} records to CSV",
        records.len(),
        view.slug()
    );

    Download {
        filename: export_filename(view, criteria, exported_at.date()),
        mime_type: CSV_MIME_TYPE.to_string(),
        content: lines.join("\n"),
    }
}

/// `{slug}-{filter tags...}-{yyyy-MM-dd}.csv`
pub fn export_filename<V: View>(view: &V, criteria: &V::Criteria, day: NaiveDate) -> String {
    let mut parts = vec![view.slug().to_string()];
    parts.extend(view.filename_tags(criteria));
    parts.push(format_date(day));
    format!("{}.csv", parts.join("-"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_only_when_needed() {
        assert_eq!(escape_csv_value("plain"), "plain");
        assert_eq!(escape_csv_value("a,b"), "\"a,b\"");
        assert_eq!(escape_csv_value("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_csv_value("two\nlines"), "\"two\nlines\"");
        assert_eq!(escape_csv_value("a\rb"), "\"a\rb\"");
        assert_eq!(escape_optional(None), "");
    }

    #[test]
    fn amounts_have_no_separators() {
        assert_eq!(format_amount(125_000.0), "125000");
        assert_eq!(format_amount(1_260.5), "1260.5");
    }

    #[test]
    fn baht_display_groups_thousands() {
        assert_eq!(format_baht(125_000.0), "฿125,000");
        assert_eq!(format_baht(999.0), "฿999");
        assert_eq!(format_baht(1_234_567.0), "฿1,234,567");
    }

    #[test]
    fn filter_lines_fall_back_to_defaults() {
        assert_eq!(
            date_range_line(None, NaiveDate::from_ymd_opt(2025, 1, 31)),
            "- Date Range: No start date to 2025-01-31"
        );
        assert_eq!(search_line(""), "- Search Term: No search applied");
        assert_eq!(search_line("ST01"), "- Search Term: ST01");
    }

    #[test]
    fn slug_and_capitalize() {
        assert_eq!(slugify("Year  10"), "year-10");
        assert_eq!(slugify("Payment History"), "payment-history");
        assert_eq!(slugify("Year 1/2 (A&B)"), "year-1-2-a-b");
        assert_eq!(slugify("../etc"), "etc");
        assert_eq!(capitalize("not_sent"), "Not_sent");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn fixed_date_formats() {
        let at = NaiveDate::from_ymd_opt(2025, 7, 4)
            .unwrap()
            .and_hms_opt(9, 5, 3)
            .unwrap();
        assert_eq!(format_datetime(at), "2025-07-04 09:05:03");
        assert_eq!(format_date(at.date()), "2025-07-04");
    }
}
