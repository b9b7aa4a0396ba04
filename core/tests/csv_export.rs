//! CSV documents read back into the record values they were built from.

use chrono::{NaiveDate, NaiveDateTime};
use tuition_core::{
    activity_log::{Action, ActivityCriteria, ActivityLogView},
    payment::{PaymentCriteria, PaymentHistoryView, ReportType},
    query::{export::CSV_MIME_TYPE, export_csv, Criteria, View},
    receipt::{ReceiptCriteria, ReceiptsView},
    transaction::{TransactionCriteria, TransactionStatus, TransactionsView},
    types::Timestamp,
    ConsoleConfig, Datasets, ViewState,
};

fn anchor() -> Timestamp {
    NaiveDate::from_ymd_opt(2025, 10, 1)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap()
}

fn datasets() -> Datasets {
    Datasets::generate(&ConsoleConfig::default_test(), anchor()).expect("datasets")
}

/// Minimal RFC 4180 reader: quoted fields may hold commas, doubled
/// quotes and newlines.
fn parse_csv(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match (quoted, c) {
            (true, '"') if chars.peek() == Some(&'"') => {
                chars.next();
                field.push('"');
            }
            (true, '"') => quoted = false,
            (true, c) => field.push(c),
            (false, '"') => quoted = true,
            (false, ',') => row.push(std::mem::take(&mut field)),
            (false, '\n') => {
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
            }
            (false, c) => field.push(c),
        }
    }
    row.push(field);
    rows.push(row);
    rows
}

/// Split an export into (metadata rows, header, data rows).
fn split_export(content: &str) -> (Vec<String>, Vec<String>, Vec<Vec<String>>) {
    let (metadata, table) = content.split_once("\n\n").expect("blank separator line");
    let metadata = parse_csv(metadata)
        .into_iter()
        .map(|mut row| {
            assert_eq!(row.len(), 1, "metadata rows hold one value");
            row.remove(0)
        })
        .collect();
    let mut rows = parse_csv(table);
    let header = rows.remove(0);
    (metadata, header, rows)
}

fn timestamp(cell: &str) -> Timestamp {
    NaiveDateTime::parse_from_str(cell, "%Y-%m-%d %H:%M:%S").expect("datetime cell")
}

fn amount(cell: &str) -> f64 {
    cell.parse().expect("amount cell")
}

#[test]
fn activity_log_rows_read_back_to_entries() {
    let data = datasets();
    let records = data.activity_log.as_slice();
    let view = ActivityLogView;
    let download = export_csv(&view, records, &ActivityCriteria::default(), anchor());

    assert_eq!(download.mime_type, CSV_MIME_TYPE);
    let (metadata, header, rows) = split_export(&download.content);
    assert_eq!(metadata[0], "Activity Log Export");
    assert!(metadata.contains(&format!("Total Records: {}", records.len())));
    assert!(!metadata.iter().any(|m| m.starts_with("Total Amount")));
    assert_eq!(header, view.columns());
    assert_eq!(rows.len(), records.len());

    for (row, entry) in rows.iter().zip(records) {
        assert_eq!(timestamp(&row[0]), entry.timestamp);
        assert_eq!(row[1], entry.user);
        assert_eq!(row[2], entry.user_id);
        assert_eq!(row[3].parse::<Action>().unwrap(), entry.action);
        assert_eq!(row[4], entry.module);
        assert_eq!(row[5], entry.target);
        assert_eq!(row[6], entry.target_id);
        assert_eq!(row[7], entry.details);
        assert_eq!(row[8], entry.ip_address);
    }
}

#[test]
fn transaction_rows_read_back_to_records() {
    let data = datasets();
    let view = TransactionsView;
    let mut criteria = TransactionCriteria::default();
    criteria.set("channel", "Credit Card").unwrap();
    criteria.set("status", "success").unwrap();
    let records: Vec<_> = data
        .transactions
        .iter()
        .filter(|t| criteria.matches(t))
        .cloned()
        .collect();

    let download = export_csv(&view, &records, &criteria, anchor());
    assert_eq!(
        download.filename,
        "payment-transactions-success-credit-card-2025-10-01.csv"
    );

    let (metadata, _, rows) = split_export(&download.content);
    assert_eq!(rows.len(), records.len());
    let total: f64 = records.iter().map(|t| t.total_amount).sum();
    let total_line = metadata
        .iter()
        .find_map(|m| m.strip_prefix("Total Amount (THB): "))
        .expect("aggregate line");
    assert_eq!(amount(total_line), total);

    for (row, t) in rows.iter().zip(&records) {
        assert_eq!(row[0], t.invoice_number);
        assert_eq!(row[2], t.student_id);
        assert_eq!(row[5], t.payment_channel);
        assert_eq!(row[6].parse::<TransactionStatus>().unwrap(), t.payment_status);
        assert_eq!(amount(&row[7]), t.amount);
        assert_eq!(amount(&row[8]), t.fee);
        assert_eq!(amount(&row[9]), t.total_amount);
        assert_eq!(timestamp(&row[10]), t.transaction_date);
        assert_eq!(Some(row[11].as_str()), t.card_brand.as_deref());
        assert_eq!(Some(row[12].as_str()), t.card_last_four.as_deref());
    }
}

#[test]
fn receipts_export_ignores_pagination() {
    let data = datasets();
    let mut state = ViewState::new(ReceiptsView, data.receipts, 10).expect("view state");
    state.set_page(3).unwrap();
    let download = state.export(anchor());

    let (_, _, rows) = split_export(&download.content);
    assert_eq!(rows.len(), state.filtered().len());
    assert!(rows.len() > state.current_page().items.len());
}

#[test]
fn empty_export_still_has_header() {
    let view = ReceiptsView;
    let mut criteria = ReceiptCriteria::default();
    criteria.set("search", "no such student").unwrap();
    let download = export_csv(&view, &[], &criteria, anchor());

    let (metadata, header, rows) = split_export(&download.content);
    assert!(metadata.contains(&"Total Records: 0".to_string()));
    assert!(metadata.contains(&"Total Amount (THB): 0".to_string()));
    assert_eq!(header, view.columns());
    assert!(rows.is_empty());
}

#[test]
fn empty_payment_export_keeps_zero_total() {
    let view = PaymentHistoryView::new(ReportType::Tuition);
    let mut criteria = PaymentCriteria::default();
    criteria.set("search", "nobody").unwrap();
    let download = export_csv(&view, &[], &criteria, anchor());

    let (metadata, _, rows) = split_export(&download.content);
    let records_at = metadata.iter().position(|m| m == "Total Records: 0").unwrap();
    assert_eq!(metadata[records_at + 1], "Total Amount (THB): 0");
    assert!(rows.is_empty());
}

#[test]
fn free_text_grade_cannot_escape_the_export_directory() {
    let view = PaymentHistoryView::new(ReportType::Tuition);
    let mut criteria = PaymentCriteria::default();
    criteria.set("grade", "../Year 1/2").unwrap();
    let filename = export_csv(&view, &[], &criteria, anchor()).filename;
    assert_eq!(
        filename,
        "payment-history-tuition-all-all-year-1-2-2025-10-01.csv"
    );
    assert!(!filename.contains(['/', '\\']));
}
