//! Filter, sort and paginate over generated datasets.

use chrono::NaiveDate;
use tuition_core::{
    payment::{PaymentCriteria, PaymentField, PaymentHistoryView, PaymentRecord, ReportType},
    query::{
        export_csv, filter_records, paginate, run_query, sort_records, Criteria, PageSpec,
        SortDirection, SortSpec,
    },
    transaction::{TransactionCriteria, TransactionField},
    types::Timestamp,
    ConsoleConfig, Datasets,
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

fn payments() -> Vec<PaymentRecord> {
    datasets().payments.as_slice().to_vec()
}

#[test]
fn filtering_twice_changes_nothing() {
    let records = payments();
    let mut criteria = PaymentCriteria::default();
    criteria.set("invoiceStatus", "paid").unwrap();
    criteria.set("schoolLevel", "prep").unwrap();

    let once = filter_records(&records, &criteria);
    let twice = filter_records(&once, &criteria);
    assert_eq!(once, twice);
}

#[test]
fn adding_a_criterion_never_grows_the_result() {
    let records = payments();
    let mut criteria = PaymentCriteria::default();
    criteria.set("invoiceStatus", "paid").unwrap();
    let broad = filter_records(&records, &criteria);

    criteria.set("grade", "Year 3").unwrap();
    let narrow = filter_records(&records, &criteria);

    assert!(narrow.len() <= broad.len());
    assert!(narrow.iter().all(|p| broad.contains(p)));
}

#[test]
fn filter_keeps_source_order() {
    let records = payments();
    let mut criteria = PaymentCriteria::default();
    criteria.set("search", "a").unwrap();
    let filtered = filter_records(&records, &criteria);
    let positions: Vec<usize> = filtered
        .iter()
        .map(|p| records.iter().position(|r| r.id == p.id).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn equal_amounts_keep_input_order_in_both_directions() {
    let records = payments();
    for direction in [SortDirection::Asc, SortDirection::Desc] {
        let sorted = sort_records(&records, &SortSpec::by(PaymentField::Amount, direction));
        for pair in sorted.windows(2) {
            if pair[0].amount == pair[1].amount {
                let a: usize = pair[0].id.parse().unwrap();
                let b: usize = pair[1].id.parse().unwrap();
                assert!(a < b, "tie between {a} and {b} reordered");
            }
        }
    }
}

#[test]
fn descending_is_ascending_reversed_for_unique_keys() {
    let data = datasets();
    let records = data.transactions.as_slice();
    let asc = sort_records(records, &SortSpec::by(TransactionField::InvoiceNumber, SortDirection::Asc));
    let mut desc =
        sort_records(records, &SortSpec::by(TransactionField::InvoiceNumber, SortDirection::Desc));
    desc.reverse();
    assert_eq!(asc, desc);
}

#[test]
fn pages_cover_the_filtered_set_exactly_once() {
    let data = datasets();
    let records = data.transactions.as_slice();
    let page_size = 20;
    let total = records.len();
    let pages = (total + page_size - 1) / page_size;

    let mut seen = Vec::new();
    for page in 1..=pages {
        let spec = PageSpec::new(page, page_size).unwrap();
        seen.extend(paginate(records, spec).items);
    }
    assert_eq!(seen, records.to_vec());

    let beyond = paginate(records, PageSpec::new(pages + 1, page_size).unwrap());
    assert!(beyond.items.is_empty());
    assert_eq!(beyond.total_items, total);
}

#[test]
fn zero_page_and_zero_size_are_rejected() {
    assert!(PageSpec::new(0, 10).is_err());
    assert!(PageSpec::new(1, 0).is_err());
}

#[test]
fn student_id_search_finds_one_record_and_exports_one_row() {
    let records = payments();
    assert_eq!(records.len(), 125);

    let mut criteria = PaymentCriteria::default();
    criteria.set("search", "ST000005").unwrap();
    let found = filter_records(&records, &criteria);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].student_id, "ST000005");

    let page = paginate(&found, PageSpec::new(1, 10).unwrap());
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.summary(), "Showing 1 to 1 of 1 entries");

    let view = PaymentHistoryView::new(ReportType::Tuition);
    let csv = export_csv(&view, &found, &criteria, anchor()).content;
    let (metadata, table) = csv.split_once("\n\n").expect("blank separator line");
    assert!(metadata.contains("Total Records: 1"));
    assert!(metadata.contains("- Search Term: ST000005"));
    let rows: Vec<&str> = table.lines().collect();
    assert_eq!(rows.len(), 2, "header plus one data row");
    assert!(rows[1].starts_with("INV-2025-000005,"));
}

#[test]
fn grades_sort_in_school_order() {
    let template = payments().remove(0);
    let grades = ["Year 10", "Reception", "Year 2", "Pre-nursery"];
    let records: Vec<PaymentRecord> = grades
        .iter()
        .enumerate()
        .map(|(i, grade)| PaymentRecord {
            id: format!("g{i}"),
            student_grade: grade.to_string(),
            ..template.clone()
        })
        .collect();

    let sorted = sort_records(&records, &SortSpec::by(PaymentField::StudentGrade, SortDirection::Asc));
    let order: Vec<&str> = sorted.iter().map(|p| p.student_grade.as_str()).collect();
    assert_eq!(order, ["Pre-nursery", "Reception", "Year 2", "Year 10"]);
}

#[test]
fn run_query_paginates_after_sorting() {
    let data = datasets();
    let view = PaymentHistoryView::new(ReportType::Tuition);
    let result = run_query(
        &view,
        data.payments.as_slice(),
        &PaymentCriteria::default(),
        &SortSpec::by(PaymentField::Amount, SortDirection::Desc),
        PageSpec::new(1, 5).unwrap(),
    );
    assert!(result.filtered.iter().all(|p| p.nav_sync_status.is_some()));
    let top = result.filtered.iter().map(|p| p.amount).fold(f64::MIN, f64::max);
    assert_eq!(result.page.items[0].amount, top);
    assert_eq!(result.page.total_items, result.filtered.len());
}

#[test]
fn transaction_date_range_is_inclusive() {
    let data = datasets();
    let records = data.transactions.as_slice();
    let day = records[0].transaction_date.date();
    let mut criteria = TransactionCriteria::default();
    let value = day.format("%Y-%m-%d").to_string();
    criteria.set("dateFrom", &value).unwrap();
    criteria.set("dateTo", &value).unwrap();
    let same_day = filter_records(records, &criteria);
    assert!(!same_day.is_empty());
    assert!(same_day.iter().all(|t| t.transaction_date.date() == day));
}

#[test]
fn unknown_filter_key_is_an_error() {
    let mut criteria = PaymentCriteria::default();
    assert!(criteria.set("colour", "red").is_err());
}
