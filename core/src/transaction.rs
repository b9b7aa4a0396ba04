//! Payment-gateway transactions, including card details and channel fees.

use crate::{
    error::ConsoleResult,
    grade::grade_rank,
    name_generator::NameGenerator,
    query::{
        export::{
            capitalize, date_range_line, format_amount, format_datetime, search_line, slugify,
        },
        filter::{date_in_range, parse_date_input, text_matches, unknown_filter},
        Choice, Criteria, SortKey, View,
    },
    record::Record,
    rng::DataRng,
    types::{string_enum, Amount, RecordId, Timestamp},
};
use chrono::{Duration, NaiveDate};
use serde::Serialize;

/// Grades that pay through the online gateway.
pub const TRANSACTION_GRADES: [&str; 13] = [
    "Reception", "Year 1", "Year 2", "Year 3", "Year 4", "Year 5", "Year 6", "Year 7", "Year 8",
    "Year 9", "Year 10", "Year 11", "Year 12",
];

pub const CHANNELS: [&str; 4] = ["Credit Card", "QR Payment", "Bank Counter", "Bank Transfer"];

const CARD_BRANDS: [&str; 4] = ["Visa", "Mastercard", "American Express", "JCB"];

/// Gateway fee rates by channel label.
pub fn fee_rate(channel: &str) -> f64 {
    match channel {
        "Credit Card" => 0.03,
        "QR Payment" => 0.015,
        _ => 0.0,
    }
}

string_enum! {
    pub enum TransactionStatus {
        Success => "success",
        Pending => "pending",
        Failed => "failed",
        Refunded => "refunded",
    }
}

string_enum! {
    pub enum TransactionField {
        InvoiceNumber => "invoiceNumber",
        StudentName => "studentName",
        StudentGrade => "studentGrade",
        Amount => "amount",
        TotalAmount => "totalAmount",
        PaymentStatus => "paymentStatus",
        TransactionDate => "transactionDate",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub id: RecordId,
    pub invoice_number: String,
    pub student_name: String,
    pub student_id: String,
    pub student_grade: String,
    pub parent_email: String,
    pub payment_channel: String,
    pub payment_status: TransactionStatus,
    pub amount: Amount,
    pub fee: Amount,
    pub total_amount: Amount,
    pub transaction_date: Timestamp,
    pub card_brand: Option<String>,
    pub card_last_four: Option<String>,
    pub payment_method: String,
    pub reference_number: String,
}

impl Record for TransactionRecord {
    type Field = TransactionField;

    fn id(&self) -> &str {
        &self.id
    }

    fn sort_key(&self, field: TransactionField) -> SortKey<'_> {
        match field {
            TransactionField::InvoiceNumber => SortKey::Text(&self.invoice_number),
            TransactionField::StudentName => SortKey::Text(&self.student_name),
            TransactionField::StudentGrade => SortKey::Ordinal(grade_rank(&self.student_grade)),
            TransactionField::Amount => SortKey::Number(self.amount),
            TransactionField::TotalAmount => SortKey::Number(self.total_amount),
            TransactionField::PaymentStatus => SortKey::Text(self.payment_status.as_str()),
            TransactionField::TransactionDate => SortKey::Timestamp(self.transaction_date),
        }
    }
}

/// 85% success, 8% pending, 5% failed, 2% refunded.
fn draw_status(rng: &mut DataRng) -> TransactionStatus {
    let roll = rng.next_f64();
    if roll > 0.15 {
        TransactionStatus::Success
    } else if roll > 0.07 {
        TransactionStatus::Pending
    } else if roll > 0.02 {
        TransactionStatus::Failed
    } else {
        TransactionStatus::Refunded
    }
}

/// Generate `count` transactions, newest first.
pub fn generate(rng: &mut DataRng, count: usize, anchor: Timestamp) -> Vec<TransactionRecord> {
    let mut transactions: Vec<TransactionRecord> = (1..=count)
        .map(|i| {
            let student_name = NameGenerator::common_student_name(rng);
            let grade = *rng.pick(&TRANSACTION_GRADES);
            let channel = *rng.pick(&CHANNELS);
            let payment_status = draw_status(rng);
            let amount: Amount = if rng.next_f64() > 0.6 { 125_000.0 } else { 42_000.0 };
            let fee = amount * fee_rate(channel);
            let date = anchor - Duration::days(rng.next_u64_below(90) as i64);
            let (card_brand, card_last_four) = if channel == "Credit Card" {
                (
                    Some(rng.pick(&CARD_BRANDS).to_string()),
                    Some(format!("{:04}", rng.next_u64_below(9999))),
                )
            } else {
                (None, None)
            };
            TransactionRecord {
                id: i.to_string(),
                invoice_number: format!("INV-2025-{i:06}"),
                parent_email: NameGenerator::family_email(&student_name),
                student_name,
                student_id: format!("ST{i:06}"),
                student_grade: grade.to_string(),
                payment_channel: channel.to_string(),
                payment_status,
                amount,
                fee,
                total_amount: amount + fee,
                transaction_date: date,
                card_brand,
                card_last_four,
                payment_method: channel.to_string(),
                reference_number: format!("REF-{:06}", rng.next_u64_below(100_000)),
            }
        })
        .collect();
    transactions.sort_by(|a, b| b.transaction_date.cmp(&a.transaction_date));
    transactions
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionCriteria {
    pub search: String,
    pub grade: Choice<String>,
    pub channel: Choice<String>,
    pub status: Choice<TransactionStatus>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl Criteria<TransactionRecord> for TransactionCriteria {
    fn matches(&self, t: &TransactionRecord) -> bool {
        text_matches(
            &self.search,
            &[
                t.invoice_number.as_str(),
                t.student_name.as_str(),
                t.student_id.as_str(),
                t.parent_email.as_str(),
            ],
        ) && self.grade.admits(&t.student_grade)
            && self.channel.admits(&t.payment_channel)
            && self.status.admits(&t.payment_status)
            && date_in_range(t.transaction_date, self.date_from, self.date_to)
    }

    fn set(&mut self, key: &str, value: &str) -> ConsoleResult<()> {
        match key {
            "search" => self.search = value.trim().to_string(),
            "grade" => self.grade = Choice::text(value),
            "channel" => self.channel = Choice::text(value),
            "status" => self.status = Choice::parse(value)?,
            "dateFrom" => self.date_from = parse_date_input(value)?,
            "dateTo" => self.date_to = parse_date_input(value)?,
            other => return Err(unknown_filter(other)),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct TransactionsView;

impl View for TransactionsView {
    type Record = TransactionRecord;
    type Criteria = TransactionCriteria;

    fn slug(&self) -> &'static str {
        "payment-transactions"
    }

    fn title(&self) -> &str {
        "Payment Transactions Export"
    }

    fn has_amount(&self) -> bool {
        true
    }

    fn amount(&self, record: &TransactionRecord) -> Option<Amount> {
        Some(record.total_amount)
    }

    fn columns(&self) -> &'static [&'static str] {
        &[
            "Invoice Number",
            "Student Name",
            "Student ID",
            "Grade",
            "Parent Email",
            "Payment Channel",
            "Payment Status",
            "Amount",
            "Fee",
            "Total Amount",
            "Transaction Date",
            "Card Brand",
            "Card Last Four",
            "Reference Number",
        ]
    }

    fn row(&self, t: &TransactionRecord) -> Vec<Option<String>> {
        vec![
            Some(t.invoice_number.clone()),
            Some(t.student_name.clone()),
            Some(t.student_id.clone()),
            Some(t.student_grade.clone()),
            Some(t.parent_email.clone()),
            Some(t.payment_channel.clone()),
            Some(t.payment_status.as_str().to_string()),
            Some(format_amount(t.amount)),
            Some(format_amount(t.fee)),
            Some(format_amount(t.total_amount)),
            Some(format_datetime(t.transaction_date)),
            t.card_brand.clone(),
            t.card_last_four.clone(),
            Some(t.reference_number.clone()),
        ]
    }

    fn filter_summary(&self, c: &TransactionCriteria) -> Vec<String> {
        vec![
            format!(
                "- Payment Status: {}",
                c.status
                    .as_only()
                    .map_or("All Statuses".to_string(), |s| capitalize(s.as_str()))
            ),
            format!(
                "- Payment Channel: {}",
                c.channel.as_only().map_or("All Channels", String::as_str)
            ),
            format!("- Grade: {}", c.grade.as_only().map_or("All Grades", String::as_str)),
            date_range_line(c.date_from, c.date_to),
            search_line(&c.search),
        ]
    }

    fn filename_tags(&self, c: &TransactionCriteria) -> Vec<String> {
        vec![
            c.status
                .as_only()
                .map_or("all".to_string(), |s| s.as_str().to_string()),
            c.channel.as_only().map_or("all".to_string(), |ch| slugify(ch)),
        ]
    }
}
