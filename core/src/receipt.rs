//! Receipts issued for settled invoices. A receipt only gets a number once
//! it has been synced to NAV.

use crate::{
    error::ConsoleResult,
    grade::{grade_rank, SchoolLevel, GRADES},
    mailer::Deliverable,
    name_generator::NameGenerator,
    payment::{draw_email_state, draw_parent_type, draw_payment_type},
    query::{
        export::{
            capitalize, date_range_line, format_amount, format_baht, format_date, search_line,
            slugify,
        },
        filter::{date_in_range, parse_date_input, text_matches, unknown_filter},
        Choice, Criteria, SortKey, View,
    },
    record::Record,
    rng::DataRng,
    sink::Download,
    types::{
        string_enum, Amount, EmailStatus, NavSyncStatus, ParentType, PaymentChannel, PaymentType,
        RecordId, Timestamp,
    },
};
use chrono::{Duration, NaiveDate};
use serde::Serialize;

/// Receipt number shown until NAV assigns one.
pub const UNASSIGNED_RECEIPT: &str = "-";

string_enum! {
    pub enum ReceiptField {
        ReceiptNumber => "receiptNumber",
        StudentName => "studentName",
        StudentGrade => "studentGrade",
        Amount => "amount",
        TransactionDate => "transactionDate",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptRecord {
    pub id: RecordId,
    pub receipt_number: String,
    pub invoice_number: String,
    pub student_name: String,
    pub student_id: String,
    pub student_grade: String,
    pub student_room: String,
    pub school_level: SchoolLevel,
    pub amount: Amount,
    pub payment_type: PaymentType,
    pub payment_method: String,
    pub payment_channel: PaymentChannel,
    pub payer_name: String,
    pub parent_email: String,
    pub transaction_date: Timestamp,
    pub last_email_sent: Option<Timestamp>,
    pub email_status: EmailStatus,
    pub nav_sync_status: NavSyncStatus,
    pub nav_sync_date: Option<Timestamp>,
    pub parent_type: ParentType,
    pub reference_number: String,
    pub payment_description: String,
    pub notes: String,
}

impl Record for ReceiptRecord {
    type Field = ReceiptField;

    fn id(&self) -> &str {
        &self.id
    }

    fn sort_key(&self, field: ReceiptField) -> SortKey<'_> {
        match field {
            ReceiptField::ReceiptNumber => SortKey::Text(&self.receipt_number),
            ReceiptField::StudentName => SortKey::Text(&self.student_name),
            ReceiptField::StudentGrade => SortKey::Ordinal(grade_rank(&self.student_grade)),
            ReceiptField::Amount => SortKey::Number(self.amount),
            ReceiptField::TransactionDate => SortKey::Timestamp(self.transaction_date),
        }
    }
}

impl Deliverable for ReceiptRecord {
    fn recipient(&self) -> &str {
        &self.parent_email
    }

    fn is_deliverable(&self) -> bool {
        self.nav_sync_status == NavSyncStatus::Synced
    }

    fn mark_sent(&self, at: Timestamp) -> Self {
        Self {
            email_status: EmailStatus::Sent,
            last_email_sent: Some(at),
            ..self.clone()
        }
    }

    fn document(&self) -> Download {
        let content = [
            format!("Receipt {}", self.receipt_number),
            format!("Invoice: {}", self.invoice_number),
            format!("Student: {} ({})", self.student_name, self.student_id),
            format!("Grade: {}", self.student_grade),
            format!("Amount: {}", format_baht(self.amount)),
            format!("Payer: {}", self.payer_name),
            format!("Payment Channel: {}", self.payment_channel.label()),
            format!("Date: {}", self.transaction_date.format("%b %d, %Y")),
        ]
        .join("\n");
        Download {
            filename: format!("receipt-{}.txt", self.receipt_number),
            mime_type: "text/plain".to_string(),
            content,
        }
    }
}

const ROOMS: [&str; 8] = ["A", "B", "C", "D", "E", "F", "G", "H"];
const METHODS: [&str; 5] = ["Credit Card", "PromptPay", "Bank Counter", "Bank Transfer", "Cash"];

/// Generate `count` receipts: 80% synced, 15% pending, 5% failed.
pub fn generate(rng: &mut DataRng, count: usize, anchor: Timestamp) -> Vec<ReceiptRecord> {
    (1..=count)
        .map(|i| {
            let student_name = NameGenerator::student_name(rng);
            let grade = *rng.pick(&GRADES);
            let room = *rng.pick(&ROOMS);
            let payment_type = draw_payment_type(rng);
            let method = *rng.pick(&METHODS);
            let channel = *rng.pick(PaymentChannel::ALL);
            let payer = NameGenerator::payer_name(rng);
            let date = anchor - Duration::days(rng.next_u64_below(90) as i64);

            let roll = rng.next_f64();
            let (nav_sync_status, nav_sync_date, receipt_number, email_status, last_email_sent) =
                if roll > 0.2 {
                    let synced_at = date + Duration::hours(1 + rng.next_u64_below(24) as i64);
                    let (email, last_sent) = draw_email_state(rng, synced_at);
                    (
                        NavSyncStatus::Synced,
                        Some(synced_at),
                        format!("RCP-2025-{i:06}"),
                        email,
                        last_sent,
                    )
                } else {
                    let status = if roll > 0.05 {
                        NavSyncStatus::Pending
                    } else {
                        NavSyncStatus::Failed
                    };
                    (status, None, UNASSIGNED_RECEIPT.to_string(), EmailStatus::NotSent, None)
                };

            ReceiptRecord {
                id: i.to_string(),
                receipt_number,
                invoice_number: format!("INV-2025-{i:06}"),
                student_name,
                student_id: format!("ST{i:06}"),
                student_grade: grade.to_string(),
                student_room: room.to_string(),
                school_level: SchoolLevel::from_grade(grade),
                amount: payment_type.amount(),
                payment_type,
                payment_method: method.to_string(),
                payment_channel: channel,
                payer_name: payer.to_string(),
                parent_email: NameGenerator::parent_email(payer),
                transaction_date: date,
                last_email_sent,
                email_status,
                nav_sync_status,
                nav_sync_date,
                parent_type: draw_parent_type(rng),
                reference_number: format!("REF-{:04}", rng.next_u64_below(10_000)),
                payment_description: payment_type.description().to_string(),
                notes: "Payment completed successfully".to_string(),
            }
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReceiptCriteria {
    pub search: String,
    pub grade: Choice<String>,
    pub school_level: Choice<SchoolLevel>,
    pub email_status: Choice<EmailStatus>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl Criteria<ReceiptRecord> for ReceiptCriteria {
    fn matches(&self, r: &ReceiptRecord) -> bool {
        text_matches(
            &self.search,
            &[
                r.receipt_number.as_str(),
                r.invoice_number.as_str(),
                r.student_name.as_str(),
                r.student_id.as_str(),
            ],
        ) && self.grade.admits(&r.student_grade)
            && self.school_level.admits(&r.school_level)
            && self.email_status.admits(&r.email_status)
            && date_in_range(r.transaction_date, self.date_from, self.date_to)
    }

    fn set(&mut self, key: &str, value: &str) -> ConsoleResult<()> {
        match key {
            "search" => self.search = value.trim().to_string(),
            "grade" => self.grade = Choice::text(value),
            "schoolLevel" => self.school_level = Choice::parse(value)?,
            "emailStatus" => self.email_status = Choice::parse(value)?,
            "dateFrom" => self.date_from = parse_date_input(value)?,
            "dateTo" => self.date_to = parse_date_input(value)?,
            other => return Err(unknown_filter(other)),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReceiptsView;

impl View for ReceiptsView {
    type Record = ReceiptRecord;
    type Criteria = ReceiptCriteria;

    fn slug(&self) -> &'static str {
        "receipts"
    }

    fn title(&self) -> &str {
        "Receipts Export"
    }

    fn has_amount(&self) -> bool {
        true
    }

    fn amount(&self, record: &ReceiptRecord) -> Option<Amount> {
        Some(record.amount)
    }

    fn columns(&self) -> &'static [&'static str] {
        &[
            "Receipt Number",
            "Invoice Number",
            "Student Name",
            "Student ID",
            "Grade",
            "Parent Name",
            "Parent Email",
            "Amount",
            "Payment Channel",
            "Transaction Date",
            "Email Status",
            "NAV Sync Status",
        ]
    }

    fn row(&self, r: &ReceiptRecord) -> Vec<Option<String>> {
        vec![
            Some(r.receipt_number.clone()),
            Some(r.invoice_number.clone()),
            Some(r.student_name.clone()),
            Some(r.student_id.clone()),
            Some(r.student_grade.clone()),
            Some(r.payer_name.clone()),
            Some(r.parent_email.clone()),
            Some(format_amount(r.amount)),
            Some(r.payment_channel.as_str().to_string()),
            Some(format_date(r.transaction_date.date())),
            Some(r.email_status.as_str().to_string()),
            Some(r.nav_sync_status.as_str().to_string()),
        ]
    }

    fn filter_summary(&self, c: &ReceiptCriteria) -> Vec<String> {
        vec![
            format!(
                "- Email Status: {}",
                c.email_status
                    .as_only()
                    .map_or("All".to_string(), |s| capitalize(s.as_str()))
            ),
            format!("- Grade: {}", c.grade.as_only().map_or("All Grades", String::as_str)),
            format!(
                "- School Level: {}",
                c.school_level.as_only().map_or("All Levels", |l| l.label())
            ),
            date_range_line(c.date_from, c.date_to),
            search_line(&c.search),
        ]
    }

    fn filename_tags(&self, c: &ReceiptCriteria) -> Vec<String> {
        vec![
            c.email_status
                .as_only()
                .map_or("all".to_string(), |s| s.as_str().to_string()),
            c.grade
                .as_only()
                .map_or("all-grades".to_string(), |g| slugify(g)),
        ]
    }
}
