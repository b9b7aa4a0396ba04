//! Payment-history records: invoices billed to families, with NAV sync
//! and reminder-email state.

use crate::{
    error::ConsoleResult,
    grade::{grade_rank, SchoolLevel, GRADES},
    mailer::Deliverable,
    name_generator::NameGenerator,
    query::{
        export::{
            capitalize, date_range_line, format_amount, format_baht, format_date,
            format_datetime, search_line, slugify,
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

string_enum! {
    pub enum PaymentStatus {
        Paid => "paid",
        Pending => "pending",
        Overdue => "overdue",
        Cancelled => "cancelled",
    }
}

string_enum! {
    pub enum InvoiceStatus {
        Paid => "paid",
        Unpaid => "unpaid",
        Overdue => "overdue",
        Cancelled => "cancelled",
        Partial => "partial",
    }
}

string_enum! {
    /// Which console a payment-history export was taken from.
    pub enum ReportType {
        Tuition => "tuition",
        Afterschool => "afterschool",
    }
}

impl ReportType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Tuition => "Tuition Management",
            Self::Afterschool => "After School Management",
        }
    }
}

string_enum! {
    pub enum PaymentField {
        InvoiceNumber => "invoiceNumber",
        StudentName => "studentName",
        StudentGrade => "studentGrade",
        Amount => "amount",
        InvoiceStatus => "invoiceStatus",
        TransactionDate => "transactionDate",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditNote {
    pub number: String,
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub id: RecordId,
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
    pub status: PaymentStatus,
    pub invoice_status: InvoiceStatus,
    pub transaction_date: Timestamp,
    pub last_email_sent: Option<Timestamp>,
    pub email_status: Option<EmailStatus>,
    /// Only paid invoices are pushed to NAV; everything else has no status.
    pub nav_sync_status: Option<NavSyncStatus>,
    pub nav_sync_date: Option<Timestamp>,
    pub parent_type: ParentType,
    pub reference_number: String,
    pub payment_description: String,
    pub due_date: Timestamp,
    pub notes: String,
    pub credit_note: Option<CreditNote>,
}

impl Record for PaymentRecord {
    type Field = PaymentField;

    fn id(&self) -> &str {
        &self.id
    }

    fn sort_key(&self, field: PaymentField) -> SortKey<'_> {
        match field {
            PaymentField::InvoiceNumber => SortKey::Text(&self.invoice_number),
            PaymentField::StudentName => SortKey::Text(&self.student_name),
            PaymentField::StudentGrade => SortKey::Ordinal(grade_rank(&self.student_grade)),
            PaymentField::Amount => SortKey::Number(self.amount),
            PaymentField::InvoiceStatus => SortKey::Text(self.invoice_status.as_str()),
            PaymentField::TransactionDate => SortKey::Timestamp(self.transaction_date),
        }
    }
}

impl Deliverable for PaymentRecord {
    fn recipient(&self) -> &str {
        &self.parent_email
    }

    fn is_deliverable(&self) -> bool {
        self.nav_sync_status == Some(NavSyncStatus::Synced)
    }

    fn mark_sent(&self, at: Timestamp) -> Self {
        Self {
            email_status: Some(EmailStatus::Sent),
            last_email_sent: Some(at),
            ..self.clone()
        }
    }

    fn document(&self) -> Download {
        receipt_document(self)
    }
}

/// Plain-text receipt for one payment.
pub fn receipt_document(payment: &PaymentRecord) -> Download {
    let content = [
        format!("Receipt for {}", payment.invoice_number),
        format!("Student: {}", payment.student_name),
        format!("Grade: {}", payment.student_grade),
        format!("Amount: {}", format_baht(payment.amount)),
        format!("Payer: {}", payment.payer_name),
        format!("Payment Channel: {}", payment.payment_channel.label()),
        format!("Date: {}", payment.transaction_date.format("%b %d, %Y")),
    ]
    .join("\n");
    Download {
        filename: format!("receipt-{}.txt", payment.invoice_number),
        mime_type: "text/plain".to_string(),
        content,
    }
}

const ROOMS: [&str; 8] = ["A", "B", "C", "D", "E", "F", "G", "H"];
const METHODS: [&str; 5] = ["Credit Card", "PromptPay", "Bank Counter", "Bank Transfer", "Cash"];
const STATUS_DRAWS: [PaymentStatus; 7] = [
    PaymentStatus::Paid,
    PaymentStatus::Paid,
    PaymentStatus::Paid,
    PaymentStatus::Pending,
    PaymentStatus::Pending,
    PaymentStatus::Cancelled,
    PaymentStatus::Overdue,
];
const INVOICE_STATUS_DRAWS: [InvoiceStatus; 7] = [
    InvoiceStatus::Paid,
    InvoiceStatus::Paid,
    InvoiceStatus::Paid,
    InvoiceStatus::Unpaid,
    InvoiceStatus::Unpaid,
    InvoiceStatus::Overdue,
    InvoiceStatus::Cancelled,
];

/// Email state for a document synced at `synced_at`:
/// 30% not sent, 10% pending, 5% failed, 55% sent.
pub(crate) fn draw_email_state(
    rng: &mut DataRng,
    synced_at: Timestamp,
) -> (EmailStatus, Option<Timestamp>) {
    let roll = rng.next_f64();
    if roll > 0.7 {
        (EmailStatus::NotSent, None)
    } else if roll > 0.6 {
        (EmailStatus::Pending, None)
    } else {
        let status = if roll > 0.55 {
            EmailStatus::Failed
        } else {
            EmailStatus::Sent
        };
        let days = 1 + rng.next_u64_below(7) as i64;
        (status, Some(synced_at + Duration::days(days)))
    }
}

pub(crate) fn draw_payment_type(rng: &mut DataRng) -> PaymentType {
    if rng.next_f64() > 0.6 {
        PaymentType::Yearly
    } else {
        PaymentType::Termly
    }
}

pub(crate) fn draw_parent_type(rng: &mut DataRng) -> ParentType {
    if rng.next_f64() > 0.7 {
        ParentType::External
    } else {
        ParentType::Internal
    }
}

/// Generate `count` payments dated within 90 days before `anchor`.
pub fn generate(rng: &mut DataRng, count: usize, anchor: Timestamp) -> Vec<PaymentRecord> {
    (1..=count)
        .map(|i| {
            let student_name = NameGenerator::student_name(rng);
            let grade = *rng.pick(&GRADES);
            let room = *rng.pick(&ROOMS);
            let payment_type = draw_payment_type(rng);
            let status = *rng.pick(&STATUS_DRAWS);
            let invoice_status = *rng.pick(&INVOICE_STATUS_DRAWS);
            let method = *rng.pick(&METHODS);
            let channel = *rng.pick(PaymentChannel::ALL);
            let payer = NameGenerator::payer_name(rng);
            let date = anchor - Duration::days(rng.next_u64_below(90) as i64);

            let (nav_sync_status, nav_sync_date, email_status, last_email_sent) =
                if status == PaymentStatus::Paid {
                    let synced_at = date + Duration::hours(1 + rng.next_u64_below(24) as i64);
                    let (email, last_sent) = draw_email_state(rng, synced_at);
                    (Some(NavSyncStatus::Synced), Some(synced_at), Some(email), last_sent)
                } else {
                    (None, None, None, None)
                };

            let credit_note = if status == PaymentStatus::Paid && rng.next_f64() > 0.8 {
                Some(CreditNote {
                    number: format!("CN-2025-{:06}", rng.next_u64_below(1000)),
                    amount: (1000 + rng.next_u64_below(10_000)) as Amount,
                })
            } else {
                None
            };

            let notes = match status {
                PaymentStatus::Cancelled => "Payment cancelled by parent request",
                PaymentStatus::Overdue => "Payment overdue - reminder sent",
                PaymentStatus::Pending => "Payment pending - awaiting confirmation",
                PaymentStatus::Paid => "Payment completed successfully",
            };

            PaymentRecord {
                id: i.to_string(),
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
                status,
                invoice_status,
                transaction_date: date,
                last_email_sent,
                email_status,
                nav_sync_status,
                nav_sync_date,
                parent_type: draw_parent_type(rng),
                reference_number: format!("REF-{:04}", rng.next_u64_below(10_000)),
                payment_description: payment_type.description().to_string(),
                due_date: date + Duration::days(15),
                notes: notes.to_string(),
                credit_note,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaymentCriteria {
    pub search: String,
    pub email_status: Choice<EmailStatus>,
    pub invoice_status: Choice<InvoiceStatus>,
    pub grade: Choice<String>,
    pub school_level: Choice<SchoolLevel>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl Criteria<PaymentRecord> for PaymentCriteria {
    fn matches(&self, p: &PaymentRecord) -> bool {
        text_matches(
            &self.search,
            &[p.invoice_number.as_str(), p.student_name.as_str(), p.student_id.as_str()],
        )
            && self.email_status.admits_opt(p.email_status.as_ref())
            && self.invoice_status.admits(&p.invoice_status)
            && self.grade.admits(&p.student_grade)
            && self.school_level.admits(&p.school_level)
            && date_in_range(p.transaction_date, self.date_from, self.date_to)
    }

    fn set(&mut self, key: &str, value: &str) -> ConsoleResult<()> {
        match key {
            "search" => self.search = value.trim().to_string(),
            "emailStatus" => self.email_status = Choice::parse(value)?,
            "invoiceStatus" => self.invoice_status = Choice::parse(value)?,
            "grade" => self.grade = Choice::text(value),
            "schoolLevel" => self.school_level = Choice::parse(value)?,
            "dateFrom" => self.date_from = parse_date_input(value)?,
            "dateTo" => self.date_to = parse_date_input(value)?,
            other => return Err(unknown_filter(other)),
        }
        Ok(())
    }
}

pub const DEFAULT_EXPORT_TITLE: &str = "Payment History Export";

#[derive(Debug, Clone)]
pub struct PaymentHistoryView {
    pub report_type: ReportType,
    pub title: String,
}

impl PaymentHistoryView {
    pub fn new(report_type: ReportType) -> Self {
        Self {
            report_type,
            title: DEFAULT_EXPORT_TITLE.to_string(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

impl View for PaymentHistoryView {
    type Record = PaymentRecord;
    type Criteria = PaymentCriteria;

    fn slug(&self) -> &'static str {
        "payment-history"
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn baseline(&self, record: &PaymentRecord) -> bool {
        record.nav_sync_status.is_some()
    }

    fn extra_metadata(&self) -> Vec<String> {
        vec![format!("Report Type: {}", self.report_type.label())]
    }

    fn has_amount(&self) -> bool {
        true
    }

    fn amount(&self, record: &PaymentRecord) -> Option<Amount> {
        Some(record.amount)
    }

    fn columns(&self) -> &'static [&'static str] {
        &[
            "Invoice Number",
            "Student Name",
            "Student ID",
            "Grade Level",
            "Amount (THB)",
            "Payment Type",
            "Payment Method",
            "Payment Channel",
            "Payer Name",
            "Status",
            "Transaction Date",
            "Reference Number",
            "Due Date",
            "Notes",
        ]
    }

    fn row(&self, p: &PaymentRecord) -> Vec<Option<String>> {
        vec![
            Some(p.invoice_number.clone()),
            Some(p.student_name.clone()),
            Some(p.student_id.clone()),
            Some(p.student_grade.clone()),
            Some(format_amount(p.amount)),
            Some(p.payment_type.label().to_string()),
            Some(p.payment_method.clone()),
            Some(p.payment_channel.as_str().to_string()),
            Some(p.payer_name.clone()),
            Some(capitalize(p.status.as_str())),
            Some(format_datetime(p.transaction_date)),
            Some(p.reference_number.clone()),
            Some(format_date(p.due_date.date())),
            Some(p.notes.clone()),
        ]
    }

    fn filter_summary(&self, c: &PaymentCriteria) -> Vec<String> {
        vec![
            format!(
                "- Invoice Status: {}",
                c.invoice_status
                    .as_only()
                    .map_or("All Statuses".to_string(), |s| capitalize(s.as_str()))
            ),
            format!(
                "- Email Sent: {}",
                c.email_status
                    .as_only()
                    .map_or("All".to_string(), |s| capitalize(s.as_str()))
            ),
            format!(
                "- Grade Level: {}",
                c.grade.as_only().map_or("All Grades", String::as_str)
            ),
            format!(
                "- School Level: {}",
                c.school_level.as_only().map_or("All Levels", |l| l.label())
            ),
            date_range_line(c.date_from, c.date_to),
            search_line(&c.search),
        ]
    }

    fn filename_tags(&self, c: &PaymentCriteria) -> Vec<String> {
        vec![
            self.report_type.as_str().to_string(),
            c.invoice_status
                .as_only()
                .map_or("all".to_string(), |s| s.as_str().to_string()),
            c.email_status
                .as_only()
                .map_or("all".to_string(), |s| s.as_str().to_string()),
            c.grade
                .as_only()
                .map_or("all-grades".to_string(), |g| slugify(g)),
        ]
    }
}
