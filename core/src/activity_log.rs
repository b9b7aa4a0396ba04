//! Audit trail of console actions.

use crate::{
    error::ConsoleResult,
    query::{
        export::{date_range_line, format_datetime, search_line, slugify},
        filter::{date_in_range, parse_date_input, text_matches, unknown_filter},
        Choice, Criteria, SortKey, View,
    },
    record::Record,
    rng::DataRng,
    types::{string_enum, RecordId, Timestamp},
};
use chrono::{Duration, NaiveDate};
use serde::Serialize;

string_enum! {
    pub enum Action {
        Create => "create",
        Update => "update",
        Delete => "delete",
        SendEmail => "send_email",
        Download => "download",
    }
}

impl Action {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Create => "Create",
            Self::Update => "Update",
            Self::Delete => "Delete",
            Self::SendEmail => "Send Email",
            Self::Download => "Download",
        }
    }
}

string_enum! {
    pub enum ActivityField {
        Timestamp => "timestamp",
        User => "user",
        Action => "action",
        Module => "module",
    }
}

pub const MODULES: [&str; 7] = [
    "Invoice",
    "Receipt",
    "Payment History",
    "User Management",
    "Semester Settings",
    "Debt Reminders",
    "Payment Transactions",
];

/// Records in these modules are never deleted, only updated.
const NON_DELETABLE: [&str; 4] = ["Invoice", "Receipt", "Payment History", "Payment Transactions"];

/// (display name, user id)
const STAFF: [(&str, &str); 3] = [
    ("John Smith", "john.smith"),
    ("David Wilson", "david.wilson"),
    ("Sarah Johnson", "sarah.johnson"),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLogEntry {
    pub id: RecordId,
    pub timestamp: Timestamp,
    pub user: String,
    pub user_id: String,
    pub action: Action,
    pub module: String,
    pub target: String,
    pub target_id: String,
    pub details: String,
    pub ip_address: String,
}

impl Record for ActivityLogEntry {
    type Field = ActivityField;

    fn id(&self) -> &str {
        &self.id
    }

    fn sort_key(&self, field: ActivityField) -> SortKey<'_> {
        match field {
            ActivityField::Timestamp => SortKey::Timestamp(self.timestamp),
            ActivityField::User => SortKey::Text(&self.user),
            ActivityField::Action => SortKey::Text(self.action.as_str()),
            ActivityField::Module => SortKey::Text(&self.module),
        }
    }
}

/// Effective action: deletes on non-deletable modules are recorded as updates.
pub fn normalize_action(action: Action, module: &str) -> Action {
    if action == Action::Delete && NON_DELETABLE.contains(&module) {
        Action::Update
    } else {
        action
    }
}

struct Describe {
    target: String,
    target_id: String,
    details: String,
}

impl Describe {
    fn new(target: impl Into<String>, target_id: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            target_id: target_id.into(),
            details: details.into(),
        }
    }

    fn blank() -> Self {
        Self::new("", "", "")
    }
}

fn describe(rng: &mut DataRng, i: usize, action: Action, module: &str) -> Describe {
    let invoice = format!("INV-2025-{i:06}");
    let receipt = format!("RCP-2025-{i:06}");
    let payment = format!("PAY-2025-{i:06}");
    let txn = format!("TXN-2025-{i:06}");
    let student = format!("ST{i:06}");
    let user = format!("user-{i}");
    let reminder = format!("REMINDER-{i:04}");

    match (action, module) {
        (Action::Create, "Invoice") => {
            let amount = rng.pick(&["฿42,000", "฿125,000", "฿85,000"]);
            Describe::new(
                format!("Invoice {invoice}"),
                &invoice,
                format!("Created new invoice {invoice} for student {student}, Amount: {amount}"),
            )
        }
        (Action::Create, "User Management") => {
            let name = rng.pick(&["John Smith", "Sarah Wilson", "David Brown"]);
            Describe::new(
                "User account",
                user,
                format!("Created new user account for {name} with role \"Viewer\""),
            )
        }
        (Action::Create, "Receipt") => Describe::new(
            format!("Receipt {receipt}"),
            &receipt,
            format!("Created new receipt {receipt} for invoice {invoice}"),
        ),
        (Action::Create, "Semester Settings") => Describe::new(
            "Term settings",
            "",
            "Created new term \"Term 1 2025-2026\" with deadline December 20, 2025",
        ),
        (Action::Create, "Payment History") => Describe::new(
            format!("Payment record {payment}"),
            &payment,
            format!(
                "Created payment record {payment} for student {student}, Invoice: {invoice}, Amount: ฿42,000"
            ),
        ),
        (Action::Create, "Payment Transactions") => {
            let method = rng.pick(&["Credit Card", "QR Payment", "Bank Transfer"]);
            Describe::new(
                format!("Transaction {txn}"),
                &txn,
                format!("Created transaction {txn}, Payment method: {method}, Amount: ฿42,000"),
            )
        }
        (Action::Create, "Debt Reminders") => {
            let template = rng.pick(&["First Reminder", "Second Reminder", "Final Notice"]);
            Describe::new(
                "Reminder template",
                &reminder,
                format!(
                    "Created reminder template \"{template}\" ({reminder}), Send after: 7 days overdue"
                ),
            )
        }
        (Action::Update, "Invoice") => {
            let old = rng.pick(&["unpaid", "pending", "overdue"]);
            let new = rng.pick(&["paid", "partially_paid", "cancelled"]);
            Describe::new(
                format!("Invoice {invoice}"),
                &invoice,
                format!("Updated invoice {invoice} status from \"{old}\" to \"{new}\""),
            )
        }
        (Action::Update, "Semester Settings") => Describe::new(
            "Term 1 settings",
            "",
            "Updated payment deadline from \"December 15, 2025\" to \"December 20, 2025\"",
        ),
        (Action::Update, "User Management") => Describe::new(
            "User account",
            user,
            "Updated user \"John Smith\" role from \"Viewer\" to \"Administrator\"",
        ),
        (Action::Update, "Receipt") => Describe::new(
            format!("Receipt {receipt}"),
            &receipt,
            format!("Updated receipt {receipt} amount from \"฿42,000\" to \"฿45,000\""),
        ),
        (Action::Update, "Payment History") => Describe::new(
            format!("Payment record {payment}"),
            &payment,
            format!("Updated payment {payment} status from \"pending\" to \"completed\""),
        ),
        (Action::Update, "Payment Transactions") => Describe::new(
            format!("Transaction {txn}"),
            &txn,
            format!("Updated transaction {txn} status from \"pending\" to \"success\""),
        ),
        (Action::Update, "Debt Reminders") => Describe::new(
            "Reminder template",
            &reminder,
            format!(
                "Updated reminder template {reminder}, Send after changed from \"7 days\" to \"10 days\""
            ),
        ),
        (Action::Delete, "User Management") => {
            let name = rng.pick(&["John Doe", "Jane Smith", "Mike Wilson"]);
            Describe::new(
                "User account",
                &user,
                format!("Deleted user account \"{name}\" ({user})"),
            )
        }
        (Action::Delete, "Semester Settings") => Describe::new(
            "Term settings",
            "",
            "Deleted term \"Summer 2025\" configuration",
        ),
        (Action::Delete, "Debt Reminders") => Describe::new(
            "Reminder template",
            &reminder,
            format!("Deleted reminder template \"{reminder}\" - \"Overdue Payment Reminder\""),
        ),
        (Action::SendEmail, _) => Describe::new(
            format!("Invoice {invoice}"),
            &invoice,
            "Sent invoice email to parent@example.com",
        ),
        (Action::Download, _) => Describe::new(
            format!("Receipt {receipt}"),
            &receipt,
            "Downloaded receipt PDF",
        ),
        _ => Describe::blank(),
    }
}

/// Generate `count` entries within ~7 days before `anchor`, newest first.
pub fn generate(rng: &mut DataRng, count: usize, anchor: Timestamp) -> Vec<ActivityLogEntry> {
    let mut entries: Vec<ActivityLogEntry> = (1..=count)
        .map(|i| {
            let (user, user_id) = *rng.pick(&STAFF);
            let module = *rng.pick(&MODULES);
            let action = normalize_action(*rng.pick(Action::ALL), module);
            let timestamp = anchor - Duration::minutes(rng.next_u64_below(10_000) as i64);
            let Describe {
                target,
                target_id,
                details,
            } = describe(rng, i, action, module);
            ActivityLogEntry {
                id: i.to_string(),
                timestamp,
                user: user.to_string(),
                user_id: user_id.to_string(),
                action,
                module: module.to_string(),
                target,
                target_id,
                details,
                ip_address: format!("192.168.1.{}", rng.next_u64_below(255)),
            }
        })
        .collect();
    entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    entries
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityCriteria {
    pub search: String,
    pub user_id: Choice<String>,
    pub action: Choice<Action>,
    pub module: Choice<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl Criteria<ActivityLogEntry> for ActivityCriteria {
    fn matches(&self, e: &ActivityLogEntry) -> bool {
        text_matches(
            &self.search,
            &[
                e.user.as_str(),
                e.target.as_str(),
                e.details.as_str(),
                e.target_id.as_str(),
            ],
        ) && self.user_id.admits(&e.user_id)
            && self.action.admits(&e.action)
            && self.module.admits(&e.module)
            && date_in_range(e.timestamp, self.date_from, self.date_to)
    }

    fn set(&mut self, key: &str, value: &str) -> ConsoleResult<()> {
        match key {
            "search" => self.search = value.trim().to_string(),
            "user" => self.user_id = Choice::text(value),
            "action" => self.action = Choice::parse(value)?,
            "module" => self.module = Choice::text(value),
            "dateFrom" => self.date_from = parse_date_input(value)?,
            "dateTo" => self.date_to = parse_date_input(value)?,
            other => return Err(unknown_filter(other)),
        }
        Ok(())
    }
}

/// Distinct (user id, display name) pairs in first-seen order.
pub fn unique_users(entries: &[ActivityLogEntry]) -> Vec<(String, String)> {
    let mut seen: Vec<(String, String)> = Vec::new();
    for e in entries {
        if !seen.iter().any(|(id, _)| id == &e.user_id) {
            seen.push((e.user_id.clone(), e.user.clone()));
        }
    }
    seen
}

#[derive(Debug, Clone, Default)]
pub struct ActivityLogView;

impl View for ActivityLogView {
    type Record = ActivityLogEntry;
    type Criteria = ActivityCriteria;

    fn slug(&self) -> &'static str {
        "activity-log"
    }

    fn title(&self) -> &str {
        "Activity Log Export"
    }

    fn columns(&self) -> &'static [&'static str] {
        &[
            "Timestamp",
            "User",
            "User ID",
            "Action",
            "Module",
            "Target",
            "Target ID",
            "Details",
            "IP Address",
        ]
    }

    fn row(&self, e: &ActivityLogEntry) -> Vec<Option<String>> {
        let optional = |s: &str| (!s.is_empty()).then(|| s.to_string());
        vec![
            Some(format_datetime(e.timestamp)),
            Some(e.user.clone()),
            Some(e.user_id.clone()),
            Some(e.action.as_str().to_string()),
            Some(e.module.clone()),
            optional(&e.target),
            optional(&e.target_id),
            optional(&e.details),
            Some(e.ip_address.clone()),
        ]
    }

    fn filter_summary(&self, c: &ActivityCriteria) -> Vec<String> {
        vec![
            format!(
                "- User: {}",
                c.user_id.as_only().map_or("All Users", String::as_str)
            ),
            format!(
                "- Action: {}",
                c.action.as_only().map_or("All Actions", |a| a.label())
            ),
            format!(
                "- Module: {}",
                c.module.as_only().map_or("All Modules", String::as_str)
            ),
            date_range_line(c.date_from, c.date_to),
            search_line(&c.search),
        ]
    }

    fn filename_tags(&self, c: &ActivityCriteria) -> Vec<String> {
        vec![
            c.action
                .as_only()
                .map_or("all".to_string(), |a| a.as_str().to_string()),
            c.module.as_only().map_or("all".to_string(), |m| slugify(m)),
        ]
    }
}
