//! Debt reminder schedule, message templates and the HTML message editor.
//!
//! Messages are HTML strings. Formatting wraps a byte range in a tag;
//! the range must fall on character boundaries.

use crate::{
    error::{ConsoleError, ConsoleResult},
    mailer::SendQuota,
    query::export::format_baht,
    store::SettingsStore,
    types::string_enum,
};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::ops::Range;

pub const REMINDERS_KEY: &str = "debtReminderSettings";
pub const MAX_REMINDERS: usize = 10;

string_enum! {
    pub enum DeliveryMethod {
        Email => "email",
        Sms => "sms",
        Both => "both",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderConfig {
    pub id: String,
    pub name: String,
    pub reminder_date: Option<NaiveDate>,
    pub method: DeliveryMethod,
    pub enabled: bool,
    pub subject: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalReminderSettings {
    pub enable_reminders: bool,
    pub from_email: String,
    pub sms_enabled: bool,
}

impl Default for GlobalReminderSettings {
    fn default() -> Self {
        Self {
            enable_reminders: true,
            from_email: "noreply@rugby.ac.th".to_string(),
            sms_enabled: false,
        }
    }
}

/// Reminder schedule relative to `today`.
pub fn default_reminders(today: NaiveDate) -> Vec<ReminderConfig> {
    vec![
        ReminderConfig {
            id: "1".to_string(),
            name: "First Reminder".to_string(),
            reminder_date: Some(today + Duration::days(30)),
            method: DeliveryMethod::Email,
            enabled: true,
            subject: "Tuition Payment Reminder - 30 Days".to_string(),
            message: "<p>Dear Parent,</p><p>This is a friendly reminder that your child's tuition payment is due in 30 days. Please make your payment to avoid any late fees.</p>".to_string(),
        },
        ReminderConfig {
            id: "2".to_string(),
            name: "Second Reminder".to_string(),
            reminder_date: Some(today + Duration::days(14)),
            method: DeliveryMethod::Both,
            enabled: true,
            subject: "Urgent: Tuition Payment Due in 14 Days".to_string(),
            message: "<p>Dear Parent,</p><p>Your child's tuition payment is due in 14 days. Please complete your payment as soon as possible to ensure continuous enrollment.</p>".to_string(),
        },
        ReminderConfig {
            id: "3".to_string(),
            name: "Overdue Notice".to_string(),
            reminder_date: None,
            method: DeliveryMethod::Both,
            enabled: true,
            subject: "OVERDUE: Tuition Payment Past Due".to_string(),
            message: "<p>Dear Parent,</p><p>Your child's tuition payment is now overdue. Please contact our office immediately to arrange payment.</p>".to_string(),
        },
    ]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderSettings {
    pub reminders: Vec<ReminderConfig>,
    pub global: GlobalReminderSettings,
}

impl ReminderSettings {
    pub fn with_defaults(today: NaiveDate) -> Self {
        Self {
            reminders: default_reminders(today),
            global: GlobalReminderSettings::default(),
        }
    }

    pub fn load(store: &SettingsStore, today: NaiveDate) -> ConsoleResult<Self> {
        Ok(store
            .get_json(REMINDERS_KEY)?
            .unwrap_or_else(|| Self::with_defaults(today)))
    }

    pub fn save(&self, store: &SettingsStore) -> ConsoleResult<()> {
        store.put_json(REMINDERS_KEY, self)
    }

    /// Append a blank email reminder. At most `MAX_REMINDERS` may exist.
    pub fn add(&mut self) -> ConsoleResult<&ReminderConfig> {
        if self.reminders.len() >= MAX_REMINDERS {
            return Err(ConsoleError::Validation(format!(
                "At most {MAX_REMINDERS} reminder periods can be configured"
            )));
        }
        self.reminders.push(ReminderConfig {
            id: uuid::Uuid::new_v4().to_string(),
            name: "New Reminder".to_string(),
            reminder_date: None,
            method: DeliveryMethod::Email,
            enabled: true,
            subject: "Tuition Payment Reminder".to_string(),
            message: "<p>Dear Parent,</p><p>This is a reminder that your child's tuition payment is due. Please make your payment to avoid any late fees.</p><p>Thank you.</p>".to_string(),
        });
        Ok(&self.reminders[self.reminders.len() - 1])
    }

    pub fn update(&mut self, reminder: ReminderConfig) -> ConsoleResult<()> {
        let slot = self
            .reminders
            .iter_mut()
            .find(|r| r.id == reminder.id)
            .ok_or_else(|| ConsoleError::RecordNotFound {
                id: reminder.id.clone(),
            })?;
        *slot = reminder;
        Ok(())
    }

    pub fn delete(&mut self, id: &str) -> ConsoleResult<ReminderConfig> {
        let pos = self
            .reminders
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| ConsoleError::RecordNotFound { id: id.to_string() })?;
        Ok(self.reminders.remove(pos))
    }
}

/// Sample values substituted into a preview.
pub const PREVIEW_PARENT: &str = "Mr. John Smith";
pub const PREVIEW_STUDENT: &str = "Emma Smith";
pub const PREVIEW_AMOUNT: f64 = 45_000.0;
pub const PREVIEW_DUE_DATE: &str = "November 15, 2025";

/// Template with every placeholder replaced by sample data.
pub fn preview_html(template: &str, reminder: &ReminderConfig) -> String {
    let reminder_date = reminder
        .reminder_date
        .map_or_else(|| "Not set".to_string(), |d| d.format("%d %B %Y").to_string());
    template
        .replace("{parent_name}", PREVIEW_PARENT)
        .replace("{student_name}", PREVIEW_STUDENT)
        .replace("{amount}", &format_baht(PREVIEW_AMOUNT))
        .replace("{due_date}", PREVIEW_DUE_DATE)
        .replace("{reminder_date}", &reminder_date)
}

/// True when the HTML has no visible text once tags, `&nbsp;` and
/// whitespace are removed.
pub fn is_html_empty(html: &str) -> bool {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(ch),
            _ => {}
        }
    }
    text.to_lowercase().replace("&nbsp;", "").trim().is_empty()
}

fn wrap(html: &str, range: Range<usize>, tag: &str) -> ConsoleResult<String> {
    if range.start > range.end
        || range.end > html.len()
        || !html.is_char_boundary(range.start)
        || !html.is_char_boundary(range.end)
    {
        return Err(ConsoleError::Validation(format!(
            "Selection {}..{} is not a valid text range",
            range.start, range.end
        )));
    }
    if range.is_empty() {
        return Ok(html.to_string());
    }
    Ok(format!(
        "{}<{tag}>{}</{tag}>{}",
        &html[..range.start],
        &html[range.clone()],
        &html[range.end..]
    ))
}

pub fn apply_bold(html: &str, range: Range<usize>) -> ConsoleResult<String> {
    wrap(html, range, "b")
}

pub fn apply_italic(html: &str, range: Range<usize>) -> ConsoleResult<String> {
    wrap(html, range, "i")
}

pub fn apply_underline(html: &str, range: Range<usize>) -> ConsoleResult<String> {
    wrap(html, range, "u")
}

/// Numbers behind the "emails sent today" meter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaUsage {
    pub sent_today: u32,
    pub daily_limit: u32,
    pub remaining: u32,
    pub percentage: f64,
}

impl From<&SendQuota> for QuotaUsage {
    fn from(quota: &SendQuota) -> Self {
        Self {
            sent_today: quota.count,
            daily_limit: quota.limit_per_day,
            remaining: quota.remaining(),
            percentage: quota.usage_percent(),
        }
    }
}
