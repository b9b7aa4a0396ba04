//! Reminder/receipt email sending under a daily quota.
//!
//! RULES:
//!   - The quota counter is the only shared mutable state. It increments
//!     strictly after a successful send and resets once per calendar day.
//!   - `maybe_reset` runs at the start of every send attempt.
//!   - Eligibility is checked before anything is mutated.
//!   - Hitting the limit is an outcome, not an error.
//!
//! Bulk sends walk a small state machine:
//!   Idle -> Sending(n remaining) -> Done | LimitReached

use crate::{
    error::ConsoleResult,
    record::{Record, RecordSet},
    sink::{Download, Notification},
    store::SettingsStore,
    types::{RecordId, Timestamp},
    view_state::Selection,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DEFAULT_DAILY_LIMIT: u32 = 500;
pub const QUOTA_KEY: &str = "emailQuota";

/// Records that can be emailed to a parent and downloaded as a document.
pub trait Deliverable: Record {
    fn recipient(&self) -> &str;

    /// Only documents synced to NAV may leave the system.
    fn is_deliverable(&self) -> bool;

    /// New version of the record after a successful send at `at`.
    fn mark_sent(&self, at: Timestamp) -> Self;

    fn document(&self) -> Download;
}

/// Daily email counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendQuota {
    pub count: u32,
    pub limit_per_day: u32,
    pub last_reset_day: NaiveDate,
}

impl SendQuota {
    pub fn new(limit_per_day: u32, count: u32, today: NaiveDate) -> Self {
        Self {
            count,
            limit_per_day,
            last_reset_day: today,
        }
    }

    /// Zero the counter when `today` is a different calendar day.
    pub fn maybe_reset(self, today: NaiveDate) -> Self {
        if today == self.last_reset_day {
            self
        } else {
            Self {
                count: 0,
                last_reset_day: today,
                ..self
            }
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.count >= self.limit_per_day
    }

    pub fn remaining(&self) -> u32 {
        self.limit_per_day.saturating_sub(self.count)
    }

    /// Share of today's limit already used, 0-100.
    pub fn usage_percent(&self) -> f64 {
        if self.limit_per_day == 0 {
            return 100.0;
        }
        f64::from(self.count) / f64::from(self.limit_per_day) * 100.0
    }

    fn record_send(&mut self) {
        self.count += 1;
    }

    /// Saved quota rolled forward to `today`, or `fallback` if none was saved.
    pub fn load(store: &SettingsStore, fallback: Self, today: NaiveDate) -> ConsoleResult<Self> {
        let quota = store.get_json::<Self>(QUOTA_KEY)?.unwrap_or(fallback);
        Ok(quota.maybe_reset(today))
    }

    pub fn save(&self, store: &SettingsStore) -> ConsoleResult<()> {
        store.put_json(QUOTA_KEY, self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentAction {
    Email,
    Download,
}

impl DocumentAction {
    fn blocked_message(&self) -> &'static str {
        match self {
            Self::Email => "Cannot send email. Receipt must be synced to NAV first.",
            Self::Download => "Cannot download receipt. Receipt must be synced to NAV first.",
        }
    }
}

/// Result of a single send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SendOutcome {
    Sent { recipient: String },
    LimitReached { limit: u32 },
    NotEligible { action: DocumentAction },
}

impl SendOutcome {
    pub fn notification(&self) -> Notification {
        match self {
            Self::Sent { recipient } => Notification::success(format!("Email sent to {recipient}")),
            Self::LimitReached { limit } => Notification::error(limit_message(*limit)),
            Self::NotEligible { action } => Notification::error(action.blocked_message()),
        }
    }
}

/// Result of a bulk send over the current selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BulkOutcome {
    EmptySelection,
    /// Nothing selected is visible under the current filters.
    NoMatchingRecords,
    /// Every visible selected record failed the eligibility gate.
    NotEligible,
    Done {
        sent: usize,
        skipped: usize,
    },
    LimitReached {
        sent: usize,
        requested: usize,
        limit: u32,
    },
}

impl BulkOutcome {
    pub fn notification(&self) -> Notification {
        match self {
            Self::EmptySelection => Notification::error(
                "Please select at least one invoice to send reminder emails.",
            ),
            Self::NoMatchingRecords => Notification::error(
                "Selected invoices are not available with the current filters.",
            ),
            Self::NotEligible => Notification::error(DocumentAction::Email.blocked_message()),
            Self::Done { sent, skipped } => {
                let plural = if *sent == 1 { "" } else { "s" };
                let mut message = format!("Email reminders sent to {sent} invoice{plural}.");
                if *skipped > 0 {
                    message.push_str(&format!(" Skipped {skipped} not yet synced to NAV."));
                }
                Notification::success(message)
            }
            Self::LimitReached { sent: 0, limit, .. } => Notification::error(limit_message(*limit)),
            Self::LimitReached {
                sent, requested, ..
            } => Notification::error(format!(
                "Daily email limit reached. Sent {sent} of {requested} selected invoices."
            )),
        }
    }
}

fn limit_message(limit: u32) -> String {
    format!("Daily email limit reached ({limit} emails). Please try again tomorrow.")
}

/// Progress of one bulk send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendState {
    Idle,
    Sending { remaining: usize },
    Done { sent: usize, skipped: usize },
    LimitReached { sent: usize, requested: usize },
}

impl SendState {
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::LimitReached { .. })
    }
}

/// Drives the queue of eligible ids one send at a time.
#[derive(Debug)]
pub struct BulkSend {
    queue: Vec<RecordId>,
    requested: usize,
    skipped: usize,
    sent: usize,
    state: SendState,
}

impl BulkSend {
    pub fn new(queue: Vec<RecordId>, skipped: usize) -> Self {
        Self {
            requested: queue.len(),
            queue,
            skipped,
            sent: 0,
            state: SendState::Idle,
        }
    }

    pub fn state(&self) -> &SendState {
        &self.state
    }

    /// Attempt the next send. A no-op once finished.
    pub fn step<R: Deliverable>(
        &mut self,
        records: &mut RecordSet<R>,
        selection: &mut Selection,
        quota: &mut SendQuota,
        now: Timestamp,
    ) -> ConsoleResult<&SendState> {
        if self.state.is_finished() {
            return Ok(&self.state);
        }
        let Some(id) = self.queue.get(self.sent).cloned() else {
            self.state = SendState::Done {
                sent: self.sent,
                skipped: self.skipped,
            };
            return Ok(&self.state);
        };
        *quota = quota.maybe_reset(now.date());
        if quota.is_exhausted() {
            self.state = SendState::LimitReached {
                sent: self.sent,
                requested: self.requested,
            };
            return Ok(&self.state);
        }
        deliver(records, &id, quota, now)?;
        selection.remove(&id);
        self.sent += 1;
        self.state = if self.sent == self.requested {
            SendState::Done {
                sent: self.sent,
                skipped: self.skipped,
            }
        } else {
            SendState::Sending {
                remaining: self.requested - self.sent,
            }
        };
        Ok(&self.state)
    }
}

/// Replace the record with its sent version, then count the send.
fn deliver<R: Deliverable>(
    records: &mut RecordSet<R>,
    id: &str,
    quota: &mut SendQuota,
    now: Timestamp,
) -> ConsoleResult<String> {
    let current = records
        .get(id)
        .ok_or_else(|| crate::error::ConsoleError::RecordNotFound { id: id.to_string() })?;
    let recipient = current.recipient().to_string();
    let updated = current.mark_sent(now);
    records.replace(updated)?;
    quota.record_send();
    log::debug!("Sent email for {id} to {recipient}");
    Ok(recipient)
}

/// Send one record's email.
pub fn send_one<R: Deliverable>(
    records: &mut RecordSet<R>,
    id: &str,
    selection: &mut Selection,
    quota: &mut SendQuota,
    now: Timestamp,
) -> ConsoleResult<SendOutcome> {
    *quota = quota.maybe_reset(now.date());
    if quota.is_exhausted() {
        log::warn!("Daily email limit of {} reached", quota.limit_per_day);
        return Ok(SendOutcome::LimitReached {
            limit: quota.limit_per_day,
        });
    }
    let record = records
        .get(id)
        .ok_or_else(|| crate::error::ConsoleError::RecordNotFound { id: id.to_string() })?;
    if !record.is_deliverable() {
        log::warn!("Refusing to email {id}: not synced to NAV");
        return Ok(SendOutcome::NotEligible {
            action: DocumentAction::Email,
        });
    }
    let recipient = deliver(records, id, quota, now)?;
    selection.remove(id);
    log::info!("Email sent to {recipient} ({}/{} today)", quota.count, quota.limit_per_day);
    Ok(SendOutcome::Sent { recipient })
}

/// Email every selected record that is visible in `visible`.
///
/// Selected ids outside the visible set are ignored. Visible selected
/// records that fail the eligibility gate are skipped and stay selected.
pub fn send_bulk<R: Deliverable>(
    records: &mut RecordSet<R>,
    visible: &[R],
    selection: &mut Selection,
    quota: &mut SendQuota,
    now: Timestamp,
) -> ConsoleResult<BulkOutcome> {
    if selection.is_empty() {
        return Ok(BulkOutcome::EmptySelection);
    }
    let targets: Vec<&R> = visible.iter().filter(|r| selection.contains(r.id())).collect();
    if targets.is_empty() {
        return Ok(BulkOutcome::NoMatchingRecords);
    }
    let (eligible, skipped): (Vec<&R>, Vec<&R>) =
        targets.into_iter().partition(|r| r.is_deliverable());
    if eligible.is_empty() {
        log::warn!("Bulk send blocked: {} selected records not synced to NAV", skipped.len());
        return Ok(BulkOutcome::NotEligible);
    }

    let queue = eligible.iter().map(|r| r.id().to_string()).collect();
    let mut run = BulkSend::new(queue, skipped.len());
    while !run.step(records, selection, quota, now)?.is_finished() {}

    let outcome = match *run.state() {
        SendState::LimitReached { sent, requested } => {
            log::warn!("Daily email limit reached after {sent} of {requested} sends");
            BulkOutcome::LimitReached {
                sent,
                requested,
                limit: quota.limit_per_day,
            }
        }
        SendState::Done { sent, skipped } => {
            log::info!("Bulk email complete: {sent} sent, {skipped} skipped");
            BulkOutcome::Done { sent, skipped }
        }
        SendState::Idle | SendState::Sending { .. } => BulkOutcome::Done {
            sent: 0,
            skipped: skipped.len(),
        },
    };
    Ok(outcome)
}

/// The record's document, or the notification explaining why not.
pub fn download_document<R: Deliverable>(record: &R) -> Result<Download, Notification> {
    if record.is_deliverable() {
        Ok(record.document())
    } else {
        Err(Notification::error(DocumentAction::Download.blocked_message()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::SortKey;
    use crate::sink::NotificationKind;

    #[derive(Debug, Clone)]
    struct Letter {
        id: String,
        synced: bool,
        sent_at: Option<Timestamp>,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum LetterField {
        Id,
    }

    impl Record for Letter {
        type Field = LetterField;

        fn id(&self) -> &str {
            &self.id
        }

        fn sort_key(&self, _field: LetterField) -> SortKey<'_> {
            SortKey::Text(&self.id)
        }
    }

    impl Deliverable for Letter {
        fn recipient(&self) -> &str {
            "parent@example.com"
        }

        fn is_deliverable(&self) -> bool {
            self.synced
        }

        fn mark_sent(&self, at: Timestamp) -> Self {
            Self {
                sent_at: Some(at),
                ..self.clone()
            }
        }

        fn document(&self) -> Download {
            Download {
                filename: format!("{}.txt", self.id),
                mime_type: "text/plain".into(),
                content: self.id.clone(),
            }
        }
    }

    fn letters(specs: &[(&str, bool)]) -> RecordSet<Letter> {
        RecordSet::from_records(
            specs
                .iter()
                .map(|(id, synced)| Letter {
                    id: id.to_string(),
                    synced: *synced,
                    sent_at: None,
                })
                .collect(),
        )
        .unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    fn noon(d: u32) -> Timestamp {
        day(d).and_hms_opt(12, 0, 0).unwrap()
    }

    #[test]
    fn saved_quota_rolls_over() {
        let store = SettingsStore::in_memory().unwrap();
        store.migrate().unwrap();
        let fallback = SendQuota::new(500, 235, day(1));
        assert_eq!(SendQuota::load(&store, fallback, day(1)).unwrap(), fallback);

        SendQuota::new(500, 499, day(1)).save(&store).unwrap();
        assert_eq!(SendQuota::load(&store, fallback, day(1)).unwrap().count, 499);
        assert_eq!(SendQuota::load(&store, fallback, day(2)).unwrap().count, 0);
    }

    #[test]
    fn quota_resets_only_on_new_day() {
        let quota = SendQuota::new(500, 235, day(1));
        assert_eq!(quota.maybe_reset(day(1)).count, 235);
        let next = quota.maybe_reset(day(2));
        assert_eq!(next.count, 0);
        assert_eq!(next.last_reset_day, day(2));
        assert_eq!(quota.remaining(), 265);
        assert!((quota.usage_percent() - 47.0).abs() < 1e-9);
    }

    #[test]
    fn single_send_marks_record_and_counts() {
        let mut records = letters(&[("1", true)]);
        let mut selection = Selection::default();
        selection.toggle("1");
        let mut quota = SendQuota::new(500, 0, day(1));
        let outcome = send_one(&mut records, "1", &mut selection, &mut quota, noon(1)).unwrap();
        assert_eq!(
            outcome.notification().message,
            "Email sent to parent@example.com"
        );
        assert_eq!(quota.count, 1);
        assert!(records.get("1").unwrap().sent_at.is_some());
        assert!(selection.is_empty());
    }

    #[test]
    fn unsynced_record_is_refused_without_mutation() {
        let mut records = letters(&[("1", false)]);
        let mut quota = SendQuota::new(500, 0, day(1));
        let outcome =
            send_one(&mut records, "1", &mut Selection::default(), &mut quota, noon(1)).unwrap();
        assert!(matches!(outcome, SendOutcome::NotEligible { .. }));
        assert_eq!(quota.count, 0);
        assert!(records.get("1").unwrap().sent_at.is_none());
        let err = download_document(records.get("1").unwrap()).unwrap_err();
        assert_eq!(err.kind, NotificationKind::Error);
    }

    #[test]
    fn exhausted_quota_resets_next_day() {
        let mut records = letters(&[("1", true)]);
        let mut quota = SendQuota::new(2, 2, day(1));
        let blocked =
            send_one(&mut records, "1", &mut Selection::default(), &mut quota, noon(1)).unwrap();
        assert_eq!(blocked, SendOutcome::LimitReached { limit: 2 });
        let sent =
            send_one(&mut records, "1", &mut Selection::default(), &mut quota, noon(2)).unwrap();
        assert!(matches!(sent, SendOutcome::Sent { .. }));
        assert_eq!(quota.count, 1);
    }

    #[test]
    fn bulk_skips_unsynced_and_keeps_them_selected() {
        let mut records = letters(&[("1", true), ("2", false), ("3", true)]);
        let visible = records.as_slice().to_vec();
        let mut selection = Selection::default();
        for id in ["1", "2", "3"] {
            selection.toggle(id);
        }
        let mut quota = SendQuota::new(500, 0, day(1));
        let outcome =
            send_bulk(&mut records, &visible, &mut selection, &mut quota, noon(1)).unwrap();
        assert_eq!(outcome, BulkOutcome::Done { sent: 2, skipped: 1 });
        assert_eq!(selection.ids(), vec!["2".to_string()]);
        assert_eq!(quota.count, 2);
    }

    #[test]
    fn bulk_no_op_outcomes() {
        let mut records = letters(&[("1", true), ("2", false)]);
        let visible = vec![records.get("2").unwrap().clone()];
        let mut quota = SendQuota::new(500, 0, day(1));

        let mut empty = Selection::default();
        assert_eq!(
            send_bulk(&mut records, &visible, &mut empty, &mut quota, noon(1)).unwrap(),
            BulkOutcome::EmptySelection
        );

        let mut hidden = Selection::default();
        hidden.toggle("1");
        assert_eq!(
            send_bulk(&mut records, &visible, &mut hidden, &mut quota, noon(1)).unwrap(),
            BulkOutcome::NoMatchingRecords
        );

        let mut unsynced = Selection::default();
        unsynced.toggle("2");
        assert_eq!(
            send_bulk(&mut records, &visible, &mut unsynced, &mut quota, noon(1)).unwrap(),
            BulkOutcome::NotEligible
        );
        assert_eq!(quota.count, 0);
    }

    #[test]
    fn outcome_messages() {
        assert_eq!(
            BulkOutcome::Done { sent: 1, skipped: 0 }.notification().message,
            "Email reminders sent to 1 invoice."
        );
        assert_eq!(
            BulkOutcome::Done { sent: 3, skipped: 0 }.notification().message,
            "Email reminders sent to 3 invoices."
        );
        assert_eq!(
            BulkOutcome::LimitReached { sent: 0, requested: 2, limit: 500 }
                .notification()
                .message,
            "Daily email limit reached (500 emails). Please try again tomorrow."
        );
        assert_eq!(
            BulkOutcome::LimitReached { sent: 1, requested: 3, limit: 500 }
                .notification()
                .message,
            "Daily email limit reached. Sent 1 of 3 selected invoices."
        );
    }
}
