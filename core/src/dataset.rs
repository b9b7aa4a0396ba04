//! Seeded mock datasets and the console session built on top of them.

use crate::{
    activity_log::{self, ActivityLogView},
    config::ConsoleConfig,
    error::ConsoleResult,
    mailer::SendQuota,
    payment::{self, PaymentHistoryView},
    receipt::{self, ReceiptsView},
    record::RecordSet,
    rng::{DatasetSlot, RngBank},
    transaction::{self, TransactionsView},
    types::Timestamp,
    view_state::ViewState,
};
use log::debug;

/// One record set per console list.
#[derive(Debug, Clone)]
pub struct Datasets {
    pub payments: RecordSet<payment::PaymentRecord>,
    pub receipts: RecordSet<receipt::ReceiptRecord>,
    pub transactions: RecordSet<transaction::TransactionRecord>,
    pub activity_log: RecordSet<activity_log::ActivityLogEntry>,
}

impl Datasets {
    /// Same seed and anchor always produce the same records.
    pub fn generate(config: &ConsoleConfig, anchor: Timestamp) -> ConsoleResult<Self> {
        let bank = RngBank::new(config.seed);
        let counts = &config.record_counts;

        let mut rng = bank.for_dataset(DatasetSlot::Payments);
        let payments = RecordSet::from_records(payment::generate(&mut rng, counts.payments, anchor))?;
        let mut rng = bank.for_dataset(DatasetSlot::Receipts);
        let receipts = RecordSet::from_records(receipt::generate(&mut rng, counts.receipts, anchor))?;
        let mut rng = bank.for_dataset(DatasetSlot::Transactions);
        let transactions =
            RecordSet::from_records(transaction::generate(&mut rng, counts.transactions, anchor))?;
        let mut rng = bank.for_dataset(DatasetSlot::ActivityLog);
        let activity_log =
            RecordSet::from_records(activity_log::generate(&mut rng, counts.activity_log, anchor))?;

        debug!(
            "generated datasets seed={} payments={} receipts={} transactions={} activity={}",
            config.seed,
            payments.len(),
            receipts.len(),
            transactions.len(),
            activity_log.len()
        );
        Ok(Self {
            payments,
            receipts,
            transactions,
            activity_log,
        })
    }
}

/// Every list view plus the shared email quota.
pub struct Console {
    pub payments: ViewState<PaymentHistoryView>,
    pub receipts: ViewState<ReceiptsView>,
    pub transactions: ViewState<TransactionsView>,
    pub activity_log: ViewState<ActivityLogView>,
    pub quota: SendQuota,
}

impl Console {
    pub fn new(config: &ConsoleConfig, data: Datasets, anchor: Timestamp) -> ConsoleResult<Self> {
        let paging = &config.paging;
        let payment_view =
            PaymentHistoryView::new(config.report_type).with_title(config.export_title.clone());
        Ok(Self {
            payments: ViewState::new(payment_view, data.payments, paging.default_page_size)?,
            receipts: ViewState::new(ReceiptsView, data.receipts, paging.default_page_size)?,
            transactions: ViewState::new(
                TransactionsView,
                data.transactions,
                paging.default_page_size,
            )?,
            activity_log: ViewState::new(
                ActivityLogView,
                data.activity_log,
                paging.activity_log_page_size,
            )?,
            quota: SendQuota::new(
                config.mailer.daily_email_limit,
                config.mailer.initial_sent_count,
                anchor.date(),
            ),
        })
    }

    pub fn generate(config: &ConsoleConfig, anchor: Timestamp) -> ConsoleResult<Self> {
        Self::new(config, Datasets::generate(config, anchor)?, anchor)
    }
}
