use crate::payment::{ReportType, DEFAULT_EXPORT_TITLE};
use serde::{Deserialize, Serialize};

/// How many mock records each dataset starts with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordCounts {
    pub payments: usize,
    pub receipts: usize,
    pub transactions: usize,
    pub activity_log: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagingConfig {
    pub default_page_size: usize,
    pub activity_log_page_size: usize,
    pub page_size_options: Vec<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailerConfig {
    pub daily_email_limit: u32,
    /// Emails already counted against today's quota at startup.
    pub initial_sent_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleConfig {
    pub seed: u64,
    pub record_counts: RecordCounts,
    pub mailer: MailerConfig,
    pub paging: PagingConfig,
    pub report_type: ReportType,
    #[serde(default = "default_export_title")]
    pub export_title: String,
}

fn default_export_title() -> String {
    DEFAULT_EXPORT_TITLE.to_string()
}

impl ConsoleConfig {
    /// Load from the data/ directory.
    /// In tests, use ConsoleConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/console.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        let paging = &self.paging;
        if paging.default_page_size == 0 || paging.activity_log_page_size == 0 {
            anyhow::bail!("Page sizes must be greater than zero");
        }
        if paging.page_size_options.iter().any(|&n| n == 0) {
            anyhow::bail!("Page size options must be greater than zero");
        }
        if self.mailer.daily_email_limit == 0 {
            anyhow::bail!("daily_email_limit must be greater than zero");
        }
        Ok(())
    }

    /// Config with hardcoded defaults for use in unit tests.
    pub fn default_test() -> Self {
        Self {
            seed: 42,
            record_counts: RecordCounts {
                payments: 125,
                receipts: 125,
                transactions: 150,
                activity_log: 100,
            },
            mailer: MailerConfig {
                daily_email_limit: 500,
                initial_sent_count: 235,
            },
            paging: PagingConfig {
                default_page_size: 10,
                activity_log_page_size: 20,
                page_size_options: vec![10, 20, 50, 100],
            },
            report_type: ReportType::Tuition,
            export_title: default_export_title(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_config_matches_test_defaults() {
        let dir = concat!(env!("CARGO_MANIFEST_DIR"), "/../data");
        let config = ConsoleConfig::load(dir).unwrap();
        let test = ConsoleConfig::default_test();
        assert_eq!(config.record_counts.payments, test.record_counts.payments);
        assert_eq!(config.mailer.daily_email_limit, test.mailer.daily_email_limit);
        assert_eq!(config.paging.page_size_options, test.paging.page_size_options);
        assert_eq!(config.export_title, "Payment History Export");
    }

    #[test]
    fn missing_file_names_path() {
        let err = ConsoleConfig::load("/nonexistent-dir").unwrap_err();
        assert!(err.to_string().contains("/nonexistent-dir/console.json"));
    }

    #[test]
    fn zero_page_size_rejected() {
        let mut config = ConsoleConfig::default_test();
        config.paging.default_page_size = 0;
        assert!(config.validate().is_err());
    }
}
