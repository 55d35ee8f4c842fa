pub mod summarizer;

pub use summarizer::{AccountReport, AccountSummarizer};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument};

#[derive(Debug, Clone, Serialize)]
pub struct MonitorReport {
    pub generated_at: DateTime<Utc>,
    pub accounts: Vec<AccountReport>,
}

impl MonitorReport {
    pub fn failures(&self) -> usize {
        self.accounts.iter().filter(|a| a.error().is_some()).count()
    }
}

/// Summarizes a fixed list of accounts, one after another.
///
/// Each account is independent: a failed read only shows up in that
/// account's report entry.
pub struct AccountMonitor {
    summarizer: AccountSummarizer,
}

impl AccountMonitor {
    pub fn new(summarizer: AccountSummarizer) -> Self {
        Self { summarizer }
    }

    #[instrument(skip(self, account_ids), fields(accounts = account_ids.len()))]
    pub async fn run(&self, account_ids: &[String]) -> MonitorReport {
        let mut accounts = Vec::with_capacity(account_ids.len());

        for account_id in account_ids {
            accounts.push(self.summarizer.summarize(account_id).await);
        }

        let report = MonitorReport {
            generated_at: Utc::now(),
            accounts,
        };
        info!(
            "🛰️ Monitored {} accounts, {} unavailable",
            report.accounts.len(),
            report.failures()
        );
        report
    }
}
