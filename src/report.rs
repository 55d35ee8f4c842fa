// Rendering of run results. Components return data; only this module prints.

use clap::ValueEnum;
use serde::Serialize;
use std::io::Write;

use crate::batch::{BatchReport, BatchStatus};
use crate::error::AppResult;
use crate::funding::{FundingOutcome, NewAccount};
use crate::monitor::MonitorReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// First characters of an account id, enough to tell accounts apart
fn short_id(id: &str) -> &str {
    id.get(..12).unwrap_or(id)
}

fn write_json<T: Serialize, W: Write>(value: &T, out: &mut W) -> AppResult<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

pub fn render_monitor<W: Write>(
    report: &MonitorReport,
    format: OutputFormat,
    out: &mut W,
) -> AppResult<()> {
    if format == OutputFormat::Json {
        return write_json(report, out);
    }

    writeln!(out, "\n=== ACCOUNT MONITOR ===\n")?;
    for account in &report.accounts {
        writeln!(out, "Account: {}...", short_id(&account.account_id))?;
        if let Some(error) = account.error() {
            writeln!(out, "  Error: {}\n", error)?;
            continue;
        }
        writeln!(out, "  Balance: {} XLM", account.native_balance().unwrap_or("-"))?;
        writeln!(out, "  Trustlines: {}", account.trustline_count().unwrap_or_default())?;
        writeln!(out, "  Sequence: {}\n", account.sequence().unwrap_or_default())?;
    }
    writeln!(out, "=== End of monitoring ===")?;
    Ok(())
}

pub fn render_batch<W: Write>(
    report: &BatchReport,
    format: OutputFormat,
    out: &mut W,
) -> AppResult<()> {
    if format == OutputFormat::Json {
        return write_json(report, out);
    }

    writeln!(out, "\n=== PAYMENT BATCH {} ===", report.run_id)?;
    writeln!(out, "Source: {}\n", report.source)?;

    for outcome in &report.outcomes {
        let position = format!("[{}/{}]", outcome.index + 1, report.total);
        match (outcome.result.hash(), outcome.result.error()) {
            (Some(hash), _) => writeln!(
                out,
                "{} OK   {} XLM to {} memo {:?}\n       hash {}",
                position, outcome.amount, outcome.destination, outcome.memo, hash
            )?,
            (None, error) => writeln!(
                out,
                "{} FAIL {} XLM to {} memo {:?}\n       error: {}",
                position,
                outcome.amount,
                outcome.destination,
                outcome.memo,
                error.unwrap_or_default()
            )?,
        }
    }

    match &report.result {
        BatchStatus::Completed => {
            writeln!(out, "\nAll {} payments processed.", report.total)?;
        }
        BatchStatus::Interrupted {
            index,
            destination,
            reason,
        } => {
            writeln!(
                out,
                "\nInterrupted at payment {}/{}: error sending to {}: {}",
                index + 1,
                report.total,
                destination,
                reason
            )?;
        }
    }
    Ok(())
}

pub fn render_accounts<W: Write>(
    accounts: &[NewAccount],
    format: OutputFormat,
    out: &mut W,
) -> AppResult<()> {
    if format == OutputFormat::Json {
        return write_json(&accounts, out);
    }

    for (n, account) in accounts.iter().enumerate() {
        writeln!(out, "\nAccount {}", n + 1)?;
        writeln!(out, "  Public key: {}", account.public_key)?;
        writeln!(out, "  Secret key: {}", account.secret_seed)?;
        match &account.funding {
            Some(FundingOutcome::Funded { hash }) => writeln!(out, "  Funded: {}", hash)?,
            Some(FundingOutcome::Failed { error }) => writeln!(out, "  Funding failed: {}", error)?,
            None => {}
        }
    }
    if !accounts.is_empty() {
        writeln!(out, "\nKeep the secret keys safe: they are not stored anywhere.")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::orchestrator::PaymentOutcome;
    use crate::execution::submitter::SubmissionResult;
    use crate::monitor::summarizer::{AccountReport, AccountStatus, NOT_FOUND_MESSAGE};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    const FUNDED: &str = "GA74ICXS227XU5SXFTZXQWNHWCTMUBJM2FCFXDAO3V2KTDH4E7WQWSS5";
    const UNFUNDED: &str = "GC4NA75MPXPVZD26HMIWCG5GPZU4COFFAAHLLZ4DKAZFZS3XWIDZ35HJ";

    fn render<F: FnOnce(&mut Vec<u8>) -> AppResult<()>>(f: F) -> String {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn monitor_report() -> MonitorReport {
        MonitorReport {
            generated_at: Utc::now(),
            accounts: vec![
                AccountReport {
                    account_id: FUNDED.to_string(),
                    status: AccountStatus::Found {
                        native_balance: Some("100.0".to_string()),
                        trustline_count: 1,
                        sequence: 42,
                    },
                },
                AccountReport {
                    account_id: UNFUNDED.to_string(),
                    status: AccountStatus::Unavailable {
                        error: NOT_FOUND_MESSAGE.to_string(),
                    },
                },
            ],
        }
    }

    #[test]
    fn test_monitor_text() {
        let text = render(|out| render_monitor(&monitor_report(), OutputFormat::Text, out));

        assert!(text.contains("Account: GA74ICXS227X..."));
        assert!(text.contains("  Balance: 100.0 XLM"));
        assert!(text.contains("  Trustlines: 1"));
        assert!(text.contains("  Sequence: 42"));
        assert!(text.contains(&format!("  Error: {}", NOT_FOUND_MESSAGE)));
    }

    #[test]
    fn test_monitor_json() {
        let text = render(|out| render_monitor(&monitor_report(), OutputFormat::Json, out));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["accounts"][0]["trustline_count"], 1);
        assert_eq!(value["accounts"][1]["error"], NOT_FOUND_MESSAGE);
    }

    #[test]
    fn test_interrupted_batch_text() {
        let report = BatchReport {
            run_id: uuid::Uuid::new_v4(),
            source: "GSOURCE".to_string(),
            total: 3,
            started_at: Utc::now(),
            finished_at: Utc::now(),
            outcomes: vec![
                PaymentOutcome {
                    index: 0,
                    destination: "GD1".to_string(),
                    memo: "m1".to_string(),
                    amount: dec!(2),
                    result: SubmissionResult::Accepted {
                        hash: "h1".to_string(),
                    },
                },
                PaymentOutcome {
                    index: 1,
                    destination: "GD2".to_string(),
                    memo: "m2".to_string(),
                    amount: dec!(2),
                    result: SubmissionResult::Failed {
                        error: "insufficient balance".to_string(),
                    },
                },
            ],
            result: BatchStatus::Interrupted {
                index: 1,
                destination: "GD2".to_string(),
                reason: "insufficient balance".to_string(),
            },
        };

        let text = render(|out| render_batch(&report, OutputFormat::Text, out));

        assert!(text.contains("[1/3] OK   2 XLM to GD1"));
        assert!(text.contains("hash h1"));
        assert!(text.contains("[2/3] FAIL 2 XLM to GD2"));
        assert!(text.contains(
            "Interrupted at payment 2/3: error sending to GD2: insufficient balance"
        ));
        assert!(!text.contains("[3/3]"));
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("GA74ICXS227XU5SX"), "GA74ICXS227X");
        assert_eq!(short_id("GABC"), "GABC");
    }
}
