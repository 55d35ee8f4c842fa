use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::batch::orchestrator::DEFAULT_PAYMENT_PAUSE;
use crate::error::AppResult;
use crate::execution::builder::{BASE_FEE, DEFAULT_VALIDITY};

pub const TESTNET_HORIZON_URL: &str = "https://horizon-testnet.stellar.org";
pub const TESTNET_PASSPHRASE: &str = "Test SDF Network ; September 2015";
pub const TESTNET_FRIENDBOT_URL: &str = "https://friendbot.stellar.org";

/// Default config file name, looked up next to the working directory
pub const DEFAULT_CONFIG_FILE: &str = "stellar-ops";

/// Process configuration, read once at startup and passed down by reference
#[derive(Deserialize, Clone)]
pub struct Config {
    pub horizon_url: String,
    pub network_passphrase: String,
    pub friendbot_url: String,
    #[serde(default)]
    pub secret_key: Option<String>,
    #[serde(default)]
    pub public_key: Option<String>,
    #[serde(default)]
    pub monitored_accounts: Vec<String>,
    pub base_fee: u32,
    pub tx_timeout_secs: u64,
    pub payment_pause_ms: u64,
    pub request_timeout_secs: u64,
}

impl Config {
    /// Defaults, then the optional config file, then the environment
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        Self::load_from(path, None)
    }

    fn load_from(
        path: Option<&Path>,
        env: Option<config::Map<String, String>>,
    ) -> AppResult<Self> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let settings = config::Config::builder()
            .set_default("horizon_url", TESTNET_HORIZON_URL)?
            .set_default("network_passphrase", TESTNET_PASSPHRASE)?
            .set_default("friendbot_url", TESTNET_FRIENDBOT_URL)?
            .set_default("base_fee", i64::from(BASE_FEE))?
            .set_default("tx_timeout_secs", DEFAULT_VALIDITY.as_secs() as i64)?
            .set_default("payment_pause_ms", DEFAULT_PAYMENT_PAUSE.as_millis() as i64)?
            .set_default("request_timeout_secs", 60_i64)?
            .add_source(file)
            .add_source(
                config::Environment::default()
                    .source(env)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("monitored_accounts"),
            )
            .build()?;

        let mut config: Self = settings.try_deserialize()?;
        // `SECRET_KEY=` in an env file means unset
        config.secret_key = config.secret_key.filter(|key| !key.trim().is_empty());
        config.public_key = config.public_key.filter(|key| !key.trim().is_empty());
        Ok(config)
    }

    /// Accounts to monitor when none are named: our own first
    pub fn monitored(&self) -> Vec<String> {
        let mut accounts = Vec::new();
        for account in self.public_key.iter().chain(self.monitored_accounts.iter()) {
            let account = account.trim();
            if !account.is_empty() && !accounts.iter().any(|a| a == account) {
                accounts.push(account.to_string());
            }
        }
        accounts
    }

    pub fn tx_validity(&self) -> Duration {
        Duration::from_secs(self.tx_timeout_secs)
    }

    pub fn payment_pause(&self) -> Duration {
        Duration::from_millis(self.payment_pause_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("horizon_url", &self.horizon_url)
            .field("network_passphrase", &self.network_passphrase)
            .field("friendbot_url", &self.friendbot_url)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .field("public_key", &self.public_key)
            .field("monitored_accounts", &self.monitored_accounts)
            .field("base_fee", &self.base_fee)
            .field("tx_timeout_secs", &self.tx_timeout_secs)
            .field("payment_pause_ms", &self.payment_pause_ms)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchEntry {
    pub destination: String,
    #[serde(default)]
    pub memo: String,
}

/// Payment list: one fixed amount, ordered recipients
#[derive(Debug, Clone, Deserialize)]
pub struct BatchFile {
    pub amount: String,
    #[serde(default)]
    pub payments: Vec<BatchEntry>,
}

impl BatchFile {
    pub fn load(path: &Path) -> AppResult<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    pub fn entries(&self) -> Vec<(String, String)> {
        self.payments
            .iter()
            .map(|p| (p.destination.trim().to_string(), p.memo.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> config::Map<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn temp_file(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("{}-{}", uuid::Uuid::new_v4(), name));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_defaults() {
        let config = Config::load_from(None, Some(env(&[]))).unwrap();

        assert_eq!(config.horizon_url, TESTNET_HORIZON_URL);
        assert_eq!(config.network_passphrase, TESTNET_PASSPHRASE);
        assert_eq!(config.base_fee, 100);
        assert_eq!(config.tx_validity(), Duration::from_secs(30));
        assert_eq!(config.payment_pause(), Duration::from_secs(3));
        assert!(config.secret_key.is_none());
        assert!(config.monitored().is_empty());
    }

    #[test]
    fn test_environment_overrides_and_lists() {
        let config = Config::load_from(
            None,
            Some(env(&[
                ("HORIZON_URL", "http://localhost:8000"),
                ("SECRET_KEY", "SXXX"),
                ("PUBLIC_KEY", "GAAA"),
                ("MONITORED_ACCOUNTS", "GBBB,GAAA,GCCC"),
                ("PAYMENT_PAUSE_MS", "0"),
            ])),
        )
        .unwrap();

        assert_eq!(config.horizon_url, "http://localhost:8000");
        assert_eq!(config.payment_pause(), Duration::ZERO);
        assert_eq!(config.monitored(), vec!["GAAA", "GBBB", "GCCC"]);
        assert!(!format!("{:?}", config).contains("SXXX"));
    }

    #[test]
    fn test_blank_keys_are_unset() {
        let vars = env(&[("SECRET_KEY", ""), ("PUBLIC_KEY", "  ")]);
        let config = Config::load_from(None, Some(vars)).unwrap();

        assert!(config.secret_key.is_none());
        assert!(config.public_key.is_none());
        assert!(config.monitored().is_empty());
    }

    #[test]
    fn test_config_file_then_environment() {
        let path = temp_file(
            "stellar-ops.toml",
            "horizon_url = \"http://file:8000\"\nbase_fee = 200\n",
        );

        let config = Config::load_from(Some(&path), Some(env(&[("BASE_FEE", "300")]))).unwrap();

        assert_eq!(config.horizon_url, "http://file:8000");
        assert_eq!(config.base_fee, 300);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let path = std::env::temp_dir().join("does-not-exist-stellar-ops.toml");
        assert!(Config::load_from(Some(&path), Some(env(&[]))).is_err());
    }

    #[test]
    fn test_batch_file() {
        let path = temp_file(
            "batch.toml",
            r#"
amount = "2"

[[payments]]
destination = "GA74ICXS227XU5SXFTZXQWNHWCTMUBJM2FCFXDAO3V2KTDH4E7WQWSS5"
memo = "Pago-001-HolaLiz"

[[payments]]
destination = "GC4NA75MPXPVZD26HMIWCG5GPZU4COFFAAHLLZ4DKAZFZS3XWIDZ35HJ"
"#,
        );

        let batch = BatchFile::load(&path).unwrap();
        assert_eq!(batch.amount, "2");
        assert_eq!(
            batch.entries(),
            vec![
                (
                    "GA74ICXS227XU5SXFTZXQWNHWCTMUBJM2FCFXDAO3V2KTDH4E7WQWSS5".to_string(),
                    "Pago-001-HolaLiz".to_string()
                ),
                (
                    "GC4NA75MPXPVZD26HMIWCG5GPZU4COFFAAHLLZ4DKAZFZS3XWIDZ35HJ".to_string(),
                    String::new()
                ),
            ]
        );
        std::fs::remove_file(path).ok();
    }
}
