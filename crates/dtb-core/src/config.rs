use std::{
    collections::HashSet,
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;

use crate::{context::DEFAULT_STEP_BUDGET, errors::Error, usage::types::InstanceMapping, Result};

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
pub const DEFAULT_ACCOUNT_BASE_URL: &str = "https://dler.cloud/api/v1/";
pub const DEFAULT_HOSTING_BASE_URL: &str = "https://api.vultr.com/v2/";
const DEFAULT_POLL_TIMEOUT_SECS: u64 = 10;

/// Typed configuration, loaded once at startup.
///
/// Anything malformed here is fatal: the bot refuses to start.
#[derive(Clone, Debug)]
pub struct Config {
    // Telegram
    pub telegram_bot_token: String,
    pub allowed_recipient: String,
    pub poll_timeout: Duration,

    // Subscription account
    pub account_email: String,
    pub account_password: String,
    pub account_base_url: String,

    // Hosting
    pub hosting_enabled: bool,
    pub hosting_api_key: Option<String>,
    pub hosting_base_url: String,
    pub instances: Vec<InstanceMapping>,

    // Runtime
    pub step_timeout: Duration,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct FileConfig {
    #[serde(default)]
    telegram: TelegramSection,
    #[serde(default)]
    dler_cloud: AccountSection,
    #[serde(default)]
    vultr: HostingSection,
    #[serde(default)]
    runtime: RuntimeSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct TelegramSection {
    #[serde(default)]
    bot_token: String,
    #[serde(default)]
    allowed_recipient: String,
    poll_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct AccountSection {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
    base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct HostingSection {
    #[serde(default)]
    enabled: bool,
    api_key: Option<String>,
    base_url: Option<String>,
    #[serde(default)]
    instances: Vec<InstanceEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct InstanceEntry {
    name: String,
    instance_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RuntimeSection {
    step_timeout_ms: Option<u64>,
}

impl Config {
    /// Load from the path given on the command line, `DTB_CONFIG`, or `config.toml`.
    pub fn load() -> Result<Self> {
        let path = env::args_os()
            .nth(1)
            .map(PathBuf::from)
            .or_else(|| env::var_os("DTB_CONFIG").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
        Self::from_file(&path)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read config file {}: {e}", path.display()))
        })?;
        let mut file = parse_file(&text)?;
        apply_env_overrides(&mut file, env_str);
        Self::from_parts(file)
    }

    /// Parse TOML text without consulting the environment.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Self::from_parts(parse_file(text)?)
    }

    fn from_parts(file: FileConfig) -> Result<Self> {
        let FileConfig {
            telegram,
            dler_cloud,
            vultr,
            runtime,
        } = file;

        let telegram_bot_token = required(telegram.bot_token, "telegram.bot-token")?;
        let allowed_recipient =
            required(telegram.allowed_recipient, "telegram.allowed-recipient")?;
        let account_email = required(dler_cloud.email, "dler-cloud.email")?;
        let account_password = required(dler_cloud.password, "dler-cloud.password")?;

        let hosting_api_key = vultr.api_key.and_then(non_empty);
        if vultr.enabled && hosting_api_key.is_none() {
            return Err(Error::Config(
                "vultr.api-key is required when vultr.enabled = true".to_string(),
            ));
        }

        let instances = vultr
            .instances
            .into_iter()
            .map(|e| InstanceMapping {
                name: e.name.trim().to_string(),
                instance_id: e.instance_id.trim().to_string(),
            })
            .collect::<Vec<_>>();
        validate_instances(&instances)?;

        let step_timeout = runtime
            .step_timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_STEP_BUDGET);
        if step_timeout.is_zero() {
            return Err(Error::Config(
                "runtime.step-timeout-ms must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            telegram_bot_token,
            allowed_recipient,
            poll_timeout: Duration::from_secs(
                telegram
                    .poll_timeout_secs
                    .unwrap_or(DEFAULT_POLL_TIMEOUT_SECS),
            ),
            account_email,
            account_password,
            account_base_url: base_url(dler_cloud.base_url, DEFAULT_ACCOUNT_BASE_URL),
            hosting_enabled: vultr.enabled,
            hosting_api_key,
            hosting_base_url: base_url(vultr.base_url, DEFAULT_HOSTING_BASE_URL),
            instances,
            step_timeout,
        })
    }
}

fn parse_file(text: &str) -> Result<FileConfig> {
    toml::from_str(text).map_err(|e| Error::Config(format!("invalid config: {e}")))
}

/// Secrets may come from the environment instead of the file.
fn apply_env_overrides(file: &mut FileConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("TELEGRAM_BOT_TOKEN").and_then(non_empty) {
        file.telegram.bot_token = v;
    }
    if let Some(v) = lookup("DLER_EMAIL").and_then(non_empty) {
        file.dler_cloud.email = v;
    }
    if let Some(v) = lookup("DLER_PASSWORD").and_then(non_empty) {
        file.dler_cloud.password = v;
    }
    if let Some(v) = lookup("VULTR_API_KEY").and_then(non_empty) {
        file.vultr.api_key = Some(v);
    }
}

fn validate_instances(instances: &[InstanceMapping]) -> Result<()> {
    let mut names = HashSet::new();
    let mut ids = HashSet::new();
    for m in instances {
        if m.name.is_empty() || m.instance_id.is_empty() {
            return Err(Error::Config(
                "vultr.instances entries need a non-empty name and instance-id".to_string(),
            ));
        }
        if !names.insert(m.name.as_str()) {
            return Err(Error::Config(format!(
                "duplicate vultr instance name: {}",
                m.name
            )));
        }
        if !ids.insert(m.instance_id.as_str()) {
            return Err(Error::Config(format!(
                "duplicate vultr instance-id: {}",
                m.instance_id
            )));
        }
    }
    Ok(())
}

fn required(value: String, key: &str) -> Result<String> {
    non_empty(value).ok_or_else(|| Error::Config(format!("{key} is required")))
}

/// Normalizes to a trailing slash so relative endpoint paths join correctly.
fn base_url(value: Option<String>, default: &str) -> String {
    let mut url = value.and_then(non_empty).unwrap_or_else(|| default.to_string());
    if !url.ends_with('/') {
        url.push('/');
    }
    url
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn non_empty(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
[telegram]
bot-token = "123:abc"
allowed-recipient = "987654"

[dler-cloud]
email = "me@example.com"
password = "hunter2"

[vultr]
enabled = true
api-key = "KEY"
base-url = "http://127.0.0.1:9000/v2"

[[vultr.instances]]
name = "tokyo"
instance-id = "cb676a46"

[[vultr.instances]]
name = "la"
instance-id = "0d2a8c11"

[runtime]
step-timeout-ms = 2500
"#;

    #[test]
    fn parses_full_config_in_order() {
        let cfg = Config::from_toml_str(FULL).unwrap();
        assert_eq!(cfg.telegram_bot_token, "123:abc");
        assert_eq!(cfg.allowed_recipient, "987654");
        assert_eq!(cfg.account_base_url, DEFAULT_ACCOUNT_BASE_URL);
        assert_eq!(cfg.hosting_base_url, "http://127.0.0.1:9000/v2/");
        assert!(cfg.hosting_enabled);
        assert_eq!(cfg.hosting_api_key.as_deref(), Some("KEY"));
        assert_eq!(
            cfg.instances,
            vec![
                InstanceMapping::new("tokyo", "cb676a46"),
                InstanceMapping::new("la", "0d2a8c11"),
            ]
        );
        assert_eq!(cfg.step_timeout, Duration::from_millis(2500));
        assert_eq!(cfg.poll_timeout, Duration::from_secs(10));
    }

    #[test]
    fn hosting_section_is_optional() {
        let cfg = Config::from_toml_str(
            r#"
[telegram]
bot-token = "t"
allowed-recipient = "@me"

[dler-cloud]
email = "e"
password = "p"
"#,
        )
        .unwrap();
        assert!(!cfg.hosting_enabled);
        assert!(cfg.instances.is_empty());
        assert_eq!(cfg.step_timeout, DEFAULT_STEP_BUDGET);
    }

    #[test]
    fn missing_credentials_are_fatal() {
        let err = Config::from_toml_str("[telegram]\nbot-token = \"t\"\nallowed-recipient = \"1\"")
            .unwrap_err();
        assert!(matches!(err, Error::Config(ref m) if m.contains("dler-cloud.email")));
    }

    #[test]
    fn enabled_hosting_needs_api_key() {
        let text = FULL.replace("api-key = \"KEY\"\n", "");
        let err = Config::from_toml_str(&text).unwrap_err();
        assert!(matches!(err, Error::Config(ref m) if m.contains("api-key")));
    }

    #[test]
    fn duplicate_instance_names_are_rejected() {
        let text = FULL.replace("name = \"la\"", "name = \"tokyo\"");
        let err = Config::from_toml_str(&text).unwrap_err();
        assert!(matches!(err, Error::Config(ref m) if m.contains("duplicate")));
    }

    #[test]
    fn env_overrides_replace_secrets_but_not_blank_values() {
        let text = FULL.replace("bot-token = \"123:abc\"\n", "");
        let mut file = parse_file(&text).unwrap();
        apply_env_overrides(&mut file, |key| match key {
            "TELEGRAM_BOT_TOKEN" => Some(" 999:env ".to_string()),
            "DLER_PASSWORD" => Some("from-env".to_string()),
            "VULTR_API_KEY" => Some("   ".to_string()),
            _ => None,
        });
        let cfg = Config::from_parts(file).unwrap();

        assert_eq!(cfg.telegram_bot_token, "999:env");
        assert_eq!(cfg.account_email, "me@example.com");
        assert_eq!(cfg.account_password, "from-env");
        assert_eq!(cfg.hosting_api_key.as_deref(), Some("KEY"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let text = FULL.replace("[runtime]", "[runtime]\nretries = 3");
        assert!(Config::from_toml_str(&text).is_err());
    }
}
