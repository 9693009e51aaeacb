//! Layered connector settings: defaults < config file < environment.

use std::fmt;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::ConfigError;

/// Which connector's section of the config file / env vars to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Discord: gateway WebSocket connector.
    Discord,
    /// Telegram: long-poll connector.
    Telegram,
}

impl Platform {
    fn toml_section(self) -> &'static str {
        match self {
            Platform::Discord => "discord",
            Platform::Telegram => "telegram",
        }
    }

    fn token_env(self) -> &'static str {
        match self {
            Platform::Discord => "DISCORD_BOT_TOKEN",
            Platform::Telegram => "TELEGRAM_BOT_TOKEN",
        }
    }
}

/// Resolved, validated settings for one connector.
///
/// Resolution order: compiled-in defaults, then `<config-dir>/chatgate/config.toml`,
/// then environment variables. A missing token is not a load error — the
/// connector frame observes it and enters `Disabled` mode.
#[derive(Clone)]
pub struct ConnectorSettings {
    /// Bot token. Empty means the connector should run disabled.
    pub token: String,
    /// Filesystem root under which per-workspace state is rooted.
    pub workspace_root: String,
    /// Discord guild allowlist for command registration; empty means global.
    pub guild_ids: Vec<String>,
    /// Telegram long-poll interval, in seconds.
    pub poll_seconds: u64,
    /// Telegram user allowlist, by numeric user ID.
    pub allowed_user_ids: Vec<u64>,
    /// Discord application ID; resolved via REST if absent.
    pub application_id: Option<String>,
    /// `tracing_subscriber::EnvFilter` directive string.
    pub log_filter: String,
}

impl fmt::Debug for ConnectorSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectorSettings")
            .field("token", &"[REDACTED]")
            .field("workspace_root", &self.workspace_root)
            .field("guild_ids", &self.guild_ids)
            .field("poll_seconds", &self.poll_seconds)
            .field("allowed_user_ids", &self.allowed_user_ids)
            .field("application_id", &self.application_id)
            .field("log_filter", &self.log_filter)
            .finish()
    }
}

impl ConnectorSettings {
    fn defaults() -> Self {
        Self {
            token: String::new(),
            workspace_root: String::new(),
            guild_ids: Vec::new(),
            poll_seconds: 25,
            allowed_user_ids: Vec::new(),
            application_id: None,
            log_filter: "warn,chatgate=info".to_string(),
        }
    }

    /// True when `user_id` is in the allowlist, or the allowlist is empty
    /// (meaning "allow anyone").
    pub fn is_user_allowed(&self, user_id: u64) -> bool {
        self.allowed_user_ids.is_empty() || self.allowed_user_ids.contains(&user_id)
    }
}

#[derive(Debug, Default, Deserialize)]
struct PartialSettings {
    token: Option<String>,
    workspace_root: Option<String>,
    guild_ids: Option<Vec<String>>,
    poll_seconds: Option<u64>,
    allowed_user_ids: Option<Vec<u64>>,
    application_id: Option<String>,
    log_filter: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    discord: Option<PartialSettings>,
    telegram: Option<PartialSettings>,
}

fn default_config_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|dirs| dirs.config_dir().join("chatgate").join("config.toml"))
}

fn apply_partial(settings: &mut ConnectorSettings, partial: PartialSettings) {
    if let Some(token) = partial.token {
        settings.token = token;
    }
    if let Some(workspace_root) = partial.workspace_root {
        settings.workspace_root = workspace_root;
    }
    if let Some(guild_ids) = partial.guild_ids {
        settings.guild_ids = guild_ids;
    }
    if let Some(poll_seconds) = partial.poll_seconds {
        settings.poll_seconds = poll_seconds;
    }
    if let Some(allowed_user_ids) = partial.allowed_user_ids {
        settings.allowed_user_ids = allowed_user_ids;
    }
    if let Some(application_id) = partial.application_id {
        settings.application_id = Some(application_id);
    }
    if let Some(log_filter) = partial.log_filter {
        settings.log_filter = log_filter;
    }
}

fn parse_comma_list<T, F>(raw: &str, parse: F) -> Vec<T>
where
    F: Fn(&str) -> Option<T>,
{
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|entry| {
            let parsed = parse(entry);
            if parsed.is_none() {
                tracing::warn!(entry, "skipping unparseable list entry in environment override");
            }
            parsed
        })
        .collect()
}

fn apply_env(settings: &mut ConnectorSettings, platform: Platform) {
    if let Ok(token) = std::env::var(platform.token_env()) {
        settings.token = token;
    }
    if let Ok(workspace_root) = std::env::var("CHATGATE_WORKSPACE_ROOT") {
        settings.workspace_root = workspace_root;
    }
    if let Ok(log_filter) = std::env::var("CHATGATE_LOG_FILTER") {
        settings.log_filter = log_filter;
    }
    match platform {
        Platform::Discord => {
            if let Ok(raw) = std::env::var("DISCORD_GUILD_IDS") {
                settings.guild_ids = parse_comma_list(&raw, |s| Some(s.to_string()));
            }
        },
        Platform::Telegram => {
            if let Ok(raw) = std::env::var("TELEGRAM_ALLOWED_USERS") {
                settings.allowed_user_ids = parse_comma_list(&raw, |s| s.parse::<u64>().ok());
            }
        },
    }
}

fn validate(settings: &ConnectorSettings) -> Result<(), ConfigError> {
    if !settings.token.is_empty() && settings.token.chars().any(char::is_whitespace) {
        return Err(ConfigError::Validation("token must not contain whitespace".to_string()));
    }
    if !(1..=300).contains(&settings.poll_seconds) {
        return Err(ConfigError::Validation(format!(
            "poll_seconds must be in 1..=300, got {}",
            settings.poll_seconds
        )));
    }
    Ok(())
}

/// Load and validate settings for `platform` using the layered resolver.
///
/// A missing config file is not an error. A malformed file, or a value
/// that fails validation after merging, aborts with a typed error.
pub fn load(platform: Platform) -> Result<ConnectorSettings, ConfigError> {
    let mut settings = ConnectorSettings::defaults();

    if let Some(path) = default_config_path() {
        if path.exists() {
            let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
                path: path.display().to_string(),
                source,
            })?;
            let file: ConfigFile = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?;
            let section = match platform {
                Platform::Discord => file.discord,
                Platform::Telegram => file.telegram,
            };
            if let Some(partial) = section {
                apply_partial(&mut settings, partial);
            }
        }
    }

    apply_env(&mut settings, platform);
    validate(&settings)?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pass_validation() {
        assert!(validate(&ConnectorSettings::defaults()).is_ok());
    }

    #[test]
    fn whitespace_token_fails_validation() {
        let mut settings = ConnectorSettings::defaults();
        settings.token = "abc def".to_string();
        assert!(matches!(validate(&settings), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn out_of_range_poll_seconds_fails_validation() {
        let mut settings = ConnectorSettings::defaults();
        settings.poll_seconds = 0;
        assert!(matches!(validate(&settings), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn env_overrides_file_partial() {
        let mut settings = ConnectorSettings::defaults();
        apply_partial(
            &mut settings,
            PartialSettings {
                token: Some("file-token".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(settings.token, "file-token");
    }

    #[test]
    fn debug_redacts_token() {
        let mut settings = ConnectorSettings::defaults();
        settings.token = "super-secret".to_string();
        let rendered = format!("{settings:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn is_user_allowed_empty_allowlist_allows_anyone() {
        let settings = ConnectorSettings::defaults();
        assert!(settings.is_user_allowed(12345));
    }

    #[test]
    fn is_user_allowed_respects_allowlist() {
        let mut settings = ConnectorSettings::defaults();
        settings.allowed_user_ids = vec![1, 2, 3];
        assert!(settings.is_user_allowed(2));
        assert!(!settings.is_user_allowed(99));
    }

    #[test]
    fn parse_comma_list_skips_bad_entries() {
        let parsed = parse_comma_list("1, 2, x, 4", |s| s.parse::<u64>().ok());
        assert_eq!(parsed, vec![1, 2, 4]);
    }
}
