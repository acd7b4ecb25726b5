use crate::domain::{BotEmail, redacted};
use crate::error::BridgeError;
use config::{Config, File, FileFormat, builder::DefaultState};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::env;
use std::time::Duration;
use url::Url;

const BASE_CONFIG: &str = include_str!("../configuration/base.yaml");
const LOCAL_CONFIG: &str = include_str!("../configuration/local.yaml");
const PRODUCTION_CONFIG: &str = include_str!("../configuration/production.yaml");

const ZULIP_API_URL: &str = "ZULIP_API_URL";

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub cors: CorsSettings,
    pub github: GitHubSettings,
    pub zulip: ZulipSettings,
    pub project_streams: ProjectStreamSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorsSettings {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GitHubSettings {
    /// REST API root, e.g. `https://api.github.com`.
    pub api_url: String,
    /// Web root used when linking to releases.
    pub web_url: String,
    /// Every repository is looked up under this owner.
    pub owner: String,
    pub timeout_seconds: u64,
}

impl GitHubSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[derive(Debug, Deserialize)]
pub struct ZulipSettings {
    #[serde(default)]
    pub api_url: Option<String>,
    pub timeout_seconds: u64,
    #[serde(default)]
    pub bots: BotsSettings,
}

impl ZulipSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Resolves the chat-service credentials `bot` needs for one invocation.
    ///
    /// Checks the API key, the base URL and then the bot email; the first
    /// missing or malformed value names itself in the error.
    pub fn resolve(&self, bot: Bot) -> Result<ZulipCredentials, BridgeError> {
        let bot_settings = self.bots.get(bot);

        let api_key = bot_settings
            .api_key
            .as_ref()
            .ok_or(BridgeError::MissingConfig(bot.api_key_var()))?;

        let api_url = self
            .api_url
            .as_deref()
            .ok_or(BridgeError::MissingConfig(ZULIP_API_URL))?;
        let base_url =
            Url::parse(api_url).map_err(|e| BridgeError::InvalidConfig(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(BridgeError::InvalidConfig(format!(
                "`{ZULIP_API_URL}` must be an http(s) base URL, got {}",
                redacted(&base_url)
            )));
        }

        let email = bot_settings
            .email
            .as_deref()
            .ok_or(BridgeError::MissingConfig(bot.email_var()))?;
        let email = BotEmail::new(email).map_err(BridgeError::InvalidConfig)?;

        Ok(ZulipCredentials {
            base_url,
            email,
            api_key: SecretString::from(api_key.expose_secret().to_owned()),
        })
    }
}

/// The chat-service identity a handler posts as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bot {
    TagAnnouncement,
    ProjectStream,
    /// Shared by the badge and the touch handler.
    General,
}

impl Bot {
    pub fn api_key_var(&self) -> &'static str {
        match self {
            Bot::TagAnnouncement => "TAG_ANNOUNCEMENT_BOT_ZULIP_API_KEY",
            Bot::ProjectStream => "PROJECT_STREAM_BOT_ZULIP_API_KEY",
            Bot::General => "ZULIP_API_KEY",
        }
    }

    pub fn email_var(&self) -> &'static str {
        match self {
            Bot::TagAnnouncement => "TAG_ANNOUNCEMENT_BOT_ZULIP_EMAIL",
            Bot::ProjectStream => "PROJECT_STREAM_BOT_ZULIP_EMAIL",
            Bot::General => "ZULIP_EMAIL",
        }
    }

    fn settings_key(&self) -> &'static str {
        match self {
            Bot::TagAnnouncement => "tag_announcement",
            Bot::ProjectStream => "project_stream",
            Bot::General => "general",
        }
    }

    const ALL: [Bot; 3] = [Bot::TagAnnouncement, Bot::ProjectStream, Bot::General];
}

#[derive(Debug, Default, Deserialize)]
pub struct BotsSettings {
    #[serde(default)]
    pub tag_announcement: BotSettings,
    #[serde(default)]
    pub project_stream: BotSettings,
    #[serde(default)]
    pub general: BotSettings,
}

impl BotsSettings {
    pub fn get(&self, bot: Bot) -> &BotSettings {
        match bot {
            Bot::TagAnnouncement => &self.tag_announcement,
            Bot::ProjectStream => &self.project_stream,
            Bot::General => &self.general,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct BotSettings {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_secret")]
    pub api_key: Option<SecretString>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProjectStreamSettings {
    /// Chat user ids subscribed to every project stream.
    pub maintainer_ids: Vec<u64>,
    /// Sends `is_web_public=true`. Not available on Zulip's free plan.
    pub web_public: bool,
    /// Answers the touch handler with 200 whatever Zulip says.
    pub lenient_touch: bool,
}

/// Everything needed to authenticate against the chat service.
#[derive(Debug)]
pub struct ZulipCredentials {
    pub base_url: Url,
    pub email: BotEmail,
    pub api_key: SecretString,
}

fn deserialize_optional_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = Option::<String>::deserialize(deserializer)?;
    Ok(s.map(SecretString::from))
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    dotenvy::dotenv().ok();

    let environment = get_environment()?;
    build_configuration(environment)
}

fn get_environment() -> Result<Environment, config::ConfigError> {
    let env_var = env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "local".to_string());

    env_var
        .try_into()
        .map_err(|_| config::ConfigError::NotFound("Failed to parse APP_ENVIRONMENT".to_string()))
}

fn build_configuration(environment: Environment) -> Result<Settings, config::ConfigError> {
    let environment_config = match environment {
        Environment::Local => LOCAL_CONFIG,
        Environment::Production => PRODUCTION_CONFIG,
    };

    let builder = Config::builder()
        .add_source(File::from_str(BASE_CONFIG, FileFormat::Yaml))
        .add_source(File::from_str(environment_config, FileFormat::Yaml))
        .add_source(config::Environment::with_prefix("APP").separator("__"));

    with_legacy_variables(builder)?
        .build()?
        .try_deserialize::<Settings>()
}

/// The deployed functions read these names directly; they take precedence over everything else.
fn with_legacy_variables(
    mut builder: config::ConfigBuilder<DefaultState>,
) -> Result<config::ConfigBuilder<DefaultState>, config::ConfigError> {
    builder = builder.set_override_option("zulip.api_url", env::var(ZULIP_API_URL).ok())?;
    for bot in Bot::ALL {
        let key = bot.settings_key();
        builder = builder
            .set_override_option(
                format!("zulip.bots.{key}.api_key"),
                env::var(bot.api_key_var()).ok(),
            )?
            .set_override_option(
                format!("zulip.bots.{key}.email"),
                env::var(bot.email_var()).ok(),
            )?;
    }
    Ok(builder)
}

#[derive(Debug, PartialEq, Eq)]
pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{other} is not a supported environment. Use either `local` or `production`."
            )),
        }
    }
}
