//! Command execution context
//!
//! Loads configuration once and resolves credentials and clients for the
//! validation commands.

use std::path::PathBuf;

use crate::cli::{BitbucketArgs, GlobalOptions, OutputFormat};
use crate::client::{BitbucketAuth, BitbucketClient, GitHubClient};
use crate::config::Config;
use crate::error::{ConfigError, Result};
use crate::session::SessionStore;

/// Context for command execution containing config and runtime options.
pub struct CommandContext {
    /// Loaded configuration (defaults when no file exists)
    pub config: Config,
    /// Output format preference
    pub format: OutputFormat,
    session_dir: Option<PathBuf>,
}

/// First present, non-empty value.
fn pick(flag: Option<&str>, configured: Option<&str>) -> Option<String> {
    flag.into_iter()
        .chain(configured)
        .find(|v| !v.trim().is_empty())
        .map(str::to_string)
}

impl CommandContext {
    /// Load config from `--config` (or the default location).
    ///
    /// A missing file yields defaults: credentials may arrive entirely via
    /// flags and environment variables.
    pub fn new(opts: &GlobalOptions) -> Result<Self> {
        let config_path = Config::resolve_path(opts.config_ref())?;
        let config = Config::load_or_default(&config_path)?;

        Ok(Self {
            config,
            format: opts.format,
            session_dir: opts.session_dir.clone(),
        })
    }

    /// GitHub client for the source side.
    pub fn source_github(&self, token: Option<&str>, api_url: Option<&str>) -> Result<GitHubClient> {
        let github = &self.config.github;
        let token = pick(token, github.source_token.as_deref())
            .ok_or(ConfigError::MissingToken("Source GitHub"))?;
        let api_url = pick(api_url, github.source_api_url.as_deref());

        GitHubClient::new(
            token,
            api_url.as_deref(),
            self.config.preferences.client_settings(),
        )
    }

    /// GitHub client for the target side.
    pub fn target_github(&self, token: Option<&str>, api_url: Option<&str>) -> Result<GitHubClient> {
        let github = &self.config.github;
        let token = pick(token, github.target_token.as_deref())
            .ok_or(ConfigError::MissingToken("Target GitHub"))?;
        let api_url = pick(api_url, github.target_api_url.as_deref());

        GitHubClient::new(
            token,
            api_url.as_deref(),
            self.config.preferences.client_settings(),
        )
    }

    /// Bitbucket Server client. A token wins over username/password.
    pub fn bitbucket(&self, args: &BitbucketArgs) -> Result<BitbucketClient> {
        let bbs = &self.config.bitbucket;
        let url = pick(args.bbs_url.as_deref(), bbs.url.as_deref())
            .ok_or(ConfigError::MissingBitbucketUrl)?;

        let auth = if let Some(token) = pick(args.bbs_token.as_deref(), bbs.token.as_deref()) {
            BitbucketAuth::Token(token)
        } else {
            let username = pick(args.bbs_username.as_deref(), bbs.username.as_deref());
            let password = pick(args.bbs_password.as_deref(), bbs.password.as_deref());
            match (username, password) {
                (Some(username), Some(password)) => BitbucketAuth::Basic { username, password },
                _ => return Err(ConfigError::MissingToken("Bitbucket").into()),
            }
        };

        BitbucketClient::new(&url, auth, self.config.preferences.client_settings())
    }

    /// Rate limit warning threshold: flag, then config.
    pub fn rate_limit_threshold(&self, flag: Option<u64>) -> u64 {
        flag.unwrap_or(self.config.preferences.rate_limit_threshold)
    }

    /// Open the session store honoring `--session-dir`.
    pub fn sessions(&self) -> Result<SessionStore> {
        Ok(SessionStore::open(self.session_dir.as_deref())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use tempfile::TempDir;

    fn context(config: Config) -> CommandContext {
        CommandContext {
            config,
            format: OutputFormat::Pretty,
            session_dir: None,
        }
    }

    fn bitbucket_args() -> BitbucketArgs {
        BitbucketArgs {
            bbs_url: None,
            bbs_project: "PROJ".to_string(),
            bbs_repo: "api".to_string(),
            bbs_token: None,
            bbs_username: None,
            bbs_password: None,
            target_org: "octo".to_string(),
            target_repo: "api".to_string(),
            target_token: None,
            target_api_url: None,
            branch_permissions_hard_fail: false,
            common: Default::default(),
        }
    }

    #[test]
    fn test_pick_prefers_flag_and_skips_blank() {
        assert_eq!(pick(Some("flag"), Some("cfg")), Some("flag".to_string()));
        assert_eq!(pick(Some("  "), Some("cfg")), Some("cfg".to_string()));
        assert_eq!(pick(None, None), None);
    }

    #[test]
    fn test_missing_target_token() {
        let ctx = context(Config::default());
        let err = ctx.target_github(None, None).err().unwrap();
        assert!(matches!(
            err,
            Error::Config(ConfigError::MissingToken("Target GitHub"))
        ));
    }

    #[test]
    fn test_tokens_from_config() {
        let mut config = Config::default();
        config.github.source_token = Some("src".to_string());
        config.github.target_token = Some("tgt".to_string());
        config.github.source_api_url = Some("https://ghes.example.com/api/v3/".to_string());
        let ctx = context(config);

        let source = ctx.source_github(None, None).unwrap();
        assert_eq!(source.api_url(), "https://ghes.example.com/api/v3");
        assert!(ctx.target_github(None, None).is_ok());
    }

    #[test]
    fn test_bitbucket_requires_url_and_credentials() {
        let ctx = context(Config::default());
        let mut args = bitbucket_args();

        let err = ctx.bitbucket(&args).err().unwrap();
        assert!(matches!(err, Error::Config(ConfigError::MissingBitbucketUrl)));

        args.bbs_url = Some("https://bitbucket.example.com".to_string());
        args.bbs_username = Some("admin".to_string());
        let err = ctx.bitbucket(&args).err().unwrap();
        assert!(matches!(err, Error::Config(ConfigError::MissingToken("Bitbucket"))));

        args.bbs_password = Some("secret".to_string());
        assert!(ctx.bitbucket(&args).is_ok());
    }

    #[test]
    fn test_rate_limit_threshold_flag_overrides_config() {
        let ctx = context(Config::default());
        assert_eq!(ctx.rate_limit_threshold(None), 50);
        assert_eq!(ctx.rate_limit_threshold(Some(0)), 0);
    }

    #[test]
    fn test_new_without_config_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let opts = GlobalOptions {
            config: Some(dir.path().join("missing.yaml")),
            session_dir: Some(dir.path().join("sessions")),
            ..Default::default()
        };

        let ctx = CommandContext::new(&opts).unwrap();
        assert_eq!(ctx.config, Config::default());
        assert!(ctx.sessions().unwrap().path().ends_with("sessions.db"));
    }
}
