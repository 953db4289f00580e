//! Settings shared by all subcommands. Each one can be given as option or environment variable.

use crate::browser::System;

use std::fmt;
use std::time::Duration;
use structopt::StructOpt;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_DOC_CATEGORY: &str = "General";
pub const DEFAULT_NOTE_CATEGORY: &str = "Ideas";
pub const DEFAULT_TIMEOUT: u64 = 30;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigErr {
    #[error("No {what} given either as option or via the {var} environment variable")]
    Missing {
        what: &'static str,
        var: &'static str,
    },
}

type Result<T, E = ConfigErr> = std::result::Result<T, E>;

// No Debug impl: contains the access token
#[derive(Clone, StructOpt)]
pub struct Config {
    /// Repository owner (user or organization)
    #[structopt(long, global = true, env = "GHPM_REPO_OWNER", value_name = "OWNER")]
    pub owner: Option<String>,
    /// Repository name
    #[structopt(long, global = true, env = "GHPM_REPO_NAME", value_name = "NAME")]
    pub name: Option<String>,
    /// GitHub personal access token
    #[structopt(
        long,
        global = true,
        env = "GHPM_PAT",
        hide_env_values = true,
        value_name = "TOKEN"
    )]
    pub token: Option<String>,
    /// Discussion category for DOCs
    #[structopt(
        long,
        global = true,
        env = "GHPM_DOC_CAT",
        default_value = DEFAULT_DOC_CATEGORY,
        value_name = "CATEGORY"
    )]
    pub doc_category: String,
    /// Discussion category for NOTEs
    #[structopt(
        long,
        global = true,
        env = "GHPM_NOTE_CAT",
        default_value = DEFAULT_NOTE_CATEGORY,
        value_name = "CATEGORY"
    )]
    pub note_category: String,
    /// URL opened by `ghpm open` [default: repository web page]
    #[structopt(long, global = true, env = "GHPM_OPEN_URL", value_name = "URL")]
    pub open_url: Option<String>,
    /// Label attached to each TODO issue
    #[structopt(long, global = true, env = "GHPM_TODO_LABEL", value_name = "LABEL")]
    pub todo_label: Option<String>,
    /// GitHub API base URL
    #[structopt(
        long,
        global = true,
        env = "GHPM_API_URL",
        default_value = DEFAULT_API_URL,
        value_name = "URL"
    )]
    pub api_url: String,
    /// HTTP request timeout
    #[structopt(
        long,
        global = true,
        env = "GHPM_TIMEOUT",
        default_value = "30",
        value_name = "SECS"
    )]
    pub timeout: u64,
    /// Command used to open URLs [default: platform URL handler]
    #[structopt(long, global = true, env = "GHPM_BROWSER", value_name = "CMD")]
    pub browser: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            owner: None,
            name: None,
            token: None,
            doc_category: DEFAULT_DOC_CATEGORY.into(),
            note_category: DEFAULT_NOTE_CATEGORY.into(),
            open_url: None,
            todo_label: None,
            api_url: DEFAULT_API_URL.into(),
            timeout: DEFAULT_TIMEOUT,
            browser: None,
        }
    }
}

fn required<'a>(val: &'a Option<String>, what: &'static str, var: &'static str) -> Result<&'a str> {
    match val.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ConfigErr::Missing { what, var }),
    }
}

impl Config {
    /// Repository and credentials for API access
    pub fn target(&self) -> Result<Target> {
        Target::new(
            required(&self.owner, "repository owner", "GHPM_REPO_OWNER")?,
            required(&self.name, "repository name", "GHPM_REPO_NAME")?,
            required(&self.token, "GitHub access token", "GHPM_PAT")?,
        )
    }

    /// Configured open URL or the repository's web page
    pub fn open_url(&self) -> Result<String> {
        if let Some(url) = self.open_url.as_deref().filter(|u| !u.trim().is_empty()) {
            return Ok(url.to_owned());
        }
        Ok(format!(
            "https://github.com/{}/{}",
            required(&self.owner, "repository owner", "GHPM_REPO_OWNER")?,
            required(&self.name, "repository name", "GHPM_REPO_NAME")?
        ))
    }

    pub fn api_url(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn browser(&self) -> System {
        match &self.browser {
            Some(cmd) if !cmd.trim().is_empty() => System::with_command(cmd),
            _ => System::new(),
        }
    }
}

/// Repository to work on plus the access token. The token never shows up in formatted output.
#[derive(Clone, PartialEq, Eq)]
pub struct Target {
    pub owner: String,
    pub name: String,
    token: String,
}

impl Target {
    pub fn new(owner: &str, name: &str, token: &str) -> Result<Self> {
        if owner.is_empty() {
            return Err(ConfigErr::Missing {
                what: "repository owner",
                var: "GHPM_REPO_OWNER",
            });
        }
        if name.is_empty() {
            return Err(ConfigErr::Missing {
                what: "repository name",
                var: "GHPM_REPO_NAME",
            });
        }
        if token.is_empty() {
            return Err(ConfigErr::Missing {
                what: "GitHub access token",
                var: "GHPM_PAT",
            });
        }
        Ok(Self {
            owner: owner.to_owned(),
            name: name.to_owned(),
            token: token.to_owned(),
        })
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Target")
            .field("owner", &self.owner)
            .field("name", &self.name)
            .field("token", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_matches::assert_matches;
    use std::env;

    fn cfg() -> Config {
        Config {
            owner: Some("owner".into()),
            name: Some("repo".into()),
            token: Some("s3cr3t".into()),
            ..Config::default()
        }
    }

    #[test]
    fn complete_target() {
        let t = cfg().target().unwrap();
        assert_eq!(t.to_string(), "owner/repo");
        assert_eq!(t.token(), "s3cr3t");
    }

    #[test]
    fn missing_settings() {
        assert_matches!(
            Config {
                token: None,
                ..cfg()
            }
            .target(),
            Err(ConfigErr::Missing { var: "GHPM_PAT", .. })
        );
        assert_matches!(
            Config {
                owner: Some("  ".into()),
                ..cfg()
            }
            .target(),
            Err(ConfigErr::Missing {
                var: "GHPM_REPO_OWNER",
                ..
            })
        );
        assert_matches!(
            Config::default().target(),
            Err(ConfigErr::Missing { .. })
        );
    }

    #[test]
    fn token_is_redacted() {
        let t = cfg().target().unwrap();
        let dbg = format!("{:?}", t);
        assert!(dbg.contains("owner"));
        assert!(!dbg.contains("s3cr3t"));
        assert!(!t.to_string().contains("s3cr3t"));
    }

    #[test]
    fn error_message_does_not_contain_values() {
        let err = Config {
            name: None,
            ..cfg()
        }
        .target()
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "No repository name given either as option or via the GHPM_REPO_NAME environment \
             variable"
        );
    }

    #[test]
    fn open_url_defaults_to_repo_page() {
        assert_eq!(cfg().open_url().unwrap(), "https://github.com/owner/repo");
        let c = Config {
            open_url: Some("https://github.com/orgs/owner/projects/1".into()),
            ..Config::default()
        };
        assert_eq!(
            c.open_url().unwrap(),
            "https://github.com/orgs/owner/projects/1"
        );
        assert!(Config::default().open_url().is_err());
    }

    #[test]
    fn open_url_needs_no_token() {
        let c = Config {
            token: None,
            ..cfg()
        };
        assert!(c.open_url().is_ok());
    }

    #[test]
    fn api_url_without_trailing_slash() {
        let c = Config {
            api_url: "https://ghe.example.com/api/v3/".into(),
            ..Config::default()
        };
        assert_eq!(c.api_url(), "https://ghe.example.com/api/v3");
    }

    #[test]
    fn parse_options() {
        let c = Config::from_iter_safe(&[
            "ghpm",
            "--owner",
            "o",
            "--name",
            "n",
            "--timeout",
            "5",
            "--note-category",
            "Show and tell",
        ])
        .unwrap();
        assert_eq!(c.owner.as_deref(), Some("o"));
        assert_eq!(c.timeout(), Duration::from_secs(5));
        assert_eq!(c.note_category, "Show and tell");
    }

    #[test]
    fn option_defaults_match_default_impl() {
        let c = Config::from_iter_safe(&["ghpm"]).unwrap();
        let d = Config::default();
        // environment may legitimately override single settings
        if env::var_os("GHPM_API_URL").is_none() {
            assert_eq!(c.api_url, d.api_url);
        }
        if env::var_os("GHPM_DOC_CAT").is_none() {
            assert_eq!(c.doc_category, d.doc_category);
        }
        if env::var_os("GHPM_NOTE_CAT").is_none() {
            assert_eq!(c.note_category, d.note_category);
        }
        if env::var_os("GHPM_TIMEOUT").is_none() {
            assert_eq!(c.timeout, d.timeout);
        }
    }

    #[test]
    fn browser_override() {
        let c = Config {
            browser: Some("firefox".into()),
            ..Config::default()
        };
        assert_eq!(c.browser(), System::with_command("firefox"));
    }
}
