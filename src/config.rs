use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::indicator::FlashPattern;
use crate::matchday::PollSettings;

/// Flashes a light when the tracked team scores
#[derive(Parser, Debug, Clone)]
#[command(name = "goal-light", version, about)]
pub struct Config {
    /// Two-line credentials file: API key on line 1, team id on line 2
    #[arg(
        long,
        env = "GOAL_LIGHT_CONFIG",
        default_value = "/home/pi/goal-light/config.txt"
    )]
    pub config_file: PathBuf,

    /// File holding the fixture id between the discovery and polling runs
    #[arg(
        long,
        env = "GOAL_LIGHT_STATE",
        default_value = "/home/pi/goal-light/fixture.txt"
    )]
    pub state_file: PathBuf,

    /// Directory for the daily log files
    #[arg(
        long,
        env = "GOAL_LIGHT_LOG_DIR",
        default_value = "/home/pi/goal-light/logs"
    )]
    pub log_dir: PathBuf,

    /// API-Football base URL
    #[arg(
        long,
        env = "API_FOOTBALL_URL",
        default_value = "https://v3.football.api-sports.io"
    )]
    pub api_url: String,

    /// Timezone the provider should report kickoff times in
    #[arg(long, env = "FIXTURE_TIMEZONE", default_value = "Europe/London")]
    pub timezone: String,

    /// GPIO line (BCM numbering) wired to the light
    #[arg(long, env = "GOAL_LIGHT_GPIO_PIN", default_value = "18")]
    pub gpio_pin: u32,

    /// Log light flashes instead of driving the GPIO line
    #[arg(long, env = "DRY_RUN", default_value = "false")]
    pub dry_run: bool,

    /// Seconds between goal checks during a match
    #[arg(long, env = "POLL_INTERVAL_SECS", default_value = "65")]
    pub poll_interval_secs: u64,

    /// Number of goal checks before the match is assumed over
    #[arg(long, env = "MAX_POLLS", default_value = "99")]
    pub max_polls: u32,

    /// Comment tag identifying the kickoff job in the crontab
    #[arg(long, env = "CRON_LABEL", default_value = "match")]
    pub cron_label: String,

    /// Command the kickoff job runs (defaults to this executable)
    #[arg(long, env = "GOAL_LIGHT_COMMAND")]
    pub command: Option<String>,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_polls == 0 {
            anyhow::bail!("max_polls must be at least 1");
        }
        if let Err(e) = url::Url::parse(&self.api_url) {
            anyhow::bail!("api_url '{}' is not a valid URL: {}", self.api_url, e);
        }
        if self.cron_label.trim().is_empty() || self.cron_label.contains('\n') {
            anyhow::bail!("cron_label must be a single non-empty line");
        }
        if self.timezone.trim().is_empty() {
            anyhow::bail!("timezone must not be empty");
        }
        Ok(())
    }

    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            interval: Duration::from_secs(self.poll_interval_secs),
            max_iterations: self.max_polls,
            flash: FlashPattern::default(),
        }
    }

    /// Command line the kickoff job should run.
    pub fn job_command(&self) -> Result<String> {
        match &self.command {
            Some(cmd) => Ok(cmd.clone()),
            None => {
                let exe = std::env::current_exe().context("Failed to locate current executable")?;
                Ok(self.invocation(&exe.display().to_string()))
            }
        }
    }

    /// `program` followed by every resolved setting as an explicit flag.
    /// Cron runs with an almost empty environment, so values that came from
    /// env vars are spelled out too.
    pub fn invocation(&self, program: &str) -> String {
        let mut line = vec![
            ("--config-file", self.config_file.display().to_string()),
            ("--state-file", self.state_file.display().to_string()),
            ("--log-dir", self.log_dir.display().to_string()),
            ("--api-url", self.api_url.clone()),
            ("--timezone", self.timezone.clone()),
            ("--gpio-pin", self.gpio_pin.to_string()),
            ("--poll-interval-secs", self.poll_interval_secs.to_string()),
            ("--max-polls", self.max_polls.to_string()),
            ("--cron-label", self.cron_label.clone()),
        ]
        .into_iter()
        .fold(shell_quote(program), |mut line, (flag, value)| {
            line.push(' ');
            line.push_str(flag);
            line.push(' ');
            line.push_str(&shell_quote(&value));
            line
        });
        if self.dry_run {
            line.push_str(" --dry-run");
        }
        line
    }
}

/// Single-quote `arg` for `sh` unless it is made only of safe characters.
fn shell_quote(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "/._-:=,+@".contains(c));
    if safe {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

/// Provider credentials and the tracked team, read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: String,
    pub team_id: String,
}

impl Credentials {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let mut lines = raw.lines().map(str::trim);
        let api_key = match lines.next() {
            Some(key) if !key.is_empty() => key.to_string(),
            _ => anyhow::bail!("line 1 must hold the API key"),
        };
        let team_id = match lines.next() {
            Some(team) if !team.is_empty() => team.to_string(),
            _ => anyhow::bail!("line 2 must hold the team id"),
        };
        Ok(Credentials { api_key, team_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(args: &[&str]) -> Config {
        let mut argv = vec!["goal-light"];
        argv.extend_from_slice(args);
        Config::parse_from(argv)
    }

    #[test]
    fn test_parse_credentials() {
        let creds = Credentials::parse("abc123\n40\n").unwrap();
        assert_eq!(creds.api_key, "abc123");
        assert_eq!(creds.team_id, "40");
    }

    #[test]
    fn test_parse_credentials_trims_whitespace() {
        let creds = Credentials::parse("  abc123 \r\n 40\r\n").unwrap();
        assert_eq!(creds.api_key, "abc123");
        assert_eq!(creds.team_id, "40");
    }

    #[test]
    fn test_parse_credentials_missing_team() {
        assert!(Credentials::parse("abc123\n").is_err());
        assert!(Credentials::parse("abc123\n   \n").is_err());
        assert!(Credentials::parse("").is_err());
    }

    #[test]
    fn test_default_poll_settings() {
        let cfg = config(&[]);
        assert!(cfg.validate().is_ok());
        let settings = cfg.poll_settings();
        assert_eq!(settings.interval, Duration::from_secs(65));
        assert_eq!(settings.max_iterations, 99);
        assert_eq!(cfg.cron_label, "match");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(config(&["--max-polls", "0"]).validate().is_err());
        assert!(config(&["--api-url", "not a url"]).validate().is_err());
        assert!(config(&["--cron-label", " "]).validate().is_err());
    }

    #[test]
    fn test_job_command_carries_settings() {
        let cfg = config(&[
            "--state-file",
            "/srv/goal/fixture.txt",
            "--config-file",
            "/srv/goal/config.txt",
            "--dry-run",
            "--max-polls",
            "90",
        ]);
        let cmd = cfg.job_command().unwrap();
        assert!(cmd.contains(" --state-file /srv/goal/fixture.txt"));
        assert!(cmd.contains(" --config-file /srv/goal/config.txt"));
        assert!(cmd.contains(" --max-polls 90"));
        assert!(cmd.contains(" --poll-interval-secs 65"));
        assert!(cmd.ends_with(" --dry-run"));
    }

    #[test]
    fn test_invocation_round_trips_through_clap() {
        let cfg = config(&["--log-dir", "/srv/goal/logs", "--gpio-pin", "23"]);
        let line = cfg.invocation("/usr/local/bin/goal-light");
        let argv: Vec<&str> = line.split(' ').collect();
        assert_eq!(argv[0], "/usr/local/bin/goal-light");
        let reparsed = Config::parse_from(argv);
        assert_eq!(reparsed.log_dir, PathBuf::from("/srv/goal/logs"));
        assert_eq!(reparsed.gpio_pin, 23);
        assert_eq!(reparsed.timezone, "Europe/London");
        assert!(!reparsed.dry_run);
    }

    #[test]
    fn test_invocation_quotes_awkward_paths() {
        let cfg = config(&["--state-file", "/home/pi/my goals/it's.txt"]);
        let line = cfg.invocation("/opt/goal light/bin");
        assert!(line.starts_with("'/opt/goal light/bin' "));
        assert!(line.contains(r"--state-file '/home/pi/my goals/it'\''s.txt'"));
    }

    #[test]
    fn test_explicit_job_command() {
        let cfg = config(&["--command", "/usr/local/bin/goal-light --dry-run"]);
        assert_eq!(cfg.job_command().unwrap(), "/usr/local/bin/goal-light --dry-run");
    }
}
