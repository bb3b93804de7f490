use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{NaiveTime, Timelike};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

use super::ActivationScheduler;

/// Kickoff job kept in the invoking user's crontab, tagged with a comment
/// label so it can be found and removed again.
pub struct Crontab {
    command: String,
    label: String,
    /// Program (and leading arguments) standing in for `crontab`
    program: Vec<String>,
}

impl Crontab {
    pub fn new(command: impl Into<String>, label: impl Into<String>) -> Self {
        Crontab {
            command: command.into(),
            label: label.into(),
            program: vec!["crontab".to_string()],
        }
    }

    /// Use `program args...` in place of the system `crontab` binary.
    #[cfg(test)]
    pub fn with_program(mut self, program: &str, args: &[&str]) -> Self {
        self.program = std::iter::once(program)
            .chain(args.iter().copied())
            .map(str::to_string)
            .collect();
        self
    }

    fn crontab(&self) -> Command {
        let (program, args) = match self.program.split_first() {
            Some((program, args)) => (program.as_str(), args),
            None => ("crontab", &[][..]),
        };
        let mut cmd = Command::new(program);
        cmd.args(args);
        cmd
    }

    async fn read_table(&self) -> Result<String> {
        let output = self
            .crontab()
            .arg("-l")
            .output()
            .await
            .context("Failed to run crontab -l")?;
        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.contains("no crontab") {
            debug!("No existing crontab");
            return Ok(String::new());
        }
        anyhow::bail!("crontab -l failed ({}): {}", output.status, stderr.trim());
    }

    async fn write_table(&self, table: &str) -> Result<()> {
        let mut child = self
            .crontab()
            .arg("-")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .context("Failed to run crontab -")?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(table.as_bytes())
                .await
                .context("Failed to pipe table to crontab")?;
        }
        let output = child
            .wait_with_output()
            .await
            .context("Failed to wait for crontab")?;
        if !output.status.success() {
            anyhow::bail!(
                "crontab - failed ({}): {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }
}

#[async_trait]
impl ActivationScheduler for Crontab {
    async fn schedule(&self, kickoff: NaiveTime) -> Result<()> {
        let table = self.read_table().await?;
        let line = job_line(kickoff, &self.command, &self.label);
        let mut updated = without_label(&table, &self.label);
        updated.push_str(&line);
        updated.push('\n');
        self.write_table(&updated).await?;
        info!(
            "Writing cron job - minute: {} hour: {}",
            kickoff.minute(),
            kickoff.hour()
        );
        Ok(())
    }

    async fn deregister(&self) -> Result<()> {
        let table = self.read_table().await?;
        let updated = without_label(&table, &self.label);
        if updated == table {
            debug!("No '{}' cron job to remove", self.label);
            return Ok(());
        }
        self.write_table(&updated).await?;
        info!("Removed '{}' cron job", self.label);
        Ok(())
    }
}

/// `<minute> <hour> * * * <command> # <label>`, with `%` escaped since cron
/// turns a bare `%` into a newline.
pub fn job_line(kickoff: NaiveTime, command: &str, label: &str) -> String {
    format!(
        "{} {} * * * {} # {}",
        kickoff.minute(),
        kickoff.hour(),
        command.replace('%', "\\%"),
        label
    )
}

/// The table with every line tagged `# <label>` removed; each kept line is
/// newline-terminated.
pub fn without_label(table: &str, label: &str) -> String {
    let tag = format!("# {}", label);
    table
        .lines()
        .filter(|line| !line.trim_end().ends_with(&tag))
        .fold(String::new(), |mut out, line| {
            out.push_str(line);
            out.push('\n');
            out
        })
}
