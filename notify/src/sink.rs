use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::{NotifyError, Result};

/// External notification display.
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Show a fresh alert; the returned id addresses it for later updates.
    async fn create(&self, message: &str) -> Result<String>;

    /// Replace the text of an existing alert in place.
    async fn update(&self, id: &str, message: &str) -> Result<()>;
}

/// `notify-send` based sink. Alerts carry a portrait icon and critical
/// urgency so they stay visible while the reveal runs.
pub struct NotifySend {
    summary: String,
    urgency: String,
    icon: Option<PathBuf>,
    create_timeout_ms: u32,
    update_timeout_ms: u32,
}

impl NotifySend {
    pub fn new(icon: Option<PathBuf>) -> Self {
        Self {
            summary: "System Alert".to_string(),
            urgency: "critical".to_string(),
            icon,
            create_timeout_ms: 1000,
            update_timeout_ms: 5000,
        }
    }

    fn command(&self, message: &str, timeout_ms: u32, replace: Option<&str>) -> Command {
        let mut cmd = Command::new("notify-send");
        if let Some(icon) = &self.icon {
            cmd.arg("-i").arg(icon);
        }
        cmd.arg("-u")
            .arg(&self.urgency)
            .arg("-t")
            .arg(timeout_ms.to_string())
            .arg("--print-id");
        if let Some(id) = replace {
            cmd.arg("-r").arg(id);
        }
        cmd.arg(&self.summary).arg(message);
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        cmd
    }
}

async fn run(mut cmd: Command) -> Result<String> {
    let output = cmd.output().await?;
    if !output.status.success() {
        return Err(NotifyError::Tool(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

#[async_trait]
impl AlertSink for NotifySend {
    async fn create(&self, message: &str) -> Result<String> {
        let id = run(self.command(message, self.create_timeout_ms, None)).await?;
        if id.is_empty() {
            return Err(NotifyError::Tool("no alert id printed".to_string()));
        }
        Ok(id)
    }

    async fn update(&self, id: &str, message: &str) -> Result<()> {
        run(self.command(message, self.update_timeout_ms, Some(id))).await?;
        Ok(())
    }
}
