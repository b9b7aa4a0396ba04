//! Outbound collaborators: user notifications and file downloads.
//!
//! The core never talks to a UI. It hands finished values to these sinks.

use crate::error::ConsoleResult;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Info,
            message: message.into(),
        }
    }
}

pub trait NotificationSink {
    fn notify(&mut self, notification: Notification);
}

/// Collects notifications in order; used by tests and the IPC runner.
impl NotificationSink for Vec<Notification> {
    fn notify(&mut self, notification: Notification) {
        self.push(notification);
    }
}

/// Routes notifications to the `log` facade.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl NotificationSink for LogNotifier {
    fn notify(&mut self, notification: Notification) {
        match notification.kind {
            NotificationKind::Error => log::warn!("{}", notification.message),
            NotificationKind::Success | NotificationKind::Info => {
                log::info!("{}", notification.message)
            }
        }
    }
}

/// A finished file ready to hand to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Download {
    pub filename: String,
    pub mime_type: String,
    pub content: String,
}

pub trait DownloadSink {
    fn save(&mut self, download: Download) -> ConsoleResult<()>;
}

impl DownloadSink for Vec<Download> {
    fn save(&mut self, download: Download) -> ConsoleResult<()> {
        self.push(download);
        Ok(())
    }
}

/// Writes each download as a file under one directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> ConsoleResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn path_for(&self, filename: &str) -> PathBuf {
        self.dir.join(filename)
    }
}

impl DownloadSink for DirectorySink {
    fn save(&mut self, download: Download) -> ConsoleResult<()> {
        let path = self.path_for(&download.filename);
        fs::write(&path, download.content.as_bytes())?;
        log::info!("Saved {} ({})", path.display(), download.mime_type);
        Ok(())
    }
}
