// ABOUTME: Report delivery to files and standard output
// ABOUTME: Writes rendered reports where the CLI was asked to send them

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use super::error::{ReportingError, Result};
use super::GeneratedReport;

#[async_trait]
pub trait ReportDeliverer: Send + Sync {
    async fn deliver_report(&self, report: &GeneratedReport) -> Result<()>;

    fn describe(&self) -> String;
}

/// Writes the report content to a file, creating parent directories
#[derive(Debug, Clone)]
pub struct FileDeliverer {
    path: PathBuf,
}

impl FileDeliverer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ReportDeliverer for FileDeliverer {
    async fn deliver_report(&self, report: &GeneratedReport) -> Result<()> {
        if let Some(parent_dir) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent_dir)
                .await
                .map_err(|e| ReportingError::DeliveryError {
                    message: format!("Failed to create directories {}: {}", parent_dir.display(), e),
                })?;
        }

        fs::write(&self.path, &report.content)
            .await
            .map_err(|e| ReportingError::DeliveryError {
                message: format!("Failed to write report to file {}: {}", self.path.display(), e),
            })?;

        info!(
            "Report '{}' written to {} ({} bytes)",
            report.title,
            self.path.display(),
            report.content.len()
        );
        Ok(())
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

/// Streams the report content to stdout unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutDeliverer;

#[async_trait]
impl ReportDeliverer for StdoutDeliverer {
    async fn deliver_report(&self, report: &GeneratedReport) -> Result<()> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(report.content.as_bytes()).await?;
        if !report.content.ends_with('\n') {
            stdout.write_all(b"\n").await?;
        }
        stdout.flush().await?;
        debug!("Report '{}' written to stdout", report.title);
        Ok(())
    }

    fn describe(&self) -> String {
        "stdout".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn report(content: &str) -> GeneratedReport {
        GeneratedReport {
            template: "t".to_string(),
            title: "Test".to_string(),
            content: content.to_string(),
            generated_at: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn test_file_delivery_creates_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out/nested/report.html");
        let deliverer = FileDeliverer::new(&path);

        deliverer.deliver_report(&report("<p>hi</p>")).await.unwrap();
        assert_eq!(fs::read_to_string(&path).await.unwrap(), "<p>hi</p>");
        assert!(deliverer.describe().contains("report.html"));
    }
}
