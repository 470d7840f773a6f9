// ABOUTME: Common utilities and helpers for integration tests
// ABOUTME: Provides temporary report workspaces and sample assessment data

#![allow(dead_code)]

use serde_json::{json, Value as JsonValue};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::fs;

use reportsmith::TemplateProcessor;

pub struct TestEnvironment {
    pub temp_dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn file(&self, relative: &str) -> PathBuf {
        self.path().join(relative)
    }

    /// Write a file below the workspace, creating parent directories
    pub async fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.file(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .expect("Failed to create directories");
        }
        fs::write(&path, content)
            .await
            .expect("Failed to write test file");
        path
    }

    pub async fn write_json(&self, relative: &str, value: &JsonValue) -> PathBuf {
        let content = serde_json::to_string_pretty(value).expect("Failed to serialize JSON");
        self.write(relative, &content).await
    }

    pub async fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.file(relative))
            .await
            .expect("Failed to read test file")
    }
}

pub fn processor() -> TemplateProcessor {
    TemplateProcessor::new().expect("Failed to create template processor")
}

pub fn render(template: &str, data: JsonValue) -> String {
    processor().render_json(template, &data)
}

pub fn sample_assessment() -> JsonValue {
    json!({
        "title": "GitHub Copilot assessment",
        "tool": {"name": "GitHub Copilot", "vendor": "GitHub", "version": "1.180"},
        "assessor": "AppSec <team>",
        "assessed_at": "2024-03-05T10:30:00Z",
        "overall_score": 81,
        "categories": [
            {"name": "Data privacy", "score": 70, "notes": "Telemetry enabled by default"},
            {"name": "Licensing", "score": 30},
            {"name": "Access control", "score": 10}
        ],
        "findings": [
            {"title": "Code snippets sent to vendor", "severity": "critical"},
            {"title": "Suggestions match public code", "severity": "medium", "description": "Duplicate detection is off"}
        ],
        "recommendations": ["Enable duplicate detection", "Block for regulated repos"],
        "compliance": ["ISO 27001", "SOC 2"]
    })
}
