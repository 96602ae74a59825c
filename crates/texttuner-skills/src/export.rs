//! Export — turn a result into a shareable file.
//!
//! [`Exporter`] is the seam; [`MarkdownCardExporter`] writes a small
//! Markdown "card" with a title, the text, and a timestamp footer.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::info;

use texttuner_core::StorageError;

/// Where an export landed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportArtifact {
    pub path: PathBuf,
    pub filename: String,
}

/// Renders result text into some external artifact.
pub trait Exporter: Send + Sync {
    fn export(&self, title: &str, text: &str) -> Result<ExportArtifact, StorageError>;
}

/// Writes `texttuner-YYYYMMDD-HHMMSS.md` files into a directory.
#[derive(Clone, Debug)]
pub struct MarkdownCardExporter {
    dir: PathBuf,
}

impl MarkdownCardExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Card body for `text` stamped at `at`.
    pub fn render(title: &str, text: &str, at: DateTime<Local>) -> String {
        format!(
            "# {title}\n\n{}\n\n---\n\n*TextTuner · {}*\n",
            text.trim_end(),
            at.format("%Y-%m-%d %H:%M:%S")
        )
    }

    /// First free filename for `at`; a numeric suffix is added when two
    /// exports land in the same second.
    fn free_filename(&self, at: DateTime<Local>) -> String {
        let stem = format!("texttuner-{}", at.format("%Y%m%d-%H%M%S"));
        let mut filename = format!("{stem}.md");
        let mut n = 1;
        while self.dir.join(&filename).exists() {
            filename = format!("{stem}-{n}.md");
            n += 1;
        }
        filename
    }
}

impl Exporter for MarkdownCardExporter {
    fn export(&self, title: &str, text: &str) -> Result<ExportArtifact, StorageError> {
        std::fs::create_dir_all(&self.dir)?;

        let now = Local::now();
        let filename = self.free_filename(now);
        let path = self.dir.join(&filename);
        std::fs::write(&path, Self::render(title, text, now))?;

        info!(path = %path.display(), "Exported result card");
        Ok(ExportArtifact { path, filename })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn test_render_card() {
        let at = Local.with_ymd_and_hms(2024, 3, 9, 8, 5, 1).unwrap();
        let card = MarkdownCardExporter::render("调整结果", "HELLO!!!\n\n", at);
        assert_eq!(
            card,
            "# 调整结果\n\nHELLO!!!\n\n---\n\n*TextTuner · 2024-03-09 08:05:01*\n"
        );
    }

    #[test]
    fn test_export_writes_file() {
        let tmp = TempDir::new().unwrap();
        let exporter = MarkdownCardExporter::new(tmp.path().join("exports"));

        let artifact = exporter.export("扩写", "正文").unwrap();

        assert!(artifact.filename.starts_with("texttuner-"));
        assert!(artifact.filename.ends_with(".md"));
        assert_eq!(artifact.path, tmp.path().join("exports").join(&artifact.filename));

        let written = std::fs::read_to_string(&artifact.path).unwrap();
        assert!(written.starts_with("# 扩写\n\n正文"));
    }

    #[test]
    fn test_same_second_exports_do_not_clobber() {
        let tmp = TempDir::new().unwrap();
        let exporter = MarkdownCardExporter::new(tmp.path());
        let at = Local.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        let first = exporter.free_filename(at);
        std::fs::write(tmp.path().join(&first), "x").unwrap();
        let second = exporter.free_filename(at);

        assert_eq!(first, "texttuner-20240101-000000.md");
        assert_eq!(second, "texttuner-20240101-000000-1.md");
    }
}
