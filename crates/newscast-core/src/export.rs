//! Markdown export of finished scripts.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::time::beijing_now;

/// Characters per minute at normal anchor reading speed.
const READING_SPEED: usize = 200;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("script file not found: {0}")]
    ScriptNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Estimated reading duration in whole minutes, never less than one.
pub fn estimated_minutes(word_count: usize) -> usize {
    (word_count / READING_SPEED).max(1)
}

/// Render a script file as a Markdown document next to it (or at an explicit
/// output path). Returns the path written.
pub fn export_markdown(
    script_path: &Path,
    output: Option<PathBuf>,
) -> Result<PathBuf, ExportError> {
    if !script_path.exists() {
        return Err(ExportError::ScriptNotFound(script_path.to_path_buf()));
    }
    let script = fs::read_to_string(script_path)?;
    let word_count = script.chars().count();
    let minutes = estimated_minutes(word_count);
    let now = beijing_now();

    let markdown = format!(
        r#"# 📢 财经新闻口播稿

<div align="center">

**生成时间** | **字数统计** | **预计时长**
--- | --- | ---
{} | {} 字 | 约 {} 分钟

</div>

---

{}

---

<div align="center">

*本口播稿由AI自动生成，仅供参考*

</div>
"#,
        now.format("%Y年%m月%d日 %H:%M:%S"),
        word_count,
        minutes,
        script.trim()
    );

    let output_path = output.unwrap_or_else(|| script_path.with_extension("md"));
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = output_path.with_extension("md.tmp");
    fs::write(&tmp, markdown)?;
    fs::rename(&tmp, &output_path)?;

    info!(path = %output_path.display(), "markdown export written");
    Ok(output_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn duration_estimate() {
        assert_eq!(estimated_minutes(0), 1);
        assert_eq!(estimated_minutes(199), 1);
        assert_eq!(estimated_minutes(650), 3);
    }

    #[test]
    fn exports_next_to_script() {
        let dir = TempDir::new().unwrap();
        let script_path = dir.path().join("script.txt");
        fs::write(&script_path, "早上好，今天是测试日。\n\n以上是全部内容。").unwrap();

        let md_path = export_markdown(&script_path, None).unwrap();
        assert_eq!(md_path, dir.path().join("script.md"));

        let markdown = fs::read_to_string(&md_path).unwrap();
        assert!(markdown.contains("早上好，今天是测试日。"));
        assert!(markdown.contains("约 1 分钟"));
        assert!(markdown.starts_with("# 📢 财经新闻口播稿"));
        // No temp file left behind.
        assert!(!dir.path().join("script.md.tmp").exists());
    }

    #[test]
    fn missing_script_fails() {
        let err = export_markdown(Path::new("/nonexistent/script.txt"), None).unwrap_err();
        assert!(matches!(err, ExportError::ScriptNotFound(_)));
    }
}
