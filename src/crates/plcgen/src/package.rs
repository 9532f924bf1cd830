//! Writes the generated project to disk.

use crate::error::{PipelineError, Result};
use crate::schema::{ensure_not_reserved, normalize_relpath, FileSet};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// File name of the generated README inside the project directory.
pub const README_FILE: &str = "README.md";

/// Packaging result returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bundle {
    pub readme: String,
    pub project_dir: PathBuf,
}

/// Check that a project name is usable as a single directory name.
pub fn validate_project_name(name: &str) -> Result<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(PipelineError::InvalidRequest(
            "project_name must not be empty".to_string(),
        ));
    }

    let mut components = Path::new(trimmed).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !trimmed.contains(['/', '\\', ':']) => Ok(()),
        _ => Err(PipelineError::InvalidRequest(format!(
            "project_name must be a single plain path component: {:?}",
            name
        ))),
    }
}

/// Write every file plus `README.md` under `<out_dir>/<project_name>/`.
///
/// Parent directories are created as needed and existing files are
/// overwritten. A file set entry at `README.md` is a `PlanIntegrity` error.
/// Any I/O failure aborts packaging.
pub async fn write_bundle(
    out_dir: &Path,
    project_name: &str,
    files: &FileSet,
    readme: &str,
) -> Result<Bundle> {
    validate_project_name(project_name)?;
    let project_dir = out_dir.join(project_name.trim());

    let mut targets = Vec::with_capacity(files.len());
    for (relpath, content) in files {
        let relpath = normalize_relpath(relpath)?;
        ensure_not_reserved(&relpath)?;
        targets.push((project_dir.join(relpath), content));
    }

    fs::create_dir_all(&project_dir).await?;

    for (target, content) in targets {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&target, content).await?;
        debug!(path = %target.display(), bytes = content.len(), "Wrote generated file");
    }

    fs::write(project_dir.join(README_FILE), readme).await?;

    Ok(Bundle {
        readme: readme.to_string(),
        project_dir,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_bundle_layout() {
        let temp_dir = TempDir::new().unwrap();
        let mut files = FileSet::new();
        files.insert("src/a.st".to_string(), "CODE_A".to_string());

        let bundle = write_bundle(temp_dir.path(), "Proj1", &files, "# Proj1\n")
            .await
            .unwrap();

        let project_dir = temp_dir.path().join("Proj1");
        assert_eq!(bundle.project_dir, project_dir);
        assert_eq!(bundle.readme, "# Proj1\n");
        assert_eq!(
            std::fs::read_to_string(project_dir.join("src/a.st")).unwrap(),
            "CODE_A"
        );
        assert_eq!(
            std::fs::read_to_string(project_dir.join("README.md")).unwrap(),
            "# Proj1\n"
        );
    }

    #[tokio::test]
    async fn test_write_bundle_overwrites_existing_files() {
        let temp_dir = TempDir::new().unwrap();
        let mut files = FileSet::new();
        files.insert("main.st".to_string(), "OLD".to_string());
        write_bundle(temp_dir.path(), "P", &files, "r1").await.unwrap();

        files.insert("main.st".to_string(), "NEW".to_string());
        write_bundle(temp_dir.path(), "P", &files, "r2").await.unwrap();

        let dir = temp_dir.path().join("P");
        assert_eq!(std::fs::read_to_string(dir.join("main.st")).unwrap(), "NEW");
        assert_eq!(std::fs::read_to_string(dir.join("README.md")).unwrap(), "r2");
    }

    #[tokio::test]
    async fn test_write_bundle_rejects_escaping_relpath() {
        let temp_dir = TempDir::new().unwrap();
        let mut files = FileSet::new();
        files.insert("../evil.st".to_string(), "X".to_string());

        let err = write_bundle(temp_dir.path(), "P", &files, "r").await.unwrap_err();
        assert!(matches!(err, PipelineError::PlanIntegrity(_)));
        assert!(!temp_dir.path().join("evil.st").exists());
    }

    #[tokio::test]
    async fn test_write_bundle_rejects_readme_entry() {
        let temp_dir = TempDir::new().unwrap();
        let mut files = FileSet::new();
        files.insert("README.md".to_string(), "MODULE_README".to_string());
        files.insert("src/a.st".to_string(), "CODE_A".to_string());

        let err = write_bundle(temp_dir.path(), "P", &files, "GENERATED_README")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::PlanIntegrity(_)));
        assert!(!temp_dir.path().join("P").exists());
    }

    #[test]
    fn test_validate_project_name() {
        assert!(validate_project_name("PandauraProject").is_ok());
        assert!(validate_project_name("Line 3 Retrofit").is_ok());
        assert!(validate_project_name("").is_err());
        assert!(validate_project_name("   ").is_err());
        assert!(validate_project_name("..").is_err());
        assert!(validate_project_name(".").is_err());
        assert!(validate_project_name("a/b").is_err());
        assert!(validate_project_name("a\\b").is_err());
        assert!(validate_project_name("/abs").is_err());
    }

    #[tokio::test]
    async fn test_invalid_project_name_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let err = write_bundle(temp_dir.path(), "../up", &FileSet::new(), "r")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidRequest(_)));
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }
}
