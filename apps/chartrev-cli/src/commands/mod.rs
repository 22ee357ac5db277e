pub mod history;
pub mod patch;
pub mod plan;
pub mod revision;
pub mod workspace;

use std::path::PathBuf;

use chartrev_store::WorkspaceFile;

/// Content given inline (`--content`) or read from a file (`--from-file`).
pub fn read_content(content: Option<&str>, from_file: Option<&PathBuf>) -> anyhow::Result<String> {
    match (content, from_file) {
        (Some(_), Some(_)) => anyhow::bail!("pass either --content or --from-file, not both"),
        (Some(text), None) => Ok(text.to_string()),
        (None, Some(path)) => std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read {}: {}", path.display(), e)),
        (None, None) => Ok(String::new()),
    }
}

/// Print files as a table.
pub fn print_files(files: &[WorkspaceFile]) {
    if files.is_empty() {
        println!("No files.");
        return;
    }
    println!("{:<38} {:<9} {:<5} PATH", "FILE ID", "STATUS", "REV");
    println!("{}", "-".repeat(80));
    for file in files {
        let path = if file.is_loose() {
            file.file_path.clone()
        } else {
            format!("[chart] {}", file.file_path)
        };
        println!(
            "{:<38} {:<9} {:<5} {}",
            file.file_id, file.status, file.revision_number, path
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn read_content_prefers_the_given_source() {
        assert_eq!(read_content(Some("x"), None).unwrap(), "x");
        assert_eq!(read_content(None, None).unwrap(), "");

        let dir = tempdir().unwrap();
        let path = dir.path().join("values.yaml");
        std::fs::write(&path, "replicas: 2").unwrap();
        assert_eq!(read_content(None, Some(&path)).unwrap(), "replicas: 2");
        assert!(read_content(Some("x"), Some(&path)).is_err());
    }
}
