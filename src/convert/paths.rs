//! Input validation and output naming.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Extension of produced documents.
pub const OUTPUT_EXTENSION: &str = "docx";

/// Check that `path` names an existing `.pdf` file (extension compared
/// case-insensitively).
pub fn validate_pdf_path(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(Error::InvalidArgument(format!(
            "{} does not exist",
            path.display()
        )));
    }
    if !path.is_file() {
        return Err(Error::InvalidArgument(format!(
            "{} is not a file",
            path.display()
        )));
    }
    let is_pdf = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
    if !is_pdf {
        return Err(Error::InvalidArgument(format!(
            "{} does not have a .pdf extension",
            path.display()
        )));
    }
    Ok(())
}

/// Output file name for an input: the sanitized stem plus `.docx`.
pub fn generate_output_filename(input: &Path) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let sanitized: String = stem
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let sanitized = sanitized.trim().trim_matches('.');
    let stem = if sanitized.is_empty() {
        "document"
    } else {
        sanitized
    };
    format!("{}.{}", stem, OUTPUT_EXTENSION)
}

/// Output path for `input`: inside `output_dir` when given, next to the
/// input otherwise.
pub fn output_path_for(input: &Path, output_dir: Option<&Path>) -> PathBuf {
    let name = generate_output_filename(input);
    match output_dir {
        Some(dir) => dir.join(name),
        None => input.with_file_name(name),
    }
}

/// The `.pdf` files directly inside `dir`, sorted by path.
pub fn collect_pdf_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| validate_pdf_path(p).is_ok())
        .collect();
    files.sort();
    Ok(files)
}

/// Format bytes to human readable string.
pub fn format_file_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_output_filename() {
        assert_eq!(generate_output_filename(Path::new("/tmp/report.pdf")), "report.docx");
        assert_eq!(generate_output_filename(Path::new("a:b?.PDF")), "a_b_.docx");
        assert_eq!(generate_output_filename(Path::new("...pdf")), "document.docx");
    }

    #[test]
    fn test_output_path_for() {
        let input = Path::new("/data/in/scan.pdf");
        assert_eq!(
            output_path_for(input, Some(Path::new("/out"))),
            PathBuf::from("/out/scan.docx")
        );
        assert_eq!(output_path_for(input, None), PathBuf::from("/data/in/scan.docx"));
    }

    #[test]
    fn test_validate_pdf_path() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("ok.PDF");
        std::fs::write(&pdf, b"%PDF-1.4").unwrap();
        let txt = dir.path().join("notes.txt");
        std::fs::write(&txt, b"hello").unwrap();

        assert!(validate_pdf_path(&pdf).is_ok());
        assert!(matches!(validate_pdf_path(&txt), Err(Error::InvalidArgument(_))));
        assert!(validate_pdf_path(dir.path()).is_err());
        assert!(validate_pdf_path(&dir.path().join("missing.pdf")).is_err());
    }

    #[test]
    fn test_collect_pdf_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.pdf", "a.PDF", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"%PDF-1.4").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.pdf")).unwrap();

        let files = collect_pdf_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
            .collect();
        assert_eq!(names, vec!["a.PDF", "b.pdf"]);
        assert!(matches!(
            collect_pdf_files(&dir.path().join("missing")),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(512), "512 B");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5.0 MB");
    }
}
