use crate::models::ConversionJob;
use std::path::{Component, Path, PathBuf};

/// One job per file. With a destination every job targets `<destination>/<subfolder>`,
/// otherwise `<input's parent>/<subfolder>`.
pub fn plan_jobs(files: &[PathBuf], destination: Option<&Path>, subfolder: &str) -> Vec<ConversionJob> {
    files
        .iter()
        .map(|input| {
            let base = match destination {
                Some(dir) => dir,
                None => input.parent().unwrap_or_else(|| Path::new("")),
            };
            ConversionJob::new(input.clone(), base.join(subfolder))
        })
        .collect()
}

/// The subfolder must be a single plain directory name
pub fn validate_subfolder(subfolder: &str) -> Result<(), String> {
    let trimmed = subfolder.trim();
    if trimmed.is_empty() {
        return Err("Output subfolder cannot be empty".to_string());
    }

    let mut components = Path::new(trimmed).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !trimmed.contains(['/', '\\']) => Ok(()),
        _ => Err(format!("Output subfolder must be a plain folder name: {}", subfolder)),
    }
}

pub fn is_pdf(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(items: &[&str]) -> Vec<PathBuf> {
        items.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_destination_collects_all_outputs() {
        let jobs = plan_jobs(
            &paths(&["/docs/a.pdf", "/scans/b.pdf", "/c.pdf"]),
            Some(Path::new("/out")),
            "converted",
        );

        assert_eq!(jobs.len(), 3);
        assert!(jobs.iter().all(|job| job.output_dir == Path::new("/out/converted")));
        assert_eq!(jobs[1].output_path(), Some(PathBuf::from("/out/converted/b.pdf")));
    }

    #[test]
    fn test_no_destination_uses_sibling_folder() {
        let jobs = plan_jobs(&paths(&["/docs/a.pdf", "/scans/deep/b.pdf"]), None, "converted");

        assert_eq!(jobs[0].output_dir, PathBuf::from("/docs/converted"));
        assert_eq!(jobs[1].output_dir, PathBuf::from("/scans/deep/converted"));
    }

    #[test]
    fn test_output_name_matches_input_name() {
        let jobs = plan_jobs(&paths(&["/docs/Annual Report.PDF"]), None, "converted");
        let output = jobs[0].output_path().unwrap();

        assert_eq!(output.file_name(), jobs[0].input.file_name());
        assert_ne!(output.parent(), jobs[0].input.parent());
    }

    #[test]
    fn test_order_is_preserved() {
        let files = paths(&["/z.pdf", "/a.pdf", "/m.pdf"]);
        let jobs = plan_jobs(&files, None, "converted");
        let inputs: Vec<PathBuf> = jobs.into_iter().map(|job| job.input).collect();
        assert_eq!(inputs, files);
    }

    #[test]
    fn test_validate_subfolder() {
        assert!(validate_subfolder("converted").is_ok());
        assert!(validate_subfolder("PDF-A output").is_ok());
        assert!(validate_subfolder("").is_err());
        assert!(validate_subfolder("  ").is_err());
        assert!(validate_subfolder("..").is_err());
        assert!(validate_subfolder("a/b").is_err());
        assert!(validate_subfolder("a\\b").is_err());
    }

    #[test]
    fn test_is_pdf() {
        assert!(is_pdf(Path::new("/x/report.pdf")));
        assert!(is_pdf(Path::new("/x/REPORT.PDF")));
        assert!(!is_pdf(Path::new("/x/report.docx")));
        assert!(!is_pdf(Path::new("/x/pdf")));
    }
}
