/// Upload staging — holds at most one pending resume until a send consumes
/// or the user clears it. Validation happens at stage time: only PDF
/// documents are accepted (extension plus the `%PDF` magic header, since the
/// extension alone is a claim, not a guarantee).
use std::path::Path;

// ── Staged file ───────────────────────────────────────────────────────────────

/// File contents are read at stage time; ownership transfers to the gateway
/// request when a send consumes the staging slot.
#[derive(Debug, Clone)]
pub struct StagedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    NotPdf,
    Unreadable(String),
}

// ── Staging slot ──────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct UploadStaging {
    staged: Option<StagedFile>,
}

impl UploadStaging {
    /// Validate and stage a candidate file, replacing any prior one.
    /// On rejection the slot is left empty — a failed stage never keeps an
    /// earlier file attached.
    pub fn stage(&mut self, path: &Path) -> Result<(), Rejection> {
        self.staged = None;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if !filename.to_ascii_lowercase().ends_with(".pdf") {
            return Err(Rejection::NotPdf);
        }
        let bytes = std::fs::read(path).map_err(|e| Rejection::Unreadable(e.to_string()))?;
        if !bytes.starts_with(b"%PDF") {
            return Err(Rejection::NotPdf);
        }
        self.staged = Some(StagedFile { filename, bytes });
        Ok(())
    }

    /// Unconditionally empty the slot. Idempotent.
    pub fn clear(&mut self) {
        self.staged = None;
    }

    pub fn peek(&self) -> Option<&StagedFile> {
        self.staged.as_ref()
    }

    /// Consume the staged file (send path).
    pub fn take(&mut self) -> Option<StagedFile> {
        self.staged.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, contents: &[u8]) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents).unwrap();
        path
    }

    #[test]
    fn test_stage_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "resume.pdf", b"%PDF-1.7 fake body");
        let mut staging = UploadStaging::default();
        assert!(staging.stage(&path).is_ok());
        assert_eq!(staging.peek().unwrap().filename, "resume.pdf");
    }

    #[test]
    fn test_reject_wrong_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "resume.docx", b"PK\x03\x04");
        let mut staging = UploadStaging::default();
        assert_eq!(staging.stage(&path), Err(Rejection::NotPdf));
        assert!(staging.peek().is_none());
    }

    #[test]
    fn test_reject_pdf_extension_without_magic() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "fake.pdf", b"<html>not a pdf</html>");
        let mut staging = UploadStaging::default();
        assert_eq!(staging.stage(&path), Err(Rejection::NotPdf));
        assert!(staging.peek().is_none());
    }

    #[test]
    fn test_rejection_clears_prior_staged_file() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_file(dir.path(), "resume.pdf", b"%PDF-1.7");
        let mut staging = UploadStaging::default();
        staging.stage(&good).unwrap();
        assert!(staging.peek().is_some());

        // An unreadable path must not leave the earlier file attached
        let missing = dir.path().join("ghost.pdf");
        assert!(matches!(staging.stage(&missing), Err(Rejection::Unreadable(_))));
        assert!(staging.peek().is_none());

        staging.stage(&good).unwrap();
        let bad_ext = write_file(dir.path(), "resume.docx", b"PK\x03\x04");
        assert_eq!(staging.stage(&bad_ext), Err(Rejection::NotPdf));
        assert!(staging.peek().is_none());
    }

    #[test]
    fn test_take_consumes_and_clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "cv.pdf", b"%PDF-1.4");
        let mut staging = UploadStaging::default();
        staging.stage(&path).unwrap();
        assert!(staging.take().is_some());
        assert!(staging.take().is_none());
        staging.clear();
        staging.clear();
        assert!(staging.peek().is_none());
    }
}
