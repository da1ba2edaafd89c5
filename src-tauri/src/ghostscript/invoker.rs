// Runs Ghostscript to rewrite one PDF as PDF/A-2
use crate::conversion::PdfConverter;
use crate::models::{ConversionOutcome, GhostscriptBinary};
use crate::process_manager::{run_with_control, CancelToken, CommandRunError};
use log::debug;
use std::ffi::OsString;
use std::path::Path;
use std::process::Command;
use std::time::Duration;

/// Fixed flags: PDF/A-2, batch mode without pauses, CMYK output through pdfwrite
const PDFA_FLAGS: &[&str] = &[
    "-dPDFA=2",
    "-dBATCH",
    "-dNOPAUSE",
    "-dNOOUTERSAVE",
    "-sProcessColorModel=DeviceCMYK",
    "-sDEVICE=pdfwrite",
];

pub fn pdfa_args(input: &Path, output: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = PDFA_FLAGS.iter().map(OsString::from).collect();

    let mut output_arg = OsString::from("-sOutputFile=");
    output_arg.push(output.as_os_str());
    args.push(output_arg);
    args.push(input.as_os_str().to_os_string());

    args
}

pub struct GhostscriptConverter {
    binary: GhostscriptBinary,
    timeout: Option<Duration>,
    cancel: CancelToken,
}

impl GhostscriptConverter {
    pub fn new(binary: GhostscriptBinary, timeout: Option<Duration>, cancel: CancelToken) -> Self {
        Self {
            binary,
            timeout,
            cancel,
        }
    }
}

impl PdfConverter for GhostscriptConverter {
    fn convert(&self, input: &Path, output: &Path) -> ConversionOutcome {
        if !input.is_file() {
            return ConversionOutcome::failure(format!("Input file not found: {:?}", input));
        }

        let mut cmd = Command::new(&self.binary.path);
        cmd.args(pdfa_args(input, output));

        debug!("Converting {:?} -> {:?}", input, output);

        match run_with_control(&mut cmd, self.timeout, &self.cancel) {
            Ok(result) if result.success() => ConversionOutcome::Success,
            Ok(result) => {
                let mut reason = format!("Ghostscript exited with code {}", result.exit_code());
                if let Some(line) = result.last_stderr_line() {
                    reason.push_str(": ");
                    reason.push_str(&line);
                }
                ConversionOutcome::failure(reason)
            }
            Err(CommandRunError::TimedOut(limit)) => {
                ConversionOutcome::failure(format!("Ghostscript timed out after {:?}", limit))
            }
            Err(e) => ConversionOutcome::failure(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BinarySource;
    use std::fs;
    use std::path::PathBuf;

    #[test]
    fn test_argument_contract() {
        let args = pdfa_args(Path::new("/in/a.pdf"), Path::new("/out/converted/a.pdf"));
        let args: Vec<String> = args.iter().map(|a| a.to_string_lossy().to_string()).collect();

        assert_eq!(
            args,
            vec![
                "-dPDFA=2",
                "-dBATCH",
                "-dNOPAUSE",
                "-dNOOUTERSAVE",
                "-sProcessColorModel=DeviceCMYK",
                "-sDEVICE=pdfwrite",
                "-sOutputFile=/out/converted/a.pdf",
                "/in/a.pdf",
            ]
        );
    }

    #[test]
    fn test_missing_input_fails_without_spawning() {
        let converter = GhostscriptConverter::new(
            GhostscriptBinary::new(PathBuf::from("/nonexistent/gs"), BinarySource::Path),
            None,
            CancelToken::new(),
        );

        let outcome = converter.convert(Path::new("/nonexistent/in.pdf"), Path::new("/tmp/out.pdf"));
        match outcome {
            ConversionOutcome::Failure { reason } => assert!(reason.contains("Input file not found")),
            ConversionOutcome::Success => panic!("expected failure"),
        }
    }

    #[cfg(unix)]
    fn fake_ghostscript(dir: &Path, body: &str) -> GhostscriptBinary {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("gs");
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        GhostscriptBinary::new(path, BinarySource::Path)
    }

    #[cfg(unix)]
    #[test]
    fn test_passes_fixed_arguments_to_binary() {
        let dir = tempfile::tempdir().unwrap();
        let args_file = dir.path().join("args.txt");
        let binary = fake_ghostscript(
            dir.path(),
            &format!("printf '%s\\n' \"$@\" > '{}'", args_file.display()),
        );
        let input = dir.path().join("a.pdf");
        fs::write(&input, b"%PDF-1.4").unwrap();
        let output = dir.path().join("converted").join("a.pdf");

        let outcome = GhostscriptConverter::new(binary, None, CancelToken::new()).convert(&input, &output);

        assert_eq!(outcome, ConversionOutcome::Success);
        let recorded = fs::read_to_string(&args_file).unwrap();
        let lines: Vec<&str> = recorded.lines().collect();
        assert_eq!(lines.len(), 8);
        assert_eq!(lines[0], "-dPDFA=2");
        assert_eq!(lines[6], format!("-sOutputFile={}", output.display()));
        assert_eq!(lines[7], input.display().to_string());
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_reports_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let binary = fake_ghostscript(dir.path(), "echo 'Error: /syntaxerror in pdf' >&2\nexit 1");
        let input = dir.path().join("broken.pdf");
        fs::write(&input, b"garbage").unwrap();

        let outcome = GhostscriptConverter::new(binary, None, CancelToken::new())
            .convert(&input, &dir.path().join("out.pdf"));

        assert_eq!(
            outcome,
            ConversionOutcome::failure("Ghostscript exited with code 1: Error: /syntaxerror in pdf")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_hung_process_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let binary = fake_ghostscript(dir.path(), "exec sleep 5");
        let input = dir.path().join("slow.pdf");
        fs::write(&input, b"%PDF-1.4").unwrap();

        let outcome = GhostscriptConverter::new(binary, Some(Duration::from_millis(200)), CancelToken::new())
            .convert(&input, &dir.path().join("out.pdf"));

        match outcome {
            ConversionOutcome::Failure { reason } => {
                assert_eq!(reason, "Ghostscript timed out after 200ms")
            }
            ConversionOutcome::Success => panic!("expected timeout"),
        }
    }
}
