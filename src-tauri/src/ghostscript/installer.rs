// Ghostscript installer download and silent execution
use super::BootstrapError;
use crate::process_manager::{run_with_control, CancelToken, CommandRunError};
use log::{debug, info};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;
use std::process::Command;
use std::time::Duration;

const SILENT_FLAG: &str = "/S";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const READ_TIMEOUT: Duration = Duration::from_secs(60);
const CHUNK_SIZE: usize = 64 * 1024;

/// Fetches and runs a Ghostscript installer
pub trait Installer {
    fn download(&self, url: &str, dest: &Path, cancel: &CancelToken) -> Result<(), BootstrapError>;

    /// Returns the installer's exit code
    fn run_silent(
        &self,
        installer: &Path,
        timeout: Option<Duration>,
        cancel: &CancelToken,
    ) -> Result<i32, BootstrapError>;
}

/// Downloads over HTTP and runs the Windows installer unattended
pub struct SystemInstaller;

impl Installer for SystemInstaller {
    fn download(&self, url: &str, dest: &Path, cancel: &CancelToken) -> Result<(), BootstrapError> {
        if !cfg!(windows) {
            return Err(BootstrapError::Unsupported);
        }

        let agent = ureq::AgentBuilder::new()
            .timeout_connect(CONNECT_TIMEOUT)
            .timeout_read(READ_TIMEOUT)
            .build();

        let response = agent
            .get(url)
            .call()
            .map_err(|e| BootstrapError::Download(e.to_string()))?;

        let total: Option<u64> = response
            .header("Content-Length")
            .and_then(|len| len.parse().ok());

        let part_path = dest.with_extension("part");
        let result = stream_to_file(response.into_reader(), &part_path, total, cancel);
        if let Err(e) = result {
            let _ = fs::remove_file(&part_path);
            return Err(e);
        }

        fs::rename(&part_path, dest).map_err(|e| {
            BootstrapError::Download(format!("Failed to move installer to {:?}: {}", dest, e))
        })?;

        info!("Installer downloaded to: {:?}", dest);
        Ok(())
    }

    fn run_silent(
        &self,
        installer: &Path,
        timeout: Option<Duration>,
        cancel: &CancelToken,
    ) -> Result<i32, BootstrapError> {
        info!("Running Ghostscript installer silently: {:?}", installer);

        let mut cmd = Command::new(installer);
        cmd.arg(SILENT_FLAG);

        match run_with_control(&mut cmd, timeout, cancel) {
            Ok(output) => Ok(output.exit_code()),
            Err(CommandRunError::Cancelled) => Err(BootstrapError::Cancelled),
            Err(e) => Err(BootstrapError::InstallerLaunch(e.to_string())),
        }
    }
}

fn stream_to_file(
    mut reader: impl Read,
    path: &Path,
    total: Option<u64>,
    cancel: &CancelToken,
) -> Result<(), BootstrapError> {
    let io_error = |e: std::io::Error| BootstrapError::Download(format!("{:?}: {}", path, e));

    let mut file = File::create(path).map_err(io_error)?;
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut downloaded: u64 = 0;
    let mut last_logged_percent = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(BootstrapError::Cancelled);
        }

        let read = reader.read(&mut buf).map_err(io_error)?;
        if read == 0 {
            break;
        }
        file.write_all(&buf[..read]).map_err(io_error)?;
        downloaded += read as u64;

        if let Some(total) = total.filter(|t| *t > 0) {
            let percent = (downloaded * 100 / total).min(100);
            if percent >= last_logged_percent + 25 {
                last_logged_percent = percent;
                debug!("Installer download {}% ({} / {} bytes)", percent, downloaded, total);
            }
        }
    }

    file.sync_all().map_err(io_error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_stream_to_file_writes_all_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("installer.part");
        let payload = vec![7u8; CHUNK_SIZE * 2 + 10];

        stream_to_file(
            Cursor::new(payload.clone()),
            &path,
            Some(payload.len() as u64),
            &CancelToken::new(),
        )
        .unwrap();

        assert_eq!(fs::read(&path).unwrap(), payload);
    }

    #[test]
    fn test_stream_to_file_stops_when_cancelled() {
        let dir = tempfile::tempdir().unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();

        let result = stream_to_file(
            Cursor::new(vec![1u8; 16]),
            &dir.path().join("installer.part"),
            None,
            &cancel,
        );

        assert!(matches!(result, Err(BootstrapError::Cancelled)));
    }

    #[cfg(not(windows))]
    #[test]
    fn test_download_unsupported_off_windows() {
        let dir = tempfile::tempdir().unwrap();
        let result = SystemInstaller.download(
            "https://example.invalid/gs.exe",
            &dir.path().join("gs.exe"),
            &CancelToken::new(),
        );
        assert!(matches!(result, Err(BootstrapError::Unsupported)));
    }
}
