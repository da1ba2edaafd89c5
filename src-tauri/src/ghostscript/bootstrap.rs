// First-run bootstrap: make sure a Ghostscript binary is available
use super::{Installer, Locate};
use crate::models::{GhostscriptBinary, Settings, MANUAL_DOWNLOAD_URL};
use crate::process_manager::CancelToken;
use crate::utils::get_installer_download_path;
use log::{debug, info, warn};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("automatic installation is only available on Windows, install Ghostscript from {}", MANUAL_DOWNLOAD_URL)]
    Unsupported,
    #[error("failed to download the Ghostscript installer: {0}")]
    Download(String),
    #[error("failed to run the Ghostscript installer: {0}")]
    InstallerLaunch(String),
    #[error("the Ghostscript installer exited with code {0}")]
    InstallerExit(i32),
    #[error("Ghostscript was not found after installation ({0} checks)")]
    NotDetected(u32),
    #[error("installation was cancelled")]
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct BootstrapOptions {
    pub installer_url: String,
    pub installer_path: PathBuf,
    pub installer_timeout: Option<Duration>,
    pub poll_attempts: u32,
    pub poll_interval: Duration,
}

impl BootstrapOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            installer_url: settings.installer_url.clone(),
            installer_path: get_installer_download_path(&settings.installer_file_name),
            installer_timeout: settings.installer_timeout(),
            poll_attempts: settings.install_poll_attempts,
            poll_interval: settings.install_poll_interval(),
        }
    }
}

/// Returns the located binary, installing Ghostscript first when it is missing.
/// A binary that is already present short-circuits without any download or process launch.
pub fn ensure_available(
    locator: &dyn Locate,
    installer: &dyn Installer,
    options: &BootstrapOptions,
    cancel: &CancelToken,
) -> Result<GhostscriptBinary, BootstrapError> {
    if let Some(binary) = locator.locate() {
        info!("Ghostscript found at: {:?}", binary.path);
        return Ok(binary);
    }

    info!("Ghostscript is not installed, downloading {}", options.installer_url);
    installer.download(&options.installer_url, &options.installer_path, cancel)?;

    let exit_code = installer.run_silent(&options.installer_path, options.installer_timeout, cancel);
    if options.installer_path.exists() {
        if let Err(e) = fs::remove_file(&options.installer_path) {
            warn!("Failed to remove installer {:?}: {}", options.installer_path, e);
        }
    }

    let exit_code = exit_code?;
    if exit_code != 0 {
        return Err(BootstrapError::InstallerExit(exit_code));
    }

    info!("Installation finished, verifying...");
    wait_for_binary(locator, options, cancel)
}

/// The OS may take a moment to expose freshly installed files
fn wait_for_binary(
    locator: &dyn Locate,
    options: &BootstrapOptions,
    cancel: &CancelToken,
) -> Result<GhostscriptBinary, BootstrapError> {
    for attempt in 1..=options.poll_attempts {
        if !cancel.sleep(options.poll_interval) {
            return Err(BootstrapError::Cancelled);
        }

        if let Some(binary) = locator.locate() {
            info!("Ghostscript detected at: {:?}", binary.path);
            return Ok(binary);
        }

        debug!("Ghostscript not visible yet ({}/{})", attempt, options.poll_attempts);
    }

    Err(BootstrapError::NotDetected(options.poll_attempts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BinarySource;
    use std::cell::{Cell, RefCell};
    use std::path::Path;

    /// Reports a binary once `locate` has been called `available_after` times
    struct FakeLocator {
        calls: Cell<u32>,
        available_after: Option<u32>,
    }

    impl FakeLocator {
        fn new(available_after: Option<u32>) -> Self {
            Self {
                calls: Cell::new(0),
                available_after,
            }
        }
    }

    impl Locate for FakeLocator {
        fn locate(&self) -> Option<GhostscriptBinary> {
            self.calls.set(self.calls.get() + 1);
            match self.available_after {
                Some(n) if self.calls.get() >= n => Some(GhostscriptBinary::new(
                    PathBuf::from("/opt/gs/bin/gs"),
                    BinarySource::InstallDir,
                )),
                _ => None,
            }
        }
    }

    struct FakeInstaller {
        downloads: RefCell<Vec<String>>,
        runs: Cell<u32>,
        exit_code: i32,
        fail_download: bool,
    }

    impl FakeInstaller {
        fn new(exit_code: i32) -> Self {
            Self {
                downloads: RefCell::new(Vec::new()),
                runs: Cell::new(0),
                exit_code,
                fail_download: false,
            }
        }
    }

    impl Installer for FakeInstaller {
        fn download(&self, url: &str, dest: &Path, _cancel: &CancelToken) -> Result<(), BootstrapError> {
            self.downloads.borrow_mut().push(url.to_string());
            if self.fail_download {
                return Err(BootstrapError::Download("connection refused".to_string()));
            }
            fs::write(dest, b"installer").map_err(|e| BootstrapError::Download(e.to_string()))
        }

        fn run_silent(
            &self,
            _installer: &Path,
            _timeout: Option<Duration>,
            _cancel: &CancelToken,
        ) -> Result<i32, BootstrapError> {
            self.runs.set(self.runs.get() + 1);
            Ok(self.exit_code)
        }
    }

    fn options(dir: &Path) -> BootstrapOptions {
        BootstrapOptions {
            installer_url: "https://example.com/gs.exe".to_string(),
            installer_path: dir.join("ghostscript_installer.exe"),
            installer_timeout: None,
            poll_attempts: 10,
            poll_interval: Duration::ZERO,
        }
    }

    #[test]
    fn test_already_installed_skips_download_and_run() {
        let dir = tempfile::tempdir().unwrap();
        let locator = FakeLocator::new(Some(1));
        let installer = FakeInstaller::new(0);

        let binary = ensure_available(&locator, &installer, &options(dir.path()), &CancelToken::new()).unwrap();

        assert_eq!(binary.path, PathBuf::from("/opt/gs/bin/gs"));
        assert!(installer.downloads.borrow().is_empty());
        assert_eq!(installer.runs.get(), 0);
        assert_eq!(locator.calls.get(), 1);
    }

    #[test]
    fn test_installs_then_detects() {
        let dir = tempfile::tempdir().unwrap();
        // Initial miss, then visible on the third poll
        let locator = FakeLocator::new(Some(4));
        let installer = FakeInstaller::new(0);
        let opts = options(dir.path());

        let binary = ensure_available(&locator, &installer, &opts, &CancelToken::new()).unwrap();

        assert_eq!(binary.source, BinarySource::InstallDir);
        assert_eq!(*installer.downloads.borrow(), vec![opts.installer_url.clone()]);
        assert_eq!(installer.runs.get(), 1);
        assert_eq!(locator.calls.get(), 4);
        assert!(!opts.installer_path.exists());
    }

    #[test]
    fn test_gives_up_after_exactly_ten_polls() {
        let dir = tempfile::tempdir().unwrap();
        let locator = FakeLocator::new(None);
        let installer = FakeInstaller::new(0);

        let result = ensure_available(&locator, &installer, &options(dir.path()), &CancelToken::new());

        assert!(matches!(result, Err(BootstrapError::NotDetected(10))));
        // One initial lookup plus ten polls
        assert_eq!(locator.calls.get(), 11);
    }

    #[test]
    fn test_polls_are_spaced_by_interval() {
        let dir = tempfile::tempdir().unwrap();
        let locator = FakeLocator::new(None);
        let installer = FakeInstaller::new(0);
        let mut opts = options(dir.path());
        opts.poll_interval = Duration::from_millis(20);

        let started = std::time::Instant::now();
        let result = ensure_available(&locator, &installer, &opts, &CancelToken::new());

        assert!(matches!(result, Err(BootstrapError::NotDetected(10))));
        assert_eq!(locator.calls.get(), 11);
        assert!(started.elapsed() >= Duration::from_millis(200));
    }

    #[test]
    fn test_nonzero_installer_exit_fails_without_polling() {
        let dir = tempfile::tempdir().unwrap();
        let locator = FakeLocator::new(None);
        let installer = FakeInstaller::new(1602);

        let result = ensure_available(&locator, &installer, &options(dir.path()), &CancelToken::new());

        assert!(matches!(result, Err(BootstrapError::InstallerExit(1602))));
        assert_eq!(locator.calls.get(), 1);
    }

    #[test]
    fn test_download_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let locator = FakeLocator::new(None);
        let mut installer = FakeInstaller::new(0);
        installer.fail_download = true;

        let result = ensure_available(&locator, &installer, &options(dir.path()), &CancelToken::new());

        let err = result.unwrap_err();
        assert!(matches!(err, BootstrapError::Download(_)));
        assert!(err.to_string().contains("connection refused"));
        assert_eq!(installer.runs.get(), 0);
    }

    #[test]
    fn test_cancel_stops_polling() {
        let dir = tempfile::tempdir().unwrap();
        let locator = FakeLocator::new(None);
        let installer = FakeInstaller::new(0);
        let cancel = CancelToken::new();
        cancel.cancel();

        let mut opts = options(dir.path());
        opts.poll_interval = Duration::from_secs(2);

        let result = ensure_available(&locator, &installer, &opts, &cancel);

        assert!(matches!(result, Err(BootstrapError::Cancelled)));
        assert_eq!(locator.calls.get(), 1);
    }
}
