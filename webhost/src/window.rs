//! Native window collaborator.
//!
//! The host only needs three things from a window: point it at the service
//! URL, learn once when the user closed it, and close it during teardown.
//! [`BrowserWindow`] provides those by running a Chromium-family browser in
//! app mode; the browser process exiting is the "closed" event.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};

use tempfile::TempDir;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::config::UiConfig;
use crate::error::Error;

/// Browsers searched for on `PATH` when none is configured.
const BROWSER_CANDIDATES: &[&str] = &[
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
    "microsoft-edge",
    "chrome",
    "msedge",
];

#[cfg(target_os = "macos")]
const MACOS_BROWSERS: &[&str] = &[
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    "/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
];

/// A native window showing the service.
pub trait Window: Send + Sync {
    /// Navigates the window to `url`, opening it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Window`] if the window cannot be shown.
    fn load(&self, url: &Url) -> Result<(), Error>;

    /// Token cancelled once, when the window has been closed.
    fn closed(&self) -> CancellationToken;

    /// Asks the window to close. Idempotent.
    ///
    /// Teardown is finished once [`closed`](Self::closed) is cancelled.
    fn close(&self);
}

/// Window backed by a browser process in `--app` mode.
#[derive(Debug)]
pub struct BrowserWindow {
    browser: PathBuf,
    size: (u32, u32),
    profile: TempDir,
    launched: AtomicBool,
    closed: CancellationToken,
    kill: CancellationToken,
}

impl BrowserWindow {
    /// Resolves the browser executable and prepares a window.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Window`] if no browser executable can be found or
    /// the profile directory cannot be created.
    pub fn new(config: &UiConfig) -> Result<Self, Error> {
        let browser = match &config.browser {
            Some(path) => path.clone(),
            None => find_browser().ok_or_else(|| {
                Error::Window("no Chromium-family browser found, set ui.browser".into())
            })?,
        };
        let profile = tempfile::Builder::new()
            .prefix("webhost-profile-")
            .tempdir()
            .map_err(|e| Error::Window(format!("profile directory: {e}")))?;
        Ok(Self {
            browser,
            size: config.window_size(),
            profile,
            launched: AtomicBool::new(false),
            closed: CancellationToken::new(),
            kill: CancellationToken::new(),
        })
    }

    /// Browser profile directory, removed when the window is dropped.
    #[must_use]
    pub fn profile_dir(&self) -> &Path {
        self.profile.path()
    }

    /// Command line passed to the browser for `url`.
    #[must_use]
    pub fn args(&self, url: &Url) -> Vec<String> {
        let (width, height) = self.size;
        vec![
            format!("--app={url}"),
            format!("--window-size={width},{height}"),
            format!("--user-data-dir={}", self.profile.path().display()),
            "--no-first-run".to_owned(),
            "--no-default-browser-check".to_owned(),
            "--disable-sync".to_owned(),
        ]
    }
}

impl Window for BrowserWindow {
    fn load(&self, url: &Url) -> Result<(), Error> {
        if self.kill.is_cancelled() {
            return Err(Error::Window("window already closed".into()));
        }
        if self.launched.swap(true, Ordering::SeqCst) {
            return Err(Error::Window("window already open".into()));
        }
        let mut child = Command::new(&self.browser)
            .args(self.args(url))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                self.launched.store(false, Ordering::SeqCst);
                Error::Window(format!("launch {}: {e}", self.browser.display()))
            })?;
        tracing::info!(browser = %self.browser.display(), %url, "window opened");

        let closed = self.closed.clone();
        let kill = self.kill.clone();
        tokio::spawn(async move {
            tokio::select! {
                status = child.wait() => match status {
                    Ok(status) => tracing::info!(%status, "window closed"),
                    Err(e) => tracing::warn!(error = %e, "lost track of window process"),
                },
                () = kill.cancelled() => {
                    if let Err(e) = child.kill().await {
                        tracing::warn!(error = %e, "failed to close window");
                    }
                }
            }
            closed.cancel();
        });
        Ok(())
    }

    fn closed(&self) -> CancellationToken {
        self.closed.clone()
    }

    fn close(&self) {
        self.kill.cancel();
        if !self.launched.load(Ordering::SeqCst) {
            self.closed.cancel();
        }
    }
}

fn find_browser() -> Option<PathBuf> {
    #[cfg(target_os = "macos")]
    if let Some(found) = MACOS_BROWSERS.iter().map(PathBuf::from).find(|p| p.is_file()) {
        return Some(found);
    }
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path).find_map(|dir| search_dir(&dir))
}

fn search_dir(dir: &Path) -> Option<PathBuf> {
    BROWSER_CANDIDATES.iter().find_map(|name| {
        let candidate = dir.join(name);
        if candidate.is_file() {
            return Some(candidate);
        }
        let exe = candidate.with_extension("exe");
        exe.is_file().then_some(exe)
    })
}
