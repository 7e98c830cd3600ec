//! CLI binary self-update from a configured download URL.
//!
//! Advisory by design: a failed download is reported to the caller, which
//! logs it and keeps whatever binary is already installed.

use std::path::Path;
use std::time::Duration;

use crate::config::is_set;
use crate::error::{Error, Result};
use crate::safe_io;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const READ_TIMEOUT: Duration = Duration::from_secs(60);

/// Fetch the CLI binary over HTTP(S), optionally with basic auth, and
/// install it executable at `dest`. The write is atomic so a half-finished
/// download never replaces a working binary.
pub async fn download_cli(
    url: &str,
    username: &str,
    password: &str,
    dest: &Path,
) -> Result<()> {
    if !is_set(url) {
        return Err(Error::Download("no download URL configured".into()));
    }

    let client = reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(READ_TIMEOUT)
        .build()
        .map_err(|e| Error::Download(e.to_string()))?;

    let mut request = client.get(url);
    if is_set(username) && is_set(password) {
        request = request.basic_auth(username.trim(), Some(password.trim()));
    }

    let response = request
        .send()
        .await
        .map_err(|e| Error::Download(format!("GET {url}: {e}")))?;
    if !response.status().is_success() {
        return Err(Error::Download(format!(
            "GET {url}: HTTP {}",
            response.status()
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| Error::Download(format!("reading body from {url}: {e}")))?;
    safe_io::atomic_write(dest, &bytes)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = std::fs::metadata(dest)?.permissions();
        perms.set_mode(perms.mode() | 0o755);
        std::fs::set_permissions(dest, perms)?;
    }

    log::info!("installed CLI from {url} to {}", dest.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_url_is_rejected_up_front() {
        let err = download_cli("", "", "", Path::new("/tmp/cli"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Download(_)));
    }

    #[tokio::test]
    async fn unreachable_host_reports_download_error() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("cli");
        // Discard port on loopback; the connection is refused immediately.
        let err = download_cli("http://127.0.0.1:9/cli", "u", "p", &dest)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Download(_)));
        assert!(!dest.exists(), "no partial file on failure");
    }
}
