use anyhow::{Context, Result};
use axum::Router;
use axum_server::{tls_rustls::RustlsConfig, Handle};
use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// In-flight requests get this long to finish once shutdown starts
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// PEM certificate chain and private key for HTTPS
#[derive(Debug, Clone)]
pub struct TlsFiles {
    pub cert: PathBuf,
    pub key: PathBuf,
}

impl TlsFiles {
    /// Both paths or neither; one alone is a startup error
    pub fn from_args(cert: Option<PathBuf>, key: Option<PathBuf>) -> Result<Option<Self>> {
        match (cert, key) {
            (Some(cert), Some(key)) => Ok(Some(Self { cert, key })),
            (None, None) => Ok(None),
            _ => anyhow::bail!("--tls-cert and --tls-key must be given together"),
        }
    }
}

/// Serve the router over HTTPS until `shutdown` resolves, then drain
/// open connections
pub async fn serve_https<F>(
    router: Router,
    addr: SocketAddr,
    files: &TlsFiles,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    tracing::info!(
        cert = %files.cert.display(),
        key = %files.key.display(),
        "Loading TLS certificates"
    );
    let config = RustlsConfig::from_pem_file(&files.cert, &files.key)
        .await
        .with_context(|| format!("Failed to load TLS files for {}", addr))?;

    let handle = Handle::new();
    let drain = handle.clone();
    tokio::spawn(async move {
        shutdown.await;
        drain.graceful_shutdown(Some(DRAIN_TIMEOUT));
    });

    axum_server::bind_rustls(addr, config)
        .handle(handle)
        .serve(router.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .context("HTTPS server failed")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tls_files_need_both_paths() {
        assert!(TlsFiles::from_args(None, None).unwrap().is_none());
        assert!(TlsFiles::from_args(Some("cert.pem".into()), None).is_err());

        let files = TlsFiles::from_args(Some("cert.pem".into()), Some("key.pem".into()))
            .unwrap()
            .unwrap();
        assert_eq!(files.key, PathBuf::from("key.pem"));
    }
}
