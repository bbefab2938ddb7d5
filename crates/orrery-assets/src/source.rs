use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::AssetError;

/// Where an asset's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetSource {
    File(PathBuf),
    Url(String),
}

impl AssetSource {
    /// `http://` and `https://` references are URLs; anything else is a path,
    /// joined onto `root` unless already absolute.
    pub fn resolve(reference: &str, root: &Path) -> Self {
        if reference.starts_with("http://") || reference.starts_with("https://") {
            AssetSource::Url(reference.to_string())
        } else {
            AssetSource::File(root.join(reference))
        }
    }

    /// Human-readable name for logs and errors.
    pub fn display_name(&self) -> String {
        match self {
            AssetSource::File(path) => path.display().to_string(),
            AssetSource::Url(url) => url.clone(),
        }
    }
}

/// Give up on a host that does not accept the connection within this time.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Give up on a response that stalls for this long between reads.
pub const READ_TIMEOUT: Duration = Duration::from_secs(10);
/// Largest response body accepted from a URL.
pub const MAX_BODY_BYTES: u64 = 64 * 1024 * 1024;

/// Blocking reader for asset bytes, shared by the loader's workers.
///
/// URL fetches go through one `ureq` agent with connect and read timeouts, so
/// a stalled server cannot pin a worker forever, and bodies are capped at
/// `max_body_bytes`.
#[derive(Debug, Clone)]
pub struct Fetcher {
    agent: ureq::Agent,
    max_body_bytes: u64,
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::with_limits(CONNECT_TIMEOUT, READ_TIMEOUT, MAX_BODY_BYTES)
    }
}

impl Fetcher {
    pub fn with_limits(connect: Duration, read: Duration, max_body_bytes: u64) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(connect)
            .timeout_read(read)
            .build();
        Self {
            agent,
            max_body_bytes,
        }
    }

    /// Reads the full contents of `source`.
    pub fn read_bytes(&self, source: &AssetSource) -> Result<Vec<u8>, AssetError> {
        match source {
            AssetSource::File(path) => std::fs::read(path).map_err(|source| AssetError::Io {
                path: path.clone(),
                source,
            }),
            AssetSource::Url(url) => self.fetch(url),
        }
    }

    fn fetch(&self, url: &str) -> Result<Vec<u8>, AssetError> {
        let response = self.agent.get(url).call().map_err(|source| AssetError::Http {
            url: url.to_string(),
            source: Box::new(source),
        })?;

        let mut bytes = Vec::new();
        response
            .into_reader()
            .take(self.max_body_bytes + 1)
            .read_to_end(&mut bytes)
            .map_err(|source| AssetError::Body {
                url: url.to_string(),
                source,
            })?;
        if bytes.len() as u64 > self.max_body_bytes {
            return Err(AssetError::TooLarge {
                url: url.to_string(),
                limit: self.max_body_bytes,
            });
        }
        Ok(bytes)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::net::TcpListener;
    use std::time::Instant;

    use super::*;

    #[test]
    fn test_resolve_relative_path() {
        let source = AssetSource::resolve("flags/india.png", Path::new("assets"));
        assert_eq!(
            source,
            AssetSource::File(PathBuf::from("assets/flags/india.png"))
        );
    }

    #[test]
    fn test_resolve_url() {
        let url = "https://threejs.org/examples/fonts/helvetiker_regular.typeface.json";
        assert_eq!(
            AssetSource::resolve(url, Path::new("assets")),
            AssetSource::Url(url.to_string())
        );
    }

    #[test]
    fn test_read_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.bin"), [1u8, 2, 3]).unwrap();
        let source = AssetSource::resolve("a.bin", dir.path());
        assert_eq!(Fetcher::default().read_bytes(&source).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = AssetSource::resolve("missing.png", dir.path());
        assert!(matches!(
            Fetcher::default().read_bytes(&source),
            Err(AssetError::Io { .. })
        ));
    }

    /// Serves one connection with a fixed body, then closes.
    fn serve_once(body: &'static [u8]) -> String {
        use std::io::Write;

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = [0u8; 1024];
            let _ = stream.read(&mut request);
            let header = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            let _ = stream.write_all(header.as_bytes());
            let _ = stream.write_all(body);
        });
        format!("http://{addr}/asset.bin")
    }

    /// Accepts connections and never answers them.
    pub(crate) fn stalled_server() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            let mut held = Vec::new();
            for stream in listener.incoming().flatten() {
                held.push(stream);
            }
        });
        format!("http://{addr}/font.json")
    }

    #[test]
    fn test_url_body_within_limit() {
        let url = serve_once(b"0123456789");
        let fetcher = Fetcher::with_limits(CONNECT_TIMEOUT, Duration::from_secs(2), 16);
        let bytes = fetcher.read_bytes(&AssetSource::Url(url)).unwrap();
        assert_eq!(bytes, b"0123456789");
    }

    #[test]
    fn test_url_body_over_limit_is_rejected() {
        let url = serve_once(b"0123456789");
        let fetcher = Fetcher::with_limits(CONNECT_TIMEOUT, Duration::from_secs(2), 4);
        assert!(matches!(
            fetcher.read_bytes(&AssetSource::Url(url)),
            Err(AssetError::TooLarge { limit: 4, .. })
        ));
    }

    #[test]
    fn test_stalled_server_times_out() {
        let url = stalled_server();
        let fetcher = Fetcher::with_limits(CONNECT_TIMEOUT, Duration::from_millis(200), 16);
        let started = Instant::now();
        let result = fetcher.read_bytes(&AssetSource::Url(url));
        assert!(matches!(result, Err(AssetError::Http { .. })));
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
