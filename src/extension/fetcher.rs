use std::fs::OpenOptions;
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::extension::error::{FetchCause, FetchError};

const CHUNK_SIZE: usize = 16 * 1024;

/// Progress after one chunk has been written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub bytes_read: u64,
    pub chunk_size: usize,
    pub total_size: Option<u64>,
}

impl Progress {
    /// Completed fraction in `[0, 1]`; 0 while the total is unknown.
    pub fn fraction(&self) -> f64 {
        match self.total_size {
            Some(total) if total > 0 => (self.bytes_read as f64 / total as f64).clamp(0.0, 1.0),
            _ => 0.0,
        }
    }
}

/// Shared flag a job's owner flips to stop its worker.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub trait Fetcher: Send + Sync {
    /// Streams `url` into the existing file at `dest`, truncating it first.
    /// The file is left in place on failure.
    fn fetch(
        &self,
        url: &str,
        dest: &Path,
        on_progress: &mut dyn FnMut(Progress),
        cancel: &CancelToken,
    ) -> Result<(), FetchError>;
}

pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent.to_string())
            .build()?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(
        &self,
        url: &str,
        dest: &Path,
        on_progress: &mut dyn FnMut(Progress),
        cancel: &CancelToken,
    ) -> Result<(), FetchError> {
        let fail = |cause: FetchCause| FetchError::new(url, cause);

        let mut response = self
            .client
            .get(url)
            .send()
            .map_err(|err| fail(err.into()))?;

        // The body is kept whatever the status; verification decides.
        if !response.status().is_success() {
            tracing::warn!("{url} answered {}", response.status());
        }

        let total_size = response.content_length();
        let file = OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(dest)
            .map_err(|err| fail(err.into()))?;
        copy_chunks(&mut response, BufWriter::new(file), total_size, on_progress, cancel)
            .map_err(fail)
    }
}

/// Copies `reader` into `writer` one chunk at a time, reporting each chunk.
pub(crate) fn copy_chunks<R: Read, W: Write>(
    reader: &mut R,
    mut writer: W,
    total_size: Option<u64>,
    on_progress: &mut dyn FnMut(Progress),
    cancel: &CancelToken,
) -> Result<(), FetchCause> {
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut bytes_read = 0u64;

    loop {
        if cancel.is_cancelled() {
            return Err(FetchCause::Cancelled);
        }

        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        writer.write_all(&buf[..n])?;
        bytes_read += n as u64;

        on_progress(Progress {
            bytes_read,
            chunk_size: n,
            total_size,
        });
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::{BufRead, BufReader};
    use std::net::TcpListener;
    use std::thread;

    /// Serves exactly one HTTP response on a random local port.
    fn serve_once(status: &str, body: Vec<u8>, with_length: bool) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let status = status.to_string();

        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut line = String::new();
            loop {
                line.clear();
                if reader.read_line(&mut line).unwrap() == 0 || line == "\r\n" {
                    break;
                }
            }

            let mut head = format!("HTTP/1.1 {status}\r\nConnection: close\r\n");
            if with_length {
                head.push_str(&format!("Content-Length: {}\r\n", body.len()));
            }
            head.push_str("\r\n");
            stream.write_all(head.as_bytes()).unwrap();
            stream.write_all(&body).unwrap();
        });

        format!("http://{addr}/chat.tar")
    }

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(Duration::from_secs(5), "webinstall-test").unwrap()
    }

    #[test]
    fn streams_body_and_reports_progress() {
        let body: Vec<u8> = (0..40_000u32).map(|i| (i % 251) as u8).collect();
        let url = serve_once("200 OK", body.clone(), true);
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("job.tar");
        fs::write(&dest, b"stale contents that must go").unwrap();

        let mut reports = Vec::new();
        fetcher()
            .fetch(&url, &dest, &mut |p| reports.push(p), &CancelToken::new())
            .unwrap();

        assert_eq!(fs::read(&dest).unwrap(), body);
        let last = reports.last().unwrap();
        assert_eq!(last.bytes_read, body.len() as u64);
        assert_eq!(last.total_size, Some(body.len() as u64));
        assert_eq!(last.fraction(), 1.0);
        assert!(reports.windows(2).all(|w| w[0].bytes_read < w[1].bytes_read));
    }

    #[test]
    fn body_without_content_length_streams_with_unknown_total() {
        let body: Vec<u8> = (0..40_000u32).map(|i| (i % 13) as u8).collect();
        let url = serve_once("200 OK", body.clone(), false);
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("job.tar");
        fs::write(&dest, b"").unwrap();

        let mut reports = Vec::new();
        fetcher()
            .fetch(&url, &dest, &mut |p| reports.push(p), &CancelToken::new())
            .unwrap();

        assert_eq!(fs::read(&dest).unwrap(), body);
        assert!(!reports.is_empty());
        assert!(reports.iter().all(|p| p.total_size.is_none() && p.fraction() == 0.0));
        assert_eq!(reports.last().unwrap().bytes_read, body.len() as u64);
    }

    #[test]
    fn error_status_still_counts_as_downloaded() {
        let url = serve_once("404 Not Found", b"not here".to_vec(), true);
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("job.tar");
        fs::write(&dest, b"").unwrap();

        fetcher()
            .fetch(&url, &dest, &mut |_| {}, &CancelToken::new())
            .unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"not here");
    }

    #[test]
    fn unreachable_host_is_a_fetch_error_and_keeps_the_file() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("job.tar");
        fs::write(&dest, b"").unwrap();

        let url = format!("http://{addr}/chat.tar");
        let err = fetcher()
            .fetch(&url, &dest, &mut |_| {}, &CancelToken::new())
            .unwrap_err();
        assert_eq!(err.url, url);
        assert!(!err.is_cancelled());
        assert!(dest.exists());
    }

    #[test]
    fn unknown_total_reports_zero_fraction() {
        let progress = Progress {
            bytes_read: 10,
            chunk_size: 10,
            total_size: None,
        };
        assert_eq!(progress.fraction(), 0.0);

        let progress = Progress {
            total_size: Some(0),
            ..progress
        };
        assert_eq!(progress.fraction(), 0.0);
    }

    #[test]
    fn cancelled_copy_stops_before_reading() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let mut source: &[u8] = b"payload";
        let mut sink = Vec::new();

        let err = copy_chunks(&mut source, &mut sink, None, &mut |_| {}, &cancel).unwrap_err();
        assert!(matches!(err, FetchCause::Cancelled));
        assert!(sink.is_empty());
    }
}
