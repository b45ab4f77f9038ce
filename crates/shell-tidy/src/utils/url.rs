use std::io;
use std::io::Read;
use std::time::Duration;

use once_cell::sync::OnceCell;
use thiserror::Error;

use super::Logger;

const MAX_REDIRECTS: u32 = 10;
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);
const SOCKET_TIMEOUT: Duration = Duration::from_secs(30);
const MEBIBYTE: usize = 1024 * 1024;
const MAX_PREALLOCATED_SIZE: usize = 64 * MEBIBYTE;

#[derive(Debug, Error)]
pub enum DownloadError {
  #[error("HTTP {status} while downloading shfmt: {status_text}")]
  Status { url: String, status: u16, status_text: String },
  #[error("Too many redirects while downloading shfmt")]
  TooManyRedirects { url: String },
  #[error("Download timed out")]
  Timeout { url: String },
  #[error("Request error: {message}")]
  Network { url: String, message: String },
  #[error("Network error during download")]
  Read {
    url: String,
    #[source]
    source: io::Error,
  },
  #[error("Not implemented url scheme: {url}")]
  UnsupportedScheme { url: String },
  #[error("Invalid proxy in the {env_var} environment variable: {message}")]
  InvalidProxy { url: String, env_var: String, message: String },
}

impl DownloadError {
  /// The url that was being requested when the error occurred.
  pub fn url(&self) -> &str {
    match self {
      DownloadError::Status { url, .. }
      | DownloadError::TooManyRedirects { url }
      | DownloadError::Timeout { url }
      | DownloadError::Network { url, .. }
      | DownloadError::Read { url, .. }
      | DownloadError::UnsupportedScheme { url }
      | DownloadError::InvalidProxy { url, .. } => url,
    }
  }

  pub fn status_code(&self) -> Option<u16> {
    match self {
      DownloadError::Status { status, .. } => Some(*status),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ProxySetting {
  env_var: String,
  url: String,
}

#[derive(Debug, Clone)]
struct InvalidProxy {
  env_var: String,
  message: String,
}

/// Downloads over http or https.
///
/// The agents are only created on the first download, so a bad proxy
/// setting doesn't affect commands that never download.
pub struct RealUrlDownloader {
  logger: Logger,
  https_proxy: Option<ProxySetting>,
  http_proxy: Option<ProxySetting>,
  timeout: Duration,
  read_timeout: Duration,
  https_agent: OnceCell<Result<ureq::Agent, InvalidProxy>>,
  http_agent: OnceCell<Result<ureq::Agent, InvalidProxy>>,
}

impl RealUrlDownloader {
  pub fn new(logger: Logger, read_env_var: impl Fn(&str) -> Option<String>) -> Self {
    Self {
      logger,
      https_proxy: get_proxy_setting(AgentKind::Https, &read_env_var),
      http_proxy: get_proxy_setting(AgentKind::Http, &read_env_var),
      timeout: DOWNLOAD_TIMEOUT,
      read_timeout: SOCKET_TIMEOUT,
      https_agent: OnceCell::new(),
      http_agent: OnceCell::new(),
    }
  }

  fn agent(&self, kind: AgentKind, url: &str) -> Result<&ureq::Agent, DownloadError> {
    let (cell, proxy) = match kind {
      AgentKind::Https => (&self.https_agent, &self.https_proxy),
      AgentKind::Http => (&self.http_agent, &self.http_proxy),
    };
    match cell.get_or_init(|| build_agent(proxy.as_ref(), self.timeout, self.read_timeout)) {
      Ok(agent) => Ok(agent),
      Err(err) => Err(DownloadError::InvalidProxy {
        url: url.to_string(),
        env_var: err.env_var.clone(),
        message: err.message.clone(),
      }),
    }
  }

  /// Downloads the url, following redirects. There are no retries.
  pub fn download(&self, url: &str) -> Result<Vec<u8>, DownloadError> {
    let lowercase_url = url.to_lowercase();
    let agent = if lowercase_url.starts_with("https://") {
      self.agent(AgentKind::Https, url)?
    } else if lowercase_url.starts_with("http://") {
      self.agent(AgentKind::Http, url)?
    } else {
      return Err(DownloadError::UnsupportedScheme { url: url.to_string() });
    };

    log_debug!(self.logger, "Downloading url: {}", url);
    let resp = match agent.get(url).call() {
      Ok(resp) => resp,
      Err(ureq::Error::Status(status, resp)) => {
        return Err(DownloadError::Status {
          url: resp.get_url().to_string(),
          status,
          status_text: resp.status_text().to_string(),
        });
      }
      Err(ureq::Error::Transport(transport)) => return Err(map_transport_error(url, transport)),
    };

    let total_size = resp.header("Content-Length").and_then(|s| s.parse::<usize>().ok()).unwrap_or(0);
    let final_url = resp.get_url().to_string();
    let mut reader = resp.into_reader();
    self.read_response(&mut reader, total_size).map_err(|err| {
      if is_timeout_io_error(&err) {
        DownloadError::Timeout { url: final_url.clone() }
      } else {
        DownloadError::Read { url: final_url, source: err }
      }
    })
  }

  fn read_response(&self, reader: &mut impl Read, total_size: usize) -> io::Result<Vec<u8>> {
    // the content length comes from the server
    let mut final_bytes = Vec::with_capacity(total_size.min(MAX_PREALLOCATED_SIZE));
    let mut buf = [0; 8 * 1024];
    let mut next_report = MEBIBYTE;
    loop {
      let bytes_read = reader.read(&mut buf)?;
      if bytes_read == 0 {
        break;
      }
      final_bytes.extend(&buf[..bytes_read]);
      if final_bytes.len() >= next_report {
        log_debug!(self.logger, "Downloaded {:.1} MiB...", final_bytes.len() as f64 / MEBIBYTE as f64);
        next_report = (final_bytes.len() / MEBIBYTE + 1) * MEBIBYTE;
      }
    }
    Ok(final_bytes)
  }
}

fn map_transport_error(url: &str, transport: ureq::Transport) -> DownloadError {
  let url = url.to_string();
  if transport.kind() == ureq::ErrorKind::TooManyRedirects {
    return DownloadError::TooManyRedirects { url };
  }
  let mut source = std::error::Error::source(&transport);
  while let Some(err) = source {
    if let Some(io_err) = err.downcast_ref::<io::Error>()
      && is_timeout_io_error(io_err)
    {
      return DownloadError::Timeout { url };
    }
    source = err.source();
  }
  DownloadError::Network {
    url,
    message: transport.to_string(),
  }
}

fn is_timeout_io_error(err: &io::Error) -> bool {
  matches!(err.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock)
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum AgentKind {
  Http,
  Https,
}

fn build_agent(proxy: Option<&ProxySetting>, timeout: Duration, read_timeout: Duration) -> Result<ureq::Agent, InvalidProxy> {
  let mut agent = ureq::AgentBuilder::new()
    .redirects(MAX_REDIRECTS)
    .timeout(timeout)
    .timeout_read(read_timeout)
    // github sometimes behaves oddly without a user agent
    .user_agent("shell-tidy");
  if let Some(proxy) = proxy {
    let parsed = ureq::Proxy::new(&proxy.url).map_err(|err| InvalidProxy {
      env_var: proxy.env_var.clone(),
      message: err.to_string(),
    })?;
    agent = agent.proxy(parsed);
  }
  Ok(agent.build())
}

fn get_proxy_setting(kind: AgentKind, read_env_var: &impl Fn(&str) -> Option<String>) -> Option<ProxySetting> {
  match kind {
    AgentKind::Http => read_proxy_env_var("HTTP_PROXY", read_env_var),
    AgentKind::Https => read_proxy_env_var("HTTPS_PROXY", read_env_var),
  }
}

fn read_proxy_env_var(env_var_name: &str, read_env_var: &impl Fn(&str) -> Option<String>) -> Option<ProxySetting> {
  [env_var_name.to_uppercase(), env_var_name.to_lowercase()]
    .into_iter()
    .find_map(|env_var| read_env_var(&env_var).map(|url| ProxySetting { env_var, url }))
}

#[cfg(test)]
mod test {
  use std::io::BufRead;
  use std::io::BufReader;
  use std::io::Write;
  use std::net::TcpListener;
  use std::net::TcpStream;
  use std::sync::Arc;
  use std::sync::atomic::AtomicUsize;
  use std::sync::atomic::Ordering;

  use super::*;
  use crate::utils::LogLevel;
  use crate::utils::LoggerOptions;

  fn downloader_with_env(read_env_var: impl Fn(&str) -> Option<String>) -> RealUrlDownloader {
    let logger = Logger::new(&LoggerOptions {
      log_level: LogLevel::Silent,
      is_stdout_machine_readable: true,
    });
    RealUrlDownloader::new(logger, read_env_var)
  }

  fn downloader() -> RealUrlDownloader {
    downloader_with_env(|_| None)
  }

  /// Serves each connection on the loopback interface with the handler
  /// once the request head was read. Returns the base url.
  fn serve(handler: impl Fn(&mut TcpStream) + Send + Sync + 'static) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let handler = Arc::new(handler);
    std::thread::spawn(move || {
      for stream in listener.incoming() {
        let Ok(mut stream) = stream else {
          break;
        };
        let handler = handler.clone();
        std::thread::spawn(move || {
          read_request_head(&stream);
          handler(&mut stream);
        });
      }
    });
    base_url
  }

  fn read_request_head(stream: &TcpStream) {
    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let mut line = String::new();
    loop {
      line.clear();
      if reader.read_line(&mut line).unwrap_or(0) == 0 || line == "\r\n" {
        break;
      }
    }
  }

  #[test]
  fn errors_for_unsupported_scheme() {
    let err = downloader().download("ftp://example.com/shfmt").err().unwrap();
    assert_eq!(err.to_string(), "Not implemented url scheme: ftp://example.com/shfmt");
    assert_eq!(err.url(), "ftp://example.com/shfmt");
    assert_eq!(err.status_code(), None);
  }

  #[test]
  fn reads_proxy_env_vars_in_either_case() {
    let read_env_var = |name: &str| match name {
      "https_proxy" => Some("http://localhost:8080".to_string()),
      _ => None,
    };
    assert_eq!(
      get_proxy_setting(AgentKind::Https, &read_env_var),
      Some(ProxySetting {
        env_var: "https_proxy".to_string(),
        url: "http://localhost:8080".to_string(),
      })
    );
    assert_eq!(get_proxy_setting(AgentKind::Http, &read_env_var), None);
  }

  #[test]
  fn invalid_proxy_only_fails_downloads_that_use_it() {
    let downloader = downloader_with_env(|name| match name {
      "HTTPS_PROXY" => Some("ftp://proxy:21".to_string()),
      _ => None,
    });
    let err = downloader.download("https://example.com/shfmt").err().unwrap();
    assert!(matches!(err, DownloadError::InvalidProxy { .. }));
    assert!(err.to_string().starts_with("Invalid proxy in the HTTPS_PROXY environment variable: "));
    assert_eq!(err.url(), "https://example.com/shfmt");
    // the failure is remembered
    let err = downloader.download("https://example.com/other").err().unwrap();
    assert_eq!(err.url(), "https://example.com/other");

    let base_url = serve(|stream| {
      let _ = stream.write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\nConnection: close\r\n\r\nshfmt");
    });
    assert_eq!(downloader.download(&format!("{}/shfmt", base_url)).unwrap(), b"shfmt");
  }

  #[test]
  fn errors_for_too_many_redirects() {
    let request_count = Arc::new(AtomicUsize::new(0));
    let base_url = serve({
      let request_count = request_count.clone();
      move |stream| {
        request_count.fetch_add(1, Ordering::SeqCst);
        let _ = stream.write_all(b"HTTP/1.1 302 Found\r\nLocation: /next\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
      }
    });
    let url = format!("{}/start", base_url);
    let err = downloader().download(&url).err().unwrap();
    assert!(matches!(err, DownloadError::TooManyRedirects { .. }), "{:?}", err);
    assert_eq!(err.url(), url);
    assert_eq!(err.to_string(), "Too many redirects while downloading shfmt");
    assert!(request_count.load(Ordering::SeqCst) > MAX_REDIRECTS as usize);
  }

  #[test]
  fn errors_when_server_stalls() {
    let mut downloader = downloader();
    downloader.timeout = Duration::from_millis(500);
    downloader.read_timeout = Duration::from_millis(200);

    // no response at all
    let base_url = serve(|_| std::thread::sleep(Duration::from_secs(5)));
    let url = format!("{}/shfmt", base_url);
    let err = downloader.download(&url).err().unwrap();
    assert!(matches!(err, DownloadError::Timeout { .. }), "{:?}", err);
    assert_eq!(err.url(), url);
    assert_eq!(err.to_string(), "Download timed out");

    // stalls part way through the body
    let base_url = serve(|stream| {
      let _ = stream.write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\npartial");
      let _ = stream.flush();
      std::thread::sleep(Duration::from_secs(5));
    });
    let err = downloader.download(&format!("{}/shfmt", base_url)).err().unwrap();
    assert!(matches!(err, DownloadError::Timeout { .. }), "{:?}", err);
  }

  #[test]
  fn reads_response_and_reports_status_code() {
    let bytes = vec![1u8; 3 * MEBIBYTE + 10];
    let result = downloader().read_response(&mut bytes.as_slice(), 0).unwrap();
    assert_eq!(result.len(), bytes.len());

    // a bogus content length isn't trusted for the allocation
    let result = downloader().read_response(&mut b"shfmt".as_slice(), usize::MAX).unwrap();
    assert_eq!(result, b"shfmt");

    let err = DownloadError::Status {
      url: "https://example.com".to_string(),
      status: 404,
      status_text: "Not Found".to_string(),
    };
    assert_eq!(err.status_code(), Some(404));
    assert_eq!(err.to_string(), "HTTP 404 while downloading shfmt: Not Found");
  }
}
