use std::io;
use std::path::PathBuf;
use std::process::Stdio;

use thiserror::Error;
use tokio::io::AsyncRead;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShfmtRunRequest {
  pub executable_path: PathBuf,
  pub args: Vec<String>,
  pub input: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShfmtRunResult {
  pub stdout: String,
  pub stderr: String,
  /// `None` when the process was terminated by a signal.
  pub exit_code: Option<i32>,
}

#[derive(Debug, Error)]
pub enum RunError {
  #[error("Failed to start shfmt at {}", path.display())]
  Spawn {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
  #[error("Failed communicating with shfmt at {}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// Runs shfmt, providing the input on stdin and collecting its output.
///
/// A non-zero exit code is not an error here. Cancelling the token kills
/// the process, which then resolves with whatever output was collected.
pub async fn run_shfmt(request: ShfmtRunRequest, token: Option<CancellationToken>) -> Result<ShfmtRunResult, RunError> {
  let ShfmtRunRequest {
    executable_path,
    args,
    input,
  } = request;
  let mut child = Command::new(&executable_path)
    .args(&args)
    .stdin(Stdio::piped())
    .stdout(Stdio::piped())
    .stderr(Stdio::piped())
    .kill_on_drop(true)
    .spawn()
    .map_err(|source| RunError::Spawn {
      path: executable_path.clone(),
      source,
    })?;

  let stdin = child.stdin.take();
  let stdout = child.stdout.take();
  let stderr = child.stderr.take();

  let write_stdin = async move {
    if let Some(mut stdin) = stdin {
      match stdin.write_all(input.as_bytes()).await {
        Ok(()) => {}
        // the process exited without reading everything
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => {}
        Err(err) => return Err(err),
      }
      // dropping stdin closes it
    }
    Ok(())
  };
  let wait = async {
    match &token {
      Some(token) => tokio::select! {
        status = child.wait() => status,
        _ = token.cancelled() => {
          // may have exited in the meantime
          let _ = child.start_kill();
          child.wait().await
        }
      },
      None => child.wait().await,
    }
  };

  let (write_result, stdout_result, stderr_result, status_result) = tokio::join!(write_stdin, read_to_end(stdout), read_to_end(stderr), wait);
  let to_io_error = |source: io::Error| RunError::Io {
    path: executable_path.clone(),
    source,
  };
  let status = status_result.map_err(to_io_error)?;
  write_result.map_err(to_io_error)?;
  let stdout = stdout_result.map_err(to_io_error)?;
  let stderr = stderr_result.map_err(to_io_error)?;

  Ok(ShfmtRunResult {
    stdout: String::from_utf8_lossy(&stdout).into_owned(),
    stderr: String::from_utf8_lossy(&stderr).into_owned(),
    exit_code: status.code(),
  })
}

async fn read_to_end(reader: Option<impl AsyncRead + Unpin>) -> io::Result<Vec<u8>> {
  let mut bytes = Vec::new();
  if let Some(mut reader) = reader {
    reader.read_to_end(&mut bytes).await?;
  }
  Ok(bytes)
}
