use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::mpsc;

use crate::app::IpcCommandWithResponse;
use hashira_ipc::{Command, Response};

/// Line-delimited JSON command server. Each request line is forwarded to the
/// event loop and answered with exactly one response line.
pub struct IpcServer {
    socket_path: PathBuf,
    cmd_tx: mpsc::Sender<IpcCommandWithResponse>,
}

impl IpcServer {
    pub fn new(
        socket_path: impl Into<PathBuf>,
        cmd_tx: mpsc::Sender<IpcCommandWithResponse>,
    ) -> Self {
        Self {
            socket_path: socket_path.into(),
            cmd_tx,
        }
    }

    pub async fn run(&self) -> Result<()> {
        remove_stale_socket(&self.socket_path).await?;

        let listener = UnixListener::bind(&self.socket_path)?;
        tracing::info!("IPC server listening on {:?}", self.socket_path);

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    let cmd_tx = self.cmd_tx.clone();
                    tokio::spawn(async move {
                        if let Err(e) = Self::handle_connection(stream, cmd_tx).await {
                            tracing::error!("Connection error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    tracing::error!("Accept error: {}", e);
                }
            }
        }
    }

    async fn handle_connection(
        stream: UnixStream,
        cmd_tx: mpsc::Sender<IpcCommandWithResponse>,
    ) -> Result<()> {
        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);
        let mut line = String::new();

        loop {
            line.clear();
            let n = reader.read_line(&mut line).await?;
            if n == 0 {
                break;
            }

            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let response = answer(line, &cmd_tx).await;
            let response_json = serde_json::to_string(&response)?;
            writer.write_all(response_json.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }

        Ok(())
    }
}

/// A socket that still accepts connections belongs to a running daemon and
/// is left alone. Anything else at that path is a leftover from a crash.
async fn remove_stale_socket(path: &Path) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }
    if UnixStream::connect(path).await.is_ok() {
        bail!("another hashira daemon is listening on {:?}", path);
    }
    tracing::debug!("Removing stale socket {:?}", path);
    std::fs::remove_file(path)?;
    Ok(())
}

/// Forwards one request line to the event loop and waits for its answer.
async fn answer(line: &str, cmd_tx: &mpsc::Sender<IpcCommandWithResponse>) -> Response {
    let cmd = match serde_json::from_str::<Command>(line) {
        Ok(cmd) => cmd,
        Err(e) => {
            return Response::Error {
                message: format!("Invalid command: {}", e),
            }
        }
    };
    tracing::debug!("Received command: {:?}", cmd);

    let (resp_tx, mut resp_rx) = mpsc::channel(1);
    if cmd_tx.send((cmd, resp_tx)).await.is_err() {
        return Response::Error {
            message: "Daemon is shutting down".to_string(),
        };
    }
    resp_rx.recv().await.unwrap_or(Response::Error {
        message: "Daemon dropped the request".to_string(),
    })
}

impl Drop for IpcServer {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.socket_path);
    }
}
