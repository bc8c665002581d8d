use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use hashira_ipc::{Command, Response};

/// A busy daemon answers well within this; a hung one should not hang the CLI.
const RESPONSE_TIMEOUT: Duration = Duration::from_secs(5);

pub struct IpcClient {
    reader: BufReader<UnixStream>,
}

impl IpcClient {
    pub fn connect(socket_path: &Path) -> Result<Self> {
        let stream = UnixStream::connect(socket_path).with_context(|| {
            format!(
                "Failed to connect to hashira daemon at {:?} (is `hashira start` running?)",
                socket_path
            )
        })?;
        stream.set_read_timeout(Some(RESPONSE_TIMEOUT))?;
        Ok(Self {
            reader: BufReader::new(stream),
        })
    }

    pub fn send(&mut self, cmd: &Command) -> Result<Response> {
        let stream = self.reader.get_mut();
        serde_json::to_writer(&mut *stream, cmd)?;
        stream.write_all(b"\n")?;
        stream.flush()?;

        let mut line = String::new();
        self.reader
            .read_line(&mut line)
            .context("No response from hashira daemon")?;
        if line.is_empty() {
            bail!("Daemon closed the connection");
        }

        serde_json::from_str(&line).context("Malformed response from hashira daemon")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::net::UnixListener;

    #[test]
    fn test_send_round_trips_one_line() {
        let dir = tempfile::tempdir().unwrap();
        let socket_path = dir.path().join("hashira.sock");
        let listener = UnixListener::bind(&socket_path).unwrap();

        let daemon = std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            reader.get_mut().write_all(b"{\"type\":\"ok\"}\n").unwrap();
            line
        });

        let mut client = IpcClient::connect(&socket_path).unwrap();
        let response = client.send(&Command::Reload).unwrap();

        assert!(matches!(response, Response::Ok));
        assert_eq!(daemon.join().unwrap().trim(), "{\"type\":\"reload\"}");
    }

    #[test]
    fn test_closed_connection_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let socket_path = dir.path().join("hashira.sock");
        let listener = UnixListener::bind(&socket_path).unwrap();

        let daemon = std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
        });

        let mut client = IpcClient::connect(&socket_path).unwrap();
        let result = client.send(&Command::GetState);
        daemon.join().unwrap();

        assert!(result.is_err());
    }
}
