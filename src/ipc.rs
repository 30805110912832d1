//! The control socket.
//!
//! A Unix-domain socket speaking a newline-terminated text protocol. Each
//! line is decoded into a [`Command`] at this boundary and forwarded to the
//! reactor. Query commands wait for the reactor's reply, write it back, and
//! keep the connection open for more queries; any other command closes the
//! connection once it has been handed off. Malformed lines get a diagnostic
//! and the connection is closed.

use std::io::{BufRead, BufReader, Read, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::PathBuf;
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::Context;
use once_cell::sync::Lazy;
use tracing::{debug, warn};

use crate::command;
use crate::reactor::{Event, EventSender};

const QUERY_REPLY_TIMEOUT: Duration = Duration::from_secs(2);
const CLIENT_READ_TIMEOUT: Duration = Duration::from_secs(30);

static SOCKET_PATH: Lazy<PathBuf> = Lazy::new(|| {
    let user = std::env::var("USER").unwrap_or_else(|_| "shared".into());
    std::env::temp_dir().join(format!("tatami_{user}.socket"))
});

pub fn socket_path() -> PathBuf { SOCKET_PATH.clone() }

/// Binds the control socket and starts the accept loop. Failing to bind is
/// fatal for the daemon; the caller exits.
pub fn spawn_server(events: EventSender) -> anyhow::Result<JoinHandle<()>> {
    let path = socket_path();
    if path.exists() {
        // A live socket means another instance owns it.
        if UnixStream::connect(&path).is_ok() {
            anyhow::bail!("another instance is already listening on {}", path.display());
        }
        std::fs::remove_file(&path)
            .with_context(|| format!("removing stale socket {}", path.display()))?;
    }
    let listener = UnixListener::bind(&path)
        .with_context(|| format!("binding control socket {}", path.display()))?;
    debug!(path = %path.display(), "control socket bound");

    let handle = std::thread::Builder::new()
        .name("ipc-listener".into())
        .spawn(move || {
            for stream in listener.incoming() {
                match stream {
                    Ok(stream) => {
                        let events = events.clone();
                        let _ = std::thread::Builder::new()
                            .name("ipc-client".into())
                            .spawn(move || handle_client(stream, events));
                    }
                    Err(err) => {
                        warn!(%err, "accept failed");
                        break;
                    }
                }
            }
        })
        .context("spawning the ipc listener thread")?;
    Ok(handle)
}

fn handle_client(stream: UnixStream, events: EventSender) {
    let _ = stream.set_read_timeout(Some(CLIENT_READ_TIMEOUT));
    let mut writer = match stream.try_clone() {
        Ok(writer) => writer,
        Err(_) => return,
    };
    let mut reader = BufReader::new(stream);
    let mut line = String::new();

    loop {
        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) | Err(_) => return,
            Ok(_) => {}
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match command::parse_line(trimmed) {
            Ok(command) if command.is_query() => {
                let (tx, rx) = crossbeam_channel::bounded(1);
                events.send(Event::Command {
                    command,
                    reply: Some(tx),
                });
                let response = rx
                    .recv_timeout(QUERY_REPLY_TIMEOUT)
                    .unwrap_or_else(|_| String::from(""));
                if writer.write_all(response.as_bytes()).is_err()
                    || writer.write_all(b"\n").is_err()
                {
                    return;
                }
                // Queries keep the connection open.
            }
            Ok(command) => {
                events.send(Event::Command { command, reply: None });
                return;
            }
            Err(err) => {
                let _ = writeln!(writer, "tatami: {err}");
                return;
            }
        }
    }
}

/// Client side: sends one command line and returns whatever the daemon
/// writes back (empty for non-queries).
///
/// Sending is transport-level only: success means the daemon accepted the
/// line, not that the command changed anything.
pub fn send_command(message: &str) -> anyhow::Result<String> {
    let path = socket_path();
    let mut stream = UnixStream::connect(&path)
        .with_context(|| format!("connecting to {}; is the daemon running?", path.display()))?;
    stream.write_all(message.as_bytes())?;
    stream.write_all(b"\n")?;
    stream.set_read_timeout(Some(QUERY_REPLY_TIMEOUT))?;

    let mut response = String::new();
    let mut buf = [0u8; 4096];
    loop {
        match stream.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                response.push_str(&String::from_utf8_lossy(&buf[..n]));
                if response.ends_with('\n') {
                    break;
                }
            }
            Err(_) => break,
        }
    }
    Ok(response.trim_end().to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::command::Command;
    use crate::common::config::Settings;
    use crate::reactor::Reactor;
    use crate::sys::window_server::SimulatedWindowServer;

    #[test]
    fn query_round_trips_over_the_socket() {
        let server = Arc::new(SimulatedWindowServer::new());
        let layouts = tempfile::tempdir().unwrap();
        let reactor = Reactor::new(
            server,
            Settings::default(),
            None,
            layouts.path().to_path_buf(),
        );
        let (events, _worker) = reactor.spawn();
        let _listener = spawn_server(events.clone()).unwrap();

        assert_eq!(send_command("query tiling mode").unwrap(), "bsp");
        assert_eq!(send_command("query window focused id").unwrap(), "-1");

        let diagnostic = send_command("bogus nonsense").unwrap();
        assert!(diagnostic.starts_with("tatami:"), "got {diagnostic:?}");

        // Non-queries are accepted silently and the daemon closes the line.
        assert_eq!(send_command("space -t monocle").unwrap(), "");
        assert_eq!(send_command("query tiling mode").unwrap(), "bsp");

        events.send(Event::Command {
            command: Command::Quit,
            reply: None,
        });
    }
}
