use std::{fmt, io, time::Duration};

use tracing::{debug, warn};

use crate::error::{Error, Result};

pub const CONTENT_TYPE: &str = "application/json; charset=utf-8";
pub const ACCEPT: &str = "*/*";

/// Sink for one request body.
pub trait BodyWriter {
    fn write(&mut self, buf: &[u8]) -> Result<()>;
    fn flush(&mut self) -> Result<()>;
    fn close(&mut self) -> Result<()>;
}
impl BodyWriter for Vec<u8> {
    fn write(&mut self, buf: &[u8]) -> Result<()> {
        self.extend_from_slice(buf);
        Ok(())
    }
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// One outbound HTTP POST exchange.
pub trait Connection {
    /// Sends `body` with a fixed `Content-Length` and returns the response status.
    fn send(&mut self, body: &[u8]) -> io::Result<u16>;
    /// Reads the whole error response. `None` if the server sent none.
    fn error_body(&mut self) -> io::Result<Option<String>>;
    fn disconnect(&mut self) -> io::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    Open,
    Flushed,
    Closed,
}
impl fmt::Display for WriterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WriterState::Open => "open",
            WriterState::Flushed => "flushed",
            WriterState::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Buffers everything written to it and sends it as a single request on the
/// first flush. The writer cannot be reused afterwards.
#[derive(Debug)]
pub struct SingleFlushHttpWriter<C> {
    conn: C,
    buf: Vec<u8>,
    state: WriterState,
}
impl<C: Connection> SingleFlushHttpWriter<C> {
    pub fn new(conn: C) -> Self {
        Self {
            conn,
            buf: vec![],
            state: WriterState::Open,
        }
    }

    pub fn state(&self) -> WriterState {
        self.state
    }
    pub fn buffered(&self) -> &[u8] {
        &self.buf
    }

    fn send(&mut self) -> Result<()> {
        debug!(len = self.buf.len(), "sending request");
        let status = self.conn.send(&self.buf)?;
        if (200..300).contains(&status) {
            return Ok(());
        }
        let body = match self.conn.error_body() {
            Ok(body) => body,
            Err(e) => {
                warn!(status, "couldn't read error response: {e}");
                None
            }
        };
        Err(Error::Http { status, body })
    }
}
impl<C: Connection> BodyWriter for SingleFlushHttpWriter<C> {
    fn write(&mut self, buf: &[u8]) -> Result<()> {
        match self.state {
            WriterState::Open => {
                self.buf.extend_from_slice(buf);
                Ok(())
            }
            state => Err(Error::ProtocolState { op: "write", state }),
        }
    }

    /// Blocking I/O
    fn flush(&mut self) -> Result<()> {
        match self.state {
            WriterState::Open => (),
            state => return Err(Error::ProtocolState { op: "flush", state }),
        }
        self.state = WriterState::Flushed;
        let res = self.send();
        if let Err(e) = self.conn.disconnect() {
            warn!("couldn't disconnect: {e}");
        }
        res
    }

    fn close(&mut self) -> Result<()> {
        let res = match self.state {
            WriterState::Open => self.flush(),
            WriterState::Flushed | WriterState::Closed => Ok(()),
        };
        self.state = WriterState::Closed;
        res
    }
}
impl<C: Connection> io::Write for SingleFlushHttpWriter<C> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        BodyWriter::write(self, buf).map_err(into_io_error)?;
        Ok(buf.len())
    }
    fn flush(&mut self) -> io::Result<()> {
        BodyWriter::flush(self).map_err(into_io_error)
    }
}

fn into_io_error(e: Error) -> io::Error {
    match e {
        Error::Transport(e) => e,
        e => io::Error::other(e),
    }
}

/// [`Connection`] on a fresh `ureq` agent. The agent keeps no idle
/// connections, so every exchange opens its own socket.
#[derive(Debug)]
pub struct UreqConnection {
    agent: ureq::Agent,
    url: String,
    response: Option<ureq::Response>,
}
impl UreqConnection {
    pub fn new(url: String, connect_timeout: Duration, read_timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(connect_timeout)
            .timeout_read(read_timeout)
            .redirects(0)
            .max_idle_connections(0)
            .build();
        Self {
            agent,
            url,
            response: None,
        }
    }
}
impl Connection for UreqConnection {
    fn send(&mut self, body: &[u8]) -> io::Result<u16> {
        let res = self
            .agent
            .post(&self.url)
            .set("Accept", ACCEPT)
            .set("Content-Type", CONTENT_TYPE)
            .send_bytes(body);
        let resp = match res {
            Ok(resp) => resp,
            Err(ureq::Error::Status(_, resp)) => resp,
            Err(ureq::Error::Transport(e)) => return Err(io::Error::other(e)),
        };
        let status = resp.status();
        self.response = Some(resp);
        Ok(status)
    }

    fn error_body(&mut self) -> io::Result<Option<String>> {
        let Some(resp) = self.response.take() else {
            return Ok(None);
        };
        let body = resp.into_string()?;
        Ok((!body.is_empty()).then_some(body))
    }

    fn disconnect(&mut self) -> io::Result<()> {
        self.response = None;
        Ok(())
    }
}
