//! One-shot TCP link to the bridge.
//!
//! The bridge accepts exactly one write per connection and then closes, so
//! every packet opens a fresh connection: connect (bounded by the configured
//! timeout), write everything, shut down.  There is no acknowledgement and no
//! retry; the next cycle's packet covers a lost one.

use std::io::{ErrorKind, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::debug;

use super::PacketLink;
use crate::application::synthesize::TransportError;
use crate::infrastructure::storage::config::BridgeConfig;

#[derive(Debug, Clone)]
pub struct TcpLink {
    host: String,
    port: u16,
    timeout: Duration,
    resolved: Option<SocketAddr>,
}

impl TcpLink {
    pub fn new(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            timeout,
            resolved: None,
        }
    }

    pub fn from_config(config: &BridgeConfig) -> Self {
        Self::new(config.host.clone(), config.port, config.connect_timeout())
    }

    /// `host:port` as configured.
    pub fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn resolve(&mut self) -> Result<SocketAddr, TransportError> {
        if let Some(addr) = self.resolved {
            return Ok(addr);
        }
        let target = self.target();
        let addr = target
            .to_socket_addrs()
            .map_err(|source| TransportError::Resolve {
                addr: target.clone(),
                source,
            })?
            .next()
            .ok_or(TransportError::NoAddress(target))?;
        debug!("bridge resolved to {addr}");
        self.resolved = Some(addr);
        Ok(addr)
    }
}

impl PacketLink for TcpLink {
    fn deliver(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let addr = self.resolve()?;

        let mut stream = match TcpStream::connect_timeout(&addr, self.timeout) {
            Ok(stream) => stream,
            Err(source) => {
                // Resolve again next time; the bridge may have a new address.
                self.resolved = None;
                return Err(match source.kind() {
                    ErrorKind::TimedOut | ErrorKind::WouldBlock => TransportError::Timeout { addr },
                    _ => TransportError::Connect { addr, source },
                });
            }
        };
        let write_err = |source| TransportError::Write { addr, source };
        stream.set_write_timeout(Some(self.timeout)).map_err(write_err)?;
        stream.write_all(bytes).map_err(write_err)?;
        stream.flush().map_err(write_err)?;
        // The bridge may already have closed its end.
        let _ = stream.shutdown(Shutdown::Both);
        Ok(())
    }
}
