use std::io;
use std::net::SocketAddr;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use tokio::net::UdpSocket;

use meterline_core::error::{MeterlineError, Result};
use meterline_core::Aggregator;

/// Destination for one flush.
#[async_trait]
pub trait Sink: Send {
    /// Drain `agg` once and deliver it. Returns the amount delivered in the
    /// sink's own unit (bytes for text sinks, data points for remote ones).
    async fn flush(&mut self, agg: &Aggregator) -> Result<u64>;
}

/// Line-format sink over any blocking writer (stdout, a file, a `Vec<u8>`).
pub struct WriterSink<W> {
    inner: W,
}

impl<W> WriterSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

#[async_trait]
impl<W: io::Write + Send> Sink for WriterSink<W> {
    async fn flush(&mut self, agg: &Aggregator) -> Result<u64> {
        let written = agg.write_to(&mut self.inner)?;
        self.inner
            .flush()
            .map_err(|source| MeterlineError::Write { written, source })?;
        Ok(written)
    }
}

/// Line-format sink over UDP. Whole lines are packed into datagrams of at most
/// `max_packet_bytes`; a single line longer than that goes out on its own.
pub struct UdpSink {
    socket: UdpSocket,
    max_packet_bytes: usize,
    buf: Vec<u8>,
}

impl UdpSink {
    pub async fn connect(address: &str, max_packet_bytes: usize) -> Result<Self> {
        let remote = tokio::net::lookup_host(address)
            .await
            .map_err(|e| MeterlineError::Config(format!("resolve {address} failed: {e}")))?
            .next()
            .ok_or_else(|| MeterlineError::Config(format!("{address} resolved to nothing")))?;

        let local: SocketAddr = if remote.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            (std::net::Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(local)
            .await
            .map_err(|e| MeterlineError::Internal(format!("udp bind failed: {e}")))?;
        socket
            .connect(remote)
            .await
            .map_err(|e| MeterlineError::Internal(format!("udp connect {remote} failed: {e}")))?;

        tracing::info!(%remote, max_packet_bytes, "udp sink ready");
        Ok(Self {
            socket,
            max_packet_bytes,
            buf: Vec::with_capacity(max_packet_bytes),
        })
    }
}

#[async_trait]
impl Sink for UdpSink {
    async fn flush(&mut self, agg: &Aggregator) -> Result<u64> {
        self.buf.clear();
        agg.write_to(&mut self.buf)?;

        let mut written = 0u64;
        for packet in pack_lines(&self.buf, self.max_packet_bytes) {
            self.socket
                .send(&packet)
                .await
                .map_err(|source| MeterlineError::Write { written, source })?;
            written += packet.len() as u64;
        }
        Ok(written)
    }
}

/// Split newline-terminated lines into packets no larger than `max` bytes
/// without ever splitting a line.
pub fn pack_lines(buf: &[u8], max: usize) -> Vec<Bytes> {
    let mut packets = Vec::new();
    let mut packet = BytesMut::with_capacity(max);
    for line in buf.split_inclusive(|b| *b == b'\n') {
        if !packet.is_empty() && packet.len() + line.len() > max {
            packets.push(packet.split().freeze());
        }
        packet.extend_from_slice(line);
    }
    if !packet.is_empty() {
        packets.push(packet.freeze());
    }
    packets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_keeps_lines_whole() {
        let buf = b"aaaa\nbbbb\ncc\ndddddddddd\n";
        let packets = pack_lines(buf, 10);
        let as_str: Vec<&[u8]> = packets.iter().map(|p| p.as_ref()).collect();
        assert_eq!(
            as_str,
            vec![&b"aaaa\nbbbb\n"[..], &b"cc\n"[..], &b"dddddddddd\n"[..]]
        );
    }

    #[test]
    fn pack_empty_is_empty() {
        assert!(pack_lines(b"", 1432).is_empty());
    }
}
