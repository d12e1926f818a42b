use std::io::{self, Read, Write};
use std::sync::mpsc::{channel, Receiver, Sender};
use tracing::trace;

/// One end of an in-process byte pipe.
///
/// Writes are buffered until [flush](Write::flush) hands them to the peer as
/// one chunk. Reads block until a chunk arrives and report end-of-stream once
/// the peer has been dropped.
pub struct PipeEnd {
    tx:       Sender<Vec<u8>>,
    rx:       Receiver<Vec<u8>>,
    pending:  Vec<u8>,
    read_buf: Vec<u8>,
    read_pos: usize,
}

/// Creates two connected pipe ends. Bytes flushed on one are read on the other.
pub fn pipe() -> (PipeEnd, PipeEnd) {
    let (a_tx, b_rx) = channel();
    let (b_tx, a_rx) = channel();
    (PipeEnd::new(a_tx, a_rx), PipeEnd::new(b_tx, b_rx))
}

impl PipeEnd {
    fn new(tx: Sender<Vec<u8>>, rx: Receiver<Vec<u8>>) -> PipeEnd {
        PipeEnd {
            tx,
            rx,
            pending:  Vec::new(),
            read_buf: Vec::new(),
            read_pos: 0,
        }
    }
}

impl Read for PipeEnd {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        while self.read_pos >= self.read_buf.len() {
            match self.rx.recv() {
                Ok(chunk) => {
                    self.read_buf = chunk;
                    self.read_pos = 0;
                }
                Err(_) => return Ok(0),
            }
        }
        let available = &self.read_buf[self.read_pos..];
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.read_pos += n;
        Ok(n)
    }
}

impl Write for PipeEnd {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let chunk = std::mem::take(&mut self.pending);
        self.tx
            .send(chunk)
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "pipe peer closed"))
    }
}

/// Wraps a transport and traces every read, write and flush.
pub struct LogTransport<T> {
    inner: T,
    label: String,
}

impl<T> LogTransport<T> {
    pub fn new(label: &str, inner: T) -> LogTransport<T> {
        LogTransport { inner, label: label.to_owned() }
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Read> Read for LogTransport<T> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        trace!(transport = %self.label, bytes = ?&buf[..n], "read");
        Ok(n)
    }
}

impl<T: Write> Write for LogTransport<T> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        trace!(transport = %self.label, bytes = ?&buf[..n], "write");
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        trace!(transport = %self.label, "flush");
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipe_delivers_flushed_bytes() {
        let (mut a, mut b) = pipe();
        a.write_all(&[1, 2, 3]).unwrap();
        a.flush().unwrap();

        let mut buf = [0u8; 2];
        b.read_exact(&mut buf).unwrap();
        assert_eq!(buf, [1, 2]);
        b.read_exact(&mut buf[..1]).unwrap();
        assert_eq!(buf[0], 3);
    }

    #[test]
    fn pipe_reports_eof_after_peer_drops() {
        let (a, mut b) = pipe();
        drop(a);
        let mut buf = [0u8; 4];
        assert_eq!(b.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn pipe_flush_fails_after_peer_drops() {
        let (mut a, b) = pipe();
        drop(b);
        a.write_all(&[1]).unwrap();
        assert_eq!(a.flush().unwrap_err().kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn log_transport_passes_bytes_through() {
        let mut log = LogTransport::new("test", Vec::new());
        log.write_all(b"abc").unwrap();
        log.flush().unwrap();
        assert_eq!(log.into_inner(), b"abc");
    }
}
