//! Bridge from an async byte stream to a blocking `Read`
//!
//! A pump task forwards chunks from the upstream response into a bounded
//! channel; the archive walker reads them on a blocking thread. Dropping the
//! pump handle aborts the task, which drops the upstream response and frees
//! its connection.

use std::io::{self, Cursor, Read};

use bytes::Bytes;
use flate2::read::GzDecoder;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use pkgcdn_registry::ByteStream;

/// Chunks buffered between the pump and the reader
pub const DEFAULT_CHANNEL_CAPACITY: usize = 16;

/// gzip member header magic
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Blocking reader over chunks sent by a pump task.
///
/// Must only be read from outside the async runtime (e.g. in `spawn_blocking`).
pub struct ChannelReader {
    rx: mpsc::Receiver<io::Result<Bytes>>,
    current: Bytes,
}

/// Aborts the pump task when dropped
pub struct PumpHandle(JoinHandle<()>);

impl Drop for PumpHandle {
    fn drop(&mut self) {
        self.0.abort();
    }
}

impl ChannelReader {
    /// Create a reader over an existing receiver
    pub fn new(rx: mpsc::Receiver<io::Result<Bytes>>) -> Self {
        Self {
            rx,
            current: Bytes::new(),
        }
    }

    /// Start pumping `stream` into a new reader. Requires a Tokio runtime.
    pub fn spawn(stream: ByteStream, capacity: usize) -> (Self, PumpHandle) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let task = tokio::spawn(pump(stream, tx));
        (Self::new(rx), PumpHandle(task))
    }
}

impl Read for ChannelReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        while self.current.is_empty() {
            match self.rx.blocking_recv() {
                Some(Ok(chunk)) => self.current = chunk,
                Some(Err(e)) => return Err(e),
                // Sender gone: the stream ended
                None => return Ok(0),
            }
        }

        let n = buf.len().min(self.current.len());
        buf[..n].copy_from_slice(&self.current[..n]);
        self.current = self.current.slice(n..);
        Ok(n)
    }
}

/// Forward chunks until the stream ends, fails, or the reader goes away
async fn pump(mut stream: ByteStream, tx: mpsc::Sender<io::Result<Bytes>>) {
    while let Some(chunk) = stream.next().await {
        let failed = chunk.is_err();
        if tx.send(chunk).await.is_err() || failed {
            break;
        }
    }
}

/// Decompress `reader` if it starts with the gzip magic, otherwise pass it
/// through untouched.
pub fn maybe_gunzip<R>(mut reader: R) -> io::Result<Box<dyn Read + Send>>
where
    R: Read + Send + 'static,
{
    let mut head = [0u8; 2];
    let mut filled = 0;
    while filled < head.len() {
        match reader.read(&mut head[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    let is_gzip = filled == head.len() && head == GZIP_MAGIC;
    let rejoined = Cursor::new(head[..filled].to_vec()).chain(reader);

    if is_gzip {
        Ok(Box::new(GzDecoder::new(rejoined)))
    } else {
        Ok(Box::new(rejoined))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use futures::stream;
    use std::io::Write;

    fn read_all(mut reader: impl Read) -> Vec<u8> {
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        out
    }

    #[test]
    fn test_plain_input_passes_through() {
        let reader = maybe_gunzip(Cursor::new(b"plain tar bytes".to_vec())).unwrap();
        assert_eq!(read_all(reader), b"plain tar bytes");
    }

    #[test]
    fn test_gzip_input_is_decompressed() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"compressed body").unwrap();
        let gz = encoder.finish().unwrap();

        let reader = maybe_gunzip(Cursor::new(gz)).unwrap();
        assert_eq!(read_all(reader), b"compressed body");
    }

    #[test]
    fn test_short_input() {
        assert_eq!(read_all(maybe_gunzip(Cursor::new(vec![0x1f])).unwrap()), vec![0x1f]);
        assert!(read_all(maybe_gunzip(Cursor::new(Vec::new())).unwrap()).is_empty());
    }

    #[tokio::test]
    async fn test_channel_reader_reassembles_chunks() {
        let chunks: Vec<io::Result<Bytes>> = vec![
            Ok(Bytes::from_static(b"hel")),
            Ok(Bytes::new()),
            Ok(Bytes::from_static(b"lo ")),
            Ok(Bytes::from_static(b"world")),
        ];
        let (reader, _pump) = ChannelReader::spawn(stream::iter(chunks).boxed(), 2);

        let out = tokio::task::spawn_blocking(move || read_all(reader)).await.unwrap();
        assert_eq!(out, b"hello world");
    }

    #[tokio::test]
    async fn test_channel_reader_surfaces_stream_errors() {
        let chunks: Vec<io::Result<Bytes>> = vec![
            Ok(Bytes::from_static(b"partial")),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "upstream reset")),
        ];
        let (mut reader, _pump) = ChannelReader::spawn(stream::iter(chunks).boxed(), 2);

        let err = tokio::task::spawn_blocking(move || {
            let mut out = Vec::new();
            reader.read_to_end(&mut out).unwrap_err()
        })
        .await
        .unwrap();
        assert_eq!(err.kind(), io::ErrorKind::ConnectionReset);
    }

    #[tokio::test]
    async fn test_dropping_pump_releases_stream() {
        let endless = stream::repeat_with(|| Ok(Bytes::from_static(b"x"))).boxed();
        let (reader, pump) = ChannelReader::spawn(endless, 1);

        drop(pump);

        // With the pump gone the sender is dropped and the reader reaches EOF
        let out = tokio::task::spawn_blocking(move || read_all(reader)).await.unwrap();
        assert!(out.len() < 1_000_000);
    }
}
