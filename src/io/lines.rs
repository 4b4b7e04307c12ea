//! Tab-separated text codec
//!
//! One pair per line, `key<TAB>value`. This is the framing used by
//! streaming MapReduce runners, where a task reads its input from stdin and
//! writes its output to stdout.

use super::{OutputSink, PairSource};
use crate::error::{ErrorCode, TaskError};
use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

const SEPARATOR: char = '\t';

/// Split one line into a pair. A line without a separator is a key with an
/// empty value.
pub fn split_line(line: &str) -> (String, String) {
    let line = line
        .strip_suffix('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .unwrap_or(line);

    match line.split_once(SEPARATOR) {
        Some((key, value)) => (key.to_string(), value.to_string()),
        None => (line.to_string(), String::new()),
    }
}

/// Reads `key<TAB>value` lines
pub struct LineSource<R> {
    reader: R,
    buf: String,
    line_number: u64,
}

impl<R> LineSource<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: String::new(),
            line_number: 0,
        }
    }

    /// Number of lines read so far
    pub fn line_number(&self) -> u64 {
        self.line_number
    }
}

#[async_trait]
impl<R> PairSource<String, String> for LineSource<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn next_pair(&mut self) -> Result<Option<(String, String)>, TaskError> {
        self.buf.clear();
        let read = self.reader.read_line(&mut self.buf).await.map_err(|e| {
            let code = if e.kind() == std::io::ErrorKind::InvalidData {
                ErrorCode::READ_DECODE_ERROR
            } else {
                ErrorCode::READ_IO_ERROR
            };
            TaskError::read_with_code(code, "Failed to read input line")
                .with_context(format!("line {}", self.line_number + 1))
                .with_source(e)
        })?;

        if read == 0 {
            trace!("Input exhausted after {} lines", self.line_number);
            return Ok(None);
        }

        self.line_number += 1;
        Ok(Some(split_line(&self.buf)))
    }
}

/// Writes `key<TAB>value` lines
pub struct LineSink<W> {
    writer: W,
    lines_written: u64,
}

impl<W> LineSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            lines_written: 0,
        }
    }

    pub fn lines_written(&self) -> u64 {
        self.lines_written
    }

    /// Recover the underlying writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[async_trait]
impl<W, K, V> OutputSink<K, V> for LineSink<W>
where
    W: AsyncWrite + Unpin + Send,
    K: AsRef<str> + Send + 'static,
    V: AsRef<str> + Send + 'static,
{
    async fn emit(&mut self, key: K, value: V) -> Result<(), TaskError> {
        let line = format!("{}{}{}\n", key.as_ref(), SEPARATOR, value.as_ref());
        self.writer
            .write_all(line.as_bytes())
            .await
            .map_err(|e| {
                TaskError::write_with_code(ErrorCode::WRITE_EMIT_FAILED, "Failed to write output line")
                    .with_source(e)
            })?;
        self.lines_written += 1;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), TaskError> {
        self.writer.flush().await.map_err(|e| {
            TaskError::write_with_code(ErrorCode::WRITE_CLOSE_FAILED, "Failed to flush output")
                .with_source(e)
        })?;
        self.writer.shutdown().await.map_err(|e| {
            TaskError::write_with_code(ErrorCode::WRITE_CLOSE_FAILED, "Failed to close output")
                .with_source(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_line_variants() {
        assert_eq!(split_line("a\t1\n"), ("a".to_string(), "1".to_string()));
        assert_eq!(split_line("a\t1\r\n"), ("a".to_string(), "1".to_string()));
        assert_eq!(split_line("a\tb\tc"), ("a".to_string(), "b\tc".to_string()));
        assert_eq!(split_line("lonely\n"), ("lonely".to_string(), String::new()));
        assert_eq!(split_line("\n"), (String::new(), String::new()));
    }

    #[tokio::test]
    async fn test_line_source_reads_pairs() {
        let input: &[u8] = b"apple\t1\napple\t2\npear\t3";
        let mut source = LineSource::new(input);

        assert_eq!(
            source.next_pair().await.unwrap(),
            Some(("apple".to_string(), "1".to_string()))
        );
        assert_eq!(
            source.next_pair().await.unwrap(),
            Some(("apple".to_string(), "2".to_string()))
        );
        assert_eq!(
            source.next_pair().await.unwrap(),
            Some(("pear".to_string(), "3".to_string()))
        );
        assert_eq!(source.next_pair().await.unwrap(), None);
        assert_eq!(source.line_number(), 3);
    }

    #[tokio::test]
    async fn test_line_source_rejects_invalid_utf8() {
        let input: &[u8] = b"ok\t1\n\xff\xfe\t2\n";
        let mut source = LineSource::new(input);

        assert!(source.next_pair().await.unwrap().is_some());
        let err = source.next_pair().await.unwrap_err();
        assert!(err.is_read_fault());
        assert_eq!(err.code(), ErrorCode::READ_DECODE_ERROR);
        assert!(err.to_string().contains("line 2"));
    }

    #[tokio::test]
    async fn test_line_sink_writes_and_closes() {
        let mut sink = LineSink::new(Vec::<u8>::new());
        sink.emit("apple", "2").await.unwrap();
        sink.emit("pear".to_string(), "1".to_string()).await.unwrap();
        OutputSink::<&str, &str>::close(&mut sink).await.unwrap();

        assert_eq!(sink.lines_written(), 2);
        assert_eq!(sink.into_inner(), b"apple\t2\npear\t1\n".to_vec());
    }
}
