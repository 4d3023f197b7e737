// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Output streams that [`FlushImmediately`](crate::sink::FlushImmediately) and
//! `BackgroundQueue` write records to.

use std::{
    io::{self, Write},
    sync::{Arc, Mutex, PoisonError},
};

use crate::MethodTraceRecord;

/// Writes a stream of [`MethodTraceRecord`]s to an output IO sink.
///
/// Flushing may occur at any time, but is required to happen when [`TraceStream::flush`] is called.
pub trait TraceStream {
    /// Write the next record to the stream.
    fn next(&mut self, record: &MethodTraceRecord) -> io::Result<()>;

    /// Flush any records buffered before the final IO sink.
    fn flush(&mut self) -> io::Result<()>;
}

impl<S: TraceStream + ?Sized> TraceStream for Box<S> {
    fn next(&mut self, record: &MethodTraceRecord) -> io::Result<()> {
        (**self).next(record)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
}

impl<S: TraceStream> TraceStream for Arc<Mutex<S>> {
    fn next(&mut self, record: &MethodTraceRecord) -> io::Result<()> {
        self.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .next(record)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.lock().unwrap_or_else(PoisonError::into_inner).flush()
    }
}

fn write_line(out: &mut impl Write, record: &MethodTraceRecord) -> io::Result<()> {
    let message = record.message();
    write!(out, "{}: {}", record.owner(), message)?;
    if !message.ends_with('\n') {
        out.write_all(b"\n")?;
    }
    Ok(())
}

/// Writes each record as `"<owner>: <message>"` to an [`io::Write`], one record per line.
///
/// Messages that already end with a newline are written verbatim, the others get one appended.
///
/// ```
/// # use gintonic_writer::{stream::{LineStream, TraceStream}, MethodTraceRecord, Accuracy};
/// # use std::time::Duration;
/// let mut stream = LineStream::new(Vec::new());
/// stream.next(&MethodTraceRecord::lifecycle("MainActivity", "onCreate", Duration::from_millis(2), Accuracy::Millis)).unwrap();
/// assert_eq!(stream.into_inner(), b"MainActivity: onCreate --> [2.0ms]      \n");
/// ```
#[derive(Debug)]
pub struct LineStream<W> {
    output: W,
}

impl<W: Write> LineStream<W> {
    /// Wrap an output
    pub fn new(output: W) -> Self {
        Self { output }
    }

    /// Get back the wrapped output
    pub fn into_inner(self) -> W {
        self.output
    }
}

impl<W: Write> TraceStream for LineStream<W> {
    fn next(&mut self, record: &MethodTraceRecord) -> io::Result<()> {
        write_line(&mut self.output, record)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.output.flush()
    }
}

/// Writes records as lines through a [`tracing_subscriber::fmt::MakeWriter`].
///
/// A new writer is made for each record, so this works with rolling appenders such as
/// `tracing_appender::rolling::RollingFileAppender`, which pick the current file per write.
#[cfg(feature = "tracing_subscriber_03")]
pub struct MakeWriterStream<M> {
    make_writer: M,
}

#[cfg(feature = "tracing_subscriber_03")]
impl<M> MakeWriterStream<M>
where
    M: for<'a> tracing_subscriber::fmt::MakeWriter<'a>,
{
    /// Write through `make_writer`
    pub fn new(make_writer: M) -> Self {
        Self { make_writer }
    }
}

#[cfg(feature = "tracing_subscriber_03")]
impl<M> TraceStream for MakeWriterStream<M>
where
    M: for<'a> tracing_subscriber::fmt::MakeWriter<'a>,
{
    fn next(&mut self, record: &MethodTraceRecord) -> io::Result<()> {
        // format into one buffer so a record is never torn across writes
        let mut line = Vec::with_capacity(record.owner().len() + record.message().len() + 3);
        write_line(&mut line, record)?;
        self.make_writer.make_writer().write_all(&line)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.make_writer.make_writer().flush()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::Accuracy;

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::other("disk full"))
        }
    }

    #[test]
    fn line_stream_adds_missing_newline() {
        let mut stream = LineStream::new(Vec::new());
        stream
            .next(&MethodTraceRecord::annotated(
                "Parser",
                "parse",
                Duration::from_millis(7),
            ))
            .unwrap();
        stream
            .next(&MethodTraceRecord::lifecycle(
                "MainActivity",
                "onStart",
                Duration::from_micros(1500),
                Accuracy::Millis,
            ))
            .unwrap();
        stream.flush().unwrap();
        assert_eq!(
            String::from_utf8(stream.into_inner()).unwrap(),
            "Parser: Gintonic --> parse --> [7ms]\nMainActivity: onStart --> [1.5ms]      \n"
        );
    }

    #[test]
    fn line_stream_reports_io_errors() {
        let mut stream = LineStream::new(FailingWriter);
        let record = MethodTraceRecord::new("A", "a", 0.0, Accuracy::Millis);
        assert!(stream.next(&record).is_err());
        assert!(stream.flush().is_err());
    }

    #[test]
    fn make_writer_stream_writes_to_rolling_file() {
        let dir = tempfile::tempdir().unwrap();
        let appender = tracing_appender::rolling::never(dir.path(), "trace.log");
        let mut stream = MakeWriterStream::new(appender);
        stream
            .next(&MethodTraceRecord::lifecycle(
                "MainActivity",
                "onCreate",
                Duration::from_millis(4),
                Accuracy::Millis,
            ))
            .unwrap();
        stream.flush().unwrap();
        let written = std::fs::read_to_string(dir.path().join("trace.log")).unwrap();
        assert_eq!(written, "MainActivity: onCreate --> [4.0ms]      \n");
    }
}
