//! JSON-lines record sink.
//!
//! Each record becomes one line of JSON, flushed before `append` returns.

use std::path::Path;

use async_trait::async_trait;
use sweepr_common::error::SinkError;
use sweepr_common::ports::RecordSink;
use sweepr_common::record::Record;
use tokio::fs::{File, OpenOptions};
use tokio::io::{self, AsyncWrite, AsyncWriteExt, Stdout};

pub struct JsonLinesSink<W> {
    writer: W,
}

impl<W> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl JsonLinesSink<File> {
    /// Opens `path` for appending, creating it if needed.
    pub async fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        Ok(Self::new(file))
    }
}

impl JsonLinesSink<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

#[async_trait]
impl<W> RecordSink for JsonLinesSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn append(&mut self, record: Record) -> Result<(), SinkError> {
        let mut line =
            serde_json::to_vec(&record).map_err(|e| SinkError::new(&record.subject, e))?;
        line.push(b'\n');

        self.writer
            .write_all(&line)
            .await
            .map_err(|e| SinkError::new(&record.subject, e))?;
        self.writer
            .flush()
            .await
            .map_err(|e| SinkError::new(&record.subject, e))
    }
}
