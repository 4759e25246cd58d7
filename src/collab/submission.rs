use crate::state::flow::Submission;
use std::io::Write;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("submission rejected: {0}")]
    Rejected(String),

    #[error("failed to encode submission: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to write submission: {0}")]
    Io(#[from] std::io::Error),
}

/// Receives the final snapshot of a finished wizard.
pub trait Submitter {
    fn submit(&mut self, submission: &Submission) -> Result<(), SubmitError>;
}

#[derive(Debug, Default)]
pub struct RecordingSubmitter {
    submissions: Vec<Submission>,
}

impl RecordingSubmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submissions(&self) -> &[Submission] {
        &self.submissions
    }
}

impl Submitter for RecordingSubmitter {
    fn submit(&mut self, submission: &Submission) -> Result<(), SubmitError> {
        self.submissions.push(submission.clone());
        Ok(())
    }
}

pub struct JsonSubmitter<W: Write> {
    writer: W,
    pretty: bool,
}

impl<W: Write> JsonSubmitter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            pretty: false,
        }
    }

    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Submitter for JsonSubmitter<W> {
    fn submit(&mut self, submission: &Submission) -> Result<(), SubmitError> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut self.writer, submission)?;
        } else {
            serde_json::to_writer(&mut self.writer, submission)?;
        }
        writeln!(self.writer)?;
        self.writer.flush()?;
        info!(flow = %submission.flow, "submission written");
        Ok(())
    }
}
