use std::{fs::File, io::BufWriter, path::PathBuf, sync::mpsc::Receiver};

use log::error;
use serde_jsonlines::JsonLinesWriter;

use crate::{SegwatchError, monitor::PollOutput};

/// Appends every poll output received on `output_receiver` to `file` as one JSON line, until
/// all senders are gone.
pub fn write_poll_outputs(
    file: &PathBuf,
    output_receiver: Receiver<PollOutput>,
) -> Result<(), SegwatchError> {
    let recording_file = File::create(file).map_err(|e| SegwatchError::WriterError { source: e })?;
    let mut recording_writer = JsonLinesWriter::new(BufWriter::new(recording_file));
    for output in &output_receiver {
        if let Err(e) = recording_writer.write(&output) {
            error!(
                "Error while writing poll output {} to recording: {}",
                output.tick, e
            );
        }
        // keep the file usable if the process is killed
        recording_writer
            .flush()
            .map_err(|e| SegwatchError::WriterError { source: e })?;
    }
    Ok(())
}
