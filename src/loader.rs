use std::path::PathBuf;

use log::info;

use crate::{SegwatchError, monitor::PollOutput, render::DashboardState};

pub fn load_recording(source_file: &PathBuf) -> Result<Vec<PollOutput>, SegwatchError> {
    if !source_file.is_file() {
        return Err(SegwatchError::InvalidRecordingFile {
            path: format!("{:?}", source_file),
        });
    }

    let outputs = serde_jsonlines::json_lines(source_file)
        .map_err(|e| SegwatchError::RecordingLoaderError { source: e })?
        .collect::<Result<Vec<PollOutput>, std::io::Error>>()
        .map_err(|e| SegwatchError::RecordingLoaderError { source: e })?;
    info!("Loaded {} poll outputs from {:?}", outputs.len(), source_file);
    Ok(outputs)
}

/// Replays a recording into a fresh dashboard, leaving it as it looked after the last poll.
pub fn replay_recording(
    source_file: &PathBuf,
    chart_window: usize,
) -> Result<DashboardState, SegwatchError> {
    let mut state = DashboardState::with_chart_window(chart_window);
    for output in load_recording(source_file)? {
        state.apply(output);
    }
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_missing_file_is_invalid() {
        let result = load_recording(&PathBuf::from("/nonexistent/recording.jsonl"));
        assert!(matches!(
            result,
            Err(SegwatchError::InvalidRecordingFile { .. })
        ));
    }

    #[test]
    fn test_malformed_line_is_a_loader_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"epoch":1,"tick":1,"captured_at_ms":0,"segments":[]}}"#).unwrap();
        writeln!(file, "not json").unwrap();
        file.flush().unwrap();

        let result = load_recording(&file.path().to_path_buf());
        assert!(matches!(
            result,
            Err(SegwatchError::RecordingLoaderError { .. })
        ));
    }

    #[test]
    fn test_replay_keeps_last_snapshot() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"epoch":1,"tick":1,"captured_at_ms":10,"segments":[{{"URL":"https://h/1.ts","Duration":6.0,"LoadTime":0.5,"IsDelayed":false}}]}}"#
        )
        .unwrap();
        writeln!(
            file,
            r#"{{"epoch":1,"tick":2,"captured_at_ms":20,"segments":[{{"URL":"https://h/1.ts","Duration":6.0,"LoadTime":0.8,"IsDelayed":false}},{{"URL":"https://h/2.ts","Duration":6.0,"LoadTime":2.3,"IsDelayed":true}}]}}"#
        )
        .unwrap();
        file.flush().unwrap();

        let state = replay_recording(&file.path().to_path_buf(), 50).unwrap();
        assert_eq!(state.polls_applied(), 2);
        assert_eq!(state.table().len(), 2);
        assert_eq!(state.table().delayed_count(), 1);
        assert_eq!(state.chart().get("1"), Some(0.8));
        assert_eq!(state.last_captured_at_ms(), Some(20));
    }
}
