use crate::{input::Error, replay::ReplayError};

use std::sync::mpsc::Receiver;

// Bad lines and rejected events don't stop the replay: we log them and keep
// going with the rest of the log. A rejected event is business as usual (e.g.
// a requester confirming twice), so it's a warning, not an error.
//
// Each receiver gets its own thread, so a burst of bad lines can't hold back
// the reporting of rejected events, and the other way around.
pub fn sink(
    input_errors: Receiver<Error>,
    replay_errors: Receiver<ReplayError>,
) -> Vec<std::thread::JoinHandle<()>> {
    vec![
        std::thread::spawn(move || {
            for err in input_errors {
                tracing::warn!(?err, "failed to read record");
            }
        }),
        std::thread::spawn(move || {
            for err in replay_errors {
                tracing::warn!(entry = err.entry, err = %err.source, "failed to replay entry");
            }
        }),
    ]
}
