//! Local session id for the CLI client.

mod detect;

pub use detect::{detect_session_id, save_session_id};
