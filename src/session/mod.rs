//! Durable JSON state for debugging investigations.

pub mod error;
pub mod id;
pub mod manager;
pub mod state;

pub use error::{SessionError, SessionResult};
pub use id::{generate_session_id, generate_session_id_at, issue_hash, validate_session_id};
pub use manager::{CreateSessionParams, SessionManager, SESSIONS_DIR};
pub use state::{
    AppliedFix, CapturedLog, Hypothesis, HypothesisStatus, InstrumentedFile, ResearchFinding,
    SessionState, SessionStatus,
};
