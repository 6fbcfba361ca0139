use chrono::{DateTime, Utc};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, warn};

use super::error::{SessionError, SessionResult};
use super::id::{generate_session_id_at, hash_suffix, issue_hash, validate_session_id};
use super::state::{
    AppliedFix, CapturedLog, Hypothesis, InstrumentedFile, ResearchFinding, SessionState,
    SessionStatus,
};

/// Sessions directory relative to the project root.
pub const SESSIONS_DIR: &str = ".claude/debug-sessions";
const SESSION_FILE_EXTENSION: &str = "json";

#[derive(Debug, Clone, Default)]
pub struct CreateSessionParams {
    pub issue: String,
    pub reproduction: Option<String>,
    /// Detected from the project's git checkout when absent.
    pub commit: Option<String>,
    pub branch: Option<String>,
}

impl CreateSessionParams {
    pub fn new(issue: impl Into<String>) -> Self {
        Self {
            issue: issue.into(),
            ..Self::default()
        }
    }

    pub fn with_reproduction(mut self, reproduction: impl Into<String>) -> Self {
        self.reproduction = Some(reproduction.into());
        self
    }

    pub fn with_commit(mut self, commit: impl Into<String>) -> Self {
        self.commit = Some(commit.into());
        self
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }
}

/// JSON-file store for [`SessionState`], one file per session.
///
/// Every ID-to-path translation is validated three times over: the ID
/// contract, the anchored format, and a containment check of the resolved
/// path against the sessions directory fixed at construction.
#[derive(Debug, Clone)]
pub struct SessionManager {
    project_root: PathBuf,
    sessions_dir: PathBuf,
}

impl SessionManager {
    /// Store under `<project_root>/.claude/debug-sessions`, created if needed.
    pub fn new(project_root: impl AsRef<Path>) -> SessionResult<Self> {
        let project_root = project_root.as_ref().to_path_buf();
        let sessions_dir = project_root.join(SESSIONS_DIR);
        Self::open(project_root, sessions_dir)
    }

    /// Store in an explicit directory; git detection still runs in the
    /// directory's parent.
    pub fn with_sessions_dir(sessions_dir: impl AsRef<Path>) -> SessionResult<Self> {
        let sessions_dir = sessions_dir.as_ref().to_path_buf();
        let project_root = sessions_dir
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| sessions_dir.clone());
        Self::open(project_root, sessions_dir)
    }

    fn open(project_root: PathBuf, sessions_dir: PathBuf) -> SessionResult<Self> {
        fs::create_dir_all(&sessions_dir).map_err(|err| SessionError::io(&sessions_dir, err))?;
        let sessions_dir = sessions_dir
            .canonicalize()
            .map_err(|err| SessionError::io(&sessions_dir, err))?;
        debug!(dir = %sessions_dir.display(), "session store opened");
        Ok(Self {
            project_root,
            sessions_dir,
        })
    }

    pub fn sessions_dir(&self) -> &Path {
        &self.sessions_dir
    }

    pub fn create_session(&self, params: CreateSessionParams) -> SessionResult<SessionState> {
        self.create_session_at(params, Utc::now())
    }

    /// Creates a session as of `now`, which fixes both the ID timestamp and
    /// `startedAt`. Fails with `AlreadyExists` when that ID is taken.
    pub fn create_session_at(
        &self,
        params: CreateSessionParams,
        now: DateTime<Utc>,
    ) -> SessionResult<SessionState> {
        let CreateSessionParams {
            issue,
            reproduction,
            commit,
            branch,
        } = params;

        let session_id = generate_session_id_at(&issue, now);
        let path = self.session_path(&session_id)?;

        let hash = issue_hash(&issue);
        let mut state = SessionState::new(session_id, issue, hash, now);
        state.reproduction = reproduction;
        state.initial_commit = commit.or_else(|| self.git(&["rev-parse", "HEAD"]));
        state.initial_branch =
            branch.or_else(|| self.git(&["rev-parse", "--abbrev-ref", "HEAD"]));

        self.write_new(&path, &state)?;
        info!(session = state.session_id(), "session created");
        Ok(state)
    }

    pub fn load_session(&self, session_id: &str) -> SessionResult<SessionState> {
        let path = self.session_path(session_id)?;
        self.read(&path, session_id)
    }

    /// Loads, applies `update`, refreshes `lastUpdated` and writes back.
    pub fn update_session<F>(&self, session_id: &str, update: F) -> SessionResult<SessionState>
    where
        F: FnOnce(&mut SessionState),
    {
        let path = self.session_path(session_id)?;
        let mut state = self.read(&path, session_id)?;
        update(&mut state);
        state.last_updated = Utc::now();
        self.write(&path, &state)?;
        debug!(session = session_id, "session updated");
        Ok(state)
    }

    pub fn delete_session(&self, session_id: &str) -> SessionResult<()> {
        let path = self.session_path(session_id)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                info!(session = session_id, "session deleted");
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(SessionError::NotFound(session_id.to_string()))
            }
            Err(err) => Err(SessionError::io(path, err)),
        }
    }

    /// All readable sessions, newest first. Unparseable files are skipped.
    pub fn list_sessions(&self) -> SessionResult<Vec<SessionState>> {
        self.collect_sessions(|_| true)
    }

    /// Sessions opened for the same issue text, newest first.
    pub fn find_sessions_by_issue(&self, issue: &str) -> SessionResult<Vec<SessionState>> {
        let hash = issue_hash(issue);
        self.collect_sessions(|session_id| hash_suffix(session_id) == Some(hash.as_str()))
    }

    pub fn add_hypothesis(
        &self,
        session_id: &str,
        description: impl Into<String>,
        files: Vec<PathBuf>,
    ) -> SessionResult<SessionState> {
        let description = description.into();
        self.update_session(session_id, |state| {
            let cycle = state.cycle;
            state.hypotheses.push(Hypothesis {
                description,
                files,
                status: Default::default(),
                cycle,
            });
        })
    }

    pub fn add_log(
        &self,
        session_id: &str,
        source: impl Into<String>,
        content: impl Into<String>,
    ) -> SessionResult<SessionState> {
        let (source, content) = (source.into(), content.into());
        self.update_session(session_id, |state| {
            let cycle = state.cycle;
            state.logs.push(CapturedLog {
                source,
                content,
                captured_at: Utc::now(),
                cycle,
            });
        })
    }

    pub fn add_research(
        &self,
        session_id: &str,
        finding: ResearchFinding,
    ) -> SessionResult<SessionState> {
        self.update_session(session_id, |state| state.research.push(finding))
    }

    pub fn add_fix(
        &self,
        session_id: &str,
        description: impl Into<String>,
        files: Vec<PathBuf>,
    ) -> SessionResult<SessionState> {
        let description = description.into();
        self.update_session(session_id, |state| {
            let cycle = state.cycle;
            state.fixes.push(AppliedFix {
                description,
                files,
                applied_at: Utc::now(),
                cycle,
            });
        })
    }

    /// Records instrumented lines, merging with an existing entry for the
    /// same file.
    pub fn add_instrumented_file(
        &self,
        session_id: &str,
        path: PathBuf,
        lines: Vec<usize>,
    ) -> SessionResult<SessionState> {
        self.update_session(session_id, |state| {
            match state
                .instrumented_files
                .iter_mut()
                .find(|entry| entry.path == path)
            {
                Some(entry) => {
                    for line in lines {
                        if !entry.lines.contains(&line) {
                            entry.lines.push(line);
                        }
                    }
                    entry.lines.sort_unstable();
                    entry.reverted = false;
                }
                None => state.instrumented_files.push(InstrumentedFile {
                    path,
                    lines,
                    reverted: false,
                }),
            }
        })
    }

    pub fn set_status(&self, session_id: &str, status: SessionStatus) -> SessionResult<SessionState> {
        self.update_session(session_id, |state| state.status = status)
    }

    pub fn increment_cycle(&self, session_id: &str) -> SessionResult<SessionState> {
        self.update_session(session_id, |state| state.cycle += 1)
    }

    /// Validated file path for `session_id`, re-resolved and confirmed to lie
    /// inside the sessions directory.
    fn session_path(&self, session_id: &str) -> SessionResult<PathBuf> {
        validate_session_id(session_id)?;

        let file_name = format!("{session_id}.{SESSION_FILE_EXTENSION}");
        let candidate = self.sessions_dir.join(&file_name);
        let resolved = match candidate.canonicalize() {
            Ok(resolved) => resolved,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                // A dangling link still occupies the name and would be followed on write.
                if fs::symlink_metadata(&candidate).is_ok() {
                    warn!(path = %candidate.display(), "rejected dangling link in sessions directory");
                    return Err(SessionError::PathEscape(candidate));
                }
                let parent = candidate.parent().unwrap_or(&self.sessions_dir);
                let parent = parent
                    .canonicalize()
                    .map_err(|err| SessionError::io(parent, err))?;
                parent.join(&file_name)
            }
            Err(err) => return Err(SessionError::io(candidate, err)),
        };

        if resolved.parent() != Some(self.sessions_dir.as_path())
            || !resolved.starts_with(&self.sessions_dir)
        {
            warn!(path = %resolved.display(), "rejected session path outside sessions directory");
            return Err(SessionError::PathEscape(resolved));
        }
        Ok(resolved)
    }

    fn read(&self, path: &Path, session_id: &str) -> SessionResult<SessionState> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(SessionError::NotFound(session_id.to_string()))
            }
            Err(err) => return Err(SessionError::io(path, err)),
        };
        serde_json::from_str(&contents).map_err(|source| SessionError::Corrupt {
            path: path.to_path_buf(),
            source,
        })
    }

    fn write(&self, path: &Path, state: &SessionState) -> SessionResult<()> {
        let json = Self::to_json(state)?;
        fs::write(path, json).map_err(|err| SessionError::io(path, err))
    }

    /// Writes a fresh session file; an existing entry of any kind under that
    /// name, symlinks included, is never opened.
    fn write_new(&self, path: &Path, state: &SessionState) -> SessionResult<()> {
        let json = Self::to_json(state)?;
        let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                return Err(SessionError::AlreadyExists(state.session_id().to_string()))
            }
            Err(err) => return Err(SessionError::io(path, err)),
        };
        file.write_all(json.as_bytes())
            .map_err(|err| SessionError::io(path, err))
    }

    fn to_json(state: &SessionState) -> SessionResult<String> {
        serde_json::to_string_pretty(state).map_err(|source| SessionError::Serialize {
            id: state.session_id().to_string(),
            source,
        })
    }

    fn collect_sessions<P>(&self, mut wanted: P) -> SessionResult<Vec<SessionState>>
    where
        P: FnMut(&str) -> bool,
    {
        let entries =
            fs::read_dir(&self.sessions_dir).map_err(|err| SessionError::io(&self.sessions_dir, err))?;

        let mut sessions = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| SessionError::io(&self.sessions_dir, err))?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(SESSION_FILE_EXTENSION) {
                continue;
            }
            let Some(session_id) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            if validate_session_id(session_id).is_err() || !wanted(session_id) {
                continue;
            }
            match self.load_session(session_id) {
                Ok(state) => sessions.push(state),
                Err(err) => warn!(path = %path.display(), error = %err, "skipping session file"),
            }
        }

        sessions.sort_by(|a, b| {
            b.started_at
                .cmp(&a.started_at)
                .then_with(|| b.session_id().cmp(a.session_id()))
        });
        Ok(sessions)
    }

    fn git(&self, args: &[&str]) -> Option<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.project_root)
            .output()
            .ok()?;
        if !output.status.success() {
            debug!(?args, "git metadata unavailable");
            return None;
        }
        let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
        (!value.is_empty()).then_some(value)
    }
}
