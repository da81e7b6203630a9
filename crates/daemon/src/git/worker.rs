use std::error::Error;
use std::ffi::{OsStr, OsString};
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

/// Extra environment for a single git invocation, e.g. `GIT_SSH`.
pub type CommandEnv = [(String, String)];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitCommandOutput {
    /// Raw bytes; porcelain output may carry paths that are not UTF-8.
    pub stdout: Vec<u8>,
    pub stderr: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitWorkerError {
    EmptyAddPaths,
    SpawnFailed { command: String, message: String },
    CommandFailed { command: String, code: Option<i32>, stderr: String },
}

impl GitWorkerError {
    /// The rendered git command line, when one was attempted.
    pub fn command(&self) -> Option<&str> {
        match self {
            GitWorkerError::EmptyAddPaths => None,
            GitWorkerError::SpawnFailed { command, .. }
            | GitWorkerError::CommandFailed { command, .. } => Some(command),
        }
    }
}

impl Display for GitWorkerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            GitWorkerError::EmptyAddPaths => write!(f, "git add requires at least one path"),
            GitWorkerError::SpawnFailed { command, message } => {
                write!(f, "failed to run `{command}`: {message}")
            }
            GitWorkerError::CommandFailed { command, code, stderr } => {
                write!(f, "`{command}` failed with code {:?}: {}", code, stderr.trim())
            }
        }
    }
}

impl Error for GitWorkerError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: String,
}

pub trait CommandExecutor: Send + Sync {
    fn execute(
        &self,
        program: &str,
        args: &[OsString],
        cwd: &Path,
        env: &CommandEnv,
    ) -> Result<CommandResult, std::io::Error>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessCommandExecutor;

impl CommandExecutor for ProcessCommandExecutor {
    fn execute(
        &self,
        program: &str,
        args: &[OsString],
        cwd: &Path,
        env: &CommandEnv,
    ) -> Result<CommandResult, std::io::Error> {
        let output = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .envs(env.iter().map(|(key, value)| (key, value)))
            .output()?;
        Ok(CommandResult {
            success: output.status.success(),
            code: output.status.code(),
            stdout: output.stdout,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Runs git subcommands inside one working copy.
#[derive(Debug, Clone)]
pub struct GitWorker<E = ProcessCommandExecutor> {
    repo_path: PathBuf,
    executor: E,
}

impl GitWorker<ProcessCommandExecutor> {
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self { repo_path: repo_path.into(), executor: ProcessCommandExecutor }
    }
}

impl<E: CommandExecutor> GitWorker<E> {
    pub fn with_executor(repo_path: impl Into<PathBuf>, executor: E) -> Self {
        Self { repo_path: repo_path.into(), executor }
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    /// `git clone --origin <name> -- <url> <repo_path>`, run from inside the (empty) target.
    pub fn clone_from(
        &self,
        url: &str,
        remote_name: &str,
        env: &CommandEnv,
    ) -> Result<GitCommandOutput, GitWorkerError> {
        let target = self.repo_path.clone().into_os_string();
        self.run_with_env(args(["clone", "--origin", remote_name, "--", url]).chain([target]).collect(), env)
    }

    pub fn pull_fast_forward(
        &self,
        remote: &str,
        branch: &str,
        env: &CommandEnv,
    ) -> Result<GitCommandOutput, GitWorkerError> {
        self.run_with_env(args(["pull", "--ff-only", remote, branch]).collect(), env)
    }

    pub fn set_config(&self, key: &str, value: &str) -> Result<GitCommandOutput, GitWorkerError> {
        self.run(args(["config", key, value]).collect())
    }

    /// NUL-separated porcelain status, including every untracked file.
    pub fn status_porcelain(&self) -> Result<GitCommandOutput, GitWorkerError> {
        self.run(args(["status", "--porcelain", "-z", "--untracked-files=all", "--no-renames"]).collect())
    }

    /// Stage additions, modifications and deletions of `paths`.
    ///
    /// Paths are passed through byte for byte, so names that are not valid
    /// UTF-8 still match the files on disk.
    pub fn add<P: AsRef<OsStr>>(&self, paths: &[P]) -> Result<GitCommandOutput, GitWorkerError> {
        if paths.is_empty() {
            return Err(GitWorkerError::EmptyAddPaths);
        }

        let staged = paths.iter().map(|path| path.as_ref().to_os_string());
        self.run(args(["add", "--all", "--"]).chain(staged).collect())
    }

    /// Commit with `message` stored exactly as given (no whitespace or
    /// comment cleanup).
    pub fn commit(&self, message: &str) -> Result<GitCommandOutput, GitWorkerError> {
        self.run(args(["commit", "--cleanup=verbatim", "-m", message]).collect())
    }

    pub fn head_commit(&self) -> Result<String, GitWorkerError> {
        let output = self.run(args(["rev-parse", "HEAD"]).collect())?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    pub fn push(&self, remote: &str, branch: &str, env: &CommandEnv) -> Result<GitCommandOutput, GitWorkerError> {
        self.run_with_env(args(["push", remote, branch]).collect(), env)
    }

    fn run(&self, args: Vec<OsString>) -> Result<GitCommandOutput, GitWorkerError> {
        self.run_with_env(args, &[])
    }

    fn run_with_env(&self, args: Vec<OsString>, env: &CommandEnv) -> Result<GitCommandOutput, GitWorkerError> {
        let rendered: Vec<_> = args.iter().map(|arg| arg.to_string_lossy()).collect();
        let command = format!("git {}", rendered.join(" "));
        debug!(%command, cwd = %self.repo_path.display(), "running git");
        let result = self.executor.execute("git", &args, &self.repo_path, env).map_err(|error| {
            GitWorkerError::SpawnFailed { command: command.clone(), message: error.to_string() }
        })?;

        if result.success {
            return Ok(GitCommandOutput { stdout: result.stdout, stderr: result.stderr });
        }

        let stderr = if result.stderr.trim().is_empty() {
            String::from_utf8_lossy(&result.stdout).into_owned()
        } else {
            result.stderr
        };

        Err(GitWorkerError::CommandFailed { command, code: result.code, stderr })
    }
}

fn args<'a, const N: usize>(parts: [&'a str; N]) -> impl Iterator<Item = OsString> + 'a {
    parts.into_iter().map(OsString::from)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub(crate) struct Invocation {
        pub program: String,
        pub args: Vec<OsString>,
        pub cwd: PathBuf,
        pub env: Vec<(String, String)>,
    }

    /// Records every call and replays canned responses in order.
    #[derive(Debug, Clone)]
    pub(crate) struct MockExecutor {
        calls: Arc<Mutex<Vec<Invocation>>>,
        responses: Arc<Mutex<VecDeque<Result<CommandResult, std::io::Error>>>>,
    }

    impl MockExecutor {
        pub fn new(responses: Vec<Result<CommandResult, std::io::Error>>) -> Self {
            Self {
                calls: Arc::new(Mutex::new(Vec::new())),
                responses: Arc::new(Mutex::new(VecDeque::from(responses))),
            }
        }

        pub fn calls(&self) -> Vec<Invocation> {
            self.calls.lock().expect("mock calls lock poisoned").clone()
        }
    }

    impl CommandExecutor for MockExecutor {
        fn execute(
            &self,
            program: &str,
            args: &[OsString],
            cwd: &Path,
            env: &CommandEnv,
        ) -> Result<CommandResult, std::io::Error> {
            self.calls.lock().expect("mock calls lock poisoned").push(Invocation {
                program: program.to_string(),
                args: args.to_vec(),
                cwd: cwd.to_path_buf(),
                env: env.to_vec(),
            });

            self.responses
                .lock()
                .expect("mock responses lock poisoned")
                .pop_front()
                .expect("missing mock response")
        }
    }

    pub(crate) fn ok(stdout: &str) -> Result<CommandResult, std::io::Error> {
        Ok(CommandResult {
            success: true,
            code: Some(0),
            stdout: stdout.as_bytes().to_vec(),
            stderr: String::new(),
        })
    }

    pub(crate) fn failed(code: i32, stderr: &str) -> Result<CommandResult, std::io::Error> {
        Ok(CommandResult {
            success: false,
            code: Some(code),
            stdout: Vec::new(),
            stderr: stderr.to_string(),
        })
    }

    #[test]
    fn status_runs_porcelain_with_untracked_files() {
        let mock = MockExecutor::new(vec![ok("?? Inbox/a.md\0")]);

        let worker = GitWorker::with_executor("/tmp/repo", mock.clone());
        let output = worker.status_porcelain().expect("status should succeed");

        assert_eq!(output.stdout, b"?? Inbox/a.md\0");
        let calls = mock.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program, "git");
        assert_eq!(
            calls[0].args,
            vec!["status", "--porcelain", "-z", "--untracked-files=all", "--no-renames"]
        );
        assert_eq!(calls[0].cwd, PathBuf::from("/tmp/repo"));
        assert!(calls[0].env.is_empty());
    }

    #[test]
    fn add_requires_at_least_one_path() {
        let mock = MockExecutor::new(Vec::new());
        let worker = GitWorker::with_executor("/tmp/repo", mock);

        let error = worker.add::<&str>(&[]).expect_err("add should fail");
        assert_eq!(error, GitWorkerError::EmptyAddPaths);
        assert_eq!(error.command(), None);
    }

    #[test]
    fn add_separates_paths_from_options() {
        let mock = MockExecutor::new(vec![ok("")]);
        let worker = GitWorker::with_executor("/tmp/repo", mock.clone());

        worker.add(&["-weird.md", "Inbox/a.md"]).expect("add should succeed");
        assert_eq!(mock.calls()[0].args, vec!["add", "--all", "--", "-weird.md", "Inbox/a.md"]);
    }

    #[test]
    fn pull_returns_command_failure_with_stderr() {
        let mock = MockExecutor::new(vec![failed(128, "fatal: Not possible to fast-forward\n")]);
        let worker = GitWorker::with_executor("/tmp/repo", mock.clone());
        let env = vec![("GIT_SSH".to_string(), "/opt/ssh.sh".to_string())];

        let error = worker.pull_fast_forward("origin", "main", &env).expect_err("pull should fail");
        assert_eq!(
            error,
            GitWorkerError::CommandFailed {
                command: "git pull --ff-only origin main".to_string(),
                code: Some(128),
                stderr: "fatal: Not possible to fast-forward\n".to_string(),
            }
        );

        let calls = mock.calls();
        assert_eq!(calls[0].args, vec!["pull", "--ff-only", "origin", "main"]);
        assert_eq!(calls[0].env, env);
    }

    #[test]
    fn clone_targets_repo_path_with_credential_env() {
        let mock = MockExecutor::new(vec![ok("")]);
        let worker = GitWorker::with_executor("/srv/notes", mock.clone());
        let env = vec![("GIT_SSH".to_string(), "/opt/ssh.sh".to_string())];

        worker
            .clone_from("git@example.com:user/notes.git", "origin", &env)
            .expect("clone should succeed");

        let calls = mock.calls();
        assert_eq!(
            calls[0].args,
            vec!["clone", "--origin", "origin", "--", "git@example.com:user/notes.git", "/srv/notes"]
        );
        assert_eq!(calls[0].env, env);
    }

    #[test]
    fn commit_passes_message_as_single_argument() {
        let mock = MockExecutor::new(vec![ok("[main abc123] update\n")]);
        let worker = GitWorker::with_executor("/tmp/repo", mock.clone());

        let _ = worker.commit("Auto commit for inbox note").expect("commit should succeed");

        let calls = mock.calls();
        assert_eq!(calls[0].args, vec!["commit", "--cleanup=verbatim", "-m", "Auto commit for inbox note"]);
    }

    #[cfg(unix)]
    #[test]
    fn add_passes_non_utf8_paths_unchanged() {
        use std::os::unix::ffi::OsStrExt;

        let mock = MockExecutor::new(vec![ok("")]);
        let worker = GitWorker::with_executor("/tmp/repo", mock.clone());
        let raw = OsStr::from_bytes(b"Inbox/bad\xff.md");

        worker.add(&[raw]).expect("add should succeed");
        assert_eq!(mock.calls()[0].args[3].as_bytes(), b"Inbox/bad\xff.md");
    }

    #[test]
    fn head_commit_trims_output() {
        let mock = MockExecutor::new(vec![ok("0123abcd\n")]);
        let worker = GitWorker::with_executor("/tmp/repo", mock);

        assert_eq!(worker.head_commit().expect("rev-parse should succeed"), "0123abcd");
    }

    #[test]
    fn failure_without_stderr_falls_back_to_stdout() {
        let mock = MockExecutor::new(vec![Ok(CommandResult {
            success: false,
            code: Some(1),
            stdout: b"nothing to commit, working tree clean\n".to_vec(),
            stderr: "  ".to_string(),
        })]);
        let worker = GitWorker::with_executor("/tmp/repo", mock);

        let error = worker.commit("msg").expect_err("commit should fail");
        assert!(error.to_string().contains("nothing to commit"));
    }

    #[test]
    fn spawn_failure_is_reported_with_command() {
        let mock = MockExecutor::new(vec![Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "git not found",
        ))]);
        let worker = GitWorker::with_executor("/tmp/repo", mock);

        let error = worker.set_config("user.name", "bot").expect_err("spawn should fail");
        assert_eq!(
            error,
            GitWorkerError::SpawnFailed {
                command: "git config user.name bot".to_string(),
                message: "git not found".to_string(),
            }
        );
    }
}
