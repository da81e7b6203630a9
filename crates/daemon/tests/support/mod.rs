// Shared fixtures: a bare "remote" reachable as git@example.com:user/notes.git
// through a credential script that serves it from the local filesystem.

#![allow(dead_code)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;

use notesync_daemon::git::RepositoryConfig;
use tempfile::TempDir;

pub const REMOTE: &str = "git@example.com:user/notes.git";

pub struct RemoteFixture {
    pub temp: TempDir,
    /// Bare repository the locator resolves to.
    pub bare: PathBuf,
    /// Non-bare clone used to advance the remote behind the binding's back.
    pub upstream: PathBuf,
    pub credential: PathBuf,
}

impl RemoteFixture {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("tempdir should be created");
        let root = temp.path().join("remote");
        let bare = root.join("user").join("notes.git");
        let upstream = temp.path().join("upstream");
        std::fs::create_dir_all(&bare).expect("bare dir should be created");

        run_git(&bare, &["init", "--bare", "-b", "main"]);
        run_git(temp.path(), &["init", "-b", "main", path_str(&upstream)]);
        identity(&upstream);
        std::fs::write(upstream.join("README.md"), "# Notes\n").expect("seed file should be written");
        run_git(&upstream, &["add", "README.md"]);
        run_git(&upstream, &["commit", "-m", "Initial commit"]);
        run_git(&upstream, &["remote", "add", "origin", path_str(&bare)]);
        run_git(&upstream, &["push", "origin", "main"]);

        let credential = temp.path().join("git-ssh.sh");
        let script = format!(
            "#!/bin/sh\n\
             if [ \"$1\" = \"-G\" ]; then exit 1; fi\n\
             while [ $# -gt 2 ]; do shift; done\n\
             cd '{}' || exit 1\n\
             cmd=\"$2\"\n\
             exec sh -c \"git ${{cmd#git-}}\"\n",
            root.display()
        );
        std::fs::write(&credential, script).expect("credential script should be written");
        std::fs::set_permissions(&credential, std::fs::Permissions::from_mode(0o755))
            .expect("credential script should be executable");

        Self { temp, bare, upstream, credential }
    }

    pub fn local_path(&self) -> PathBuf {
        self.temp.path().join("notes")
    }

    pub fn config(&self) -> RepositoryConfig {
        RepositoryConfig::new(REMOTE, self.local_path(), &self.credential)
    }

    pub fn remote_head(&self) -> String {
        git_output(&self.bare, &["rev-parse", "main"])
    }

    /// Commit `file` upstream and push it to the bare remote.
    pub fn advance_remote(&self, file: &str, contents: &str) {
        std::fs::write(self.upstream.join(file), contents).expect("upstream file should be written");
        run_git(&self.upstream, &["add", file]);
        run_git(&self.upstream, &["commit", "-m", &format!("Add {file}")]);
        run_git(&self.upstream, &["push", "origin", "main"]);
    }
}

pub fn identity(repo: &Path) {
    run_git(repo, &["config", "user.name", "Fixture"]);
    run_git(repo, &["config", "user.email", "fixture@example.test"]);
}

pub fn commit_count(repo: &Path) -> usize {
    git_output(repo, &["rev-list", "--count", "HEAD"]).parse().expect("count should be numeric")
}

pub fn run_git(cwd: &Path, args: &[&str]) {
    let output = Command::new("git")
        .current_dir(cwd)
        .args(args)
        .output()
        .expect("git command should execute");
    assert!(
        output.status.success(),
        "git {:?} failed\nstdout:\n{}\nstderr:\n{}",
        args,
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

pub fn git_output(cwd: &Path, args: &[&str]) -> String {
    String::from_utf8(git_stdout(cwd, args)).expect("git output should be utf8").trim().to_string()
}

/// Untrimmed stdout bytes of a successful git command.
pub fn git_stdout(cwd: &Path, args: &[&str]) -> Vec<u8> {
    let output = Command::new("git")
        .current_dir(cwd)
        .args(args)
        .output()
        .expect("git command should execute");
    assert!(
        output.status.success(),
        "git {:?} failed\nstderr:\n{}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    output.stdout
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("utf8 path")
}
