#![allow(dead_code)]

use std::{fs, path::Path, process::Command};
use temp_dir::TempDir;
use transtrack::{
    config::{Config, Context},
    track::{Report, Track},
};

// https://git-scm.com/book/en/v2/Git-Internals-Environment-Variables
const GIT_ENV: [(&str, &str); 9] = [
    ("GIT_CONFIG_GLOBAL", "/dev/null"),
    ("GIT_CONFIG_SYSTEM", "/dev/null"),
    ("GIT_AUTHOR_NAME", "Author Name"),
    ("GIT_AUTHOR_EMAIL", "author@email.com"),
    ("GIT_AUTHOR_DATE", "Fri Feb 16 11:11 2024 +0100"),
    ("GIT_COMMITTER_NAME", "Committer Name"),
    ("GIT_COMMITTER_EMAIL", "committer@email.com"),
    ("GIT_COMMITTER_DATE", "Sun Feb 18 14:00 2024 +0100"),
    ("LC_ALL", "C"),
];

pub struct RepoTestContext {
    pub dir: TempDir,
}

impl RepoTestContext {
    pub fn setup_init() -> Self {
        let dir = TempDir::new().unwrap();
        run(dir.path(), &["git", "init", "--initial-branch=main"]);
        Self { dir }
    }

    pub fn write(&self, path: &str, content: &str) {
        let path = self.dir.child(path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).expect("error writing to file");
    }

    pub fn commit_all(&self, message: &str) {
        self.git(&["add", "--all"]);
        self.git(&["commit", "--message", message]);
    }

    /// Writes `files` and commits them.
    pub fn commit(&self, message: &str, files: &[(&str, &str)]) {
        for (path, content) in files {
            self.write(path, content);
        }
        self.commit_all(message);
    }

    pub fn git(&self, args: &[&str]) -> String {
        let cmd = ["git"].iter().chain(args).copied().collect::<Vec<_>>();
        run(self.dir.path(), &cmd)
    }

    pub fn rev_parse(&self, rev: &str) -> String {
        self.git(&["rev-parse", rev]).trim_end().to_string()
    }

    pub fn context(&self, source: &str, localized: &[(&str, &str)]) -> Context {
        self.context_with(source, localized, Config::default())
    }

    pub fn context_with(&self, source: &str, localized: &[(&str, &str)], config: Config) -> Context {
        let localized = localized
            .iter()
            .map(|(tag, root)| (tag.to_string(), root.into()))
            .collect::<Vec<_>>();
        Context::new(self.dir.path(), Path::new(source), &localized, config).unwrap()
    }

    pub fn report(&self, source: &str, localized: &[(&str, &str)]) -> Report {
        self.report_with(source, localized, Config::default())
    }

    pub fn report_with(&self, source: &str, localized: &[(&str, &str)], config: Config) -> Report {
        transtrack::run(&self.context_with(source, localized, config)).unwrap()
    }
}

pub fn track<'a>(report: &'a Report, localized: &str) -> &'a Track {
    report
        .tracks
        .iter()
        .find(|track| track.localized.file.path == Path::new(localized))
        .unwrap_or_else(|| panic!("no track for {}", localized))
}

pub fn run(dir: &Path, cmd: &[&str]) -> String {
    let output = Command::new(cmd[0])
        .args(&cmd[1..])
        .current_dir(dir)
        .envs(GIT_ENV)
        .output()
        .unwrap_or_else(|_| panic!("failed to execute {:?}", cmd));

    assert!(
        output.status.success(),
        "{:?} failed: {}",
        cmd,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).unwrap()
}
