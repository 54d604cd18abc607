//! Shell-script stand-in for yt-dlp.
//!
//! In metadata mode (`--dump-single-json`) it prints `info_json`; otherwise it
//! behaves like a download to stdout, running `download_body`.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

use tempfile::TempDir;

pub struct FakeYtDlp {
    _dir: TempDir,
    pub path: PathBuf,
}

impl FakeYtDlp {
    pub fn new(info_json: &str, download_body: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let info_path = dir.path().join("info.json");
        std::fs::write(&info_path, info_json).unwrap();

        let path = dir.path().join("yt-dlp");
        let script = format!(
            "#!/bin/sh\nfor arg in \"$@\"; do\n  if [ \"$arg\" = \"--dump-single-json\" ]; then\n    cat '{}'\n    exit 0\n  fi\ndone\n{download_body}\n",
            info_path.display()
        );
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();

        Self { _dir: dir, path }
    }
}
