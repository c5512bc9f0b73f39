use assert_cmd::Command;
use std::path::Path;

/// The CLI with every `SPOJBOARD_*` variable cleared and the home and
/// config dirs pointed at `home`, so no developer `.env` or config leaks in.
pub fn bin(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("spojboard-build").expect("bin");
    for (key, _) in std::env::vars_os() {
        if key.to_string_lossy().starts_with("SPOJBOARD_") {
            cmd.env_remove(&key);
        }
    }
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env("APPDATA", home.join("AppData"));
    cmd
}
