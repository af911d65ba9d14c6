//! Reveal a directory in the desktop file manager

use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

use tracing::info;

/// Platform command that opens `dir` in a file manager window
pub fn folder_command(dir: &Path) -> Command {
    #[cfg(target_os = "windows")]
    let mut cmd = Command::new("explorer");
    #[cfg(target_os = "macos")]
    let mut cmd = Command::new("open");
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    let mut cmd = Command::new("xdg-open");

    cmd.arg(dir);
    cmd
}

/// Open `dir` without waiting for the file manager
///
/// The child's output is discarded so it cannot draw over the terminal UI.
pub fn open_folder(dir: &Path) -> io::Result<()> {
    if !dir.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("directory does not exist: {}", dir.display()),
        ));
    }

    folder_command(dir)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    info!("Opened folder {}", dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_folder_command_targets_directory() {
        let dir = Path::new("/srv/www/wp-content");
        let cmd = folder_command(dir);
        let args: Vec<_> = cmd.get_args().collect();
        assert_eq!(args, vec![dir.as_os_str()]);
        assert!(!cmd.get_program().is_empty());
    }

    #[test]
    fn test_open_missing_folder_fails() {
        let temp = tempdir().unwrap();
        let err = open_folder(&temp.path().join("gone")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
