use std::path::Path;
use std::process::{Command, Stdio};

/// Hands a folder to something that can show it to the user.
pub trait FolderOpener {
    fn open(&self, path: &Path) -> std::io::Result<()>;
}

/// Opens folders with the host OS file browser, or a configured command.
#[derive(Debug, Clone, Default)]
pub struct SystemOpener {
    command: Option<String>,
}

impl SystemOpener {
    pub fn new(command: Option<String>) -> Self {
        SystemOpener { command }
    }

    fn program(&self) -> &str {
        if let Some(cmd) = self.command.as_deref()
            && !cmd.trim().is_empty()
        {
            return cmd;
        }
        default_program()
    }
}

#[cfg(target_os = "macos")]
fn default_program() -> &'static str {
    "open"
}

#[cfg(target_os = "windows")]
fn default_program() -> &'static str {
    "explorer"
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn default_program() -> &'static str {
    "xdg-open"
}

impl FolderOpener for SystemOpener {
    fn open(&self, path: &Path) -> std::io::Result<()> {
        let program = self.program();
        let status = Command::new(program)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()?;
        // explorer.exe exits with 1 even when it opened the folder
        if status.success() || cfg!(target_os = "windows") {
            Ok(())
        } else {
            Err(std::io::Error::other(format!(
                "{} exited with {}",
                program, status
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_command_wins() {
        let opener = SystemOpener::new(Some("nautilus".into()));
        assert_eq!(opener.program(), "nautilus");
    }

    #[test]
    fn blank_command_uses_platform_default() {
        let opener = SystemOpener::new(Some("  ".into()));
        assert_eq!(opener.program(), default_program());
        assert_eq!(SystemOpener::default().program(), default_program());
    }

    #[cfg(unix)]
    #[test]
    fn failing_command_is_an_error() {
        let opener = SystemOpener::new(Some("false".into()));
        assert!(opener.open(Path::new("/")).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn succeeding_command_is_ok() {
        let opener = SystemOpener::new(Some("true".into()));
        assert!(opener.open(Path::new("/")).is_ok());
    }
}
