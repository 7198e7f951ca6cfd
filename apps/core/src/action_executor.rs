use std::fmt::{Display, Formatter};
use std::io::{ErrorKind, Write};
use std::process::{Command, Stdio};

use crate::contract::ItemAction;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    EmptyText,
    NoClipboardTool,
    CopyFailed { message: String, code: Option<i32> },
}

impl Display for ActionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyText => write!(f, "nothing to copy"),
            Self::NoClipboardTool => write!(f, "no clipboard command available"),
            Self::CopyFailed {
                message,
                code: Some(code),
            } => write!(f, "clipboard copy failed ({code}): {message}"),
            Self::CopyFailed { message, code: None } => {
                write!(f, "clipboard copy failed: {message}")
            }
        }
    }
}

impl std::error::Error for ActionError {}

pub fn execute(action: &ItemAction) -> Result<(), ActionError> {
    match action {
        ItemAction::CopyToClipboard { text } => copy_to_clipboard(text),
    }
}

pub fn copy_to_clipboard(text: &str) -> Result<(), ActionError> {
    copy_with_commands(text, CLIPBOARD_COMMANDS)
}

/// Pipes `text` into the first candidate that can be spawned. A candidate
/// that is not installed is skipped; one that runs and fails is reported.
pub fn copy_with_commands(text: &str, candidates: &[(&str, &[&str])]) -> Result<(), ActionError> {
    if text.trim().is_empty() {
        return Err(ActionError::EmptyText);
    }

    for &(program, args) in candidates {
        let mut child = match Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => child,
            Err(error) if error.kind() == ErrorKind::NotFound => continue,
            Err(error) => {
                return Err(ActionError::CopyFailed {
                    message: format!("failed to start {program}: {error}"),
                    code: None,
                })
            }
        };

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .map_err(|e| ActionError::CopyFailed {
                    message: format!("failed to write to {program}: {e}"),
                    code: None,
                })?;
        }

        let status = child.wait().map_err(|e| ActionError::CopyFailed {
            message: format!("failed to wait for {program}: {e}"),
            code: None,
        })?;
        if !status.success() {
            return Err(ActionError::CopyFailed {
                message: format!("{program} exited unsuccessfully"),
                code: status.code(),
            });
        }

        tracing::info!(program, "copied text to clipboard");
        return Ok(());
    }

    Err(ActionError::NoClipboardTool)
}

const NO_ARGS: &[&str] = &[];

#[cfg(target_os = "windows")]
const CLIPBOARD_COMMANDS: &[(&str, &[&str])] = &[("clip", NO_ARGS)];

#[cfg(target_os = "macos")]
const CLIPBOARD_COMMANDS: &[(&str, &[&str])] = &[("pbcopy", NO_ARGS)];

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const XCLIP_ARGS: &[&str] = &["-selection", "clipboard"];
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const XSEL_ARGS: &[&str] = &["--clipboard", "--input"];
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const CLIPBOARD_COMMANDS: &[(&str, &[&str])] = &[
    ("wl-copy", NO_ARGS),
    ("xclip", XCLIP_ARGS),
    ("xsel", XSEL_ARGS),
];
