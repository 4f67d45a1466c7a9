//! Type-safe external command execution
//!
//! `run_command_safe` is the only sanctioned way to spawn external programs
//! (curl) from this crate. It guarantees:
//!
//! - Process group isolation, so interrupted downloads die with the step
//! - PID registration with the global `ChildRegistry`
//! - Argument passing through the `CommandArgs` contract

use crate::command_traits::CommandArgs;
use crate::process_guard::{ChildRegistry, CommandProcessGroup};
use anyhow::{Context, Result};
use std::process::{Command, Stdio};
use tracing::{debug, info};

/// Execute an external command with typed arguments.
///
/// # Returns
///
/// - `Ok(output)` - the command ran; check `output.success` for its status
/// - `Err` - the command could not be spawned or waited for
pub fn run_command_safe<T: CommandArgs>(args: &T) -> Result<CommandOutput> {
    let program = args.program();
    let cli_args = args.to_cli_args();
    let env_vars = args.get_env_vars();

    debug!("run_command_safe: {} args={:?}", program, cli_args);

    let mut cmd = Command::new(program);
    cmd.args(&cli_args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .in_new_process_group();

    for (key, value) in &env_vars {
        cmd.env(key, value);
    }

    let child = cmd
        .spawn()
        .with_context(|| format!("Failed to spawn {}", program))?;
    let pid = child.id();

    if let Ok(mut registry) = ChildRegistry::global().lock() {
        registry.register(pid);
    }

    let output = child.wait_with_output();

    if let Ok(mut registry) = ChildRegistry::global().lock() {
        registry.unregister(pid);
    }

    let output = output.with_context(|| format!("Failed waiting for {}", program))?;

    let result = CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        exit_code: output.status.code(),
        success: output.status.success(),
    };

    if result.success {
        debug!("{} exited successfully", program);
    } else {
        info!(
            "{} failed with exit code {}",
            program,
            result.exit_code.unwrap_or(-1)
        );
    }

    Ok(result)
}

/// Output from an external command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code (None if terminated by signal).
    pub exit_code: Option<i32>,
    pub success: bool,
}

impl CommandOutput {
    /// Turn a non-zero exit into an error carrying stderr.
    pub fn ensure_success(&self, context: &str) -> Result<()> {
        if self.success {
            Ok(())
        } else {
            anyhow::bail!(
                "{} failed (exit code {}): {}",
                context,
                self.exit_code.unwrap_or(-1),
                self.stderr.trim()
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo(Vec<String>);

    impl CommandArgs for Echo {
        fn program(&self) -> &'static str {
            "echo"
        }

        fn to_cli_args(&self) -> Vec<String> {
            self.0.clone()
        }
    }

    struct False;

    impl CommandArgs for False {
        fn program(&self) -> &'static str {
            "false"
        }

        fn to_cli_args(&self) -> Vec<String> {
            Vec::new()
        }
    }

    struct Missing;

    impl CommandArgs for Missing {
        fn program(&self) -> &'static str {
            "this_binary_definitely_does_not_exist_12345"
        }

        fn to_cli_args(&self) -> Vec<String> {
            Vec::new()
        }
    }

    #[test]
    fn test_run_captures_stdout() {
        let output = run_command_safe(&Echo(vec!["hello".to_string()])).unwrap();
        assert!(output.success);
        assert_eq!(output.stdout.trim(), "hello");
        assert_eq!(output.exit_code, Some(0));
        assert!(output.ensure_success("echo").is_ok());
    }

    #[test]
    fn test_run_reports_failure() {
        let output = run_command_safe(&False).unwrap();
        assert!(!output.success);
        let err = output.ensure_success("false").unwrap_err();
        assert!(err.to_string().starts_with("false failed (exit code 1)"));
    }

    #[test]
    fn test_missing_program_is_error() {
        assert!(run_command_safe(&Missing).is_err());
    }
}
