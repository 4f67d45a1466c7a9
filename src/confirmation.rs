//! Operator confirmation for dropins that can't be verified
//!
//! [`ConfirmationGate`] turns a [`QuestionKind`] into a fixed question and
//! hands it to a [`ConfirmPrompt`]. The default answer is always "no": a
//! missing answer must never install an unverified file.

use anyhow::{Context, Result};
use crossterm::style::Stylize;
use std::io::{BufRead, Write};

use crate::classifier::locale_name;
use crate::types::QuestionKind;

/// Yes/no prompt collaborator.
pub trait ConfirmPrompt {
    /// Show `lines` and return the operator's answer, `default` when there is
    /// no usable input.
    fn ask_confirm(&mut self, lines: &[String], default: bool) -> Result<bool>;
}

/// Build and ask the confirmation question for a dropin.
pub struct ConfirmationGate<'p> {
    prompt: &'p mut dyn ConfirmPrompt,
}

impl<'p> ConfirmationGate<'p> {
    pub fn new(prompt: &'p mut dyn ConfirmPrompt) -> Self {
        Self { prompt }
    }

    pub fn confirm(&mut self, filename: &str, kind: QuestionKind, wp_version: &str) -> Result<bool> {
        let lines = question_lines(filename, kind, wp_version);
        self.prompt.ask_confirm(&lines, false)
    }
}

/// Fixed question text for each kind.
pub fn question_lines(filename: &str, kind: QuestionKind, wp_version: &str) -> Vec<String> {
    let for_version = if wp_version.trim().is_empty() {
        String::new()
    } else {
        format!(" for WP '{}'", wp_version.trim())
    };
    let locale = locale_name(filename);

    let (first, second) = match kind {
        QuestionKind::NoDropin => (
            format!("\"{}\" is not a core supported dropin name.", filename),
            "It might be supported by a plugin or a custom setup, but it can't be verified here."
                .to_string(),
        ),
        QuestionKind::LocalesError => (
            format!(
                "\"{}\" looks like a translation dropin, but the list of available locales{} could not be fetched.",
                filename, for_version
            ),
            format!(
                "Without that list it is not possible to verify \"{}\" is a valid locale.",
                locale
            ),
        ),
        QuestionKind::NoLocale => (
            format!(
                "\"{}\" looks like a translation dropin, but \"{}\" is not an available locale{}.",
                filename, locale, for_version
            ),
            "It might be supported by a plugin or a custom setup.".to_string(),
        ),
    };

    vec![
        first,
        second,
        "Do you want to proceed with the installation anyway?".to_string(),
    ]
}

/// Interactive prompt on a terminal: question to stderr, answer from stdin.
pub struct TerminalPrompt<R, W> {
    input: R,
    output: W,
}

impl TerminalPrompt<std::io::StdinLock<'static>, std::io::Stderr> {
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stderr())
    }
}

impl<R: BufRead, W: Write> TerminalPrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

/// `y`/`yes`/`n`/`no`, case-insensitive; `None` for anything else.
fn parse_answer(answer: &str) -> Option<bool> {
    match answer.trim().to_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

impl<R: BufRead, W: Write> ConfirmPrompt for TerminalPrompt<R, W> {
    fn ask_confirm(&mut self, lines: &[String], default: bool) -> Result<bool> {
        let hint = if default { "[Y/n]" } else { "[y/N]" };

        writeln!(self.output).context("Failed to write prompt")?;
        for line in lines {
            writeln!(self.output, "  {}", line.as_str().yellow()).context("Failed to write prompt")?;
        }

        loop {
            write!(self.output, "  {} ", hint.bold()).context("Failed to write prompt")?;
            self.output.flush().context("Failed to flush prompt")?;

            let mut answer = String::new();
            let read = self
                .input
                .read_line(&mut answer)
                .context("Failed to read answer")?;

            // EOF: nobody is there to answer
            if read == 0 {
                writeln!(self.output).context("Failed to write prompt")?;
                return Ok(default);
            }
            if answer.trim().is_empty() {
                return Ok(default);
            }
            if let Some(choice) = parse_answer(&answer) {
                return Ok(choice);
            }
            writeln!(self.output, "  Please answer \"y\" or \"n\".")
                .context("Failed to write prompt")?;
        }
    }
}

/// Prompt for unattended runs: always takes the default answer.
#[derive(Debug, Default, Clone, Copy)]
pub struct NonInteractivePrompt;

impl ConfirmPrompt for NonInteractivePrompt {
    fn ask_confirm(&mut self, lines: &[String], default: bool) -> Result<bool> {
        tracing::info!(
            "Non-interactive mode, answering {} to: {}",
            if default { "yes" } else { "no" },
            lines.first().map(String::as_str).unwrap_or_default()
        );
        Ok(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    struct Recorder {
        answer: bool,
        asked: Vec<(Vec<String>, bool)>,
    }

    impl ConfirmPrompt for Recorder {
        fn ask_confirm(&mut self, lines: &[String], default: bool) -> Result<bool> {
            self.asked.push((lines.to_vec(), default));
            Ok(self.answer)
        }
    }

    #[test]
    fn test_gate_defaults_to_no_and_returns_answer() {
        let mut prompt = Recorder {
            answer: true,
            asked: Vec::new(),
        };
        let confirmed = ConfirmationGate::new(&mut prompt)
            .confirm("bogus.txt", QuestionKind::NoDropin, "6.4")
            .unwrap();

        assert!(confirmed);
        assert_eq!(prompt.asked.len(), 1);
        assert!(!prompt.asked[0].1, "default answer must be false");
        assert_eq!(prompt.asked[0].0.len(), 3);
    }

    #[test]
    fn test_no_dropin_question() {
        let lines = question_lines("bogus.txt", QuestionKind::NoDropin, "6.4");
        assert_eq!(lines[0], "\"bogus.txt\" is not a core supported dropin name.");
        assert_eq!(
            lines[2],
            "Do you want to proceed with the installation anyway?"
        );
    }

    #[test]
    fn test_locales_error_question_mentions_version() {
        let lines = question_lines("it_IT.php", QuestionKind::LocalesError, "6.4.2");
        assert!(lines[0].contains("available locales for WP '6.4.2' could not be fetched"));
        assert!(lines[1].contains("\"it_IT\""));

        let lines = question_lines("it_IT.php", QuestionKind::LocalesError, "");
        assert!(lines[0].contains("available locales could not be fetched"));
        assert!(!lines[0].contains("for WP"));
    }

    #[test]
    fn test_no_locale_question() {
        let lines = question_lines("xx_XX.php", QuestionKind::NoLocale, "6.4");
        assert_eq!(
            lines[0],
            "\"xx_XX.php\" looks like a translation dropin, but \"xx_XX\" is not an available locale for WP '6.4'."
        );
    }

    #[test]
    fn test_terminal_prompt_answers() {
        let lines = vec!["Proceed?".to_string()];
        for (input, expected) in [
            ("y\n", true),
            ("YES\n", true),
            ("n\n", false),
            ("\n", false),
            ("", false),
            ("maybe\nyes\n", true),
        ] {
            let mut output = Vec::new();
            let mut prompt = TerminalPrompt::new(Cursor::new(input), &mut output);
            assert_eq!(
                prompt.ask_confirm(&lines, false).unwrap(),
                expected,
                "input {:?}",
                input
            );
        }
    }

    #[test]
    fn test_terminal_prompt_empty_answer_takes_default() {
        let mut output = Vec::new();
        let mut prompt = TerminalPrompt::new(Cursor::new("\n"), &mut output);
        assert!(prompt.ask_confirm(&["Proceed?".to_string()], true).unwrap());
    }

    #[test]
    fn test_non_interactive_prompt_takes_default() {
        let mut prompt = NonInteractivePrompt;
        assert!(!prompt.ask_confirm(&["x".to_string()], false).unwrap());
        assert!(prompt.ask_confirm(&["x".to_string()], true).unwrap());
    }

    #[test]
    fn test_terminal_prompt_read_error_keeps_io_source() {
        let mut output = Vec::new();
        // Not UTF-8, so read_line fails
        let mut prompt = TerminalPrompt::new(Cursor::new(vec![0xff, 0xfe, b'\n']), &mut output);

        let err = prompt.ask_confirm(&["x".to_string()], false).unwrap_err();
        assert_eq!(err.to_string(), "Failed to read answer");
        let io = err.root_cause().downcast_ref::<std::io::Error>().unwrap();
        assert_eq!(io.kind(), std::io::ErrorKind::InvalidData);
    }
}
