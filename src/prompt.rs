//! Interactive prompts.
//!
//! Every question is a tiny state machine over [`PromptState`]: the prompter
//! asks, evaluates the answer, and either finishes or explains and asks again.
//! There is no retry limit. [`Prompter`] is generic over its reader and writer so
//! specs can script a whole conversation with a `Cursor`.

use std::fmt::Display;
use std::io::{self, BufRead, Write};

use crate::error::{Error, Result};

/// Where a single question currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptState<T> {
    AwaitingInput,
    Valid(T),
    /// The last answer was rejected; the message is shown before asking again.
    InvalidRetry(String),
}

/// Evaluate an answer to a 1-based numbered menu of `len` options.
/// Returns the 0-based index on success.
pub fn evaluate_choice(input: &str, len: usize) -> PromptState<usize> {
    match input.trim().parse::<usize>() {
        Ok(n) if (1..=len).contains(&n) => PromptState::Valid(n - 1),
        Ok(_) => PromptState::InvalidRetry("Invalid choice. Please choose a valid number.".into()),
        Err(_) => PromptState::InvalidRetry("Please enter a valid number.".into()),
    }
}

/// Evaluate a yes/no answer. Case-insensitive, surrounding whitespace ignored.
pub fn evaluate_confirm(input: &str) -> PromptState<bool> {
    match input.trim().to_lowercase().as_str() {
        "yes" => PromptState::Valid(true),
        "no" => PromptState::Valid(false),
        _ => PromptState::InvalidRetry("Invalid choice. Please enter 'yes' or 'no'.".into()),
    }
}

pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl Prompter<io::StdinLock<'static>, io::Stdout> {
    /// Prompter bound to the process console.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Print a line to the operator.
    pub fn say(&mut self, message: impl Display) -> Result<()> {
        writeln!(self.output, "{}", message)?;
        Ok(())
    }

    fn read_raw(&mut self) -> Result<String> {
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(Error::InputClosed);
        }
        Ok(line)
    }

    /// Ask a free-form question and return the trimmed answer.
    pub fn ask_line(&mut self, question: &str) -> Result<String> {
        write!(self.output, "{}", question)?;
        Ok(self.read_raw()?.trim().to_string())
    }

    fn ask<T>(&mut self, question: &str, evaluate: impl Fn(&str) -> PromptState<T>) -> Result<T> {
        let mut state = PromptState::AwaitingInput;
        loop {
            state = match state {
                PromptState::AwaitingInput => {
                    write!(self.output, "{}", question)?;
                    let answer = self.read_raw()?;
                    evaluate(&answer)
                }
                PromptState::Valid(value) => return Ok(value),
                PromptState::InvalidRetry(message) => {
                    writeln!(self.output, "{}", message)?;
                    PromptState::AwaitingInput
                }
            };
        }
    }

    /// Show `prompt` and a numbered list, then read until a valid number is given.
    ///
    /// Fails with [`Error::EmptyOptionSet`] without reading anything when `options`
    /// is empty.
    pub fn choose<'a, T: Display>(&mut self, options: &'a [T], prompt: &str) -> Result<&'a T> {
        if options.is_empty() {
            return Err(Error::EmptyOptionSet);
        }

        writeln!(self.output, "{}", prompt)?;
        for (i, option) in options.iter().enumerate() {
            writeln!(self.output, "{}. {}", i + 1, option)?;
        }

        let len = options.len();
        let index = self.ask("Select an option (by number): ", |answer| {
            evaluate_choice(answer, len)
        })?;
        Ok(&options[index])
    }

    /// Ask a yes/no question; only `yes` or `no` are accepted.
    pub fn confirm(&mut self, question: &str) -> Result<bool> {
        self.ask(&format!("{} (yes/no): ", question), evaluate_confirm)
    }
}
