//! Line-oriented console prompts.
//!
//! [`Prompter`] works over any async reader/writer pair so the interactive
//! flows can be driven from byte buffers in tests.

use crate::config::ConfigStore;
use crate::error::AppError;
use std::fmt::Display;
use std::str::FromStr;
use ticket_pool_core::config::SimulationConfig;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// Reads answers from `R` and writes prompts to `W`.
#[derive(Debug)]
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R, W> Prompter<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Wrap a reader and writer
    pub const fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Give back the reader and writer
    pub fn into_inner(self) -> (R, W) {
        (self.input, self.output)
    }

    /// Write `text` followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Io`] if the output fails.
    pub async fn say(&mut self, text: impl Display) -> Result<(), AppError> {
        self.output.write_all(format!("{text}\n").as_bytes()).await?;
        self.output.flush().await?;
        Ok(())
    }

    /// Read one trimmed line. `Ok(None)` at end of input.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Io`] if the input fails.
    pub async fn read_line(&mut self) -> Result<Option<String>, AppError> {
        let mut line = String::new();
        if self.input.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Write `prompt` without a newline and read the answer.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InputClosed`] at end of input.
    pub async fn ask(&mut self, prompt: &str) -> Result<String, AppError> {
        self.output.write_all(prompt.as_bytes()).await?;
        self.output.flush().await?;
        self.read_line().await?.ok_or(AppError::InputClosed)
    }

    /// Ask a yes/no question. Anything other than `y`/`yes` is no.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InputClosed`] at end of input.
    pub async fn ask_yes_no(&mut self, prompt: &str) -> Result<bool, AppError> {
        let answer = self.ask(prompt).await?.to_lowercase();
        Ok(matches!(answer.as_str(), "y" | "yes"))
    }

    /// Ask for a number in `[min, max]`, re-prompting until one is given.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InputClosed`] at end of input.
    pub async fn ask_in_range<T>(&mut self, prompt: &str, min: T, max: T) -> Result<T, AppError>
    where
        T: FromStr + PartialOrd + Display + Copy,
    {
        loop {
            let answer = self.ask(prompt).await?;
            match answer.parse::<T>() {
                Ok(value) if value >= min && value <= max => return Ok(value),
                Ok(_) => self.say(format!("Value must be between {min} and {max}.")).await?,
                Err(_) => {
                    self.say("Invalid input. Please enter a valid integer.").await?;
                }
            }
        }
    }
}

/// Ask for the four operator-supplied values. Roster sizes, batch ranges and
/// the shutdown timeout keep their defaults.
///
/// # Errors
///
/// Returns [`AppError::InputClosed`] if input ends before all values are
/// entered.
pub async fn prompt_for_config<R, W>(
    prompter: &mut Prompter<R, W>,
) -> Result<SimulationConfig, AppError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let total = prompter
        .ask_in_range("Enter Total Tickets (>0): ", 1, u32::MAX)
        .await?;
    let release = prompter
        .ask_in_range("Enter Ticket Release Rate (milliseconds): ", 1, u64::MAX)
        .await?;
    let retrieval = prompter
        .ask_in_range("Enter Customer Retrieval Rate (milliseconds): ", 1, u64::MAX)
        .await?;
    let capacity = prompter
        .ask_in_range("Enter Max Ticket Capacity (>= Total Tickets): ", total, u32::MAX)
        .await?;

    Ok(SimulationConfig::new(total, release, retrieval, capacity))
}

/// Run the configuration dialogue: offer the saved configuration, fall back
/// to prompting, save what was entered and print the result.
///
/// A saved file that is missing, unreadable or invalid leads to prompting.
/// Failing to save a new configuration is reported but not fatal.
///
/// # Errors
///
/// Returns [`AppError::InputClosed`] if input ends mid-dialogue, or
/// [`AppError::Io`] if the console fails.
pub async fn configure<R, W>(
    prompter: &mut Prompter<R, W>,
    store: &ConfigStore,
) -> Result<SimulationConfig, AppError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    if prompter
        .ask_yes_no("Do you want to load the previous configuration? (y/n): ")
        .await?
    {
        match store.load().await {
            Ok(Some(config)) => match config.validate() {
                Ok(()) => {
                    prompter.say("Configuration loaded from file.").await?;
                    show_config(prompter, &config).await?;
                    return Ok(config);
                }
                Err(error) => {
                    prompter
                        .say(format!("Saved configuration is invalid: {error}."))
                        .await?;
                }
            },
            Ok(None) => prompter.say("No previous configurations.").await?,
            Err(error) => {
                tracing::warn!(path = %store.path().display(), error = %error, "Could not read saved configuration");
                prompter
                    .say(format!("Could not read previous configuration: {error}."))
                    .await?;
            }
        }
    }

    prompter.say("Entering new configuration...\n").await?;
    let config = prompt_for_config(prompter).await?;

    if let Err(error) = store.save(&config).await {
        tracing::warn!(path = %store.path().display(), error = %error, "Could not save configuration");
        prompter
            .say(format!("Could not save configuration: {error}."))
            .await?;
    }

    prompter.say("\nConfiguration complete!").await?;
    show_config(prompter, &config).await?;
    Ok(config)
}

async fn show_config<R, W>(
    prompter: &mut Prompter<R, W>,
    config: &SimulationConfig,
) -> Result<(), AppError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    prompter
        .say(format!(
            "System Configuration:\n\
             Total Tickets: {}\n\
             Ticket Release Rate: {} ms\n\
             Customer Retrieval Rate: {} ms\n\
             Max Ticket Capacity: {}",
            config.initial_tickets,
            config.release_interval_ms,
            config.retrieval_interval_ms,
            config.max_capacity
        ))
        .await
}
