//! Main menu loop.

use crate::error::AppError;
use crate::prompt::Prompter;
use std::future::Future;
use ticket_pool_runtime::{SimulationController, StartOutcome, StopOutcome};
use tokio::io::{AsyncBufRead, AsyncWrite};

const MENU: &str = "1. Start Simulation\n2. Stop Simulation and Save Transactions\n3. Exit";

/// A menu selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    /// Spawn vendors and customers
    Start,
    /// Stop the run and export its transactions
    Stop,
    /// Stop if running, then quit
    Exit,
}

impl MenuChoice {
    /// Parse a trimmed input line.
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(Self::Start),
            "2" => Some(Self::Stop),
            "3" => Some(Self::Exit),
            _ => None,
        }
    }
}

/// Serve the menu until the operator exits, input ends or `interrupt`
/// resolves. A running simulation is always stopped, and its transactions
/// exported, before returning.
///
/// # Errors
///
/// Returns [`AppError::Io`] if the console fails.
pub async fn run_menu<R, W, F>(
    prompter: &mut Prompter<R, W>,
    controller: &mut SimulationController,
    interrupt: F,
) -> Result<(), AppError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    F: Future<Output = ()>,
{
    tokio::pin!(interrupt);

    loop {
        prompter.say(MENU).await?;
        prompter.say("Enter your choice: ").await?;

        let line = tokio::select! {
            () = &mut interrupt => {
                tracing::info!("Interrupted, shutting down");
                return stop_and_report(prompter, controller).await;
            }
            line = prompter.read_line() => line?,
        };
        let Some(line) = line else {
            tracing::info!("Input closed, shutting down");
            return stop_and_report(prompter, controller).await;
        };

        match MenuChoice::parse(&line) {
            Some(MenuChoice::Start) => match controller.start() {
                StartOutcome::Started { vendors, customers } => {
                    prompter
                        .say(format!(
                            "Simulation started with {vendors} Vendors and {customers} Customers.\n"
                        ))
                        .await?;
                }
                StartOutcome::AlreadyRunning => {
                    prompter.say("Simulation is already running.").await?;
                }
            },
            Some(MenuChoice::Stop) => {
                if controller.is_running() {
                    stop_and_report(prompter, controller).await?;
                } else {
                    prompter.say("No simulation is running.").await?;
                }
            }
            Some(MenuChoice::Exit) => {
                stop_and_report(prompter, controller).await?;
                prompter.say("Exiting application.").await?;
                return Ok(());
            }
            None => prompter.say("Invalid choice. Please select 1, 2 or 3.").await?,
        }
    }
}

async fn stop_and_report<R, W>(
    prompter: &mut Prompter<R, W>,
    controller: &mut SimulationController,
) -> Result<(), AppError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    if !controller.is_running() {
        return Ok(());
    }

    prompter.say("Stopping simulation and saving transaction data...").await?;
    if let StopOutcome::Stopped(summary) = controller.stop().await {
        prompter.say(&summary).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_menu_choices() {
        assert_eq!(MenuChoice::parse("1"), Some(MenuChoice::Start));
        assert_eq!(MenuChoice::parse(" 2 "), Some(MenuChoice::Stop));
        assert_eq!(MenuChoice::parse("3"), Some(MenuChoice::Exit));
        assert_eq!(MenuChoice::parse("4"), None);
        assert_eq!(MenuChoice::parse("start"), None);
    }
}
