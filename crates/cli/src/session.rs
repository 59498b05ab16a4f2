//! Terminal-side reactions: session expiry notice and warning prompts.

use std::io::{self, BufRead, Write};

use async_trait::async_trait;
use triage_client::SessionHandler;
use triage_importer::WarningConfirmation;

/// Tells the user to log in again once the backend rejects the token.
#[derive(Debug, Default, Clone, Copy)]
pub struct CliSessionHandler;

impl SessionHandler for CliSessionHandler {
    fn session_expired(&self) {
        eprintln!("Session expired. Run `triage login --token <TOKEN>` to sign in again.");
    }
}

/// Lists validation warnings and asks y/N on the terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct PromptConfirmer;

#[async_trait]
impl WarningConfirmation for PromptConfirmer {
    async fn confirm(&self, warnings: &[String]) -> bool {
        println!("Validation passed with {} warning(s):", warnings.len());
        for warning in warnings {
            println!("  ! {warning}");
        }

        let answer = tokio::task::spawn_blocking(|| -> io::Result<String> {
            print!("Continue with the upload? [y/N] ");
            io::stdout().flush()?;
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line)?;
            Ok(line)
        })
        .await;

        match answer {
            Ok(Ok(line)) => is_yes(&line),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Failed to read confirmation, treating as no");
                false
            }
            Err(e) => {
                tracing::error!(error = %e, "Confirmation prompt task failed");
                false
            }
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_explicit_yes_confirms() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(!is_yes(""));
        assert!(!is_yes("n"));
        assert!(!is_yes("sure"));
    }
}
