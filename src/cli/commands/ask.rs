//! Ask command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::session::{SessionBuilder, SessionContext};
use crate::transcript::TranscriptFetcher;
use anyhow::Result;

/// Load a video and answer one question about it.
pub async fn run_ask(url: &str, question: &str, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&e.to_string());
        Output::info("Run 'tubeqa doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let fetcher = TranscriptFetcher::from_settings(&settings.transcript)?;
    let builder = SessionBuilder::new(&settings)?;
    let mut session = SessionContext::new();

    let spinner = Output::spinner("Fetching transcript...");
    let loaded = session.load(url, &fetcher, &builder).await;
    spinner.finish_and_clear();

    if let Err(e) = loaded {
        Output::load_failure(&e);
        return Err(e.into());
    }

    let spinner = Output::spinner("🤔 Thinking...");
    let answered = session.ask(question).await;
    spinner.finish_and_clear();

    match answered {
        Ok(turn) => {
            Output::answer(&turn.answer);
            Output::sources(&turn.sources);
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("❌ Error processing question: {}", e));
            Err(e.into())
        }
    }
}
