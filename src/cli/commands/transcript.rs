//! Transcript command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::transcript::{TranscriptFetcher, VideoId};
use anyhow::Result;

/// Fetch a transcript and print or save its normalized text.
pub async fn run_transcript(url: &str, output: Option<String>, settings: Settings) -> Result<()> {
    let video_id = VideoId::parse(url)?;
    let fetcher = TranscriptFetcher::from_settings(&settings.transcript)?;

    let spinner = Output::spinner("Fetching transcript...");
    let fetched = fetcher.fetch(&video_id).await;
    spinner.finish_and_clear();

    let transcript = match fetched {
        Ok(transcript) => transcript,
        Err(e) => {
            Output::load_failure(&e);
            return Err(e.into());
        }
    };

    match output {
        Some(path) => {
            let path = Settings::expand_path(&path);
            std::fs::write(&path, &transcript.text)?;
            Output::success(&format!(
                "Saved transcript for {} to {} ({} characters)",
                video_id,
                path.display(),
                transcript.char_count()
            ));
        }
        None => println!("{}", transcript.text),
    }

    Ok(())
}
