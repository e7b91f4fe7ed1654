//! Interactive question-answering session in the terminal.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::session::{SessionBuilder, SessionContext};
use crate::transcript::TranscriptFetcher;
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};

const HELP: [(&str, &str); 7] = [
    ("/load <url>", "Fetch a video's transcript and start a new session"),
    ("/clear", "Clear the conversation history"),
    ("/history", "Show previous questions, most recent first"),
    ("/sources", "Show the sources of the last answer"),
    ("/status", "Show what is loaded"),
    ("/help", "Show this help"),
    ("/quit", "Exit"),
];

/// A line typed at the prompt.
#[derive(Debug, PartialEq, Eq)]
enum ReplCommand<'a> {
    Load(&'a str),
    Clear,
    History,
    Sources,
    Status,
    Help,
    Quit,
    Unknown(&'a str),
    Question(&'a str),
}

fn parse_line(line: &str) -> Option<ReplCommand<'_>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    if !line.starts_with('/') {
        return Some(ReplCommand::Question(line));
    }

    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };
    Some(match command {
        "/load" => ReplCommand::Load(rest),
        "/clear" => ReplCommand::Clear,
        "/history" => ReplCommand::History,
        "/sources" => ReplCommand::Sources,
        "/status" => ReplCommand::Status,
        "/help" => ReplCommand::Help,
        "/quit" | "/exit" => ReplCommand::Quit,
        other => ReplCommand::Unknown(other),
    })
}

/// Run the interactive chat command.
pub async fn run_chat(url: Option<String>, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&e.to_string());
        Output::info("Run 'tubeqa doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let fetcher = TranscriptFetcher::from_settings(&settings.transcript)?;
    let builder = SessionBuilder::new(&settings)?;
    let mut session = SessionContext::new();

    println!("\n{}", style("🎥 YouTube Q&A Assistant").bold().cyan());
    println!(
        "{}\n",
        style("Load a video with /load <url>, then ask questions. /help lists commands.").dim()
    );

    if let Some(url) = url {
        load(&mut session, &url, &fetcher, &builder).await;
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }

        let Some(command) = parse_line(&input) else {
            continue;
        };

        match command {
            ReplCommand::Quit => {
                Output::info("Goodbye!");
                break;
            }
            ReplCommand::Help => {
                for (command, description) in HELP {
                    Output::kv(command, description);
                }
            }
            ReplCommand::Load("") => Output::warning("⚠️ Please enter a valid YouTube URL."),
            ReplCommand::Load(url) => load(&mut session, url, &fetcher, &builder).await,
            ReplCommand::Clear => {
                session.clear_history();
                Output::info("Conversation history cleared.");
            }
            ReplCommand::History => Output::history(session.history()),
            ReplCommand::Sources => match session.last_turn() {
                Some(turn) if !turn.sources.is_empty() => Output::sources(&turn.sources),
                _ => Output::info("No sources to show yet."),
            },
            ReplCommand::Status => {
                let status = session.status();
                Output::info(status.message());
                if let Some(video_id) = &status.video_id {
                    Output::kv("Video", video_id.as_str());
                    Output::kv("Transcript length", &format!("{} characters", status.transcript_chars));
                    Output::kv("Chunks", &status.chunk_count.to_string());
                    Output::kv("Questions asked", &status.turns.to_string());
                }
            }
            ReplCommand::Unknown(command) => {
                Output::warning(&format!("Unknown command {}. Type /help for commands.", command))
            }
            ReplCommand::Question(question) => {
                if !session.is_loaded() {
                    Output::info("👈 Load a video with /load <url> to get started.");
                    continue;
                }

                let spinner = Output::spinner("🤔 Thinking...");
                let result = session.ask(question).await;
                spinner.finish_and_clear();

                match result {
                    Ok(turn) => {
                        Output::answer(&turn.answer);
                        Output::sources(&turn.sources);
                    }
                    Err(e) => Output::error(&format!("❌ Error processing question: {}", e)),
                }
            }
        }
    }

    Ok(())
}

async fn load(
    session: &mut SessionContext,
    url: &str,
    fetcher: &TranscriptFetcher,
    builder: &SessionBuilder,
) {
    let preview: String = url.chars().take(50).collect();
    Output::info(&format!("🔍 Processing: {}...", preview));

    let spinner = Output::spinner("Fetching transcript...");
    let result = session.load(url, fetcher, builder).await;
    spinner.finish_and_clear();

    match result {
        Ok(summary) => {
            Output::success("✅ Transcript loaded successfully!");
            Output::info(&format!(
                "📝 Transcript length: {} characters ({} chunks)",
                summary.transcript_chars, summary.chunk_count
            ));
            if summary.skipped_segments > 0 {
                Output::warning(&format!(
                    "{} of {} segments had no text and were skipped",
                    summary.skipped_segments, summary.segment_count
                ));
            }
        }
        Err(e) => Output::load_failure(&e),
    }
}
