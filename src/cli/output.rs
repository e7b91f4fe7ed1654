//! CLI output formatting utilities.

use crate::rag::{ConversationTurn, SourceChunk};
use crate::session::TROUBLESHOOTING_TIPS;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Characters of each source chunk shown to the user.
pub const SOURCE_PREVIEW_CHARS: usize = 300;

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a list item.
    pub fn list_item(msg: &str) {
        println!("  {} {}", style("*").cyan(), msg);
    }

    /// Print a failed load with troubleshooting tips.
    pub fn load_failure(err: &dyn std::fmt::Display) {
        Self::error(&format!("❌ Failed to load transcript: {}", err));
        eprintln!("\n{}", style("Troubleshooting tips:").bold());
        for tip in TROUBLESHOOTING_TIPS {
            eprintln!("  {} {}", style("-").yellow(), tip);
        }
    }

    /// Print an answer.
    pub fn answer(answer: &str) {
        println!("\n{}", style("🧠 Answer:").bold());
        println!("{}\n", answer);
    }

    /// Print source previews.
    pub fn sources(sources: &[SourceChunk]) {
        if sources.is_empty() {
            return;
        }
        println!("{}", style("📖 Sources").bold());
        for (i, source) in sources.iter().enumerate() {
            println!(
                "\n  {} {}",
                style(format!("Source {}:", i + 1)).cyan(),
                style(format!("(chunk {}, score {:.2})", source.chunk_order, source.score)).dim()
            );
            println!("  {}", source.preview(SOURCE_PREVIEW_CHARS).replace('\n', " "));
        }
        println!();
    }

    /// Print prior turns, most recent first.
    pub fn history<'a>(turns: impl ExactSizeIterator<Item = &'a ConversationTurn>) {
        let total = turns.len();
        if total == 0 {
            Self::info("No questions asked yet.");
            return;
        }
        Self::header("📜 Chat History");
        for (i, turn) in turns.enumerate() {
            println!(
                "\n{} {}",
                style(format!("Q{}:", total - i)).cyan().bold(),
                turn.question
            );
            println!("{} {}", style("A:").green().bold(), turn.answer);
        }
        println!();
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}
