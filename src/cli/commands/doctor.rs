//! Doctor command - verify credentials and configuration.

use crate::cli::Output;
use crate::config::{LlmSettings, Settings};
use console::style;
use std::path::Path;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings, config_path: &Path) -> anyhow::Result<()> {
    Output::header("tubeqa Doctor");
    println!();
    println!("Checking credentials and configuration...\n");

    let mut checks = Vec::new();

    println!("{}", style("API Configuration").bold());
    for check in [check_api_key(&settings.llm), check_env_file(Path::new(".env"))] {
        check.print();
        checks.push(check);
    }
    Output::kv("Endpoint", &settings.llm.base_url);
    Output::kv("Model", &settings.llm.model);

    println!();

    println!("{}", style("Directories").bold());
    for check in check_directories(settings) {
        check.print();
        checks.push(check);
    }

    println!();

    println!("{}", style("Configuration").bold());
    let config_check = check_config_file(config_path);
    config_check.print();
    checks.push(config_check);

    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using tubeqa.",
            errors
        ));
        anyhow::bail!("{} doctor check(s) failed", errors);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! tubeqa is ready to use.");
    }

    Ok(())
}

/// Check that the language-model credential resolves.
fn check_api_key(llm: &LlmSettings) -> CheckResult {
    let name = llm.api_key_env.as_str();
    let hint = format!("Add {}=... to a .env file or export it in your shell", name);
    match llm.api_key() {
        Ok(key) => CheckResult::ok(name, &format!("configured ({})", mask_key(&key))),
        Err(e) => CheckResult::error(name, &e.to_string(), &hint),
    }
}

/// Show only the ends of a secret.
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 12 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

fn check_env_file(path: &Path) -> CheckResult {
    if path.exists() {
        CheckResult::ok(".env file", &format!("{}", path.display()))
    } else {
        CheckResult::warning(
            ".env file",
            "not found in the current directory",
            "Optional; the credential can also come from the environment or config",
        )
    }
}

/// Check data and model cache directories.
fn check_directories(settings: &Settings) -> Vec<CheckResult> {
    let mut results = Vec::new();

    let data_dir = settings.data_dir();
    if data_dir.exists() {
        results.push(CheckResult::ok(
            "Data directory",
            &format!("{}", data_dir.display()),
        ));
    } else {
        results.push(CheckResult::warning(
            "Data directory",
            &format!("{} (will be created)", data_dir.display()),
            "Directory will be created on first use",
        ));
    }

    let cache_dir = settings.model_cache_dir();
    let cached = std::fs::read_dir(&cache_dir)
        .map(|entries| entries.count())
        .unwrap_or(0);
    if cached > 0 {
        results.push(CheckResult::ok(
            "Embedding model cache",
            &format!("{} ({} entries)", cache_dir.display(), cached),
        ));
    } else {
        results.push(CheckResult::warning(
            "Embedding model cache",
            &format!("{} (empty)", cache_dir.display()),
            &format!("{} will be downloaded on first load", settings.embedding.model),
        ));
    }

    results
}

/// Check if the config file exists.
fn check_config_file(config_path: &Path) -> CheckResult {
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            &format!("Create {} to override settings", config_path.display()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_result_ok() {
        let result = CheckResult::ok("test", "passed");
        assert_eq!(result.status, CheckStatus::Ok);
        assert!(result.hint.is_none());
    }

    #[test]
    fn test_check_result_error() {
        let result = CheckResult::error("test", "failed", "fix it");
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.hint, Some("fix it".to_string()));
    }

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key("short"), "*****");
        assert_eq!(mask_key("gsk_abcdefghijklmnop1234"), "gsk_...1234");
    }

    #[test]
    fn test_missing_key_is_an_error() {
        let llm = LlmSettings {
            api_key_env: "TUBEQA_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..LlmSettings::default()
        };
        let result = check_api_key(&llm);
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(
            result.message,
            "TUBEQA_TEST_KEY_THAT_IS_NEVER_SET not found in environment variables."
        );
    }

    #[test]
    fn test_missing_config_file_is_a_warning() {
        let dir = tempfile::tempdir().unwrap();
        let result = check_config_file(&dir.path().join("config.toml"));
        assert_eq!(result.status, CheckStatus::Warning);
    }
}
