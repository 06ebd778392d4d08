//! Doctor command - verify system requirements and configuration.

use crate::cli::{preflight, Output};
use crate::config::Settings;
use console::style;

/// Check result for a single item.
#[derive(Debug)]
struct CheckResult {
    name: String,
    status: CheckStatus,
    message: String,
    hint: Option<String>,
}

#[derive(Debug, PartialEq)]
enum CheckStatus {
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
pub fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Periksa Doctor");
    println!();
    println!("Checking system requirements and configuration...\n");

    let mut checks = Vec::new();

    // API key
    println!("{}", style("API Configuration").bold());
    let api_check = match preflight::check_api_key() {
        Ok(()) => CheckResult::ok("GEMINI_API_KEY", "configured"),
        Err(e) => CheckResult::error(
            "GEMINI_API_KEY",
            "not configured",
            &format!("{e}"),
        ),
    };
    api_check.print();
    checks.push(api_check);

    println!();

    // Speech tools
    println!("{}", style("Speech Tools").bold());
    let speak_check = match preflight::check_speech_output(settings) {
        Ok(()) => CheckResult::ok(
            &settings.speech.speak_command,
            "speech synthesis available",
        ),
        Err(e) => CheckResult::warning(
            "speech synthesis",
            "unavailable",
            &format!("{e}. Voice replies will be disabled."),
        ),
    };
    speak_check.print();
    checks.push(speak_check);

    let listen_check = match preflight::check_speech_input(settings) {
        Ok(()) => CheckResult::ok(
            &settings.speech.recognize_command,
            "speech recognition available",
        ),
        Err(e) => CheckResult::warning(
            "speech recognition",
            "unavailable",
            &format!("{e}. The 'voice' command will be disabled."),
        ),
    };
    listen_check.print();
    checks.push(listen_check);

    println!();

    // Configuration
    println!("{}", style("Configuration").bold());
    let config_path = Settings::default_config_path();
    let config_check = if config_path.exists() {
        CheckResult::ok("config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "config file",
            "not found (using defaults)",
            "Run 'periksa init' to create it.",
        )
    };
    config_check.print();
    checks.push(config_check);

    println!();

    // Summary
    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Periksa.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Periksa is ready to use.");
    }

    Ok(())
}
