//! Init command - interactive first-run setup.

use crate::cli::{preflight, Output};
use crate::config::Settings;
use crate::model::API_KEY_ENV;
use console::style;
use std::io::{self, Write};

/// Run the init command for first-time setup.
pub fn run_init(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Periksa Setup");
    println!();
    println!("Welcome to Periksa! Let's make sure everything is configured correctly.\n");

    // Step 1: Check API key
    println!("{}", style("Step 1: Checking API configuration").bold().cyan());
    println!();

    if preflight::check_api_key().is_err() {
        Output::warning(&format!("{API_KEY_ENV} environment variable is not set."));
        println!();
        println!("  Periksa requires a Gemini API key for document analysis and chat.");
        println!(
            "  Get your API key from: {}",
            style("https://aistudio.google.com/apikey").underlined()
        );
        println!();
        println!("  Set it in your shell configuration (~/.bashrc, ~/.zshrc, etc.):");
        println!("  {}", style(format!("export {API_KEY_ENV}='...'")).green());
        println!();

        if !prompt_continue("Continue without API key?")? {
            println!();
            Output::info("Setup cancelled. Set your API key and run 'periksa init' again.");
            return Ok(());
        }
    } else {
        Output::success("Gemini API key is configured!");
    }

    println!();

    // Step 2: Check speech tools (optional)
    println!("{}", style("Step 2: Checking speech tools (optional)").bold().cyan());
    println!();

    match preflight::check_speech_output(settings) {
        Ok(()) => Output::success(&format!(
            "Speech synthesis is available ({}).",
            settings.speech.speak_command
        )),
        Err(e) => {
            Output::warning(&format!("Speech output unavailable: {}", e));
            println!(
                "    {} {}",
                style("→").dim(),
                style("Voice replies will be disabled; everything else works.").dim()
            );
        }
    }

    if preflight::check_speech_input(settings).is_err() {
        Output::info("Speech input is not configured (speech.recognize_command).");
    }

    println!();

    // Step 3: Create directories and config
    println!("{}", style("Step 3: Setting up directories").bold().cyan());
    println!();

    let data_dir = settings.data_dir();
    if !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)?;
        Output::success(&format!("Created data directory: {}", data_dir.display()));
    } else {
        Output::info(&format!("Data directory exists: {}", data_dir.display()));
    }

    let config_path = Settings::default_config_path();
    if !config_path.exists() {
        settings.save()?;
        Output::success(&format!("Created config file: {}", config_path.display()));
    } else {
        Output::info(&format!("Config file exists: {}", config_path.display()));
    }

    println!();
    Output::success("Setup complete! Try: periksa chat");

    Ok(())
}

/// Ask a yes/no question, defaulting to no.
fn prompt_continue(question: &str) -> io::Result<bool> {
    print!("{} [y/N] ", question);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;

    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
