//! Interactive audit workspace command.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{Prompts, Settings};
use crate::model::GeminiClient;
use crate::orchestrator::{AnalysisOutcome, ChatOutcome, InputMode, Orchestrator};
use crate::speech::{
    CommandRecognizer, CommandSynthesizer, NullSynthesizer, SpeechSynthesizer,
};
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;

/// Run the interactive chat command.
pub async fn run_chat(document: Option<String>, settings: Settings) -> Result<()> {
    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Chat) {
        Output::error(&format!("{}", e));
        Output::info("Run 'periksa doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let prompts = Prompts::load(settings.prompts.custom_file.as_deref())?;
    let model = Arc::new(GeminiClient::new(&settings, prompts.clone())?);

    let synthesizer: Arc<dyn SpeechSynthesizer> = if settings.speech.speak_command.is_empty() {
        Arc::new(NullSynthesizer)
    } else {
        Arc::new(CommandSynthesizer::from_settings(&settings.speech))
    };
    let recognizer = CommandRecognizer::from_settings(&settings.speech);

    let orchestrator = Orchestrator::new(model, synthesizer, prompts);

    println!("\n{}", style("Periksa Audit Workspace").bold().cyan());
    println!(
        "{}\n",
        style("Type your questions, or 'help' for commands. 'exit' quits.").dim()
    );

    // The fresh session opens with the assistant greeting.
    if let Some(greeting) = orchestrator.transcript().first() {
        Output::assistant(&greeting.content);
    }

    // Upload a document straight away if one was passed on the command line.
    if let Some(path) = document {
        upload(&orchestrator, &path).await;
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break; // EOF
        }

        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            orchestrator.stop_speaking().await;
            Output::info("Goodbye!");
            break;
        }

        if input.eq_ignore_ascii_case("help") {
            print_help();
            continue;
        }

        if input.eq_ignore_ascii_case("status") {
            print_status(&orchestrator);
            continue;
        }

        if let Some(path) = input.strip_prefix("upload ") {
            upload(&orchestrator, path.trim()).await;
            continue;
        }

        if input.eq_ignore_ascii_case("result") {
            match orchestrator.analysis_result() {
                Some(report) => println!("\n{}\n", report),
                None => Output::info("No analysis yet. Upload a document first."),
            }
            continue;
        }

        if input.eq_ignore_ascii_case("voice") {
            voice_turn(&orchestrator, &recognizer).await;
            continue;
        }

        if input.eq_ignore_ascii_case("speak") {
            if let Err(e) = orchestrator.speak_latest().await {
                Output::error(&format!("{}", e));
            }
            continue;
        }

        if input.eq_ignore_ascii_case("stop") {
            orchestrator.stop_speaking().await;
            continue;
        }

        if input.eq_ignore_ascii_case("change") {
            orchestrator.clear_document();
            Output::info("Active document cleared. Upload a new one when ready.");
            continue;
        }

        if input.eq_ignore_ascii_case("reset") {
            if confirm("Hapus semua data sesi ini?")? {
                orchestrator.reset().await;
                if let Some(greeting) = orchestrator.transcript().first() {
                    Output::assistant(&greeting.content);
                }
            }
            continue;
        }

        send(&orchestrator, input, InputMode::Text).await;
    }

    Ok(())
}

/// Upload and analyze a document, reporting validation errors inline.
async fn upload(orchestrator: &Orchestrator, path: &str) {
    let spinner = Output::spinner("Menganalisis dokumen...");

    match orchestrator.upload_file(Path::new(path)).await {
        Ok(AnalysisOutcome::Completed) => {
            spinner.finish_and_clear();
            if let Some(announcement) = orchestrator.transcript().last() {
                Output::assistant(&announcement.content);
            }
            Output::info("Type 'result' to read the full analysis.");
        }
        Ok(AnalysisOutcome::Failed) => {
            spinner.finish_and_clear();
            if let Some(apology) = orchestrator.transcript().last() {
                Output::assistant(&apology.content);
            }
        }
        Ok(AnalysisOutcome::Discarded) => {
            spinner.finish_and_clear();
        }
        Err(e) => {
            // Encoder rejections: the specific reason, before any model call.
            spinner.finish_and_clear();
            Output::error(&format!("{}", e));
        }
    }
}

/// Send one chat turn and print the reply.
async fn send(orchestrator: &Orchestrator, text: &str, mode: InputMode) {
    let spinner = Output::spinner("...");

    let outcome = orchestrator.send_message(text, mode).await;
    spinner.finish_and_clear();

    if let ChatOutcome::Replied(reply) = outcome {
        Output::assistant(&reply);
    }
}

/// One voice round-trip through the recognizer.
async fn voice_turn(orchestrator: &Orchestrator, recognizer: &CommandRecognizer) {
    Output::info("Listening... speak now.");

    match orchestrator.voice_turn(recognizer).await {
        Ok(Some((utterance, outcome))) => {
            println!("{} {}", style("You (voice):").green().bold(), utterance);
            if let ChatOutcome::Replied(reply) = outcome {
                Output::assistant(&reply);
            }
        }
        Ok(None) => {
            Output::info("Nothing recognized.");
        }
        Err(e) => {
            Output::error(&format!("{}", e));
        }
    }
}

fn print_status(orchestrator: &Orchestrator) {
    Output::header("Session");
    match orchestrator.active_document() {
        Some(doc) => Output::kv(
            "Document",
            &format!("{} ({}, {} bytes)", doc.name, doc.mime_type, doc.size),
        ),
        None => Output::kv("Document", "none"),
    }
    Output::kv("Analysis", orchestrator.status().label());
    Output::kv(
        "Transcript",
        &format!("{} messages", orchestrator.transcript().len()),
    );
    println!();
}

fn print_help() {
    Output::header("Commands");
    Output::list_item("upload <path>  - analyze a PDF, image, or CSV document");
    Output::list_item("result         - print the latest analysis report");
    Output::list_item("voice          - ask by voice; the reply is spoken");
    Output::list_item("speak          - read the latest reply aloud");
    Output::list_item("stop           - stop speaking");
    Output::list_item("change         - clear the active document");
    Output::list_item("status         - show session state");
    Output::list_item("reset          - clear the session (asks first)");
    Output::list_item("exit           - quit");
    println!();
}

/// Ask a yes/no question, defaulting to no.
fn confirm(question: &str) -> io::Result<bool> {
    print!("{} [y/N] ", question);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;

    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
