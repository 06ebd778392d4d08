//! Analyze command - one-shot document analysis.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{Prompts, Settings};
use crate::model::GeminiClient;
use crate::orchestrator::{AnalysisOutcome, Orchestrator};
use crate::speech::{CommandSynthesizer, NullSynthesizer, SpeechSynthesizer};
use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

/// Run the analyze command.
pub async fn run_analyze(file: &str, speak: bool, settings: Settings) -> Result<()> {
    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Analyze) {
        Output::error(&format!("{}", e));
        Output::info("Run 'periksa doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let prompts = Prompts::load(settings.prompts.custom_file.as_deref())?;
    let model = Arc::new(GeminiClient::new(&settings, prompts.clone())?);

    let synthesizer: Arc<dyn SpeechSynthesizer> = if speak {
        Arc::new(CommandSynthesizer::from_settings(&settings.speech))
    } else {
        Arc::new(NullSynthesizer)
    };

    let orchestrator = Orchestrator::new(model, synthesizer.clone(), prompts);

    let spinner = Output::spinner("Menganalisis dokumen...");

    match orchestrator.upload_file(Path::new(file)).await {
        Ok(AnalysisOutcome::Completed) => {
            spinner.finish_and_clear();

            let report = orchestrator.analysis_result().unwrap_or_default();
            println!("\n{}\n", report);

            if speak {
                if let Err(e) = synthesizer.speak(&report).await {
                    Output::warning(&format!("Could not speak the analysis: {}", e));
                }
            }

            Ok(())
        }
        Ok(AnalysisOutcome::Failed) => {
            spinner.finish_and_clear();
            let fallback = orchestrator.analysis_result().unwrap_or_default();
            Output::error(&fallback);
            Err(anyhow::anyhow!("analysis failed"))
        }
        Ok(AnalysisOutcome::Discarded) => {
            // One-shot sessions are never reset mid-flight.
            spinner.finish_and_clear();
            Ok(())
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("{}", e));
            Err(e.into())
        }
    }
}
