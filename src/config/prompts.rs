//! Prompt templates and canned session texts for Periksa.
//!
//! The assistant speaks formal Indonesian; prompts can be customized by
//! pointing `prompts.custom_file` at a TOML file overriding any field.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    /// Shared system instruction fixing persona, tone, and the mandatory
    /// response structure.
    pub persona: PersonaPrompt,
    /// Instruction sent alongside an uploaded document.
    pub analysis: AnalysisPrompt,
    /// Fixed user-facing session texts.
    pub messages: SessionMessages,
}

/// The system instruction for every model request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonaPrompt {
    pub system: String,
}

impl Default for PersonaPrompt {
    fn default() -> Self {
        Self {
            system: r#"Anda adalah "AI Audit Piutang", asisten auditor profesional dengan keahlian mendalam dalam auditing, akuntansi keuangan, dan standar audit (ISA, SA, PSAK terkait piutang).

Tujuan Anda: Membantu auditor mengaudit piutang usaha secara otomatis, terstruktur, dan profesional.

Gaya Komunikasi:
- Bahasa Indonesia baku, formal, dan akademik (seperti laporan kertas kerja audit).
- Objektif, skeptis profesional, dan berbasis bukti.
- Jika pengguna bertanya secara lisan (speech-to-text) atau dalam mode percakapan chat, berikan jawaban yang **naratif, mengalir, dan nyaman didengar (ear-friendly)**. Hindari penggunaan simbol markdown yang berlebihan jika tidak perlu, namun tetap pertahankan struktur logis.
- Bertindaklah seolah-olah Anda sedang menjelaskan temuan secara lisan di depan klien atau partner audit.

Struktur Jawaban Wajib (untuk analisis dokumen):
1. Ringkasan Temuan (Identifikasi dokumen dan poin kunci).
2. Analisis Audit Piutang (Kewajaran saldo, aging, anomali).
3. Risiko Audit (Risiko salah saji material, fraud, piutang tak tertagih).
4. Prosedur Audit yang Disarankan (Vouching, tracing, konfirmasi, dll).
5. Kesimpulan Sementara Auditor.

Jika input berupa pertanyaan chat:
- Jawab langsung dengan penjelasan runut.
- Hindari jawaban "ya/tidak" yang terlalu singkat. Berikan konteks dan alasan auditnya.
- Gunakan terminologi audit yang tepat."#
                .to_string(),
        }
    }
}

/// The analysis instruction attached to an uploaded document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisPrompt {
    pub instruction: String,
    /// Reminder appended to chat turns while a document is active.
    /// `{{name}}` is replaced with the document name.
    pub document_reminder: String,
}

impl Default for AnalysisPrompt {
    fn default() -> Self {
        Self {
            instruction: r#"Tolong analisis dokumen audit piutang yang saya unggah ini.
Lakukan prosedur berikut:
1. Identifikasi jenis dokumen (Buku Besar, Aging Schedule, Invoice, dll).
2. Lakukan analisis vertikal/horizontal atau aging analysis jika data tersedia.
3. Identifikasi "red flags" atau risiko fraud/salah saji.
4. Berikan rekomendasi prosedur audit substantif maupun test of controls yang relevan.

Sajikan output sesuai format standar yang telah ditetapkan dalam instruksi sistem."#
                .to_string(),
            document_reminder: "[System Note: Jawablah dengan mempertimbangkan konteks dokumen {{name}} yang sedang aktif di workspace]".to_string(),
        }
    }
}

/// Fixed Indonesian texts appended to the transcript by the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionMessages {
    /// Greeting seeded into a fresh session.
    pub greeting: String,
    /// Greeting seeded after a reset.
    pub reset_greeting: String,
    /// User message recording an upload. `{{name}}` is the document name.
    pub upload: String,
    /// Assistant message announcing a completed analysis. `{{name}}` is the
    /// document name.
    pub analysis_completed: String,
    /// Stored as the analysis result when the model call fails.
    pub analysis_fallback: String,
    /// Assistant apology appended when analysis fails.
    pub analysis_apology: String,
    /// Assistant apology appended when a chat turn fails.
    pub chat_apology: String,
}

impl Default for SessionMessages {
    fn default() -> Self {
        Self {
            greeting: "Halo, saya adalah **AI Audit Piutang**. Silakan unggah dokumen piutang (**PDF, Gambar, atau CSV**) untuk saya analisis, atau tanyakan prosedur audit kepada saya.".to_string(),
            reset_greeting: "Sesi telah direset. Silakan unggah dokumen baru.".to_string(),
            upload: "Mengunggah dokumen: {{name}}".to_string(),
            analysis_completed: "Analisis untuk **{{name}}** telah selesai. Anda dapat melihat detailnya di panel analisis. Apakah ada bagian spesifik yang ingin kita diskusikan?".to_string(),
            analysis_fallback: "Gagal menganalisis dokumen. Pastikan format file didukung (PDF/Gambar/CSV) dan jelas.".to_string(),
            analysis_apology: "Maaf, terjadi kesalahan saat menganalisis dokumen tersebut. Mohon coba lagi.".to_string(),
            chat_apology: "Maaf, saya sedang mengalami gangguan koneksi. Silakan coba lagi.".to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts, applying overrides from a custom TOML file if given.
    pub fn load(custom_file: Option<&str>) -> crate::error::Result<Self> {
        match custom_file {
            Some(path) => {
                let expanded = crate::config::Settings::expand_path(path);
                Self::load_file(&expanded)
            }
            None => Ok(Self::default()),
        }
    }

    fn load_file(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let prompts: Prompts = toml::from_str(&content)?;
        Ok(prompts)
    }

    /// Render a template, replacing `{{name}}` with the given value.
    pub fn render_name(template: &str, name: &str) -> String {
        template.replace("{{name}}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_indonesian() {
        let prompts = Prompts::default();
        assert!(prompts.persona.system.contains("AI Audit Piutang"));
        assert!(prompts.messages.greeting.contains("unggah dokumen"));
    }

    #[test]
    fn render_name_substitutes_placeholder() {
        let rendered = Prompts::render_name("Mengunggah dokumen: {{name}}", "aging.csv");
        assert_eq!(rendered, "Mengunggah dokumen: aging.csv");
    }

    #[test]
    fn template_fields_carry_placeholder() {
        let messages = SessionMessages::default();
        assert!(messages.upload.contains("{{name}}"));
        assert!(messages.analysis_completed.contains("{{name}}"));
    }
}
