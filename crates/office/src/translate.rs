//! Paragraph-by-paragraph document translation.

use crate::docx::DocxDocument;
use crate::progress::ProgressReporter;
use concierge_core::config::TranslateSettings;
use concierge_core::{AppError, AppResult};
use concierge_llm::{ChatMessage, ChatRequest, LlmClient};
use std::path::{Path, PathBuf};

/// Parameters of each translation request.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslateOptions {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub system_prompt: String,
}

impl TranslateOptions {
    pub fn from_settings(settings: &TranslateSettings, model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            system_prompt: settings.system_prompt.clone(),
        }
    }
}

/// Per-paragraph notifications, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum ParagraphEvent {
    /// About to translate the paragraph at `index`
    Source { index: usize, text: String },
    Translated { index: usize, text: String },
    Failed { index: usize, error: String },
}

/// Outcome of translating a whole document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationReport {
    pub output: PathBuf,
    pub translated: usize,
    pub failed: usize,
    /// Paragraphs with only whitespace
    pub skipped: usize,
}

/// Translates text through a chat completion backend.
pub struct Translator<'a> {
    client: &'a dyn LlmClient,
    options: TranslateOptions,
}

impl<'a> Translator<'a> {
    pub fn new(client: &'a dyn LlmClient, options: TranslateOptions) -> Self {
        Self { client, options }
    }

    /// Translate one piece of text; the reply is trimmed.
    pub async fn translate_text(&self, text: &str) -> AppResult<String> {
        let request = ChatRequest::new(
            &self.options.model,
            vec![
                ChatMessage::system(&self.options.system_prompt),
                ChatMessage::user(text),
            ],
        )
        .with_max_tokens(self.options.max_tokens)
        .with_temperature(self.options.temperature);

        let response = self.client.complete(&request).await?;
        response
            .text()
            .ok_or_else(|| AppError::Llm("Translation response contained no text".to_string()))
    }

    /// Translate every non-empty paragraph of `document` in place.
    ///
    /// A failed paragraph is reported and left untouched; the rest continue.
    pub async fn translate_document(
        &self,
        document: &mut DocxDocument,
        reporter: &ProgressReporter,
        on_paragraph: &mut (dyn FnMut(&ParagraphEvent) + Send),
    ) -> TranslationReport {
        let paragraphs = document.paragraphs();
        let total = paragraphs.len() as u64;
        let mut report = TranslationReport::default();

        for (index, paragraph) in paragraphs.iter().enumerate() {
            let text = paragraph.trim();
            if text.is_empty() {
                report.skipped += 1;
                reporter.translate(index as u64 + 1, total, report.failed as u64);
                continue;
            }

            on_paragraph(&ParagraphEvent::Source {
                index,
                text: text.to_string(),
            });

            let outcome = match self.translate_text(text).await {
                Ok(translated) => document
                    .set_paragraph_text(index, &translated)
                    .map(|_| translated),
                Err(e) => Err(e),
            };

            match outcome {
                Ok(translated) => {
                    report.translated += 1;
                    on_paragraph(&ParagraphEvent::Translated {
                        index,
                        text: translated,
                    });
                }
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(paragraph = index, error = %e, "Paragraph translation failed");
                    on_paragraph(&ParagraphEvent::Failed {
                        index,
                        error: e.to_string(),
                    });
                }
            }

            reporter.translate(index as u64 + 1, total, report.failed as u64);
        }

        report
    }

    /// Translate `input` and write the result to `output`.
    pub async fn translate_file(
        &self,
        input: &Path,
        output: &Path,
        reporter: &ProgressReporter,
        on_paragraph: &mut (dyn FnMut(&ParagraphEvent) + Send),
    ) -> AppResult<TranslationReport> {
        let mut document = DocxDocument::open(input)?;
        reporter.open(&input.display().to_string(), document.paragraph_count() as u64);

        let mut report = self
            .translate_document(&mut document, reporter, on_paragraph)
            .await;

        reporter.save(&output.display().to_string());
        document.save(output)?;
        report.output = output.to_path_buf();

        tracing::info!(
            input = %input.display(),
            output = %output.display(),
            translated = report.translated,
            failed = report.failed,
            skipped = report.skipped,
            "Translation complete"
        );

        Ok(report)
    }
}

/// `output_<file name>` in `dir`.
pub fn output_path_for(input: &Path, dir: &Path) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.docx".to_string());
    dir.join(format!("output_{}", name))
}

/// First of `path`, `stem (1).ext`, `stem (2).ext`, ... that does not exist.
pub fn uniquify(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let parent = path.parent().unwrap_or_else(|| Path::new(""));

    let mut counter = 1;
    loop {
        let candidate = parent.join(format!("{} ({}){}", stem, counter, extension));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::tests::package;
    use concierge_llm::{ChatResponse, LlmUsage};
    use concierge_llm::client::ChatChoice;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    /// Replies from a fixed table; unknown text fails.
    struct TableClient {
        replies: HashMap<String, String>,
        requests: Mutex<Vec<ChatRequest>>,
    }

    impl TableClient {
        fn new(pairs: &[(&str, &str)]) -> Self {
            Self {
                replies: pairs
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl LlmClient for TableClient {
        fn provider_name(&self) -> &str {
            "table"
        }

        async fn complete(&self, request: &ChatRequest) -> AppResult<ChatResponse> {
            self.requests.lock().unwrap().push(request.clone());
            let text = request
                .messages
                .last()
                .and_then(|m| m.content.clone())
                .unwrap_or_default();
            let reply = self
                .replies
                .get(&text)
                .ok_or_else(|| AppError::Llm(format!("no reply for {}", text)))?;

            Ok(ChatResponse {
                model: request.model.clone(),
                choices: vec![ChatChoice {
                    message: ChatMessage::assistant(format!("  {}\n", reply)),
                    finish_reason: Some("stop".to_string()),
                }],
                usage: LlmUsage::default(),
            })
        }
    }

    fn options() -> TranslateOptions {
        TranslateOptions::from_settings(&TranslateSettings::default(), "ft:gpt-3.5:vocab")
    }

    const BODY: &str = concat!(
        r#"<w:p><w:r><w:t>見積書</w:t></w:r></w:p>"#,
        r#"<w:p><w:r><w:t xml:space="preserve">   </w:t></w:r></w:p>"#,
        r#"<w:tbl><w:tr><w:tc><w:p><w:r><w:t>未知</w:t></w:r></w:p></w:tc></w:tr></w:tbl>"#,
        r#"<w:p><w:r><w:t>合計</w:t></w:r></w:p>"#
    );

    #[tokio::test]
    async fn test_translate_text_request_shape() {
        let client = TableClient::new(&[("見積", "quotation")]);
        let translator = Translator::new(&client, options());

        let text = translator.translate_text("見積").await.unwrap();
        assert_eq!(text, "quotation");

        let requests = client.requests.lock().unwrap();
        let request = &requests[0];
        assert_eq!(request.model, "ft:gpt-3.5:vocab");
        assert_eq!(request.max_tokens, Some(300));
        assert_eq!(request.temperature, Some(0.7));
        assert_eq!(
            request.messages[0].content.as_deref(),
            Some("You are a translator from Japanese to English.")
        );
    }

    #[tokio::test]
    async fn test_failed_paragraph_does_not_stop_document() {
        let client = TableClient::new(&[("見積書", "Quote"), ("合計", "Total amount")]);
        let translator = Translator::new(&client, options());
        let mut document = DocxDocument::from_package(package(BODY)).unwrap();

        let mut events = Vec::new();
        let report = translator
            .translate_document(&mut document, &ProgressReporter::noop(), &mut |event: &ParagraphEvent| {
                events.push(event.clone())
            })
            .await;

        assert_eq!(report.translated, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(
            document.paragraphs(),
            vec!["Quote", "   ", "未知", "Total amount"]
        );

        assert_eq!(
            events[0],
            ParagraphEvent::Source {
                index: 0,
                text: "見積書".to_string()
            }
        );
        assert!(matches!(events[3], ParagraphEvent::Failed { index: 2, .. }));
        assert_eq!(events.len(), 6);
    }

    #[tokio::test]
    async fn test_translate_file_writes_output() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("見積.docx");
        package(BODY).save(&input).unwrap();
        let output = output_path_for(&input, temp.path());

        let client = TableClient::new(&[("見積書", "Quote"), ("未知", "Unknown"), ("合計", "Total")]);
        let translator = Translator::new(&client, options());

        let phases = Arc::new(Mutex::new(Vec::new()));
        let phases_clone = phases.clone();
        let reporter = ProgressReporter::new(Arc::new(move |event| {
            phases_clone.lock().unwrap().push(event.phase);
        }));

        let report = translator
            .translate_file(&input, &output, &reporter, &mut |_: &ParagraphEvent| {})
            .await
            .unwrap();

        assert_eq!(report.output, output);
        assert_eq!(report.translated, 3);
        let saved = DocxDocument::open(&output).unwrap();
        assert_eq!(saved.paragraph_text(2).as_deref(), Some("Unknown"));

        let original = DocxDocument::open(&input).unwrap();
        assert_eq!(original.paragraph_text(0).as_deref(), Some("見積書"));

        let phases = phases.lock().unwrap();
        assert_eq!(phases.first().map(String::as_str), Some("open"));
        assert_eq!(phases.last().map(String::as_str), Some("save"));
    }

    #[test]
    fn test_output_path_for() {
        let path = output_path_for(Path::new("/data/in/report.docx"), Path::new("."));
        assert_eq!(path, Path::new("./output_report.docx"));
    }

    #[test]
    fn test_uniquify() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("output_a.docx");
        assert_eq!(uniquify(&path), path);

        std::fs::write(&path, "x").unwrap();
        let first = uniquify(&path);
        assert_eq!(first, temp.path().join("output_a (1).docx"));

        std::fs::write(&first, "x").unwrap();
        assert_eq!(uniquify(&path), temp.path().join("output_a (2).docx"));
    }
}
