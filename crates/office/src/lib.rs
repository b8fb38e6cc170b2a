//! Office document handling for Concierge.
//!
//! - [`archive`]: in-memory zip packages shared by both formats
//! - [`docx`]: read and rewrite paragraph text of Word documents
//! - [`xlsx`]: read the first worksheet of a workbook
//! - [`vocabulary`]: bilingual term lists and fine-tuning training data
//! - [`translate`]: paragraph-by-paragraph document translation

pub mod archive;
pub mod docx;
pub mod progress;
pub mod translate;
pub mod vocabulary;
pub mod xlsx;
mod xml;

pub use archive::Package;
pub use docx::DocxDocument;
pub use progress::{ProgressCallback, ProgressEvent, ProgressReporter};
pub use translate::{
    output_path_for, uniquify, ParagraphEvent, TranslateOptions, TranslationReport, Translator,
};
pub use vocabulary::{build_training_jsonl, load_vocabulary, TermPair};
pub use xlsx::Sheet;
