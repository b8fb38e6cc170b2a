//! Bilingual vocabulary loading and fine-tuning training data.

use crate::xlsx::Sheet;
use concierge_core::{AppError, AppResult};
use serde_json::json;
use std::collections::HashMap;
use std::path::Path;

/// One source/target term pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermPair {
    pub source: String,
    pub target: String,
}

/// Load term pairs from the first worksheet of `path`.
///
/// The header row names the columns. Rows with an empty source or target
/// are dropped. A repeated source term keeps its first position and takes
/// the later target.
pub fn load_vocabulary(
    path: &Path,
    source_column: &str,
    target_column: &str,
) -> AppResult<Vec<TermPair>> {
    let sheet = Sheet::open(path)?;
    let pairs = vocabulary_from_sheet(&sheet, source_column, target_column)?;

    tracing::info!(
        path = %path.display(),
        pairs = pairs.len(),
        "Loaded vocabulary"
    );

    Ok(pairs)
}

pub fn vocabulary_from_sheet(
    sheet: &Sheet,
    source_column: &str,
    target_column: &str,
) -> AppResult<Vec<TermPair>> {
    let header = sheet
        .rows
        .first()
        .ok_or_else(|| AppError::Document("Vocabulary sheet is empty".to_string()))?;

    let find = |name: &str| {
        (0..header.len())
            .find(|&i| sheet.cell(0, i) == Some(name))
            .ok_or_else(|| {
                AppError::Document(format!("Vocabulary sheet has no '{}' column", name))
            })
    };
    let source_index = find(source_column)?;
    let target_index = find(target_column)?;

    let mut pairs: Vec<TermPair> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for row in 1..sheet.rows.len() {
        let (Some(source), Some(target)) =
            (sheet.cell(row, source_index), sheet.cell(row, target_index))
        else {
            continue;
        };

        match positions.get(source) {
            Some(&position) => pairs[position].target = target.to_string(),
            None => {
                positions.insert(source.to_string(), pairs.len());
                pairs.push(TermPair {
                    source: source.to_string(),
                    target: target.to_string(),
                });
            }
        }
    }

    Ok(pairs)
}

/// Chat-format JSONL: one user/assistant exchange per pair.
pub fn build_training_jsonl(pairs: &[TermPair]) -> AppResult<String> {
    let mut out = String::new();
    for pair in pairs {
        let line = json!({
            "messages": [
                { "role": "user", "content": pair.source },
                { "role": "assistant", "content": pair.target },
            ]
        });
        out.push_str(&serde_json::to_string(&line)?);
        out.push('\n');
    }
    Ok(out)
}
