//! Read-only access to the first worksheet of an `.xlsx` workbook.

use crate::archive::Package;
use crate::xml::decode_entities;
use concierge_core::{AppError, AppResult};
use regex::Regex;
use std::path::Path;

const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";

/// Cell values of one sheet; `None` marks an empty cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    pub rows: Vec<Vec<Option<String>>>,
}

impl Sheet {
    pub fn open(path: &Path) -> AppResult<Self> {
        Self::from_package(&Package::open(path)?)
    }

    /// Parse the first worksheet of a workbook package.
    pub fn from_package(package: &Package) -> AppResult<Self> {
        let sheet_name = first_sheet_name(package).ok_or_else(|| {
            AppError::Document("Workbook has no worksheets; not an .xlsx file".to_string())
        })?;
        let sheet_xml = package.read_text(&sheet_name)?.unwrap_or_default();

        let shared = match package.read_text(SHARED_STRINGS_PART)? {
            Some(xml) => parse_shared_strings(&xml)?,
            None => Vec::new(),
        };

        parse_sheet(&sheet_xml, &shared)
    }

    /// Cell value at `row`/`column`, trimmed; empty cells are `None`.
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)?
            .get(column)?
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

/// `xl/worksheets/sheet1.xml` when present, else the lowest-numbered sheet.
fn first_sheet_name(package: &Package) -> Option<String> {
    let number = |name: &str| -> Option<u32> {
        name.strip_prefix("xl/worksheets/sheet")?
            .strip_suffix(".xml")?
            .parse()
            .ok()
    };

    package
        .entry_names()
        .filter_map(|name| number(name).map(|n| (n, name.to_string())))
        .min_by_key(|(n, _)| *n)
        .map(|(_, name)| name)
}

fn text_pattern() -> AppResult<Regex> {
    Regex::new(r"(?s)<t(?:\s[^>]*)?>(.*?)</t>")
        .map_err(|e| AppError::Document(format!("Invalid text pattern: {}", e)))
}

fn parse_shared_strings(xml: &str) -> AppResult<Vec<String>> {
    let item = Regex::new(r"(?s)<si>(.*?)</si>")
        .map_err(|e| AppError::Document(format!("Invalid shared string pattern: {}", e)))?;
    let text = text_pattern()?;

    Ok(item
        .captures_iter(xml)
        .map(|caps| {
            text.captures_iter(&caps[1])
                .map(|t| decode_entities(&t[1]))
                .collect::<String>()
        })
        .collect())
}

/// Columns in a worksheet, `A` through `XFD`.
pub const MAX_COLUMNS: usize = 16_384;

/// Zero-based column index from a cell reference such as `AB12`.
///
/// `None` when there are no letters or the column lies beyond `XFD`.
pub fn column_index(reference: &str) -> Option<usize> {
    let letters: String = reference
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    if letters.is_empty() {
        return None;
    }

    let mut index = 0usize;
    for b in letters.to_ascii_uppercase().bytes() {
        index = index * 26 + (b - b'A' + 1) as usize;
        if index > MAX_COLUMNS {
            return None;
        }
    }
    Some(index - 1)
}

fn parse_sheet(xml: &str, shared: &[String]) -> AppResult<Sheet> {
    let pattern = |p: &str| {
        Regex::new(p).map_err(|e| AppError::Document(format!("Invalid sheet pattern: {}", e)))
    };
    let row_pattern = pattern(r"(?s)<row\b[^>]*?(?:/>|>(.*?)</row>)")?;
    let cell_pattern = pattern(r"(?s)<c\b([^>]*?)(?:/>|>(.*?)</c>)")?;
    let ref_pattern = pattern(r#"\br="([A-Za-z]+)\d*""#)?;
    let type_pattern = pattern(r#"\bt="([^"]*)""#)?;
    let value_pattern = pattern(r"(?s)<v>(.*?)</v>")?;
    let text = text_pattern()?;

    let mut rows = Vec::new();
    for row in row_pattern.captures_iter(xml) {
        let mut cells: Vec<Option<String>> = Vec::new();
        let body = row.get(1).map(|m| m.as_str()).unwrap_or_default();

        for cell in cell_pattern.captures_iter(body) {
            let attrs = &cell[1];
            let content = cell.get(2).map(|m| m.as_str()).unwrap_or_default();

            let column = match ref_pattern.captures(attrs) {
                Some(r) => column_index(&r[1]).ok_or_else(|| {
                    AppError::Document(format!(
                        "Cell reference {} is beyond column XFD",
                        &r[1]
                    ))
                })?,
                None => cells.len(),
            };
            if column >= MAX_COLUMNS {
                return Err(AppError::Document(
                    "Row has more cells than a worksheet allows".to_string(),
                ));
            }
            let kind = type_pattern
                .captures(attrs)
                .map(|t| t[1].to_string())
                .unwrap_or_default();

            let value = match kind.as_str() {
                "s" => value_pattern
                    .captures(content)
                    .and_then(|v| v[1].trim().parse::<usize>().ok())
                    .and_then(|i| shared.get(i).cloned()),
                "inlineStr" => Some(
                    text.captures_iter(content)
                        .map(|t| decode_entities(&t[1]))
                        .collect(),
                ),
                _ => value_pattern
                    .captures(content)
                    .map(|v| decode_entities(&v[1])),
            };

            if cells.len() <= column {
                cells.resize(column + 1, None);
            }
            cells[column] = value;
        }

        rows.push(cells);
    }

    Ok(Sheet { rows })
}
