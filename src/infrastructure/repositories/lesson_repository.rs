use crate::domain::lesson::{group_rows, parse_repeat_count, Group, Row, RowKind};
use crate::error::{AppError, AppResult};
use std::collections::HashMap;
use std::path::Path;

pub const GROUP_COLUMN: &str = "File_Group";
pub const TYPE_COLUMN: &str = "Type";
pub const SOURCE_COLUMN: &str = "NL_Sentence";
pub const TRANSLATION_COLUMN: &str = "EN_Sentence";
pub const REPETITIONS_COLUMN: &str = "Repetitions";

/// Loads lesson tables (CSV, or TSV by extension) into ordered groups
pub struct LessonRepository;

impl LessonRepository {
    pub fn load(path: &Path) -> AppResult<Vec<Group>> {
        if !path.is_file() {
            return Err(AppError::Input(format!(
                "cannot find the input file: {}",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::Input(format!("could not read {}: {e}", path.display()))
        })?;

        let groups = Self::parse(&content, Self::delimiter_for(path))?;
        tracing::info!(
            path = %path.display(),
            groups = groups.len(),
            rows = groups.iter().map(|g| g.rows.len()).sum::<usize>(),
            "Lesson table loaded"
        );
        Ok(groups)
    }

    pub fn delimiter_for(path: &Path) -> u8 {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("tsv") => b'\t',
            _ => b',',
        }
    }

    pub fn parse(content: &str, delimiter: u8) -> AppResult<Vec<Group>> {
        let without_comments: String = content
            .lines()
            .filter(|line| !line.trim_start().starts_with('#'))
            .map(|line| format!("{line}\n"))
            .collect();

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_reader(without_comments.as_bytes());

        let columns: HashMap<String, usize> = reader
            .headers()
            .map_err(|e| AppError::Input(format!("could not read table header: {e}")))?
            .iter()
            .enumerate()
            .map(|(i, name)| (name.trim().to_string(), i))
            .collect();

        if !columns.contains_key(GROUP_COLUMN) {
            return Err(AppError::Input(format!(
                "table has no '{GROUP_COLUMN}' column"
            )));
        }

        let mut rows = Vec::new();
        for (index, record) in reader.records().enumerate() {
            let record = record.map_err(|e| {
                AppError::Input(format!("malformed record {}: {e}", index + 1))
            })?;
            let value = |column: &str| cell(&columns, &record, column);

            let Some(group_key) = value(GROUP_COLUMN) else {
                continue;
            };
            if group_key == GROUP_COLUMN {
                continue;
            }

            let Some(kind) = RowKind::from_cell(value(TYPE_COLUMN)) else {
                tracing::warn!(
                    group = group_key,
                    kind = value(TYPE_COLUMN).unwrap_or_default(),
                    "Ignoring row with unknown Type"
                );
                continue;
            };

            rows.push(Row {
                group_key: group_key.to_string(),
                kind,
                source_text: value(SOURCE_COLUMN).map(str::to_string),
                translation_text: value(TRANSLATION_COLUMN).map(str::to_string),
                repeat_count: parse_repeat_count(value(REPETITIONS_COLUMN)),
            });
        }

        Ok(group_rows(rows))
    }
}

/// Trimmed cell value; empty cells and absent columns are `None`
fn cell<'r>(
    columns: &HashMap<String, usize>,
    record: &'r csv::StringRecord,
    column: &str,
) -> Option<&'r str> {
    columns
        .get(column)
        .and_then(|&i| record.get(i))
        .map(str::trim)
        .filter(|v| !v.is_empty())
}
