/// Repetitions used when the table leaves the column empty or unparseable
pub const DEFAULT_REPEAT_COUNT: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowKind {
    /// A passage narrated once
    Paragraph,
    /// A sentence the learner repeats, optionally introduced by its translation
    #[default]
    Repeat,
}

impl RowKind {
    /// Parse the `Type` column. Empty means Repeat; unknown values are `None`.
    pub fn from_cell(cell: Option<&str>) -> Option<Self> {
        match cell.map(str::trim).unwrap_or_default().to_lowercase().as_str() {
            "" | "repeat" => Some(RowKind::Repeat),
            "paragraph" => Some(RowKind::Paragraph),
            _ => None,
        }
    }
}

/// One line of the lesson table
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub group_key: String,
    pub kind: RowKind,
    pub source_text: Option<String>,
    pub translation_text: Option<String>,
    pub repeat_count: u32,
}

impl Row {
    pub fn repeat(group_key: &str, source: &str, translation: Option<&str>, repeat_count: u32) -> Self {
        Self {
            group_key: group_key.to_string(),
            kind: RowKind::Repeat,
            source_text: Some(source.to_string()),
            translation_text: translation.map(str::to_string),
            repeat_count,
        }
    }

    pub fn paragraph(group_key: &str, source: &str) -> Self {
        Self {
            group_key: group_key.to_string(),
            kind: RowKind::Paragraph,
            source_text: Some(source.to_string()),
            translation_text: None,
            repeat_count: DEFAULT_REPEAT_COUNT,
        }
    }
}

/// Coerce the `Repetitions` cell into a positive count.
///
/// Accepts integers and integral floats (`3.0`); anything else, including
/// zero and negatives, falls back to [`DEFAULT_REPEAT_COUNT`].
pub fn parse_repeat_count(cell: Option<&str>) -> u32 {
    let Some(raw) = cell.map(str::trim).filter(|s| !s.is_empty()) else {
        return DEFAULT_REPEAT_COUNT;
    };
    if let Ok(count) = raw.parse::<u32>() {
        return if count >= 1 { count } else { DEFAULT_REPEAT_COUNT };
    }
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 1.0 && value.fract() == 0.0 && value <= u32::MAX as f64 => {
            value as u32
        }
        _ => DEFAULT_REPEAT_COUNT,
    }
}

/// Rows sharing a group key, in table order
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub key: String,
    pub rows: Vec<Row>,
}

impl Group {
    pub fn new(key: impl Into<String>, rows: Vec<Row>) -> Self {
        Self {
            key: key.into(),
            rows,
        }
    }

    /// Filesystem-safe name: alphanumerics and `._-` only
    pub fn sanitized_key(&self) -> String {
        sanitize_file_stem(&self.key)
    }

    /// Copy of this group holding only its first row
    pub fn first_row_only(&self) -> Group {
        Group {
            key: self.key.clone(),
            rows: self.rows.iter().take(1).cloned().collect(),
        }
    }
}

pub fn sanitize_file_stem(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect()
}

/// Group rows by key. Groups come out sorted by key; rows keep table order.
pub fn group_rows(rows: Vec<Row>) -> Vec<Group> {
    let mut groups: Vec<Group> = Vec::new();
    for row in rows {
        match groups.iter_mut().find(|g| g.key == row.group_key) {
            Some(group) => group.rows.push(row),
            None => groups.push(Group::new(row.group_key.clone(), vec![row])),
        }
    }
    groups.sort_by(|a, b| a.key.cmp(&b.key));
    groups
}
