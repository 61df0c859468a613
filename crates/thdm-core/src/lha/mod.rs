//! A small SLHA (Les Houches Accord) file model.
//!
//! Covers exactly the dialect the scan touches: `Block` sections holding
//! key/value/comment entries (including the two-key form used for matrix
//! entries) and `DECAY` sections holding branching-ratio rows. Rendering is
//! deterministic so a deck built twice from the same parameters is
//! byte-identical, which keeps reruns diffable.

pub mod numbers;

use std::fmt::{Display, Formatter};

use thiserror::Error;

use crate::domain::PointFailure;

#[derive(Debug, Error)]
pub enum LhaError {
    #[error("line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    #[error("duplicate entry '{key}' in block '{block}'")]
    DuplicateEntry { block: String, key: String },

    #[error("no block '{name}'")]
    MissingBlock { name: String },

    #[error("no entry '{key}' in block '{block}'")]
    MissingEntry { block: String, key: String },

    #[error("cannot parse '{token}' as a real number")]
    Number { token: String },
}

impl From<LhaError> for PointFailure {
    fn from(error: LhaError) -> Self {
        PointFailure::Parse(error.to_string())
    }
}

/// One `key value # comment` line. Two-key entries store the pair joined
/// with a comma, mirroring how they are looked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LhaEntry {
    pub key: String,
    pub value: String,
    pub comment: String,
}

/// Builds an entry in place; used for the literal deck templates.
pub fn entry(key: &str, value: impl Into<String>, comment: &str) -> LhaEntry {
    LhaEntry {
        key: key.to_string(),
        value: value.into(),
        comment: comment.to_string(),
    }
}

impl Display for LhaEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.key.split_once(',') {
            Some((first, second)) => write!(
                f,
                "{first:>5}{second:>5}\t{} #  {}",
                self.value, self.comment
            ),
            None => write!(f, "{:>5}\t{} #  {}", self.key, self.value, self.comment),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LhaBlock {
    pub name: String,
    pub comment: String,
    entries: Vec<LhaEntry>,
}

impl LhaBlock {
    pub fn new(name: impl Into<String>, comment: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            comment: comment.into(),
            entries: Vec::new(),
        }
    }

    pub fn with_entries(
        name: impl Into<String>,
        comment: impl Into<String>,
        entries: Vec<LhaEntry>,
    ) -> Self {
        Self {
            name: name.into(),
            comment: comment.into(),
            entries,
        }
    }

    pub fn push(&mut self, entry: LhaEntry) -> Result<(), LhaError> {
        if self.entries.iter().any(|existing| existing.key == entry.key) {
            return Err(LhaError::DuplicateEntry {
                block: self.name.clone(),
                key: entry.key,
            });
        }
        self.entries.push(entry);
        Ok(())
    }

    pub fn entries(&self) -> &[LhaEntry] {
        &self.entries
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| entry.value.as_str())
    }
}

impl Display for LhaBlock {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.comment.is_empty() {
            write!(f, "Block {}", self.name)?;
        } else {
            write!(f, "Block {} # {}", self.name, self.comment)?;
        }
        for entry in &self.entries {
            write!(f, "\n{entry}")?;
        }
        Ok(())
    }
}

/// One branching-ratio row of a `DECAY` section.
#[derive(Debug, Clone, PartialEq)]
pub struct DecayRow {
    pub br: String,
    pub nda: String,
    pub id1: i32,
    pub id2: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecaySection {
    pub pdg: i32,
    pub width: String,
    pub comment: String,
    rows: Vec<DecayRow>,
}

impl DecaySection {
    pub fn new(pdg: i32, width: impl Into<String>, comment: impl Into<String>) -> Self {
        Self {
            pdg,
            width: width.into(),
            comment: comment.into(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: DecayRow) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[DecayRow] {
        &self.rows
    }

    /// The raw branching-ratio token for an exact product pair, order
    /// sensitive just like the files themselves.
    pub fn branching_ratio(&self, id1: i32, id2: i32) -> Option<&str> {
        self.rows
            .iter()
            .find(|row| row.id1 == id1 && row.id2 == id2)
            .map(|row| row.br.as_str())
    }
}

impl Display for DecaySection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "DECAY\t{}\t{}\t# {}\n#\t BR \t NDA \t ID1 \t ID2",
            self.pdg, self.width, self.comment
        )?;
        for row in &self.rows {
            write!(f, "\n{:>5}\t{}\t{}\t{}", row.br, row.nda, row.id1, row.id2)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LhaSection {
    Block(LhaBlock),
    Decay(DecaySection),
}

impl Display for LhaSection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Block(block) => block.fmt(f),
            Self::Decay(decay) => decay.fmt(f),
        }
    }
}

/// A whole SLHA file: free-form header lines followed by sections.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LhaFile {
    pub header: Vec<String>,
    sections: Vec<LhaSection>,
}

impl LhaFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_block(&mut self, block: LhaBlock) {
        self.sections.push(LhaSection::Block(block));
    }

    pub fn push_decay(&mut self, decay: DecaySection) {
        self.sections.push(LhaSection::Decay(decay));
    }

    pub fn sections(&self) -> &[LhaSection] {
        &self.sections
    }

    pub fn block(&self, name: &str) -> Option<&LhaBlock> {
        self.sections.iter().find_map(|section| match section {
            LhaSection::Block(block) if block.name == name => Some(block),
            _ => None,
        })
    }

    pub fn decay(&self, pdg: i32) -> Option<&DecaySection> {
        self.sections.iter().find_map(|section| match section {
            LhaSection::Decay(decay) if decay.pdg == pdg => Some(decay),
            _ => None,
        })
    }

    /// Raw value of `key` in `block`, as an error if either is absent.
    pub fn value(&self, block: &str, key: &str) -> Result<&str, LhaError> {
        let found = self.block(block).ok_or_else(|| LhaError::MissingBlock {
            name: block.to_string(),
        })?;
        found.value(key).ok_or_else(|| LhaError::MissingEntry {
            block: block.to_string(),
            key: key.to_string(),
        })
    }

    /// Numeric value of `key` in `block`.
    pub fn real(&self, block: &str, key: &str) -> Result<f64, LhaError> {
        numbers::parse_real(self.value(block, key)?)
    }

    pub fn parse(text: &str) -> Result<Self, LhaError> {
        let mut file = Self::new();
        let mut in_sections = false;
        for (index, line) in text.lines().enumerate() {
            let line_no = index + 1;
            let starts_block = line.starts_with("Block") || line.starts_with("BLOCK");
            let starts_decay = line.starts_with("DECAY");
            if !in_sections && !starts_block && !starts_decay {
                file.header.push(line.to_string());
                continue;
            }
            in_sections = true;
            if starts_block {
                file.sections
                    .push(LhaSection::Block(parse_block_header(line, line_no)?));
                continue;
            }
            if starts_decay {
                file.sections
                    .push(LhaSection::Decay(parse_decay_header(line, line_no)?));
                continue;
            }
            if line.trim_start().starts_with('#') {
                continue;
            }
            let (content, comment) = split_comment(line);
            let tokens: Vec<&str> = content.split_whitespace().collect();
            if tokens.is_empty() {
                continue;
            }
            match file.sections.last_mut() {
                Some(LhaSection::Block(block)) => {
                    block.push(block_entry(&tokens, comment, line_no)?)?;
                }
                Some(LhaSection::Decay(decay)) => {
                    decay.push(decay_row(&tokens, line_no)?);
                }
                None => {
                    return Err(LhaError::Malformed {
                        line: line_no,
                        reason: "entry before any Block or DECAY header".to_string(),
                    });
                }
            }
        }
        Ok(file)
    }

    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl Display for LhaFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for line in &self.header {
            if !first {
                f.write_str("\n")?;
            }
            f.write_str(line)?;
            first = false;
        }
        for section in &self.sections {
            if !first {
                f.write_str("\n")?;
            }
            write!(f, "{section}")?;
            first = false;
        }
        Ok(())
    }
}

/// Splits the leading whitespace-delimited token off `text`.
fn take_token(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    match text.find(char::is_whitespace) {
        Some(end) => (&text[..end], &text[end..]),
        None => (text, ""),
    }
}

/// Strips the `#` marker and surrounding padding off an inline comment.
fn clean_comment(text: &str) -> String {
    text.trim_start()
        .trim_start_matches(|c| c == '#' || c == ' ')
        .to_string()
}

fn split_comment(line: &str) -> (&str, String) {
    match line.split_once('#') {
        Some((content, comment)) => (content, comment.trim().to_string()),
        None => (line, String::new()),
    }
}

fn parse_block_header(line: &str, line_no: usize) -> Result<LhaBlock, LhaError> {
    let (_, rest) = take_token(line);
    let (name, rest) = take_token(rest);
    if name.is_empty() {
        return Err(LhaError::Malformed {
            line: line_no,
            reason: "Block header without a name".to_string(),
        });
    }
    Ok(LhaBlock::new(name, clean_comment(rest)))
}

fn parse_decay_header(line: &str, line_no: usize) -> Result<DecaySection, LhaError> {
    let (_, rest) = take_token(line);
    let (pdg_token, rest) = take_token(rest);
    let (width, rest) = take_token(rest);
    let pdg: i32 = pdg_token.parse().map_err(|_| LhaError::Malformed {
        line: line_no,
        reason: format!("DECAY particle id '{pdg_token}' is not an integer"),
    })?;
    if width.is_empty() {
        return Err(LhaError::Malformed {
            line: line_no,
            reason: "DECAY header without a width".to_string(),
        });
    }
    Ok(DecaySection::new(pdg, width, clean_comment(rest)))
}

fn block_entry(tokens: &[&str], comment: String, line_no: usize) -> Result<LhaEntry, LhaError> {
    match tokens {
        [value] => Ok(LhaEntry {
            key: String::new(),
            value: (*value).to_string(),
            comment,
        }),
        [key, value] => Ok(LhaEntry {
            key: (*key).to_string(),
            value: (*value).to_string(),
            comment,
        }),
        [first, second, value] => Ok(LhaEntry {
            key: format!("{first},{second}"),
            value: (*value).to_string(),
            comment,
        }),
        _ => Err(LhaError::Malformed {
            line: line_no,
            reason: format!("block entry with {} value tokens", tokens.len()),
        }),
    }
}

fn decay_row(tokens: &[&str], line_no: usize) -> Result<DecayRow, LhaError> {
    let [br, nda, id1, id2] = tokens else {
        return Err(LhaError::Malformed {
            line: line_no,
            reason: format!("decay row with {} tokens instead of 4", tokens.len()),
        });
    };
    let parse_id = |token: &str| -> Result<i32, LhaError> {
        token.parse().map_err(|_| LhaError::Malformed {
            line: line_no,
            reason: format!("decay product '{token}' is not an integer"),
        })
    };
    Ok(DecayRow {
        br: (*br).to_string(),
        nda: (*nda).to_string(),
        id1: parse_id(id1)?,
        id2: parse_id(id2)?,
    })
}
