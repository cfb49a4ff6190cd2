//! Word catalog: the built-in vocabulary table plus CSV import

use std::collections::{BTreeSet, HashSet};
use std::io::Read;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use csv::ReaderBuilder;
#[cfg(feature = "python")]
use pyo3::prelude::*;

use crate::builtin_words::BUILTIN_WORDS;
use crate::error::{QuizError, Result};

/// A translatable word pair. The English term is the word's identifier.
#[cfg_attr(feature = "python", pyclass(frozen))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Word {
    #[cfg_attr(feature = "python", pyo3(get))]
    pub eng: String,
    #[cfg_attr(feature = "python", pyo3(get))]
    pub kor: String,
    #[cfg_attr(feature = "python", pyo3(get))]
    pub level: u8,
}

impl Word {
    pub fn new(eng: impl Into<String>, kor: impl Into<String>, level: u8) -> Self {
        Word { eng: eng.into(), kor: kor.into(), level }
    }

    pub fn id(&self) -> &str {
        &self.eng
    }
}

#[cfg(feature = "python")]
#[pymethods]
impl Word {
    fn __repr__(&self) -> String {
        format!("Word(eng='{}', kor='{}', level={})", self.eng, self.kor, self.level)
    }
}

/// Immutable word table. Identifiers are unique within a catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    words: Vec<Word>,
}

static BUILTIN: OnceLock<Arc<Catalog>> = OnceLock::new();

impl Catalog {
    /// The vocabulary shipped with the game, levels 1 to 5.
    pub fn builtin() -> Arc<Catalog> {
        BUILTIN
            .get_or_init(|| {
                let words = BUILTIN_WORDS
                    .iter()
                    .map(|&(eng, kor, level)| Word::new(eng, kor, level))
                    .collect();
                Arc::new(Catalog::from_words(words))
            })
            .clone()
    }

    /// Build a catalog, keeping the first occurrence of each identifier.
    pub fn from_words(words: Vec<Word>) -> Self {
        let mut seen = HashSet::new();
        let mut unique = Vec::with_capacity(words.len());
        for word in words {
            if seen.insert(word.eng.clone()) {
                unique.push(word);
            } else {
                log::warn!("Duplicate catalog entry '{}' ignored", word.eng);
            }
        }
        Catalog { words: unique }
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn at_level(&self, level: u8) -> impl Iterator<Item = &Word> + '_ {
        self.words.iter().filter(move |w| w.level == level)
    }

    /// Distinct levels present, ascending.
    pub fn levels(&self) -> Vec<u8> {
        self.words.iter().map(|w| w.level).collect::<BTreeSet<_>>().into_iter().collect()
    }

    /// Import a catalog from a CSV file with a header row.
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(file)
    }

    /// Import a catalog from CSV. Required columns: English term, Korean term
    /// and level, matched by header name.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = reader.headers()?.iter().map(|s| s.to_string()).collect();
        let mapping = detect_columns(&headers)?;

        let mut words = Vec::new();
        for (row, result) in reader.records().enumerate() {
            let record = result?;
            let field = |i: usize| record.get(i).unwrap_or("").trim();

            let eng = field(mapping.eng);
            let kor = field(mapping.kor);
            if eng.is_empty() || kor.is_empty() {
                continue;
            }

            let level = field(mapping.level).parse::<u8>().map_err(|_| {
                QuizError::CatalogImport(format!(
                    "row {}: invalid level '{}' for '{}'",
                    row + 2,
                    field(mapping.level),
                    eng
                ))
            })?;

            words.push(Word::new(eng, kor, level));
        }

        if words.is_empty() {
            return Err(QuizError::CatalogImport("file contains no words".to_string()));
        }

        log::info!("Imported {} words from CSV", words.len());
        Ok(Self::from_words(words))
    }
}

/// Column index mapping
#[derive(Debug, Clone, Copy)]
struct ColumnMapping {
    eng: usize,
    kor: usize,
    level: usize,
}

/// Detect column indices from header names
fn detect_columns(headers: &[String]) -> Result<ColumnMapping> {
    let (mut eng, mut kor, mut level) = (None, None, None);

    for (i, header) in headers.iter().enumerate() {
        match header.trim().to_lowercase().as_str() {
            "eng" | "english" | "word" => eng = Some(i),
            "kor" | "korean" | "meaning" => kor = Some(i),
            "level" | "difficulty" => level = Some(i),
            _ => {} // Unknown columns ignored
        }
    }

    let missing = |name: &str| QuizError::CatalogImport(format!("missing required '{name}' column in header"));
    Ok(ColumnMapping {
        eng: eng.ok_or_else(|| missing("English"))?,
        kor: kor.ok_or_else(|| missing("Korean"))?,
        level: level.ok_or_else(|| missing("Level"))?,
    })
}
