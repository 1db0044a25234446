/*!
 * `.nihongocards` export bundle.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::{StudyItem, StudyMaterial};

/// File extension of exported bundles
pub const CARDS_EXTENSION: &str = "nihongocards";

/// Kind of book a table is imported as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookType {
    Vocabulary,
    Grammar,
}

/// One table of cards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardTable {
    pub title: String,
    pub book_type: BookType,
    pub items: Vec<StudyItem>,
}

/// A group of card tables as written to a `.nihongocards` file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NihongoCards {
    pub version: u32,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub exported_at: String,
    pub tables: Vec<CardTable>,
}

impl NihongoCards {
    /// Build the bundle for `title`, stamped with the current time
    pub fn build(title: &str, material: &StudyMaterial) -> Self {
        Self::build_at(title, material, Utc::now())
    }

    /// Build the bundle with an explicit export time
    pub fn build_at(title: &str, material: &StudyMaterial, exported_at: DateTime<Utc>) -> Self {
        Self {
            version: 1,
            kind: "group".to_string(),
            title: format!("AnimeJapanese - {}", title),
            exported_at: exported_at.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            tables: vec![
                CardTable {
                    title: format!("單字 - {}", title),
                    book_type: BookType::Vocabulary,
                    items: material.vocabulary.clone(),
                },
                CardTable {
                    title: format!("文法 - {}", title),
                    book_type: BookType::Grammar,
                    items: material.grammar.clone(),
                },
            ],
        }
    }

    pub fn table(&self, book_type: BookType) -> Option<&CardTable> {
        self.tables.iter().find(|t| t.book_type == book_type)
    }
}
