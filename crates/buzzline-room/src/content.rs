//! Clue content.
//!
//! A room never stores a question bank; it asks a [`ContentProvider`] for
//! one round at a time. [`ClueBank`] is the in-repo provider, backed by a
//! JSON file loaded at startup.
//!
//! # Bank format
//!
//! ```json
//! {
//!   "categories": [
//!     {
//!       "title": "World Capitals",
//!       "round": "single",
//!       "year": 2004,
//!       "clues": [{ "prompt": "Capital of Peru", "answer": "Lima" }]
//!     }
//!   ]
//! }
//! ```
//!
//! `round` is `single`, `double`, or `final`. Clues should be listed from
//! easiest to hardest; the first five become the column's slots.

use std::future::Future;
use std::path::Path;

use rand::seq::IndexedRandom;
use serde::Deserialize;

use crate::board::{BOARD_COLUMNS, COLUMN_SLOTS};
use crate::{CategoryColumn, ClueEntry, FinalClue};

/// Errors from loading or drawing content.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("failed to read clue bank: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse clue bank: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("round {round}: need {needed} categories after year {min_year}, found {found}")]
    NotEnoughCategories {
        round: u32,
        min_year: i32,
        needed: usize,
        found: usize,
    },

    #[error("no board content for round {0}")]
    UnsupportedRound(u32),

    #[error("malformed content: {0}")]
    Malformed(String),
}

/// Source of boards and final clues.
///
/// Boards for rounds 1 and 2 are six columns of five clues, valued
/// `slot * base` with `base` 200 in round 1 and 400 in round 2.
pub trait ContentProvider: Send + Sync + 'static {
    /// Draws a full board for `round` from content newer than `min_year`.
    fn fetch_board(
        &self,
        round: u32,
        min_year: i32,
    ) -> impl Future<Output = Result<Vec<CategoryColumn>, ContentError>> + Send;

    /// Draws the final clue from content newer than `min_year`.
    fn fetch_final_clue(
        &self,
        min_year: i32,
    ) -> impl Future<Output = Result<FinalClue, ContentError>> + Send;
}

/// Dollar value of the first slot in `round`.
pub fn base_value(round: u32) -> Option<i64> {
    match round {
        1 => Some(200),
        2 => Some(400),
        _ => None,
    }
}

/// Which round a bank category belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundKind {
    Single,
    Double,
    Final,
}

impl RoundKind {
    fn for_round(round: u32) -> Option<Self> {
        match round {
            1 => Some(Self::Single),
            2 => Some(Self::Double),
            _ => None,
        }
    }
}

/// One clue as stored in the bank.
#[derive(Debug, Clone, Deserialize)]
pub struct BankClue {
    pub prompt: String,
    pub answer: String,
}

/// One category as stored in the bank.
#[derive(Debug, Clone, Deserialize)]
pub struct BankCategory {
    pub title: String,
    pub round: RoundKind,
    pub year: i32,
    pub clues: Vec<BankClue>,
}

#[derive(Deserialize)]
struct BankFile {
    categories: Vec<BankCategory>,
}

/// An in-memory clue bank.
#[derive(Debug, Clone, Default)]
pub struct ClueBank {
    categories: Vec<BankCategory>,
}

impl ClueBank {
    pub fn new(categories: Vec<BankCategory>) -> Self {
        Self { categories }
    }

    /// Parses a bank from its JSON text.
    pub fn from_json(text: &str) -> Result<Self, ContentError> {
        let file: BankFile = serde_json::from_str(text)?;
        Ok(Self::new(file.categories))
    }

    /// Reads and parses a bank file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ContentError> {
        let text = tokio::fs::read_to_string(path).await?;
        let bank = Self::from_json(&text)?;
        tracing::info!(categories = bank.len(), "clue bank loaded");
        Ok(bank)
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    fn eligible(&self, kind: RoundKind, min_year: i32, min_clues: usize) -> Vec<&BankCategory> {
        self.categories
            .iter()
            .filter(|c| c.round == kind && c.year > min_year && c.clues.len() >= min_clues)
            .collect()
    }

    fn draw_board(&self, round: u32, min_year: i32) -> Result<Vec<CategoryColumn>, ContentError> {
        let (kind, base) = RoundKind::for_round(round)
            .zip(base_value(round))
            .ok_or(ContentError::UnsupportedRound(round))?;

        let eligible = self.eligible(kind, min_year, COLUMN_SLOTS);
        if eligible.len() < BOARD_COLUMNS {
            return Err(ContentError::NotEnoughCategories {
                round,
                min_year,
                needed: BOARD_COLUMNS,
                found: eligible.len(),
            });
        }

        let mut rng = rand::rng();
        let columns = eligible
            .choose_multiple(&mut rng, BOARD_COLUMNS)
            .zip(0u32..)
            .map(|(category, column_id)| CategoryColumn {
                id: column_id,
                title: category.title.clone(),
                clues: category
                    .clues
                    .iter()
                    .take(COLUMN_SLOTS)
                    .zip(0u32..)
                    .map(|(clue, slot)| {
                        Some(ClueEntry {
                            id: slot,
                            prompt: clue.prompt.clone(),
                            correct_answer: clue.answer.clone(),
                            value: i64::from(slot + 1) * base,
                        })
                    })
                    .collect(),
            })
            .collect();
        Ok(columns)
    }

    fn draw_final(&self, min_year: i32) -> Result<FinalClue, ContentError> {
        let eligible = self.eligible(RoundKind::Final, min_year, 1);
        let mut rng = rand::rng();
        let category = eligible
            .choose(&mut rng)
            .ok_or(ContentError::NotEnoughCategories {
                round: 3,
                min_year,
                needed: 1,
                found: 0,
            })?;
        let clue = category
            .clues
            .choose(&mut rng)
            .ok_or_else(|| {
                ContentError::Malformed(format!("final category {} has no clues", category.title))
            })?;

        Ok(FinalClue {
            category: category.title.clone(),
            clue: ClueEntry {
                id: 0,
                prompt: clue.prompt.clone(),
                correct_answer: clue.answer.clone(),
                value: 0,
            },
        })
    }
}

impl ContentProvider for ClueBank {
    async fn fetch_board(
        &self,
        round: u32,
        min_year: i32,
    ) -> Result<Vec<CategoryColumn>, ContentError> {
        self.draw_board(round, min_year)
    }

    async fn fetch_final_clue(&self, min_year: i32) -> Result<FinalClue, ContentError> {
        self.draw_final(min_year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ClueBoard;

    fn category(title: &str, round: RoundKind, year: i32, clues: usize) -> BankCategory {
        BankCategory {
            title: title.into(),
            round,
            year,
            clues: (0..clues)
                .map(|i| BankClue {
                    prompt: format!("{title} prompt {i}"),
                    answer: format!("{title} answer {i}"),
                })
                .collect(),
        }
    }

    fn bank() -> ClueBank {
        let mut categories = Vec::new();
        for i in 0..8 {
            categories.push(category(&format!("single {i}"), RoundKind::Single, 2000 + i, 5));
            categories.push(category(&format!("double {i}"), RoundKind::Double, 2000 + i, 6));
        }
        categories.push(category("short", RoundKind::Single, 2020, 4));
        categories.push(category("final", RoundKind::Final, 2010, 1));
        ClueBank::new(categories)
    }

    #[tokio::test]
    async fn test_round_one_board_values() {
        let columns = bank().fetch_board(1, 0).await.unwrap();
        assert_eq!(columns.len(), BOARD_COLUMNS);
        for (i, column) in columns.iter().enumerate() {
            assert_eq!(column.id, i as u32);
            assert!(column.title.starts_with("single"));
            let values: Vec<i64> = column.clues.iter().flatten().map(|c| c.value).collect();
            assert_eq!(values, vec![200, 400, 600, 800, 1000]);
        }
        assert!(ClueBoard::round(columns).is_ok());
    }

    #[tokio::test]
    async fn test_round_two_board_values() {
        let columns = bank().fetch_board(2, 0).await.unwrap();
        let values: Vec<i64> = columns[0].clues.iter().flatten().map(|c| c.value).collect();
        assert_eq!(values, vec![400, 800, 1200, 1600, 2000]);
    }

    #[tokio::test]
    async fn test_min_year_filters_categories() {
        // Only single 3..=7 are newer than 2002: five categories, one short.
        let result = bank().fetch_board(1, 2002).await;
        assert!(matches!(
            result,
            Err(ContentError::NotEnoughCategories { found: 5, needed: 6, .. })
        ));
    }

    #[tokio::test]
    async fn test_unsupported_round() {
        assert!(matches!(
            bank().fetch_board(3, 0).await,
            Err(ContentError::UnsupportedRound(3))
        ));
    }

    #[tokio::test]
    async fn test_final_clue() {
        let clue = bank().fetch_final_clue(0).await.unwrap();
        assert_eq!(clue.category, "final");
        assert_eq!(clue.clue.value, 0);
        assert_eq!(clue.clue.correct_answer, "final answer 0");

        assert!(bank().fetch_final_clue(2010).await.is_err());
    }

    #[test]
    fn test_from_json() {
        let text = r#"{"categories": [
            {"title": "Rivers", "round": "double", "year": 1999,
             "clues": [{"prompt": "Longest in Africa", "answer": "Nile"}]}
        ]}"#;
        let bank = ClueBank::from_json(text).unwrap();
        assert_eq!(bank.len(), 1);

        assert!(matches!(ClueBank::from_json("[]"), Err(ContentError::Parse(_))));
    }
}
