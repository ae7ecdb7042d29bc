//! Clue boards: one round's grid, or the single final clue.

use buzzline_protocol::{BoardView, ColumnView, SlotView};

use crate::{ContentError, RoomError};

/// Columns on a regular-round board.
pub const BOARD_COLUMNS: usize = 6;
/// Slots per column.
pub const COLUMN_SLOTS: usize = 5;

/// Category id the final clue is chosen with.
pub const FINAL_CATEGORY_ID: u32 = 0;

/// One clue. Never changes once dealt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClueEntry {
    pub id: u32,
    pub prompt: String,
    pub correct_answer: String,
    pub value: i64,
}

/// A category and its slots. A `None` slot has been played; the remaining
/// slots keep their positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryColumn {
    pub id: u32,
    pub title: String,
    pub clues: Vec<Option<ClueEntry>>,
}

/// The last round's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalClue {
    pub category: String,
    pub clue: ClueEntry,
}

/// What is currently on the board.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ClueBoard {
    #[default]
    Empty,
    Round(Vec<CategoryColumn>),
    Final {
        category: String,
        clue: Option<ClueEntry>,
    },
}

impl ClueBoard {
    /// Builds a regular-round board, rejecting anything that is not a full
    /// 6 × 5 grid.
    pub fn round(columns: Vec<CategoryColumn>) -> Result<Self, ContentError> {
        if columns.len() != BOARD_COLUMNS {
            return Err(ContentError::Malformed(format!(
                "expected {BOARD_COLUMNS} columns, got {}",
                columns.len()
            )));
        }
        for column in &columns {
            if column.clues.len() != COLUMN_SLOTS || column.clues.iter().any(Option::is_none) {
                return Err(ContentError::Malformed(format!(
                    "column {} must have {COLUMN_SLOTS} filled slots",
                    column.id
                )));
            }
        }
        Ok(Self::Round(columns))
    }

    /// Builds the final-round board.
    pub fn final_round(content: FinalClue) -> Self {
        Self::Final {
            category: content.category,
            clue: Some(content.clue),
        }
    }

    /// The clue at (`category_id`, `clue_id`), if it is still playable.
    pub fn lookup(&self, category_id: u32, clue_id: u32) -> Result<&ClueEntry, RoomError> {
        match self {
            Self::Empty => Err(RoomError::UnknownCategory(category_id)),
            Self::Round(columns) => {
                let column = columns
                    .iter()
                    .find(|c| c.id == category_id)
                    .ok_or(RoomError::UnknownCategory(category_id))?;
                column
                    .clues
                    .iter()
                    .flatten()
                    .find(|clue| clue.id == clue_id)
                    .ok_or(RoomError::UnknownClue {
                        category_id,
                        clue_id,
                    })
            }
            Self::Final { clue, .. } => {
                if category_id != FINAL_CATEGORY_ID {
                    return Err(RoomError::UnknownCategory(category_id));
                }
                clue.as_ref()
                    .filter(|c| c.id == clue_id)
                    .ok_or(RoomError::UnknownClue {
                        category_id,
                        clue_id,
                    })
            }
        }
    }

    /// Replaces the clue with a tombstone. Returns `false` if it was
    /// already gone.
    pub fn tombstone(&mut self, category_id: u32, clue_id: u32) -> bool {
        match self {
            Self::Empty => false,
            Self::Round(columns) => columns
                .iter_mut()
                .filter(|c| c.id == category_id)
                .flat_map(|c| c.clues.iter_mut())
                .find(|slot| slot.as_ref().is_some_and(|clue| clue.id == clue_id))
                .map(|slot| slot.take().is_some())
                .unwrap_or(false),
            Self::Final { clue, .. } => {
                let matches = clue.as_ref().is_some_and(|c| c.id == clue_id);
                if category_id == FINAL_CATEGORY_ID && matches {
                    clue.take().is_some()
                } else {
                    false
                }
            }
        }
    }

    /// True once nothing playable is left. An empty board is not cleared;
    /// it was never dealt.
    pub fn is_cleared(&self) -> bool {
        match self {
            Self::Empty => false,
            Self::Round(columns) => columns.iter().all(|c| c.clues.iter().all(Option::is_none)),
            Self::Final { clue, .. } => clue.is_none(),
        }
    }

    /// The client-facing view. Prompts and answers are left out.
    pub fn view(&self) -> BoardView {
        match self {
            Self::Empty => BoardView::Empty,
            Self::Round(columns) => BoardView::Round {
                columns: columns
                    .iter()
                    .map(|c| ColumnView {
                        id: c.id,
                        title: c.title.clone(),
                        clues: c
                            .clues
                            .iter()
                            .map(|slot| {
                                slot.as_ref().map(|clue| SlotView {
                                    id: clue.id,
                                    value: clue.value,
                                })
                            })
                            .collect(),
                    })
                    .collect(),
            },
            Self::Final { category, clue } => BoardView::Final {
                category: category.clone(),
                available: clue.is_some(),
            },
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A full board with values `slot * base`.
    pub(crate) fn sample_columns(base: i64) -> Vec<CategoryColumn> {
        (0..BOARD_COLUMNS as u32)
            .map(|cat| CategoryColumn {
                id: cat,
                title: format!("Category {cat}"),
                clues: (0..COLUMN_SLOTS as u32)
                    .map(|slot| {
                        Some(ClueEntry {
                            id: slot,
                            prompt: format!("prompt {cat}-{slot}"),
                            correct_answer: format!("answer {cat}-{slot}"),
                            value: i64::from(slot + 1) * base,
                        })
                    })
                    .collect(),
            })
            .collect()
    }

    #[test]
    fn test_round_rejects_wrong_column_count() {
        let mut columns = sample_columns(200);
        columns.pop();
        assert!(matches!(ClueBoard::round(columns), Err(ContentError::Malformed(_))));
    }

    #[test]
    fn test_round_rejects_short_column() {
        let mut columns = sample_columns(200);
        columns[3].clues.pop();
        assert!(matches!(ClueBoard::round(columns), Err(ContentError::Malformed(_))));
    }

    #[test]
    fn test_lookup_and_tombstone() {
        let mut board = ClueBoard::round(sample_columns(200)).unwrap();

        let clue = board.lookup(2, 4).unwrap();
        assert_eq!(clue.value, 1000);

        assert!(board.tombstone(2, 4));
        assert!(!board.tombstone(2, 4));
        assert!(matches!(
            board.lookup(2, 4),
            Err(RoomError::UnknownClue {
                category_id: 2,
                clue_id: 4
            })
        ));
    }

    #[test]
    fn test_lookup_unknown_category() {
        let board = ClueBoard::round(sample_columns(200)).unwrap();
        assert!(matches!(board.lookup(9, 0), Err(RoomError::UnknownCategory(9))));
        assert!(matches!(ClueBoard::Empty.lookup(0, 0), Err(RoomError::UnknownCategory(0))));
    }

    #[test]
    fn test_tombstones_do_not_reflow() {
        let mut board = ClueBoard::round(sample_columns(200)).unwrap();
        board.tombstone(0, 1);

        let BoardView::Round { columns } = board.view() else {
            panic!("expected a round view");
        };
        assert_eq!(columns[0].clues.len(), COLUMN_SLOTS);
        assert_eq!(columns[0].clues[1], None);
        assert_eq!(columns[0].clues[2], Some(SlotView { id: 2, value: 600 }));
    }

    #[test]
    fn test_is_cleared() {
        let mut board = ClueBoard::round(sample_columns(400)).unwrap();
        assert!(!board.is_cleared());
        for cat in 0..BOARD_COLUMNS as u32 {
            for slot in 0..COLUMN_SLOTS as u32 {
                board.tombstone(cat, slot);
            }
        }
        assert!(board.is_cleared());
        assert!(!ClueBoard::Empty.is_cleared());
    }

    #[test]
    fn test_final_board() {
        let mut board = ClueBoard::final_round(FinalClue {
            category: "Opera".into(),
            clue: ClueEntry {
                id: 0,
                prompt: "Wagner cycle".into(),
                correct_answer: "The Ring".into(),
                value: 0,
            },
        });
        assert!(board.lookup(FINAL_CATEGORY_ID, 0).is_ok());
        assert!(matches!(board.lookup(1, 0), Err(RoomError::UnknownCategory(1))));
        assert_eq!(
            board.view(),
            BoardView::Final {
                category: "Opera".into(),
                available: true
            }
        );

        assert!(board.tombstone(FINAL_CATEGORY_ID, 0));
        assert!(board.is_cleared());
        assert!(board.lookup(FINAL_CATEGORY_ID, 0).is_err());
    }
}
