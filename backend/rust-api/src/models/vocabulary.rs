use chrono::{Datelike, NaiveDate};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Vocabulary entry stored in MongoDB "vocabulary" collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularyWord {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub word: String,
    pub definition: String,
    pub example: String,
    /// Position in the rotation. Entries are sorted by this before selection.
    pub position: u32,
}

#[derive(Debug, Error)]
pub enum VocabularyError {
    #[error("vocabulary list must contain at least one word")]
    Empty,
}

/// Ordered, fixed-size word list. Non-emptiness is checked once at
/// construction so selection itself cannot fail.
#[derive(Debug, Clone)]
pub struct VocabularyList {
    words: Vec<VocabularyWord>,
}

impl VocabularyList {
    pub fn new(mut words: Vec<VocabularyWord>) -> Result<Self, VocabularyError> {
        if words.is_empty() {
            return Err(VocabularyError::Empty);
        }
        words.sort_by_key(|w| w.position);
        Ok(Self { words })
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        // Construction rejects empty lists
        false
    }

    /// Selects the word for `date`. Same calendar date always yields the
    /// same word; the rotation repeats every `len()` days within a year.
    /// Index sequences do not align across year boundaries unless the year
    /// length happens to be a multiple of the list size; that is accepted.
    pub fn select(&self, date: NaiveDate) -> WordOfDay {
        let day_of_year = day_of_year(date);
        let index = day_of_year as usize % self.words.len();
        let entry = &self.words[index];

        WordOfDay {
            word: entry.word.clone(),
            definition: entry.definition.clone(),
            example: entry.example.clone(),
            index,
            day_of_year,
        }
    }
}

/// Whole calendar days since January 0 of the date's year (December 31 of
/// the prior year counts as day 0, so January 1 is day 1). Computed from
/// the calendar date only, never from elapsed milliseconds, so daylight
/// saving shifts cannot move the boundary.
pub fn day_of_year(date: NaiveDate) -> u32 {
    date.ordinal()
}

/// Selector output: the word plus its rotation index and day-of-year for
/// diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordOfDay {
    pub word: String,
    pub definition: String,
    pub example: String,
    pub index: usize,
    pub day_of_year: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    fn list_of(n: u32) -> VocabularyList {
        let words = (0..n)
            .map(|i| VocabularyWord {
                id: None,
                word: format!("word-{}", i),
                definition: format!("definition {}", i),
                example: format!("example {}", i),
                position: i,
            })
            .collect();
        VocabularyList::new(words).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn empty_list_is_rejected() {
        assert!(matches!(
            VocabularyList::new(vec![]),
            Err(VocabularyError::Empty)
        ));
    }

    #[test]
    fn january_first_is_day_one() {
        assert_eq!(day_of_year(date(2024, 1, 1)), 1);
        assert_eq!(day_of_year(date(2025, 1, 1)), 1);
    }

    #[test]
    fn december_31_is_day_365_or_366() {
        assert_eq!(day_of_year(date(2023, 12, 31)), 365);
        assert_eq!(day_of_year(date(2024, 12, 31)), 366); // leap year
    }

    #[test]
    fn same_date_always_selects_same_word() {
        let list = list_of(35);
        let a = list.select(date(2024, 6, 15));
        let b = list.select(date(2024, 6, 15));
        assert_eq!(a.word, b.word);
        assert_eq!(a.index, b.index);
    }

    #[test]
    fn index_is_always_in_bounds() {
        let list = list_of(7);
        let mut d = date(2024, 1, 1);
        for _ in 0..730 {
            let selected = list.select(d);
            assert!(selected.index < list.len());
            d = d.succ_opt().unwrap();
        }
    }

    #[test]
    fn rotation_repeats_every_n_days_within_a_year() {
        let list = list_of(35);
        // Day-of-year 35 maps to the same index as the (hypothetical)
        // day 0, and day 36 advances to index 1.
        let day_35 = list.select(date(2024, 2, 4));
        assert_eq!(day_of_year(date(2024, 2, 4)), 35);
        assert_eq!(day_35.index, 0);

        let day_36 = list.select(date(2024, 2, 5));
        assert_eq!(day_36.index, 1);

        let day_70 = list.select(date(2024, 3, 10));
        assert_eq!(day_of_year(date(2024, 3, 10)), 70);
        assert_eq!(day_70.index, 0);
        assert_eq!(day_70.word, day_35.word);
    }

    #[test]
    fn dates_n_days_apart_select_the_same_word() {
        let list = list_of(35);
        let mut d = date(2024, 1, 3);
        for _ in 0..8 {
            let next = d + chrono::Duration::days(35);
            if next.year() != d.year() {
                break; // alignment only holds within one year
            }
            assert_eq!(list.select(d).index, list.select(next).index);
            d = next;
        }
    }

    #[test]
    fn year_boundary_resets_the_sequence() {
        let list = list_of(35);
        let dec_31 = list.select(date(2023, 12, 31));
        let jan_1 = list.select(date(2024, 1, 1));
        // 365 % 35 = 15, then the new year restarts at day 1.
        assert_eq!(dec_31.index, 15);
        assert_eq!(jan_1.index, 1);
    }

    #[test]
    fn words_are_ordered_by_position_not_insertion() {
        let words = vec![
            VocabularyWord {
                id: None,
                word: "second".into(),
                definition: "d".into(),
                example: "e".into(),
                position: 1,
            },
            VocabularyWord {
                id: None,
                word: "first".into(),
                definition: "d".into(),
                example: "e".into(),
                position: 0,
            },
        ];
        let list = VocabularyList::new(words).unwrap();
        // Day-of-year 2 on a 2-word list lands on index 0.
        let selected = list.select(date(2024, 1, 2));
        assert_eq!(selected.index, 0);
        assert_eq!(selected.word, "first");
    }
}
