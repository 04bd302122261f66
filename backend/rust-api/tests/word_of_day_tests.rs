use chrono::{Datelike, NaiveDate};
use sproutlearn_api::models::vocabulary::{day_of_year, VocabularyList, VocabularyWord};

fn vocabulary(n: u32) -> VocabularyList {
    let words = (0..n)
        .map(|i| VocabularyWord {
            id: None,
            word: format!("word-{}", i),
            definition: format!("definition {}", i),
            example: format!("example {}", i),
            position: i,
        })
        .collect();
    VocabularyList::new(words).expect("non-empty list")
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn selection_is_stable_for_a_given_date() {
    let list = vocabulary(35);
    let date = date(2025, 8, 6);

    let first = list.select(date);
    let second = list.select(date);

    assert_eq!(first.word, second.word);
    assert_eq!(first.index, second.index);
    assert_eq!(first.day_of_year, second.day_of_year);
}

#[test]
fn full_cycle_covers_every_word_exactly_once() {
    let list = vocabulary(7);
    let mut seen = std::collections::HashSet::new();

    let mut d = date(2025, 3, 1);
    for _ in 0..7 {
        seen.insert(list.select(d).index);
        d = d.succ_opt().unwrap();
    }

    assert_eq!(seen.len(), 7);
}

#[test]
fn dates_exactly_n_days_apart_yield_the_same_word() {
    let list = vocabulary(35);
    let a = date(2025, 2, 10);
    let b = date(2025, 3, 17); // 35 days later, same year

    let word_a = list.select(a);
    let word_b = list.select(b);

    assert_eq!(word_a.index, word_b.index);
    assert_eq!(word_a.word, word_b.word);
}

#[test]
fn index_stays_in_bounds_across_leap_and_common_years() {
    let list = vocabulary(11);

    for year in [2023, 2024, 2025] {
        let mut d = date(year, 1, 1);
        while d.year() == year {
            let selected = list.select(d);
            assert!(selected.index < list.len());
            assert!(selected.day_of_year >= 1);
            assert!(selected.day_of_year <= 366);
            d = d.succ_opt().unwrap();
        }
    }
}

#[test]
fn day_of_year_is_calendar_based() {
    // Values derive from the calendar date, never from elapsed time, so
    // DST transitions cannot shift them.
    assert_eq!(day_of_year(date(2025, 1, 1)), 1);
    assert_eq!(day_of_year(date(2025, 3, 30)), 89); // day before most EU DST changes in 2025
    assert_eq!(day_of_year(date(2025, 3, 31)), 90);
    assert_eq!(day_of_year(date(2025, 12, 31)), 365);
}

#[test]
fn day_thirty_five_wraps_to_index_zero_on_a_35_word_list() {
    let list = vocabulary(35);

    // Day-of-year 35 is 35 mod 35 = 0, day 36 advances to 1.
    let feb_4 = list.select(date(2025, 2, 4));
    assert_eq!(day_of_year(date(2025, 2, 4)), 35);
    assert_eq!(feb_4.index, 0);

    let feb_5 = list.select(date(2025, 2, 5));
    assert_eq!(feb_5.index, 1);
}

#[test]
fn empty_vocabulary_is_a_construction_error() {
    assert!(VocabularyList::new(Vec::new()).is_err());
}
