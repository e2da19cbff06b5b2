// src/ranking.rs
//! Two-tier ranking of merged stories.
//!
//! Titles shorter than [`SHORT_TITLE_CHARS`] characters are treated as likely
//! noise and always ranked after every other story. Long-title stories are
//! ordered by comment count, short-title stories by score, both descending.
//! Sorting is stable so equal keys keep their merge order.

use crate::sources::Item;

pub const SHORT_TITLE_CHARS: usize = 5;

pub fn is_short_title(item: &Item) -> bool {
    item.title.chars().count() < SHORT_TITLE_CHARS
}

pub fn rank(items: Vec<Item>) -> Vec<Item> {
    let (mut short, mut long): (Vec<Item>, Vec<Item>) =
        items.into_iter().partition(is_short_title);

    long.sort_by(|a, b| b.descendants.cmp(&a.descendants));
    short.sort_by(|a, b| b.score.cmp(&a.score));

    long.append(&mut short);
    long
}
