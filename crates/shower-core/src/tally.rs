use std::collections::BTreeMap;

use shower_types::Choice;
use shower_types::Vote;
use shower_types::api::{ChoiceTally, Tally};

/// Votes per choice. Every choice is present, so an empty set maps each
/// choice to zero.
pub fn counts_by_choice(votes: &[Vote]) -> BTreeMap<Choice, usize> {
    let mut counts: BTreeMap<Choice, usize> = Choice::ALL.iter().map(|c| (*c, 0)).collect();
    for vote in votes {
        *counts.entry(vote.choice).or_default() += 1;
    }
    counts
}

/// `count / total` as a whole percentage, rounded half up. Zero when
/// there is nothing to divide by.
///
/// Integer arithmetic: `floor((200 * count + total) / (2 * total))` is
/// `floor(100 * count / total + 0.5)` without float error.
pub fn percentage(count: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    let count = count as u64;
    let total = total as u64;
    ((200 * count + total) / (2 * total)) as u32
}

/// Correct guesses, earliest first. Nothing is a winner before the
/// outcome is known.
pub fn winners(votes: &[Vote], outcome: Option<Choice>) -> Vec<Vote> {
    let Some(outcome) = outcome else {
        return Vec::new();
    };

    let mut correct: Vec<Vote> = votes
        .iter()
        .filter(|v| v.choice == outcome)
        .cloned()
        .collect();
    correct.sort_by_key(|v| v.submitted_at);
    correct
}

pub fn tally(votes: &[Vote], outcome: Option<Choice>) -> Tally {
    let total = votes.len();
    let choices = counts_by_choice(votes)
        .into_iter()
        .map(|(choice, count)| ChoiceTally {
            choice,
            count,
            percentage: percentage(count, total),
        })
        .collect();

    Tally {
        total,
        choices,
        winners: winners(votes, outcome),
    }
}
