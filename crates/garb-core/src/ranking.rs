//! Entry ordering and winner resolution.
//!
//! One total order serves both the voting carousel and the winner pick, so
//! the two can never disagree about which entry is ahead.

use std::cmp::Ordering;

use crate::participation::EntryView;

/// Total order over entries: descending score, then ascending participation
/// time, then ascending participation id.
///
/// UUID `Ord` is byte order, which for the hyphenated lowercase form equals
/// lexicographic order, so the final tie-break is stable across
/// representations.
pub fn entry_order(a: &EntryView, b: &EntryView) -> Ordering {
  b.tally
    .score()
    .cmp(&a.tally.score())
    .then_with(|| a.participation.created_at.cmp(&b.participation.created_at))
    .then_with(|| {
      a.participation
        .participation_id
        .cmp(&b.participation.participation_id)
    })
}

/// Sort entries into display order, best first.
pub fn rank_entries(entries: &mut [EntryView]) { entries.sort_by(entry_order); }

/// The winning entry, or `None` when there are no entries.
///
/// The order is total, so repeated calls over the same slate always pick
/// the same entry.
pub fn winner(entries: &[EntryView]) -> Option<&EntryView> {
  entries.iter().min_by(|a, b| entry_order(a, b))
}

#[cfg(test)]
mod tests {
  use chrono::{DateTime, Duration, Utc};
  use uuid::Uuid;

  use super::*;
  use crate::{
    outfit::Outfit,
    participation::Participation,
    vote::VoteTally,
  };

  fn entry(id: u128, created: DateTime<Utc>, up: u32, down: u32) -> EntryView {
    let outfit_id = Uuid::new_v4();
    EntryView {
      participation: Participation {
        participation_id: Uuid::from_u128(id),
        challenge_id: Uuid::from_u128(1),
        user_id: Uuid::new_v4(),
        outfit_id,
        created_at: created,
      },
      outfit: Outfit {
        outfit_id,
        owner_id: Uuid::new_v4(),
        name: "fixture".into(),
        description: None,
        garments: Vec::new(),
        created_at: created,
      },
      owner: "fixture".into(),
      tally: VoteTally { up, down },
      viewer_vote: None,
    }
  }

  #[test]
  fn orders_by_score_then_age_then_id() {
    let base = Utc::now();
    let newer_five = entry(10, base + Duration::seconds(5), 5, 0);
    let older_five = entry(20, base, 6, 1);
    let low = entry(30, base, 2, 0);

    let mut entries =
      vec![low.clone(), newer_five.clone(), older_five.clone()];
    rank_entries(&mut entries);

    let ids: Vec<_> = entries
      .iter()
      .map(|e| e.participation.participation_id)
      .collect();
    assert_eq!(
      ids,
      vec![
        older_five.participation.participation_id,
        newer_five.participation.participation_id,
        low.participation.participation_id,
      ]
    );
  }

  #[test]
  fn full_tie_falls_back_to_smaller_id() {
    let base = Utc::now();
    let bigger_id = entry(9, base, 3, 0);
    let smaller_id = entry(4, base, 3, 0);

    let entries = vec![bigger_id, smaller_id];
    let won = winner(&entries).unwrap();
    assert_eq!(won.participation.participation_id, Uuid::from_u128(4));
  }

  #[test]
  fn winner_of_empty_slate_is_none() {
    assert!(winner(&[]).is_none());
  }

  #[test]
  fn winner_is_idempotent() {
    let base = Utc::now();
    let entries = vec![
      entry(1, base, 4, 2),
      entry(2, base + Duration::seconds(1), 2, 0),
      entry(3, base + Duration::seconds(2), 2, 0),
    ];
    let first = winner(&entries).unwrap().participation.participation_id;
    for _ in 0..3 {
      assert_eq!(
        winner(&entries).unwrap().participation.participation_id,
        first
      );
    }
  }
}
