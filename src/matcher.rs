//! Histograms query-token offsets against posted tokens to find the
//! track whose anchors line up most consistently with the query.

use std::collections::HashMap;

use crate::hasher::Token;
use crate::index::Posting;

/// Result of a recognition attempt. `offset` is the winning
/// `db_anchor - query_anchor` bin — the query's position within the
/// matched track, in time-bins — and is `0` when there is no match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub track_id: Option<u32>,
    pub score: u64,
    pub offset: i64,
}

/// Vote on offsets between query anchors and database postings for
/// the same token, then return the track with the largest single
/// histogram bin (ties broken by smallest track id; offset ties for
/// the same track broken by the smallest offset).
pub fn recognise<'a>(
    query_tokens: &[(Token, u32)],
    lookup: impl Fn(Token) -> Option<&'a [Posting]>,
) -> Match {
    // Flat `(track_id, offset)` map rather than nested per-track
    // histograms: one hash lookup per vote instead of two.
    let mut votes: HashMap<(u32, i64), u64> = HashMap::new();

    for &(token, query_anchor) in query_tokens {
        let Some(postings) = lookup(token) else {
            continue;
        };
        for posting in postings {
            let offset = posting.anchor_time as i64 - query_anchor as i64;
            *votes.entry((posting.track_id, offset)).or_insert(0) += 1;
        }
    }

    if votes.is_empty() {
        return Match { track_id: None, score: 0, offset: 0 };
    }

    // (best count, best offset) per track.
    let mut best_per_track: HashMap<u32, (u64, i64)> = HashMap::new();
    for (&(track_id, offset), &count) in &votes {
        let entry = best_per_track.entry(track_id).or_insert((0, offset));
        if count > entry.0 || (count == entry.0 && offset < entry.1) {
            *entry = (count, offset);
        }
    }

    let (best_track, (best_score, best_offset)) = best_per_track
        .into_iter()
        .min_by(|a, b| b.1.0.cmp(&a.1.0).then(a.0.cmp(&b.0)))
        .expect("votes was non-empty");

    Match {
        track_id: Some(best_track),
        score: best_score,
        offset: best_offset,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hasher::Token;

    #[test]
    fn empty_votes_return_no_match() {
        let query: Vec<(Token, u32)> = vec![];
        let result = recognise(&query, |_| None);
        assert_eq!(result, Match { track_id: None, score: 0, offset: 0 });
    }

    #[test]
    fn ties_break_to_smallest_track_id() {
        let token = Token::pack(1, 2, 3);
        let postings = vec![
            Posting { track_id: 5, anchor_time: 10 },
            Posting { track_id: 2, anchor_time: 10 },
        ];
        let query = vec![(token, 0u32)];
        let result = recognise(&query, |t| {
            if t == token { Some(postings.as_slice()) } else { None }
        });
        assert_eq!(result.track_id, Some(2));
        assert_eq!(result.score, 1);
    }

    #[test]
    fn largest_aligned_cluster_wins() {
        let token_a = Token::pack(1, 2, 3);
        let token_b = Token::pack(4, 5, 6);

        // Track 1 has three postings at a consistent offset from the
        // query; track 2 has two postings scattered across offsets.
        let postings_a = vec![
            Posting { track_id: 1, anchor_time: 100 },
            Posting { track_id: 2, anchor_time: 50 },
        ];
        let postings_b = vec![
            Posting { track_id: 1, anchor_time: 110 },
            Posting { track_id: 2, anchor_time: 9999 },
        ];

        let query = vec![(token_a, 10u32), (token_b, 20u32)];
        let result = recognise(&query, |t| {
            if t == token_a {
                Some(postings_a.as_slice())
            } else if t == token_b {
                Some(postings_b.as_slice())
            } else {
                None
            }
        });
        // track 1: offsets 90 and 90 -> cluster of 2. track 2: offsets
        // 40 and 9979 -> cluster of 1 each.
        assert_eq!(result.track_id, Some(1));
        assert_eq!(result.score, 2);
        assert_eq!(result.offset, 90);
    }
}
