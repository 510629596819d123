//! Partner selection.
//!
//! A linear scan over the waiting pool keeps the first candidate with the
//! strictly greatest number of shared interests. Ties therefore go to the
//! longest-waiting client, and with no overlap at all the oldest waiting
//! client still wins.

use crate::protocol::{ClientId, InterestSet};

use super::pool::WaitingPool;

/// The winning candidate of a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub client_id: ClientId,
    pub shared: usize,
}

/// Pick the best partner for `requester` among the waiting clients.
///
/// `interests_of` resolves a waiting client's declared interests; unknown
/// clients score zero.
pub fn select_partner<'a, F>(
    pool: &WaitingPool,
    requester: &ClientId,
    interests: &InterestSet,
    interests_of: F,
) -> Option<Candidate>
where
    F: Fn(&ClientId) -> Option<&'a InterestSet>,
{
    let mut best: Option<Candidate> = None;

    for candidate_id in pool.iter().filter(|id| *id != requester) {
        let shared = interests_of(candidate_id)
            .map(|candidate| interests.shared_with(candidate))
            .unwrap_or(0);

        if best.is_none_or(|current| shared > current.shared) {
            best = Some(Candidate {
                client_id: *candidate_id,
                shared,
            });
        }
    }

    best
}
