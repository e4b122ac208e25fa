//! Reviewer candidate pools and random draws.
//!
//! Pools preserve roster order so a seeded generator always yields the same
//! picks for the same roster.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::domain::team::Team;
use crate::domain::MAX_REVIEWERS;

/// Active members other than the author
pub fn initial_candidates<'a>(team: &'a Team, author_id: &str) -> Vec<&'a str> {
    team.active_members()
        .map(|m| m.user_id.as_str())
        .filter(|id| *id != author_id)
        .collect()
}

/// Active members that are neither the outgoing reviewer, the author, nor
/// already reviewing
pub fn replacement_candidates<'a>(
    team: &'a Team,
    old_user_id: &str,
    author_id: &str,
    current_reviewers: &[String],
) -> Vec<&'a str> {
    team.active_members()
        .map(|m| m.user_id.as_str())
        .filter(|id| *id != old_user_id && *id != author_id)
        .filter(|id| !current_reviewers.iter().any(|r| r == id))
        .collect()
}

/// Picks up to two distinct reviewers for a new pull request
///
/// Pools of zero or one candidate are returned as is. Larger pools yield two
/// distinct members, each unordered pair equally likely, in draw order.
pub fn select_initial_reviewers<R: Rng + ?Sized>(
    team: &Team,
    author_id: &str,
    rng: &mut R,
) -> Vec<String> {
    let pool = initial_candidates(team, author_id);
    if pool.len() < MAX_REVIEWERS {
        return pool.into_iter().map(str::to_string).collect();
    }

    let first = rng.gen_range(0..pool.len());
    let mut second = rng.gen_range(0..pool.len() - 1);
    if second >= first {
        second += 1;
    }

    vec![pool[first].to_string(), pool[second].to_string()]
}

/// Picks one replacement reviewer, or `None` when the pool is empty
pub fn select_replacement_reviewer<R: Rng + ?Sized>(
    team: &Team,
    old_user_id: &str,
    author_id: &str,
    current_reviewers: &[String],
    rng: &mut R,
) -> Option<String> {
    let pool = replacement_candidates(team, old_user_id, author_id, current_reviewers);
    choose(&pool, rng)
}

/// Uniform pick from an arbitrary pool
pub fn choose<R: Rng + ?Sized>(pool: &[&str], rng: &mut R) -> Option<String> {
    pool.choose(rng).map(|id| id.to_string())
}
