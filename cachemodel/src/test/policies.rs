use crate::error::CacheError;
use crate::metrics::{MissKind, Outcome};
use crate::replacement_policies::{
    FirstInFirstOut, LeastRecentlyUsed, NoPolicy, NotMostRecentlyUsed, RandomPolicy,
    ReplacementPolicy, ReplacementPolicyKind, Unimplemented,
};

const MISS: Outcome = Outcome::Miss(MissKind::Compulsory);

#[test]
fn lru_initial_victim_is_way_zero() {
    let mut policy = LeastRecentlyUsed::new(1, 4);
    assert_eq!(policy.ranks(0), Some(&[0, 1, 2, 3][..]));
    assert_eq!(policy.get_victim(0), Ok(0));
}

#[test]
fn lru_sequential_access_reorders() {
    let mut policy = LeastRecentlyUsed::new(1, 4);
    policy.update_on_access(0, 0, MISS);
    assert_eq!(policy.ranks(0), Some(&[3, 0, 1, 2][..]));
    policy.update_on_access(0, 1, MISS);
    policy.update_on_access(0, 2, MISS);
    policy.update_on_access(0, 3, MISS);
    assert_eq!(policy.ranks(0), Some(&[0, 1, 2, 3][..]));
    assert_eq!(policy.get_victim(0), Ok(0));

    // Re-access 0, promotes it to MRU
    policy.update_on_access(0, 0, Outcome::Hit);
    assert_eq!(policy.ranks(0), Some(&[3, 0, 1, 2][..]));
    assert_eq!(policy.get_victim(0), Ok(1));
}

#[test]
fn lru_access_to_the_most_recent_way_changes_nothing() {
    let mut policy = LeastRecentlyUsed::new(1, 4);
    policy.update_on_access(0, 3, Outcome::Hit);
    assert_eq!(policy.ranks(0), Some(&[0, 1, 2, 3][..]));
    policy.update_on_access(0, 2, Outcome::Hit);
    policy.update_on_access(0, 2, Outcome::Hit);
    assert_eq!(policy.ranks(0), Some(&[0, 1, 3, 2][..]));
}

#[test]
fn lru_sets_are_independent() {
    let mut policy = LeastRecentlyUsed::new(2, 2);
    policy.update_on_access(1, 0, MISS);
    assert_eq!(policy.ranks(0), Some(&[0, 1][..]));
    assert_eq!(policy.ranks(1), Some(&[1, 0][..]));
    assert_eq!(policy.get_victim(0), Ok(0));
    assert_eq!(policy.get_victim(1), Ok(1));
    policy.clear();
    assert_eq!(policy.ranks(1), Some(&[0, 1][..]));
    assert_eq!(policy.ranks(2), None);
}

#[test]
fn fifo_advances_on_misses_only() {
    let mut policy = FirstInFirstOut::new(2, 3);
    policy.update_on_access(0, 0, Outcome::Hit);
    assert_eq!(policy.get_victim(0), Ok(0));
    policy.update_on_access(0, 0, MISS);
    policy.update_on_access(0, 1, Outcome::Miss(MissKind::Conflict));
    assert_eq!(policy.oldest(0), Some(2));
    // Wraps around
    policy.update_on_access(0, 2, Outcome::Miss(MissKind::Capacity));
    assert_eq!(policy.get_victim(0), Ok(0));
    assert_eq!(policy.oldest(1), Some(0));
    assert_eq!(policy.oldest(2), None);
}

#[test]
fn nmru_points_past_the_last_access() {
    let mut policy = NotMostRecentlyUsed::new(1, 4);
    assert_eq!(policy.get_victim(0), Ok(0));
    policy.update_on_access(0, 1, Outcome::Hit);
    assert_eq!(policy.get_victim(0), Ok(2));
    policy.update_on_access(0, 3, MISS);
    assert_eq!(policy.next_victim(0), Some(0));
    policy.clear();
    assert_eq!(policy.next_victim(0), Some(0));
    assert_eq!(policy.next_victim(1), None);
}

#[test]
fn random_victims_are_in_range_and_repeatable() {
    let mut policy = RandomPolicy::new(4, 7);
    let victims: Vec<usize> = (0..64).map(|_| policy.get_victim(0).unwrap()).collect();
    assert!(victims.iter().all(|way| *way < 4));
    // Every way gets picked at some point
    assert!((0..4).all(|way| victims.contains(&way)));

    policy.clear();
    let replay: Vec<usize> = (0..64).map(|_| policy.get_victim(0).unwrap()).collect();
    assert_eq!(victims, replay);
}

#[test]
fn random_zero_seed_still_generates() {
    let mut policy = RandomPolicy::new(8, 0);
    let victims: Vec<usize> = (0..32).map(|_| policy.get_victim(0).unwrap()).collect();
    assert!(victims.iter().any(|way| *way != victims[0]));
}

#[test]
fn no_policy_always_picks_the_only_way() {
    let mut policy = NoPolicy;
    assert_eq!(policy.get_victim(12), Ok(0));
    assert_eq!(policy.kind(), ReplacementPolicyKind::None);
}

#[test]
fn unimplemented_policy_has_no_victim() {
    let mut policy = Unimplemented(ReplacementPolicyKind::Plru);
    assert_eq!(
        policy.get_victim(0),
        Err(CacheError::UnimplementedPolicy(ReplacementPolicyKind::Plru))
    );
}

#[test]
fn policy_names_parse_in_either_case() {
    let lower: ReplacementPolicyKind = serde_json::from_str("\"lru\"").unwrap();
    let upper: ReplacementPolicyKind = serde_json::from_str("\"NMRU\"").unwrap();
    assert_eq!(lower, ReplacementPolicyKind::Lru);
    assert_eq!(upper, ReplacementPolicyKind::Nmru);
    assert_eq!(ReplacementPolicyKind::Fifo.to_string(), "FIFO");
}
