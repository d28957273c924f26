//! Unit tests for leaderboard ranking.

use chrono::{Duration, Utc};
use rustfit::leaderboards::rankings::into_leaderboard;
use rustfit::leaderboards::{rank_standings, LeaderboardMetric, LeaderboardScope, Standing};
use uuid::Uuid;

fn standing(user_id: Uuid, value: f64, minutes_ago: Option<i64>) -> Standing {
    Standing {
        user_id,
        value,
        reached_at: minutes_ago.map(|m| Utc::now() - Duration::minutes(m)),
    }
}

#[test]
fn test_ranks_by_value_descending() {
    let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    let ranked = rank_standings(
        vec![standing(a, 10.0, Some(5)), standing(b, 30.0, Some(5)), standing(c, 20.0, Some(5))],
        c,
    );

    let order: Vec<Uuid> = ranked.iter().map(|e| e.user_id).collect();
    assert_eq!(order, vec![b, c, a]);
    assert_eq!(ranked.iter().map(|e| e.rank).collect::<Vec<_>>(), vec![1, 2, 3]);
    assert!(ranked[1].is_current_user);
    assert!(!ranked[0].is_current_user);
}

#[test]
fn test_ties_break_on_earliest_then_user_id() {
    let early = Uuid::new_v4();
    let late = Uuid::new_v4();
    let ranked = rank_standings(
        vec![standing(late, 10.0, Some(1)), standing(early, 10.0, Some(60))],
        early,
    );
    assert_eq!(ranked[0].user_id, early);
    assert_eq!(ranked[1].rank, 2);

    let mut ids = [Uuid::new_v4(), Uuid::new_v4()];
    ids.sort();
    let at = Utc::now();
    let same_time = |id| Standing {
        user_id: id,
        value: 7.0,
        reached_at: Some(at),
    };
    let ranked = rank_standings(vec![same_time(ids[1]), same_time(ids[0])], ids[0]);
    assert_eq!(ranked[0].user_id, ids[0]);
    assert_eq!(ranked[1].user_id, ids[1]);
}

#[test]
fn test_ranking_is_repeatable() {
    let standings: Vec<Standing> = (0..20)
        .map(|i| standing(Uuid::new_v4(), f64::from(i % 4), Some(i64::from(i % 3))))
        .collect();
    let me = standings[3].user_id;

    let first = rank_standings(standings.clone(), me);
    let mut reversed = standings;
    reversed.reverse();
    let second = rank_standings(reversed, me);

    assert_eq!(first, second);
}

#[test]
fn test_zero_activity_is_excluded() {
    let active = Uuid::new_v4();
    let idle = Uuid::new_v4();
    let ranked = rank_standings(vec![standing(idle, 0.0, None), standing(active, 3.0, Some(1))], idle);

    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].user_id, active);
    assert!(ranked.iter().all(|e| !e.is_current_user));
}

#[test]
fn test_limit_keeps_current_user_entry() {
    let me = Uuid::new_v4();
    let mut standings: Vec<Standing> = (1..=5)
        .map(|i| standing(Uuid::new_v4(), f64::from(i * 10), Some(1)))
        .collect();
    standings.push(standing(me, 1.0, Some(1)));

    let board = into_leaderboard(
        LeaderboardScope::Global,
        LeaderboardMetric::Distance,
        rank_standings(standings, me),
        3,
    );

    assert_eq!(board.entries.len(), 3);
    assert_eq!(board.total_participants, 6);
    let mine = board.current_user_entry.unwrap();
    assert_eq!(mine.rank, 6);
    assert_eq!(board.unit, LeaderboardMetric::Distance.unit());
}
