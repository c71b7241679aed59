//! Resource alternatives of an activity.
//!
//! An alternative is one way to staff an activity: `rooms.count` rooms out
//! of the room candidates and `teachers.count` teachers out of the teacher
//! candidates. The set of alternatives is the Cartesian product of both
//! k-combinations and is produced lazily.

use itertools::Itertools;
use tracing::warn;

use crate::error::{Result, TimetableError};
use crate::models::{Activity, ResourceKind, ResourcePool};

/// Alternative count above which a warning is logged.
pub const ALTERNATIVES_SOFT_CAP: u128 = 10_000;

/// One (room combination, teacher combination) candidate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Alternative {
    pub rooms: Vec<String>,
    pub teachers: Vec<String>,
}

impl Alternative {
    /// Whether this alternative uses exactly the given resources, in any order.
    pub fn matches(&self, rooms: &[String], teachers: &[String]) -> bool {
        same_set(&self.rooms, rooms) && same_set(&self.teachers, teachers)
    }
}

fn same_set(a: &[String], b: &[String]) -> bool {
    a.len() == b.len() && a.iter().all(|x| b.contains(x))
}

fn check_pool(activity: &Activity, pool: &ResourcePool, kind: ResourceKind) -> Result<()> {
    if pool.is_satisfiable() {
        Ok(())
    } else {
        Err(TimetableError::ResourceCountExceedsPool {
            activity: activity.id.clone(),
            resource: kind.plural(),
            requested: pool.count,
            available: pool.candidates.len(),
        })
    }
}

/// Checks both pools and the alternative count of `activity`.
///
/// Fails when a pool cannot supply its count or when the count exceeds
/// `limit`; warns above [`ALTERNATIVES_SOFT_CAP`]. Returns the count.
pub fn check_alternatives(activity: &Activity, limit: Option<u64>) -> Result<u128> {
    check_pool(activity, &activity.rooms, ResourceKind::Room)?;
    check_pool(activity, &activity.teachers, ResourceKind::Teacher)?;

    let count = activity.alternative_count();
    if let Some(limit) = limit.map(u128::from) {
        if count > limit {
            return Err(TimetableError::TooManyAlternatives {
                activity: activity.id.clone(),
                count,
                limit,
            });
        }
    }
    if count > ALTERNATIVES_SOFT_CAP {
        warn!(
            activity = %activity.id,
            alternatives = %count,
            soft_cap = %ALTERNATIVES_SOFT_CAP,
            "large number of resource alternatives",
        );
    }
    Ok(count)
}

/// Lazily enumerates the alternatives of `activity`, rooms varying slowest.
pub fn alternatives(activity: &Activity) -> impl Iterator<Item = Alternative> + '_ {
    let rooms = activity.rooms.candidates.iter().combinations(activity.rooms.count);
    let teachers = activity.teachers.candidates.iter().combinations(activity.teachers.count);
    rooms
        .cartesian_product(teachers)
        .map(|(rooms, teachers)| Alternative {
            rooms: rooms.into_iter().cloned().collect(),
            teachers: teachers.into_iter().cloned().collect(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_rooms_one_teacher() {
        let act = Activity::new("A", "CM", 4)
            .with_rooms(ResourcePool::one_of(["R1", "R2"]))
            .with_teachers(ResourcePool::single("T1"));
        assert_eq!(check_alternatives(&act, None).unwrap(), 2);

        let alts: Vec<Alternative> = alternatives(&act).collect();
        assert_eq!(
            alts,
            vec![
                Alternative { rooms: vec!["R1".into()], teachers: vec!["T1".into()] },
                Alternative { rooms: vec!["R2".into()], teachers: vec!["T1".into()] },
            ]
        );
    }

    #[test]
    fn test_product_of_combinations() {
        let act = Activity::new("A", "TP", 8)
            .with_rooms(ResourcePool::new(["R1", "R2", "R3"], 2))
            .with_teachers(ResourcePool::new(["T1", "T2"], 1));
        let alts: Vec<Alternative> = alternatives(&act).collect();
        assert_eq!(alts.len(), 6);
        assert_eq!(check_alternatives(&act, None).unwrap(), 6);
        assert_eq!(alts[0].rooms, vec!["R1", "R2"]);
        assert_eq!(alts[1].teachers, vec!["T2"]);
        assert_eq!(alts[5].rooms, vec!["R2", "R3"]);
    }

    #[test]
    fn test_empty_pools_give_one_alternative() {
        let act = Activity::new("A", "CM", 4);
        let alts: Vec<Alternative> = alternatives(&act).collect();
        assert_eq!(alts.len(), 1);
        assert!(alts[0].rooms.is_empty());
        assert!(alts[0].teachers.is_empty());
    }

    #[test]
    fn test_count_exceeds_pool() {
        let act = Activity::new("A", "CM", 4).with_teachers(ResourcePool::new(["T1"], 2));
        match check_alternatives(&act, None).unwrap_err() {
            TimetableError::ResourceCountExceedsPool {
                activity,
                resource,
                requested,
                available,
            } => {
                assert_eq!(activity, "A");
                assert_eq!(resource, "teachers");
                assert_eq!(requested, 2);
                assert_eq!(available, 1);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_hard_limit() {
        let act = Activity::new("A", "CM", 4).with_rooms(ResourcePool::one_of(["R1", "R2", "R3"]));
        assert!(check_alternatives(&act, Some(3)).is_ok());
        assert!(matches!(
            check_alternatives(&act, Some(2)),
            Err(TimetableError::TooManyAlternatives { count: 3, limit: 2, .. })
        ));
    }

    #[test]
    fn test_lazy_on_huge_pools() {
        let candidates: Vec<String> = (0..40).map(|i| format!("R{i}")).collect();
        let act = Activity::new("A", "CM", 4).with_rooms(ResourcePool::new(candidates, 20));
        assert!(act.alternative_count() > ALTERNATIVES_SOFT_CAP);
        // Only the first few are ever built.
        assert_eq!(alternatives(&act).take(3).count(), 3);
    }

    #[test]
    fn test_matches_ignores_order() {
        let alt = Alternative {
            rooms: vec!["R1".into(), "R2".into()],
            teachers: vec!["T1".into()],
        };
        let s = |v: &[&str]| v.iter().map(|x| x.to_string()).collect::<Vec<String>>();
        assert!(alt.matches(&s(&["R2", "R1"]), &s(&["T1"])));
        assert!(!alt.matches(&s(&["R1"]), &s(&["T1"])));
        assert!(!alt.matches(&s(&["R1", "R2"]), &[]));
    }
}
