use crate::limits::MAX_CALENDAR_DAYS;
use crate::model::*;

/// Closed-interval overlap: `[a_from, a_to]` and `[b_from, b_to]` share at
/// least one instant. Shared boundaries count.
pub fn overlaps(a_from: Ms, a_to: Ms, b_from: Ms, b_to: Ms) -> bool {
    a_from <= b_to && b_from <= a_to
}

/// First existing booking that clashes with `range`.
pub fn first_conflict<'a>(bookings: &'a [BookingRange], range: &BookingRange) -> Option<&'a BookingRange> {
    bookings.iter().find(|b| b.overlaps(range))
}

pub fn is_day_booked(bookings: &[BookingRange], day: Ms) -> bool {
    bookings.iter().any(|b| b.contains_instant(day))
}

/// Every midnight-UTC day touched by any booking, both end days included.
/// Sorted and de-duplicated. Ranges longer than `MAX_CALENDAR_DAYS` are
/// truncated.
pub fn booked_days(bookings: &[BookingRange]) -> Vec<Ms> {
    let mut days = Vec::new();
    for b in bookings {
        let d = b.to_days();
        let mut day = d.from();
        let mut n = 0;
        while day <= d.to() && n < MAX_CALENDAR_DAYS {
            days.push(day);
            day += DAY_MS;
            n += 1;
        }
    }
    days.sort_unstable();
    days.dedup();
    days
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> Ms {
        parse_instant(s).unwrap()
    }

    fn range(from: &str, to: &str) -> BookingRange {
        BookingRange::new(day(from), day(to)).unwrap()
    }

    #[test]
    fn overlap_is_symmetric() {
        let cases = [
            (0, 10, 5, 15),
            (0, 10, 10, 20),
            (0, 10, 11, 20),
            (5, 6, 0, 100),
            (-50, -10, -10, 0),
        ];
        for (a1, a2, b1, b2) in cases {
            assert_eq!(overlaps(a1, a2, b1, b2), overlaps(b1, b2, a1, a2));
        }
    }

    #[test]
    fn overlap_is_reflexive() {
        for (a, b) in [(0, 0), (0, 10), (-5, 5)] {
            assert!(overlaps(a, b, a, b));
        }
    }

    #[test]
    fn adjacent_days_do_not_overlap() {
        let a = range("2025-01-01", "2025-01-05");
        let b = range("2025-01-06", "2025-01-10");
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
    }

    #[test]
    fn shared_boundary_overlaps() {
        let a = range("2025-01-01", "2025-01-05");
        let b = range("2025-01-05", "2025-01-10");
        assert!(a.overlaps(&b));
    }

    #[test]
    fn containment_overlaps() {
        let outer = range("2025-03-01", "2025-03-31");
        let inner = range("2025-03-10", "2025-03-12");
        assert!(outer.overlaps(&inner));
        assert!(inner.overlaps(&outer));
    }

    #[test]
    fn first_conflict_picks_clashing_booking() {
        let bookings = vec![
            range("2025-03-01", "2025-03-03"),
            range("2025-03-10", "2025-03-15"),
            range("2025-03-14", "2025-03-20"),
        ];
        let hit = first_conflict(&bookings, &range("2025-03-12", "2025-03-13")).unwrap();
        assert_eq!(*hit, bookings[1]);
        assert!(first_conflict(&bookings, &range("2025-03-04", "2025-03-09")).is_none());
        assert!(first_conflict(&[], &range("2025-03-04", "2025-03-09")).is_none());
    }

    #[test]
    fn booked_days_inclusive_and_deduped() {
        let bookings = vec![
            range("2025-03-10", "2025-03-12"),
            range("2025-03-12", "2025-03-13"),
        ];
        let days = booked_days(&bookings);
        assert_eq!(
            days,
            vec![
                day("2025-03-10"),
                day("2025-03-11"),
                day("2025-03-12"),
                day("2025-03-13"),
            ]
        );
    }

    #[test]
    fn booked_days_normalizes_time_of_day() {
        let from = parse_instant("2025-03-10T15:00:00Z").unwrap();
        let to = parse_instant("2025-03-11T09:00:00Z").unwrap();
        let days = booked_days(&[BookingRange::new(from, to).unwrap()]);
        assert_eq!(days, vec![day("2025-03-10"), day("2025-03-11")]);
    }

    #[test]
    fn booked_days_caps_huge_ranges() {
        let b = BookingRange::new(0, DAY_MS * (MAX_CALENDAR_DAYS + 500)).unwrap();
        assert_eq!(booked_days(&[b]).len() as i64, MAX_CALENDAR_DAYS);
    }

    #[test]
    fn day_booked_checks_inclusive_ends() {
        let bookings = vec![range("2025-03-10", "2025-03-15")];
        assert!(is_day_booked(&bookings, day("2025-03-10")));
        assert!(is_day_booked(&bookings, day("2025-03-15")));
        assert!(!is_day_booked(&bookings, day("2025-03-16")));
        assert!(!is_day_booked(&bookings, day("2025-03-09")));
    }
}
