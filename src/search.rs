use crate::model::Venue;

/// Candidate stage ahead of the availability pass: venues that fit the
/// party and mention `term` in name, description or city.
///
/// Matching is a case-insensitive substring test. A blank term matches
/// everything. Input order is kept; nothing is ranked.
pub fn filter_candidates(venues: &[Venue], term: &str, guests: u32) -> Vec<Venue> {
    let needle = term.trim().to_lowercase();
    venues
        .iter()
        .filter(|v| v.max_guests >= guests)
        .filter(|v| needle.is_empty() || matches_term(v, &needle))
        .cloned()
        .collect()
}

fn matches_term(venue: &Venue, needle: &str) -> bool {
    let city = venue.location.as_ref().and_then(|l| l.city.as_deref());
    [Some(venue.name.as_str()), venue.description.as_deref(), city]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::VenueLocation;

    fn venue(id: &str, name: &str, city: Option<&str>, max_guests: u32) -> Venue {
        Venue {
            id: id.into(),
            name: name.into(),
            description: None,
            max_guests,
            location: city.map(|c| VenueLocation {
                city: Some(c.into()),
                country: None,
            }),
        }
    }

    fn ids(venues: &[Venue]) -> Vec<&str> {
        venues.iter().map(|v| v.id.as_str()).collect()
    }

    #[test]
    fn guest_count_filters() {
        let venues = vec![venue("a", "Small", None, 2), venue("b", "Big", None, 8)];
        assert_eq!(ids(&filter_candidates(&venues, "", 4)), vec!["b"]);
        assert_eq!(ids(&filter_candidates(&venues, "", 2)), vec!["a", "b"]);
    }

    #[test]
    fn term_matches_name_city_and_description_case_insensitively() {
        let mut lodge = venue("c", "Lodge", None, 4);
        lodge.description = Some("Quiet MOUNTAIN retreat".into());
        let venues = vec![
            venue("a", "Mountain Hut", None, 4),
            venue("b", "Sea View", Some("Mountainville"), 4),
            lodge,
            venue("d", "Beach House", Some("Oslo"), 4),
        ];
        assert_eq!(ids(&filter_candidates(&venues, "mountain", 1)), vec!["a", "b", "c"]);
        assert_eq!(ids(&filter_candidates(&venues, "  OSLO ", 1)), vec!["d"]);
        assert!(filter_candidates(&venues, "desert", 1).is_empty());
    }

    #[test]
    fn blank_term_keeps_order() {
        let venues = vec![venue("z", "Z", None, 1), venue("a", "A", None, 1)];
        assert_eq!(ids(&filter_candidates(&venues, "   ", 1)), vec!["z", "a"]);
    }
}
