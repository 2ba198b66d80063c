//! Profile search and filtered views
//!
//! Search is a case-insensitive substring match over name, host, username,
//! domain, tags and notes. Matches are ranked by the best field they hit,
//! using a fixed weight table:
//!
//! | match                      | score |
//! |----------------------------|-------|
//! | exact name                 | 100   |
//! | name prefix                | 80    |
//! | name substring             | 60    |
//! | exact host                 | 50    |
//! | host substring             | 40    |
//! | username/domain substring  | 30    |
//! | exact tag                  | 25    |
//! | tag substring              | 20    |
//! | notes substring            | 10    |
//!
//! Ties are broken by name, ascending and case-insensitive.

use super::models::Profile;
use std::cmp::Ordering;

const SCORE_EXACT_NAME: u32 = 100;
const SCORE_NAME_PREFIX: u32 = 80;
const SCORE_NAME_CONTAINS: u32 = 60;
const SCORE_EXACT_HOST: u32 = 50;
const SCORE_HOST_CONTAINS: u32 = 40;
const SCORE_ACCOUNT_CONTAINS: u32 = 30;
const SCORE_EXACT_TAG: u32 = 25;
const SCORE_TAG_CONTAINS: u32 = 20;
const SCORE_NOTES_CONTAINS: u32 = 10;

/// Which subset of profiles a view shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProfileFilter {
    /// Every profile, by name
    #[default]
    All,
    /// Favorites only, by name
    Favorites,
    /// Profiles that have been connected to, most recent first
    Recent,
}

impl ProfileFilter {
    /// Parse a filter name; unknown names select [`ProfileFilter::All`]
    pub fn parse(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "favorites" | "favourites" => Self::Favorites,
            "recent" => Self::Recent,
            _ => Self::All,
        }
    }
}

/// Relevance of `profile` for an already lowercased, non-empty `term`
///
/// Returns `None` when no field matches.
pub fn relevance(profile: &Profile, term: &str) -> Option<u32> {
    let name = profile.name.to_lowercase();
    let host = profile.host.to_lowercase();

    let score = if name == term {
        SCORE_EXACT_NAME
    } else if name.starts_with(term) {
        SCORE_NAME_PREFIX
    } else if name.contains(term) {
        SCORE_NAME_CONTAINS
    } else if host == term {
        SCORE_EXACT_HOST
    } else if host.contains(term) {
        SCORE_HOST_CONTAINS
    } else if profile.username.to_lowercase().contains(term)
        || profile.domain.to_lowercase().contains(term)
    {
        SCORE_ACCOUNT_CONTAINS
    } else if profile.tags.iter().any(|t| t.to_lowercase() == term) {
        SCORE_EXACT_TAG
    } else if profile.tags.iter().any(|t| t.to_lowercase().contains(term)) {
        SCORE_TAG_CONTAINS
    } else if profile.notes.to_lowercase().contains(term) {
        SCORE_NOTES_CONTAINS
    } else {
        return None;
    };

    Some(score)
}

fn by_name(a: &Profile, b: &Profile) -> Ordering {
    a.name
        .to_lowercase()
        .cmp(&b.name.to_lowercase())
        .then_with(|| a.name.cmp(&b.name))
}

/// Profiles matching `term`, best match first
///
/// A blank term matches every profile, ordered by name.
pub fn search<'a, I>(profiles: I, term: &str) -> Vec<&'a Profile>
where
    I: IntoIterator<Item = &'a Profile>,
{
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        let mut all: Vec<&Profile> = profiles.into_iter().collect();
        all.sort_by(|a, b| by_name(a, b));
        return all;
    }

    let mut ranked: Vec<(u32, &Profile)> = profiles
        .into_iter()
        .filter_map(|p| relevance(p, &term).map(|score| (score, p)))
        .collect();
    ranked.sort_by(|(sa, a), (sb, b)| sb.cmp(sa).then_with(|| by_name(a, b)));
    ranked.into_iter().map(|(_, p)| p).collect()
}

/// Profiles selected by `kind`, in that view's order
pub fn filter<'a, I>(profiles: I, kind: ProfileFilter) -> Vec<&'a Profile>
where
    I: IntoIterator<Item = &'a Profile>,
{
    let profiles = profiles.into_iter();
    match kind {
        ProfileFilter::All => {
            let mut all: Vec<&Profile> = profiles.collect();
            all.sort_by(|a, b| by_name(a, b));
            all
        }
        ProfileFilter::Favorites => {
            let mut favorites: Vec<&Profile> = profiles.filter(|p| p.favorite).collect();
            favorites.sort_by(|a, b| by_name(a, b));
            favorites
        }
        ProfileFilter::Recent => {
            let mut recent: Vec<&Profile> = profiles.filter(|p| p.last_used.is_some()).collect();
            recent.sort_by(|a, b| b.last_used.cmp(&a.last_used).then_with(|| by_name(a, b)));
            recent
        }
    }
}

/// The `limit` most recently used profiles
pub fn recent<'a, I>(profiles: I, limit: usize) -> Vec<&'a Profile>
where
    I: IntoIterator<Item = &'a Profile>,
{
    let mut recent = filter(profiles, ProfileFilter::Recent);
    recent.truncate(limit);
    recent
}

/// Apply `kind`, then rank the remaining profiles by `term`
///
/// With a blank term the filter's own order is kept.
pub fn query<'a, I>(profiles: I, kind: ProfileFilter, term: &str) -> Vec<&'a Profile>
where
    I: IntoIterator<Item = &'a Profile>,
{
    let filtered = filter(profiles, kind);
    if term.trim().is_empty() {
        filtered
    } else {
        search(filtered, term)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::sample_profile;
    use chrono::{Duration, Utc};

    fn names(profiles: &[&Profile]) -> Vec<String> {
        profiles.iter().map(|p| p.name.clone()).collect()
    }

    #[test]
    fn test_exact_name_beats_host_substring() {
        let profiles = vec![
            sample_profile("Backup", "server1.internal"),
            sample_profile("Server1", "10.0.0.1"),
        ];

        let results = search(&profiles, "server1");

        assert_eq!(names(&results), vec!["Server1", "Backup"]);
    }

    #[test]
    fn test_score_table_order() {
        let mut tagged_exact = sample_profile("T1", "h1");
        tagged_exact.tags = vec!["db".to_string()];
        let mut tagged_partial = sample_profile("T2", "h2");
        tagged_partial.tags = vec!["dbcluster".to_string()];
        let mut account = sample_profile("A", "h3");
        account.username = "dbadmin".to_string();
        let mut noted = sample_profile("N", "h4");
        noted.notes = "primary db box".to_string();

        let profiles = vec![
            noted,
            tagged_partial,
            account,
            tagged_exact,
            sample_profile("Z", "db"),
            sample_profile("Y", "db.corp"),
            sample_profile("my db", "h5"),
            sample_profile("dbserver", "h6"),
            sample_profile("DB", "h7"),
        ];

        let results = search(&profiles, "DB");

        assert_eq!(
            names(&results),
            vec!["DB", "dbserver", "my db", "Z", "Y", "A", "T1", "T2", "N"]
        );
    }

    #[test]
    fn test_ties_broken_by_name() {
        let profiles = vec![
            sample_profile("web-b", "h"),
            sample_profile("Web-a", "h"),
            sample_profile("web-c", "h"),
        ];

        let results = search(&profiles, "web");

        assert_eq!(names(&results), vec!["Web-a", "web-b", "web-c"]);
    }

    #[test]
    fn test_domain_matches() {
        let mut profile = sample_profile("x", "h");
        profile.domain = "CONTOSO".to_string();
        let profiles = vec![profile];

        assert_eq!(search(&profiles, "contoso").len(), 1);
        assert_eq!(relevance(&profiles[0], "contoso"), Some(SCORE_ACCOUNT_CONTAINS));
    }

    #[test]
    fn test_no_match() {
        let profiles = vec![sample_profile("alpha", "10.0.0.1")];
        assert!(search(&profiles, "zzz").is_empty());
        assert_eq!(relevance(&profiles[0], "zzz"), None);
    }

    #[test]
    fn test_blank_term_returns_all_by_name() {
        let profiles = vec![sample_profile("b", "h"), sample_profile("a", "h")];
        assert_eq!(names(&search(&profiles, "   ")), vec!["a", "b"]);
    }

    #[test]
    fn test_filter_favorites() {
        let mut fav = sample_profile("middle", "h");
        fav.favorite = true;
        let profiles = vec![sample_profile("first", "h"), fav, sample_profile("last", "h")];

        let results = filter(&profiles, ProfileFilter::Favorites);

        assert_eq!(names(&results), vec!["middle"]);
    }

    #[test]
    fn test_filter_recent_descending() {
        let now = Utc::now();
        let mut old = sample_profile("old", "h");
        old.last_used = Some(now - Duration::days(3));
        let mut newest = sample_profile("newest", "h");
        newest.last_used = Some(now);
        let mut mid = sample_profile("mid", "h");
        mid.last_used = Some(now - Duration::hours(5));
        let never = sample_profile("never", "h");
        let profiles = vec![old, never, newest, mid];

        let results = filter(&profiles, ProfileFilter::Recent);

        assert_eq!(names(&results), vec!["newest", "mid", "old"]);
        for pair in results.windows(2) {
            assert!(pair[0].last_used > pair[1].last_used);
        }
    }

    #[test]
    fn test_filter_all_sorted() {
        let profiles = vec![sample_profile("c", "h"), sample_profile("A", "h"), sample_profile("b", "h")];
        assert_eq!(names(&filter(&profiles, ProfileFilter::All)), vec!["A", "b", "c"]);
    }

    #[test]
    fn test_recent_limit() {
        let now = Utc::now();
        let profiles: Vec<Profile> = (0..5)
            .map(|i| {
                let mut p = sample_profile(&format!("p{i}"), "h");
                p.last_used = Some(now - Duration::minutes(i));
                p
            })
            .collect();

        assert_eq!(names(&recent(&profiles, 2)), vec!["p0", "p1"]);
    }

    #[test]
    fn test_query_filters_then_ranks() {
        let mut fav_host = sample_profile("alpha", "prod-db");
        fav_host.favorite = true;
        let mut fav_name = sample_profile("prod", "10.0.0.2");
        fav_name.favorite = true;
        let profiles = vec![fav_host, fav_name, sample_profile("prod-web", "h")];

        let results = query(&profiles, ProfileFilter::Favorites, "prod");

        assert_eq!(names(&results), vec!["prod", "alpha"]);
    }

    #[test]
    fn test_filter_parse() {
        assert_eq!(ProfileFilter::parse("Favorites"), ProfileFilter::Favorites);
        assert_eq!(ProfileFilter::parse(" RECENT "), ProfileFilter::Recent);
        assert_eq!(ProfileFilter::parse("all"), ProfileFilter::All);
        assert_eq!(ProfileFilter::parse("anything"), ProfileFilter::All);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: every search result actually contains the term somewhere
            #[test]
            fn results_contain_term(
                names in prop::collection::vec("[a-z]{1,8}", 1..20),
                term in "[a-z]{1,3}",
            ) {
                let profiles: Vec<Profile> = names
                    .iter()
                    .map(|n| sample_profile(n, "host"))
                    .collect();

                for profile in search(&profiles, &term) {
                    let haystack = format!("{} {}", profile.name, profile.host);
                    prop_assert!(haystack.contains(&term));
                }
            }

            /// Property: search output is sorted by non-increasing relevance
            #[test]
            fn results_sorted_by_relevance(
                names in prop::collection::vec("[a-c]{1,4}", 1..20),
                term in "[a-c]{1,2}",
            ) {
                let profiles: Vec<Profile> = names
                    .iter()
                    .map(|n| sample_profile(n, "h"))
                    .collect();

                let results = search(&profiles, &term);
                let scores: Vec<u32> = results
                    .iter()
                    .filter_map(|p| relevance(p, &term))
                    .collect();
                prop_assert_eq!(scores.len(), results.len());
                prop_assert!(scores.windows(2).all(|w| w[0] >= w[1]));
            }
        }
    }
}
