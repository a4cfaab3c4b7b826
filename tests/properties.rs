use std::collections::BTreeSet;

use csv_insight::{
    classify::{DomainTag, classify},
    columns::{normalize_header, normalize_headers},
    dashboard::percentage,
};
use proptest::prelude::*;

fn header_strategy() -> impl Strategy<Value = String> {
    "[ A-Za-z0-9._\\-]{0,16}"
}

fn column_set(extra: Vec<String>, required: &[&str]) -> BTreeSet<String> {
    extra
        .into_iter()
        .chain(required.iter().map(|c| c.to_string()))
        .collect()
}

proptest! {
    #[test]
    fn normalizer_preserves_length_and_order(
        headers in proptest::collection::vec(header_strategy(), 0..12)
    ) {
        let normalized = normalize_headers(&headers);
        prop_assert_eq!(normalized.len(), headers.len());
        for (idx, (raw, clean)) in headers.iter().zip(&normalized).enumerate() {
            let expected = match normalize_header(raw) {
                name if name.is_empty() => format!("unnamed_{idx}"),
                name => name,
            };
            prop_assert_eq!(clean, &expected);
        }
    }

    #[test]
    fn normalizer_is_idempotent(
        headers in proptest::collection::vec(header_strategy(), 0..12)
    ) {
        let once = normalize_headers(&headers);
        let twice = normalize_headers(&once);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn netflix_columns_win_regardless_of_extras(
        extra in proptest::collection::vec("[a-z_]{1,12}", 0..10)
    ) {
        let cols = column_set(extra, &["show_id", "type"]);
        prop_assert_eq!(classify(&cols), DomainTag::Netflix);
    }

    #[test]
    fn netflix_precedes_artists(
        extra in proptest::collection::vec("[a-z_]{1,12}", 0..6),
        genre in prop_oneof![Just("genre"), Just("genres")],
    ) {
        let cols = column_set(extra, &["show_id", "type", "followers", genre]);
        prop_assert_eq!(classify(&cols), DomainTag::Netflix);
    }

    #[test]
    fn movie_percentage_stays_in_bounds(total in 0i64..10_000, share in 0.0f64..=1.0) {
        let movies = (total as f64 * share).floor() as i64;
        let pct = percentage(movies, total);
        prop_assert!((0.0..=100.0).contains(&pct));
    }
}

#[test]
fn normalizer_handles_common_headers() {
    assert_eq!(normalize_header("  Release Year "), "release_year");
    assert_eq!(normalize_header("No. of Seasons"), "no_of_seasons");
    assert_eq!(normalize_header("Track Name"), "track_name");
}
