//! Dataset domain detection.
//!
//! Classification is an ordered rule table evaluated top to bottom; the first
//! rule whose predicate holds decides the tag. The order is a precedence
//! policy: a file carrying both Netflix and Spotify-artist columns is Netflix.

use std::{collections::BTreeSet, fmt};

use log::info;
use serde::Serialize;

use crate::{error::InsightError, store::AnalyticalStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DomainTag {
    Netflix,
    SpotifyArtists,
    SpotifyTracks,
    Unknown,
}

impl DomainTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            DomainTag::Netflix => "NETFLIX",
            DomainTag::SpotifyArtists => "SPOTIFY_ARTISTS",
            DomainTag::SpotifyTracks => "SPOTIFY_TRACKS",
            DomainTag::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for DomainTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct ClassificationRule {
    pub tag: DomainTag,
    pub predicate: fn(&BTreeSet<String>) -> bool,
}

pub const RULES: &[ClassificationRule] = &[
    ClassificationRule {
        tag: DomainTag::Netflix,
        predicate: is_netflix,
    },
    ClassificationRule {
        tag: DomainTag::SpotifyArtists,
        predicate: is_spotify_artists,
    },
    ClassificationRule {
        tag: DomainTag::SpotifyTracks,
        predicate: is_spotify_tracks,
    },
];

fn is_netflix(cols: &BTreeSet<String>) -> bool {
    cols.contains("show_id") && cols.contains("type")
}

fn is_spotify_artists(cols: &BTreeSet<String>) -> bool {
    cols.contains("followers") && (cols.contains("genres") || cols.contains("genre"))
}

fn is_spotify_tracks(cols: &BTreeSet<String>) -> bool {
    cols.contains("danceability") && cols.contains("energy")
}

pub fn classify(columns: &BTreeSet<String>) -> DomainTag {
    RULES
        .iter()
        .find(|rule| (rule.predicate)(columns))
        .map(|rule| rule.tag)
        .unwrap_or(DomainTag::Unknown)
}

pub fn classify_store(store: &AnalyticalStore) -> Result<DomainTag, InsightError> {
    let columns = store.column_names()?;
    let tag = classify(&columns);
    info!("Classified table with {} column(s) as {tag}", columns.len());
    Ok(tag)
}
