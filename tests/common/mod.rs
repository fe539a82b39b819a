//! Shared fixtures: a small track catalogue stored in SQLite.

#![allow(dead_code)]

use sift::prelude::*;

#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub id: i64,
    pub title: Option<String>,
    pub length: Option<f64>,
    pub year: Option<i64>,
}

impl Track {
    pub fn new(id: i64, title: &str, length: Option<f64>, year: Option<i64>) -> Self {
        Self {
            id,
            title: Some(title.to_string()),
            length,
            year,
        }
    }
}

pub static ID: Field<Track> = Field::integer("id", |t| Some(t.id));
pub static TITLE: Field<Track> = Field::text("title", |t| t.title.as_deref());
pub static LENGTH: Field<Track> = Field::real("length", |t| t.length);
pub static YEAR: Field<Track> = Field::integer("year", |t| t.year);
pub static TRACKS: Table<Track> = Table::new("tracks", &[&ID, &TITLE, &LENGTH, &YEAR]);

/// Yields track ids.
pub struct Ids;

impl Selector<Track> for Ids {
    type Output = i64;

    fn table(&self) -> &'static Table<Track> {
        &TRACKS
    }

    fn columns(&self) -> Vec<&'static str> {
        vec!["id"]
    }

    fn project(&self, instance: &Track) -> i64 {
        instance.id
    }

    fn decode(&self, row: &Row) -> QueryResult<i64> {
        row.integer("id")?
            .ok_or_else(|| QueryError::decode("id", "unexpected NULL"))
    }
}

/// Yields whole tracks.
pub struct Tracks;

impl Selector<Track> for Tracks {
    type Output = Track;

    fn table(&self) -> &'static Table<Track> {
        &TRACKS
    }

    fn project(&self, instance: &Track) -> Track {
        instance.clone()
    }

    fn decode(&self, row: &Row) -> QueryResult<Track> {
        Ok(Track {
            id: row
                .integer("id")?
                .ok_or_else(|| QueryError::decode("id", "unexpected NULL"))?,
            title: row.text("title")?,
            length: row.real("length")?,
            year: row.integer("year")?,
        })
    }
}

pub fn catalogue() -> Vec<Track> {
    vec![
        Track::new(1, "Bohemian Rhapsody", Some(354.0), Some(1975)),
        Track::new(2, "Love of My Life", Some(219.5), Some(1975)),
        Track::new(3, "Radio Ga Ga", Some(343.0), Some(1984)),
        Track::new(4, "Untitled", None, None),
        Track {
            id: 5,
            title: None,
            length: Some(2.0),
            year: Some(2),
        },
    ]
}

pub async fn backend_with(tracks: &[Track]) -> SqliteBackend {
    let backend = SqliteBackend::memory().await.unwrap();
    backend.create_table(&TRACKS).await.unwrap();
    backend.insert_all(&TRACKS, tracks).await.unwrap();
    backend
}

/// Ids the backend returns for `filter`, sorted.
pub async fn stored_ids(backend: &SqliteBackend, filter: &Filter<Track>) -> Vec<i64> {
    let mut ids = Query::new(Ids, filter.clone())
        .execute(backend)
        .await
        .unwrap()
        .try_collect_all()
        .await
        .unwrap();
    ids.sort_unstable();
    ids
}

/// Ids the matcher accepts for `filter`, sorted.
pub fn matched_ids(tracks: &[Track], filter: &Filter<Track>) -> Vec<i64> {
    let mut ids: Vec<i64> = tracks
        .iter()
        .filter(|t| filter.matches(t))
        .map(|t| t.id)
        .collect();
    ids.sort_unstable();
    ids
}
