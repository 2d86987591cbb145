use common::Song;
use serde::Serialize;

/// Row handed to the presentation layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SongView {
    pub main_artist: String,
    pub song: String,
    pub featuring: String,
    pub duration: String,
    pub year_released: i64,
    pub bpm: i64,
    pub key: String,
    /// Folded artist, title, featuring and key, HTML-escaped.
    pub search_string: String,
}

pub fn present(song: &Song) -> SongView {
    SongView {
        main_artist: song.main_artist.clone(),
        song: song.song.clone(),
        featuring: song.featuring.trim().to_string(),
        duration: song.duration.clone(),
        year_released: song.year_released,
        bpm: song.bpm,
        key: song.key.clone(),
        search_string: escape_html(&search_key(song)),
    }
}

pub fn present_all<'a, I>(songs: I) -> Vec<SongView>
where
    I: IntoIterator<Item = &'a Song>,
{
    songs.into_iter().map(present).collect()
}

/// Unescaped search text: folded artist, title, featuring and key joined by
/// single spaces.
pub fn search_key(song: &Song) -> String {
    let normalized = song.normalized();
    [
        normalized.main_artist.as_str(),
        normalized.song.as_str(),
        normalized.featuring.as_str(),
        normalized.key.as_str(),
    ]
    .join(" ")
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(ch),
        }
    }
    out
}
