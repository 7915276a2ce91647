use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use lofty::prelude::*;
use lofty::tag::ItemKey;
use walkdir::WalkDir;

use crate::config::LibrarySettings;

use super::display::display_from_fields;
use super::model::{Track, TrackId};

/// Raw metadata pulled from one audio file before ids are assigned.
struct Scanned {
    path: PathBuf,
    title: String,
    artist: Option<String>,
    album: Option<String>,
    duration: Option<Duration>,
}

fn is_audio_file(path: &Path, settings: &LibrarySettings) -> bool {
    let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
        return false;
    };
    let ext = ext.to_ascii_lowercase();
    settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .any(|e| !e.is_empty() && e == ext)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// Pull title/artist/album/duration out of the file's tags. Tag read
/// failures are not errors; the file stem stands in for the title.
fn read_metadata(path: &Path) -> Scanned {
    let mut scanned = Scanned {
        path: path.to_path_buf(),
        title: path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("UNKNOWN")
            .to_string(),
        artist: None,
        album: None,
        duration: None,
    };

    let Ok(tagged) = lofty::read_from_path(path) else {
        return scanned;
    };
    scanned.duration = Some(tagged.properties().duration());

    if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
        let text = |key: ItemKey| {
            tag.get_string(key)
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        if let Some(title) = text(ItemKey::TrackTitle) {
            scanned.title = title;
        }
        scanned.artist = text(ItemKey::TrackArtist);
        scanned.album = text(ItemKey::AlbumTitle);
    }

    scanned
}

/// Scan `dir` for audio files and build the track catalog.
///
/// Tracks are sorted by display string (case-insensitive) and assigned
/// sequential ids afterwards, so ids are stable for a given directory
/// content and settings.
pub fn scan(dir: &Path, settings: &LibrarySettings) -> Vec<Arc<Track>> {
    let mut walker = WalkDir::new(dir).follow_links(settings.follow_links);

    // Non-recursive = only the root directory.
    let depth_cap = if settings.recursive {
        settings.max_depth
    } else {
        Some(1)
    };
    if let Some(d) = depth_cap {
        walker = walker.max_depth(d);
    }

    let mut found: Vec<Scanned> = walker
        .into_iter()
        .filter_entry(|e| settings.include_hidden || e.depth() == 0 || !is_hidden(e.path()))
        .filter_map(Result::ok)
        .filter(|e| {
            let path = e.path();
            path.is_file()
                && (settings.include_hidden || !is_hidden(path))
                && is_audio_file(path, settings)
        })
        .map(|e| read_metadata(e.path()))
        .collect();

    let display_for = |s: &Scanned| {
        display_from_fields(
            &s.path,
            &s.title,
            s.artist.as_deref(),
            s.album.as_deref(),
            &settings.display_fields,
            &settings.display_separator,
        )
    };

    found.sort_by_cached_key(|s| display_for(s).to_lowercase());

    found
        .into_iter()
        .enumerate()
        .map(|(i, s)| {
            let display = display_for(&s);
            let track = Track::new(
                TrackId(i as u64),
                s.path,
                s.title,
                s.artist,
                s.album,
                display,
            );
            if let Some(d) = s.duration {
                track.resolve_duration(d);
            }
            Arc::new(track)
        })
        .collect()
}
