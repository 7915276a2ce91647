use std::path::Path;

use crate::config::TrackDisplayField;

/// Build a track's display string from the configured `fields`, joined
/// by `sep`. Falls back to `title` when every field came up empty.
pub fn display_from_fields(
    path: &Path,
    title: &str,
    artist: Option<&str>,
    album: Option<&str>,
    fields: &[TrackDisplayField],
    sep: &str,
) -> String {
    let nonempty = |s: &str| {
        let s = s.trim();
        (!s.is_empty()).then(|| s.to_string())
    };

    let parts: Vec<String> = fields
        .iter()
        .filter_map(|field| match field {
            TrackDisplayField::Title => nonempty(title),
            TrackDisplayField::Artist => artist.and_then(nonempty),
            TrackDisplayField::Album => album.and_then(nonempty),
            TrackDisplayField::Filename => path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(nonempty),
            TrackDisplayField::Path => Some(path.display().to_string()),
        })
        .collect();

    if parts.is_empty() {
        title.to_string()
    } else {
        parts.join(sep)
    }
}
