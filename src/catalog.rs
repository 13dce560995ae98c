//! Music folder scanning and track name resolution.

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::{AppError, AppResult};
use crate::models::Track;

/// Recognized audio file suffix. Matched case-sensitively.
pub const TRACK_SUFFIX: &str = ".mp3";

/// Check if a file name carries the recognized audio suffix.
pub fn is_track_name(name: &str) -> bool {
    name.ends_with(TRACK_SUFFIX)
}

/// List the tracks directly inside `root`, in directory read order.
///
/// Subdirectories are not descended into. An unreadable root is an error,
/// never an empty catalog.
pub fn list_tracks(root: &Path) -> AppResult<Vec<Track>> {
    let entries = fs::read_dir(root).map_err(|e| {
        AppError::CatalogUnavailable(format!("{}: {}", root.display(), e))
    })?;

    let tracks: Vec<Track> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| !t.is_dir()).unwrap_or(false))
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| is_track_name(name))
        .map(Track::new)
        .collect();

    tracing::debug!(root = %root.display(), count = tracks.len(), "Scanned music folder");
    Ok(tracks)
}

/// Validate an untrusted track name.
///
/// Returns an error unless the name is a single, relative path segment.
pub fn sanitize_track_name(name: &str) -> AppResult<&str> {
    if name.is_empty() {
        return Err(AppError::InvalidTrackName(
            "Track name cannot be empty".to_string(),
        ));
    }

    if name.contains('/') || name.contains('\\') || name.contains('\0') {
        tracing::warn!(track = %name, "Path traversal attempt blocked");
        return Err(AppError::path_traversal(name));
    }

    // Exactly one normal segment: rules out ".", ".." and roots.
    let mut components = Path::new(name).components();
    let single_segment = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if !single_segment {
        tracing::warn!(track = %name, "Path traversal attempt blocked");
        return Err(AppError::path_traversal(name));
    }

    // Drive-relative names, e.g. "C:evil.mp3"
    #[cfg(windows)]
    if name.chars().nth(1) == Some(':') {
        tracing::warn!(track = %name, "Drive-relative track name blocked");
        return Err(AppError::path_traversal(name));
    }

    Ok(name)
}

/// Resolve a track name to its path inside `root`.
pub fn resolve_track_path(root: &Path, name: &str) -> AppResult<PathBuf> {
    let name = sanitize_track_name(name)?;
    Ok(root.join(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn names(tracks: &[Track]) -> Vec<&str> {
        tracks.iter().map(|t| t.name.as_str()).collect()
    }

    #[test]
    fn test_list_tracks_filters_entries() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("one.mp3"), b"x").unwrap();
        fs::write(dir.path().join("two.MP3"), b"x").unwrap();
        fs::write(dir.path().join("cover.jpg"), b"x").unwrap();
        fs::write(dir.path().join("notes"), b"x").unwrap();
        fs::write(dir.path().join(".mp3"), b"x").unwrap();
        fs::create_dir(dir.path().join("album.mp3")).unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("deep.mp3"), b"x").unwrap();

        let tracks = list_tracks(dir.path()).unwrap();
        let mut found = names(&tracks);
        found.sort();

        assert_eq!(found, vec![".mp3", "one.mp3"]);
    }

    #[test]
    fn test_list_tracks_preserves_read_order() {
        let dir = tempdir().unwrap();
        for name in ["c.mp3", "a.mp3", "b.mp3", "skip.txt"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }

        let expected: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .filter(|n| n.ends_with(".mp3"))
            .collect();

        let tracks = list_tracks(dir.path()).unwrap();
        assert_eq!(names(&tracks), expected);
    }

    #[test]
    fn test_list_tracks_empty_folder() {
        let dir = tempdir().unwrap();
        assert!(list_tracks(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_list_tracks_missing_root() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");

        let result = list_tracks(&missing);
        assert!(matches!(result, Err(AppError::CatalogUnavailable(_))));
    }

    #[test]
    fn test_sanitize_track_name_valid() {
        assert!(sanitize_track_name("song.mp3").is_ok());
        assert!(sanitize_track_name("Mi Canción (2023).mp3").is_ok());
        assert!(sanitize_track_name("Wait...What.mp3").is_ok());
        assert!(sanitize_track_name("..intro.mp3").is_ok());
        assert!(sanitize_track_name(".mp3").is_ok());
    }

    #[cfg(not(windows))]
    #[test]
    fn test_sanitize_track_name_allows_colon() {
        assert_eq!(sanitize_track_name("1:Intro.mp3").unwrap(), "1:Intro.mp3");
        assert_eq!(sanitize_track_name("C:song.mp3").unwrap(), "C:song.mp3");
    }

    #[cfg(windows)]
    #[test]
    fn test_sanitize_track_name_drive_prefix() {
        assert!(matches!(
            sanitize_track_name("C:song.mp3"),
            Err(AppError::InvalidTrackName(_))
        ));
    }

    #[test]
    fn test_sanitize_track_name_path_traversal() {
        for name in [
            "../../etc/passwd",
            "..",
            ".",
            "..\\windows\\system32",
            "foo/../bar.mp3",
            "/etc/passwd",
            "dir/song.mp3",
            "song\0.mp3",
        ] {
            assert!(
                matches!(sanitize_track_name(name), Err(AppError::InvalidTrackName(_))),
                "{name} should be rejected"
            );
        }
    }

    #[test]
    fn test_sanitize_track_name_empty() {
        assert!(sanitize_track_name("").is_err());
    }

    #[test]
    fn test_resolve_track_path_stays_in_root() {
        let root = Path::new("/srv/music");
        assert_eq!(
            resolve_track_path(root, "a.mp3").unwrap(),
            PathBuf::from("/srv/music/a.mp3")
        );
        assert!(resolve_track_path(root, "../a.mp3").is_err());
    }

    #[test]
    fn test_is_track_name() {
        assert!(is_track_name("song.mp3"));
        assert!(is_track_name(".mp3"));
        assert!(!is_track_name("song.Mp3"));
        assert!(!is_track_name("song.MP3"));
        assert!(!is_track_name("image.jpg"));
        assert!(!is_track_name("noextension"));
        assert!(!is_track_name("song.mp3.bak"));
    }
}
