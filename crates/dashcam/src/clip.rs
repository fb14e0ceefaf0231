//! Clip file naming.
//!
//! Clips are named `dashcam_<yyyyMMdd_HHmmss>_<position>.mp4`, where the
//! position text has its spaces and commas replaced with underscores so the
//! name is filesystem-safe. The retention pass only ever considers files
//! matching this shape.

use std::path::Path;

use chrono::{DateTime, Local};

/// Prefix shared by every clip file.
pub const CLIP_PREFIX: &str = "dashcam_";

/// Extension used for every clip file (MPEG-4 container).
pub const CLIP_EXTENSION: &str = "mp4";

/// Timestamp format embedded in clip names.
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Sanitize position text for filename embedding.
///
/// Spaces and commas are the separators produced by the position formatter;
/// both are replaced with underscores.
#[must_use]
pub fn sanitize_position(text: &str) -> String {
    text.replace([' ', ','], "_")
}

/// Build a clip filename from a timestamp and position text.
#[must_use]
pub fn clip_file_name(at: DateTime<Local>, position_text: &str) -> String {
    format!(
        "{CLIP_PREFIX}{}_{}.{CLIP_EXTENSION}",
        at.format(TIMESTAMP_FORMAT),
        sanitize_position(position_text)
    )
}

/// Check whether a path looks like a clip file this crate produced.
#[must_use]
pub fn is_clip_file(path: &Path) -> bool {
    let has_extension = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(CLIP_EXTENSION));
    let has_prefix = path
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with(CLIP_PREFIX));
    has_extension && has_prefix
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::{PositionFix, NO_FIX_TEXT};
    use chrono::TimeZone;
    use std::path::PathBuf;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 3, 14, 15, 9, 26).unwrap()
    }

    #[test]
    fn test_sanitize_replaces_spaces_and_commas() {
        assert_eq!(sanitize_position("GPS: 1.0, 2.0"), "GPS:_1.0__2.0");
    }

    #[test]
    fn test_sanitize_leaves_clean_text_alone() {
        assert_eq!(sanitize_position("GPS:_1.0__2.0"), "GPS:_1.0__2.0");
    }

    #[test]
    fn test_clip_file_name_format() {
        let fix = PositionFix::new(52.52001, 13.40495);
        let name = clip_file_name(fixed_time(), &fix.text());
        assert_eq!(name, "dashcam_20260314_150926_GPS:_52.52001__13.40495.mp4");
    }

    #[test]
    fn test_clip_file_name_has_no_spaces_or_commas() {
        let fix = PositionFix::new(-12.34567, 76.54321);
        let name = clip_file_name(fixed_time(), &fix.text());
        assert!(!name.contains(' '));
        assert!(!name.contains(','));
    }

    #[test]
    fn test_clip_file_name_with_placeholder() {
        // No fix has ever been received: the literal placeholder is embedded
        // with its separators converted to underscores.
        let name = clip_file_name(fixed_time(), NO_FIX_TEXT);
        assert_eq!(name, "dashcam_20260314_150926_GPS:_--_--.mp4");
    }

    #[test]
    fn test_is_clip_file_accepts_own_output() {
        let name = clip_file_name(fixed_time(), NO_FIX_TEXT);
        assert!(is_clip_file(&PathBuf::from(name)));
    }

    #[test]
    fn test_is_clip_file_rejects_other_files() {
        assert!(!is_clip_file(Path::new("notes.txt")));
        assert!(!is_clip_file(Path::new("holiday.mp4")));
        assert!(!is_clip_file(Path::new("dashcam_20260314.srt")));
    }

    #[test]
    fn test_is_clip_file_extension_case_insensitive() {
        assert!(is_clip_file(Path::new("dashcam_20260314_150926_x.MP4")));
    }
}
