//! Filename sanitization and deterministic artifact naming.
//!
//! Every derived artifact (annotated result, intermediate video, report) is
//! named purely from the sanitized upload name, so a second upload with the
//! same name overwrites the artifacts of the first.

/// Prefix of annotated results: `photo.jpg` -> `pose_photo.jpg`.
pub const RESULT_PREFIX: &str = "pose_";

/// Prefix of the intermediate (pre-transcode) video file.
pub const INTERMEDIATE_PREFIX: &str = "temp_";

/// Suffix replacing the extension of report documents: `photo.jpg` -> `photo_pose.pdf`.
pub const REPORT_SUFFIX: &str = "_pose.pdf";

/// Make a user supplied filename safe for direct filesystem use.
///
/// - non-ASCII characters are dropped
/// - path separators become spaces, then whitespace runs become `_`
/// - anything outside `[A-Za-z0-9_.-]` is dropped
/// - leading and trailing `.` / `_` are trimmed
///
/// The result never contains a path component and may be empty.
///
/// ```
/// use posekit_core::naming::sanitize_filename;
///
/// assert_eq!(sanitize_filename("My cool movie.mov"), "My_cool_movie.mov");
/// assert_eq!(sanitize_filename("../../../etc/passwd"), "etc_passwd");
/// ```
pub fn sanitize_filename(raw: &str) -> String {
    let ascii: String = raw
        .chars()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");

    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();

    kept.trim_matches(|c| c == '.' || c == '_').to_string()
}

/// Lowercased extension of `filename`, including the leading dot.
///
/// Returns an empty string when there is no extension. A name that only
/// starts with dots (`.bashrc`) has no extension.
pub fn extension(filename: &str) -> String {
    let stem_start = filename.len() - filename.trim_start_matches('.').len();
    match filename[stem_start..].rfind('.') {
        Some(idx) => filename[stem_start + idx..].to_ascii_lowercase(),
        None => String::new(),
    }
}

/// Annotated result name for a sanitized upload name.
pub fn result_filename(sanitized: &str) -> String {
    format!("{RESULT_PREFIX}{sanitized}")
}

/// Intermediate video name for a sanitized upload name.
pub fn intermediate_filename(sanitized: &str) -> String {
    format!("{INTERMEDIATE_PREFIX}{sanitized}")
}

/// Report name: the last extension is replaced by [`REPORT_SUFFIX`].
pub fn report_filename(sanitized: &str) -> String {
    let stem = sanitized
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(sanitized);
    format!("{stem}{REPORT_SUFFIX}")
}
