//! Validation helpers for DTOs.

use validator::ValidationError;

/// Longest clip URL the backend accepts.
const MAX_URL_LENGTH: usize = 2048;

/// Validates that a clip URL is an absolute http(s) URL of sane length.
///
/// # Examples
///
/// ```ignore
/// validate_video_url("https://clips.example/a.mp4") // Ok
/// validate_video_url("ftp://clips.example/a.mp4")   // Err - scheme
/// validate_video_url("https://")                    // Err - no host
/// ```
pub fn validate_video_url(url: &str) -> Result<(), ValidationError> {
    if url.len() > MAX_URL_LENGTH {
        let mut err = ValidationError::new("video_url_length");
        err.message = Some(
            format!(
                "Video URL must be at most {MAX_URL_LENGTH} characters (got {})",
                url.len()
            )
            .into(),
        );
        return Err(err);
    }

    let remainder = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));

    let Some(remainder) = remainder else {
        let mut err = ValidationError::new("video_url_scheme");
        err.message = Some("Video URL must start with http:// or https://".into());
        return Err(err);
    };

    if remainder.is_empty() || remainder.starts_with('/') {
        let mut err = ValidationError::new("video_url_host");
        err.message = Some("Video URL must include a host".into());
        return Err(err);
    }

    if url.chars().any(char::is_whitespace) {
        let mut err = ValidationError::new("video_url_whitespace");
        err.message = Some("Video URL must not contain whitespace".into());
        return Err(err);
    }

    Ok(())
}
