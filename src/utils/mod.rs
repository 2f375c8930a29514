use url::Url;

/// Byte count with a binary unit, e.g. `512 B` or `1.5 KB`
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut size = bytes as f64 / 1024.0;
    let mut unit = 0;
    while size >= 1024.0 && unit + 1 < UNITS.len() {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", size, UNITS[unit])
}

/// Media length as a clock reading: `m:ss`, or `h:mm:ss` past the hour
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let (hours, minutes, secs) = (total / 3600, total / 60 % 60, total % 60);

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

/// Format a cue timestamp as `HH:MM:SS<sep>mmm`; SRT uses `,`, WebVTT uses `.`
pub fn format_timestamp(seconds: f64, separator: char) -> String {
    let total_millis = (seconds.max(0.0) * 1000.0).round() as u64;
    let hours = total_millis / 3_600_000;
    let minutes = (total_millis % 3_600_000) / 60_000;
    let secs = (total_millis % 60_000) / 1000;
    let millis = total_millis % 1000;

    format!("{:02}:{:02}:{:02}{}{:03}", hours, minutes, secs, separator, millis)
}

/// Make a file name component portable: ASCII letters, digits, `.`, `-` and `_` are kept,
/// anything else (path separators included) becomes `_`
pub fn sanitize_filename(component: &str) -> String {
    component
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect()
}

/// Extract domain from URL for display purposes
pub fn extract_domain(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()?
        .host_str()
        .map(|host| host.strip_prefix("www.").unwrap_or(host).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(512), "512 B");
        assert_eq!(format_file_size(1024), "1.0 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(1048576), "1.0 MB");
        assert_eq!(format_file_size(5 * 1024_u64.pow(5)), "5120.0 TB");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0.0), "0:00");
        assert_eq!(format_duration(200.4), "3:20");
        assert_eq!(format_duration(3723.0), "1:02:03");
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0.0, ','), "00:00:00,000");
        assert_eq!(format_timestamp(61.5, ','), "00:01:01,500");
        assert_eq!(format_timestamp(3723.042, '.'), "01:02:03.042");
        assert_eq!(format_timestamp(-1.0, '.'), "00:00:00.000");
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("pt-BR"), "pt-BR");
        assert_eq!(sanitize_filename("abc_DEF-123"), "abc_DEF-123");
        assert_eq!(sanitize_filename("a/b\\c d"), "a_b_c_d");
        assert_eq!(sanitize_filename("vidé"), "vid_");
    }

    #[test]
    fn test_extract_domain() {
        assert_eq!(extract_domain("https://www.youtube.com/watch?v=123"), Some("youtube.com".to_string()));
        assert_eq!(extract_domain("https://example.com/"), Some("example.com".to_string()));
        assert_eq!(extract_domain("invalid-url"), None);
    }
}
