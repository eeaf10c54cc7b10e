/// Resolves a stored article image against the image base URL.
///
/// Absolute `http://` / `https://` images are returned unchanged. Otherwise
/// the image path is joined onto `base_url` with exactly one `/` between
/// them. An empty base leaves the path as stored.
///
/// # Examples
///
/// ```
/// use newsdesk::util::resolve_image_url;
///
/// assert_eq!(
///     resolve_image_url("https://cdn.example.com/", "/images/a.jpg"),
///     "https://cdn.example.com/images/a.jpg"
/// );
/// assert_eq!(
///     resolve_image_url("/static", "https://other.example.com/b.png"),
///     "https://other.example.com/b.png"
/// );
/// ```
pub fn resolve_image_url(base_url: &str, image: &str) -> String {
    if is_absolute(image) || base_url.is_empty() || image.is_empty() {
        return image.to_string();
    }
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        image.trim_start_matches('/')
    )
}

fn is_absolute(image: &str) -> bool {
    let lower = image.get(..8).unwrap_or(image).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}
