use url::Url;

/// Renders `url` without its user-info.
///
/// Every URL that ends up in a response body or a log line goes through here.
pub fn redacted(url: &Url) -> String {
    let mut url = url.clone();
    // Both calls only fail for cannot-be-a-base URLs, which carry no user-info.
    let _ = url.set_username("");
    let _ = url.set_password(None);
    url.to_string()
}
