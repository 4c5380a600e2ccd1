use deunicode::deunicode;
use reqwest::Url;

/// Placeholder used when a title has no character usable in a file name.
pub const UNKNOWN_FILENAME: &str = "Unknown";

/// Turns a video title into a file name: transliterated to ascii, lowercased,
/// and every run of other characters collapsed into a single `_`.
pub fn sanitize_title(title: &str) -> String {
    let ascii = deunicode(title).to_lowercase();
    let result = ascii
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("_");

    if result.is_empty() {
        UNKNOWN_FILENAME.to_string()
    } else {
        result
    }
}

/// Directory part of `url`, always ending with `/`, without query and fragment.
pub fn base_path(url: &Url) -> Url {
    let mut base = url.clone();
    base.set_query(None);
    base.set_fragment(None);

    let path = base.path();
    if !path.ends_with('/') {
        let directory = match path.rfind('/') {
            Some(index) => path[..=index].to_string(),
            None => "/".to_string(),
        };
        base.set_path(&directory);
    }
    base
}

/// Appends the missing trailing `/` of a directory url.
///
/// `Url::join` drops the last path segment of a base without it, so
/// `https://cdn/hls` joined with `a.ts` would become `https://cdn/a.ts`.
pub fn with_trailing_slash(url: &Url) -> Url {
    let mut url = url.clone();
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
