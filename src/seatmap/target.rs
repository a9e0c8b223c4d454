use regex::Regex;
use std::sync::OnceLock;

fn show_url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"showURL=(\d+)").expect("showURL regex is valid"))
}

/// Идентификатор спектакля из параметра `showURL` ссылки на продажу билетов.
pub fn extract_theater_id(url: &str) -> Option<String> {
    show_url_re()
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
