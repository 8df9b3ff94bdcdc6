//! Cookie string lookup

use percent_encoding::percent_decode_str;

/// Value of cookie `name` in a `a=1; b=2` cookie string, percent-decoded
#[must_use]
pub fn read_cookie(cookies: &str, name: &str) -> Option<String> {
    cookies
        .split(';')
        .map(str::trim)
        .find_map(|pair| pair.strip_prefix(name)?.strip_prefix('='))
        .map(|raw| percent_decode_str(raw).decode_utf8_lossy().into_owned())
}
