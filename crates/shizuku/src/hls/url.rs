use url::Url;

use crate::error::{ShizukuError, ShizukuResult};

/// Resolve a uri found in a playlist against the url of that playlist.
///
/// - Absolute urls are returned unchanged.
/// - `/path` is appended to the scheme and host of `base`.
/// - Each leading `../` moves one directory up from the directory of `base`.
/// - Anything else is relative to the directory of `base`.
///
/// The query and fragment of `base` never take part in the resolution, and
/// `../` never climbs above the root of the host.
pub fn resolve(url: &str, base: &str) -> ShizukuResult<String> {
    if has_scheme(url) {
        return Ok(url.to_string());
    }

    if let Some(rest) = url.strip_prefix("//") {
        let base = Url::parse(base)?;
        return Ok(format!("{}://{rest}", base.scheme()));
    }

    if url.starts_with('/') {
        let base = Url::parse(base)?;
        let host = base
            .host_str()
            .ok_or_else(|| ShizukuError::ParseError(format!("{base} has no host")))?;
        return Ok(match base.port() {
            Some(port) => format!("{}://{host}:{port}{url}", base.scheme()),
            None => format!("{}://{host}{url}", base.scheme()),
        });
    }

    if let Some(rest) = url.strip_prefix("../") {
        return resolve(rest, &parent_directory(base));
    }

    Ok(format!("{}{url}", directory(base)))
}

fn has_scheme(url: &str) -> bool {
    url.split_once("://").is_some_and(|(scheme, _)| {
        let mut chars = scheme.chars();
        chars.next().is_some_and(|c| c.is_ascii_alphabetic())
            && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

fn strip_query(base: &str) -> &str {
    base.find(['?', '#']).map_or(base, |end| &base[..end])
}

/// Offset of the first byte of the path, right after `scheme://authority`.
fn path_start(base: &str) -> usize {
    if !has_scheme(base) {
        return 0;
    }
    let authority = base.find("://").map_or(0, |i| i + 3);
    base[authority..]
        .find('/')
        .map_or(base.len(), |i| authority + i)
}

/// Text of `base` up to and including the last `/` of its path.
fn directory(base: &str) -> String {
    let base = strip_query(base);
    let start = path_start(base);
    match base[start..].rfind('/') {
        Some(i) => base[..start + i + 1].to_string(),
        None if start == 0 => String::new(),
        None => format!("{base}/"),
    }
}

fn parent_directory(base: &str) -> String {
    let dir = directory(base);
    let start = path_start(&dir);
    let Some(trimmed) = dir.strip_suffix('/') else {
        return dir;
    };
    if trimmed.len() < start {
        // already at the root of the host
        return dir;
    }
    match trimmed[start..].rfind('/') {
        Some(i) => trimmed[..start + i + 1].to_string(),
        None if start == 0 => String::new(),
        None => dir,
    }
}
