//! Outbound path computation.
//!
//! A location ending in `/` strips its prefix and mounts the remainder under
//! the upstream's base path. A location without a trailing `/` forwards the
//! request path untouched, whatever the upstream's base path is.

/// Compute the path sent upstream.
pub fn rewrite_path(request_path: &str, location: &str, upstream_base: &str) -> String {
    if !location.ends_with('/') {
        return request_path.to_string();
    }

    let remainder = request_path.strip_prefix(location).unwrap_or(request_path);
    let base = if upstream_base.is_empty() { "/" } else { upstream_base };
    join_paths(base, remainder)
}

/// Join two path fragments with exactly one `/` between them.
pub fn join_paths(base: &str, rest: &str) -> String {
    let base = base.trim_end_matches('/');
    let rest = rest.trim_start_matches('/');

    match (base.is_empty(), rest.is_empty()) {
        (true, true) => "/".to_string(),
        (true, false) => format!("/{rest}"),
        (false, true) => base.to_string(),
        (false, false) => format!("{base}/{rest}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_location_strips_prefix() {
        assert_eq!(rewrite_path("/api/users", "/api/", ""), "/users");
        assert_eq!(rewrite_path("/api/users", "/api/", "/"), "/users");
        assert_eq!(rewrite_path("/api/users", "/api/", "/v2"), "/v2/users");
        assert_eq!(rewrite_path("/api/users", "/api/", "/v2/"), "/v2/users");
        assert_eq!(rewrite_path("/api/a/b/", "/api/", "/v2"), "/v2/a/b/");
    }

    #[test]
    fn exact_prefix_maps_to_base() {
        assert_eq!(rewrite_path("/api/", "/api/", ""), "/");
        assert_eq!(rewrite_path("/api/", "/api/", "/v2"), "/v2");
        assert_eq!(rewrite_path("/", "/", ""), "/");
    }

    #[test]
    fn no_trailing_slash_passes_through() {
        assert_eq!(rewrite_path("/api/users", "/api", "/v2"), "/api/users");
        assert_eq!(rewrite_path("/api", "/api", ""), "/api");
    }

    #[test]
    fn never_doubles_separators() {
        assert_eq!(join_paths("/v2//", "//users"), "/v2/users");
        assert_eq!(join_paths("", ""), "/");
        assert_eq!(join_paths("/", ""), "/");
        assert_eq!(join_paths("", "users"), "/users");
        assert_eq!(join_paths("/v2", ""), "/v2");
    }
}
