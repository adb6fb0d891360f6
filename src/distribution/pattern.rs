//! Cache behaviour path patterns
//!
//! Patterns follow CDN semantics: `*` matches any run of characters
//! (including `/`), `?` matches exactly one character, everything else is
//! literal and case-sensitive. A single leading `/` is optional on both
//! sides.

use super::plan::CacheBehavior;

/// Find the first behaviour whose pattern matches `path`
pub fn match_behavior<'a>(path: &str, behaviors: &'a [CacheBehavior]) -> Option<&'a CacheBehavior> {
    behaviors.iter().find(|behavior| {
        behavior
            .path_pattern
            .as_deref()
            .is_some_and(|pattern| pattern_matches(pattern, path))
    })
}

/// Check whether a path matches a path pattern
pub fn pattern_matches(pattern: &str, path: &str) -> bool {
    let pattern = pattern.strip_prefix('/').unwrap_or(pattern).as_bytes();
    let path = path.strip_prefix('/').unwrap_or(path).as_bytes();

    let (mut p, mut s) = (0, 0);
    // Position of the last `*` seen and the path index it was tried at
    let mut backtrack: Option<(usize, usize)> = None;

    while s < path.len() {
        match pattern.get(p) {
            Some(b'*') => {
                backtrack = Some((p, s));
                p += 1;
            }
            Some(&c) if c == b'?' || c == path[s] => {
                p += 1;
                s += 1;
            }
            _ => match backtrack {
                Some((star, tried)) => {
                    p = star + 1;
                    s = tried + 1;
                    backtrack = Some((star, s));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|&c| c == b'*')
}
