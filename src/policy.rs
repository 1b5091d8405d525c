//! Environment mock policy.

use crate::matcher::matches_glob;
use crate::model::{Environment, Mode};

/// Decide whether traffic for `path` should be mocked at all.
///
/// `endpoint_exists` is only consulted in selective mode, where a defined
/// endpoint is the sole authority. Unknown modes never mock.
pub fn should_mock(
    mode: Mode,
    path: &str,
    whitelist: &[String],
    blacklist: &[String],
    endpoint_exists: bool,
) -> bool {
    match mode {
        Mode::Selective => endpoint_exists,
        Mode::Global => true,
        Mode::Whitelist => whitelist.iter().any(|pattern| matches_glob(path, pattern)),
        Mode::Blacklist => !blacklist.iter().any(|pattern| matches_glob(path, pattern)),
        Mode::Unknown => false,
    }
}

/// [`should_mock`] using an environment's own mode and pattern lists.
pub fn environment_allows(environment: &Environment, path: &str, endpoint_exists: bool) -> bool {
    should_mock(
        environment.mode,
        path,
        &environment.whitelist,
        &environment.blacklist,
        endpoint_exists,
    )
}
