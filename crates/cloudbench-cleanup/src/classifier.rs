//! Not-found classification of remote errors.

use cloudbench_core::CloudError;

/// Service fault codes that mean "no such resource".
const NOT_FOUND_CODES: &[&str] = &[
    "404",
    "NotFound",
    "itemNotFound",
    "ResourceNotFound",
    "HTTPNotFound",
];

/// Returns true when `error` says the addressed resource does not exist.
///
/// Deleting something that is already gone counts as success, so both the
/// delete loop and the status check rely on this.
#[must_use]
pub fn is_not_found(error: &CloudError) -> bool {
    match error {
        CloudError::NotFound { .. } => true,
        CloudError::Http { status, .. } => *status == 404,
        CloudError::Api { code, .. } => NOT_FOUND_CODES
            .iter()
            .any(|known| code.eq_ignore_ascii_case(known)),
        CloudError::Unavailable(_) | CloudError::Transport(_) => false,
    }
}
