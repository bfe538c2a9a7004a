use crate::HttpStatusCode;

/// **VALUE**: Verifies that both 401 and 419 classify as unauthorized.
///
/// **WHY THIS MATTERS**: Laravel answers a stale CSRF token with 419. Treating it as
/// a generic client error would hide an expired session from the lifecycle manager.
///
/// **BUG THIS CATCHES**: Would catch if 419 is dropped from the unauthorized set.
#[test]
fn given_401_and_419_when_classified_then_both_unauthorized() {
    // GIVEN / WHEN / THEN
    assert!(HttpStatusCode(401).is_unauthorized());
    assert!(HttpStatusCode(419).is_unauthorized());
    assert!(!HttpStatusCode(403).is_unauthorized());
}

/// **VALUE**: Verifies the validation and server ranges do not overlap.
///
/// **WHY THIS MATTERS**: The error taxonomy must place each status in exactly one bucket.
///
/// **BUG THIS CATCHES**: Would catch off-by-one range bugs at 499/500/600.
#[test]
fn given_boundary_codes_when_classified_then_land_in_single_bucket() {
    // GIVEN: Codes around range boundaries
    let validation = HttpStatusCode(422);
    let last_client = HttpStatusCode(499);
    let first_server = HttpStatusCode(500);
    let beyond = HttpStatusCode(600);

    // THEN: Each classification is exclusive
    assert!(validation.is_validation() && validation.is_client_error());
    assert!(!validation.is_server_error());
    assert!(last_client.is_client_error() && !last_client.is_server_error());
    assert!(first_server.is_server_error() && !first_server.is_client_error());
    assert!(!beyond.is_server_error());
    assert!(HttpStatusCode(204).is_success());
}
