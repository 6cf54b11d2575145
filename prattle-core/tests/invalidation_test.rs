use prattle_core::invalidation::InvalidationSignature;

#[test]
fn detects_user_not_found_case_insensitively() {
    assert_eq!(
        InvalidationSignature::detect("User not found"),
        Some(InvalidationSignature::UserNotFound)
    );
    assert_eq!(
        InvalidationSignature::detect("USER NOT FOUND"),
        Some(InvalidationSignature::UserNotFound)
    );
}

#[test]
fn detects_signatures_embedded_in_longer_text() {
    assert_eq!(
        InvalidationSignature::detect("server error: request Unauthorized (401)"),
        Some(InvalidationSignature::Unauthorized)
    );
    assert_eq!(
        InvalidationSignature::detect("oops: Not Logged In, please retry"),
        Some(InvalidationSignature::NotLoggedIn)
    );
}

#[test]
fn plain_transport_failures_do_not_match() {
    assert_eq!(InvalidationSignature::detect("connection reset by peer"), None);
    assert_eq!(InvalidationSignature::detect("timeout while reading body"), None);
    assert_eq!(InvalidationSignature::detect(""), None);
}

#[test]
fn the_signature_set_is_exactly_the_known_phrases() {
    let phrases: Vec<&str> = InvalidationSignature::ALL
        .iter()
        .map(|s| s.phrase())
        .collect();
    assert_eq!(phrases, vec!["user not found", "unauthorized", "not logged in"]);
}
