/// The closed set of error signatures the server uses to signal that the
/// current identity is no longer valid. Matching is substring-based against
/// the lowercased error text, so transport wrappers that prefix or suffix the
/// message still match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidationSignature {
    UserNotFound,
    Unauthorized,
    NotLoggedIn,
}

impl InvalidationSignature {
    pub const ALL: [InvalidationSignature; 3] = [
        InvalidationSignature::UserNotFound,
        InvalidationSignature::Unauthorized,
        InvalidationSignature::NotLoggedIn,
    ];

    pub fn phrase(&self) -> &'static str {
        match self {
            InvalidationSignature::UserNotFound => "user not found",
            InvalidationSignature::Unauthorized => "unauthorized",
            InvalidationSignature::NotLoggedIn => "not logged in",
        }
    }

    /// Tests an error message against the signature set. Returns the first
    /// matching signature, or `None` for errors that do not indicate an
    /// invalidated session (e.g. a plain connection drop).
    pub fn detect(message: &str) -> Option<InvalidationSignature> {
        let normalized = message.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|sig| normalized.contains(sig.phrase()))
    }
}
