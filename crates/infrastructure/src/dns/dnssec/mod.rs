mod crypto;
mod trust_anchor;
mod validator;

pub use crypto::{key_tag, SignatureVerifier};
pub use trust_anchor::{TrustAnchor, TrustAnchorStore};
pub use validator::DnssecValidator;
