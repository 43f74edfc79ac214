use serde::{Deserialize, Serialize};

/// JWT payload used for authentication.
///
/// `sub` carries the user id as a decimal string; the gate parses it back
/// into an id when resolving the identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user id, decimal string
    pub iat: usize,  // issued at (unix timestamp)
    pub exp: usize,  // expires at (unix timestamp)
}
