mod cache;
mod errors;
mod token;
mod types;

pub use cache::KeySetCache;
pub use errors::{InvalidTokenReason, JwtError};
pub use token::{generate_jwt, parse_jwt};
pub use types::{Claims, Jwk, Jwks};
