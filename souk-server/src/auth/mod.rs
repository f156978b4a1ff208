//! Authentication: JWT tokens, password hashing, request extractors

pub mod extractor;
pub mod jwt;
pub mod password;

pub use extractor::{CurrentUser, Identity, GUEST_ID_HEADER};
pub use jwt::{Claims, JwtConfig, JwtError, JwtService};
pub use password::{hash_password, verify_password};
