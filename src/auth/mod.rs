pub mod extractors;
pub mod jwt;
pub mod password;

pub use extractors::{authenticate, AuthUser};
pub use jwt::{Claims, TokenError, TokenService, TOKEN_TTL};
pub use password::{hash_password, verify_password};
