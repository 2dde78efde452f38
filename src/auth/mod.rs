//! Domain leaves of the authentication subsystem: password hashing, the
//! signed token codec, the TOTP engine with backup codes, and role
//! normalization. Everything here is pure with respect to the database.

pub mod password;
pub mod role;
pub mod token;
pub mod totp;
