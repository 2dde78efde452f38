//! Authentication, 2FA, password, and session endpoints.

mod cookies;
mod device;
pub mod error;
pub mod login;
pub mod password;
pub mod principal;
pub mod refresh;
pub mod register;
pub mod sessions;
mod storage;
pub mod two_factor;
pub mod types;

pub use principal::{AdminUser, CurrentUser, OptionalUser, SystemUser};
