//! Pure domain types shared by both process roles.

pub mod change;
pub mod document;
pub mod remote_auth;
