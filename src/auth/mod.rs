pub mod auth;
pub mod claims;
pub mod error;
pub mod jwt;
pub mod middleware;
