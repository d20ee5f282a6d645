pub mod auth;
pub mod run;
