pub mod callback;
pub mod config;
pub mod gate;
pub mod login;
pub mod logout;
pub mod oauth;
