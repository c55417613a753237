//! Authentication flows and their persistence contracts.

mod memory;
mod service;
mod store;
mod validate;

pub use memory::InMemoryStore;
pub use service::{
    AdminLogin, AuthService, Login, Registration, Session, SignUp, VerifyEmail,
};
pub use store::{OtpStore, RoleStore, UserStore};
