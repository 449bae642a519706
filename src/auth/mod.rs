// Authentication module
// Session controller and the auth wire types

mod controller;
mod models;

pub use controller::SessionController;
pub use models::{
    unwrap_envelope, ApiEnvelope, AuthPayload, ErrorBody, LoginCredentials, RefreshRequest,
    RefreshedToken, RegisterData,
};
