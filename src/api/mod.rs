mod gate;
pub mod public;
pub mod routes;
mod server;
mod state;

pub use gate::{AUTH_COOKIE, AUTH_COOKIE_VALUE};
pub use server::{app, serve};
pub use state::AppState;
