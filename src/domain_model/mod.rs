mod account;
mod refresh_token;

pub use account::*;
pub use refresh_token::*;
