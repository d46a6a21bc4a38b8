mod account_repo;
mod refresh_token_repo;

pub use account_repo::*;
pub use refresh_token_repo::*;
