mod account_repo_memory;
mod refresh_token_repo_memory;

pub use account_repo_memory::*;
pub use refresh_token_repo_memory::*;
