use super::Parser;

#[derive(Parser, Debug)]
#[command(name = "warbler", about = "Social-post service backend")]
pub struct Cli {
    /// Settings file path; the extension may be omitted.
    #[arg(long)]
    pub settings: Option<String>,
}
