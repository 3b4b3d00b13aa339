use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    #[arg(
        short = 's',
        long = "stdout",
        action,
        help = "Controls if it logs to stdout/stderr instead of to a file"
    )]
    pub is_to_std_out: bool,

    #[arg(
        long = "server",
        value_name = "URL",
        help = "Address of the API including the path prefix, for example http://localhost:8000/api"
    )]
    pub server_url: Option<String>,
}
