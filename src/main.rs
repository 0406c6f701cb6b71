use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use spotauth::{cli, config, error};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Authorize with Spotify API
    Auth(AuthOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct AuthOptions {
    #[command(subcommand)]
    pub command: AuthSubcommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum AuthSubcommand {
    /// Log in with the PKCE flow
    Login(LoginOpts),

    /// Resume the flow from a redirect address or a token deep link
    Resume(ResumeOpts),

    /// Show the stored session
    Status,

    /// Forget the stored token and any login in flight
    Logout,
}

#[derive(Parser, Debug, Clone)]
pub struct LoginOpts {
    /// Open the login page as a detached window and wait for the relayed token
    #[clap(long)]
    pub popup: bool,

    /// Scope to request; can be repeated. Defaults to the configured scopes
    #[clap(long = "scope", num_args = 1)]
    pub scopes: Vec<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct ResumeOpts {
    /// Full address, e.g. http://127.0.0.1:8888/callback?code=...
    pub address: String,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    let cli = Cli::parse();

    match cli.command {
        Command::Auth(opt) => match opt.command {
            AuthSubcommand::Login(o) => cli::login(o.popup, o.scopes).await,
            AuthSubcommand::Resume(o) => cli::resume(o.address).await,
            AuthSubcommand::Status => cli::status().await,
            AuthSubcommand::Logout => cli::logout().await,
        },
        Command::Completions(opt) => {
            let mut cmd = Cli::command_for_update();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}
