//! Command line surface.

use clap::Parser;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "markly")]
#[command(version)]
#[command(about = "Bookmarks behind Google sign-in")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Sign in with Google in the browser
    Login,
    /// Sign out everywhere
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Load a page URL as the browser would, finishing any sign-in redirect it carries
    Open {
        /// Full URL or a path below the site URL, e.g. "/?code=..."
        url: String,
    },
    /// List your bookmarks, newest first
    List,
    /// Save a bookmark
    Add {
        title: String,
        url: String,

        /// Tag to file it under (default: a random sample tag)
        #[arg(short, long)]
        tag: Option<String>,
    },
    /// Delete a bookmark by id
    Delete { id: Uuid },
}

impl Command {
    /// Subcommand name; arguments may carry redirect tokens and stay out of logs
    pub fn name(&self) -> &'static str {
        match self {
            Command::Login => "login",
            Command::Logout => "logout",
            Command::Whoami => "whoami",
            Command::Open { .. } => "open",
            Command::List => "list",
            Command::Add { .. } => "add",
            Command::Delete { .. } => "delete",
        }
    }
}
