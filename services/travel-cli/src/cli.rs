//! Command-line interface

use clap::{Parser, Subcommand};

/// Travel booking client: one command per run, JSON on stdout.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "travel", author, version, about)]
pub struct Cli {
    /// Config file (overrides CONFIG_PATH, default travel.toml)
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config_path: Option<String>,

    /// Print Prometheus metrics on stderr after the command
    #[arg(long, global = true)]
    pub metrics: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Log in and store the token pair
    Login { username: String, password: String },
    /// Create an account (does not log in)
    Register {
        username: String,
        email: String,
        nickname: String,
        password: String,
    },
    /// Clear stored tokens
    Logout,
    /// Show whether a token is stored
    Whoami,
    /// Search flights
    Flights {
        origin: String,
        destination: String,
        /// YYYY-MM-DD
        depart_date: String,
    },
    /// Airport autocomplete
    Airports { query: String },
    /// Details for a flight offer token
    Details { token: String },
    /// List community posts
    Posts,
    /// Show one post
    Post { id: u64 },
    /// List comments on a post
    Comments { post_id: u64 },
    /// Create a post
    NewPost { title: String, content: String },
    /// Delete a post
    DeletePost { id: u64 },
    /// Comment on a post
    Comment { post_id: u64, content: String },
    /// Delete a comment
    DeleteComment { id: u64 },
    /// Navigate the client router to a path
    Navigate { path: String },
}
