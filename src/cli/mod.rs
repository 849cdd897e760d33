//! Command-line surface over the session model.

pub mod commands;

use clap::{Parser, Subcommand};

/// Oppboard - student opportunity board client
#[derive(Parser)]
#[command(name = "oppboard")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a default config file
    Init,

    /// List featured opportunities
    #[command(alias = "f")]
    Featured,

    /// Search opportunities by keyword and filters
    #[command(alias = "s")]
    Search {
        /// Keyword matched against titles and tags
        keyword: Vec<String>,

        /// Location filter (substring match)
        #[arg(long)]
        location: Option<String>,

        /// Field of study filter
        #[arg(long)]
        field: Option<String>,

        /// Opportunity type filter (internship, thesis, ...)
        #[arg(long = "type")]
        opportunity_type: Option<String>,

        /// Result page to show (1-based)
        #[arg(long, default_value_t = 1)]
        page: usize,
    },

    /// Show full details of one opportunity
    #[command(alias = "i")]
    Show {
        /// Opportunity ID
        id: String,
    },

    /// Create a new account
    Signup,

    /// Verify credentials against the account store
    Login,

    /// Publish an opportunity from a TOML file (company accounts)
    Post {
        /// Path to the opportunity description
        file: String,
    },

    /// Apply to an opportunity, optionally attaching a CV
    Apply {
        /// Opportunity ID to apply to
        opportunity_id: String,

        /// Path to a CV file to attach
        #[arg(long)]
        cv: Option<String>,
    },
}
