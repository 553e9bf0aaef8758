//! Command line definition

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "meme_folder", version, about = "Browse, tag and preview meme folders")]
pub struct Cli {
    /// Config file (defaults to the platform config dir)
    #[arg(long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Debug logging on stderr
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List a folder: subfolders first, then the assets passing the tag filter
    Ls {
        /// Folder to list (defaults to the last opened folder, then home)
        #[arg(value_hint = clap::ValueHint::DirPath)]
        path: Option<String>,
        /// Only show assets carrying this tag (can be repeated)
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Match any selected tag instead of all of them
        #[arg(long)]
        union: bool,
        /// Only show assets without tags
        #[arg(long)]
        untagged: bool,
    },
    /// Print the parent of a path
    Parent { path: String },
    /// Show the tags of every asset in a folder
    Tags {
        #[arg(value_hint = clap::ValueHint::DirPath)]
        folder: String,
    },
    /// Add or remove an asset tag
    Tag {
        #[command(subcommand)]
        command: TagCommands,
    },
    /// Show or manage favorite folders
    Fav {
        #[command(subcommand)]
        command: FavCommands,
    },
    /// Load previews of every asset in a folder and report their state
    Preview {
        #[arg(value_hint = clap::ValueHint::DirPath)]
        folder: String,
    },
    /// Watch a folder and relist it on change
    Watch {
        #[arg(value_hint = clap::ValueHint::DirPath)]
        folder: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum TagCommands {
    Add { folder: String, asset: String, tag: String },
    #[command(alias = "remove")]
    Rm { folder: String, asset: String, tag: String },
}

#[derive(Subcommand, Debug)]
pub enum FavCommands {
    List,
    Add { path: String },
    #[command(alias = "remove")]
    Rm { path: String },
}
