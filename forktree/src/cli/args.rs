//! CLI argument definitions

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "forktree",
    version,
    about = "Rebuild the process tree from a fork/exec/exit kernel trace",
    after_help = "\
EXAMPLES:
    forktree dmesg.log                             Print the process tree
    forktree dmesg.log --dump                      Also print every task record
    forktree dmesg.log --export timeline.json      Write a Chrome trace timeline
    RUST_LOG=debug forktree dmesg.log              Show skipped and ignored lines"
)]
pub struct Args {
    /// Trace file with FORK/EXEC/EXIT lines (e.g. saved dmesg output)
    #[arg(value_name = "TRACE")]
    pub trace: PathBuf,

    /// Print every task record after the tree
    #[arg(long)]
    pub dump: bool,

    /// Don't print the process tree
    #[arg(long)]
    pub no_tree: bool,

    /// Export the task timeline in Chrome Trace Event Format
    #[arg(long, value_name = "FILE")]
    pub export: Option<PathBuf>,

    /// Leave kernel threads out of the exported timeline
    #[arg(long, requires = "export")]
    pub hide_kthreads: bool,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,
}
