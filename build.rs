//! Renders the `feedclient(1)` manual page from the clap definition.

use std::{fs::File, io, path::Path};

use clap::CommandFactory;
use clap_mangen::Man;

#[path = "src/cli.rs"]
mod cli;

fn main() -> io::Result<()> {
    println!("cargo:rerun-if-changed=src/cli.rs");

    let cmd = cli::Cli::command();
    let dir = Path::new("target").join("generated-man");
    std::fs::create_dir_all(&dir)?;
    let mut page = File::create(dir.join(format!("{}.1", cmd.get_name())))?;
    Man::new(cmd).render(&mut page)
}
