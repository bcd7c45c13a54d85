//! Shell completion generation.

use clap::CommandFactory;
use clap_complete::{generate, Shell};

use crate::cli::args::ShellType;
use crate::error::Result;

/// Handles the `staybook completions <shell>` command.
pub fn handle_completions(shell: ShellType) -> Result<()> {
    let mut cmd = crate::cli::Cli::command();
    let shell = match shell {
        ShellType::Bash => Shell::Bash,
        ShellType::Zsh => Shell::Zsh,
        ShellType::Fish => Shell::Fish,
    };

    generate(shell, &mut cmd, "staybook", &mut std::io::stdout());

    Ok(())
}
