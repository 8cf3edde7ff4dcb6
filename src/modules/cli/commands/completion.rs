//! Hidden command to generate shell completions.

use clap::{Args, CommandFactory};
use clap_complete::{generate, Shell};

/// Generate shell completion scripts.
///
/// Hidden from normal `--help` output; installers and packaging scripts call it.
#[derive(Args, Debug)]
pub struct CompletionCommand {
    /// Shell to generate completions for (e.g. bash, zsh)
    #[arg(value_enum)]
    pub shell: Shell,
}

impl CompletionCommand {
    pub fn execute(&self) {
        let mut cmd = crate::Cli::command();
        generate(self.shell, &mut cmd, "portico", &mut std::io::stdout());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_script_names_subcommands() {
        let mut cmd = crate::Cli::command();
        let mut out = Vec::new();
        generate(Shell::Bash, &mut cmd, "portico", &mut out);
        let script = String::from_utf8(out).unwrap();
        assert!(script.contains("check"));
        assert!(script.contains("dump"));
    }
}
