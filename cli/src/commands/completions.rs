//! Shell completions generation command.

use std::io::Write as _;

use clap::CommandFactory as _;
use clap_complete::{Generator, Shell};

use crate::cli::Cli;

/// Print completions for `shell` to stdout.
pub fn generate_completions(shell: Shell) {
    let mut stdout = std::io::stdout();
    write_completions(shell, &mut stdout);
    stdout.flush().ok();
}

fn write_completions<G: Generator>(generator: G, buf: &mut dyn std::io::Write) {
    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_owned();
    clap_complete::generate(generator, &mut cmd, bin_name, buf);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bash_completions_mention_subcommands() {
        let mut buf = Vec::new();
        write_completions(Shell::Bash, &mut buf);
        let script = String::from_utf8(buf).expect("completions are utf-8");

        assert!(script.contains("storedesk"), "binary name missing");
        assert!(script.contains("set-status"), "users subcommands missing");
    }
}
