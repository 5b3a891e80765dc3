//! Setup command handler.
//!
//! Prints the steps needed before `lmbridge serve` can reach the upstream.

use crate::config::BridgeArgs;

const BOLD: &str = "\x1b[1m";
const BLUE: &str = "\x1b[34m";
const RESET: &str = "\x1b[0m";

/// Execute the setup command.
pub fn execute(bridge: &BridgeArgs) {
    println!("{}", setup_instructions(bridge));
}

/// Setup steps for the current options.
pub fn setup_instructions(bridge: &BridgeArgs) -> String {
    let mut out = format!("\n{BOLD}{BLUE}lmbridge setup:{RESET}\n{}\n", "=".repeat(60));

    step(&mut out, 1, "Install the GitHub CLI (https://cli.github.com)");
    step(&mut out, 2, "Sign in, or export a token instead");
    command(&mut out, "gh auth login");
    command(&mut out, "export GITHUB_TOKEN=<personal access token>");
    step(&mut out, 3, "Confirm the upstream answers");
    command(&mut out, &format!("lmbridge --upstream-url {} check", bridge.upstream.upstream_url));
    step(&mut out, 4, "Start the bridge");
    command(&mut out, &format!("lmbridge --port {} serve", bridge.port));
    step(&mut out, 5, "Point OpenAI-compatible clients at");
    command(&mut out, &format!("http://127.0.0.1:{}/v1", bridge.port));

    out
}

fn step(out: &mut String, n: u8, title: &str) {
    out.push_str(&format!("\n{BOLD}{n}. {title}:{RESET}\n"));
}

fn command(out: &mut String, cmd: &str) {
    out.push_str(&format!("  {BLUE}$ {cmd}{RESET}\n"));
}
