use clap::Args;

/// Command to print the envgen version.
#[derive(Args, Debug)]
pub struct VersionCommand {}

impl VersionCommand {
    pub fn execute(self) {
        println!("envgen version {}", env!("CARGO_PKG_VERSION"));
    }
}
