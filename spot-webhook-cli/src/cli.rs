use spot_webhook::HookConfig;
use std::path::PathBuf;

#[derive(clap::Parser, Debug)]
#[clap(name = "spot-webhook")]
pub(crate) struct Args {
    #[clap(flatten)]
    pub(crate) hook: HookConfig,
    #[clap(subcommand)]
    pub(crate) command: Command,
}

#[derive(clap::Subcommand, Debug)]
pub(crate) enum Command {
    /// Runs an AdmissionReview through the hook and prints the response
    Review(Review),
    /// Prints the resource the hook is registered for
    Resource,
}

#[derive(clap::Args, Debug)]
pub(crate) struct Review {
    /// File with AdmissionReview in JSON. Standard input is read if omitted
    #[clap(long)]
    pub(crate) input: Option<PathBuf>,
    /// Assignment table (YAML or JSON map) to use instead of the
    /// cluster ConfigMap. Nothing is written back to the file;
    /// table contents after the review are printed to stderr.
    #[clap(long)]
    pub(crate) table: Option<PathBuf>,
}
