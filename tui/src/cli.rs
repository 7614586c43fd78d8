use std::path::PathBuf;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use snitch_diff_client::DiffTarget;
use snitch_diff_client::time::parse_time;

#[derive(Parser, Debug)]
#[command(name = "snitch-diff", version, about = "Browse the diff of an object between two points in time")]
pub struct Cli {
    /// Config file to use instead of ~/.snitch/config.toml.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Diff server base URL; overrides config and environment.
    #[arg(long, global = true, value_name = "URL")]
    pub server: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Interactive tree view.
    View(TargetArgs),

    /// Poll until the diff is complete and print it as a text tree.
    Dump(TargetArgs),

    /// Print the property diff of one node.
    Node(NodeArgs),
}

#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Model of the compared object, e.g. Environment.
    #[arg(long)]
    pub model: String,

    /// Identity of the compared object.
    #[arg(long)]
    pub id: String,

    /// Left time: epoch milliseconds, "YYYY-MM-DD HH:MM:SS" (UTC), or RFC 3339.
    #[arg(long, value_parser = parse_time_arg)]
    pub left: i64,

    /// Right time, same formats as --left.
    #[arg(long, value_parser = parse_time_arg)]
    pub right: i64,
}

impl TargetArgs {
    pub fn target(&self) -> DiffTarget {
        DiffTarget::new(&self.model, &self.id, self.left, self.right)
    }
}

#[derive(Args, Debug, Clone)]
pub struct NodeArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Model of the node to inspect, e.g. Host.
    #[arg(long)]
    pub node_model: String,

    /// Identity of the node to inspect.
    #[arg(long)]
    pub node_id: String,
}

fn parse_time_arg(value: &str) -> Result<i64, String> {
    parse_time(value).map_err(|e| e.to_string())
}
