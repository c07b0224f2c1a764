//! `labctl`: list and synthesize the lab stacks

use anyhow::{bail, Context};
use clap::{Arg, ArgAction, ArgMatches, Command};
use stackgraph_core::Deployment;
use stackgraph_labs::{all_labs, load_config, synthesize, SimulatedProvisioner};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("labctl")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Inspect and synthesize the lab stacks")
        .subcommand_required(true)
        .arg(
            Arg::new("account")
                .long("account")
                .env("LAB_ACCOUNT")
                .global(true)
                .help("12-digit target account"),
        )
        .arg(
            Arg::new("region")
                .long("region")
                .env("LAB_REGION")
                .global(true)
                .help("Target region, e.g. us-east-1"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_parser(clap::value_parser!(PathBuf))
                .global(true)
                .help("TOML file with account and region"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .action(ArgAction::SetTrue)
                .global(true)
                .help("Emit logs as JSON"),
        )
        .subcommand(Command::new("list").about("List stacks and their resolution order"))
        .subcommand(
            Command::new("synth")
                .about("Resolve every stack with the simulated provisioner and print outputs")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn deployment(matches: &ArgMatches) -> anyhow::Result<Deployment> {
    let config = load_config(
        matches.get_one::<String>("account").map(String::as_str),
        matches.get_one::<String>("region").map(String::as_str),
        matches.get_one::<PathBuf>("config").map(PathBuf::as_path),
    )?;
    info!(account = %config.account, region = %config.region, "using stack configuration");
    all_labs(&config).context("declaring lab stacks")
}

fn list(deployment: &Deployment) {
    for stack in deployment.stacks() {
        println!("{} ({} resources)", stack.name(), stack.graph.node_count());
        for (position, id) in stack.graph.resolution_order().iter().enumerate() {
            let kind = stack
                .graph
                .node(id.as_str())
                .map(|node| node.kind().to_string())
                .unwrap_or_default();
            println!("  {:>2}. {id} [{kind}]", position + 1);
        }
    }
}

fn synth(mut deployment: Deployment, as_json: bool) -> anyhow::Result<()> {
    let synthesis = synthesize(&mut deployment, &SimulatedProvisioner::new())
        .context("rendering outputs")?;
    for (stack, cause) in &synthesis.failures {
        error!(%stack, error = %cause, "stack failed to resolve");
    }

    if as_json {
        println!("{}", serde_json::to_string_pretty(&synthesis.to_json())?);
    } else {
        print!("{}", synthesis.to_text());
    }

    synthesis.check()
}

fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("log-json"));

    match matches.subcommand() {
        Some(("list", args)) => {
            list(&deployment(args)?);
            Ok(())
        }
        Some(("synth", args)) => synth(deployment(args)?, args.get_flag("json")),
        _ => bail!("unknown subcommand"),
    }
}
