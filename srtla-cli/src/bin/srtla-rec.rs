//! srtla-rec - SRT transport proxy with link aggregation, receiver side.
//!
//! Accepts SRTLA connection groups on a UDP listening port and relays each
//! group's traffic to a single SRT server, fanning acknowledgements back
//! across every path of the group.

use anyhow::Context;
use clap::Parser;
use srtla_cli::probe_srt_server;
use srtla_mux::{MuxConfig, MuxEngine};

#[derive(Parser, Debug)]
#[command(name = "srtla-rec", about = "SRTLA link-aggregation receiver", long_about = None)]
struct Args {
    /// Print the version and exit
    #[arg(short = 'v', long)]
    version: bool,

    /// UDP port to listen on for SRTLA traffic
    srtla_listen_port: Option<String>,

    /// Hostname or IPv4 address of the SRT server
    srt_host: Option<String>,

    /// Port of the SRT server
    srt_port: Option<String>,
}

fn print_help() {
    eprintln!("Syntax: srtla-rec [-v] SRTLA_LISTEN_PORT SRT_HOST SRT_PORT\n");
    eprintln!("-v      Print the version and exit");
}

/// Ports must be integers in [1, 65535].
fn parse_port(arg: &str) -> Option<u16> {
    match arg.parse::<u16>() {
        Ok(0) | Err(_) => None,
        Ok(port) => Some(port),
    }
}

fn main() -> anyhow::Result<()> {
    // Malformed usage is not a failure of the service; report and leave
    // with a clean exit code, like the help text does.
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(_) => {
            print_help();
            std::process::exit(0);
        }
    };

    if args.version {
        println!("{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let (Some(listen_arg), Some(srt_host), Some(srt_port_arg)) =
        (&args.srtla_listen_port, &args.srt_host, &args.srt_port)
    else {
        print_help();
        std::process::exit(0);
    };
    let (Some(listen_port), Some(srt_port)) = (parse_port(listen_arg), parse_port(srt_port_arg))
    else {
        print_help();
        std::process::exit(0);
    };

    tracing_subscriber::fmt::init();

    let (srt_addr, _reachability) = probe_srt_server(srt_host, srt_port)
        .with_context(|| format!("failed to resolve the SRT server {srt_host}:{srt_port}"))?;

    let mut engine = MuxEngine::bind(listen_port, MuxConfig::new(srt_addr))
        .with_context(|| format!("failed to set up the SRTLA listener on port {listen_port}"))?;

    tracing::info!("srtla-rec is now running");
    engine.run().context("reactor failed")?;
    Ok(())
}
