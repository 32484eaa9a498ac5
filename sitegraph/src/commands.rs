use crate::CLAP_STYLING;
use clap::{ArgAction, arg, command};
use std::path::PathBuf;

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("sitegraph")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("sitegraph")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-q --"quiet" "Suppress the report and progress output")
                .required(false)
                .global(true),
        )
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            command!("crawl")
                .about(
                    "Crawl a website breadth-first and export its internal link graph. \
                Every option can also be set through the environment variable shown.",
                )
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(false)
                        .help("Starting URL to crawl [env: WEBSITE_URL]"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Output file; its extension is replaced per format [env: OUTPUT_FILE] [default: graph.csv]")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(--"max-pages" <N>)
                        .required(false)
                        .help("Maximum pages to crawl, 0 for unlimited [env: MAX_PAGES] [default: unlimited]")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--"max-depth" <N>)
                        .required(false)
                        .help("Maximum link depth from the start URL [env: MAX_DEPTH] [default: 5]")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--"respect-robots")
                        .help("Respect robots.txt [env: RESPECT_ROBOTS] [default: true]")
                        .required(false)
                        .conflicts_with("no-respect-robots"),
                )
                .arg(
                    arg!(--"no-respect-robots")
                        .help("Ignore robots.txt")
                        .required(false),
                )
                .arg(
                    arg!(--"delay" <SECONDS>)
                        .required(false)
                        .help("Delay between requests in seconds [env: CRAWL_DELAY] [default: 0.5]")
                        .value_parser(clap::value_parser!(f64)),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Per-request timeout in seconds [env: CRAWL_TIMEOUT] [default: 10]")
                        .value_parser(clap::value_parser!(f64)),
                )
                .arg(
                    arg!(--"ignore-file" <PATH>)
                        .required(false)
                        .help("File of path patterns to skip, one per line [env: IGNORE_PATHS_FILE]")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(--"ignore" <PATTERN>)
                        .required(false)
                        .action(ArgAction::Append)
                        .help("Path pattern to skip, e.g. /tags/* (repeatable) [env: IGNORE_PATHS]"),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .action(ArgAction::Append)
                        .help("Output format: csv, split, json, gexf or all (repeatable) [env: OUTPUT_FORMATS] [default: csv]"),
                )
                .arg(
                    arg!(--"debug")
                        .help("Enable debug logging [env: DEBUG]")
                        .required(false),
                ),
        )
}
