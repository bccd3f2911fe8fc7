//! Clap command tree.

use clap::{Arg, ArgAction, ArgGroup, Command};

fn collection_arg() -> Arg {
    Arg::new("collection")
        .required(true)
        .help("Collection name")
}

fn query_args(cmd: Command, what: &'static str) -> Command {
    cmd.arg(
        Arg::new("vector")
            .long("vector")
            .value_name("CSV")
            .help(format!("{} as comma-separated floats", what)),
    )
    .arg(
        Arg::new("text")
            .long("text")
            .value_name("TEXT")
            .help(format!("{} as text, embedded with the configured embedder", what)),
    )
    .group(
        ArgGroup::new("input")
            .args(["vector", "text"])
            .required(true),
    )
}

/// Build the command-line interface.
pub fn build_cli() -> Command {
    Command::new("dataclients")
        .about("Embed text and query vector stores")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_name("FILE")
                .global(true)
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .global(true)
                .help("Print results as JSON"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .global(true)
                .help("Raise log verbosity (-v info, -vv debug, -vvv trace)"),
        )
        .subcommand(
            query_args(
                Command::new("upsert")
                    .about("Insert or replace one record")
                    .arg(collection_arg())
                    .arg(
                        Arg::new("id")
                            .long("id")
                            .required(true)
                            .help("Record id"),
                    )
                    .arg(
                        Arg::new("payload")
                            .long("payload")
                            .value_name("JSON")
                            .help("Payload as a JSON object of scalars"),
                    ),
                "Embedding",
            ),
        )
        .subcommand(
            query_args(
                Command::new("search")
                    .about("Similarity search")
                    .arg(collection_arg())
                    .arg(
                        Arg::new("n")
                            .short('n')
                            .long("n-results")
                            .default_value("10")
                            .help("Number of results"),
                    )
                    .arg(
                        Arg::new("filter")
                            .long("filter")
                            .value_name("JSON")
                            .help("Payload filter, e.g. '{\"lang\": \"en\", \"year\": {\"$gte\": 2020}}'"),
                    )
                    .arg(
                        Arg::new("with-vectors")
                            .long("with-vectors")
                            .action(ArgAction::SetTrue)
                            .help("Include stored vectors in the results"),
                    ),
                "Query",
            ),
        )
        .subcommand(
            Command::new("get")
                .about("Fetch records by id")
                .arg(collection_arg())
                .arg(Arg::new("ids").required(true).num_args(1..).help("Record ids")),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete records by id")
                .arg(collection_arg())
                .arg(Arg::new("ids").required(true).num_args(1..).help("Record ids")),
        )
        .subcommand(
            Command::new("count")
                .about("Number of records in a collection")
                .arg(collection_arg()),
        )
        .subcommand(
            Command::new("prune")
                .about("Delete expired records from an embedded-local collection")
                .arg(collection_arg())
                .arg(
                    Arg::new("default-days")
                        .long("default-days")
                        .value_name("DAYS")
                        .help("Retention for records without a search weight"),
                ),
        )
}
