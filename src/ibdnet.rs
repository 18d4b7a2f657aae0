extern crate clap;
use clap::*;

mod cmd_ibdnet;

fn main() -> anyhow::Result<()> {
    let app = Command::new("ibdnet")
        .version(crate_version!())
        .author(crate_authors!())
        .about("`ibdnet` - Identity-by-descent segments from pairwise window identities")
        .propagate_version(true)
        .arg_required_else_help(true)
        .color(ColorChoice::Auto)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::Count)
                .help("Log progress to stderr; repeat for more detail"),
        )
        .subcommand(cmd_ibdnet::call::make_subcommand())
        .subcommand(cmd_ibdnet::toy::make_subcommand())
        .after_help(
            r###"Subcommands:

* call - Call IBD segments from a per-window pairwise identity table
* toy  - Write small synthetic identity tables

Logging goes to stderr; RUST_LOG overrides -v.

"###,
        );

    let matches = app.get_matches();

    let level = match matches.get_count("verbose") {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    // Check which subcomamnd the user ran...
    match matches.subcommand() {
        Some(("call", sub_matches)) => cmd_ibdnet::call::execute(sub_matches),
        Some(("toy", sub_matches)) => cmd_ibdnet::toy::execute(sub_matches),
        _ => unreachable!(),
    }?;

    Ok(())
}
