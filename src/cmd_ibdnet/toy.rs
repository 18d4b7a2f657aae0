use clap::*;

use ibdnet::libs::toy::Toy;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("toy")
        .about("Write small synthetic identity tables")
        .after_help(
            r###"
Writes <outdir>/toyN.pairwise.tsv in the input format of `ibdnet call`.

* toy1 - A/B high identity over windows 1-6 (5k-35k) with a 0.9997 dip at
         window 4; A/C low identity over windows 0-6
* toy2 - A/B alternating low identities, no segment
* toy3 - A/B with windows 15k-25k absent from the table

Examples:
1. All toys into the current directory:
   ibdnet toy

2. One toy into a directory:
   ibdnet toy --which toy3 --outdir data

"###,
        )
        .arg(
            Arg::new("which")
                .long("which")
                .num_args(1)
                .default_value("all")
                .value_parser(["toy1", "toy2", "toy3", "all"])
                .help("Which table to write"),
        )
        .arg(
            Arg::new("outdir")
                .long("outdir")
                .num_args(1)
                .default_value(".")
                .help("Output directory"),
        )
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    let which = args.get_one::<String>("which").unwrap();
    let outdir = std::path::Path::new(args.get_one::<String>("outdir").unwrap());

    let toys: Vec<Toy> = if which == "all" {
        Toy::ALL.to_vec()
    } else {
        vec![which.parse::<Toy>().map_err(anyhow::Error::msg)?]
    };

    std::fs::create_dir_all(outdir)?;
    for toy in toys {
        let path = outdir.join(toy.file_name());
        let path = path.to_string_lossy();
        toy.write(ibdnet::writer(&path)?)?;
        log::info!("wrote {}", path);
    }

    Ok(())
}
