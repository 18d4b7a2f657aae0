use clap::*;

use ibdnet::libs::caller::{call_all, CallOptions};
use ibdnet::libs::pairs::read_pair_filter;
use ibdnet::libs::rle::{GapBudget, RleParams};
use ibdnet::libs::segment::{write_header, write_segment, MergeStats, Mode, SizeFilter};
use ibdnet::libs::table::{read_table, RowPolicy, DEFAULT_IDENTITY_COL};
use ibdnet::libs::track::DuplicatePolicy;
use ibdnet::libs::xdrop::SeedParams;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("call")
        .about("Call IBD segments from per-window pairwise identities")
        .after_help(
            r###"
Input is a tab-separated table with a header containing
    REGION CHR START END LENGTH group.a group.b estimated.identity
(the identity column can be renamed with --identity-col; extra columns are ignored).
Each row is the identity of one pair of haplotypes over one window.

Windows are numbered per chromosome after sorting by START; a window with no row
for a pair is "missing" for that pair.

Modes:
* rle  - Run-length thresholding. A run grows over windows with identity
         >= --min-identity (or within --drop-tolerance below it). With
         --missing-as-gap, up to --max-gap missing windows are tolerated inside a
         run; a present window below the threshold always ends it.
* seed - Seed-and-extend. Seeds are >= --seed-k consecutive windows with identity
         >= --seed-threshold. Each seed is extended both ways, scoring +reward for
         windows >= --extend-threshold, -penalty-bad for the others and
         -penalty-miss for missing ones (only with --missing-as-gap). Extension stops
         once the score drops more than --xdrop below its best, and ends where the
         best score was reached. Overlapping segments are merged.

Output columns:
    CHR START END HAP1 HAP2 N_WINDOWS COVERED_BP MEAN_IDENTITY MIN_IDENTITY
    FRACTION_CALLED MODE [N_GAPS]

Notes:
* Malformed rows are skipped unless --strict is given.
* Merged segments keep the statistics of their first part unless
  --recompute-merged is given.
* Output order follows the first appearance of pairs and chromosomes in the input,
  whatever --parallel is.

Examples:
1. Seed-and-extend with defaults:
   ibdnet call pairwise.tsv

2. Run-length calling tolerating two missing windows:
   ibdnet call pairwise.tsv --mode rle --missing-as-gap --max-gap 2

3. Restrict to some pairs, 8 threads:
   ibdnet call pairwise.tsv.gz --pairs pairs.tsv --parallel 8 -o segments.tsv

"###,
        )
        .arg(
            Arg::new("infile")
                .required(true)
                .index(1)
                .help("Input identity table; [stdin] for standard input"),
        )
        .arg(
            Arg::new("mode")
                .long("mode")
                .num_args(1)
                .default_value("seed")
                .value_parser(["rle", "seed"])
                .help("Calling algorithm"),
        )
        .arg(
            Arg::new("min_windows")
                .long("min-windows")
                .num_args(1)
                .default_value("3")
                .value_parser(value_parser!(usize))
                .help("Minimum number of windows in a segment"),
        )
        .arg(
            Arg::new("min_length_bp")
                .long("min-length-bp")
                .num_args(1)
                .default_value("5000")
                .value_parser(value_parser!(u64))
                .help("Minimum covered length of a segment (bp)"),
        )
        .arg(
            Arg::new("missing_as_gap")
                .long("missing-as-gap")
                .action(ArgAction::SetTrue)
                .help("Count missing windows as gaps instead of run breaks"),
        )
        .arg(
            Arg::new("identity_col")
                .long("identity-col")
                .num_args(1)
                .default_value(DEFAULT_IDENTITY_COL)
                .help("Name of the identity column"),
        )
        .arg(
            Arg::new("pairs")
                .long("pairs")
                .num_args(1)
                .help("Only call pairs listed in this file (A<TAB>B per line)"),
        )
        .arg(
            Arg::new("min_identity")
                .long("min-identity")
                .num_args(1)
                .default_value("0.9995")
                .value_parser(value_parser!(f64))
                .help("rle: per-window identity threshold"),
        )
        .arg(
            Arg::new("max_gap")
                .long("max-gap")
                .num_args(1)
                .default_value("1")
                .value_parser(value_parser!(usize))
                .help("rle: maximum number of missing windows in a run"),
        )
        .arg(
            Arg::new("consecutive_gaps")
                .long("consecutive-gaps")
                .action(ArgAction::SetTrue)
                .help("rle: apply --max-gap to consecutive missing windows only"),
        )
        .arg(
            Arg::new("drop_tolerance")
                .long("drop-tolerance")
                .num_args(1)
                .default_value("0.0")
                .value_parser(value_parser!(f64))
                .help("rle: allow identity dips this far below the threshold"),
        )
        .arg(
            Arg::new("seed_threshold")
                .long("seed-threshold")
                .num_args(1)
                .default_value("0.9998")
                .value_parser(value_parser!(f64))
                .help("seed: identity threshold of seed windows"),
        )
        .arg(
            Arg::new("seed_k")
                .long("seed-k")
                .num_args(1)
                .default_value("2")
                .value_parser(value_parser!(usize))
                .help("seed: consecutive windows needed to form a seed"),
        )
        .arg(
            Arg::new("extend_threshold")
                .long("extend-threshold")
                .num_args(1)
                .default_value("0.9995")
                .value_parser(value_parser!(f64))
                .help("seed: identity threshold during extension"),
        )
        .arg(
            Arg::new("xdrop")
                .long("xdrop")
                .num_args(1)
                .default_value("2.0")
                .value_parser(value_parser!(f64))
                .help("seed: stop when the score falls this far below its best"),
        )
        .arg(
            Arg::new("reward")
                .long("reward")
                .num_args(1)
                .default_value("1.0")
                .value_parser(value_parser!(f64))
                .help("seed: score of a window >= --extend-threshold"),
        )
        .arg(
            Arg::new("penalty_bad")
                .long("penalty-bad")
                .num_args(1)
                .default_value("1.0")
                .value_parser(value_parser!(f64))
                .help("seed: penalty of a window below --extend-threshold"),
        )
        .arg(
            Arg::new("penalty_miss")
                .long("penalty-miss")
                .num_args(1)
                .default_value("1.0")
                .value_parser(value_parser!(f64))
                .help("seed: penalty of a missing window"),
        )
        .arg(
            Arg::new("recompute_merged")
                .long("recompute-merged")
                .action(ArgAction::SetTrue)
                .help("seed: recompute statistics of merged segments"),
        )
        .arg(
            Arg::new("strict")
                .long("strict")
                .action(ArgAction::SetTrue)
                .help("Fail on malformed rows instead of skipping them"),
        )
        .arg(
            Arg::new("duplicates")
                .long("duplicates")
                .num_args(1)
                .default_value("last")
                .value_parser(["first", "last", "reject"])
                .help("Which row wins when a pair has several for one window"),
        )
        .arg(
            Arg::new("show_gaps")
                .long("show-gaps")
                .action(ArgAction::SetTrue)
                .help("Append an N_GAPS column"),
        )
        .arg(
            Arg::new("parallel")
                .long("parallel")
                .short('p')
                .num_args(1)
                .default_value("1")
                .value_parser(value_parser!(usize))
                .help("Number of threads for parallel processing"),
        )
        .arg(
            Arg::new("outfile")
                .long("outfile")
                .short('o')
                .num_args(1)
                .default_value("stdout")
                .help("Output filename. [stdout] for screen"),
        )
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    //----------------------------
    // Args
    //----------------------------
    let infile = args.get_one::<String>("infile").unwrap();
    let outfile = args.get_one::<String>("outfile").unwrap();
    let identity_col = args.get_one::<String>("identity_col").unwrap();
    let show_gaps = args.get_flag("show_gaps");

    let policy = if args.get_flag("strict") {
        RowPolicy::Strict
    } else {
        RowPolicy::Lenient
    };

    let opts = CallOptions {
        mode: args
            .get_one::<String>("mode")
            .unwrap()
            .parse::<Mode>()
            .map_err(anyhow::Error::msg)?,
        filter: SizeFilter {
            min_windows: *args.get_one::<usize>("min_windows").unwrap(),
            min_length_bp: *args.get_one::<u64>("min_length_bp").unwrap(),
        },
        rle: RleParams {
            min_identity: *args.get_one::<f64>("min_identity").unwrap(),
            max_gap: *args.get_one::<usize>("max_gap").unwrap(),
            drop_tolerance: *args.get_one::<f64>("drop_tolerance").unwrap(),
            missing_as_gap: false,
            gap_budget: if args.get_flag("consecutive_gaps") {
                GapBudget::Consecutive
            } else {
                GapBudget::PerRun
            },
        },
        seed: SeedParams {
            seed_threshold: *args.get_one::<f64>("seed_threshold").unwrap(),
            seed_k: *args.get_one::<usize>("seed_k").unwrap(),
            extend_threshold: *args.get_one::<f64>("extend_threshold").unwrap(),
            xdrop: *args.get_one::<f64>("xdrop").unwrap(),
            reward: *args.get_one::<f64>("reward").unwrap(),
            penalty_bad: *args.get_one::<f64>("penalty_bad").unwrap(),
            penalty_miss: *args.get_one::<f64>("penalty_miss").unwrap(),
            missing_as_gap: false,
        },
        merge: if args.get_flag("recompute_merged") {
            MergeStats::Recompute
        } else {
            MergeStats::KeepFirst
        },
        duplicates: args
            .get_one::<String>("duplicates")
            .unwrap()
            .parse::<DuplicatePolicy>()
            .map_err(anyhow::Error::msg)?,
    }
    .with_missing_as_gap(args.get_flag("missing_as_gap"));
    opts.validate()?;

    // Set the number of threads for rayon
    let opt_parallel = *args.get_one::<usize>("parallel").unwrap();
    rayon::ThreadPoolBuilder::new()
        .num_threads(opt_parallel)
        .build_global()?;

    //----------------------------
    // Ops
    //----------------------------
    let rows = read_table(infile, identity_col, policy)?;

    let pair_filter = match args.get_one::<String>("pairs") {
        Some(file) => Some(read_pair_filter(ibdnet::reader(file)?)?),
        None => None,
    };

    let results = call_all(&rows, &opts, pair_filter.as_ref())?;

    //----------------------------
    // Output
    //----------------------------
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_writer(ibdnet::writer(outfile)?);
    write_header(&mut wtr, show_gaps)?;
    for result in &results {
        for seg in &result.segments {
            write_segment(&mut wtr, &result.pair, seg, show_gaps)?;
        }
    }
    wtr.flush()?;

    Ok(())
}
