use log::{debug, error, info};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use types::{Config, Row};

#[tokio::main]
async fn main() {
    let args = parse_cli_args();

    let default_level = if args.get_flag("verbose") { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
    info!(
        "room-merge optimizer, version {}",
        option_env!("CARGO_PKG_VERSION").unwrap_or("unknown")
    );

    let inpath: &String = args.get_one("input").unwrap();
    debug!("reading rows from {inpath}");
    let file = File::open(inpath).unwrap_or_else(|e| {
        error!("could not open input file {inpath}: {e}");
        std::process::exit(exitcode::NOINPUT);
    });
    let rows: Vec<Row> = serde_json::from_reader(BufReader::new(file)).unwrap_or_else(|e| {
        error!("could not parse rows from {inpath}: {e}");
        std::process::exit(exitcode::DATAERR);
    });
    info!("loaded {} rows", rows.len());

    let threshold: u32 = args
        .get_one::<String>("threshold")
        .map(|s| {
            s.parse().unwrap_or_else(|e| {
                error!("invalid --threshold: {e}");
                std::process::exit(exitcode::USAGE);
            })
        })
        .unwrap_or_else(Config::default_threshold);
    let time_limit_seconds: u32 = args
        .get_one::<String>("time-limit")
        .map(|s| {
            s.parse().unwrap_or_else(|e| {
                error!("invalid --time-limit: {e}");
                std::process::exit(exitcode::USAGE);
            })
        })
        .unwrap_or_else(Config::default_time_limit_seconds);

    let config = Config {
        threshold,
        time_limit_seconds,
        worker_count: Some(num_cpus::get() as u32),
    };

    let result = room_dispatch::optimize(rows, config).await.unwrap_or_else(|e| {
        error!("optimization failed: {e}");
        let code = match e {
            room_core::RoomError::InvalidInput { .. } => exitcode::DATAERR,
            _ => exitcode::SOFTWARE,
        };
        std::process::exit(code);
    });

    info!(
        "solved: {} rooms saved of {} ({:.2}%)",
        result.overall.rooms_saved, result.overall.initial_rooms, result.overall.efficiency_percent
    );

    match args.get_one::<String>("output") {
        Some(outpath) => {
            let file = File::create(outpath).unwrap_or_else(|e| {
                error!("could not open output file {outpath}: {e}");
                std::process::exit(exitcode::CANTCREAT);
            });
            serde_json::to_writer_pretty(BufWriter::new(file), &result).unwrap_or_else(|e| {
                error!("could not write result to {outpath}: {e}");
                std::process::exit(exitcode::IOERR);
            });
            debug!("result written to {outpath}");
        }
        None => {
            serde_json::to_writer_pretty(std::io::stdout(), &result).unwrap_or_else(|e| {
                error!("could not write result to stdout: {e}");
                std::process::exit(exitcode::IOERR);
            });
            println!();
        }
    }
}

fn parse_cli_args() -> clap::ArgMatches {
    clap::command!()
        .arg(
            clap::Arg::new("input")
                .short('i')
                .long("input")
                .help("Input file: a JSON array of rows")
                .value_name("FILE")
                .required(true),
        )
        .arg(
            clap::Arg::new("output")
                .short('o')
                .long("output")
                .help("Output file for the optimize result (default: stdout)")
                .value_name("FILE"),
        )
        .arg(
            clap::Arg::new("threshold")
                .long("threshold")
                .help("Size threshold (rooms per partition) for routing to the ILP packer")
                .value_name("N"),
        )
        .arg(
            clap::Arg::new("time-limit")
                .long("time-limit")
                .help("Wall-clock budget in seconds for the ILP engine")
                .value_name("N"),
        )
        .arg(
            clap::Arg::new("verbose")
                .long("verbose")
                .help("Emit progress lines; otherwise silent on success")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches()
}
