use std::process;
use std::time::Instant;

use clap::ArgEnum;
use env_logger;
use log;

use parmerge::comm::{run_workers, Communicator, Rank, ThreadComm};
use parmerge::sort::merge_sort;
use parmerge::tools::{generate_random_sequence, is_sorted_array, seeded_rng};

fn main() {
    let arg_parser = build_arg_parser();

    let log_level: LogLevel = arg_parser.value_of_t_or_exit("log_level");
    init_logger(log_level);

    let length: usize = arg_parser.value_of_t_or_exit("length");
    let workers: Rank = arg_parser.value_of_t_or_exit("workers");
    let seed: usize = arg_parser.value_of_t_or_exit("seed");
    let variation: i64 = arg_parser.value_of_t_or_exit("variation");

    let mut rng = seeded_rng(seed);
    let data = generate_random_sequence(length, 0..variation, &mut rng);
    log::info!("sorting {} random elements on {} workers", length, workers);

    let start = Instant::now();
    let outcome = run_workers(workers, move |comm: ThreadComm<i64>| {
        let input = (comm.rank() == 0).then(|| data.clone());
        merge_sort(&comm, input)
    });
    let elapsed = start.elapsed();

    let mut results = match outcome {
        Ok(results) => results,
        Err(err) => {
            log::error!("worker pool setup error: {}", err);
            process::exit(1);
        }
    };

    let sorted = match results.swap_remove(0) {
        Ok(sorted) => sorted.expect("rank 0 holds the result"),
        Err(err) => {
            log::error!("sorting error: {}", err);
            process::exit(1);
        }
    };

    if sorted.len() != length || !is_sorted_array(&sorted) {
        log::error!("verification error: the output is not sorted");
        process::exit(1);
    }

    println!(
        "sorted {} elements on {} workers in {} ms",
        length,
        workers,
        elapsed.as_millis()
    );
}

#[derive(Copy, Clone, clap::ArgEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn possible_values() -> impl Iterator<Item = clap::PossibleValue<'static>> {
        Self::value_variants().iter().filter_map(|v| v.to_possible_value())
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <LogLevel as clap::ArgEnum>::from_str(s, false)
    }
}

fn build_arg_parser() -> clap::ArgMatches {
    clap::App::new("parmerge")
        .about("distributed merge sort benchmark")
        .arg(
            clap::Arg::new("length")
                .short('n')
                .long("length")
                .help("number of random elements to sort")
                .takes_value(true)
                .default_value("1000000")
                .validator(|v| match v.parse::<usize>() {
                    Ok(_) => Ok(()),
                    Err(err) => Err(format!("Length format incorrect: {}", err)),
                }),
        )
        .arg(
            clap::Arg::new("workers")
                .short('w')
                .long("workers")
                .help("number of cooperating workers")
                .takes_value(true)
                .default_value("4")
                .validator(|v| match v.parse::<Rank>() {
                    Ok(workers) if workers > 0 => Ok(()),
                    Ok(_) => Err("Worker count must be positive".to_string()),
                    Err(err) => Err(format!("Worker count format incorrect: {}", err)),
                }),
        )
        .arg(
            clap::Arg::new("seed")
                .short('s')
                .long("seed")
                .help("seed of the random sequence")
                .takes_value(true)
                .default_value("0")
                .validator(|v| match v.parse::<usize>() {
                    Ok(_) => Ok(()),
                    Err(err) => Err(format!("Seed format incorrect: {}", err)),
                }),
        )
        .arg(
            clap::Arg::new("variation")
                .short('m')
                .long("variation")
                .help("elements are drawn uniformly from [0, variation)")
                .takes_value(true)
                .default_value("1000000")
                .validator(|v| match v.parse::<i64>() {
                    Ok(variation) if variation > 0 => Ok(()),
                    Ok(_) => Err("Variation must be positive".to_string()),
                    Err(err) => Err(format!("Variation format incorrect: {}", err)),
                }),
        )
        .arg(
            clap::Arg::new("log_level")
                .short('l')
                .long("loglevel")
                .help("logging level")
                .takes_value(true)
                .default_value("info")
                .possible_values(LogLevel::possible_values()),
        )
        .get_matches()
}

fn init_logger(log_level: LogLevel) {
    env_logger::Builder::new()
        .filter_level(match log_level {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        })
        .format_timestamp_millis()
        .init();
}
