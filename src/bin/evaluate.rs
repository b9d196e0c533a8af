/**
 * SimReco
 * Copyright (C) 2018 Sebastian Schelter
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program. If not, see <http://www.gnu.org/licenses/>.
 */

use std::env;
use std::io::Write;
use std::process;

use env_logger::Builder;
use getopts::{Matches, Options};
use log::{info, LevelFilter};

use simreco::io;
use simreco::{Config, Evaluator, Mode, Result, UserHistories};

fn main() {

    let args: Vec<String> = env::args().collect();
    let program = args[0].clone();

    let mut opts = Options::new();
    opts.optopt("i", "train", "Listing table to build the recommender from (required). A CSV \
        file with a header line, the columns listing_id, property_type, room_type, accommodates, \
        bedrooms, price, city and visitors, and optionally user_ratings and amenity flags.", "PATH");
    opts.optopt("t", "test", "Listing table whose visitors provide the held-out user histories \
        (optional, defaults to the train table).", "PATH");
    opts.optopt("m", "mode", "Recommender to evaluate: item, content or both (optional, \
        defaults to both).", "MODE");
    opts.optopt("c", "config", "JSON configuration file (optional).", "PATH");
    opts.optopt("o", "outputfile", "Output file name for the evaluation summaries (optional, \
        output will be written to stdout by default).", "PATH");
    opts.optopt("k", "cutoff", "Number of recommendations to score per user.", "NUMBER");
    opts.optopt("s", "sample-size", "Number of users to evaluate.", "NUMBER");
    opts.optopt("b", "batch-size", "Number of items per similarity batch.", "NUMBER");
    opts.optopt("", "seed", "Random seed for sampling users.", "NUMBER");
    opts.optopt("", "min-history", "Minimum number of visits of an evaluated user.", "NUMBER");
    opts.optflagmulti("v", "verbose", "Log more, repeat for debug output.");
    opts.optflag("h", "help", "Print this help menu");

    let matches = match opts.parse(&args[1..]) {
        Ok(matches) => matches,
        Err(failure) => {
            let hint = failure.to_string();
            return print_usage_and_exit(&program, opts, Some(&hint))
        },
    };

    if matches.opt_present("h") {
        return print_usage_and_exit(&program, opts, None);
    }

    init_logging(matches.opt_count("v"));

    let train_path = match matches.opt_str("i") {
        Some(path) => path,
        None => return print_usage_and_exit(
            &program,
            opts,
            Some("Please specify a train table via --train."),
        ),
    };

    let config = match configure(&matches) {
        Ok(config) => config,
        Err(failure) => {
            let hint = format!("Invalid configuration: {}", failure);
            return print_usage_and_exit(&program, opts, Some(&hint))
        },
    };

    let modes = match matches.opt_str("m").as_ref().map(String::as_str) {
        None | Some("both") => vec![Mode::ItemBased, Mode::ContentBased],
        Some(mode) => match mode.parse::<Mode>() {
            Ok(mode) => vec![mode],
            Err(failure) => {
                let hint = failure.to_string();
                return print_usage_and_exit(&program, opts, Some(&hint))
            },
        },
    };

    let test_path = matches.opt_str("t").unwrap_or_else(|| train_path.clone());

    if let Err(failure) = evaluate(&train_path, &test_path, &modes, &config, matches.opt_str("o")) {
        eprintln!("Error: {}", failure);
        process::exit(1);
    }
}

fn init_logging(verbosity: usize) {

    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .init();
}

fn configure(matches: &Matches) -> Result<Config> {

    let mut config = match matches.opt_str("c") {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    override_with(matches, "k", &mut config.k)?;
    override_with(matches, "s", &mut config.sample_size)?;
    override_with(matches, "b", &mut config.batch_size)?;
    override_with(matches, "seed", &mut config.random_seed)?;

    if let Some(min_history) = parse_opt(matches, "min-history")? {
        config.min_history = Some(min_history);
    }

    config.validate()?;

    Ok(config)
}

fn parse_opt<T: std::str::FromStr>(matches: &Matches, name: &str) -> Result<Option<T>> {
    match matches.opt_str(name) {
        Some(raw) => raw.parse::<T>()
            .map(Some)
            .map_err(|_| simreco::RecoError::InvalidConfig(
                format!("Problem with option '{}': cannot parse '{}'", name, raw))),
        None => Ok(None),
    }
}

fn override_with<T: std::str::FromStr>(matches: &Matches, name: &str, target: &mut T) -> Result<()> {
    if let Some(value) = parse_opt(matches, name)? {
        *target = value;
    }
    Ok(())
}

fn print_usage_and_exit(
    program: &str,
    opts: Options,
    hint: Option<&str>
) -> ! {

    let status = match hint {
        Some(hint) => {
            eprintln!("\n{}\n", hint);
            1
        },
        None => 0,
    };

    let brief = format!("Usage: {} [options]", program);
    eprint!("{}", opts.usage(&brief));

    process::exit(status)
}

fn evaluate(
    train_path: &str,
    test_path: &str,
    modes: &[Mode],
    config: &Config,
    output_path: Option<String>,
) -> Result<()> {

    info!("Reading {} to build the recommenders", train_path);
    let train = io::read_listings(train_path, &config.amenities)?;

    info!("Reading {} to collect held-out user histories", test_path);
    let test = io::read_listings(test_path, &config.amenities)?;
    let histories = UserHistories::from_listings(&test);

    info!(
        "Found {} train listings, {} test listings and {} test users",
        train.len(),
        test.len(),
        histories.num_users(),
    );

    let mut out = io::output(output_path.as_ref().map(String::as_str))?;

    for mode in modes.iter() {
        let recommender = simreco::build_recommender(&train, *mode, config)?;
        let summary = Evaluator::from_config(config, *mode).evaluate(&recommender, &histories);

        info!(
            "{}: precision@{} {:.4}, recall@{} {:.4} over {} users, {} excluded",
            mode,
            summary.k,
            summary.mean_precision,
            summary.k,
            summary.mean_recall,
            summary.num_evaluated,
            summary.num_skipped + summary.num_failed,
        );

        io::write_evaluation(&mut out, *mode, &summary)?;
    }

    out.flush()?;

    Ok(())
}
