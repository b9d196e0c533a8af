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
use getopts::Options;
use log::{info, warn, LevelFilter};

use simreco::io;
use simreco::{Config, Mode, Recommend, Result, UserHistories};

fn main() {

    let args: Vec<String> = env::args().collect();
    let program = args[0].clone();

    let mut opts = Options::new();
    opts.optopt("i", "inputfile", "Listing table (required).", "PATH");
    opts.optopt("o", "outputfile", "Output file name (optional, output will be written to stdout \
        by default).", "PATH");
    opts.optopt("m", "mode", "Recommender to use: item or content (optional, defaults to \
        item).", "MODE");
    opts.optopt("n", "num-recommendations", "Number of recommendations per query (optional, \
        defaults to 10).", "NUMBER");
    opts.optopt("", "item", "Only recommend listings similar to this listing.", "LISTING_ID");
    opts.optopt("", "similarities", "File to load the item similarities from, they are \
        computed and stored there if the file does not exist yet.", "PATH");
    opts.optopt("c", "config", "JSON configuration file (optional).", "PATH");
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

    let level = match matches.opt_count("v") {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .init();

    let input_path = match matches.opt_str("i") {
        Some(path) => path,
        None => return print_usage_and_exit(
            &program,
            opts,
            Some("Please specify an inputfile via --inputfile."),
        ),
    };

    let mode: Mode = match matches.opt_get_default("m", Mode::ItemBased) {
        Ok(mode) => mode,
        Err(failure) => {
            let hint = format!("Problem with option 'm': {}", failure);
            return print_usage_and_exit(&program, opts, Some(&hint))
        },
    };

    let mut config = match matches.opt_str("c") {
        Some(path) => match Config::from_file(path) {
            Ok(config) => config,
            Err(failure) => {
                let hint = format!("Problem with option 'c': {}", failure);
                return print_usage_and_exit(&program, opts, Some(&hint))
            },
        },
        None => Config::default(),
    };

    config.top_n = match matches.opt_get_default("n", config.top_n) {
        Ok(top_n) => top_n,
        Err(failure) => {
            let hint = format!("Problem with option 'n': {}", failure);
            return print_usage_and_exit(&program, opts, Some(&hint))
        },
    };

    let result = batch_recommend(
        &input_path,
        mode,
        &config,
        matches.opt_str("item"),
        matches.opt_str("similarities"),
        matches.opt_str("o"),
    );

    if let Err(failure) = result {
        eprintln!("Error: {}", failure);
        process::exit(1);
    }
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

fn batch_recommend(
    input_path: &str,
    mode: Mode,
    config: &Config,
    item: Option<String>,
    similarities_path: Option<String>,
    output_path: Option<String>,
) -> Result<()> {

    config.validate()?;

    info!("Reading {} to build a {} recommender", input_path, mode);
    let listings = io::read_listings(input_path, &config.amenities)?;

    let mut recommender = simreco::build_recommender(&listings, mode, config)?;

    if let Some(path) = similarities_path {
        recommender = io::load_or_store_similarities(recommender, &path)?;
    }

    let mut out = io::output(output_path.as_ref().map(String::as_str))?;

    match item {
        Some(item) => {
            let similar = recommender.similar_items(&item, config.top_n)?;
            io::write_recommendations(&mut out, &item, &similar)?;
        },
        None => {
            let histories = UserHistories::from_listings(&listings);
            info!("Writing recommendations for {} users", histories.num_users());

            let mut num_failed = 0;

            for (user_id, history) in histories.iter() {
                match recommender.recommend(history, config.top_n) {
                    Ok(recommended) => io::write_recommendations(&mut out, user_id, &recommended)?,
                    Err(failure) if failure.is_query_error() => {
                        warn!("No recommendations for user {}: {}", user_id, failure);
                        num_failed += 1;
                    },
                    Err(failure) => return Err(failure),
                }
            }

            if num_failed > 0 {
                warn!("Could not recommend for {} users", num_failed);
            }
        },
    }

    out.flush()?;

    Ok(())
}
