use anyhow::{bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use locality::location::{
    Coordinate, Gazetteer, NominatimClient, PincodeClient, PostalCache, PostalResolver,
    ProximityResolver, Validator,
};
use locality::ResolverConfig;
use serde::Serialize;
use std::time::Duration;

/// Locality: PIN-code and GPS location resolution for Indian addresses.
///
/// Prints JSON on stdout; diagnostics go to stderr (set RUST_LOG or -v).
///
/// Examples:
///   locality state "tamil nadu"
///   locality suggest cities ben --limit 5
///   locality pincode 110001
///   locality nearby --lat 18.5204 --lon 73.8567 --limit 5
#[derive(Parser)]
#[command(name = "locality", version, about, long_about = None)]
struct Cli {
    /// Log pipeline steps at debug level.
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check a state name against the gazetteer.
    State { name: String },

    /// Check a city name against the gazetteer.
    City { name: String },

    /// Autocomplete suggestions from the state or city list.
    Suggest {
        list: ListKind,
        input: String,
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },

    /// Resolve a PIN code to state and city.
    Pincode {
        code: String,
        /// Skip the on-disk result cache.
        #[arg(long)]
        no_cache: bool,
    },

    /// Nearest gazetteer cities to a coordinate.
    Nearby {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        #[arg(long, default_value_t = 5)]
        limit: usize,
        /// Give up after this many seconds and return what was found.
        #[arg(long)]
        budget_secs: Option<f64>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ListKind {
    States,
    Cities,
}

#[derive(Serialize)]
struct NameCheck<'a> {
    input: &'a str,
    valid: bool,
    canonical: Option<&'a str>,
    suggestions: Vec<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let config = ResolverConfig::from_env();
    let gazetteer = Gazetteer::india();
    let validator = Validator::new(gazetteer);

    match cli.command {
        Command::State { name } => {
            let check = NameCheck {
                input: &name,
                valid: validator.is_valid_state(&name),
                canonical: validator.canonical_state(&name),
                suggestions: validator.suggest_states(&name, 5),
            };
            print_json(&check)?;
        }
        Command::City { name } => {
            let check = NameCheck {
                input: &name,
                valid: validator.is_valid_city(&name),
                canonical: validator.canonical_city(&name),
                suggestions: validator.suggest_cities(&name, 5),
            };
            print_json(&check)?;
        }
        Command::Suggest { list, input, limit } => {
            let hits = match list {
                ListKind::States => validator.suggest_states(&input, limit),
                ListKind::Cities => validator.suggest_cities(&input, limit),
            };
            print_json(&hits)?;
        }
        Command::Pincode { code, no_cache } => {
            let mut resolver = PostalResolver::new(gazetteer, Box::new(PincodeClient::new(&config)));
            if !resolver.is_well_formed(&code) {
                bail!(
                    "PIN code must be exactly {} digits, got '{}'",
                    gazetteer.postal_code_len(),
                    code
                );
            }
            if !no_cache {
                let cache = match config.cache_path.clone() {
                    Some(path) => PostalCache::load_from(path),
                    None => PostalCache::load(),
                };
                resolver = resolver.with_cache(cache);
            }
            match resolver.resolve(&code) {
                Some(loc) => {
                    eprintln!("  \u{1F4CD} {}, {}, {}", loc.city, loc.state, gazetteer.country_name());
                    print_json(&loc)?;
                }
                None => {
                    eprintln!("  No location found for PIN code {}", code.trim());
                    print_json(&serde_json::Value::Null)?;
                }
            }
        }
        Command::Nearby { lat, lon, limit, budget_secs } => {
            if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
                bail!("Invalid coordinates. Lat: -90..90, Lon: -180..180");
            }
            let budget = match budget_secs {
                Some(s) if s.is_finite() && s >= 0.0 => Some(Duration::from_secs_f64(s)),
                Some(s) => bail!("Invalid budget '{}': must be a non-negative number of seconds", s),
                None => None,
            };

            let at = Coordinate::new(lat, lon);
            let resolver = ProximityResolver::new(gazetteer, Box::new(NominatimClient::new(&config)), &config);
            eprintln!("  \u{1F4CD} Searching near {}", at);
            let report = resolver.search(at, limit, budget);
            if report.timed_out {
                eprintln!("  Time budget exhausted, results may be incomplete");
            }
            print_json(&report)?;
        }
    }

    Ok(())
}

fn init_logger(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
