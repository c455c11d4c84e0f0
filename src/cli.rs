// Command-line surface.
use clap::{Parser, ValueEnum};

use crate::output::OutputFormat;

/// Auxiliary data commands that replace the advertisement search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AuxCommand {
    /// Print average-price statistics for the given criteria.
    #[value(name = "average-price")]
    AveragePrice,
}

/// Get car advertisements from https://auto.ria.com
#[derive(Debug, Parser)]
#[command(
    name = "ria-scout",
    version,
    about = "Get car advertisements from https://auto.ria.com",
    after_help = "EXAMPLE: ria-scout -m Ford -M Focus"
)]
pub struct RiaOpts {
    /// Print auxiliary data instead of searching.
    #[arg(long = "get", value_enum, value_name = "WHAT")]
    pub get: Option<AuxCommand>,

    /// Update the RIA API key and exit.
    #[arg(short = 'k', long = "key", value_name = "API_KEY")]
    pub api_key: Option<String>,

    /// Car make.
    #[arg(short = 'm', long = "make", value_name = "MAKE")]
    pub make: Option<String>,

    /// Car model.
    #[arg(short = 'M', long = "model", value_name = "MODEL")]
    pub model: Option<String>,

    /// Body style.
    #[arg(short = 'b', long = "body", value_name = "BODY")]
    pub body: Option<String>,

    /// Car production year lower limit.
    #[arg(short = 'y', long = "year-start", value_name = "YEAR")]
    pub year_start: Option<u16>,

    /// Car production year upper limit.
    #[arg(short = 'Y', long = "year-end", value_name = "YEAR")]
    pub year_end: Option<u16>,

    /// Engine capacity lower limit.
    #[arg(short = 'l', long = "capacity-from", value_name = "CAPACITY")]
    pub capacity_from: Option<f64>,

    /// Engine capacity upper limit.
    #[arg(short = 'L', long = "capacity-to", value_name = "CAPACITY")]
    pub capacity_to: Option<f64>,

    /// Gearbox type.
    #[arg(short = 'g', long = "gearbox", value_name = "GEARBOX")]
    pub gearbox: Option<String>,

    /// Fuel type.
    #[arg(short = 'f', long = "fuel", value_name = "FUEL")]
    pub fuel: Option<String>,

    /// Car color.
    #[arg(short = 'c', long = "color", value_name = "COLOR")]
    pub color: Option<String>,

    /// Brand origin country.
    #[arg(short = 'C', long = "country", value_name = "COUNTRY")]
    pub country: Option<String>,

    /// Car options.
    #[arg(short = 'O', long = "options", value_name = "OPTIONS")]
    pub options: Option<String>,

    /// Listing period: hours (1/3/6/12/24/48/72) or today/week/month/quarter.
    #[arg(
        short = 'p',
        long = "period",
        value_name = "PERIOD",
        value_parser = ["1", "3", "6", "12", "today", "24", "48", "72", "week", "month", "quarter"]
    )]
    pub period: Option<String>,

    /// Sort order, default is "price-up".
    #[arg(
        short = 's',
        long = "sort",
        value_name = "SORT",
        value_parser = [
            "price-up", "price-down", "date", "prod-year-up", "prod-year-down",
            "mileage-up", "mileage-down"
        ]
    )]
    pub sort: Option<String>,

    /// Sale status, default is "sale".
    #[arg(
        short = 'S',
        long = "status",
        value_name = "STATUS",
        value_parser = ["all", "sold", "sale"]
    )]
    pub status: Option<String>,

    /// Has damage, default is "no".
    #[arg(
        short = 'd',
        long = "damage",
        value_name = "DAMAGE",
        value_parser = ["yes", "no", "all"]
    )]
    pub damage: Option<String>,

    /// Output format, default comes from the config file.
    #[arg(short = 'o', long = "output", value_enum, value_name = "OUTPUT")]
    pub output: Option<OutputFormat>,

    /// Increase output verbosity.
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_search_flags() {
        let opts = RiaOpts::parse_from([
            "ria-scout", "-m", "Ford", "-M", "Focus", "-y", "2015", "-L", "2.0", "-p", "week",
        ]);
        assert_eq!(opts.make.as_deref(), Some("Ford"));
        assert_eq!(opts.model.as_deref(), Some("Focus"));
        assert_eq!(opts.year_start, Some(2015));
        assert_eq!(opts.capacity_to, Some(2.0));
        assert_eq!(opts.period.as_deref(), Some("week"));
        assert!(!opts.verbose);
    }

    #[test]
    fn parses_the_aux_command() {
        let opts = RiaOpts::parse_from(["ria-scout", "--get", "average-price", "-m", "Ford"]);
        assert_eq!(opts.get, Some(AuxCommand::AveragePrice));
    }

    #[test]
    fn rejects_unknown_period() {
        assert!(RiaOpts::try_parse_from(["ria-scout", "-p", "fortnight"]).is_err());
    }

    #[test]
    fn output_format_values() {
        let opts = RiaOpts::parse_from(["ria-scout", "-o", "txt"]);
        assert_eq!(opts.output, Some(OutputFormat::Txt));
    }
}
