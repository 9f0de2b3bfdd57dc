use clap::{Parser, ValueHint};
use std::path::PathBuf;

use anyhow::{ensure, Result};

/// Linework simplification CLI (argument schema only)
#[derive(Parser, Debug)]
#[command(name = "linework", version, about)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Input polygon layer (.shp, .json, .geojson)
    #[arg(value_hint = ValueHint::FilePath)]
    pub input: PathBuf,

    /// Alternating TOLERANCE OUTPUT pairs, e.g. `500 out500.shp 1000 out1000.json`
    #[arg(required = true, num_args = 2..)]
    pub targets: Vec<String>,
}

impl Cli {
    /// The trailing arguments as `(tolerance, output)` pairs.  Tolerances
    /// are positive integers in the input's coordinate units.
    pub fn outputs(&self) -> Result<Vec<(u32, PathBuf)>> {
        ensure!(
            self.targets.len() % 2 == 0,
            "expected alternating TOLERANCE OUTPUT pairs, got {} arguments",
            self.targets.len()
        );
        self.targets
            .chunks(2)
            .map(|pair| {
                let tolerance: u32 = pair[0]
                    .parse()
                    .map_err(|_| anyhow::anyhow!("tolerance {:?} is not an integer", pair[0]))?;
                ensure!(tolerance > 0, "tolerance must be positive, got {tolerance}");
                Ok((tolerance, PathBuf::from(&pair[1])))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("linework").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn pairs_parse_in_order() {
        let cli = cli(&["in.shp", "500", "a.shp", "100", "b.json"]);
        let outputs = cli.outputs().unwrap();
        assert_eq!(
            outputs,
            vec![
                (500, PathBuf::from("a.shp")),
                (100, PathBuf::from("b.json")),
            ]
        );
    }

    #[test]
    fn odd_trailing_arguments_are_rejected() {
        let cli = cli(&["in.shp", "500", "a.shp", "100"]);
        assert!(cli.outputs().is_err());
    }

    #[test]
    fn zero_tolerance_is_rejected() {
        let cli = cli(&["in.shp", "0", "a.shp"]);
        assert!(cli.outputs().is_err());
    }

    #[test]
    fn non_numeric_tolerance_is_rejected() {
        let cli = cli(&["in.shp", "big", "a.shp"]);
        assert!(cli.outputs().is_err());
    }

    #[test]
    fn missing_targets_fail_to_parse() {
        assert!(Cli::try_parse_from(["linework", "in.shp"]).is_err());
    }
}
