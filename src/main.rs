use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use laserkit::{init_logging, plan_part, PartFile, BUILD_DATE, VERSION};
use tracing::info;

const USAGE: &str = "\
laserkit - toolpath planner for sheet-metal chassis parts

USAGE:
  laserkit <part.json> [options]

The part file holds the part bound, optional planner settings, and the
feature chains to sequence. The plan report is written as JSON.

OPTIONS:
  -o, --out <path>   Write the plan report to this file instead of stdout
  -V, --version      Print version and build date
  -h, --help         Print this help
";

fn main() -> anyhow::Result<()> {
    init_logging()?;

    let mut input: Option<PathBuf> = None;
    let mut output: Option<PathBuf> = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print!("{USAGE}");
                return Ok(());
            }
            "-V" | "--version" => {
                println!("laserkit {VERSION} (built {BUILD_DATE})");
                return Ok(());
            }
            "-o" | "--out" => {
                let path = args.next().context("--out needs a path")?;
                output = Some(PathBuf::from(path));
            }
            other if input.is_none() => input = Some(PathBuf::from(other)),
            other => anyhow::bail!("unexpected argument '{other}'\n{USAGE}"),
        }
    }
    let Some(input) = input else {
        anyhow::bail!("no part file given\n{USAGE}");
    };

    info!(version = VERSION, build = BUILD_DATE, part = %input.display(), "planning part");
    let text = fs::read_to_string(&input)
        .with_context(|| format!("reading part file {}", input.display()))?;
    let part = PartFile::from_json(&text).context("parsing part file")?;

    let report = plan_part(&part)?;
    let json = report.to_json_string()?;
    match output {
        Some(path) => {
            fs::write(&path, &json)
                .with_context(|| format!("writing plan to {}", path.display()))?;
            info!(plan = %path.display(), features = report.features.len(), "plan written");
        }
        None => println!("{json}"),
    }
    Ok(())
}
