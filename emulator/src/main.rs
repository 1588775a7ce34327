#[allow(dead_code)]
mod session;

use std::env;
use std::io;
use std::process;

use session::{ScenarioProfile, Session};

const DEFAULT_CYCLES: u32 = 20;
const USAGE: &str = "Usage: ranging-emulator [--profile <steady|sweep|dropout|noise|stall>] [--cycles N]";

#[derive(Debug, Eq, PartialEq)]
struct Options {
    profile: ScenarioProfile,
    cycles: u32,
}

fn main() -> io::Result<()> {
    let options = parse_options(env::args().skip(1)).unwrap_or_else(|err| {
        eprintln!("{err}");
        eprintln!("{USAGE}");
        process::exit(2);
    });

    let stdout = io::stdout();
    let mut session = Session::new(options.profile, stdout.lock())?;
    eprintln!(
        "Ranging emulator replaying `{}` for {} cycles.",
        session.profile().tag(),
        options.cycles
    );
    session.run(options.cycles)?;
    Ok(())
}

fn parse_options(args: impl IntoIterator<Item = String>) -> Result<Options, String> {
    let mut options = Options {
        profile: ScenarioProfile::Steady,
        cycles: DEFAULT_CYCLES,
    };
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        if let Some(value) = arg.strip_prefix("--profile=") {
            options.profile = ScenarioProfile::from_tag(value)?;
        } else if arg == "--profile" {
            let value = args
                .next()
                .ok_or_else(|| "Expected value after --profile".to_string())?;
            options.profile = ScenarioProfile::from_tag(&value)?;
        } else if let Some(value) = arg.strip_prefix("--cycles=") {
            options.cycles = parse_cycles(value)?;
        } else if arg == "--cycles" {
            let value = args
                .next()
                .ok_or_else(|| "Expected value after --cycles".to_string())?;
            options.cycles = parse_cycles(&value)?;
        } else {
            options.profile = ScenarioProfile::from_tag(&arg)?;
        }
    }

    Ok(options)
}

fn parse_cycles(value: &str) -> Result<u32, String> {
    value
        .parse()
        .map_err(|_| format!("Invalid cycle count `{value}`"))
}
