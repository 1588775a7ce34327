use std::io;

#[allow(dead_code)]
#[path = "../session.rs"]
mod session;

use session::{ScenarioProfile, Session, open_transcript};

/// Enough cycles for every profile to hit at least one status line.
const TRANSCRIPT_CYCLES: u32 = 60;

fn main() -> io::Result<()> {
    for profile in ScenarioProfile::ALL {
        record_profile(profile)?;
    }
    Ok(())
}

fn record_profile(profile: ScenarioProfile) -> io::Result<()> {
    let writer = open_transcript(profile)?;
    let mut session = Session::new(profile, writer)?;
    session.run(TRANSCRIPT_CYCLES)?;
    println!("wrote {}", profile.log_path());
    Ok(())
}
