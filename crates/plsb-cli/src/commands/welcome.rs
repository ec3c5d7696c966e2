//! Welcome page command

use anyhow::Result;
use plsb_core::config::{PageConfig, WELCOME_BODY};

pub fn cmd_welcome(page: &PageConfig) -> Result<()> {
    println!();
    println!("{}", page.welcome_heading());
    println!();
    println!("{}", WELCOME_BODY);
    println!();
    println!("Next steps:");
    println!("  1. List months: plsb --csv finance.csv months");
    println!("  2. Show a month: plsb --csv finance.csv show January");
    println!("  3. Start web UI: plsb --csv finance.csv serve");

    Ok(())
}
