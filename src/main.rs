//! pomodash main entrypoint.

use pomodash::run;
use pomodash::ui::messages::error;

fn main() {
    println!();
    if let Err(e) = run() {
        error(e);
        std::process::exit(1);
    }
}
