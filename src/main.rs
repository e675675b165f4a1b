// RCIcon - Rust folder icon manager
// Keeps each folder's desktop.ini pointing at the icon.ico it contains

use std::process;

fn main() {
    if let Err(e) = rcicon::run() {
        eprintln!("{}", e);
        process::exit(1);
    }
}
