use std::process;

fn main() {
    if let Err(e) = heimdahl::run() {
        eprintln!("Error: {e:?}");
        process::exit(1);
    }
}
