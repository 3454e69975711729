use std::{env, process};

use forgery_detector::check::QuickCheck;

fn main() {
    let Some(path) = env::args().nth(1) else {
        println!("error");
        process::exit(1);
    };

    match QuickCheck::new().check(&path) {
        Ok(verdict) => println!("{verdict}"),
        Err(_) => {
            println!("error");
            process::exit(1);
        }
    }
}
