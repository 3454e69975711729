use std::env;

use forgery_detector::{ForgeryDetector, error::Result, report::JsonReport};

fn main() -> Result<()> {
    let envelope = match env::args().nth(1) {
        Some(path) => ForgeryDetector::new().detect_to_json(path)?,
        None => JsonReport::failure("No image path provided").to_json()?,
    };

    println!("{envelope}");
    Ok(())
}
