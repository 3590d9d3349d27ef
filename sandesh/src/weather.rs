use rand::seq::SliceRandom;
use rand::Rng;

/// Readings the header banner rotates through; there is no real weather feed.
pub const TEMPERATURES: [&str; 5] = ["22°C", "24°C", "25°C", "23°C", "26°C"];

/// Banner text for the `temperature` element
pub fn sample_temperature<R: Rng + ?Sized>(rng: &mut R) -> String {
    let reading = TEMPERATURES.choose(rng).copied().unwrap_or(TEMPERATURES[0]);
    format!("Temperature: {}", reading)
}
