//! Reading the producer's integer stream.

use std::io::BufRead;

use log::{debug, warn};

/// Read a single line from `reader`.
///
/// Invalid UTF-8 is replaced rather than rejected, so everything before it
/// still parses and the bad bytes become a non-integer token. An I/O error
/// is treated like end of input and keeps whatever was read before it.
pub fn read_line<R: BufRead>(mut reader: R) -> String {
    let mut buf = Vec::new();
    if let Err(err) = reader.read_until(b'\n', &mut buf) {
        warn!("Failed to read input, treating as end of stream: {}", err);
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Parse whitespace-separated integers, stopping at the first token that is
/// not an integer.
pub fn parse_values(line: &str) -> impl Iterator<Item = i64> + '_ {
    line.split_whitespace()
        .map_while(|token| match token.parse::<i64>() {
            Ok(value) => Some(value),
            Err(_) => {
                debug!("Stopping at non-integer token '{}'", token);
                None
            }
        })
}
