//! Hex/ASCII rendering of raw datagrams for debug logging

use log::debug;

const BYTES_PER_LINE: usize = 16;

/// Renders `bytes` as dump lines: an ASCII column, ` |`, then the hex column.
///
/// Both columns get an extra space after the eighth byte and are padded on the
/// last line so the separator stays aligned.
pub fn lines(bytes: &[u8]) -> Vec<String> {
    bytes
        .chunks(BYTES_PER_LINE)
        .map(|chunk| {
            let mut line = String::with_capacity(BYTES_PER_LINE * 4 + 4);

            for k in 0..BYTES_PER_LINE {
                if k == 8 {
                    line.push(' ');
                }
                match chunk.get(k) {
                    Some(&c) if (32..=126).contains(&c) => line.push(c as char),
                    Some(_) => line.push('.'),
                    None => line.push(' '),
                }
            }

            line.push_str(" |");
            for k in 0..BYTES_PER_LINE {
                if k == 8 {
                    line.push(' ');
                }
                match chunk.get(k) {
                    Some(c) => line.push_str(&format!(" {:02x}", c)),
                    None => line.push_str("   "),
                }
            }

            line
        })
        .collect()
}

/// Logs a dump of `bytes` at debug level, each line tagged with `prefix`.
pub fn log_prefix(bytes: &[u8], prefix: &str) {
    for line in lines(bytes) {
        debug!("{} {}", prefix, line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_has_no_lines() {
        assert!(lines(&[]).is_empty());
    }

    #[test]
    fn test_single_short_line() {
        let dump = lines(&[0x00, 0x02, b'A']);
        assert_eq!(dump.len(), 1);

        let line = &dump[0];
        assert!(line.starts_with("..A"));
        assert!(line.contains(" | 00 02 41"));
    }

    #[test]
    fn test_line_width_is_constant() {
        let full: Vec<u8> = (0..16).collect();
        let partial: Vec<u8> = (0..3).collect();

        let full_line = &lines(&full)[0];
        let partial_line = &lines(&partial)[0];
        assert_eq!(full_line.len(), partial_line.len());
    }

    #[test]
    fn test_splits_every_sixteen_bytes() {
        let data: Vec<u8> = (0..40).collect();
        let dump = lines(&data);

        assert_eq!(dump.len(), 3);
        assert!(dump[1].contains(" 10 11 12"));
        assert!(dump[2].contains(" 20 21"));
    }

    #[test]
    fn test_gap_after_eighth_byte() {
        let data = *b"ABCDEFGHIJKLMNOP";
        let line = &lines(&data)[0];

        assert!(line.starts_with("ABCDEFGH IJKLMNOP |"));
        assert!(line.contains(" 48  49"));
    }
}
