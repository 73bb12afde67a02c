//! Opcode input parsing.

use std::io::BufRead;

use anyhow::Context;

const BYTE_LITERAL: &str = "[]byte{";

/// Strip a leading `0x`, then a leading `0X`.
pub fn strip_hex_prefix(text: &str) -> &str {
    let text = text.strip_prefix("0x").unwrap_or(text);
    text.strip_prefix("0X").unwrap_or(text)
}

/// Decode a hex opcode string, stripping a leading `0x` or `0X`.
pub fn parse_hex_opcode(text: &str) -> Result<Vec<u8>, hex::FromHexError> {
    hex::decode(strip_hex_prefix(text))
}

/// Collect the bytes of every Go `[]byte{...}` literal in `reader`.
///
/// Only the first literal on each line is read. Lines without a complete
/// literal are skipped.
pub fn parse_byte_literals(reader: impl BufRead) -> anyhow::Result<Vec<u8>> {
    let mut bytes = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line.context("failed to read standard input")?;
        let Some(body) = literal_body(&line) else {
            continue;
        };

        let literal = parse_literal_body(body)
            .with_context(|| format!("line {}: invalid byte literal `{body}`", index + 1))?;
        bytes.extend(literal);
    }

    Ok(bytes)
}

fn literal_body(line: &str) -> Option<&str> {
    let start = line.find(BYTE_LITERAL)? + BYTE_LITERAL.len();
    let rest = &line[start..];
    let end = rest.find('}')?;
    Some(&rest[..end])
}

fn parse_literal_body(body: &str) -> Result<Vec<u8>, hex::FromHexError> {
    let digits: String = body
        .split(',')
        .map(|element| {
            let element = element.trim();
            let element = element.strip_prefix("0x").unwrap_or(element);
            if element.len() == 1 {
                format!("0{element}")
            } else {
                element.to_string()
            }
        })
        .collect();

    hex::decode(digits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_opcode() {
        assert_eq!(parse_hex_opcode("ff03ffb8").unwrap(), [0xff, 0x03, 0xff, 0xb8]);
        assert_eq!(parse_hex_opcode("0x41887001").unwrap(), [0x41, 0x88, 0x70, 0x01]);
        assert_eq!(parse_hex_opcode("0XDF031E4B").unwrap(), [0xdf, 0x03, 0x1e, 0x4b]);
        assert!(parse_hex_opcode("").unwrap().is_empty());
    }

    #[test]
    fn test_invalid_hex_opcode() {
        assert!(parse_hex_opcode("xyz").is_err());
        assert!(parse_hex_opcode("abc").is_err());
    }

    #[test]
    fn test_byte_literals() {
        let input = "\
            {name: \"movb\", code: []byte{0x41, 0x88, 0x70, 0x1}},\n\
            // no literal here\n\
            {name: \"imm\", code: []byte{0x41, 0xc6, 0x80, 0xdb, 0x4, 0x0, 0x0, 0x9c}},\n";

        let bytes = parse_byte_literals(input.as_bytes()).unwrap();

        assert_eq!(
            bytes,
            [0x41, 0x88, 0x70, 0x01, 0x41, 0xc6, 0x80, 0xdb, 0x04, 0x00, 0x00, 0x9c]
        );
    }

    #[test]
    fn test_byte_literal_trailing_comma() {
        let bytes = parse_byte_literals("[]byte{0xff, 0x3,}".as_bytes()).unwrap();
        assert_eq!(bytes, [0xff, 0x03]);
    }

    #[test]
    fn test_unterminated_literal_is_skipped() {
        let bytes = parse_byte_literals("[]byte{0x90, 0x90\n".as_bytes()).unwrap();
        assert!(bytes.is_empty());
    }

    #[test]
    fn test_invalid_literal_reports_line() {
        let err = parse_byte_literals("\n[]byte{0xzz}\n".as_bytes()).unwrap_err();
        assert!(err.to_string().starts_with("line 2:"));
    }
}
