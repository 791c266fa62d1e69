/// Decodes RFC 2047 encoded words in a raw header value (subject, display name).
pub fn decode_header_value(raw: &[u8]) -> String {
    // mailparse only decodes a complete "Name: value" line
    let mut line = b"X: ".to_vec();
    line.extend_from_slice(raw);
    line.extend_from_slice(b"\r\n");

    mailparse::parse_header(&line)
        .map(|(header, _)| header.get_value())
        .unwrap_or_else(|_| String::from_utf8_lossy(raw).into_owned())
}

/// Collapses whitespace runs to single spaces and cuts at `max_chars`.
pub fn normalize_snippet(s: &str, max_chars: usize) -> String {
    let mut out = String::new();
    for word in s.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
        if out.chars().count() >= max_chars {
            break;
        }
    }
    out.chars().take(max_chars).collect()
}
