use crate::error::Result;

/// Appends `s` as an escaped JSON string literal.
pub fn write_str(buf: &mut Vec<u8>, s: &str) -> Result<()> {
    serde_json::to_writer(&mut *buf, s).map_err(std::io::Error::from)?;
    Ok(())
}

pub fn write_str_array<S: AsRef<str>>(buf: &mut Vec<u8>, items: &[S]) -> Result<()> {
    buf.push(b'[');
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            buf.push(b',');
        }
        write_str(buf, item.as_ref())?;
    }
    buf.push(b']');
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_quotes_and_controls() {
        let mut buf = vec![];
        write_str(&mut buf, "a\"b\\c\nd").unwrap();
        assert_eq!(buf, br#""a\"b\\c\nd""#);
    }

    #[test]
    fn array() {
        let mut buf = vec![];
        write_str_array(&mut buf, &["env:prod", "role:\"db\""]).unwrap();
        let parsed: Vec<String> = serde_json::from_slice(&buf).unwrap();
        assert_eq!(parsed, ["env:prod", "role:\"db\""]);
    }
}
