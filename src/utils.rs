pub(crate) fn hex16(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex16_renders_lowercase_fixed_width() {
        assert_eq!(hex16(&[0x00, 0x00, 0x12, 0x34, 0x56, 0x78, 0x9a, 0xbc]), "0000123456789abc");
        assert_eq!(hex16(&[0; 8]), "0000000000000000");
    }
}
