const ID_ALPHABET: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
const ID_BASE: u64 = 62;

/// Encode a sequence number as a base-62 id
pub fn encode_id(mut number: u64) -> String {
    if number == 0 {
        return (ID_ALPHABET[0] as char).to_string();
    }

    let mut digits = Vec::new();
    while number > 0 {
        digits.push(ID_ALPHABET[(number % ID_BASE) as usize]);
        number /= ID_BASE;
    }
    digits.reverse();

    // Alphabet is ASCII
    digits.into_iter().map(char::from).collect()
}

/// Inverse of [`encode_id`]; `None` for characters outside the alphabet
pub fn decode_id(encoded: &str) -> Option<u64> {
    let mut number: u64 = 0;
    for byte in encoded.bytes() {
        let digit = ID_ALPHABET.iter().position(|&c| c == byte)? as u64;
        number = number.checked_mul(ID_BASE)?.checked_add(digit)?;
    }
    Some(number)
}
