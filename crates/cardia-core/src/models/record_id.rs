use jiff::Timestamp;
use uuid::Uuid;

const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 5;

/// Generate a record id: the creation time in base 36 followed by a short
/// random base-36 suffix.
///
/// Two records created in the same millisecond collide with probability
/// 1 in 36^5. Nothing checks for that.
pub fn generate(now: Timestamp) -> String {
    let millis = u128::try_from(now.as_millisecond()).unwrap_or(0);
    let mut id = base36(millis);

    let mut random = Uuid::new_v4().as_u128();
    for _ in 0..SUFFIX_LEN {
        id.push(ALPHABET[(random % 36) as usize] as char);
        random /= 36;
    }
    id
}

fn base36(mut n: u128) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(ALPHABET[(n % 36) as usize]);
        n /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}
