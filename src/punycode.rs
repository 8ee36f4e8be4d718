//! Punycode (RFC 3492) codec plus the per-label domain wrapper used by the IDN tool.
//!
//! Labels are converted independently: pure-ASCII labels pass through, everything
//! else becomes `xn--` followed by the encoded label.
//!
//! # Examples
//!
//! ```rust
//! use devtools_core::punycode::{domain_to_ascii, domain_to_unicode};
//!
//! assert_eq!(domain_to_ascii("münchen.de")?, "xn--mnchen-3ya.de");
//! assert_eq!(domain_to_unicode("xn--mnchen-3ya.de")?, "münchen.de");
//! # Ok::<(), devtools_core::punycode::PunycodeError>(())
//! ```
use thiserror::Error;
use tracing::{debug, trace};

const BASE: u32 = 36;
const TMIN: u32 = 1;
const TMAX: u32 = 26;
const SKEW: u32 = 38;
const DAMP: u32 = 700;
const INITIAL_BIAS: u32 = 72;
const INITIAL_N: u32 = 128;
const DELIMITER: char = '-';

/// ASCII Compatible Encoding prefix marking an encoded label.
pub const ACE_PREFIX: &str = "xn--";

// Pasted input beyond this is rejected before the quadratic insert loop runs.
pub const MAX_DOMAIN_LEN: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PunycodeError {
    #[error("invalid punycode: non-ASCII character '{0}' in basic code points")]
    NonBasic(char),
    #[error("invalid punycode: '{0}' is not a base-36 digit")]
    InvalidDigit(char),
    #[error("invalid punycode: input ends in the middle of a number")]
    Truncated,
    #[error("invalid punycode: decoded value {0:#x} is not a valid code point")]
    InvalidCodePoint(u32),
    #[error("punycode arithmetic overflow")]
    Overflow,
    #[error("domain must be at most {MAX_DOMAIN_LEN} characters")]
    TooLong,
}

fn adapt(delta: u32, num_points: u32, first_time: bool) -> u32 {
    let mut delta = if first_time { delta / DAMP } else { delta / 2 };
    delta += delta / num_points;
    let mut k = 0;
    while delta > ((BASE - TMIN) * TMAX) / 2 {
        delta /= BASE - TMIN;
        k += BASE;
    }
    k + (((BASE - TMIN + 1) * delta) / (delta + SKEW))
}

fn threshold(k: u32, bias: u32) -> u32 {
    if k <= bias {
        TMIN
    } else if k >= bias + TMAX {
        TMAX
    } else {
        k - bias
    }
}

fn encode_digit(digit: u32) -> char {
    // 0..=25 map to 'a'..='z', 26..=35 map to '0'..='9'.
    let byte = if digit < 26 {
        b'a' + digit as u8
    } else {
        b'0' + (digit - 26) as u8
    };
    char::from(byte)
}

fn decode_digit(ch: char) -> Option<u32> {
    match ch {
        '0'..='9' => Some(ch as u32 - '0' as u32 + 26),
        'A'..='Z' => Some(ch as u32 - 'A' as u32),
        'a'..='z' => Some(ch as u32 - 'a' as u32),
        _ => None,
    }
}

/// Encodes a single Unicode label into its Punycode form (without the ACE prefix).
pub fn encode_label(label: &str) -> Result<String, PunycodeError> {
    let code_points: Vec<u32> = label.chars().map(u32::from).collect();
    let mut output: String = label.chars().filter(char::is_ascii).collect();
    let basic_len = output.chars().count() as u32;
    let total = code_points.len() as u32;
    if basic_len > 0 {
        output.push(DELIMITER);
    }

    let mut n = INITIAL_N;
    let mut delta: u32 = 0;
    let mut bias = INITIAL_BIAS;
    let mut handled = basic_len;

    while handled < total {
        let m = code_points
            .iter()
            .copied()
            .filter(|&cp| cp >= n)
            .min()
            .ok_or(PunycodeError::Overflow)?;
        delta = (m - n)
            .checked_mul(handled + 1)
            .and_then(|gap| delta.checked_add(gap))
            .ok_or(PunycodeError::Overflow)?;
        n = m;

        for &cp in &code_points {
            if cp < n {
                delta = delta.checked_add(1).ok_or(PunycodeError::Overflow)?;
            }
            if cp == n {
                let mut q = delta;
                let mut k = BASE;
                loop {
                    let t = threshold(k, bias);
                    if q < t {
                        break;
                    }
                    output.push(encode_digit(t + (q - t) % (BASE - t)));
                    q = (q - t) / (BASE - t);
                    k += BASE;
                }
                output.push(encode_digit(q));
                bias = adapt(delta, handled + 1, handled == basic_len);
                delta = 0;
                handled += 1;
            }
        }
        delta = delta.checked_add(1).ok_or(PunycodeError::Overflow)?;
        n = n.checked_add(1).ok_or(PunycodeError::Overflow)?;
    }

    trace!(label, encoded = %output, "encoded punycode label");
    Ok(output)
}

/// Decodes the Punycode part of a label (the text after `xn--`) back to Unicode.
pub fn decode_label(input: &str) -> Result<String, PunycodeError> {
    let (basic, extended) = match input.rfind(DELIMITER) {
        Some(pos) => (&input[..pos], &input[pos + 1..]),
        None => ("", input),
    };

    let mut output: Vec<char> = Vec::with_capacity(input.len());
    for ch in basic.chars() {
        if !ch.is_ascii() {
            return Err(PunycodeError::NonBasic(ch));
        }
        output.push(ch);
    }

    let mut n = INITIAL_N;
    let mut i: u32 = 0;
    let mut bias = INITIAL_BIAS;
    let mut digits = extended.chars();

    while let Some(first) = digits.next() {
        let old_i = i;
        let mut w: u32 = 1;
        let mut k = BASE;
        let mut next = Some(first);
        loop {
            let ch = next.ok_or(PunycodeError::Truncated)?;
            let digit = decode_digit(ch).ok_or(PunycodeError::InvalidDigit(ch))?;
            i = digit
                .checked_mul(w)
                .and_then(|step| i.checked_add(step))
                .ok_or(PunycodeError::Overflow)?;
            let t = threshold(k, bias);
            if digit < t {
                break;
            }
            w = w.checked_mul(BASE - t).ok_or(PunycodeError::Overflow)?;
            k += BASE;
            next = digits.next();
        }

        let length = output.len() as u32 + 1;
        bias = adapt(i - old_i, length, old_i == 0);
        n = n
            .checked_add(i / length)
            .ok_or(PunycodeError::Overflow)?;
        i %= length;
        let decoded = char::from_u32(n).ok_or(PunycodeError::InvalidCodePoint(n))?;
        output.insert(i as usize, decoded);
        i += 1;
    }

    Ok(output.into_iter().collect())
}

fn check_length(input: &str) -> Result<(), PunycodeError> {
    if input.chars().count() > MAX_DOMAIN_LEN {
        return Err(PunycodeError::TooLong);
    }
    Ok(())
}

fn strip_ace_prefix(label: &str) -> Option<&str> {
    let prefix = label.get(..ACE_PREFIX.len())?;
    prefix
        .eq_ignore_ascii_case(ACE_PREFIX)
        .then(|| &label[ACE_PREFIX.len()..])
}

/// Converts a Unicode domain into its ASCII form, label by label.
///
/// Input is lowercased first, so `MÜNCHEN.de` and `münchen.de` encode identically.
pub fn domain_to_ascii(input: &str) -> Result<String, PunycodeError> {
    check_length(input)?;
    let lowered = input.trim().to_lowercase();
    let labels = lowered
        .split('.')
        .map(|label| {
            if label.is_ascii() {
                Ok(label.to_string())
            } else {
                encode_label(label).map(|encoded| format!("{ACE_PREFIX}{encoded}"))
            }
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(labels.join("."))
}

/// Converts an ASCII domain back to Unicode, failing on the first malformed `xn--` label.
pub fn domain_to_unicode(input: &str) -> Result<String, PunycodeError> {
    check_length(input)?;
    let labels = input
        .trim()
        .split('.')
        .map(|label| match strip_ace_prefix(label) {
            Some(encoded) => decode_label(encoded),
            None => Ok(label.to_string()),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(labels.join("."))
}

/// Like [`domain_to_unicode`] but keeps malformed labels as typed instead of failing.
pub fn domain_to_unicode_lossy(input: &str) -> String {
    if check_length(input).is_err() {
        debug!(len = input.len(), "domain too long, returned as typed");
        return input.to_string();
    }
    input
        .trim()
        .split('.')
        .map(|label| match strip_ace_prefix(label) {
            Some(encoded) => decode_label(encoded).unwrap_or_else(|err| {
                debug!(label, %err, "keeping undecodable label");
                label.to_string()
            }),
            None => label.to_string(),
        })
        .collect::<Vec<_>>()
        .join(".")
}
