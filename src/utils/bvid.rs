//! Conversion between numeric video ids and their BV codes.
//!
//! The mapping is a pure bijection. The crawler uses it to look up video
//! titles and to accept either id form on the command line.

use crate::error::{AppError, Result};

const XOR_CODE: u64 = 23_442_827_791_579;
const MASK_CODE: u64 = 2_251_799_813_685_247;
const MAX_AID: u64 = 1 << 51;
const ALPHABET: &[u8; 58] = b"FcwAPNKTMug3GV5Lj7EJnHpWsx4tb8haYeviqBz6rkCy12mUSDQX9RdoZf";
const ENCODE_MAP: [usize; 9] = [8, 7, 0, 5, 1, 3, 2, 4, 6];
const PREFIX: &str = "BV1";
const BASE: u64 = ALPHABET.len() as u64;

/// Encode a numeric id (`aid`) as a BV code.
pub fn av_to_bv(aid: u64) -> Result<String> {
    if aid == 0 || aid >= MAX_AID {
        return Err(AppError::validation(format!("aid {aid} is out of range")));
    }

    let mut code = [0u8; 9];
    let mut tmp = (MAX_AID | aid) ^ XOR_CODE;
    for &slot in &ENCODE_MAP {
        code[slot] = ALPHABET[(tmp % BASE) as usize];
        tmp /= BASE;
    }

    let body = String::from_utf8_lossy(&code);
    Ok(format!("{PREFIX}{body}"))
}

/// Decode a BV code back into its numeric id.
pub fn bv_to_av(bvid: &str) -> Result<u64> {
    let body = bvid
        .strip_prefix(PREFIX)
        .ok_or_else(|| AppError::validation(format!("'{bvid}' does not start with {PREFIX}")))?
        .as_bytes();
    if body.len() != ENCODE_MAP.len() {
        return Err(AppError::validation(format!("'{bvid}' has the wrong length")));
    }

    let mut tmp: u64 = 0;
    for &slot in ENCODE_MAP.iter().rev() {
        let idx = ALPHABET
            .iter()
            .position(|&c| c == body[slot])
            .ok_or_else(|| AppError::validation(format!("'{bvid}' contains an invalid character")))?;
        tmp = tmp * BASE + idx as u64;
    }

    Ok((tmp & MASK_CODE) ^ XOR_CODE)
}

/// Which way an id was converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    AvToBv,
    BvToAv,
}

impl Direction {
    pub fn label(self) -> &'static str {
        match self {
            Direction::AvToBv => "AV->BV",
            Direction::BvToAv => "BV->AV",
        }
    }
}

/// One converted id, both forms normalised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    pub source: String,
    pub converted: String,
    pub direction: Direction,
}

/// Convert `av170001`, `170001` or `BV1...` into the other form.
pub fn convert(input: &str) -> Result<Conversion> {
    let input = input.trim();
    if is_bv(input) {
        let aid = bv_to_av(input)?;
        return Ok(Conversion {
            source: input.to_string(),
            converted: format!("av{aid}"),
            direction: Direction::BvToAv,
        });
    }

    let aid = parse_av(input)?;
    Ok(Conversion {
        source: format!("av{aid}"),
        converted: av_to_bv(aid)?,
        direction: Direction::AvToBv,
    })
}

/// Numeric video id from any accepted spelling (`170001`, `av170001`,
/// `BV1...`).
pub fn parse_aid(input: &str) -> Result<u64> {
    let input = input.trim();
    if is_bv(input) {
        bv_to_av(input)
    } else {
        parse_av(input)
    }
}

fn is_bv(input: &str) -> bool {
    input.get(..2).is_some_and(|p| p.eq_ignore_ascii_case("bv"))
}

fn parse_av(input: &str) -> Result<u64> {
    let digits = match input.get(..2) {
        Some(p) if p.eq_ignore_ascii_case("av") => &input[2..],
        _ => input,
    };
    let aid: u64 = digits
        .parse()
        .map_err(|_| AppError::validation(format!("'{input}' is not a video id")))?;
    if aid == 0 || aid >= MAX_AID {
        return Err(AppError::validation(format!("aid {aid} is out of range")));
    }
    Ok(aid)
}
