//! IES LM-63 photometric file parser.
//!
//! The parser only consumes text that has already been read; locating and
//! reading `.ies` files is the caller's job (see [`crate::io::loaders`]).
//!
//! # Layout
//!
//! ```text
//! IESNA:LM-63-2002
//! [KEYWORD] value            header, free form
//! TILT=NONE | INCLUDE | <file>
//! <4 tilt lines>             only for TILT=INCLUDE, skipped
//! lamps lm/lamp mult nV nH type units width length height
//! ballast_factor ballast_lamp_factor input_watts
//! nV vertical angles         may wrap across lines
//! nH horizontal angles       may wrap across lines
//! nH rows of nV candela      may wrap across lines
//! ```

use std::collections::VecDeque;

use crate::error::{LightingError, LightingResult};
use crate::models::{
    IesHeader, LuminaireDimensions, PhotometricData, PhotometricFile, PhotometricType, Tilt,
    UnitsType,
};

/// Number of lines in an inline `TILT=INCLUDE` block.
const TILT_BLOCK_LINES: usize = 4;

/// Upper bound for up-front allocations driven by declared counts.
const MAX_PREALLOCATION: usize = 4096;

/// Parse IES LM-63 text into a validated [`PhotometricFile`].
///
/// # Errors
/// `FormatError` when the `TILT=` directive is missing, a numeric field is
/// malformed, or the input ends before the declared angle and candela counts
/// are satisfied. No partially parsed file is ever returned.
pub fn parse_ies(text: &str) -> LightingResult<PhotometricFile> {
    let lines: Vec<&str> = text
        .trim_start_matches('\u{feff}')
        .lines()
        .collect();

    let tilt_index = lines
        .iter()
        .position(|line| is_tilt_line(line))
        .ok_or_else(|| LightingError::FormatError("missing TILT= directive".to_string()))?;

    let header = parse_header(&lines[..tilt_index]);
    let tilt = parse_tilt(lines[tilt_index]);

    let mut data_start = tilt_index + 1;
    if tilt == Tilt::Include {
        if lines.len() < data_start + TILT_BLOCK_LINES {
            return Err(LightingError::format_at(
                lines.len(),
                "input ends inside the TILT=INCLUDE block",
            ));
        }
        log::warn!("Skipping inline TILT=INCLUDE block; tilt factors are not applied");
        data_start += TILT_BLOCK_LINES;
    }

    let mut cursor = TokenCursor::new(&lines, data_start);

    // Photometric line
    let lamp_count = cursor.take_count("lamp count")?;
    let lumens_per_lamp = cursor.take_number("lumens per lamp")?;
    let candela_multiplier = cursor.take_number("candela multiplier")?;
    let vertical_count = cursor.take_count("vertical angle count")?;
    let horizontal_count = cursor.take_count("horizontal angle count")?;
    let photometric_code = cursor.take_count("photometric type")?;
    let units_code = cursor.take_count("units type")?;
    let dimensions = LuminaireDimensions {
        width: cursor.take_number("luminous width")?,
        length: cursor.take_number("luminous length")?,
        height: cursor.take_number("luminous height")?,
    };

    // Ballast line
    let ballast_factor = cursor.take_number("ballast factor")?;
    let ballast_lamp_factor = cursor.take_number("ballast-lamp factor")?;
    let input_watts = cursor.take_number("input watts")?;

    if vertical_count == 0 || horizontal_count == 0 {
        return Err(LightingError::format_at(
            cursor.current_line(),
            format!(
                "angle counts must be positive, got {} vertical and {} horizontal",
                vertical_count, horizontal_count
            ),
        ));
    }
    if candela_multiplier <= 0.0 {
        return Err(LightingError::format_at(
            cursor.current_line(),
            format!("candela multiplier must be positive, got {}", candela_multiplier),
        ));
    }
    let photometric_type = PhotometricType::from_code(photometric_code as i64).ok_or_else(|| {
        LightingError::format_at(
            cursor.current_line(),
            format!("unknown photometric type {}", photometric_code),
        )
    })?;
    let units = UnitsType::from_code(units_code as i64).ok_or_else(|| {
        LightingError::format_at(
            cursor.current_line(),
            format!("unknown units type {}", units_code),
        )
    })?;
    if lumens_per_lamp < 0.0 {
        log::warn!(
            "Absolute photometry (lumens per lamp {}), deriving lumens from candela",
            lumens_per_lamp
        );
    }

    let vertical_angles = cursor.take_numbers(vertical_count, "vertical angles")?;
    let horizontal_angles = cursor.take_numbers(horizontal_count, "horizontal angles")?;

    let mut candela = Vec::with_capacity(horizontal_count.min(MAX_PREALLOCATION));
    for _ in 0..horizontal_count {
        let row = cursor.take_numbers(vertical_count, "candela values")?;
        candela.push(row.into_iter().map(|c| c * candela_multiplier).collect());
    }

    if cursor.has_remaining() {
        log::debug!("Ignoring trailing data after candela table");
    }

    PhotometricFile::new(PhotometricData {
        header,
        tilt,
        lamp_count: lamp_count as u32,
        lumens_per_lamp,
        candela_multiplier,
        photometric_type,
        units,
        dimensions,
        ballast_factor,
        ballast_lamp_factor,
        input_watts,
        vertical_angles,
        horizontal_angles,
        candela,
    })
}

fn is_tilt_line(line: &str) -> bool {
    line.trim_start()
        .get(..5)
        .map_or(false, |prefix| prefix.eq_ignore_ascii_case("TILT="))
}

fn parse_tilt(line: &str) -> Tilt {
    let value = line.trim()[5..].trim();
    if value.eq_ignore_ascii_case("NONE") {
        Tilt::None
    } else if value.eq_ignore_ascii_case("INCLUDE") {
        Tilt::Include
    } else {
        Tilt::File(value.to_string())
    }
}

fn parse_header(lines: &[&str]) -> IesHeader {
    let mut header = IesHeader::default();

    for line in lines.iter().map(|l| l.trim()).filter(|l| !l.is_empty()) {
        if header.format_line.is_none()
            && header.keywords.is_empty()
            && line.to_ascii_uppercase().starts_with("IESNA")
        {
            header.format_line = Some(line.to_string());
            continue;
        }

        let Some(rest) = line.strip_prefix('[') else {
            continue;
        };
        let Some((keyword, value)) = rest.split_once(']') else {
            continue;
        };
        let keyword = keyword.trim().to_ascii_uppercase();
        let value = value.trim().to_string();

        match header.keywords.last_mut() {
            Some((_, previous)) if keyword == "MORE" => {
                previous.push(' ');
                previous.push_str(&value);
            }
            _ => header.keywords.push((keyword, value)),
        }
    }

    header
}

/// Whitespace/comma separated numeric tokens over a line range, consuming
/// further lines only when the current one is exhausted.
struct TokenCursor<'a> {
    lines: &'a [&'a str],
    next_line: usize,
    pending: VecDeque<(&'a str, usize)>,
}

impl<'a> TokenCursor<'a> {
    fn new(lines: &'a [&'a str], start: usize) -> Self {
        Self {
            lines,
            next_line: start,
            pending: VecDeque::new(),
        }
    }

    /// 1-based number of the last line pulled into the cursor.
    fn current_line(&self) -> usize {
        self.next_line.max(1)
    }

    fn has_remaining(&mut self) -> bool {
        self.next_token().is_some()
    }

    fn next_token(&mut self) -> Option<(&'a str, usize)> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return Some(token);
            }
            let line = *self.lines.get(self.next_line)?;
            self.next_line += 1;
            let line_number = self.next_line;
            self.pending.extend(
                line.split(|c: char| c.is_whitespace() || c == ',')
                    .filter(|t| !t.is_empty())
                    .map(|t| (t, line_number)),
            );
        }
    }

    fn take_number(&mut self, what: &str) -> LightingResult<f64> {
        let (token, line) = self.next_token().ok_or_else(|| {
            LightingError::format_at(
                self.lines.len(),
                format!("unexpected end of input while reading {}", what),
            )
        })?;
        parse_number(token, line, what)
    }

    fn take_count(&mut self, what: &str) -> LightingResult<usize> {
        let (token, line) = self.next_token().ok_or_else(|| {
            LightingError::format_at(
                self.lines.len(),
                format!("unexpected end of input while reading {}", what),
            )
        })?;
        let value = parse_number(token, line, what)?;
        if value < 0.0 || value.fract() != 0.0 || value > u32::MAX as f64 {
            return Err(LightingError::format_at(
                line,
                format!("{} must be a non-negative integer, got '{}'", what, token),
            ));
        }
        Ok(value as usize)
    }

    fn take_numbers(&mut self, count: usize, what: &str) -> LightingResult<Vec<f64>> {
        let mut values = Vec::with_capacity(count.min(MAX_PREALLOCATION));
        while values.len() < count {
            match self.next_token() {
                Some((token, line)) => values.push(parse_number(token, line, what)?),
                None => {
                    return Err(LightingError::format_at(
                        self.lines.len(),
                        format!("expected {} {}, found {}", count, what, values.len()),
                    ))
                }
            }
        }
        Ok(values)
    }
}

fn parse_number(token: &str, line: usize, what: &str) -> LightingResult<f64> {
    match token.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(LightingError::format_at(
            line,
            format!("malformed {} value '{}'", what, token),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tilt_line_detection() {
        assert!(is_tilt_line("TILT=NONE"));
        assert!(is_tilt_line("  tilt=include"));
        assert!(!is_tilt_line("[TEST] TILT"));
        assert!(!is_tilt_line("TIL"));
    }

    #[test]
    fn test_parse_tilt_variants() {
        assert_eq!(parse_tilt("TILT=NONE"), Tilt::None);
        assert_eq!(parse_tilt("TILT=INCLUDE"), Tilt::Include);
        assert_eq!(
            parse_tilt("TILT= lamp_tilt.dat"),
            Tilt::File("lamp_tilt.dat".to_string())
        );
    }

    #[test]
    fn test_header_keywords_and_more() {
        let header = parse_header(&[
            "IESNA:LM-63-2002",
            "[TEST] 12345",
            "[LUMINAIRE] LED top light",
            "[MORE] 1000W equivalent",
            "free form line",
        ]);
        assert_eq!(header.format_line.as_deref(), Some("IESNA:LM-63-2002"));
        assert_eq!(header.keyword("test"), Some("12345"));
        assert_eq!(
            header.keyword("LUMINAIRE"),
            Some("LED top light 1000W equivalent")
        );
        assert_eq!(header.keywords.len(), 2);
    }

    #[test]
    fn test_token_cursor_wraps_lines() {
        let lines = ["0 10 20", "30,40", "", "50"];
        let mut cursor = TokenCursor::new(&lines, 0);
        let values = cursor.take_numbers(6, "vertical angles").unwrap();
        assert_eq!(values, vec![0.0, 10.0, 20.0, 30.0, 40.0, 50.0]);
        assert!(!cursor.has_remaining());
    }

    #[test]
    fn test_token_cursor_reports_shortfall() {
        let lines = ["0 10 20"];
        let mut cursor = TokenCursor::new(&lines, 0);
        let err = cursor.take_numbers(5, "vertical angles").unwrap_err();
        assert!(err.to_string().contains("expected 5 vertical angles, found 3"));
    }

    #[test]
    fn test_parse_number_rejects_non_finite() {
        assert!(parse_number("inf", 3, "candela values").is_err());
        assert!(parse_number("NaN", 3, "candela values").is_err());
        assert_eq!(parse_number("1.5e2", 3, "candela values").unwrap(), 150.0);
    }
}
