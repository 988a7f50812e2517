//! IES LM-63 text generation.
//!
//! [`generate_ies`] is the structural inverse of
//! [`parse_ies`](crate::parsing::ies_parser::parse_ies): angles and candela
//! values survive a parse/generate round trip exactly, because `f64` display
//! formatting is the shortest representation that parses back to the same
//! value. Tilt data is never re-emitted (`TILT=NONE`) and the candela
//! multiplier is written as 1 since stored values are already scaled.

use crate::models::PhotometricFile;

/// Values written per line in angle lists and candela rows.
const VALUES_PER_LINE: usize = 10;

const DEFAULT_FORMAT_LINE: &str = "IESNA:LM-63-2002";

/// Render `file` as IES LM-63 text.
pub fn generate_ies(file: &PhotometricFile) -> String {
    let mut out = String::new();
    let header = file.header();

    out.push_str(header.format_line.as_deref().unwrap_or(DEFAULT_FORMAT_LINE));
    out.push('\n');
    if header.keywords.is_empty() {
        out.push_str("[TEST] generated\n");
        out.push_str("[LUMINAIRE] unspecified\n");
    }
    for (keyword, value) in &header.keywords {
        out.push_str(&format!("[{}] {}\n", keyword, value));
    }
    out.push_str("TILT=NONE\n");

    let dimensions = file.dimensions();
    out.push_str(&format!(
        "{} {} 1 {} {} {} {} {} {} {}\n",
        file.lamp_count(),
        file.lumens_per_lamp(),
        file.vertical_angles().len(),
        file.horizontal_angles().len(),
        file.photometric_type().code(),
        file.units().code(),
        dimensions.width,
        dimensions.length,
        dimensions.height,
    ));
    out.push_str(&format!(
        "{} {} {}\n",
        file.ballast_factor(),
        file.ballast_lamp_factor(),
        file.input_watts()
    ));

    push_wrapped(&mut out, file.vertical_angles());
    push_wrapped(&mut out, file.horizontal_angles());
    for row in file.candela() {
        push_wrapped(&mut out, row);
    }

    out
}

fn push_wrapped(out: &mut String, values: &[f64]) {
    for chunk in values.chunks(VALUES_PER_LINE) {
        let line = chunk
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        out.push_str(&line);
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PhotometricData;

    #[test]
    fn test_generate_layout() {
        let file = PhotometricFile::new(PhotometricData::from_table(
            (0..=12).map(|i| i as f64 * 7.5).collect(),
            vec![0.0],
            vec![(0..=12).map(|i| 1200.0 - i as f64 * 100.0).collect()],
        ))
        .unwrap();

        let text = generate_ies(&file);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "IESNA:LM-63-2002");
        assert_eq!(lines[3], "TILT=NONE");
        assert_eq!(lines[4], "1 -1 1 13 1 1 2 0 0 0");
        assert_eq!(lines[5], "1 1 0");
        // 13 vertical angles wrap onto two lines
        assert_eq!(lines[6].split_whitespace().count(), 10);
        assert_eq!(lines[7], "75 82.5 90");
        assert_eq!(lines[8], "0");
        assert_eq!(lines.len(), 11);
    }

    #[test]
    fn test_generate_keeps_keyword_lines() {
        let mut data =
            PhotometricData::from_table(vec![0.0, 90.0], vec![0.0], vec![vec![500.0, 0.0]]);
        data.header.format_line = Some("IESNA91".to_string());
        data.header.keywords = vec![
            ("TEST".to_string(), "bench 7".to_string()),
            ("MANUFAC".to_string(), "Example Horticulture".to_string()),
        ];
        let text = generate_ies(&PhotometricFile::new(data).unwrap());
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[..4],
            ["IESNA91", "[TEST] bench 7", "[MANUFAC] Example Horticulture", "TILT=NONE"]
        );
        assert!(text.ends_with("500 0\n"));
    }
}
