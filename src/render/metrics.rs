//! Helvetica advance widths and greedy line wrapping.

/// Millimetres per PostScript point
pub const PT_TO_MM: f32 = 25.4 / 72.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Regular,
    Bold,
}

// Advance widths in 1/1000 em for ASCII 32..=126 (standard AFM metrics)
#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

// Latin-1 supplement, U+00A0..=U+00FF
#[rustfmt::skip]
const HELVETICA_LATIN1: [u16; 96] = [
    278, 333, 556, 556, 556, 556, 260, 556, 333, 737, 370, 556, 584, 333, 737, 333,
    400, 584, 333, 333, 333, 556, 537, 278, 333, 333, 365, 556, 834, 834, 834, 611,
    667, 667, 667, 667, 667, 667, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278,
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611,
    556, 556, 556, 556, 556, 556, 889, 500, 556, 556, 556, 556, 278, 278, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 584, 611, 556, 556, 556, 556, 500, 556, 500,
];

#[rustfmt::skip]
const HELVETICA_BOLD_LATIN1: [u16; 96] = [
    278, 333, 556, 556, 556, 556, 280, 556, 333, 737, 370, 556, 584, 333, 737, 333,
    400, 584, 333, 333, 333, 611, 556, 278, 333, 333, 365, 556, 834, 834, 834, 611,
    722, 722, 722, 722, 722, 722, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278,
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611,
    556, 556, 556, 556, 556, 556, 889, 556, 556, 556, 556, 556, 278, 278, 278, 278,
    611, 611, 611, 611, 611, 611, 611, 584, 611, 611, 611, 611, 611, 556, 611, 556,
];

const FALLBACK_WIDTH: u16 = 556;

fn char_width(c: char, style: FontStyle) -> u16 {
    let (ascii, latin1) = match style {
        FontStyle::Regular => (&HELVETICA, &HELVETICA_LATIN1),
        FontStyle::Bold => (&HELVETICA_BOLD, &HELVETICA_BOLD_LATIN1),
    };
    match c {
        ' '..='~' => ascii[(c as u32 - 0x20) as usize],
        '\u{A0}'..='\u{FF}' => latin1[(c as u32 - 0xA0) as usize],
        '\u{2022}' => 350,
        '\u{2013}' => 556,
        '\u{2014}' | '\u{2026}' => 1000,
        '\u{2018}' | '\u{2019}' => 222,
        '\u{201C}' | '\u{201D}' => 333,
        _ => FALLBACK_WIDTH,
    }
}

pub fn text_width_mm(text: &str, size_pt: f32, style: FontStyle) -> f32 {
    let units: u32 = text.chars().map(|c| u32::from(char_width(c, style))).sum();
    units as f32 / 1000.0 * size_pt * PT_TO_MM
}

/// Greedy word wrap. Explicit newlines start a new line; a word wider than
/// the line is split between characters.
pub fn wrap(text: &str, size_pt: f32, style: FontStyle, max_width_mm: f32) -> Vec<String> {
    let fits = |line: &str| text_width_mm(line, size_pt, style) <= max_width_mm;
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();

        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current, word)
            };

            if fits(&candidate) {
                current = candidate;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }

            if fits(word) {
                current = word.to_string();
            } else {
                for c in word.chars() {
                    current.push(c);
                    if !fits(&current) && current.chars().count() > 1 {
                        current.pop();
                        lines.push(std::mem::take(&mut current));
                        current.push(c);
                    }
                }
            }
        }

        if !current.is_empty() {
            lines.push(current);
        }
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_width_scales_with_size() {
        let small = text_width_mm("Contract", 10.0, FontStyle::Regular);
        let large = text_width_mm("Contract", 20.0, FontStyle::Regular);
        assert!((large - 2.0 * small).abs() < 1e-4);
        assert!(text_width_mm("Contract", 10.0, FontStyle::Bold) > small);
    }

    #[test]
    fn test_known_width() {
        // "Hi" = 722 + 222 units; at 10pt that is 9.44pt
        let width = text_width_mm("Hi", 10.0, FontStyle::Regular);
        assert!((width - 9.44 * PT_TO_MM).abs() < 1e-4);
    }

    #[test]
    fn test_latin1_widths() {
        assert_eq!(char_width('\u{E9}', FontStyle::Regular), 556);
        assert_eq!(char_width('\u{C6}', FontStyle::Regular), 1000);
        assert_eq!(char_width('\u{E7}', FontStyle::Regular), 500);
        assert_eq!(char_width('\u{E7}', FontStyle::Bold), 556);
        assert_eq!(char_width('\u{D6}', FontStyle::Bold), 778);
        assert_eq!(char_width('\u{FF}', FontStyle::Bold), 556);

        // The diaeresis does not change the advance of I
        let plain = text_width_mm("Ii", 10.0, FontStyle::Regular);
        let accented = text_width_mm("\u{CF}i", 10.0, FontStyle::Regular);
        assert!((plain - accented).abs() < 1e-4);
    }

    #[test]
    fn test_wrap_stays_within_width() {
        let text = "The project will be delivered in the following phases, each with its own deliverable and payment.";
        let lines = wrap(text, 11.0, FontStyle::Regular, 60.0);

        assert!(lines.len() > 1);
        for line in &lines {
            assert!(text_width_mm(line, 11.0, FontStyle::Regular) <= 60.0);
        }
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn test_wrap_splits_overlong_word() {
        let word = "W".repeat(40);
        let lines = wrap(&word, 12.0, FontStyle::Regular, 30.0);

        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), word);
    }

    #[test]
    fn test_wrap_keeps_explicit_newlines_and_drops_blank_text() {
        assert_eq!(
            wrap("first\nsecond", 10.0, FontStyle::Regular, 100.0),
            vec!["first".to_string(), "second".to_string()]
        );
        assert!(wrap("   ", 10.0, FontStyle::Regular, 100.0).is_empty());
    }
}
