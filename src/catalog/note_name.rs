//! Note names embedded in sample filenames.
//!
//! Two layouts are recognized:
//! - note+octave glued to the end of the stem: `tromboneA2.wav`, `Cs4.wav`
//! - note+octave as an underscore-delimited token: `viola_Cs4_mf_arco.wav`
//!
//! Sharps are written `s` or `#`, flats `b`.

/// A parsed note: MIDI number and the octave it was written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteName {
    pub midi: u8,
    pub octave: i32,
}

/// Parse a whole token such as `A2`, `Cs4`, `F#3`, `Bb1`.
pub fn parse_note_token(token: &str) -> Option<NoteName> {
    let bytes = token.as_bytes();
    if bytes.len() < 2 {
        return None;
    }

    let mut semitone: i32 = match bytes[0] {
        b'C' => 0,
        b'D' => 2,
        b'E' => 4,
        b'F' => 5,
        b'G' => 7,
        b'A' => 9,
        b'B' => 11,
        _ => return None,
    };

    let mut idx = 1;
    match bytes[idx] {
        b's' | b'#' => {
            semitone += 1;
            idx += 1;
        }
        b'b' => {
            semitone -= 1;
            idx += 1;
        }
        _ => {}
    }

    let octave_str = &token[idx..];
    if octave_str.is_empty() || !octave_str.trim_start_matches('-').bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let octave: i32 = octave_str.parse().ok()?;

    let midi = (octave + 1) * 12 + semitone;
    if !(0..=127).contains(&midi) {
        return None;
    }
    Some(NoteName {
        midi: midi as u8,
        octave,
    })
}

/// Strip a short alphanumeric extension (`.wav`, `.mp3`, `.flac`).
fn stem(filename: &str) -> &str {
    let name = filename.rsplit('/').next().unwrap_or(filename);
    match name.rsplit_once('.') {
        Some((stem, ext)) if !ext.is_empty() && ext.len() <= 4 && ext.bytes().all(|b| b.is_ascii_alphanumeric()) => stem,
        _ => name,
    }
}

/// Extract the note from a sample filename, or `None` if it has none.
pub fn parse_sample_filename(filename: &str) -> Option<NoteName> {
    let stem = stem(filename);

    // Delimited token, rightmost first.
    if let Some(note) = stem.rsplit(['_', ' ']).find_map(parse_note_token) {
        return Some(note);
    }

    // Glued suffix, shortest first (`A2` before `xA2`).
    (2..=5)
        .filter(|&n| n <= stem.len() && stem.is_char_boundary(stem.len() - n))
        .find_map(|n| parse_note_token(&stem[stem.len() - n..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn midi(name: &str) -> Option<u8> {
        parse_sample_filename(name).map(|n| n.midi)
    }

    #[test]
    fn tokens() {
        assert_eq!(parse_note_token("A4").map(|n| n.midi), Some(69));
        assert_eq!(parse_note_token("C4").map(|n| n.midi), Some(60));
        assert_eq!(parse_note_token("Cs4").map(|n| n.midi), Some(61));
        assert_eq!(parse_note_token("F#3").map(|n| n.midi), Some(54));
        assert_eq!(parse_note_token("Bb1").map(|n| n.midi), Some(34));
        assert_eq!(parse_note_token("C-1").map(|n| n.midi), Some(0));
        assert_eq!(parse_note_token("A2").map(|n| n.octave), Some(2));
    }

    #[test]
    fn non_notes_are_rejected() {
        assert_eq!(parse_note_token("arco"), None);
        assert_eq!(parse_note_token("f"), None);
        assert_eq!(parse_note_token("Ab"), None);
        assert_eq!(parse_note_token("G12"), None);
        assert_eq!(parse_note_token("mf"), None);
    }

    #[test]
    fn suffix_convention() {
        assert_eq!(midi("trombone_medium_A2.wav"), Some(45));
        assert_eq!(midi("tromboneA2.wav"), Some(45));
        assert_eq!(midi("Cs4.wav"), Some(61));
        assert_eq!(midi("cello/celloAs2.wav"), Some(46));
    }

    #[test]
    fn token_convention() {
        assert_eq!(midi("viola_Cs4_mf_arco.wav"), Some(61));
        assert_eq!(midi("cello_D3_forte_01.mp3"), Some(50));
    }

    #[test]
    fn unparseable_names() {
        assert_eq!(midi("readme.txt"), None);
        assert_eq!(midi("noise_long.wav"), None);
        assert_eq!(midi(""), None);
    }
}
