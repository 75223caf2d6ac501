//! Tone-number pinyin to diacritics: `ni3` → `nǐ`.

/// Vowels in the order they take the tone mark.
const PRECEDENCE: [char; 6] = ['a', 'o', 'e', 'i', 'u', 'v'];

/// Marked forms for tones 1–4 followed by the neutral form.
fn tone_forms(vowel: char) -> Option<[char; 5]> {
    let forms = match vowel {
        'a' => ['ā', 'á', 'ǎ', 'à', 'a'],
        'e' => ['ē', 'é', 'ě', 'è', 'e'],
        'i' => ['ī', 'í', 'ǐ', 'ì', 'i'],
        'o' => ['ō', 'ó', 'ǒ', 'ò', 'o'],
        'u' => ['ū', 'ú', 'ǔ', 'ù', 'u'],
        'v' | 'ü' => ['ǖ', 'ǘ', 'ǚ', 'ǜ', 'ü'],
        _ => return None,
    };
    Some(forms)
}

fn precedence(c: char) -> Option<usize> {
    let lower = to_lower(c);
    let lower = if lower == 'ü' { 'v' } else { lower };
    PRECEDENCE.iter().position(|&v| v == lower)
}

fn to_lower(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

/// Column in [`tone_forms`] for a tone digit. Digits outside 0–5 mark nothing.
fn tone_column(digit: char) -> Option<usize> {
    match digit {
        '1'..='4' => digit.to_digit(10).map(|d| d as usize - 1),
        '0' | '5' => Some(4),
        _ => None,
    }
}

/// Convert numbered-tone pinyin into diacritic form.
///
/// Each tone digit marks one vowel among the letters written since the
/// previous digit, chosen by the precedence `a, o, e, i, u, v`; the digit
/// itself is dropped. In a toned syllable `u:` and `v` are written as `ü`.
/// Case is preserved.
/// A digit with no vowel before it is dropped without marking anything.
///
/// ```
/// use poemdown::pinyin::convert_tone;
/// assert_eq!(convert_tone("jiao3"), "jiǎo");
/// assert_eq!(convert_tone("lu:e4"), "lüè");
/// ```
pub fn convert_tone(syllable: &str) -> String {
    let normalized = syllable.replace("u:", "v").replace("U:", "V");
    let mut out: Vec<char> = Vec::with_capacity(normalized.len());
    let mut run_start = 0;

    for c in normalized.chars() {
        if !c.is_ascii_digit() {
            out.push(c);
            continue;
        }

        let target = out[run_start..]
            .iter()
            .enumerate()
            .rev()
            .filter_map(|(i, &v)| precedence(v).map(|p| (p, run_start + i)))
            .min_by_key(|&(p, _)| p)
            .map(|(_, i)| i);

        if let (Some(i), Some(column)) = (target, tone_column(c)) {
            let source = out[i];
            if let Some(forms) = tone_forms(to_lower(source)) {
                let marked = forms[column];
                out[i] = if source.is_lowercase() {
                    marked
                } else {
                    marked.to_uppercase().next().unwrap_or(marked)
                };
            }
        }
        for letter in &mut out[run_start..] {
            match *letter {
                'v' => *letter = 'ü',
                'V' => *letter = 'Ü',
                _ => {}
            }
        }
        run_start = out.len();
    }

    out.into_iter().collect()
}

/// Convert every whitespace-separated syllable in `text`, keeping the
/// separators as written.
pub fn convert_syllables(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut word = String::new();
    for c in text.chars() {
        if c.is_whitespace() {
            out.push_str(&convert_tone(&word));
            word.clear();
            out.push(c);
        } else {
            word.push(c);
        }
    }
    out.push_str(&convert_tone(&word));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("ni3", "nǐ")]
    #[case("hao3", "hǎo")]
    #[case("jiao3", "jiǎo")]
    #[case("hui4", "huì")]
    #[case("guo2", "guó")]
    #[case("xue2", "xué")]
    #[case("lu:e4", "lüè")]
    #[case("nv3", "nǚ")]
    #[case("lv5", "lü")]
    #[case("le5", "le")]
    #[case("ma0", "ma")]
    #[case("Ai4", "Ài")]
    #[case("ZHONG1", "ZHŌNG")]
    fn converts_single_syllables(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(convert_tone(input), expected);
    }

    #[test]
    fn digits_without_vowel_are_dropped() {
        assert_eq!(convert_tone("m2"), "m");
        assert_eq!(convert_tone("3"), "");
    }

    #[test]
    fn out_of_range_digits_mark_nothing() {
        assert_eq!(convert_tone("ma7"), "ma");
    }

    #[test]
    fn unmarked_input_is_unchanged() {
        assert_eq!(convert_tone("hao"), "hao");
        assert_eq!(convert_tone("nǐ hǎo"), "nǐ hǎo");
        assert_eq!(convert_tone("lve"), "lve");
        assert_eq!(convert_tone(""), "");
    }

    #[test]
    fn each_digit_only_sees_its_own_syllable() {
        assert_eq!(convert_tone("ni3hao3"), "nǐhǎo");
        assert_eq!(convert_tone("hao3ni3"), "hǎonǐ");
    }

    #[test]
    fn syllable_lists_keep_separators() {
        assert_eq!(convert_syllables("qiang1 di2"), "qiāng dí");
        assert_eq!(convert_syllables("zhou4  ye4"), "zhòu  yè");
    }

    #[test]
    fn tones_one_to_four_leave_exactly_one_mark() {
        for base in ["ba", "zhuang", "xiong", "que", "kuai"] {
            for tone in 1..=4 {
                let out = convert_tone(&format!("{}{}", base, tone));
                assert!(!out.chars().any(|c| c.is_ascii_digit()), "{}", out);
                let marked = out.chars().filter(|c| !c.is_ascii()).count();
                assert_eq!(marked, 1, "{}{} -> {}", base, tone, out);
            }
        }
    }
}
