//! Cleaning of raw model output.

/// Literal that ends the prompt; anything before its last occurrence is echo.
pub const OUTPUT_MARKER: &str = "### Output:";

/// Diagnostic line prefixes printed by llama.cpp builds on stdout.
const NOISE_PREFIXES: &[&str] = &["main:", "llama_", "sampling:", "build:"];

/// Strips banner noise and echoed prompt text from raw process output.
///
/// Carriage returns are removed, empty and noise lines dropped, and if the
/// output marker is present only the text after its last occurrence is kept.
/// The result is trimmed and may be empty.
pub fn clean_output(raw: &str) -> String {
    let without_cr = raw.replace('\r', "");
    let combined = without_cr
        .split('\n')
        .filter(|line| !line.is_empty())
        .filter(|line| !is_noise(line))
        .collect::<Vec<_>>()
        .join("\n");
    let combined = combined.trim();

    let after_marker = match rfind_ignore_ascii_case(combined, OUTPUT_MARKER) {
        Some(index) => &combined[index + OUTPUT_MARKER.len()..],
        None => combined,
    };
    after_marker.trim().to_string()
}

fn is_noise(line: &str) -> bool {
    NOISE_PREFIXES.iter().any(|prefix| {
        line.get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    })
}

fn rfind_ignore_ascii_case(haystack: &str, needle: &str) -> Option<usize> {
    // The needle is ASCII, so lowercasing ASCII keeps byte offsets aligned.
    haystack
        .to_ascii_lowercase()
        .rfind(&needle.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banner_and_marker_are_stripped() {
        let raw = "llama_model: loading\n### Output:\nHello there\n";
        assert_eq!(clean_output(raw), "Hello there");
    }

    #[test]
    fn test_echoed_prompt_before_last_marker_is_dropped() {
        let raw = "You generate quicktexts.\nRequest: hi\n\n### Output:\nnot this\n### output:\r\nFinal text\r\n";
        assert_eq!(clean_output(raw), "Final text");
    }

    #[test]
    fn test_noise_prefixes_are_case_insensitive() {
        let raw = "MAIN: n_ctx = 512\nBuild: 1234\nSampling: temp\nkept line\n";
        assert_eq!(clean_output(raw), "kept line");
    }

    #[test]
    fn test_without_marker_keeps_everything_meaningful() {
        let raw = "Line one\n\n\nLine two\n";
        assert_eq!(clean_output(raw), "Line one\nLine two");
    }

    #[test]
    fn test_only_noise_is_blank() {
        assert_eq!(clean_output("llama_print_timings: x\n### Output:\n  \n"), "");
    }

    #[test]
    fn test_multibyte_text_is_preserved() {
        let raw = "### Output:\nMerci beaucoup, à bientôt ✓\n";
        assert_eq!(clean_output(raw), "Merci beaucoup, à bientôt ✓");
    }
}
