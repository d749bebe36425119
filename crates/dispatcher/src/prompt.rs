use lingopane_core::FeatureConfig;

/// Selections longer than this are silently truncated before the prompt is
/// built; the remainder is never transmitted.
pub const MAX_INPUT_CHARS: usize = 500;

pub const DEFAULT_TARGET_LANGUAGE: &str = "English";

/// Truncate on a character boundary, keeping the first `MAX_INPUT_CHARS`
/// characters.
pub fn truncate_input(text: &str) -> &str {
    match text.char_indices().nth(MAX_INPUT_CHARS) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Build the single instruction sent to the endpoint. The instruction spells
/// out the exact JSON keys for the enabled feature set only, to reduce
/// parsing ambiguity on the way back.
pub fn build_prompt(text: &str, target_language: &str, features: &FeatureConfig) -> String {
    let target = if target_language.trim().is_empty() {
        DEFAULT_TARGET_LANGUAGE
    } else {
        target_language
    };

    let mut keys = vec![
        r#""detectedLanguage": the name of the source language, in English"#.to_string(),
        format!(r#""translation": the text translated to {}"#, target),
    ];
    if features.meanings {
        keys.push(format!(
            r#""meanings": an object mapping each significant word to {{"english": its meaning in English, "localized": its meaning in {}}}"#,
            target
        ));
    }

    let mut prompt = String::new();
    prompt.push_str(&format!(
        "Detect the language of the text below and translate it to {}.\n",
        target
    ));
    prompt.push_str("Respond with a single JSON object containing exactly these keys:\n");
    for key in &keys {
        prompt.push_str("- ");
        prompt.push_str(key);
        prompt.push('\n');
    }
    prompt.push_str("Do not include any text outside the JSON object.\n\n");
    prompt.push_str(&format!("Text: \"{}\"", text));
    prompt
}
