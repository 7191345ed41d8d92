use whatlang::detect;

const MIN_CONFIDENCE: f64 = 0.25;
const MIN_TEXT_LENGTH: usize = 50;

/// English name of the dominant language of `text`, if detection is
/// confident enough to be worth passing to the summarizer.
pub fn detect_language(text: &str) -> Option<&'static str> {
    if text.trim().len() < MIN_TEXT_LENGTH {
        return None;
    }

    let info = detect(text)?;
    if info.confidence() < MIN_CONFIDENCE {
        return None;
    }
    Some(info.lang().eng_name())
}
