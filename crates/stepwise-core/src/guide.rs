//! Instruction text and navigation button visibility per step

use serde::Serialize;

pub const ASSEMBLED_MESSAGE: &str =
    "This is your assembled item.\nPress 'Next step' to see how to build it.";

pub const EXPLODED_MESSAGE: &str =
    "Step 0:\nReview the parts grouped by type before you start assembling.";

/// What the instruction panel should show
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuideView {
    pub message: String,
    pub show_next: bool,
    pub show_previous: bool,
    pub show_restart: bool,
}

/// Guide view for the sequencer position
///
/// `step_texts[n]` overrides the message of step `n` (index 0 is the
/// exploded view); blank entries fall back to the default text.
pub fn describe(current_step: i32, last_step: i32, step_texts: &[String]) -> GuideView {
    if current_step < 0 {
        return GuideView {
            message: ASSEMBLED_MESSAGE.to_string(),
            show_next: true,
            show_previous: false,
            show_restart: false,
        };
    }

    let custom = usize::try_from(current_step)
        .ok()
        .and_then(|i| step_texts.get(i))
        .filter(|text| !text.trim().is_empty());

    let message = match custom {
        Some(text) => text.clone(),
        None if current_step == 0 => EXPLODED_MESSAGE.to_string(),
        None => format!("Step {} of {}.", current_step, last_step),
    };

    GuideView {
        message,
        show_next: true,
        show_previous: true,
        show_restart: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pre_assembled_shows_only_next() {
        let view = describe(-1, 4, &[]);
        assert_eq!(view.message, ASSEMBLED_MESSAGE);
        assert!(view.show_next);
        assert!(!view.show_previous);
        assert!(!view.show_restart);
    }

    #[test]
    fn test_default_messages() {
        assert_eq!(describe(0, 4, &[]).message, EXPLODED_MESSAGE);
        let view = describe(2, 4, &[]);
        assert_eq!(view.message, "Step 2 of 4.");
        assert!(view.show_previous && view.show_restart);
    }

    #[test]
    fn test_custom_texts_with_blank_fallback() {
        let texts = vec![
            "Sort the parts".to_string(),
            "   ".to_string(),
            "Attach the legs".to_string(),
        ];
        assert_eq!(describe(0, 3, &texts).message, "Sort the parts");
        assert_eq!(describe(1, 3, &texts).message, "Step 1 of 3.");
        assert_eq!(describe(2, 3, &texts).message, "Attach the legs");
        assert_eq!(describe(3, 3, &texts).message, "Step 3 of 3.");
    }
}
