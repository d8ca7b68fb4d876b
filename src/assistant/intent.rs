use serde::{Deserialize, Serialize};

/// Question intent as classified by the assistant.
///
/// `Unclassified` is an explicit outcome for off-label classifier output or
/// an unreachable classifier, not something inferred from error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// The user asks what the assistant can do or how to use it
    Introduction,

    /// The user wants to supply clinical features for a risk prediction
    Prediction,

    /// General medical question answering
    Chat,

    /// Unrelated to anything the assistant should answer
    Other,

    /// The classifier produced no usable label
    Unclassified,
}

impl Intent {
    /// Parse a classifier label; anything off-label is `Unclassified`.
    pub fn from_label(label: &str) -> Intent {
        match label.trim().to_lowercase().as_str() {
            "introduction" => Intent::Introduction,
            "prediction" => Intent::Prediction,
            "chat" => Intent::Chat,
            "other" => Intent::Other,
            _ => Intent::Unclassified,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_labels() {
        assert_eq!(Intent::from_label("introduction"), Intent::Introduction);
        assert_eq!(Intent::from_label("prediction"), Intent::Prediction);
        assert_eq!(Intent::from_label("chat"), Intent::Chat);
        assert_eq!(Intent::from_label("other"), Intent::Other);
    }

    #[test]
    fn test_labels_are_trimmed_and_case_folded() {
        assert_eq!(Intent::from_label(" Prediction \n"), Intent::Prediction);
        assert_eq!(Intent::from_label("CHAT"), Intent::Chat);
    }

    #[test]
    fn test_off_label_output_is_unclassified() {
        assert_eq!(
            Intent::from_label("I think this is a prediction request"),
            Intent::Unclassified
        );
        assert_eq!(Intent::from_label(""), Intent::Unclassified);
    }

    #[test]
    fn test_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(Intent::Introduction).unwrap(),
            serde_json::json!("introduction")
        );
        assert_eq!(
            serde_json::to_value(Intent::Unclassified).unwrap(),
            serde_json::json!("unclassified")
        );
    }
}
