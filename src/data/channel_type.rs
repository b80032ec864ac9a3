/// Infer a channel type tag from a channel name, following common
/// EEG montage naming (e.g. "EOG left", "ECG", "STI 014").
pub fn infer_channel_type(channel_name: &str) -> String {
    let lower = channel_name.to_lowercase();

    if lower.contains("eog") || lower.starts_with("veo") || lower.starts_with("heo") {
        "eog".to_string()
    } else if lower.contains("ecg") || lower.contains("ekg") {
        "ecg".to_string()
    } else if lower.contains("emg") {
        "emg".to_string()
    } else if lower.contains("sti") || lower.contains("trig") || lower.contains("status") {
        "stim".to_string()
    } else if lower.starts_with("meg") || lower.starts_with("mag") || lower.starts_with("grad") {
        "meg".to_string()
    } else if lower.contains("resp") {
        "resp".to_string()
    } else {
        "eeg".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn common_names() {
        assert_eq!(infer_channel_type("Cz"), "eeg");
        assert_eq!(infer_channel_type("EOG left"), "eog");
        assert_eq!(infer_channel_type("VEOG"), "eog");
        assert_eq!(infer_channel_type("EKG"), "ecg");
        assert_eq!(infer_channel_type("STI 014"), "stim");
        assert_eq!(infer_channel_type("MEG 0113"), "meg");
    }
}
