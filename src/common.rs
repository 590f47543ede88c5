// Helper method to format bytes in human-readable form
pub fn bytes2hr(bytes: usize) -> String {
    if bytes < 1024 {
        format!("{bytes} bytes")
    } else if bytes < 1024 * 1024 {
        format!("{:.2} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

/// Probability as a percentage with enough digits for small rates.
pub fn rate2hr(rate: f64) -> String {
    if rate == 0.0 {
        "0%".to_string()
    } else if rate >= 0.01 {
        format!("{:.2}%", rate * 100.0)
    } else {
        format!("{:.4e}", rate)
    }
}
