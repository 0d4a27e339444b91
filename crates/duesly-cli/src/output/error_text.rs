use duesly_client::ClientError;

pub fn render_error(error: &ClientError) -> String {
    let mut lines = vec![
        "That didn't work.".to_string(),
        String::new(),
        format!("  Error:    {}", error.code),
        format!("  Details:  {}", error.message),
        String::new(),
        "What to do next:".to_string(),
    ];

    if error.recovery_steps.is_empty() {
        lines.push("  1. Retry the command.".to_string());
    } else {
        for (index, step) in error.recovery_steps.iter().enumerate() {
            lines.push(format!("  {}. {step}", index + 1));
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use duesly_client::ClientError;

    use super::render_error;

    #[test]
    fn renders_code_details_and_numbered_steps() {
        let rendered = render_error(&ClientError::member_not_found("M042"));
        assert!(rendered.starts_with("That didn't work."));
        assert!(rendered.contains("  Error:    member_not_found"));
        assert!(rendered.contains("  Details:  Member `M042` was not found."));
        assert!(rendered.contains("What to do next:"));
        assert!(rendered.contains("  1. Run `duesly member list`"));
        assert!(rendered.contains("  2. Use `duesly member search"));
    }

    #[test]
    fn empty_recovery_falls_back_to_retry() {
        let error = ClientError::new("internal_runtime", "boom", Vec::new());
        assert!(render_error(&error).ends_with("  1. Retry the command."));
    }
}
