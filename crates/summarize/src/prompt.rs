pub fn build_summary_prompt(chunk_text: &str) -> String {
    format!(
        r#"Summarize the following document excerpt.

INSTRUCTIONS:
1. Write one or more plain paragraphs covering the main points
2. Keep names, dates, deadlines and numbers exactly as written
3. Do NOT use markdown formatting, headings or bullet lists
4. Do NOT add information that is not in the text

TEXT:
{}

SUMMARY:"#,
        chunk_text
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_text() {
        let prompt = build_summary_prompt("Midterm on March 3");
        assert!(prompt.contains("Midterm on March 3"));
        assert!(prompt.trim_end().ends_with("SUMMARY:"));
    }
}
