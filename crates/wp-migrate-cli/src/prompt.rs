//! Terminal confirmation for short posts (`run --ask`).

use async_trait::async_trait;
use dialoguer::Confirm;
use wp_migrate::{GateDecision, LegacyPost, MigrateError, Result, ShortPostGate};

/// Prints each short post and asks the operator whether to migrate it.
///
/// Anything but an explicit yes skips the post.
pub struct TerminalGate;

#[async_trait]
impl ShortPostGate for TerminalGate {
    async fn decide(&self, post: &LegacyPost) -> Result<GateDecision> {
        let summary = describe(post);

        let keep = tokio::task::spawn_blocking(move || {
            println!("{}", summary);
            Confirm::new()
                .with_prompt("Do you want to add this post?")
                .default(false)
                .interact()
        })
        .await
        .map_err(|e| MigrateError::Prompt(e.to_string()))?
        .map_err(|e| MigrateError::Prompt(e.to_string()))?;

        Ok(if keep {
            GateDecision::Keep
        } else {
            GateDecision::Skip
        })
    }
}

fn describe(post: &LegacyPost) -> String {
    let date = post
        .date
        .map(|d| d.to_string())
        .unwrap_or_else(|| "-".to_string());

    format!(
        "\nPost {} ({}, {})\n  Title:   {}\n  Author:  {}\n  Date:    {}\n  Length:  {} characters\n  Content:\n{}\n",
        post.id,
        post.post_type,
        post.status,
        post.title,
        post.author,
        date,
        post.content.chars().count(),
        post.content
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_shows_character_count() {
        let post = LegacyPost {
            id: 42,
            author: 3,
            title: "Hello".into(),
            content: "héllo".into(),
            post_type: "post".into(),
            status: "draft".into(),
            ..LegacyPost::default()
        };

        let text = describe(&post);
        assert!(text.contains("Post 42 (post, draft)"));
        assert!(text.contains("Length:  5 characters"));
        assert!(text.contains("Date:    -"));
    }
}
