//! Comment bodies posted by the bot
//!
//! Both bodies start with a fixed prefix. Later runs find earlier reminders by
//! a literal `starts_with` on [`MERGE_REMIND_PREFIX`], so the prefixes must not
//! change between releases.

pub const MERGE_REMIND_PREFIX: &str = "***PR Merge Reminder from Scavenger Bot:*** \n";
pub const CLOSURE_PREFIX: &str = "***PR Closure Tips from Scavenger Bot:*** \n";

pub fn merge_reminder(days_inactive: i64, days_until_close: i64) -> String {
    format!(
        "{}PR has been inactive for {} days and will be closed after {} days due to persistent inactivity becoming obsolete.\n\
         Please track the PR merging process in time, and respond according to the relevant prompts given by the robot to speed up the PR merging.",
        MERGE_REMIND_PREFIX, days_inactive, days_until_close
    )
}

pub fn closure_notice(author: &str, maximum_open_time: i64) -> String {
    format!(
        "{}@{} PR was closed for more than {} days of inactivity. You can recreate the PR if you need to merge the code.",
        CLOSURE_PREFIX, author, maximum_open_time
    )
}

pub fn is_merge_reminder(body: &str) -> bool {
    body.starts_with(MERGE_REMIND_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_reminder() {
        let body = merge_reminder(10, 20);
        assert!(is_merge_reminder(&body));
        assert!(body.contains("inactive for 10 days"));
        assert!(body.contains("closed after 20 days"));
    }

    #[test]
    fn test_closure_notice() {
        let body = closure_notice("alice", 30);
        assert!(body.starts_with(CLOSURE_PREFIX));
        assert!(body.contains("@alice"));
        assert!(body.contains("more than 30 days"));
        assert!(!is_merge_reminder(&body));
    }

    #[test]
    fn test_prefix_is_literal() {
        assert!(!is_merge_reminder("PR Merge Reminder from Scavenger Bot"));
        assert!(!is_merge_reminder(&format!("quote: {}", MERGE_REMIND_PREFIX)));
    }
}
