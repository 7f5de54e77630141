//! Message templates
//!
//! Plain-text subject/body rendering for the three message kinds the
//! pipeline sends: support-circle escalation, self-nudge, and consent
//! request. SMS dispatch uses the body only.

/// Escalation notice to a support circle member
pub fn escalation_message(
    member_name: &str,
    user_name: &str,
    goal_title: &str,
    consecutive_misses: u32,
) -> (String, String) {
    let subject = format!("{} could use your support", user_name);
    let days = if consecutive_misses == 1 {
        "1 day".to_string()
    } else {
        format!("{} days", consecutive_misses)
    };
    let body = format!(
        "Hi {member_name},\n\n\
         You're on {user_name}'s Emergency Support Team on MyDataday.\n\
         {user_name} hasn't logged progress on \"{goal_title}\" for {days}.\n\n\
         A quick check-in from you can make all the difference.\n\n\
         - The MyDataday Team",
    );
    (subject, body)
}

/// Encouragement sent to the goal owner after a single miss
pub fn self_nudge_message(user_name: &str, goal_title: &str) -> (String, String) {
    let subject = format!("Don't lose momentum on \"{}\"", goal_title);
    let body = format!(
        "Hi {user_name},\n\n\
         Yesterday got away from you - it happens. Your goal \"{goal_title}\" \
         is still right there waiting.\n\n\
         Log today's progress and keep the streak alive.\n\n\
         - The MyDataday Team",
    );
    (subject, body)
}

/// Consent request sent to a not-yet-consented member
pub fn consent_request_message(
    member_name: &str,
    user_name: &str,
    consent_link: &str,
) -> (String, String) {
    let subject = format!("{} wants you on their support team", user_name);
    let body = format!(
        "Hi {member_name},\n\n\
         {user_name} is working toward their goals on MyDataday and has asked \
         you to join their Emergency Support Team. If they miss their goals, \
         we'd let you know so you can check in.\n\n\
         Accept or decline here: {consent_link}\n\n\
         - The MyDataday Team",
    );
    (subject, body)
}
