//! Target resolution for user commands.

use teloxide::types::{Message, MessageEntityKind};

use crate::moderation::Member;

/// Resolve the user a command points at.
/// Returns the member and how many arguments the target consumed.
///
/// Resolution order:
/// 1. Reply message → `reply.from`
/// 2. Numeric ID as first argument
/// 3. TextMention entity
pub fn get_target_from_msg(msg: &Message, args: &[&str]) -> Option<(Member, usize)> {
    if let Some(user) = msg.reply_to_message().and_then(|reply| reply.from.as_ref()) {
        return Some((
            Member {
                id: user.id.to_string(),
                name: user.first_name.clone(),
            },
            0,
        ));
    }

    let arg = args.first()?;

    if let Ok(id) = arg.parse::<u64>() {
        return Some((
            Member {
                id: id.to_string(),
                name: format!("User {id}"),
            },
            1,
        ));
    }

    msg.entities()?.iter().find_map(|entity| match &entity.kind {
        MessageEntityKind::TextMention { user } => Some((
            Member {
                id: user.id.to_string(),
                name: user.first_name.clone(),
            },
            1,
        )),
        _ => None,
    })
}
