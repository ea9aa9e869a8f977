use std::sync::LazyLock;

use redis::Script;

pub const TOGGLE_FRIENDS_SCRIPT_BODY: &str = include_str!("../../lua/toggle_friends.lua");
pub const TOGGLE_LIKE_SCRIPT_BODY: &str = include_str!("../../lua/toggle_like.lua");
pub const APPEND_COMMENT_SCRIPT_BODY: &str = include_str!("../../lua/append_comment.lua");
pub const REGISTER_USER_SCRIPT_BODY: &str = include_str!("../../lua/register_user.lua");

pub static TOGGLE_FRIENDS_SCRIPT: LazyLock<Script> =
    LazyLock::new(|| Script::new(TOGGLE_FRIENDS_SCRIPT_BODY));
pub static TOGGLE_LIKE_SCRIPT: LazyLock<Script> =
    LazyLock::new(|| Script::new(TOGGLE_LIKE_SCRIPT_BODY));
pub static APPEND_COMMENT_SCRIPT: LazyLock<Script> =
    LazyLock::new(|| Script::new(APPEND_COMMENT_SCRIPT_BODY));
pub static REGISTER_USER_SCRIPT: LazyLock<Script> =
    LazyLock::new(|| Script::new(REGISTER_USER_SCRIPT_BODY));
